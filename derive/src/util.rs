// Axon sidechain client implementing checker & collator roles
// Written in 2021 by
//     Axon Client developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{DeriveInput, Error, Ident, Path, Result};

const NAME: &str = "molecule_crate";
const EXAMPLE: &str = "#[molecule_crate(crate_path)]";

/// Macro producing [`syn::Error`] containing span information from `$attr`
/// (first) argument and formatted string describing concrete error together
/// with an example of the attribute use.
macro_rules! attr_err {
    ($attr:expr, $msg:expr) => {
        ::syn::Error::new(
            $attr.span(),
            format!(
                "Attribute `#[{}]`: {}\nExample use: {}",
                NAME, $msg, EXAMPLE
            ),
        )
    };
}

/// Detects path to the crate providing `molecule` module; defaults to `axon`
pub(crate) fn get_molecule_crate(input: &DeriveInput) -> Result<Path> {
    let mut found = None;
    for attr in &input.attrs {
        if !attr.path().is_ident(NAME) {
            continue;
        }
        if found.is_some() {
            return Err(attr_err!(attr, "attribute may be used only once"));
        }
        let path = attr
            .parse_args::<Path>()
            .map_err(|err| attr_err!(attr, err.to_string()))?;
        found = Some(path);
    }
    Ok(found.unwrap_or_else(|| {
        Path::from(Ident::new("axon", Span::call_site()))
    }))
}

/// Error for the types which can't be encoded with the derived code
pub(crate) fn unsupported(input: &DeriveInput, trait_name: &str) -> Error {
    Error::new_spanned(
        input,
        format!(
            "Deriving {} is supported only for structs; use \
             `impl_enum_molecule_encoding!` for enums",
            trait_name
        ),
    )
}
