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

//! Derive macros for molecule encoding of structs: fields are encoded one
//! after another in their declaration order, which corresponds to the
//! molecule `struct` layout when all the fields have static size.
//!
//! Generated code refers to `axon::molecule` module; use
//! `#[molecule_crate(path)]` attribute to point to a different path.

#![recursion_limit = "256"]
#![cfg_attr(test, deny(warnings))]

extern crate proc_macro;
#[macro_use]
extern crate quote;
#[macro_use]
extern crate syn;

mod molecule;
mod util;

use proc_macro::TokenStream;
use syn::DeriveInput;

#[proc_macro_derive(MoleculeEncode, attributes(molecule_crate))]
pub fn derive_molecule_encode(input: TokenStream) -> TokenStream {
    let derive_input = parse_macro_input!(input as DeriveInput);
    molecule::encode_inner(derive_input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

#[proc_macro_derive(MoleculeDecode, attributes(molecule_crate))]
pub fn derive_molecule_decode(input: TokenStream) -> TokenStream {
    let derive_input = parse_macro_input!(input as DeriveInput);
    molecule::decode_inner(derive_input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
