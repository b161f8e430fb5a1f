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

use proc_macro2::TokenStream as TokenStream2;
use syn::spanned::Spanned;
use syn::{Data, DataStruct, DeriveInput, Fields, Index, Result};

use crate::util::{get_molecule_crate, unsupported};

pub(crate) fn encode_inner(input: DeriveInput) -> Result<TokenStream2> {
    match input.data {
        Data::Struct(ref data) => encode_inner_struct(&input, data),
        Data::Enum(_) | Data::Union(_) => {
            Err(unsupported(&input, "MoleculeEncode"))
        }
    }
}

pub(crate) fn decode_inner(input: DeriveInput) -> Result<TokenStream2> {
    match input.data {
        Data::Struct(ref data) => decode_inner_struct(&input, data),
        Data::Enum(_) | Data::Union(_) => {
            Err(unsupported(&input, "MoleculeDecode"))
        }
    }
}

fn encode_inner_struct(
    input: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream2> {
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();
    let ident_name = &input.ident;

    let import = get_molecule_crate(input)?;

    let recurse: Vec<TokenStream2> = match data.fields {
        Fields::Named(ref fields) => fields
            .named
            .iter()
            .map(|f| {
                let name = &f.ident;
                quote_spanned! { f.span() =>
                    len += self.#name.molecule_encode(&mut e)?;
                }
            })
            .collect(),
        Fields::Unnamed(ref fields) => fields
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let index = Index::from(i);
                quote_spanned! { f.span() =>
                    len += self.#index.molecule_encode(&mut e)?;
                }
            })
            .collect(),
        Fields::Unit => vec![],
    };

    let inner = match recurse.len() {
        0 => quote! {
            fn molecule_encode<E: ::std::io::Write>(&self, _: E) -> Result<usize, #import::molecule::Error> {
                Ok(0)
            }
        },
        _ => quote! {
            fn molecule_encode<E: ::std::io::Write>(&self, mut e: E) -> Result<usize, #import::molecule::Error> {
                use #import::molecule::MoleculeEncode;

                let mut len = 0;
                #( #recurse )*
                Ok(len)
            }
        },
    };

    Ok(quote! {
        #[allow(unused_qualifications)]
        impl #impl_generics #import::molecule::MoleculeEncode for #ident_name #ty_generics #where_clause {
            #[inline]
            #inner
        }
    })
}

fn decode_inner_struct(
    input: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream2> {
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();
    let ident_name = &input.ident;

    let import = get_molecule_crate(input)?;

    let types = data.fields.iter().map(|f| &f.ty).collect::<Vec<_>>();
    let static_size = quote! {
        #import::molecule::static_size_of(&[
            #( <#types as #import::molecule::MoleculeDecode>::STATIC_SIZE ),*
        ])
    };

    let inner = match data.fields {
        Fields::Named(ref fields) => {
            let recurse: Vec<TokenStream2> = fields
                .named
                .iter()
                .map(|f| {
                    let name = &f.ident;
                    quote_spanned! { f.span() =>
                        #name: #import::molecule::MoleculeDecode::molecule_decode(&mut d)?,
                    }
                })
                .collect();
            quote! {
                Self {
                    #( #recurse )*
                }
            }
        }
        Fields::Unnamed(ref fields) => {
            let recurse: Vec<TokenStream2> = fields
                .unnamed
                .iter()
                .map(|f| {
                    quote_spanned! { f.span() =>
                        #import::molecule::MoleculeDecode::molecule_decode(&mut d)?,
                    }
                })
                .collect();
            quote! {
                Self (
                    #( #recurse )*
                )
            }
        }
        Fields::Unit => quote! { Self },
    };

    let decoder = if data.fields.is_empty() {
        quote! { _: D }
    } else {
        quote! { mut d: D }
    };

    Ok(quote! {
        #[allow(unused_qualifications)]
        impl #impl_generics #import::molecule::MoleculeDecode for #ident_name #ty_generics #where_clause {
            const STATIC_SIZE: Option<usize> = #static_size;

            #[inline]
            fn molecule_decode<D: ::std::io::Read>(#decoder) -> Result<Self, #import::molecule::Error> {
                Ok(#inner)
            }
        }
    })
}
