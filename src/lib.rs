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

//! Axon client library: molecule encoding of CKB transactions, typed views
//! over the sidechain protocol cells, transaction composition & signing and
//! the business rules driving checker and collator roles.

#![recursion_limit = "256"]
// Coding conventions
#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    //unused_imports,
    //dead_code,
    //missing_docs
)]

// Derive macros generate paths to `axon::molecule`
extern crate self as axon;

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate axon_derive;
#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

#[macro_use]
pub mod molecule;
#[cfg(test)]
#[macro_use]
pub(crate) mod test_helpers;

pub mod cell;
pub mod ckb;
pub mod composer;
pub mod engine;
pub mod role;
pub mod transformation;
pub mod witness;

pub use cell::{CellBody, CellCodec, CellKind, CellTemplate, LiveCell};
pub use ckb::{
    blake160, blake2b_256, Bytes, CellDep, CellInput, CellOutput, DepType,
    HashType, OutPoint, RawTransaction, Script, ScriptTemplate, Transaction,
    WitnessArgs, H256,
};
pub use composer::{Composer, Secp256k1Signer, Signer};
pub use molecule::{
    molecule_deserialize, molecule_serialize, MoleculeDecode, MoleculeEncode,
};
pub use transformation::Transformation;
