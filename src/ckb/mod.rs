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

//! CKB chain primitives: hashes, scripts, cell references and transactions
//! with their molecule encodings.

mod hash;
mod script;
mod transaction;

pub use crate::molecule::Bytes;
pub use hash::{blake160, blake2b_256, new_blake2b, H160, H256};
pub use script::{HashType, Script, ScriptTemplate};
pub use transaction::{
    CellDep, CellInput, CellOutput, DepType, OutPoint, RawTransaction,
    Transaction, WitnessArgs, SIGNATURE_SIZE,
};
