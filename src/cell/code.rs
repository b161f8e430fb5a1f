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

use super::{CellData, CellKind, Opaque, TypedCell};
use crate::ckb::H160;

/// The code cell carries no data: it identifies the role owner by its lock
/// and is consumed and re-created by every protocol transition
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    MoleculeEncode,
    MoleculeDecode,
)]
pub struct CodeData;

impl CellData for CodeData {
    const KIND: CellKind = CellKind::Code;
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    MoleculeEncode,
    MoleculeDecode,
)]
pub struct CodeLockArgs {
    pub lock_arg: H160,
}

impl_script_args!(CodeLockArgs);

pub type Code = TypedCell<CodeData, CodeLockArgs>;
