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

/// Size of the zero-padded RPC URL field of the checker info
pub const RPC_URL_SIZE: usize = 512;

/// Result of the last check performed by the checker
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    FromPrimitive,
    ToPrimitive,
)]
#[display(Debug)]
#[repr(u8)]
pub enum CheckerInfoMode {
    Idle = 0,
    TaskPassed = 1,
    ChallengePassed = 2,
    ChallengeRejected = 3,
}

impl Default for CheckerInfoMode {
    fn default() -> Self {
        CheckerInfoMode::Idle
    }
}

impl CheckerInfoMode {
    /// Whether the checker reacted on a challenge rather than on a task
    pub fn is_challenge(self) -> bool {
        matches!(
            self,
            CheckerInfoMode::ChallengePassed
                | CheckerInfoMode::ChallengeRejected
        )
    }
}

impl_enum_molecule_encoding!(CheckerInfoMode);

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    FromPrimitive,
    ToPrimitive,
)]
#[display(Debug)]
#[repr(u8)]
pub enum CheckerStatus {
    Relaying = 0,
    Quit = 1,
}

impl Default for CheckerStatus {
    fn default() -> Self {
        CheckerStatus::Relaying
    }
}

impl_enum_molecule_encoding!(CheckerStatus);

/// Data of the checker info cell, one per checker and sidechain
#[derive(Clone, PartialEq, Eq, Hash, Debug, MoleculeEncode, MoleculeDecode)]
pub struct CheckerInfoData {
    pub chain_id: u8,
    pub check_id: u8,
    /// Amount of data checked by the checker and not yet paid for
    pub unpaid_check_data_size: u128,
    pub rpc_url: [u8; RPC_URL_SIZE],
    pub checker_pub_key_hash: H160,
    pub mode: CheckerInfoMode,
}

impl Default for CheckerInfoData {
    fn default() -> Self {
        CheckerInfoData {
            chain_id: 0,
            check_id: 0,
            unpaid_check_data_size: 0,
            rpc_url: [0u8; RPC_URL_SIZE],
            checker_pub_key_hash: Default::default(),
            mode: CheckerInfoMode::default(),
        }
    }
}

impl CellData for CheckerInfoData {
    const KIND: CellKind = CellKind::CheckerInfo;
}

impl CheckerInfoData {
    /// RPC URL with the zero padding stripped; `None` if it is not UTF-8
    pub fn rpc_url(&self) -> Option<&str> {
        let len = self
            .rpc_url
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(RPC_URL_SIZE);
        std::str::from_utf8(&self.rpc_url[..len]).ok()
    }

    /// Stores URL into the zero-padded field, truncating it if too long
    pub fn set_rpc_url(&mut self, url: &str) {
        let len = url.len().min(RPC_URL_SIZE);
        self.rpc_url = [0u8; RPC_URL_SIZE];
        self.rpc_url[..len].copy_from_slice(&url.as_bytes()[..len]);
    }
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
pub struct CheckerInfoTypeArgs {
    pub chain_id: u8,
    pub checker_lock_arg: H160,
    pub status: CheckerStatus,
}

impl_script_args!(CheckerInfoTypeArgs);

pub type CheckerInfo = TypedCell<CheckerInfoData, Opaque, CheckerInfoTypeArgs>;

/// Amount of bonded SUDT tokens
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    MoleculeEncode,
    MoleculeDecode,
)]
pub struct CheckerBondData {
    pub amount: u128,
}

impl CellData for CheckerBondData {
    const KIND: CellKind = CellKind::CheckerBond;
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
pub struct CheckerBondLockArgs {
    pub checker_lock_arg: H160,
    /// Bit per sidechain the bond is used for
    pub chain_id_bitmap: [u8; 32],
}

impl_script_args!(CheckerBondLockArgs);

pub type CheckerBond = TypedCell<CheckerBondData, CheckerBondLockArgs>;
