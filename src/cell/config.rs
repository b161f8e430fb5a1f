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

use super::{CellData, CellKind, ChainIdArgs, Opaque, TypedCell};
use crate::ckb::{ScriptTemplate, H160};

/// Data of the global config cell: admin lock and code references of all
/// protocol scripts
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
pub struct GlobalConfigData {
    pub admin_lock_arg: H160,
    pub code_cell_type: ScriptTemplate,
    pub sidechain_config_cell_type: ScriptTemplate,
    pub sidechain_state_cell_type: ScriptTemplate,
    pub checker_info_cell_type: ScriptTemplate,
    pub checker_bond_cell_lock: ScriptTemplate,
    pub task_cell_type: ScriptTemplate,
    pub sidechain_fee_cell_lock: ScriptTemplate,
    pub sidechain_bond_cell_lock: ScriptTemplate,
}

impl CellData for GlobalConfigData {
    const KIND: CellKind = CellKind::GlobalConfig;
}

impl GlobalConfigData {
    /// Code reference of the script identifying cells of the given kind:
    /// type script for most of the kinds, lock script for bonds and fees
    pub fn script_template(&self, kind: CellKind) -> Option<ScriptTemplate> {
        Some(match kind {
            CellKind::Code => self.code_cell_type,
            CellKind::SidechainConfig => self.sidechain_config_cell_type,
            CellKind::SidechainState => self.sidechain_state_cell_type,
            CellKind::CheckerInfo => self.checker_info_cell_type,
            CellKind::CheckerBond => self.checker_bond_cell_lock,
            CellKind::Task => self.task_cell_type,
            CellKind::SidechainFee => self.sidechain_fee_cell_lock,
            CellKind::SidechainBond => self.sidechain_bond_cell_lock,
            CellKind::GlobalConfig | CellKind::Sudt => return None,
        })
    }
}

pub type GlobalConfig = TypedCell<GlobalConfigData>;

/// Parameters of a sidechain set by its admin
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
pub struct SidechainConfigData {
    pub chain_id: u8,
    pub checker_total_count: u8,
    /// Bit per checker id of the checkers which joined the sidechain
    pub checker_bitmap: [u8; 32],
    pub checker_threshold: u8,
    pub update_interval: u16,
    pub minimal_bond: u128,
    pub checker_data_size_limit: u128,
    /// Fee paid to a checker per unit of checked data
    pub check_fee_rate: u128,
    pub refresh_interval: u16,
    /// Number of tasks published for each new range of sidechain blocks
    pub commit_threshold: u8,
    pub challenge_threshold: u8,
    pub admin_pub_key: [u8; 32],
    pub collator_pub_key: [u8; 32],
    pub bond_sudt_type_hash: [u8; 32],
}

impl CellData for SidechainConfigData {
    const KIND: CellKind = CellKind::SidechainConfig;
}

impl SidechainConfigData {
    /// Whether enough checkers joined the sidechain for it to operate
    pub fn has_quorum(&self) -> bool {
        self.checker_total_count >= self.checker_threshold
    }
}

pub type SidechainConfig = TypedCell<SidechainConfigData, Opaque, ChainIdArgs>;
