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

use super::CellKind;
use crate::ckb::Script;

/// Lock and type scripts used to create and look up cells of some kind.
/// Arguments of the scripts are ignored whenever the cell kind has typed
/// arguments.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct CellTemplate {
    pub lock: Script,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_: Script,
}

/// Script templates for all kinds of the protocol cells
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct CellTemplates {
    pub global_config: CellTemplate,
    pub sidechain_config: CellTemplate,
    pub sidechain_state: CellTemplate,
    pub task: CellTemplate,
    pub checker_info: CellTemplate,
    pub checker_bond: CellTemplate,
    pub sidechain_bond: CellTemplate,
    pub sidechain_fee: CellTemplate,
    pub code: CellTemplate,
    /// Token paid to the checkers as a fee
    pub muse: CellTemplate,
}

impl CellTemplates {
    pub fn get(&self, kind: CellKind) -> &CellTemplate {
        match kind {
            CellKind::GlobalConfig => &self.global_config,
            CellKind::SidechainConfig => &self.sidechain_config,
            CellKind::SidechainState => &self.sidechain_state,
            CellKind::Task => &self.task,
            CellKind::CheckerInfo => &self.checker_info,
            CellKind::CheckerBond => &self.checker_bond,
            CellKind::SidechainBond => &self.sidechain_bond,
            CellKind::SidechainFee => &self.sidechain_fee,
            CellKind::Code => &self.code,
            CellKind::Sudt => &self.muse,
        }
    }
}
