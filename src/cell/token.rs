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

/// Plain SUDT balance; MUSE tokens used for checker fees are SUDT too
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
pub struct SudtData {
    pub amount: u128,
}

impl CellData for SudtData {
    const KIND: CellKind = CellKind::Sudt;
}

pub type Sudt = TypedCell<SudtData>;

/// Collator bond for a sidechain
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
pub struct SidechainBondData {
    pub amount: u128,
}

impl CellData for SidechainBondData {
    const KIND: CellKind = CellKind::SidechainBond;
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
pub struct SidechainBondLockArgs {
    pub chain_id: u8,
    pub collator_lock_arg: H160,
    /// Bond may be unlocked once the sidechain commits this height
    pub unlock_sidechain_height: u128,
}

impl_script_args!(SidechainBondLockArgs);

pub type SidechainBond = TypedCell<SidechainBondData, SidechainBondLockArgs>;

/// Fees collected by the sidechain and owed to the checkers
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
pub struct SidechainFeeData {
    pub muse_amount: u128,
}

impl CellData for SidechainFeeData {
    const KIND: CellKind = CellKind::SidechainFee;
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
pub struct SidechainFeeLockArgs {
    pub chain_id: u8,
}

impl_script_args!(SidechainFeeLockArgs);

pub type SidechainFee = TypedCell<SidechainFeeData, SidechainFeeLockArgs>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::test::{assert_roundtrip, template};
    use crate::ckb::{OutPoint, H256};
    use crate::molecule::MoleculeDecode;

    #[test]
    fn test_bond_layout() {
        assert_eq!(SidechainBondLockArgs::STATIC_SIZE, Some(37));
        let mut cell = SidechainBond::with_template(
            &template(20),
            100,
            SidechainBondData { amount: 10 },
            SidechainBondLockArgs {
                chain_id: 1,
                collator_lock_arg: [2u8; 20],
                unlock_sidechain_height: 0x0102,
            },
            Opaque,
        );
        cell.out_point = Some(OutPoint::new(H256([5u8; 32]), 0));
        let live = assert_roundtrip(&cell, 16);
        assert_eq!(live.lock.args.len(), 37);
        assert_eq!(live.lock.args[21], 2);
        assert_eq!(live.lock.args[22], 1);
        assert_eq!(live.data[0], 10);
    }

    #[test]
    fn test_sudt_keeps_opaque_args() {
        let mut tmpl = template(30);
        tmpl.lock.args = vec![1u8, 2, 3].into();
        tmpl.type_.args = vec![4u8; 32].into();
        let mut cell =
            Sudt::with_template(&tmpl, 142, SudtData { amount: u128::MAX }, Opaque, Opaque);
        cell.out_point = Some(OutPoint::new(H256([6u8; 32]), 2));
        let live = assert_roundtrip(&cell, 16);
        assert_eq!(live.lock.args.as_slice(), &[1, 2, 3]);
        assert_eq!(live.type_.unwrap().args.len(), 32);
        assert_eq!(live.data.as_slice(), &[0xFF; 16]);
    }
}
