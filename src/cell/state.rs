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
use crate::ckb::H256;

/// Phase of the sidechain commit cycle
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display(Debug)]
pub enum SidechainStatus {
    /// All published blocks are committed; the collator may publish tasks
    /// for the next block range
    WaitingForPublish = 0,

    /// Tasks for the latest block range are published and wait to be
    /// checked and submitted
    WaitingForSubmit = 1,
}

/// Data of the sidechain state cell
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
pub struct SidechainStateData {
    pub chain_id: u8,
    pub version: u8,
    pub latest_block_height: u128,
    pub latest_block_hash: H256,
    pub committed_block_height: u128,
    pub committed_block_hash: H256,
}

impl CellData for SidechainStateData {
    const KIND: CellKind = CellKind::SidechainState;
}

impl SidechainStateData {
    /// Status is not stored on chain: it follows from the relation of the
    /// latest and committed heights. Returns `None` if the committed height
    /// is ahead of the latest one, which is not a valid state.
    pub fn status(&self) -> Option<SidechainStatus> {
        match self.latest_block_height {
            height if height == self.committed_block_height => {
                Some(SidechainStatus::WaitingForPublish)
            }
            height if height > self.committed_block_height => {
                Some(SidechainStatus::WaitingForSubmit)
            }
            _ => None,
        }
    }

    /// Marks latest published block range as committed
    pub fn commit_latest(&mut self) {
        self.committed_block_height = self.latest_block_height;
        self.committed_block_hash = self.latest_block_hash;
    }
}

pub type SidechainState = TypedCell<SidechainStateData, Opaque, ChainIdArgs>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::test::{assert_roundtrip, template};
    use crate::ckb::OutPoint;
    use crate::molecule::MoleculeDecode;

    #[test]
    fn test_state_layout() {
        assert_eq!(SidechainStateData::STATIC_SIZE, Some(98));
        let mut cell = SidechainState::with_template(
            &template(3),
            1000,
            SidechainStateData {
                chain_id: 1,
                version: 2,
                latest_block_height: 20,
                latest_block_hash: H256([2u8; 32]),
                committed_block_height: 10,
                committed_block_hash: H256([1u8; 32]),
            },
            Opaque,
            ChainIdArgs { chain_id: 1 },
        );
        cell.out_point = Some(OutPoint::new(H256([7u8; 32]), 3));
        let live = assert_roundtrip(&cell, 98);
        assert_eq!(live.data[2], 20);
        assert_eq!(&live.data[18..50], &[2u8; 32]);
        assert_eq!(live.data[50], 10);
    }

    #[test]
    fn test_status() {
        let mut data = SidechainStateData {
            latest_block_height: 20,
            committed_block_height: 10,
            ..Default::default()
        };
        assert_eq!(data.status(), Some(SidechainStatus::WaitingForSubmit));
        data.commit_latest();
        assert_eq!(data.status(), Some(SidechainStatus::WaitingForPublish));
        data.committed_block_height = 21;
        assert_eq!(data.status(), None);
    }
}
