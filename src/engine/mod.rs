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

//! Protocol state engine.
//!
//! One operation per protocol transition. Each operation receives a
//! transformation populated by the role cycle, checks the transition
//! preconditions, updates the cells and creates the witness in place. If
//! the sidechain has fewer checkers than its threshold the transformation
//! is marked as skipped and left untouched.

pub mod checker;
pub mod collator;

pub use collator::ChainInfo;

use crate::cell::{
    self, CheckerInfo, CheckerInfoMode, SidechainConfig, TaskStatus,
};
use crate::molecule;
use crate::transformation::Outcome;
use crate::witness::{self, Pattern};

#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// checker {0} has mode {1} and has not passed the task
    CheckerNotPassed(u8, CheckerInfoMode),

    /// checker {0} has mode {1} and has not processed the challenge
    ChallengeNotFinished(u8, CheckerInfoMode),

    /// {0} valid challenges are not enough to punish {1} checkers
    InsufficientValidChallenges(usize, usize),

    /// task {0} can't be refreshed before its refresh interval {1} expires
    TaskNotExpired(String, u16),

    /// task has status {0} while only open tasks can be voted for
    TaskNotOpen(TaskStatus),

    /// bond is locked until sidechain height {0}, while the committed
    /// height is {1}
    BondLocked(u128, u128),

    /// no checker info cells are provided for the transition
    NoCheckers,

    /// arithmetic overflow computing {0}
    Overflow(&'static str),

    /// sidechain fee cell holds {0} MUSE while {1} is required
    InsufficientFee(u128, u128),

    /// sidechain height {0} reported by the cross-chain service is not
    /// above the committed height {1}
    StaleChainInfo(u128, u128),

    /// checker bond is owned by {0} rather than by the checker
    BondOwnerMismatch(String),

    /// checker bond of {0} is below the minimal bond {1} of the sidechain
    InsufficientBond(u128, u128),

    /// checker bond is already used by sidechain {0}
    AlreadyJoined(u8),

    /// checker bond is not used by sidechain {0}
    NotJoined(u8),

    /// all check ids of the sidechain are taken
    NoFreeCheckId,

    /// checker {0} can't leave the sidechain while in {1} mode
    CheckerBusy(u8, CheckerInfoMode),

    /// checker bond is still used by some sidechains
    BondInUse,

    #[from]
    #[display(inner)]
    Cell(cell::Error),

    #[from]
    #[display(inner)]
    Molecule(molecule::Error),

    #[from]
    #[display(inner)]
    Witness(witness::Error),
}

/// Marks the transformation as skipped if the sidechain has not enough
/// checkers; returns whether the transition may proceed
pub(crate) fn quorum_guard(
    config: &SidechainConfig,
    outcome: &mut Outcome,
    pattern: Pattern,
) -> bool {
    if config.data.has_quorum() {
        return true;
    }
    info!(
        "Skipping {}: sidechain {} has {} checkers out of {} required",
        pattern,
        config.data.chain_id,
        config.data.checker_total_count,
        config.data.checker_threshold
    );
    outcome.skip = true;
    false
}

/// Bitmap of up to 256 ids: bit `id % 8` of byte `id / 8`
pub(crate) type Bitmap = [u8; 32];

pub(crate) fn bitmap_contains(bitmap: &Bitmap, id: u8) -> bool {
    bitmap[id as usize / 8] & (1 << (id % 8)) != 0
}

pub(crate) fn bitmap_set(bitmap: &mut Bitmap, id: u8) {
    bitmap[id as usize / 8] |= 1 << (id % 8);
}

pub(crate) fn bitmap_clear(bitmap: &mut Bitmap, id: u8) {
    bitmap[id as usize / 8] &= !(1 << (id % 8));
}

/// Lowest id which is not in the bitmap
pub(crate) fn bitmap_first_free(bitmap: &Bitmap) -> Option<u8> {
    (0..=u8::MAX).find(|id| !bitmap_contains(bitmap, *id))
}

/// Fee due to each checker: fee rate times the data size checked by the
/// first checker
pub(crate) fn fee_per_checker(
    config: &SidechainConfig,
    checker_infos: &[CheckerInfo],
) -> Result<u128, Error> {
    let first = checker_infos.first().ok_or(Error::NoCheckers)?;
    config
        .data
        .check_fee_rate
        .checked_mul(first.data.unpaid_check_data_size)
        .ok_or(Error::Overflow("fee per checker"))
}

#[cfg(test)]
pub(crate) mod test {
    use super::{bitmap_clear, bitmap_contains, bitmap_first_free, bitmap_set};
    use crate::cell::{
        CheckerBond, CheckerBondData, CheckerBondLockArgs, CheckerInfo,
        CheckerInfoData, CheckerInfoMode, CheckerInfoTypeArgs,
        CheckerStatus, Code, CodeData, CodeLockArgs, GlobalConfig,
        GlobalConfigData, Opaque, SidechainBond, SidechainBondData,
        SidechainBondLockArgs, SidechainConfig, SidechainConfigData,
        SidechainFee, SidechainFeeData, SidechainFeeLockArgs, SidechainState,
        SidechainStateData, Sudt, SudtData, Task, TaskData, TaskMode,
        TaskStatus, TaskTypeArgs,
    };
    use crate::cell::{test::template, ChainIdArgs};
    use crate::ckb::{HashType, OutPoint, ScriptTemplate, H160, H256};

    pub(crate) const CHAIN_ID: u8 = 1;

    pub(crate) fn out_point(index: u32) -> OutPoint {
        OutPoint::new(H256([0xCC; 32]), index)
    }

    pub(crate) fn checker_lock_arg(check_id: u8) -> H160 {
        [check_id + 1; 20]
    }

    pub(crate) fn global_config() -> GlobalConfig {
        GlobalConfig::with_template(
            &template(0x10),
            1000,
            GlobalConfigData {
                task_cell_type: ScriptTemplate::new(
                    H256([0x33; 32]),
                    HashType::Type,
                ),
                ..Default::default()
            },
            Opaque,
            Opaque,
        )
        .committed_at(out_point(100))
    }

    pub(crate) fn sidechain_config(total: u8, threshold: u8) -> SidechainConfig {
        SidechainConfig::with_template(
            &template(0x12),
            1000,
            SidechainConfigData {
                chain_id: CHAIN_ID,
                checker_total_count: total,
                checker_threshold: threshold,
                check_fee_rate: 10,
                refresh_interval: 0,
                commit_threshold: 2,
                ..Default::default()
            },
            Opaque,
            ChainIdArgs { chain_id: CHAIN_ID },
        )
        .committed_at(out_point(101))
    }

    pub(crate) fn code(lock_arg: H160) -> Code {
        Code::with_template(
            &template(0x14),
            61,
            CodeData,
            CodeLockArgs { lock_arg },
            Opaque,
        )
        .committed_at(out_point(0))
    }

    pub(crate) fn checker_info(
        check_id: u8,
        unpaid: u128,
        mode: CheckerInfoMode,
    ) -> CheckerInfo {
        CheckerInfo::with_template(
            &template(0x16),
            600,
            CheckerInfoData {
                chain_id: CHAIN_ID,
                check_id,
                unpaid_check_data_size: unpaid,
                mode,
                ..Default::default()
            },
            Opaque,
            CheckerInfoTypeArgs {
                chain_id: CHAIN_ID,
                checker_lock_arg: checker_lock_arg(check_id),
                status: CheckerStatus::Relaying,
            },
        )
        .committed_at(out_point(10 + check_id as u32))
    }

    pub(crate) fn task(
        check_id: u8,
        mode: TaskMode,
        status: TaskStatus,
    ) -> Task {
        Task::with_template(
            &template(0x18),
            200,
            TaskData {
                check_block_height_from: 1,
                check_block_height_to: 10,
                check_data_size: 5,
                mode,
                ..Default::default()
            },
            Opaque,
            TaskTypeArgs {
                chain_id: CHAIN_ID,
                checker_lock_arg: checker_lock_arg(check_id),
                status,
            },
        )
        .committed_at(out_point(50 + check_id as u32))
    }

    pub(crate) fn state(latest: u128, committed: u128) -> SidechainState {
        SidechainState::with_template(
            &template(0x1A),
            300,
            SidechainStateData {
                chain_id: CHAIN_ID,
                version: 1,
                latest_block_height: latest,
                latest_block_hash: H256([latest as u8; 32]),
                committed_block_height: committed,
                committed_block_hash: H256([committed as u8; 32]),
            },
            Opaque,
            ChainIdArgs { chain_id: CHAIN_ID },
        )
        .committed_at(out_point(1))
    }

    pub(crate) fn bond(amount: u128, unlock_height: u128) -> SidechainBond {
        SidechainBond::with_template(
            &template(0x1C),
            150,
            SidechainBondData { amount },
            SidechainBondLockArgs {
                chain_id: CHAIN_ID,
                collator_lock_arg: [0xC0; 20],
                unlock_sidechain_height: unlock_height,
            },
            Opaque,
        )
        .committed_at(out_point(2))
    }

    pub(crate) fn fee(muse_amount: u128) -> SidechainFee {
        SidechainFee::with_template(
            &template(0x1E),
            150,
            SidechainFeeData { muse_amount },
            SidechainFeeLockArgs { chain_id: CHAIN_ID },
            Opaque,
        )
        .committed_at(out_point(3))
    }

    pub(crate) fn muse(amount: u128) -> Sudt {
        Sudt::with_template(&template(0x20), 142, SudtData { amount }, Opaque, Opaque)
            .committed_at(out_point(4))
    }

    pub(crate) fn checker_bond(
        owner: H160,
        amount: u128,
        chain_id_bitmap: [u8; 32],
    ) -> CheckerBond {
        CheckerBond::with_template(
            &template(0x22),
            170,
            CheckerBondData { amount },
            CheckerBondLockArgs {
                checker_lock_arg: owner,
                chain_id_bitmap,
            },
            Opaque,
        )
        .committed_at(out_point(5))
    }

    pub(crate) fn checker_info_prototype() -> CheckerInfo {
        let mut data = CheckerInfoData::default();
        data.set_rpc_url("http://checker:8000");
        CheckerInfo::with_template(
            &template(0x16),
            800,
            data,
            Opaque,
            CheckerInfoTypeArgs::default(),
        )
    }

    pub(crate) fn task_prototype() -> Task {
        Task::with_template(
            &template(0x18),
            200,
            TaskData::default(),
            Opaque,
            TaskTypeArgs::default(),
        )
    }

    #[test]
    fn test_bitmap() {
        let mut bitmap = [0u8; 32];
        assert_eq!(bitmap_first_free(&bitmap), Some(0));
        bitmap_set(&mut bitmap, 0);
        bitmap_set(&mut bitmap, 9);
        assert_eq!(bitmap[0], 0b0000_0001);
        assert_eq!(bitmap[1], 0b0000_0010);
        assert!(bitmap_contains(&bitmap, 9));
        assert!(!bitmap_contains(&bitmap, 8));
        assert_eq!(bitmap_first_free(&bitmap), Some(1));
        bitmap_clear(&mut bitmap, 9);
        assert_eq!(bitmap[1], 0);
        bitmap_set(&mut bitmap, 255);
        assert_eq!(bitmap[31], 0b1000_0000);
        assert_eq!(bitmap_first_free(&[0xFF; 32]), None);
    }
}
