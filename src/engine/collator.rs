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

use super::{bitmap_set, fee_per_checker, quorum_guard, Error};
use crate::cell::{
    CellCodec, CheckerInfo, CheckerInfoMode, Opaque, SidechainFee,
    SidechainState, Sudt, SudtData, TaskData, TaskMode, TaskStatus,
    TaskTypeArgs,
};
use crate::ckb::H256;
use crate::transformation::{
    CollatorPublishTaskTransformation, CollatorRefreshTaskTransformation,
    CollatorSubmitChallengeTransformation, CollatorSubmitTaskTransformation,
    CollatorUnlockBondTransformation,
};
use crate::witness::{
    CollatorPublishTaskWitness, CollatorRefreshTaskWitness,
    CollatorSubmitChallengeWitness, CollatorSubmitTaskWitness,
    CollatorUnlockBondWitness, Pattern,
};

/// Sidechain state reported by the cross-chain service
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ChainInfo {
    pub latest_height: u128,
    pub latest_hash: H256,
    /// Amount of data the checkers have to check for the new block range
    pub check_data_size: u128,
}

/// Collator publishes tasks for the sidechain blocks produced since the
/// last commit
pub fn publish_task(
    xfer: &mut CollatorPublishTaskTransformation,
    chain_info: &ChainInfo,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CollatorPublishTask,
    ) {
        return Ok(());
    }
    let committed = xfer.sidechain_state.data.committed_block_height;
    if chain_info.latest_height <= committed {
        return Err(Error::StaleChainInfo(chain_info.latest_height, committed));
    }
    if xfer.checker_lock_args.is_empty() {
        return Err(Error::NoCheckers);
    }
    let height_from = committed
        .checked_add(1)
        .ok_or(Error::Overflow("task block range"))?;

    let state = &mut xfer.sidechain_state.data;
    state.latest_block_height = chain_info.latest_height;
    state.latest_block_hash = chain_info.latest_hash;
    xfer.sidechain_bond.lock_args.unlock_sidechain_height =
        chain_info.latest_height;

    let config = &xfer.sidechain_config.data;
    let task_type = xfer.global_config.data.task_cell_type.with_args(vec![]);
    let data = TaskData {
        version: xfer.sidechain_state.data.version,
        check_block_height_from: height_from,
        check_block_height_to: chain_info.latest_height,
        check_block_hash_to: chain_info.latest_hash,
        check_data_size: chain_info.check_data_size,
        refresh_interval: config.refresh_interval,
        mode: TaskMode::Task,
    };
    xfer.tasks = xfer
        .checker_lock_args
        .iter()
        .cycle()
        .take(config.commit_threshold as usize)
        .map(|checker_lock_arg| {
            let mut task = xfer.task_prototype.clone();
            task.out_point = None;
            task.type_ = task_type.clone();
            task.data = data.clone();
            task.type_args = TaskTypeArgs {
                chain_id: config.chain_id,
                checker_lock_arg: *checker_lock_arg,
                status: TaskStatus::Open,
            };
            task
        })
        .collect();

    xfer.witness = Some(CollatorPublishTaskWitness {
        pattern: Pattern::CollatorPublishTask,
        chain_id: config.chain_id,
        bond: xfer.sidechain_bond.data.amount,
    });
    xfer.outcome.processed = true;
    debug!(
        "Publishing {} tasks for sidechain blocks {}..={}",
        xfer.tasks.len(),
        height_from,
        chain_info.latest_height
    );
    Ok(())
}

/// Commits the latest block range, pays the checkers and resets their mode
fn settle(
    state: &mut SidechainState,
    fee: &mut SidechainFee,
    checker_infos: &mut [CheckerInfo],
    amount: u128,
) -> Result<(), Error> {
    fee.data.muse_amount = fee
        .data
        .muse_amount
        .checked_add(amount)
        .ok_or(Error::Overflow("sidechain fee"))?;
    state.data.commit_latest();
    for checker_info in checker_infos {
        checker_info.data.mode = CheckerInfoMode::Idle;
    }
    Ok(())
}

/// Collator submits block range confirmed by all the checkers
pub fn submit_task(
    xfer: &mut CollatorSubmitTaskTransformation,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CollatorSubmitTask,
    ) {
        return Ok(());
    }
    if let Some(info) = xfer
        .checker_infos
        .iter()
        .find(|info| info.data.mode != CheckerInfoMode::TaskPassed)
    {
        return Err(Error::CheckerNotPassed(
            info.data.check_id,
            info.data.mode,
        ));
    }

    let fee_per_checker =
        fee_per_checker(&xfer.sidechain_config, &xfer.checker_infos)?;
    let fee = (xfer.checker_infos.len() as u128)
        .checked_mul(fee_per_checker)
        .ok_or(Error::Overflow("task fee"))?;
    settle(
        &mut xfer.sidechain_state,
        &mut xfer.sidechain_fee,
        &mut xfer.checker_infos,
        fee,
    )?;

    xfer.witness = Some(CollatorSubmitTaskWitness {
        pattern: Pattern::CollatorSubmitTask,
        chain_id: xfer.sidechain_config.data.chain_id,
        fee,
        fee_per_checker,
    });
    xfer.outcome.processed = true;
    Ok(())
}

/// Collator submits challenged block range once every checker has
/// processed the challenge; checkers which rejected the range are punished
pub fn submit_challenge(
    xfer: &mut CollatorSubmitChallengeTransformation,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CollatorSubmitChallenge,
    ) {
        return Ok(());
    }
    if let Some(info) = xfer
        .checker_infos
        .iter()
        .find(|info| !info.data.mode.is_challenge())
    {
        return Err(Error::ChallengeNotFinished(
            info.data.check_id,
            info.data.mode,
        ));
    }

    let count = |mode: CheckerInfoMode| {
        xfer.checker_infos
            .iter()
            .filter(|info| info.data.mode == mode)
            .count()
    };
    let task_count = count(CheckerInfoMode::TaskPassed);
    let valid_challenge_count = count(CheckerInfoMode::ChallengePassed);
    let punished_count = count(CheckerInfoMode::ChallengeRejected);
    if valid_challenge_count <= punished_count {
        return Err(Error::InsufficientValidChallenges(
            valid_challenge_count,
            punished_count,
        ));
    }

    let mut punish_checker_bitmap = [0u8; 32];
    for info in xfer
        .checker_infos
        .iter()
        .filter(|info| info.data.mode == CheckerInfoMode::ChallengeRejected)
    {
        bitmap_set(&mut punish_checker_bitmap, info.data.check_id);
    }

    let fee_per_checker =
        fee_per_checker(&xfer.sidechain_config, &xfer.checker_infos)?;
    let fee = ((task_count + valid_challenge_count) as u128)
        .checked_mul(fee_per_checker)
        .ok_or(Error::Overflow("challenge fee"))?;
    let task_count = u8::try_from(task_count)
        .map_err(|_| Error::Overflow("task count"))?;
    let valid_challenge_count = u8::try_from(valid_challenge_count)
        .map_err(|_| Error::Overflow("valid challenge count"))?;
    settle(
        &mut xfer.sidechain_state,
        &mut xfer.sidechain_fee,
        &mut xfer.checker_infos,
        fee,
    )?;

    xfer.witness = Some(CollatorSubmitChallengeWitness {
        pattern: Pattern::CollatorSubmitChallenge,
        chain_id: xfer.sidechain_config.data.chain_id,
        fee,
        fee_per_checker,
        punish_checker_bitmap,
        task_count,
        valid_challenge_count,
    });
    xfer.outcome.processed = true;
    Ok(())
}

/// Collator re-publishes tasks whose refresh interval has expired
pub fn refresh_task(
    xfer: &mut CollatorRefreshTaskTransformation,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CollatorRefreshTask,
    ) {
        return Ok(());
    }
    if let Some(task) =
        xfer.tasks.iter().find(|task| task.data.refresh_interval != 0)
    {
        return Err(Error::TaskNotExpired(
            task.identity().unwrap_or_default(),
            task.data.refresh_interval,
        ));
    }

    xfer.witness = Some(CollatorRefreshTaskWitness {
        pattern: Pattern::CollatorRefreshTask,
        chain_id: xfer.sidechain_config.data.chain_id,
    });
    xfer.outcome.processed = true;
    Ok(())
}

/// Collator turns its bond back into plain tokens once the sidechain has
/// committed the bond unlock height
pub fn unlock_bond(
    xfer: &mut CollatorUnlockBondTransformation,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CollatorUnlockBond,
    ) {
        return Ok(());
    }
    let unlock_height = xfer.sidechain_bond.lock_args.unlock_sidechain_height;
    let committed = xfer.sidechain_state.data.committed_block_height;
    if committed < unlock_height {
        return Err(Error::BondLocked(unlock_height, committed));
    }

    let bond = &xfer.sidechain_bond;
    xfer.sudt = Some(Sudt {
        out_point: None,
        capacity: bond.capacity,
        lock: xfer.code.lock_script()?,
        type_: bond.type_script()?,
        data: SudtData {
            amount: bond.data.amount,
        },
        lock_args: Opaque,
        type_args: Opaque,
    });
    xfer.witness = Some(CollatorUnlockBondWitness {
        pattern: Pattern::CollatorUnlockBond,
        chain_id: xfer.sidechain_config.data.chain_id,
    });
    xfer.outcome.processed = true;
    Ok(())
}
