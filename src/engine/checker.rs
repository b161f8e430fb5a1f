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

use amplify::hex::ToHex;

use super::{
    bitmap_clear, bitmap_contains, bitmap_first_free, bitmap_set,
    quorum_guard, Error,
};
use crate::cell::{
    CheckerBond, CheckerInfoData, CheckerInfoMode, CheckerInfoTypeArgs,
    CheckerStatus, Code, Opaque, Sudt, SudtData, TaskMode, TaskStatus,
};
use crate::transformation::{
    CheckerAction, CheckerBondWithdrawTransformation,
    CheckerJoinSidechainTransformation, CheckerQuitSidechainTransformation,
    CheckerTakeBeneficiaryTransformation, CheckerTaskTransformation,
    CheckerVoteTransformation,
};
use crate::witness::{
    CheckerBondWithdrawWitness, CheckerTakeBeneficiaryWitness,
    CheckerVoteWitness, CheckerWitness, Pattern,
};

fn process_task(
    xfer: &mut CheckerTaskTransformation,
    action: CheckerAction,
) -> Result<(), Error> {
    xfer.action = action;
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        action.pattern(),
    ) {
        return Ok(());
    }

    xfer.checker_info.data.mode = action.mode();
    xfer.witness = Some(CheckerWitness {
        pattern: action.pattern(),
        chain_id: xfer.sidechain_config.data.chain_id,
        check_id: xfer.checker_info.data.check_id,
    });
    xfer.outcome.processed = true;
    debug!(
        "Checker {} moved to {} mode",
        xfer.checker_info.data.check_id, xfer.checker_info.data.mode
    );
    Ok(())
}

/// Checker confirms the task block range
pub fn submit_task(xfer: &mut CheckerTaskTransformation) -> Result<(), Error> {
    process_task(xfer, CheckerAction::SubmitTask)
}

/// Checker confirms the challenged block range
pub fn submit_challenge(
    xfer: &mut CheckerTaskTransformation,
) -> Result<(), Error> {
    process_task(xfer, CheckerAction::SubmitChallenge)
}

/// Checker rejects the task block range
pub fn publish_challenge(
    xfer: &mut CheckerTaskTransformation,
) -> Result<(), Error> {
    process_task(xfer, CheckerAction::PublishChallenge)
}

/// Checker takes an open task
pub fn vote(xfer: &mut CheckerVoteTransformation) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CheckerVote,
    ) {
        return Ok(());
    }
    if xfer.task.type_args.status != TaskStatus::Open {
        return Err(Error::TaskNotOpen(xfer.task.type_args.status));
    }

    xfer.checker_info.type_args.status = CheckerStatus::Relaying;
    xfer.task.type_args.status = match xfer.task.data.mode {
        TaskMode::Task => TaskStatus::PassedAsTask,
        TaskMode::Challenge => TaskStatus::Challenged,
    };
    xfer.witness = Some(CheckerVoteWitness {
        pattern: Pattern::CheckerVote,
        chain_id: xfer.sidechain_config.data.chain_id,
        checker_lock_arg: xfer.checker_info.type_args.checker_lock_arg,
    });
    xfer.outcome.processed = true;
    Ok(())
}

/// Checker withdraws MUSE tokens for all the data it checked and was not
/// paid for
pub fn take_beneficiary(
    xfer: &mut CheckerTakeBeneficiaryTransformation,
) -> Result<(), Error> {
    if !quorum_guard(
        &xfer.sidechain_config,
        &mut xfer.outcome,
        Pattern::CheckerTakeBeneficiary,
    ) {
        return Ok(());
    }
    let unpaid = xfer.checker_info.data.unpaid_check_data_size;
    if unpaid == 0 {
        info!(
            "Checker {} has no unpaid checked data",
            xfer.checker_info.data.check_id
        );
        xfer.outcome.skip = true;
        return Ok(());
    }

    let fee = unpaid
        .checked_mul(xfer.sidechain_config.data.check_fee_rate)
        .ok_or(Error::Overflow("checker fee"))?;
    let available = xfer.sidechain_fee.data.muse_amount;
    xfer.sidechain_fee.data.muse_amount = available
        .checked_sub(fee)
        .ok_or(Error::InsufficientFee(available, fee))?;
    xfer.muse.data.amount = xfer
        .muse
        .data
        .amount
        .checked_add(fee)
        .ok_or(Error::Overflow("checker MUSE balance"))?;
    xfer.checker_info.data.unpaid_check_data_size = 0;

    xfer.witness = Some(CheckerTakeBeneficiaryWitness {
        pattern: Pattern::CheckerTakeBeneficiary,
        chain_id: xfer.sidechain_config.data.chain_id,
        check_id: xfer.checker_info.data.check_id,
        fee,
    });
    xfer.outcome.processed = true;
    Ok(())
}

/// Fails unless the bond belongs to the owner of the code cell
fn check_bond_owner(code: &Code, bond: &CheckerBond) -> Result<(), Error> {
    let owner = bond.lock_args.checker_lock_arg;
    if owner != code.lock_args.lock_arg {
        return Err(Error::BondOwnerMismatch(owner.to_hex()));
    }
    Ok(())
}

/// Checker joins the sidechain: the bond is marked as used by the sidechain
/// and a new checker info cell takes the lowest free check id.
///
/// Membership changes are not guarded by the sidechain quorum since they
/// are how the quorum is reached.
pub fn join_sidechain(
    xfer: &mut CheckerJoinSidechainTransformation,
) -> Result<(), Error> {
    check_bond_owner(&xfer.code, &xfer.checker_bond)?;
    let config = &mut xfer.sidechain_config.data;
    let chain_id = config.chain_id;
    let bond = &mut xfer.checker_bond;
    if bond.data.amount < config.minimal_bond {
        return Err(Error::InsufficientBond(
            bond.data.amount,
            config.minimal_bond,
        ));
    }
    if bitmap_contains(&bond.lock_args.chain_id_bitmap, chain_id) {
        return Err(Error::AlreadyJoined(chain_id));
    }
    let check_id =
        bitmap_first_free(&config.checker_bitmap).ok_or(Error::NoFreeCheckId)?;
    config.checker_total_count = config
        .checker_total_count
        .checked_add(1)
        .ok_or(Error::Overflow("checker count"))?;
    bitmap_set(&mut config.checker_bitmap, check_id);
    bitmap_set(&mut bond.lock_args.chain_id_bitmap, chain_id);

    let checker_lock_arg = bond.lock_args.checker_lock_arg;
    let mut checker_info = xfer.checker_info_prototype.clone();
    checker_info.out_point = None;
    checker_info.data = CheckerInfoData {
        chain_id,
        check_id,
        unpaid_check_data_size: 0,
        rpc_url: checker_info.data.rpc_url,
        checker_pub_key_hash: checker_lock_arg,
        mode: CheckerInfoMode::Idle,
    };
    checker_info.type_args = CheckerInfoTypeArgs {
        chain_id,
        checker_lock_arg,
        status: CheckerStatus::Relaying,
    };
    xfer.checker_info = Some(checker_info);

    xfer.witness = Some(CheckerWitness {
        pattern: Pattern::CheckerJoinSidechain,
        chain_id,
        check_id,
    });
    xfer.outcome.processed = true;
    debug!("Joining sidechain {} with check id {}", chain_id, check_id);
    Ok(())
}

/// Checker leaves the sidechain: its checker info cell is destroyed and
/// the bond is released from the sidechain. The check id stays taken in
/// the sidechain checker bitmap.
pub fn quit_sidechain(
    xfer: &mut CheckerQuitSidechainTransformation,
) -> Result<(), Error> {
    check_bond_owner(&xfer.code, &xfer.checker_bond)?;
    let config = &mut xfer.sidechain_config.data;
    let chain_id = config.chain_id;
    let info = &xfer.checker_info;
    if info.type_args.checker_lock_arg != xfer.checker_bond.lock_args.checker_lock_arg
    {
        return Err(Error::BondOwnerMismatch(
            xfer.checker_bond.lock_args.checker_lock_arg.to_hex(),
        ));
    }
    if info.data.mode != CheckerInfoMode::Idle {
        return Err(Error::CheckerBusy(info.data.check_id, info.data.mode));
    }
    let bitmap = &mut xfer.checker_bond.lock_args.chain_id_bitmap;
    if !bitmap_contains(bitmap, chain_id) {
        return Err(Error::NotJoined(chain_id));
    }
    config.checker_total_count =
        config.checker_total_count.checked_sub(1).ok_or(Error::NoCheckers)?;
    bitmap_clear(bitmap, chain_id);

    xfer.witness = Some(CheckerWitness {
        pattern: Pattern::CheckerQuitSidechain,
        chain_id,
        check_id: info.data.check_id,
    });
    xfer.outcome.processed = true;
    debug!(
        "Leaving sidechain {} with check id {}",
        chain_id, info.data.check_id
    );
    Ok(())
}

/// Checker turns a bond which is not used by any sidechain back into MUSE
/// tokens owned by the code cell lock
pub fn bond_withdraw(
    xfer: &mut CheckerBondWithdrawTransformation,
) -> Result<(), Error> {
    check_bond_owner(&xfer.code, &xfer.checker_bond)?;
    let bond = &xfer.checker_bond;
    if bond.lock_args.chain_id_bitmap != [0u8; 32] {
        return Err(Error::BondInUse);
    }

    xfer.muse = Some(Sudt {
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
    xfer.witness = Some(CheckerBondWithdrawWitness {
        pattern: Pattern::CheckerBondWithdraw,
    });
    xfer.outcome.processed = true;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::CheckerInfoMode;
    use crate::engine::test::*;
    use crate::transformation::Transformation;

    fn task_xfer(
        total: u8,
        threshold: u8,
        task_mode: TaskMode,
    ) -> CheckerTaskTransformation {
        CheckerTaskTransformation::new(
            CheckerAction::SubmitTask,
            global_config(),
            sidechain_config(total, threshold),
            code(checker_lock_arg(0)),
            checker_info(0, 0, CheckerInfoMode::Idle),
            task(0, task_mode, TaskStatus::PassedAsTask),
        )
    }

    fn vote_xfer(total: u8, status: TaskStatus) -> CheckerVoteTransformation {
        let mut info = checker_info(0, 0, CheckerInfoMode::Idle);
        info.type_args.status = CheckerStatus::Quit;
        CheckerVoteTransformation::new(
            global_config(),
            sidechain_config(total, 1),
            code(checker_lock_arg(0)),
            info,
            task(0, TaskMode::Challenge, status),
        )
    }

    fn beneficiary_xfer(
        total: u8,
        unpaid: u128,
        fee_amount: u128,
    ) -> CheckerTakeBeneficiaryTransformation {
        CheckerTakeBeneficiaryTransformation::new(
            global_config(),
            sidechain_config(total, 1),
            code(checker_lock_arg(0)),
            checker_info(0, unpaid, CheckerInfoMode::Idle),
            fee(fee_amount),
            muse(7),
        )
    }

    #[test]
    fn test_submit_task() {
        let mut xfer = task_xfer(1, 1, TaskMode::Task);
        submit_task(&mut xfer).unwrap();
        assert!(xfer.outcome().processed);
        assert!(!xfer.outcome().skip);
        assert_eq!(xfer.checker_info.data.mode, CheckerInfoMode::TaskPassed);
        assert_eq!(
            xfer.witness,
            Some(CheckerWitness {
                pattern: Pattern::CheckerSubmitTask,
                chain_id: CHAIN_ID,
                check_id: 0,
            })
        );
        assert_eq!(xfer.outputs().unwrap().len(), 3);
    }

    #[test]
    fn test_challenge_actions() {
        let mut xfer = task_xfer(2, 1, TaskMode::Challenge);
        submit_challenge(&mut xfer).unwrap();
        assert_eq!(xfer.pattern(), Pattern::CheckerSubmitChallenge);
        assert_eq!(
            xfer.checker_info.data.mode,
            CheckerInfoMode::ChallengePassed
        );

        let mut xfer = task_xfer(2, 1, TaskMode::Task);
        publish_challenge(&mut xfer).unwrap();
        assert_eq!(xfer.pattern(), Pattern::CheckerPublishChallenge);
        assert_eq!(
            xfer.checker_info.data.mode,
            CheckerInfoMode::ChallengeRejected
        );
        assert_eq!(
            xfer.witness.unwrap().pattern,
            Pattern::CheckerPublishChallenge
        );
    }

    #[test]
    fn test_vote() {
        let mut xfer = vote_xfer(1, TaskStatus::Open);
        vote(&mut xfer).unwrap();
        assert_eq!(xfer.checker_info.type_args.status, CheckerStatus::Relaying);
        assert_eq!(xfer.task.type_args.status, TaskStatus::Challenged);
        assert_eq!(
            xfer.witness.unwrap().checker_lock_arg,
            checker_lock_arg(0)
        );

        let mut xfer = vote_xfer(1, TaskStatus::Open);
        xfer.task.data.mode = TaskMode::Task;
        vote(&mut xfer).unwrap();
        assert_eq!(xfer.task.type_args.status, TaskStatus::PassedAsTask);

        let mut xfer = vote_xfer(1, TaskStatus::PassedAsTask);
        assert_eq!(
            vote(&mut xfer).unwrap_err(),
            Error::TaskNotOpen(TaskStatus::PassedAsTask)
        );
        assert!(!xfer.outcome().processed);
    }

    #[test]
    fn test_take_beneficiary() {
        let mut xfer = beneficiary_xfer(1, 5, 100);
        take_beneficiary(&mut xfer).unwrap();
        assert_eq!(xfer.sidechain_fee.data.muse_amount, 50);
        assert_eq!(xfer.muse.data.amount, 57);
        assert_eq!(xfer.checker_info.data.unpaid_check_data_size, 0);
        assert_eq!(xfer.witness.unwrap().fee, 50);

        let mut xfer = beneficiary_xfer(1, 0, 100);
        take_beneficiary(&mut xfer).unwrap();
        assert!(xfer.outcome().skip);
        assert_eq!(xfer.witness, None);

        let mut xfer = beneficiary_xfer(1, 5, 49);
        assert_eq!(
            take_beneficiary(&mut xfer).unwrap_err(),
            Error::InsufficientFee(49, 50)
        );

        let mut xfer = beneficiary_xfer(1, u128::MAX, 0);
        assert_eq!(
            take_beneficiary(&mut xfer).unwrap_err(),
            Error::Overflow("checker fee")
        );
    }

    #[test]
    fn test_no_quorum() {
        let mut xfer = task_xfer(0, 1, TaskMode::Task);
        let before = xfer.clone();
        submit_task(&mut xfer).unwrap();
        assert!(xfer.outcome().skip);
        assert!(!xfer.outcome().processed);
        assert_eq!(xfer.checker_info, before.checker_info);
        assert_eq!(xfer.witness, None);
        assert_eq!(xfer.outputs().unwrap(), vec![]);

        let ops: [fn(&mut CheckerTaskTransformation) -> Result<(), Error>; 2] =
            [submit_challenge, publish_challenge];
        for op in ops {
            let mut xfer = task_xfer(0, 1, TaskMode::Challenge);
            op(&mut xfer).unwrap();
            assert!(xfer.outcome().skip);
            assert_eq!(xfer.checker_info, before.checker_info);
        }

        let mut xfer = vote_xfer(0, TaskStatus::Challenged);
        vote(&mut xfer).unwrap();
        assert!(xfer.outcome().skip);
        assert_eq!(xfer.witness, None);

        let mut xfer = beneficiary_xfer(0, 5, 100);
        take_beneficiary(&mut xfer).unwrap();
        assert!(xfer.outcome().skip);
        assert_eq!(xfer.sidechain_fee.data.muse_amount, 100);
    }

    fn chain_bitmap() -> [u8; 32] {
        let mut bitmap = [0u8; 32];
        bitmap_set(&mut bitmap, CHAIN_ID);
        bitmap
    }

    fn join_xfer(total: u8, amount: u128) -> CheckerJoinSidechainTransformation {
        let mut config = sidechain_config(total, 1);
        config.data.minimal_bond = 100;
        // check ids 0 & 1 are taken
        config.data.checker_bitmap[0] = 0b0000_0011;
        CheckerJoinSidechainTransformation::new(
            global_config(),
            code(checker_lock_arg(2)),
            config,
            checker_bond(checker_lock_arg(2), amount, [0u8; 32]),
            checker_info_prototype(),
        )
    }

    fn quit_xfer(total: u8, mode: CheckerInfoMode) -> CheckerQuitSidechainTransformation {
        let mut config = sidechain_config(total, 1);
        config.data.checker_bitmap[0] = 0b0000_0001;
        CheckerQuitSidechainTransformation::new(
            global_config(),
            code(checker_lock_arg(0)),
            config,
            checker_bond(checker_lock_arg(0), 500, chain_bitmap()),
            checker_info(0, 0, mode),
        )
    }

    fn withdraw_xfer(chain_id_bitmap: [u8; 32]) -> CheckerBondWithdrawTransformation {
        CheckerBondWithdrawTransformation::new(
            global_config(),
            code(checker_lock_arg(0)),
            checker_bond(checker_lock_arg(0), 500, chain_id_bitmap),
        )
    }

    #[test]
    fn test_join_sidechain() {
        // joining is how the quorum is reached, so it is never skipped
        let mut xfer = join_xfer(0, 100);
        join_sidechain(&mut xfer).unwrap();
        assert!(xfer.outcome().processed);
        assert!(!xfer.outcome().skip);

        let config = &xfer.sidechain_config.data;
        assert_eq!(config.checker_total_count, 1);
        assert_eq!(config.checker_bitmap[0], 0b0000_0111);
        assert_eq!(xfer.checker_bond.lock_args.chain_id_bitmap, chain_bitmap());
        assert_eq!(xfer.checker_bond.data.amount, 100);

        let info = xfer.checker_info.clone().unwrap();
        assert_eq!(info.out_point, None);
        assert_eq!(info.capacity, 800);
        assert_eq!(info.data.chain_id, CHAIN_ID);
        assert_eq!(info.data.check_id, 2);
        assert_eq!(info.data.unpaid_check_data_size, 0);
        assert_eq!(info.data.checker_pub_key_hash, checker_lock_arg(2));
        assert_eq!(info.data.mode, CheckerInfoMode::Idle);
        assert_eq!(info.data.rpc_url(), Some("http://checker:8000"));
        assert_eq!(info.type_args.checker_lock_arg, checker_lock_arg(2));
        assert_eq!(info.type_args.status, CheckerStatus::Relaying);

        assert_eq!(
            xfer.witness.unwrap(),
            CheckerWitness {
                pattern: Pattern::CheckerJoinSidechain,
                chain_id: CHAIN_ID,
                check_id: 2,
            }
        );
        assert_eq!(xfer.inputs().unwrap().len(), 3);
        assert_eq!(xfer.cell_deps().unwrap().len(), 1);
        assert_eq!(xfer.outputs().unwrap().len(), 4);
    }

    #[test]
    fn test_join_sidechain_failures() {
        let mut xfer = join_xfer(1, 99);
        assert_eq!(
            join_sidechain(&mut xfer).unwrap_err(),
            Error::InsufficientBond(99, 100)
        );
        assert_eq!(xfer.sidechain_config.data.checker_total_count, 1);
        assert_eq!(xfer.checker_info, None);

        let mut xfer = join_xfer(1, 100);
        xfer.checker_bond.lock_args.chain_id_bitmap = chain_bitmap();
        assert_eq!(
            join_sidechain(&mut xfer).unwrap_err(),
            Error::AlreadyJoined(CHAIN_ID)
        );

        let mut xfer = join_xfer(1, 100);
        xfer.sidechain_config.data.checker_bitmap = [0xFF; 32];
        assert_eq!(join_sidechain(&mut xfer).unwrap_err(), Error::NoFreeCheckId);

        let mut xfer = join_xfer(255, 100);
        assert_eq!(
            join_sidechain(&mut xfer).unwrap_err(),
            Error::Overflow("checker count")
        );

        let mut xfer = join_xfer(1, 100);
        xfer.code = code(checker_lock_arg(3));
        assert_eq!(
            join_sidechain(&mut xfer).unwrap_err(),
            Error::BondOwnerMismatch(checker_lock_arg(2).to_hex())
        );
        assert!(!xfer.outcome().processed);
    }

    #[test]
    fn test_quit_sidechain() {
        let mut xfer = quit_xfer(2, CheckerInfoMode::Idle);
        quit_sidechain(&mut xfer).unwrap();
        assert!(xfer.outcome().processed);
        assert_eq!(xfer.sidechain_config.data.checker_total_count, 1);
        // check id is not reused
        assert_eq!(xfer.sidechain_config.data.checker_bitmap[0], 0b0000_0001);
        assert_eq!(xfer.checker_bond.lock_args.chain_id_bitmap, [0u8; 32]);
        assert_eq!(
            xfer.witness.unwrap(),
            CheckerWitness {
                pattern: Pattern::CheckerQuitSidechain,
                chain_id: CHAIN_ID,
                check_id: 0,
            }
        );
        assert_eq!(xfer.inputs().unwrap().len(), 4);
        // checker info is destroyed
        assert_eq!(xfer.outputs().unwrap().len(), 3);
    }

    #[test]
    fn test_quit_sidechain_failures() {
        let mut xfer = quit_xfer(2, CheckerInfoMode::TaskPassed);
        assert_eq!(
            quit_sidechain(&mut xfer).unwrap_err(),
            Error::CheckerBusy(0, CheckerInfoMode::TaskPassed)
        );
        assert_eq!(xfer.checker_bond.lock_args.chain_id_bitmap, chain_bitmap());

        let mut xfer = quit_xfer(2, CheckerInfoMode::Idle);
        xfer.checker_bond.lock_args.chain_id_bitmap = [0u8; 32];
        assert_eq!(
            quit_sidechain(&mut xfer).unwrap_err(),
            Error::NotJoined(CHAIN_ID)
        );

        let mut xfer = quit_xfer(0, CheckerInfoMode::Idle);
        assert_eq!(quit_sidechain(&mut xfer).unwrap_err(), Error::NoCheckers);

        let mut xfer = quit_xfer(2, CheckerInfoMode::Idle);
        xfer.checker_info = checker_info(1, 0, CheckerInfoMode::Idle);
        assert_eq!(
            quit_sidechain(&mut xfer).unwrap_err(),
            Error::BondOwnerMismatch(checker_lock_arg(0).to_hex())
        );
    }

    #[test]
    fn test_bond_withdraw() {
        let mut xfer = withdraw_xfer([0u8; 32]);
        bond_withdraw(&mut xfer).unwrap();
        let muse = xfer.muse.clone().unwrap();
        assert_eq!(muse.data.amount, 500);
        assert_eq!(muse.capacity, xfer.checker_bond.capacity);
        assert_eq!(muse.lock, xfer.code.lock_script().unwrap());
        assert_eq!(muse.type_, xfer.checker_bond.type_script().unwrap());
        assert_eq!(xfer.witness.unwrap().pattern, Pattern::CheckerBondWithdraw);
        let outputs = xfer.outputs().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].data.as_slice(), &500u128.to_le_bytes());

        let mut xfer = withdraw_xfer(chain_bitmap());
        assert_eq!(bond_withdraw(&mut xfer).unwrap_err(), Error::BondInUse);
        assert_eq!(xfer.muse, None);
    }
}
