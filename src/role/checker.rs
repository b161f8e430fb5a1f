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
    compose_and_send, scan_all, scan_one, CycleError, CycleOutcome,
    QueryBuilder, Scanner, Submitter, TaskVerifier,
};
use crate::cell::{
    CellKind, CellTemplates, CheckerBond, CheckerInfo, CheckerInfoData,
    CheckerInfoMode, CheckerInfoTypeArgs, Code, GlobalConfig, Opaque,
    SidechainConfig, SidechainFee, Sudt, Task, TaskMode, TaskStatus,
};
use crate::ckb::H160;
use crate::composer::{Composer, Signer};
use crate::engine;
use crate::transformation::{
    CheckerAction, CheckerBondWithdrawTransformation,
    CheckerJoinSidechainTransformation, CheckerQuitSidechainTransformation,
    CheckerTakeBeneficiaryTransformation, CheckerTaskTransformation,
    CheckerVoteTransformation,
};

/// Data-availability checker of a single sidechain
pub struct CheckerRole<S: Signer> {
    chain_id: u8,
    templates: CellTemplates,
    composer: Composer<S>,
    scanner: Box<dyn Scanner>,
    submitter: Box<dyn Submitter>,
    verifier: Box<dyn TaskVerifier>,
}

impl<S: Signer> CheckerRole<S> {
    pub fn new(
        chain_id: u8,
        templates: CellTemplates,
        composer: Composer<S>,
        scanner: impl Scanner + 'static,
        submitter: impl Submitter + 'static,
        verifier: impl TaskVerifier + 'static,
    ) -> Self {
        CheckerRole {
            chain_id,
            templates,
            composer,
            scanner: Box::new(scanner),
            submitter: Box::new(submitter),
            verifier: Box::new(verifier),
        }
    }

    pub fn lock_arg(&self) -> H160 {
        self.composer.signer().lock_arg()
    }

    /// Single checker cycle: reacts on the first task assigned to the
    /// checker
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        let lock_arg = self.lock_arg();
        trace!("Checker {} cycle started", lock_arg.to_hex());

        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let global_config_query = queries.global_config();
        let sidechain_config_query = queries.sidechain_config();
        let code_query = queries.code(lock_arg);
        let checker_info_query = queries.checker_infos(Some(lock_arg));
        let tasks_query = queries.tasks(Some(lock_arg));
        let scanner = self.scanner.as_ref();
        let (global_config, sidechain_config, code, checker_info, tasks) = tokio::try_join!(
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<SidechainConfig, _>(scanner, &sidechain_config_query),
            scan_one::<Code, _>(scanner, &code_query),
            scan_one::<CheckerInfo, _>(scanner, &checker_info_query),
            scan_all::<Task, _>(scanner, &tasks_query),
        )?;

        let task = match tasks.into_iter().find(|task| {
            task.type_args.checker_lock_arg == lock_arg
                && task.type_args.chain_id == self.chain_id
        }) {
            Some(task) => task,
            None => {
                debug!("No tasks are assigned to the checker");
                return Ok(CycleOutcome::Idle);
            }
        };

        // Open task is claimed by a vote first and checked on the next tick
        if task.type_args.status == TaskStatus::Open {
            debug!("Voting for task {}", task.data.check_block_height_to);
            let mut xfer = CheckerVoteTransformation::new(
                global_config,
                sidechain_config,
                code,
                checker_info,
                task,
            );
            engine::checker::vote(&mut xfer)?;
            return compose_and_send(
                &self.composer,
                self.submitter.as_ref(),
                &mut xfer,
            )
            .await;
        }

        if checker_info.data.mode != CheckerInfoMode::Idle {
            debug!(
                "Checker has already reacted on the task with {} mode",
                checker_info.data.mode
            );
            return Ok(CycleOutcome::Idle);
        }

        let action = if task.data.mode == TaskMode::Challenge {
            CheckerAction::SubmitChallenge
        } else if self.verifier.verify(&task).await? {
            CheckerAction::SubmitTask
        } else {
            CheckerAction::PublishChallenge
        };
        debug!(
            "Checking sidechain blocks {}..={}: {}",
            task.data.check_block_height_from,
            task.data.check_block_height_to,
            action
        );
        let mut xfer = CheckerTaskTransformation::new(
            action,
            global_config,
            sidechain_config,
            code,
            checker_info,
            task,
        );
        match action {
            CheckerAction::SubmitTask => engine::checker::submit_task(&mut xfer)?,
            CheckerAction::SubmitChallenge => {
                engine::checker::submit_challenge(&mut xfer)?
            }
            CheckerAction::PublishChallenge => {
                engine::checker::publish_challenge(&mut xfer)?
            }
        }
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    /// Withdraws fees for the checked data into the checker MUSE cell
    pub async fn take_beneficiary(&self) -> Result<CycleOutcome, CycleError> {
        let lock_arg = self.lock_arg();
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let checker_info_query = queries.checker_infos(Some(lock_arg));
        let scanner = self.scanner.as_ref();
        let checker_info: CheckerInfo =
            scan_one(scanner, &checker_info_query).await?;
        if checker_info.data.unpaid_check_data_size == 0 {
            return Ok(CycleOutcome::Idle);
        }

        let global_config_query = queries.global_config();
        let sidechain_config_query = queries.sidechain_config();
        let code_query = queries.code(lock_arg);
        let fee_query = queries.sidechain_fee();
        let muse_query = queries.muse(lock_arg);
        let (global_config, sidechain_config, code, sidechain_fee, muse) = tokio::try_join!(
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<SidechainConfig, _>(scanner, &sidechain_config_query),
            scan_one::<Code, _>(scanner, &code_query),
            scan_one::<SidechainFee, _>(scanner, &fee_query),
            scan_one::<Sudt, _>(scanner, &muse_query),
        )?;
        let mut xfer = CheckerTakeBeneficiaryTransformation::new(
            global_config,
            sidechain_config,
            code,
            checker_info,
            sidechain_fee,
            muse,
        );
        engine::checker::take_beneficiary(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    /// Joins the sidechain with the checker bond, publishing the checker
    /// RPC URL in a new checker info cell
    pub async fn join_sidechain(
        &self,
        rpc_url: &str,
        checker_info_capacity: u64,
    ) -> Result<CycleOutcome, CycleError> {
        let lock_arg = self.lock_arg();
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let checker_info_query = queries.checker_infos(Some(lock_arg));
        let global_config_query = queries.global_config();
        let sidechain_config_query = queries.sidechain_config();
        let code_query = queries.code(lock_arg);
        let bond_query = queries.checker_bond(lock_arg);
        let scanner = self.scanner.as_ref();
        let (checker_infos, global_config, sidechain_config, code, checker_bond) = tokio::try_join!(
            scan_all::<CheckerInfo, _>(scanner, &checker_info_query),
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<SidechainConfig, _>(scanner, &sidechain_config_query),
            scan_one::<Code, _>(scanner, &code_query),
            scan_one::<CheckerBond, _>(scanner, &bond_query),
        )?;
        if let Some(info) = checker_infos.first() {
            debug!("Already joined with check id {}", info.data.check_id);
            return Ok(CycleOutcome::Idle);
        }

        let mut data = CheckerInfoData::default();
        data.set_rpc_url(rpc_url);
        let prototype = CheckerInfo::with_template(
            self.templates.get(CellKind::CheckerInfo),
            checker_info_capacity,
            data,
            Opaque,
            CheckerInfoTypeArgs::default(),
        );
        let mut xfer = CheckerJoinSidechainTransformation::new(
            global_config,
            code,
            sidechain_config,
            checker_bond,
            prototype,
        );
        engine::checker::join_sidechain(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    /// Leaves the sidechain once the collator has settled the last check
    pub async fn quit_sidechain(&self) -> Result<CycleOutcome, CycleError> {
        let lock_arg = self.lock_arg();
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let global_config_query = queries.global_config();
        let sidechain_config_query = queries.sidechain_config();
        let code_query = queries.code(lock_arg);
        let bond_query = queries.checker_bond(lock_arg);
        let checker_info_query = queries.checker_infos(Some(lock_arg));
        let scanner = self.scanner.as_ref();
        let (global_config, sidechain_config, code, checker_bond, checker_info) = tokio::try_join!(
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<SidechainConfig, _>(scanner, &sidechain_config_query),
            scan_one::<Code, _>(scanner, &code_query),
            scan_one::<CheckerBond, _>(scanner, &bond_query),
            scan_one::<CheckerInfo, _>(scanner, &checker_info_query),
        )?;
        if checker_info.data.mode != CheckerInfoMode::Idle {
            debug!(
                "Checker is in {} mode, waiting for the collator",
                checker_info.data.mode
            );
            return Ok(CycleOutcome::Idle);
        }

        let mut xfer = CheckerQuitSidechainTransformation::new(
            global_config,
            code,
            sidechain_config,
            checker_bond,
            checker_info,
        );
        engine::checker::quit_sidechain(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    /// Turns the checker bond back into MUSE tokens once no sidechain uses
    /// it
    pub async fn withdraw_bond(&self) -> Result<CycleOutcome, CycleError> {
        let lock_arg = self.lock_arg();
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let global_config_query = queries.global_config();
        let code_query = queries.code(lock_arg);
        let bond_query = queries.checker_bond(lock_arg);
        let scanner = self.scanner.as_ref();
        let (global_config, code, checker_bond) = tokio::try_join!(
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<Code, _>(scanner, &code_query),
            scan_one::<CheckerBond, _>(scanner, &bond_query),
        )?;
        if checker_bond.lock_args.chain_id_bitmap != [0u8; 32] {
            debug!("Checker bond is still used by sidechains");
            return Ok(CycleOutcome::Idle);
        }

        let mut xfer =
            CheckerBondWithdrawTransformation::new(global_config, code, checker_bond);
        engine::checker::bond_withdraw(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }
}
