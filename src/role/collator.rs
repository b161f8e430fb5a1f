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
use std::collections::HashSet;

use super::{
    compose_and_send, scan_all, scan_one, CrossChain, CycleError,
    CycleOutcome, QueryBuilder, Scanner, Submitter,
};
use crate::cell::{
    CellKind, CellTemplates, CheckerInfo, CheckerInfoMode, CheckerStatus,
    Code, GlobalConfig, Opaque, SidechainBond, SidechainConfig, SidechainFee,
    SidechainState, SidechainStatus, Task, TaskData, TaskStatus,
    TaskTypeArgs,
};
use crate::ckb::H160;
use crate::composer::{Composer, Signer};
use crate::engine;
use crate::transformation::{
    CollatorPublishTaskTransformation, CollatorRefreshTaskTransformation,
    CollatorSubmitChallengeTransformation, CollatorSubmitTaskTransformation,
    CollatorUnlockBondTransformation,
};

/// Collator of a single sidechain: publishes tasks for the new sidechain
/// blocks and commits block ranges confirmed by the checkers
pub struct CollatorRole<S: Signer> {
    chain_id: u8,
    templates: CellTemplates,
    /// Capacity of the newly published task cells
    task_capacity: u64,
    composer: Composer<S>,
    scanner: Box<dyn Scanner>,
    submitter: Box<dyn Submitter>,
    cross_chain: Box<dyn CrossChain>,
}

/// Cells read at the start of every collator cycle
struct Sidechain {
    global_config: GlobalConfig,
    sidechain_config: SidechainConfig,
    sidechain_state: SidechainState,
    code: Code,
}

impl<S: Signer> CollatorRole<S> {
    pub fn new(
        chain_id: u8,
        templates: CellTemplates,
        task_capacity: u64,
        composer: Composer<S>,
        scanner: impl Scanner + 'static,
        submitter: impl Submitter + 'static,
        cross_chain: impl CrossChain + 'static,
    ) -> Self {
        CollatorRole {
            chain_id,
            templates,
            task_capacity,
            composer,
            scanner: Box::new(scanner),
            submitter: Box::new(submitter),
            cross_chain: Box::new(cross_chain),
        }
    }

    pub fn lock_arg(&self) -> H160 {
        self.composer.signer().lock_arg()
    }

    async fn sidechain(&self) -> Result<Sidechain, CycleError> {
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let global_config_query = queries.global_config();
        let sidechain_config_query = queries.sidechain_config();
        let sidechain_state_query = queries.sidechain_state();
        let code_query = queries.code(self.lock_arg());
        let scanner = self.scanner.as_ref();
        let (global_config, sidechain_config, sidechain_state, code) = tokio::try_join!(
            scan_one::<GlobalConfig, _>(scanner, &global_config_query),
            scan_one::<SidechainConfig, _>(scanner, &sidechain_config_query),
            scan_one::<SidechainState, _>(scanner, &sidechain_state_query),
            scan_one::<Code, _>(scanner, &code_query),
        )?;
        Ok(Sidechain {
            global_config,
            sidechain_config,
            sidechain_state,
            code,
        })
    }

    /// Single collator cycle driven by the sidechain state status
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        trace!("Collator {} cycle started", self.lock_arg().to_hex());
        let sidechain = self.sidechain().await?;
        let state = &sidechain.sidechain_state.data;
        match state.status() {
            Some(SidechainStatus::WaitingForPublish) => {
                self.publish_task(sidechain).await
            }
            Some(SidechainStatus::WaitingForSubmit) => {
                self.submit(sidechain).await
            }
            None => Err(CycleError::UnexpectedStatus(format!(
                "committed height {} is above the latest height {}",
                state.committed_block_height, state.latest_block_height
            ))),
        }
    }

    async fn publish_task(
        &self,
        sidechain: Sidechain,
    ) -> Result<CycleOutcome, CycleError> {
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let bond_query = queries.sidechain_bond(self.lock_arg());
        let checker_infos_query = queries.checker_infos(None);
        let scanner = self.scanner.as_ref();
        let cross_chain = self.cross_chain.as_ref();
        let (sidechain_bond, checker_infos, chain_info) = tokio::try_join!(
            scan_one::<SidechainBond, _>(scanner, &bond_query),
            scan_all::<CheckerInfo, _>(scanner, &checker_infos_query),
            async { Ok::<_, CycleError>(cross_chain.chain_info().await?) },
        )?;

        let committed = sidechain.sidechain_state.data.committed_block_height;
        if chain_info.latest_height <= committed {
            debug!(
                "No new sidechain blocks above committed height {}",
                committed
            );
            return Ok(CycleOutcome::Idle);
        }

        let checker_lock_args = checker_infos
            .iter()
            .filter(|info| info.type_args.status == CheckerStatus::Relaying)
            .map(|info| info.type_args.checker_lock_arg)
            .collect();
        let task_prototype = Task::with_template(
            self.templates.get(CellKind::Task),
            self.task_capacity,
            TaskData::default(),
            Opaque,
            TaskTypeArgs::default(),
        );
        let mut xfer = CollatorPublishTaskTransformation::new(
            sidechain.global_config,
            sidechain.sidechain_config,
            sidechain.code,
            sidechain.sidechain_state,
            sidechain_bond,
            task_prototype,
            checker_lock_args,
        );
        engine::collator::publish_task(&mut xfer, &chain_info)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    async fn submit(
        &self,
        sidechain: Sidechain,
    ) -> Result<CycleOutcome, CycleError> {
        let queries = QueryBuilder::new(&self.templates, self.chain_id);
        let checker_infos_query = queries.checker_infos(None);
        let tasks_query = queries.tasks(None);
        let fee_query = queries.sidechain_fee();
        let scanner = self.scanner.as_ref();
        let (checker_infos, tasks, sidechain_fee) = tokio::try_join!(
            scan_all::<CheckerInfo, _>(scanner, &checker_infos_query),
            scan_all::<Task, _>(scanner, &tasks_query),
            scan_one::<SidechainFee, _>(scanner, &fee_query),
        )?;

        // Only checkers owning a task of the published range take part in
        // the submission
        let latest = sidechain.sidechain_state.data.latest_block_height;
        let assigned: HashSet<H160> = tasks
            .iter()
            .filter(|task| task.data.check_block_height_to == latest)
            .map(|task| task.type_args.checker_lock_arg)
            .collect();
        let checker_infos: Vec<CheckerInfo> = checker_infos
            .into_iter()
            .filter(|info| assigned.contains(&info.type_args.checker_lock_arg))
            .collect();

        let has_quorum = sidechain.sidechain_config.data.has_quorum();
        if checker_infos.is_empty() && has_quorum {
            debug!("No checker infos are assigned to sidechain height {}", latest);
            return Ok(CycleOutcome::Idle);
        }
        let waiting = checker_infos
            .iter()
            .filter(|info| info.data.mode == CheckerInfoMode::Idle)
            .count();
        if waiting > 0 && has_quorum {
            debug!("Waiting for {} checkers to react on the tasks", waiting);
            return Ok(CycleOutcome::Idle);
        }

        if checker_infos.iter().any(|info| info.data.mode.is_challenge()) {
            let mut xfer = CollatorSubmitChallengeTransformation::new(
                sidechain.global_config,
                sidechain.sidechain_config,
                sidechain.code,
                sidechain.sidechain_state,
                sidechain_fee,
                checker_infos,
            );
            engine::collator::submit_challenge(&mut xfer)?;
            compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
                .await
        } else {
            let mut xfer = CollatorSubmitTaskTransformation::new(
                sidechain.global_config,
                sidechain.sidechain_config,
                sidechain.code,
                sidechain.sidechain_state,
                sidechain_fee,
                checker_infos,
            );
            engine::collator::submit_task(&mut xfer)?;
            compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
                .await
        }
    }

    /// Re-publishes open tasks whose refresh interval has expired
    pub async fn refresh_tasks(&self) -> Result<CycleOutcome, CycleError> {
        let sidechain = self.sidechain().await?;
        let tasks_query =
            QueryBuilder::new(&self.templates, self.chain_id).tasks(None);
        let tasks: Vec<Task> =
            scan_all(self.scanner.as_ref(), &tasks_query).await?;
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| {
                task.type_args.status == TaskStatus::Open
                    && task.data.refresh_interval == 0
            })
            .collect();
        if tasks.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        let mut xfer = CollatorRefreshTaskTransformation::new(
            sidechain.global_config,
            sidechain.sidechain_config,
            sidechain.code,
            tasks,
        );
        engine::collator::refresh_task(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }

    /// Returns the collator bond once the sidechain has committed the bond
    /// unlock height
    pub async fn unlock_bond(&self) -> Result<CycleOutcome, CycleError> {
        let sidechain = self.sidechain().await?;
        let bond_query = QueryBuilder::new(&self.templates, self.chain_id)
            .sidechain_bond(self.lock_arg());
        let sidechain_bond: SidechainBond =
            scan_one(self.scanner.as_ref(), &bond_query).await?;
        let unlock_height = sidechain_bond.lock_args.unlock_sidechain_height;
        let committed = sidechain.sidechain_state.data.committed_block_height;
        if committed < unlock_height {
            debug!(
                "Bond is locked till sidechain height {}, committed {}",
                unlock_height, committed
            );
            return Ok(CycleOutcome::Idle);
        }

        let mut xfer = CollatorUnlockBondTransformation::new(
            sidechain.global_config,
            sidechain.sidechain_config,
            sidechain.sidechain_state,
            sidechain.code,
            sidechain_bond,
        );
        engine::collator::unlock_bond(&mut xfer)?;
        compose_and_send(&self.composer, self.submitter.as_ref(), &mut xfer)
            .await
    }
}
