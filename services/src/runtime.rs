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
use async_trait::async_trait;
use std::time::Duration;

use axon::role::{CheckerRole, CollatorRole, CycleError, CycleOutcome};
use axon::{Secp256k1Signer, Signer};

use crate::config::{Config, RoleKind};
use crate::error::{BootstrapError, RuntimeError};
use crate::node::{Cycle, Scheduler};
use crate::rpc::{CkbIndexer, CkbNode, SidechainNode};
use crate::shell::Command;

#[async_trait]
impl<S: Signer + 'static> Cycle for CheckerRole<S> {
    fn name(&self) -> String {
        format!("Checker {}", self.lock_arg().to_hex())
    }

    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        self.run_once().await
    }
}

#[async_trait]
impl<S: Signer + 'static> Cycle for CollatorRole<S> {
    fn name(&self) -> String {
        format!("Collator {}", self.lock_arg().to_hex())
    }

    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        self.run_once().await
    }
}

/// Checker info announced when joining a sidechain
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerProfile {
    pub rpc_url: String,
    pub info_capacity: u64,
}

impl CheckerProfile {
    pub fn with(config: &Config) -> CheckerProfile {
        CheckerProfile {
            rpc_url: config.checker_rpc_url.clone(),
            info_capacity: config.checker_info_capacity,
        }
    }
}

/// Role wired to the configured CKB & sidechain nodes
pub enum Node {
    Checker(CheckerRole<Secp256k1Signer>, CheckerProfile),
    Collator(CollatorRole<Secp256k1Signer>),
}

impl Node {
    pub fn with(config: &Config) -> Result<Node, BootstrapError> {
        let composer = config.composer()?;
        let scanner = CkbIndexer::new(&config.ckb_indexer_url);
        let submitter = CkbNode::new(&config.ckb_rpc_url);
        let sidechain = SidechainNode::new(&config.sidechain_rpc_url);
        let node = match config.role {
            RoleKind::Checker => Node::Checker(
                CheckerRole::new(
                    config.chain_id,
                    config.templates.clone(),
                    composer,
                    scanner,
                    submitter,
                    sidechain,
                ),
                CheckerProfile::with(config),
            ),
            RoleKind::Collator => Node::Collator(CollatorRole::new(
                config.chain_id,
                config.templates.clone(),
                config.task_capacity,
                composer,
                scanner,
                submitter,
                sidechain,
            )),
        };
        info!(
            "{} is configured for sidechain {}",
            node.name(),
            config.chain_id
        );
        Ok(node)
    }

    pub fn name(&self) -> String {
        match self {
            Node::Checker(role, _) => role.name(),
            Node::Collator(role) => role.name(),
        }
    }

    /// Executes the command: `Run` never returns, the others run the
    /// operation once
    pub async fn exec(
        self,
        command: &Command,
        period: Duration,
    ) -> Result<CycleOutcome, RuntimeError> {
        let outcome = match (command, self) {
            (Command::Run, Node::Checker(role, _)) => {
                Scheduler::new(role, period).run_loop().await;
                CycleOutcome::Idle
            }
            (Command::Run, Node::Collator(role)) => {
                Scheduler::new(role, period).run_loop().await;
                CycleOutcome::Idle
            }
            (Command::TakeBeneficiary, Node::Checker(role, _)) => {
                role.take_beneficiary().await?
            }
            (Command::JoinSidechain, Node::Checker(role, profile)) => {
                role.join_sidechain(&profile.rpc_url, profile.info_capacity)
                    .await?
            }
            (Command::QuitSidechain, Node::Checker(role, _)) => {
                role.quit_sidechain().await?
            }
            (Command::WithdrawBond, Node::Checker(role, _)) => {
                role.withdraw_bond().await?
            }
            (Command::RefreshTasks, Node::Collator(role)) => {
                role.refresh_tasks().await?
            }
            (Command::UnlockBond, Node::Collator(role)) => {
                role.unlock_bond().await?
            }
            (command, node) => {
                return Err(RuntimeError::UnsupportedCommand(
                    command.to_string(),
                    node.name(),
                ))
            }
        };
        info!("{}", outcome);
        Ok(outcome)
    }
}
