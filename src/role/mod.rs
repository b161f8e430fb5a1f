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

//! Role cycles: one tick of the checker or collator decision procedure.
//!
//! A cycle scans the chain through the [`Scanner`] collaborator, picks the
//! protocol transition, runs the engine operation on a fresh
//! transformation, composes the transaction and hands it to the
//! [`Submitter`]. At most one transaction is sent per cycle.

mod checker;
mod collator;

pub use checker::CheckerRole;
pub use collator::CollatorRole;

use async_trait::async_trait;

use crate::cell::{self, CellCodec, CellKind, CellTemplates, LiveCell, Task};
use crate::ckb::{Bytes, HashType, Script, Transaction, H160, H256};
use crate::composer::{self, Composer, Signer};
use crate::engine::{self, ChainInfo};
use crate::transformation::{ComposedTransaction, Transformation};

/// Filter matching scripts by their code reference and arguments prefix
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ScriptFilter {
    pub code_hash: H256,
    pub hash_type: HashType,
    pub args_prefix: Bytes,
}

impl ScriptFilter {
    pub fn new(script: &Script, args_prefix: impl Into<Bytes>) -> Self {
        ScriptFilter {
            code_hash: script.code_hash,
            hash_type: script.hash_type,
            args_prefix: args_prefix.into(),
        }
    }

    pub fn matches(&self, script: &Script) -> bool {
        script.code_hash == self.code_hash
            && script.hash_type == self.hash_type
            && script.args.starts_with(&self.args_prefix)
    }
}

/// Query for the live cells of a given kind
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CellQuery {
    pub kind: CellKind,
    pub lock: Option<ScriptFilter>,
    pub type_: Option<ScriptFilter>,
}

impl CellQuery {
    pub fn matches(&self, cell: &LiveCell) -> bool {
        let lock_matches = self
            .lock
            .as_ref()
            .map(|filter| filter.matches(&cell.lock))
            .unwrap_or(true);
        let type_matches = match (&self.type_, &cell.type_) {
            (None, _) => true,
            (Some(filter), Some(script)) => filter.matches(script),
            (Some(_), None) => false,
        };
        lock_matches && type_matches
    }
}

/// Builds cell queries of a sidechain from the configured script templates
#[derive(Clone, Copy, Debug)]
pub struct QueryBuilder<'a> {
    templates: &'a CellTemplates,
    chain_id: u8,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(templates: &'a CellTemplates, chain_id: u8) -> Self {
        QueryBuilder {
            templates,
            chain_id,
        }
    }

    fn query(
        &self,
        kind: CellKind,
        lock_prefix: Option<Vec<u8>>,
        type_prefix: Vec<u8>,
    ) -> CellQuery {
        let template = self.templates.get(kind);
        CellQuery {
            kind,
            lock: lock_prefix
                .map(|prefix| ScriptFilter::new(&template.lock, prefix)),
            type_: Some(ScriptFilter::new(&template.type_, type_prefix)),
        }
    }

    fn chain_prefix(&self, lock_arg: Option<H160>) -> Vec<u8> {
        let mut prefix = vec![self.chain_id];
        prefix.extend(lock_arg.iter().flatten());
        prefix
    }

    pub fn global_config(&self) -> CellQuery {
        self.query(CellKind::GlobalConfig, None, vec![])
    }

    pub fn sidechain_config(&self) -> CellQuery {
        self.query(CellKind::SidechainConfig, None, self.chain_prefix(None))
    }

    pub fn sidechain_state(&self) -> CellQuery {
        self.query(CellKind::SidechainState, None, self.chain_prefix(None))
    }

    /// Code cell owned by the role
    pub fn code(&self, lock_arg: H160) -> CellQuery {
        self.query(CellKind::Code, Some(lock_arg.to_vec()), vec![])
    }

    /// Checker info cells of the sidechain, optionally of a single checker
    pub fn checker_infos(&self, checker: Option<H160>) -> CellQuery {
        self.query(CellKind::CheckerInfo, None, self.chain_prefix(checker))
    }

    /// Task cells of the sidechain, optionally assigned to a single checker
    pub fn tasks(&self, checker: Option<H160>) -> CellQuery {
        self.query(CellKind::Task, None, self.chain_prefix(checker))
    }

    /// Bond cell of the checker
    pub fn checker_bond(&self, checker: H160) -> CellQuery {
        self.query(CellKind::CheckerBond, Some(checker.to_vec()), vec![])
    }

    pub fn sidechain_bond(&self, collator: H160) -> CellQuery {
        self.query(
            CellKind::SidechainBond,
            Some(self.chain_prefix(Some(collator))),
            vec![],
        )
    }

    pub fn sidechain_fee(&self) -> CellQuery {
        self.query(
            CellKind::SidechainFee,
            Some(self.chain_prefix(None)),
            vec![],
        )
    }

    /// MUSE token cell owned by the given lock arg
    pub fn muse(&self, owner: H160) -> CellQuery {
        self.query(CellKind::Sudt, Some(owner.to_vec()), vec![])
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum ScanError {
    /// no live {0} cell is found
    NotFound(CellKind),

    /// cell indexer failure: {0}
    Indexer(String),

    #[from]
    #[display(inner)]
    Cell(cell::Error),
}

/// Failure of an external service used by the role
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum CollaboratorError {
    /// service is not available: {0}
    Unavailable(String),

    /// service returned invalid response: {0}
    InvalidResponse(String),
}

#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum CycleError {
    #[from]
    #[display(inner)]
    Scan(ScanError),

    #[from]
    #[display(inner)]
    Engine(engine::Error),

    #[from]
    #[display(inner)]
    Compose(composer::Error),

    #[from]
    #[display(inner)]
    Collaborator(CollaboratorError),

    /// sidechain state is in unexpected status: {0}
    UnexpectedStatus(String),
}

/// Result of a single cycle
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
pub enum CycleOutcome {
    /// There is nothing to do this time
    #[display("idle")]
    Idle,

    /// The sidechain has not enough checkers
    #[display("skipped")]
    Skipped,

    #[display("submitted {0}")]
    Submitted(H256),

    /// Submitter refused the transaction; it will be retried on the next
    /// tick
    #[display("rejected {0}")]
    Rejected(H256),
}

/// Cell indexer
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Returns live cells matching the query, optionally as of the given
    /// block number
    async fn scan(
        &self,
        query: &CellQuery,
        as_of_block: Option<u64>,
    ) -> Result<Vec<LiveCell>, ScanError>;
}

/// Transaction submission client
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Returns `false` if the transaction is not accepted; transport errors
    /// are reported as `false` too
    async fn send(&self, tx: &Transaction) -> bool;
}

/// Cross-chain service reporting the sidechain progress
#[async_trait]
pub trait CrossChain: Send + Sync {
    async fn chain_info(&self) -> Result<ChainInfo, CollaboratorError>;
}

/// Verifier of the sidechain blocks covered by a task
#[async_trait]
pub trait TaskVerifier: Send + Sync {
    async fn verify(&self, task: &Task) -> Result<bool, CollaboratorError>;
}

/// Parses the first cell matching the query
pub async fn scan_one<C, S>(scanner: &S, query: &CellQuery) -> Result<C, CycleError>
where
    C: CellCodec,
    S: Scanner + ?Sized,
{
    let cells = scanner.scan(query, None).await?;
    let cell = cells.first().ok_or(ScanError::NotFound(C::KIND))?;
    Ok(C::parse(cell).map_err(ScanError::from)?)
}

/// Parses all the cells matching the query
pub async fn scan_all<C, S>(
    scanner: &S,
    query: &CellQuery,
) -> Result<Vec<C>, CycleError>
where
    C: CellCodec,
    S: Scanner + ?Sized,
{
    let cells = scanner.scan(query, None).await?;
    Ok(cells
        .iter()
        .map(C::parse)
        .collect::<Result<_, _>>()
        .map_err(ScanError::from)?)
}

/// Composes the processed transformation and sends the transaction
pub(crate) async fn compose_and_send<T, S, U>(
    composer: &Composer<S>,
    submitter: &U,
    transformation: &mut T,
) -> Result<CycleOutcome, CycleError>
where
    T: Transformation + ?Sized,
    S: Signer,
    U: Submitter + ?Sized,
{
    let pattern = transformation.pattern();
    if transformation.outcome().skip {
        return Ok(CycleOutcome::Skipped);
    }
    composer.compose(transformation)?;
    let ComposedTransaction { tx, hash } =
        match transformation.outcome().composed.clone() {
            Some(composed) => composed,
            None => return Ok(CycleOutcome::Skipped),
        };
    if submitter.send(&tx).await {
        info!("Submitted {} transaction {}", pattern, hash);
        Ok(CycleOutcome::Submitted(hash))
    } else {
        warn!("{} transaction {} is not accepted", pattern, hash);
        Ok(CycleOutcome::Rejected(hash))
    }
}
