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

//! Candidate transactions under construction.
//!
//! A transformation is created by the role cycle with the dependency and
//! consumed cells, mutated by exactly one engine operation and turned into
//! a signed transaction by exactly one [`crate::Composer::compose`] call.

mod checker;
mod collator;

pub use checker::{
    CheckerAction, CheckerBondWithdrawTransformation,
    CheckerJoinSidechainTransformation, CheckerQuitSidechainTransformation,
    CheckerTakeBeneficiaryTransformation, CheckerTaskTransformation,
    CheckerVoteTransformation,
};
pub use collator::{
    CollatorPublishTaskTransformation, CollatorRefreshTaskTransformation,
    CollatorSubmitChallengeTransformation, CollatorSubmitTaskTransformation,
    CollatorUnlockBondTransformation,
};

use crate::cell::{self, CellBody};
use crate::ckb::{Bytes, CellDep, CellInput, Transaction, H256};
use crate::witness::{self, Pattern, Witness};

/// Signed transaction together with its hash
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ComposedTransaction {
    pub tx: Transaction,
    pub hash: H256,
}

/// Progress of a transformation
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Outcome {
    /// Set by the engine once the cells are updated and the witness is
    /// created
    pub processed: bool,

    /// Set by the engine when the transition must not happen this time;
    /// composer leaves skipped transformations untouched
    pub skip: bool,

    /// Set by the composer
    pub composed: Option<ComposedTransaction>,
}

pub trait Transformation {
    fn pattern(&self) -> Pattern;

    /// Dependencies specific to the transition, in their order within the
    /// transaction
    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error>;

    /// Inputs consuming the cells, with `since` set to zero
    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error>;

    /// Cells produced by the transition: consumed cells in their order,
    /// possibly followed by newly created ones
    fn produced(&self) -> Result<Vec<CellBody>, cell::Error>;

    /// Outputs of the transaction; empty until the engine processes the
    /// transformation
    fn outputs(&self) -> Result<Vec<CellBody>, cell::Error> {
        if self.outcome().processed {
            self.produced()
        } else {
            Ok(vec![])
        }
    }

    /// Serialized pattern witness; `None` until the engine creates it
    fn witness(&self) -> Result<Option<Bytes>, witness::Error>;

    fn outcome(&self) -> &Outcome;

    fn outcome_mut(&mut self) -> &mut Outcome;

    /// Hash of the composed transaction, if any
    fn tx_hash(&self) -> Option<H256> {
        self.outcome().composed.as_ref().map(|composed| composed.hash)
    }
}

pub(crate) fn encode_witness<W: Witness>(
    witness: &Option<W>,
) -> Result<Option<Bytes>, witness::Error> {
    witness.as_ref().map(W::to_input_type).transpose()
}

/// Implements the boilerplate part of [`Transformation`]: pattern,
/// witness and outcome accessors
macro_rules! impl_transformation_state {
    () => {
        fn witness(
            &self,
        ) -> Result<Option<$crate::ckb::Bytes>, $crate::witness::Error> {
            $crate::transformation::encode_witness(&self.witness)
        }

        fn outcome(&self) -> &$crate::transformation::Outcome {
            &self.outcome
        }

        fn outcome_mut(&mut self) -> &mut $crate::transformation::Outcome {
            &mut self.outcome
        }
    };
}
pub(crate) use impl_transformation_state;
