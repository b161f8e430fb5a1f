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

//! Witnesses of the protocol transitions.
//!
//! Each witness starts with the [`Pattern`] byte naming the transition,
//! followed by the transition-specific fields in the molecule struct layout.
//! Serialized witness is carried in [`crate::ckb::WitnessArgs::input_type`].

use crate::ckb::{Bytes, H160};
use crate::molecule::{self, MoleculeDecode, MoleculeEncode};

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    FromPrimitive,
    ToPrimitive,
)]
#[display(Debug)]
#[repr(u8)]
pub enum Pattern {
    AdminCreateSidechain = 0,
    CheckerBondWithdraw = 1,
    CheckerJoinSidechain = 2,
    CheckerQuitSidechain = 3,
    CheckerSubmitTask = 4,
    CheckerPublishChallenge = 5,
    CheckerSubmitChallenge = 6,
    CheckerTakeBeneficiary = 7,
    CollatorPublishTask = 8,
    CollatorSubmitTask = 9,
    CollatorSubmitChallenge = 10,
    CollatorRefreshTask = 11,
    CollatorUnlockBond = 12,
    CheckerVote = 13,
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::AdminCreateSidechain
    }
}

impl_enum_molecule_encoding!(Pattern);

#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// malformed witness: {0}
    #[from]
    Molecule(molecule::Error),

    /// witness pattern {0} does not match the witness type
    UnexpectedPattern(Pattern),
}

/// Witness of a protocol transition
pub trait Witness: MoleculeEncode + MoleculeDecode {
    fn pattern(&self) -> Pattern;

    /// Whether the witness type is used by the transition with the given
    /// pattern
    fn accepts(pattern: Pattern) -> bool;

    /// Bytes for the `input_type` field of the witness args
    fn to_input_type(&self) -> Result<Bytes, Error> {
        if !Self::accepts(self.pattern()) {
            return Err(Error::UnexpectedPattern(self.pattern()));
        }
        Ok(self.molecule_serialize()?.into())
    }

    fn from_input_type(data: &[u8]) -> Result<Self, Error> {
        let pattern = Pattern::molecule_decode(data)?;
        if !Self::accepts(pattern) {
            return Err(Error::UnexpectedPattern(pattern));
        }
        Ok(Self::molecule_deserialize(data)?)
    }
}

macro_rules! impl_witness {
    ($type:ty; $( $pattern:path ),+) => {
        impl Witness for $type {
            fn pattern(&self) -> Pattern {
                self.pattern
            }

            fn accepts(pattern: Pattern) -> bool {
                matches!(pattern, $( $pattern )|+)
            }
        }
    };
}

/// Witness shared by the checker transitions identified by the check id:
/// task processing and sidechain membership
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
pub struct CheckerWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub check_id: u8,
}

impl_witness!(
    CheckerWitness;
    Pattern::CheckerSubmitTask,
    Pattern::CheckerSubmitChallenge,
    Pattern::CheckerPublishChallenge,
    Pattern::CheckerJoinSidechain,
    Pattern::CheckerQuitSidechain
);

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
pub struct CheckerBondWithdrawWitness {
    pub pattern: Pattern,
}

impl_witness!(CheckerBondWithdrawWitness; Pattern::CheckerBondWithdraw);

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
pub struct CheckerVoteWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub checker_lock_arg: H160,
}

impl_witness!(CheckerVoteWitness; Pattern::CheckerVote);

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
pub struct CheckerTakeBeneficiaryWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub check_id: u8,
    pub fee: u128,
}

impl_witness!(CheckerTakeBeneficiaryWitness; Pattern::CheckerTakeBeneficiary);

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
pub struct CollatorPublishTaskWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub bond: u128,
}

impl_witness!(CollatorPublishTaskWitness; Pattern::CollatorPublishTask);

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
pub struct CollatorSubmitTaskWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub fee: u128,
    pub fee_per_checker: u128,
}

impl_witness!(CollatorSubmitTaskWitness; Pattern::CollatorSubmitTask);

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
pub struct CollatorSubmitChallengeWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
    pub fee: u128,
    pub fee_per_checker: u128,
    /// Bit per check id of the checkers which rejected a valid task
    pub punish_checker_bitmap: [u8; 32],
    pub task_count: u8,
    pub valid_challenge_count: u8,
}

impl_witness!(
    CollatorSubmitChallengeWitness;
    Pattern::CollatorSubmitChallenge
);

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
pub struct CollatorRefreshTaskWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
}

impl_witness!(CollatorRefreshTaskWitness; Pattern::CollatorRefreshTask);

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
pub struct CollatorUnlockBondWitness {
    pub pattern: Pattern,
    pub chain_id: u8,
}

impl_witness!(CollatorUnlockBondWitness; Pattern::CollatorUnlockBond);
