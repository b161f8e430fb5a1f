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

use super::{impl_transformation_state, Outcome, Transformation};
use crate::cell::{
    self, CellBody, CellCodec, CheckerBond, CheckerInfo, CheckerInfoMode,
    Code, GlobalConfig, SidechainConfig, SidechainFee, Sudt, Task,
};
use crate::ckb::{CellDep, CellInput};
use crate::witness::{
    CheckerBondWithdrawWitness, CheckerTakeBeneficiaryWitness,
    CheckerVoteWitness, CheckerWitness, Pattern,
};

/// Checker decision on the task assigned to it
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display(Debug)]
pub enum CheckerAction {
    /// Task block range is valid
    SubmitTask,

    /// Challenged block range is confirmed by the checker
    SubmitChallenge,

    /// Task block range is invalid
    PublishChallenge,
}

impl CheckerAction {
    pub fn pattern(self) -> Pattern {
        match self {
            CheckerAction::SubmitTask => Pattern::CheckerSubmitTask,
            CheckerAction::SubmitChallenge => Pattern::CheckerSubmitChallenge,
            CheckerAction::PublishChallenge => {
                Pattern::CheckerPublishChallenge
            }
        }
    }

    /// Checker info mode recorded by the action
    pub fn mode(self) -> CheckerInfoMode {
        match self {
            CheckerAction::SubmitTask => CheckerInfoMode::TaskPassed,
            CheckerAction::SubmitChallenge => CheckerInfoMode::ChallengePassed,
            CheckerAction::PublishChallenge => {
                CheckerInfoMode::ChallengeRejected
            }
        }
    }
}

/// Checker submit-task, submit-challenge & publish-challenge transitions.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// Checker Info    ->  Checker Info
/// Task            ->  Task
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerTaskTransformation {
    pub action: CheckerAction,
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub checker_info: CheckerInfo,
    pub task: Task,
    pub witness: Option<CheckerWitness>,
    pub outcome: Outcome,
}

impl CheckerTaskTransformation {
    pub fn new(
        action: CheckerAction,
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        checker_info: CheckerInfo,
        task: Task,
    ) -> Self {
        CheckerTaskTransformation {
            action,
            global_config,
            sidechain_config,
            code,
            checker_info,
            task,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerTaskTransformation {
    fn pattern(&self) -> Pattern {
        self.action.pattern()
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![
            self.code.to_input()?,
            self.checker_info.to_input()?,
            self.task.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        Ok(vec![
            self.code.serialize()?,
            self.checker_info.serialize()?,
            self.task.serialize()?,
        ])
    }

    impl_transformation_state!();
}

/// Checker vote on an open task.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// Checker Info    ->  Checker Info
/// Task            ->  Task
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerVoteTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub checker_info: CheckerInfo,
    pub task: Task,
    pub witness: Option<CheckerVoteWitness>,
    pub outcome: Outcome,
}

impl CheckerVoteTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        checker_info: CheckerInfo,
        task: Task,
    ) -> Self {
        CheckerVoteTransformation {
            global_config,
            sidechain_config,
            code,
            checker_info,
            task,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerVoteTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CheckerVote
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![
            self.code.to_input()?,
            self.checker_info.to_input()?,
            self.task.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        Ok(vec![
            self.code.serialize()?,
            self.checker_info.serialize()?,
            self.task.serialize()?,
        ])
    }

    impl_transformation_state!();
}

/// Checker withdrawal of the fees earned for the checked data.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// Checker Info    ->  Checker Info
/// Sidechain Fee   ->  Sidechain Fee
/// Muse Token      ->  Muse Token
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerTakeBeneficiaryTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub checker_info: CheckerInfo,
    pub sidechain_fee: SidechainFee,
    pub muse: Sudt,
    pub witness: Option<CheckerTakeBeneficiaryWitness>,
    pub outcome: Outcome,
}

impl CheckerTakeBeneficiaryTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        checker_info: CheckerInfo,
        sidechain_fee: SidechainFee,
        muse: Sudt,
    ) -> Self {
        CheckerTakeBeneficiaryTransformation {
            global_config,
            sidechain_config,
            code,
            checker_info,
            sidechain_fee,
            muse,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerTakeBeneficiaryTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CheckerTakeBeneficiary
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![
            self.code.to_input()?,
            self.checker_info.to_input()?,
            self.sidechain_fee.to_input()?,
            self.muse.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        Ok(vec![
            self.code.serialize()?,
            self.checker_info.serialize()?,
            self.sidechain_fee.serialize()?,
            self.muse.serialize()?,
        ])
    }

    impl_transformation_state!();
}

/// Checker joining a sidechain with its bond.
///
/// ```text
/// Dep:    Global Config
///
/// Code             ->  Code
/// Sidechain Config ->  Sidechain Config
/// Checker Bond     ->  Checker Bond
///                  ->  Checker Info
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerJoinSidechainTransformation {
    pub global_config: GlobalConfig,
    pub code: Code,
    pub sidechain_config: SidechainConfig,
    pub checker_bond: CheckerBond,
    /// Capacity, scripts & RPC URL of the checker info cell to create
    pub checker_info_prototype: CheckerInfo,
    /// Created by the engine
    pub checker_info: Option<CheckerInfo>,
    pub witness: Option<CheckerWitness>,
    pub outcome: Outcome,
}

impl CheckerJoinSidechainTransformation {
    pub fn new(
        global_config: GlobalConfig,
        code: Code,
        sidechain_config: SidechainConfig,
        checker_bond: CheckerBond,
        checker_info_prototype: CheckerInfo,
    ) -> Self {
        CheckerJoinSidechainTransformation {
            global_config,
            code,
            sidechain_config,
            checker_bond,
            checker_info_prototype,
            checker_info: None,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerJoinSidechainTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CheckerJoinSidechain
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![self.global_config.to_dep()?])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![
            self.code.to_input()?,
            self.sidechain_config.to_input()?,
            self.checker_bond.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        [
            self.code.serialize(),
            self.sidechain_config.serialize(),
            self.checker_bond.serialize(),
        ]
        .into_iter()
        .chain(self.checker_info.iter().map(CheckerInfo::serialize))
        .collect()
    }

    impl_transformation_state!();
}

/// Checker leaving a sidechain; its checker info cell is destroyed.
///
/// ```text
/// Dep:    Global Config
///
/// Code             ->  Code
/// Sidechain Config ->  Sidechain Config
/// Checker Bond     ->  Checker Bond
/// Checker Info     ->
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerQuitSidechainTransformation {
    pub global_config: GlobalConfig,
    pub code: Code,
    pub sidechain_config: SidechainConfig,
    pub checker_bond: CheckerBond,
    pub checker_info: CheckerInfo,
    pub witness: Option<CheckerWitness>,
    pub outcome: Outcome,
}

impl CheckerQuitSidechainTransformation {
    pub fn new(
        global_config: GlobalConfig,
        code: Code,
        sidechain_config: SidechainConfig,
        checker_bond: CheckerBond,
        checker_info: CheckerInfo,
    ) -> Self {
        CheckerQuitSidechainTransformation {
            global_config,
            code,
            sidechain_config,
            checker_bond,
            checker_info,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerQuitSidechainTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CheckerQuitSidechain
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![self.global_config.to_dep()?])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![
            self.code.to_input()?,
            self.sidechain_config.to_input()?,
            self.checker_bond.to_input()?,
            self.checker_info.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        Ok(vec![
            self.code.serialize()?,
            self.sidechain_config.serialize()?,
            self.checker_bond.serialize()?,
        ])
    }

    impl_transformation_state!();
}

/// Checker withdrawal of a bond no longer used by any sidechain.
///
/// ```text
/// Dep:    Global Config
///
/// Code             ->  Code
/// Checker Bond     ->  Muse Token
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CheckerBondWithdrawTransformation {
    pub global_config: GlobalConfig,
    pub code: Code,
    pub checker_bond: CheckerBond,
    /// Token cell replacing the bond; created by the engine
    pub muse: Option<Sudt>,
    pub witness: Option<CheckerBondWithdrawWitness>,
    pub outcome: Outcome,
}

impl CheckerBondWithdrawTransformation {
    pub fn new(
        global_config: GlobalConfig,
        code: Code,
        checker_bond: CheckerBond,
    ) -> Self {
        CheckerBondWithdrawTransformation {
            global_config,
            code,
            checker_bond,
            muse: None,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CheckerBondWithdrawTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CheckerBondWithdraw
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![self.global_config.to_dep()?])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![self.code.to_input()?, self.checker_bond.to_input()?])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        std::iter::once(self.code.serialize())
            .chain(self.muse.iter().map(Sudt::serialize))
            .collect()
    }

    impl_transformation_state!();
}
