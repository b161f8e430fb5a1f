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
    self, CellBody, CellCodec, CheckerInfo, Code, GlobalConfig,
    SidechainBond, SidechainConfig, SidechainFee, SidechainState, Sudt, Task,
};
use crate::ckb::{CellDep, CellInput, H160};
use crate::witness::{
    CollatorPublishTaskWitness, CollatorRefreshTaskWitness,
    CollatorSubmitChallengeWitness, CollatorSubmitTaskWitness,
    CollatorUnlockBondWitness, Pattern,
};

fn serialize_all<C: CellCodec>(
    cells: &[C],
) -> impl Iterator<Item = Result<CellBody, cell::Error>> + '_ {
    cells.iter().map(C::serialize)
}

fn inputs_of<C: CellCodec>(
    cells: &[C],
) -> impl Iterator<Item = Result<CellInput, cell::Error>> + '_ {
    cells.iter().map(C::to_input)
}

/// Collator publication of the tasks for the latest sidechain blocks.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// Sidechain State ->  Sidechain State
/// Sidechain Bond  ->  Sidechain Bond
///                 ->  [Task]
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollatorPublishTaskTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub sidechain_state: SidechainState,
    pub sidechain_bond: SidechainBond,
    /// Template of the produced task cells: lock script and capacity
    pub task_prototype: Task,
    /// Checkers the produced tasks are assigned to, in round-robin order
    pub checker_lock_args: Vec<H160>,
    pub tasks: Vec<Task>,
    pub witness: Option<CollatorPublishTaskWitness>,
    pub outcome: Outcome,
}

impl CollatorPublishTaskTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        sidechain_state: SidechainState,
        sidechain_bond: SidechainBond,
        task_prototype: Task,
        checker_lock_args: Vec<H160>,
    ) -> Self {
        CollatorPublishTaskTransformation {
            global_config,
            sidechain_config,
            code,
            sidechain_state,
            sidechain_bond,
            task_prototype,
            checker_lock_args,
            tasks: vec![],
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CollatorPublishTaskTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CollatorPublishTask
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
            self.sidechain_state.to_input()?,
            self.sidechain_bond.to_input()?,
        ])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        [
            self.code.serialize(),
            self.sidechain_state.serialize(),
            self.sidechain_bond.serialize(),
        ]
        .into_iter()
        .chain(serialize_all(&self.tasks))
        .collect()
    }

    impl_transformation_state!();
}

/// Collator submission of the checked tasks.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// Sidechain State ->  Sidechain State
/// Sidechain Fee   ->  Sidechain Fee
/// [Checker Info]  ->  [Checker Info]
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollatorSubmitTaskTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub sidechain_state: SidechainState,
    pub sidechain_fee: SidechainFee,
    pub checker_infos: Vec<CheckerInfo>,
    pub witness: Option<CollatorSubmitTaskWitness>,
    pub outcome: Outcome,
}

impl CollatorSubmitTaskTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        sidechain_state: SidechainState,
        sidechain_fee: SidechainFee,
        checker_infos: Vec<CheckerInfo>,
    ) -> Self {
        CollatorSubmitTaskTransformation {
            global_config,
            sidechain_config,
            code,
            sidechain_state,
            sidechain_fee,
            checker_infos,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CollatorSubmitTaskTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CollatorSubmitTask
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        [
            self.code.to_input(),
            self.sidechain_state.to_input(),
            self.sidechain_fee.to_input(),
        ]
        .into_iter()
        .chain(inputs_of(&self.checker_infos))
        .collect()
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        [
            self.code.serialize(),
            self.sidechain_state.serialize(),
            self.sidechain_fee.serialize(),
        ]
        .into_iter()
        .chain(serialize_all(&self.checker_infos))
        .collect()
    }

    impl_transformation_state!();
}

/// Collator submission of the challenged tasks; same cells as
/// [`CollatorSubmitTaskTransformation`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollatorSubmitChallengeTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub sidechain_state: SidechainState,
    pub sidechain_fee: SidechainFee,
    pub checker_infos: Vec<CheckerInfo>,
    pub witness: Option<CollatorSubmitChallengeWitness>,
    pub outcome: Outcome,
}

impl CollatorSubmitChallengeTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        sidechain_state: SidechainState,
        sidechain_fee: SidechainFee,
        checker_infos: Vec<CheckerInfo>,
    ) -> Self {
        CollatorSubmitChallengeTransformation {
            global_config,
            sidechain_config,
            code,
            sidechain_state,
            sidechain_fee,
            checker_infos,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CollatorSubmitChallengeTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CollatorSubmitChallenge
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        [
            self.code.to_input(),
            self.sidechain_state.to_input(),
            self.sidechain_fee.to_input(),
        ]
        .into_iter()
        .chain(inputs_of(&self.checker_infos))
        .collect()
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        [
            self.code.serialize(),
            self.sidechain_state.serialize(),
            self.sidechain_fee.serialize(),
        ]
        .into_iter()
        .chain(serialize_all(&self.checker_infos))
        .collect()
    }

    impl_transformation_state!();
}

/// Collator refresh of the timed out tasks.
///
/// ```text
/// Dep:    Global Config, Sidechain Config
///
/// Code            ->  Code
/// [Task]          ->  [Task]
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollatorRefreshTaskTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub code: Code,
    pub tasks: Vec<Task>,
    pub witness: Option<CollatorRefreshTaskWitness>,
    pub outcome: Outcome,
}

impl CollatorRefreshTaskTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        code: Code,
        tasks: Vec<Task>,
    ) -> Self {
        CollatorRefreshTaskTransformation {
            global_config,
            sidechain_config,
            code,
            tasks,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CollatorRefreshTaskTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CollatorRefreshTask
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        std::iter::once(self.code.to_input())
            .chain(inputs_of(&self.tasks))
            .collect()
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        std::iter::once(self.code.serialize())
            .chain(serialize_all(&self.tasks))
            .collect()
    }

    impl_transformation_state!();
}

/// Collator withdrawal of the bond once the sidechain committed the unlock
/// height.
///
/// ```text
/// Dep:    Global Config, Sidechain Config, Sidechain State
///
/// Code            ->  Code
/// Sidechain Bond  ->  Sudt
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CollatorUnlockBondTransformation {
    pub global_config: GlobalConfig,
    pub sidechain_config: SidechainConfig,
    pub sidechain_state: SidechainState,
    pub code: Code,
    pub sidechain_bond: SidechainBond,
    /// Token cell replacing the bond; created by the engine
    pub sudt: Option<Sudt>,
    pub witness: Option<CollatorUnlockBondWitness>,
    pub outcome: Outcome,
}

impl CollatorUnlockBondTransformation {
    pub fn new(
        global_config: GlobalConfig,
        sidechain_config: SidechainConfig,
        sidechain_state: SidechainState,
        code: Code,
        sidechain_bond: SidechainBond,
    ) -> Self {
        CollatorUnlockBondTransformation {
            global_config,
            sidechain_config,
            sidechain_state,
            code,
            sidechain_bond,
            sudt: None,
            witness: None,
            outcome: Outcome::default(),
        }
    }
}

impl Transformation for CollatorUnlockBondTransformation {
    fn pattern(&self) -> Pattern {
        Pattern::CollatorUnlockBond
    }

    fn cell_deps(&self) -> Result<Vec<CellDep>, cell::Error> {
        Ok(vec![
            self.global_config.to_dep()?,
            self.sidechain_config.to_dep()?,
            self.sidechain_state.to_dep()?,
        ])
    }

    fn inputs(&self) -> Result<Vec<CellInput>, cell::Error> {
        Ok(vec![self.code.to_input()?, self.sidechain_bond.to_input()?])
    }

    fn produced(&self) -> Result<Vec<CellBody>, cell::Error> {
        std::iter::once(self.code.serialize())
            .chain(self.sudt.iter().map(Sudt::serialize))
            .collect()
    }

    impl_transformation_state!();
}
