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

use super::{CellData, CellKind, Opaque, TypedCell};
use crate::ckb::{H160, H256};

/// What the checkers are asked to do with a block range
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
pub enum TaskMode {
    /// Check the block range
    Task = 0,

    /// Re-check the block range after some checker published a challenge
    Challenge = 1,
}

impl Default for TaskMode {
    fn default() -> Self {
        TaskMode::Task
    }
}

impl_enum_molecule_encoding!(TaskMode);

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
pub enum TaskStatus {
    /// Task is not yet taken by its checker
    Open = 0,
    PassedAsTask = 1,
    Challenged = 2,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Open
    }
}

impl_enum_molecule_encoding!(TaskStatus);

#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    MoleculeEncode,
    MoleculeDecode,
)]
pub struct TaskData {
    pub version: u8,
    pub check_block_height_from: u128,
    pub check_block_height_to: u128,
    pub check_block_hash_to: H256,
    pub check_data_size: u128,
    pub refresh_interval: u16,
    pub mode: TaskMode,
}

impl CellData for TaskData {
    const KIND: CellKind = CellKind::Task;
}

/// Task type args: the sidechain, the checker the task is assigned to and
/// the task status
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
pub struct TaskTypeArgs {
    pub chain_id: u8,
    pub checker_lock_arg: H160,
    pub status: TaskStatus,
}

impl_script_args!(TaskTypeArgs);

pub type Task = TypedCell<TaskData, Opaque, TaskTypeArgs>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::test::{assert_roundtrip, template};
    use crate::cell::{CellCodec, Error, LiveCell};
    use crate::ckb::OutPoint;
    use crate::molecule::{self, MoleculeDecode};

    fn task() -> Task {
        let mut task = Task::with_template(
            &template(5),
            2000,
            TaskData {
                version: 1,
                check_block_height_from: 11,
                check_block_height_to: 20,
                check_block_hash_to: H256([4u8; 32]),
                check_data_size: 300,
                refresh_interval: 0,
                mode: TaskMode::Challenge,
            },
            Opaque,
            TaskTypeArgs {
                chain_id: 1,
                checker_lock_arg: [6u8; 20],
                status: TaskStatus::PassedAsTask,
            },
        );
        task.out_point = Some(OutPoint::new(H256([1u8; 32]), 2));
        task
    }

    #[test]
    fn test_task_layout() {
        assert_eq!(TaskData::STATIC_SIZE, Some(84));
        assert_eq!(TaskTypeArgs::STATIC_SIZE, Some(22));
        let live = assert_roundtrip(&task(), 84);
        assert_eq!(live.data[83], 1);
        let args = live.type_.unwrap().args;
        assert_eq!(args.len(), 22);
        assert_eq!(args[0], 1);
        assert_eq!(args[21], 1);
    }

    #[test]
    fn test_modes_exhaustive() {
        test_enum_u8_exhaustive!(TaskMode;
            TaskMode::Task => 0,
            TaskMode::Challenge => 1
        );
        test_enum_u8_exhaustive!(TaskStatus;
            TaskStatus::Open => 0,
            TaskStatus::PassedAsTask => 1,
            TaskStatus::Challenged => 2
        );
    }

    #[test]
    fn test_bad_type_args() {
        let body = task().serialize().unwrap();
        let mut live = LiveCell::committed(body, OutPoint::default());
        let mut type_ = live.type_.clone().unwrap();
        type_.args = vec![1u8; 21].into();
        live.type_ = Some(type_);
        assert_eq!(
            Task::parse(&live).unwrap_err(),
            Error::Codec(CellKind::Task, molecule::Error::LengthMismatch(22, 21))
        );
    }
}
