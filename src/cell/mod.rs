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

//! Typed views over the live cells of the sidechain protocol.
//!
//! Every protocol entity is a [`TypedCell`] parametrized with the molecule
//! struct of its data payload and the structs of its lock & type script
//! arguments. Script code references are never derived: they come either
//! from the parsed cell or from the configured [`CellTemplate`], while the
//! arguments are always re-encoded from the typed fields on serialization.

/// Implements [`ScriptArgs`] for a molecule struct
#[macro_export]
macro_rules! impl_script_args {
    ($type:ty) => {
        impl $crate::cell::ScriptArgs for $type {
            fn from_args(
                args: &[u8],
            ) -> Result<Self, $crate::molecule::Error> {
                $crate::molecule::molecule_deserialize(&args)
            }

            fn normalize(script: &$crate::ckb::Script) -> $crate::ckb::Script {
                script.template().with_args(vec![])
            }

            fn apply(
                &self,
                script: &$crate::ckb::Script,
            ) -> Result<$crate::ckb::Script, $crate::molecule::Error> {
                use $crate::molecule::MoleculeEncode;

                Ok(script.template().with_args(self.molecule_serialize()?))
            }
        }
    };
}

mod checker;
mod code;
mod config;
mod state;
mod task;
mod templates;
mod token;

pub use checker::{
    CheckerBond, CheckerBondData, CheckerBondLockArgs, CheckerInfo,
    CheckerInfoData, CheckerInfoMode, CheckerInfoTypeArgs, CheckerStatus,
};
pub use code::{Code, CodeData, CodeLockArgs};
pub use config::{
    GlobalConfig, GlobalConfigData, SidechainConfig, SidechainConfigData,
};
pub use state::{SidechainState, SidechainStateData, SidechainStatus};
pub use task::{Task, TaskData, TaskMode, TaskStatus, TaskTypeArgs};
pub use templates::{CellTemplate, CellTemplates};
pub use token::{
    SidechainBond, SidechainBondData, SidechainBondLockArgs, SidechainFee,
    SidechainFeeData, SidechainFeeLockArgs, Sudt, SudtData,
};

use crate::ckb::{Bytes, CellDep, CellInput, CellOutput, OutPoint, Script};
use crate::molecule::{self, MoleculeDecode, MoleculeEncode};

/// Kinds of the protocol cells
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[display(Debug)]
pub enum CellKind {
    GlobalConfig,
    SidechainConfig,
    SidechainState,
    Task,
    CheckerInfo,
    CheckerBond,
    SidechainBond,
    SidechainFee,
    Code,
    Sudt,
}

/// Cell as it is returned by the chain indexer
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct LiveCell {
    pub capacity: u64,
    pub lock: Script,
    pub type_: Option<Script>,
    pub data: Bytes,
    /// `None` for cells which are not committed to the chain yet
    pub out_point: Option<OutPoint>,
}

impl LiveCell {
    /// Turns cell body produced by some view into a live cell located at the
    /// given out point
    pub fn committed(body: CellBody, out_point: OutPoint) -> Self {
        LiveCell {
            capacity: body.capacity,
            lock: body.lock,
            type_: body.type_,
            data: body.data,
            out_point: Some(out_point),
        }
    }
}

/// Contents of a transaction output: cell output plus its data
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct CellBody {
    pub capacity: u64,
    pub lock: Script,
    pub type_: Option<Script>,
    pub data: Bytes,
}

impl CellBody {
    pub fn into_output(self) -> (CellOutput, Bytes) {
        (
            CellOutput {
                capacity: self.capacity,
                lock: self.lock,
                type_: self.type_,
            },
            self.data,
        )
    }
}

/// Errors happening during parsing and serialization of the protocol cells
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// {0} cell has no out point and is not committed to the chain
    NotCommitted(CellKind),

    /// {0} cell has no type script
    NoTypeScript(CellKind),

    /// malformed {0} cell: {1}
    Codec(CellKind, molecule::Error),
}

/// Molecule struct used as a data payload of a protocol cell
pub trait CellData:
    MoleculeEncode + MoleculeDecode + Clone + Default
{
    const KIND: CellKind;
}

/// Script arguments of a protocol cell
pub trait ScriptArgs: Clone + Default {
    fn from_args(args: &[u8]) -> Result<Self, molecule::Error>;

    /// Script stored by the view: arguments which are represented by the
    /// typed fields are removed from it
    fn normalize(script: &Script) -> Script;

    /// Produces script with the same code reference and arguments encoded
    /// from `self`
    fn apply(&self, script: &Script) -> Result<Script, molecule::Error>;
}

/// Arguments whose structure is not interpreted by the client; they are
/// kept as they are in the script
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Opaque;

impl ScriptArgs for Opaque {
    fn from_args(_: &[u8]) -> Result<Self, molecule::Error> {
        Ok(Opaque)
    }

    fn normalize(script: &Script) -> Script {
        script.clone()
    }

    fn apply(&self, script: &Script) -> Result<Script, molecule::Error> {
        Ok(script.clone())
    }
}

/// Type args of the per-sidechain singletons: just the chain id
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
pub struct ChainIdArgs {
    pub chain_id: u8,
}

impl_script_args!(ChainIdArgs);

/// Protocol cell parsed into typed data and script arguments
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TypedCell<D, L = Opaque, T = Opaque> {
    /// `None` for the cells produced by the client and not yet committed
    pub out_point: Option<OutPoint>,
    pub capacity: u64,
    pub lock: Script,
    pub type_: Script,
    pub data: D,
    pub lock_args: L,
    pub type_args: T,
}

impl<D, L, T> TypedCell<D, L, T>
where
    D: CellData,
    L: ScriptArgs,
    T: ScriptArgs,
{
    /// Creates a cell not yet existing on chain from the template scripts
    pub fn with_template(
        template: &CellTemplate,
        capacity: u64,
        data: D,
        lock_args: L,
        type_args: T,
    ) -> Self {
        TypedCell {
            out_point: None,
            capacity,
            lock: L::normalize(&template.lock),
            type_: T::normalize(&template.type_),
            data,
            lock_args,
            type_args,
        }
    }

    /// Marks the cell as located at the given out point
    pub fn committed_at(mut self, out_point: OutPoint) -> Self {
        self.out_point = Some(out_point);
        self
    }

    /// Lock script with the arguments encoded from the typed fields
    pub fn lock_script(&self) -> Result<Script, Error> {
        self.lock_args
            .apply(&self.lock)
            .map_err(|err| Error::Codec(D::KIND, err))
    }

    /// Type script with the arguments encoded from the typed fields
    pub fn type_script(&self) -> Result<Script, Error> {
        self.type_args
            .apply(&self.type_)
            .map_err(|err| Error::Codec(D::KIND, err))
    }
}

/// Codec between live cells and protocol entities
pub trait CellCodec: Sized + Default {
    const KIND: CellKind;

    fn parse(cell: &LiveCell) -> Result<Self, Error>;

    fn serialize(&self) -> Result<CellBody, Error>;

    fn out_point(&self) -> Option<&OutPoint>;

    /// Deterministic identity key `<tx hash>-<index>`; `None` for the cells
    /// which are not committed yet
    fn identity(&self) -> Option<String> {
        self.out_point().map(OutPoint::identity)
    }

    /// Input consuming the cell
    fn to_input(&self) -> Result<CellInput, Error> {
        self.out_point()
            .cloned()
            .map(CellInput::new)
            .ok_or(Error::NotCommitted(Self::KIND))
    }

    /// Code dependency referencing the cell
    fn to_dep(&self) -> Result<CellDep, Error> {
        self.out_point()
            .cloned()
            .map(CellDep::code)
            .ok_or(Error::NotCommitted(Self::KIND))
    }
}

impl<D, L, T> CellCodec for TypedCell<D, L, T>
where
    D: CellData,
    L: ScriptArgs,
    T: ScriptArgs,
{
    const KIND: CellKind = D::KIND;

    fn parse(cell: &LiveCell) -> Result<Self, Error> {
        let codec_err = |err| Error::Codec(D::KIND, err);
        let out_point =
            cell.out_point.clone().ok_or(Error::NotCommitted(D::KIND))?;
        let type_ = cell.type_.clone().ok_or(Error::NoTypeScript(D::KIND))?;
        Ok(TypedCell {
            capacity: cell.capacity,
            data: D::molecule_deserialize(&cell.data).map_err(codec_err)?,
            lock_args: L::from_args(&cell.lock.args).map_err(codec_err)?,
            type_args: T::from_args(&type_.args).map_err(codec_err)?,
            lock: L::normalize(&cell.lock),
            type_: T::normalize(&type_),
            out_point: Some(out_point),
        })
    }

    fn serialize(&self) -> Result<CellBody, Error> {
        Ok(CellBody {
            capacity: self.capacity,
            lock: self.lock_script()?,
            type_: Some(self.type_script()?),
            data: self
                .data
                .molecule_serialize()
                .map_err(|err| Error::Codec(D::KIND, err))?
                .into(),
        })
    }

    fn out_point(&self) -> Option<&OutPoint> {
        self.out_point.as_ref()
    }
}
