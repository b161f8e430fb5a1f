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

use std::io;

use super::{blake2b_256, Bytes, Script, H256};
use crate::molecule::{
    DynVec, Error, FixVec, MoleculeDecode, MoleculeEncode, TableBuilder,
    TableReader,
};

/// Size of the recoverable secp256k1 signature placed into the witness lock
pub const SIGNATURE_SIZE: usize = 65;

/// Reference to a cell created by some transaction output
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Default,
    Display,
    MoleculeEncode,
    MoleculeDecode,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[display("{tx_hash}-{index}")]
pub struct OutPoint {
    pub tx_hash: H256,
    pub index: u32,
}

impl OutPoint {
    pub fn new(tx_hash: H256, index: u32) -> Self {
        OutPoint { tx_hash, index }
    }

    /// Identity key of the cell referenced by the out point
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

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
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
#[display(Debug)]
#[repr(u8)]
pub enum DepType {
    /// The referenced cell holds the code
    Code = 0,

    /// The referenced cell holds a list of out points to be used as deps
    DepGroup = 1,
}

impl Default for DepType {
    fn default() -> Self {
        DepType::Code
    }
}

impl_enum_molecule_encoding!(DepType);

#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    Display,
    MoleculeEncode,
    MoleculeDecode,
)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[display("{out_point}:{dep_type}")]
pub struct CellDep {
    pub out_point: OutPoint,
    pub dep_type: DepType,
}

impl CellDep {
    pub fn code(out_point: OutPoint) -> Self {
        CellDep {
            out_point,
            dep_type: DepType::Code,
        }
    }
}

#[derive(
    Clone, PartialEq, Eq, Hash, Debug, Default, MoleculeEncode, MoleculeDecode,
)]
pub struct CellInput {
    pub since: u64,
    pub previous_output: OutPoint,
}

impl CellInput {
    pub fn new(previous_output: OutPoint) -> Self {
        CellInput {
            since: 0,
            previous_output,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct CellOutput {
    pub capacity: u64,
    pub lock: Script,
    pub type_: Option<Script>,
}

impl MoleculeEncode for CellOutput {
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        TableBuilder::new()
            .push(&self.capacity)?
            .push(&self.lock)?
            .push(&self.type_)?
            .encode(e)
    }
}

impl MoleculeDecode for CellOutput {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        let table = TableReader::read(d, 3, false)?;
        Ok(CellOutput {
            capacity: table.field(0)?,
            lock: table.field(1)?,
            type_: table.opt_field(2)?,
        })
    }
}

/// Structured witness: signature goes into `lock`, while `input_type` and
/// `output_type` carry data for type scripts of the inputs and outputs
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct WitnessArgs {
    pub lock: Option<Bytes>,
    pub input_type: Option<Bytes>,
    pub output_type: Option<Bytes>,
}

impl WitnessArgs {
    /// Witness with zero-filled signature placeholder, which is used for
    /// computing signature message
    pub fn placeholder(input_type: Option<Bytes>) -> Self {
        WitnessArgs {
            lock: Some(Bytes::from(vec![0u8; SIGNATURE_SIZE])),
            input_type,
            output_type: None,
        }
    }
}

impl MoleculeEncode for WitnessArgs {
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        TableBuilder::new()
            .push(&self.lock)?
            .push(&self.input_type)?
            .push(&self.output_type)?
            .encode(e)
    }
}

impl MoleculeDecode for WitnessArgs {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        let table = TableReader::read(d, 3, false)?;
        Ok(WitnessArgs {
            lock: table.opt_field(0)?,
            input_type: table.opt_field(1)?,
            output_type: table.opt_field(2)?,
        })
    }
}

/// Transaction body covered by the transaction hash
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct RawTransaction {
    pub version: u32,
    pub cell_deps: FixVec<CellDep>,
    pub header_deps: FixVec<H256>,
    pub inputs: FixVec<CellInput>,
    pub outputs: DynVec<CellOutput>,
    pub outputs_data: DynVec<Bytes>,
}

impl RawTransaction {
    /// Transaction hash: BLAKE2b-256 of the serialized raw transaction
    pub fn hash(&self) -> Result<H256, Error> {
        self.molecule_serialize().map(blake2b_256).map(H256)
    }
}

impl MoleculeEncode for RawTransaction {
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        TableBuilder::new()
            .push(&self.version)?
            .push(&self.cell_deps)?
            .push(&self.header_deps)?
            .push(&self.inputs)?
            .push(&self.outputs)?
            .push(&self.outputs_data)?
            .encode(e)
    }
}

impl MoleculeDecode for RawTransaction {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        let table = TableReader::read(d, 6, false)?;
        let raw = RawTransaction {
            version: table.field(0)?,
            cell_deps: table.field(1)?,
            header_deps: table.field(2)?,
            inputs: table.field(3)?,
            outputs: table.field(4)?,
            outputs_data: table.field(5)?,
        };
        if raw.outputs.len() != raw.outputs_data.len() {
            return Err(Error::DataIntegrityError(format!(
                "transaction has {} outputs but {} output data items",
                raw.outputs.len(),
                raw.outputs_data.len()
            )));
        }
        Ok(raw)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Transaction {
    pub raw: RawTransaction,
    pub witnesses: DynVec<Bytes>,
}

impl Transaction {
    pub fn hash(&self) -> Result<H256, Error> {
        self.raw.hash()
    }
}

impl MoleculeEncode for Transaction {
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        TableBuilder::new()
            .push(&self.raw)?
            .push(&self.witnesses)?
            .encode(e)
    }
}

impl MoleculeDecode for Transaction {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        let table = TableReader::read(d, 2, false)?;
        Ok(Transaction {
            raw: table.field(0)?,
            witnesses: table.field(1)?,
        })
    }
}
