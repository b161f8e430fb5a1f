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

use super::{blake2b_256, Bytes, H256};
use crate::molecule::{
    Error, MoleculeDecode, MoleculeEncode, TableBuilder, TableReader,
};

/// The way script `code_hash` is matched against the cell deps of a
/// transaction
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
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[repr(u8)]
pub enum HashType {
    /// Code hash is a hash of the cell data
    #[display("data")]
    Data = 0,

    /// Code hash is a hash of the cell type script
    #[display("type")]
    Type = 1,

    /// Code hash is a hash of the cell data, running on the VM version 1
    #[display("data1")]
    Data1 = 2,
}

impl Default for HashType {
    fn default() -> Self {
        HashType::Data
    }
}

impl_enum_molecule_encoding!(HashType);

/// Code reference of a script without the arguments
#[derive(
    Clone,
    Copy,
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
#[display("{code_hash}/{hash_type}")]
pub struct ScriptTemplate {
    pub code_hash: H256,
    pub hash_type: HashType,
}

impl ScriptTemplate {
    pub fn new(code_hash: H256, hash_type: HashType) -> Self {
        ScriptTemplate {
            code_hash,
            hash_type,
        }
    }

    /// Constructs script instance with the given arguments
    pub fn with_args(&self, args: impl Into<Bytes>) -> Script {
        Script {
            code_hash: self.code_hash,
            hash_type: self.hash_type,
            args: args.into(),
        }
    }

    /// Checks whether the script runs the code of this template
    pub fn matches(&self, script: &Script) -> bool {
        self.code_hash == script.code_hash && self.hash_type == script.hash_type
    }
}

impl From<&Script> for ScriptTemplate {
    fn from(script: &Script) -> Self {
        script.template()
    }
}

/// CKB script: reference to the code plus arguments. Encoded as a molecule
/// table with three fields.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Script {
    pub code_hash: H256,
    pub hash_type: HashType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Bytes,
}

impl Script {
    pub fn template(&self) -> ScriptTemplate {
        ScriptTemplate::new(self.code_hash, self.hash_type)
    }

    /// Script hash, which is used to identify lock owners and type ids
    pub fn hash(&self) -> Result<H256, Error> {
        self.molecule_serialize().map(blake2b_256).map(H256)
    }
}

impl MoleculeEncode for Script {
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        TableBuilder::new()
            .push(&self.code_hash)?
            .push(&self.hash_type)?
            .push(&self.args)?
            .encode(e)
    }
}

impl MoleculeDecode for Script {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
        let table = TableReader::read(d, 3, false)?;
        Ok(Script {
            code_hash: table.field(0)?,
            hash_type: table.field(1)?,
            args: table.field(2)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::molecule::molecule_serialize;
    use crate::test_helpers::test_suite;

    #[test]
    fn test_hash_type_exhaustive() {
        test_enum_u8_exhaustive!(HashType;
            HashType::Data => 0,
            HashType::Type => 1,
            HashType::Data1 => 2
        );
    }

    #[test]
    fn test_script_layout() {
        let script = ScriptTemplate::new(H256([1u8; 32]), HashType::Type)
            .with_args(vec![0xAA, 0xBB]);
        // header 16 + code hash 32 + hash type 1 + args 4 + 2
        let data = test_suite(&script, 55);
        assert_eq!(&data[..16], &[
            55, 0, 0, 0, 16, 0, 0, 0, 48, 0, 0, 0, 49, 0, 0, 0
        ]);
        assert_eq!(data[48], 1);
        assert_eq!(&data[49..], &[2, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn test_script_hash_type_not_known() {
        let script = ScriptTemplate::new(H256([1u8; 32]), HashType::Type)
            .with_args(vec![]);
        let mut data = molecule_serialize(&script).unwrap();
        data[48] = 3;
        assert_eq!(
            Script::molecule_deserialize(&data).unwrap_err(),
            Error::EnumValueNotKnown(s!("HashType"), 3)
        );
    }

    #[test]
    fn test_template_matches() {
        let template = ScriptTemplate::new(H256([2u8; 32]), HashType::Data1);
        let script = template.with_args(vec![1, 2, 3]);
        assert!(template.matches(&script));
        assert_eq!(ScriptTemplate::from(&script), template);
        let other = ScriptTemplate::new(H256([2u8; 32]), HashType::Type);
        assert!(!other.matches(&script));
        assert_ne!(script.hash().unwrap(), other.with_args(vec![1, 2, 3]).hash().unwrap());
    }
}
