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

use amplify::hex::{self, FromHex, ToHex};
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

/// Personalization string of the BLAKE2b hash function used across CKB
pub const CKB_HASH_PERSONALIZATION: &[u8] = b"ckb-default-hash";

/// Lock argument of the default secp256k1 lock: first 20 bytes of the public
/// key hash
pub type H160 = [u8; 20];

/// Constructs BLAKE2b hasher with 32-byte output and CKB personalization
pub fn new_blake2b() -> blake2b_simd::State {
    blake2b_simd::Params::new()
        .hash_length(32)
        .personal(CKB_HASH_PERSONALIZATION)
        .to_state()
}

/// CKB BLAKE2b-256 hash of the data
pub fn blake2b_256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = new_blake2b();
    hasher.update(data.as_ref());
    let mut ret = [0u8; 32];
    ret.copy_from_slice(hasher.finalize().as_bytes());
    ret
}

/// First 20 bytes of CKB BLAKE2b-256 hash of the data
pub fn blake160(data: impl AsRef<[u8]>) -> H160 {
    let mut ret = [0u8; 20];
    ret.copy_from_slice(&blake2b_256(data)[..20]);
    ret
}

/// 32-byte hash value (transaction hashes, script code hashes, block hashes)
/// displayed as `0x`-prefixed lowercase hex
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    MoleculeEncode,
    MoleculeDecode,
)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct H256(pub [u8; 32]);

impl H256 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for H256 {
    fn from(data: [u8; 32]) -> Self {
        H256(data)
    }
}

impl AsRef<[u8]> for H256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for H256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0[..].to_hex())
    }
}

impl Debug for H256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self)
    }
}

impl FromStr for H256 {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        <[u8; 32]>::from_hex(s).map(H256)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::molecule::{molecule_serialize, MoleculeDecode};

    #[test]
    fn test_empty_hash() {
        // Hash of the empty message with CKB personalization
        assert_eq!(
            blake2b_256(b"").to_hex(),
            "44f4c69744d5f8c55d642062949dcae49bc4e7ef43d388c5a12f42b5633d163e"
        );
        assert_eq!(blake160(b"")[..], blake2b_256(b"")[..20]);
    }

    #[test]
    fn test_h256_display() {
        let hash = H256([0xAB; 32]);
        let s = hash.to_string();
        assert!(s.starts_with("0xabab"));
        assert_eq!(s.len(), 66);
        assert_eq!(H256::from_str(&s).unwrap(), hash);
        assert_eq!(H256::from_str(&s[2..]).unwrap(), hash);
        assert!(H256::from_str("0xabab").is_err());
    }

    #[test]
    fn test_h256_encoding() {
        let hash = H256([7u8; 32]);
        assert_eq!(H256::STATIC_SIZE, Some(32));
        assert_eq!(molecule_serialize(&hash).unwrap(), vec![7u8; 32]);
        assert_eq!(H256::molecule_deserialize(&[7u8; 32]).unwrap(), hash);
    }
}
