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
use core::ops::Deref;
use std::fmt::{self, Display, Formatter};
use std::io::{self, Read};
use std::str::FromStr;

use super::table::{decode_table_header, encode_table};
use super::{encode_len, Error, MoleculeDecode, MoleculeEncode, NUMBER_SIZE};

/// Reads exactly `len` bytes; a shorter input is reported as a mismatch
/// between the declared length `declared` and the length actually available
fn read_declared<D: io::Read>(
    d: D,
    len: usize,
    declared: usize,
) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::with_capacity(len.min(u16::MAX as usize));
    d.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(Error::LengthMismatch(
            declared,
            declared - len + buf.len(),
        ));
    }
    Ok(buf)
}

/// Molecule `fixvec`: `u32` item count followed by the items, each of which
/// must have a static size
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FixVec<T>(Vec<T>);

impl<T> FixVec<T> {
    /// Constructs empty vector
    pub fn new() -> Self {
        FixVec(vec![])
    }

    /// Returns inner vector
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for FixVec<T> {
    fn default() -> Self {
        FixVec(vec![])
    }
}

impl<T> From<Vec<T>> for FixVec<T> {
    fn from(vec: Vec<T>) -> Self {
        FixVec(vec)
    }
}

impl<T> Deref for FixVec<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromIterator<T> for FixVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        FixVec(iter.into_iter().collect())
    }
}

impl<T> MoleculeEncode for FixVec<T>
where
    T: MoleculeEncode,
{
    fn molecule_encode<E: io::Write>(&self, mut e: E) -> Result<usize, Error> {
        let mut len = encode_len(self.0.len())?.molecule_encode(&mut e)?;
        for item in &self.0 {
            len += item.molecule_encode(&mut e)?;
        }
        Ok(len)
    }
}

impl<T> MoleculeDecode for FixVec<T>
where
    T: MoleculeDecode,
{
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(mut d: D) -> Result<Self, Error> {
        let item_size = T::STATIC_SIZE.ok_or_else(|| {
            Error::DataIntegrityError(s!("fixvec items must have static size"))
        })?;
        let count = u32::molecule_decode(&mut d)? as usize;
        let body_len = count
            .checked_mul(item_size)
            .ok_or(Error::ExceedMaxItems(count))?;
        let body = read_declared(&mut d, body_len, NUMBER_SIZE + body_len)?;
        body.chunks(item_size.max(1))
            .take(count)
            .map(T::molecule_deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map(FixVec)
    }
}

/// Molecule `dynvec`: a table-like header with one offset per item followed
/// by the items, which may have dynamic size
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct DynVec<T>(Vec<T>);

impl<T> DynVec<T> {
    /// Constructs empty vector
    pub fn new() -> Self {
        DynVec(vec![])
    }

    /// Returns inner vector
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for DynVec<T> {
    fn default() -> Self {
        DynVec(vec![])
    }
}

impl<T> From<Vec<T>> for DynVec<T> {
    fn from(vec: Vec<T>) -> Self {
        DynVec(vec)
    }
}

impl<T> Deref for DynVec<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromIterator<T> for DynVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        DynVec(iter.into_iter().collect())
    }
}

impl<T> MoleculeEncode for DynVec<T>
where
    T: MoleculeEncode,
{
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        let items = self
            .0
            .iter()
            .map(T::molecule_serialize)
            .collect::<Result<Vec<_>, _>>()?;
        encode_table(e, &items)
    }
}

impl<T> MoleculeDecode for DynVec<T>
where
    T: MoleculeDecode,
{
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(mut d: D) -> Result<Self, Error> {
        let total = u32::molecule_decode(&mut d)? as usize;
        if total < NUMBER_SIZE {
            return Err(Error::CorruptOffsets(format!(
                "total size {} is less than the header size",
                total
            )));
        }
        let mut data = (total as u32).to_le_bytes().to_vec();
        data.extend(read_declared(&mut d, total - NUMBER_SIZE, total)?);
        let offsets = decode_table_header(&data, None, false)?;
        offsets
            .windows(2)
            .map(|range| T::molecule_deserialize(&data[range[0]..range[1]]))
            .collect::<Result<Vec<_>, _>>()
            .map(DynVec)
    }
}

/// Molecule `Bytes` type: a `fixvec` of bytes. Displayed and parsed as
/// `0x`-prefixed hex string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Returns inner byte vector
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Returns reference to the inner bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(data: Vec<u8>) -> Self {
        Bytes(data)
    }
}

impl From<&[u8]> for Bytes {
    fn from(data: &[u8]) -> Self {
        Bytes(data.to_vec())
    }
}

impl Display for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0.to_hex())
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes({})", self)
    }
}

impl FromStr for Bytes {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Vec::<u8>::from_hex(s).map(Bytes)
    }
}

impl MoleculeEncode for Bytes {
    fn molecule_encode<E: io::Write>(&self, mut e: E) -> Result<usize, Error> {
        let len = encode_len(self.0.len())?.molecule_encode(&mut e)?;
        e.write_all(&self.0)?;
        Ok(len + self.0.len())
    }
}

impl MoleculeDecode for Bytes {
    const STATIC_SIZE: Option<usize> = None;

    fn molecule_decode<D: io::Read>(mut d: D) -> Result<Self, Error> {
        let count = u32::molecule_decode(&mut d)? as usize;
        read_declared(&mut d, count, NUMBER_SIZE + count).map(Bytes)
    }
}

#[cfg(test)]
mod test {
    use super::super::{molecule_deserialize, molecule_serialize};
    use super::*;

    #[test]
    fn test_bytes_encode() {
        let bytes = Bytes::from(vec![0xDE, 0xAD]);
        assert_eq!(
            molecule_serialize(&bytes).unwrap(),
            vec![2, 0, 0, 0, 0xDE, 0xAD]
        );
        assert_eq!(molecule_serialize(&Bytes::default()).unwrap(), vec![
            0, 0, 0, 0
        ]);
        let decoded: Bytes =
            molecule_deserialize(&[2u8, 0, 0, 0, 0xDE, 0xAD]).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_bytes_declared_longer() {
        assert_eq!(
            Bytes::molecule_deserialize(&[3u8, 0, 0, 0, 0xDE, 0xAD])
                .unwrap_err(),
            Error::LengthMismatch(7, 6)
        );
        assert_eq!(
            Bytes::molecule_deserialize(&[1u8, 0]).unwrap_err(),
            Error::Truncated
        );
    }

    #[test]
    fn test_bytes_hex() {
        let bytes = Bytes::from_str("0xdead00").unwrap();
        assert_eq!(bytes.as_slice(), &[0xDE, 0xAD, 0x00]);
        assert_eq!(bytes.to_string(), "0xdead00");
        assert_eq!(Bytes::from_str("dead").unwrap().len(), 2);
        assert!(Bytes::from_str("0xdea").is_err());
        assert_eq!(Bytes::default().to_string(), "0x");
    }

    #[test]
    fn test_fixvec_encode() {
        let vec: FixVec<u16> = vec![1u16, 0x0203].into();
        let data = molecule_serialize(&vec).unwrap();
        assert_eq!(data, vec![2, 0, 0, 0, 1, 0, 3, 2]);
        assert_eq!(FixVec::<u16>::molecule_deserialize(&data).unwrap(), vec);

        assert_eq!(
            FixVec::<u16>::molecule_deserialize(&data[..7]).unwrap_err(),
            Error::LengthMismatch(8, 7)
        );
        let empty = FixVec::<[u8; 32]>::new();
        assert_eq!(molecule_serialize(&empty).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_dynvec_encode() {
        let vec: DynVec<Bytes> =
            vec![Bytes::from(vec![0xAA]), Bytes::default()].into();
        let data = molecule_serialize(&vec).unwrap();
        assert_eq!(data, vec![
            21, 0, 0, 0, // total size
            12, 0, 0, 0, // first offset
            17, 0, 0, 0, // second offset
            1, 0, 0, 0, 0xAA, // first item
            0, 0, 0, 0, // second item
        ]);
        assert_eq!(DynVec::<Bytes>::molecule_deserialize(&data).unwrap(), vec);

        let empty = DynVec::<Bytes>::new();
        assert_eq!(molecule_serialize(&empty).unwrap(), vec![4, 0, 0, 0]);
        assert_eq!(
            DynVec::<Bytes>::molecule_deserialize(&[4u8, 0, 0, 0]).unwrap(),
            empty
        );
    }

    #[test]
    fn test_dynvec_declared_longer() {
        let data = [30u8, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            DynVec::<Bytes>::molecule_deserialize(&data).unwrap_err(),
            Error::LengthMismatch(30, 12)
        );
    }
}
