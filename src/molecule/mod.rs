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

//! Molecule binary encoding used by CKB for transactions, scripts and the
//! data & args payloads of the sidechain protocol cells.
//!
//! Layouts follow four rules:
//! * integers are little-endian with their natural width; byte arrays are
//!   written verbatim; enums are a single byte;
//! * a *struct* is the plain concatenation of its fields and always has a
//!   static size;
//! * a *fixvec* is a `u32` item count followed by fixed-size items;
//! * a *table* (and *dynvec*) is a `u32` total size, `n` `u32` offsets and the
//!   `n` field bodies; the first offset equals `4 * (n + 1)` and the end of the
//!   last field is the total size.

mod primitives;
mod table;
mod vector;

pub use table::{decode_table_header, TableBuilder, TableReader};
pub use vector::{Bytes, DynVec, FixVec};

use amplify::IoError;
use core::ops::Range;
use std::io;

/// Size of the `u32` length and offset words used by molecule headers
pub const NUMBER_SIZE: usize = 4;

/// Binary encoding according to molecule rules. Encoding into in-memory
/// buffers may fail only when a collection does not fit into `u32` size
/// limits.
pub trait MoleculeEncode {
    /// Encode with the given [std::io::Write] instance; must return result
    /// with either amount of bytes encoded – or implementation-specific
    /// error type.
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error>;

    /// Serializes data as a byte array using [`molecule_encode()`] function
    fn molecule_serialize(&self) -> Result<Vec<u8>, Error> {
        let mut e = vec![];
        let _ = self.molecule_encode(&mut e)?;
        Ok(e)
    }
}

/// Binary decoding according to molecule rules
pub trait MoleculeDecode: Sized {
    /// Number of bytes taken by the encoded value if it does not depend on
    /// the value itself (primitives, byte arrays and molecule structs). `None`
    /// for dynamic layouts (tables, vectors).
    const STATIC_SIZE: Option<usize>;

    /// Decode with the given [std::io::Read] instance; must either
    /// construct an instance or return implementation-specific error type.
    fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error>;

    /// Tries to deserialize byte array into the current type using
    /// [`molecule_deserialize()`], requiring the whole buffer to be consumed
    fn molecule_deserialize(data: impl AsRef<[u8]>) -> Result<Self, Error> {
        molecule_deserialize(&data)
    }
}

/// Convenience method for molecule encoding of data structures implementing
/// [MoleculeEncode] into a byte vector.
pub fn molecule_serialize<T>(data: &T) -> Result<Vec<u8>, Error>
where
    T: MoleculeEncode,
{
    let mut encoder = io::Cursor::new(vec![]);
    data.molecule_encode(&mut encoder)?;
    Ok(encoder.into_inner())
}

/// Convenience method for molecule decoding of data structures implementing
/// [MoleculeDecode] from a byte buffer which must be consumed entirely.
pub fn molecule_deserialize<T>(data: &impl AsRef<[u8]>) -> Result<T, Error>
where
    T: MoleculeDecode,
{
    let data = data.as_ref();
    if let Some(expected) = T::STATIC_SIZE {
        if expected != data.len() {
            return Err(Error::LengthMismatch(expected, data.len()));
        }
    }

    let mut decoder = io::Cursor::new(data);
    let rv = T::molecule_decode(&mut decoder)?;
    let consumed = decoder.position() as usize;

    // Fail if data are not consumed entirely.
    if consumed == data.len() {
        Ok(rv)
    } else {
        Err(Error::LengthMismatch(consumed, data.len()))
    }
}

/// Sums static sizes of struct fields; returns `None` if any of the fields
/// has a dynamic size. Used by `#[derive(MoleculeDecode)]`.
pub const fn static_size_of(sizes: &[Option<usize>]) -> Option<usize> {
    let mut total = 0usize;
    let mut index = 0usize;
    while index < sizes.len() {
        match sizes[index] {
            Some(size) => total += size,
            None => return None,
        }
        index += 1;
    }
    Some(total)
}

/// Converts collection length into the `u32` representation used by molecule
/// headers
pub fn encode_len(len: usize) -> Result<u32, Error> {
    if len > u32::MAX as usize {
        Err(Error::ExceedMaxItems(len))
    } else {
        Ok(len as u32)
    }
}

/// Possible errors during molecule encoding and decoding process
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// I/O error during molecule encoding: {0}
    Io(IoError),

    /// Data are truncated: the buffer ends before a header or a value is
    /// complete
    Truncated,

    /// Declared data length {0} does not match the actual length {1}
    LengthMismatch(usize, usize),

    /// Table has {0} fields while its schema requires {1}
    SchemaViolation(usize, usize),

    /// Offsets in the table or vector header are not monotonically
    /// increasing or point outside of the data: {0}
    CorruptOffsets(String),

    /// A collection has more items or bytes ({0}) than may be represented by
    /// `u32` size according to molecule rules
    ExceedMaxItems(usize),

    /// Enums are encoded as a `u8`-based values; the provided enum `{0}` has
    /// underlying primitive type that does not fit into `u8` value
    EnumValueOverflow(String),

    /// An unsupported value `{1}` for enum `{0}` encountered during decode
    /// operation
    EnumValueNotKnown(String, u8),

    /// Decoding resulted in value `{2}` for type `{0}` that exceeds the
    /// supported range {1:#?}
    ValueOutOfRange(&'static str, Range<u128>, u128),

    /// Data integrity problem during molecule decoding operation: {0}
    DataIntegrityError(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated,
            _ => Error::Io(err.into()),
        }
    }
}

#[macro_export]
macro_rules! molecule_encode_list {
    ( $encoder:ident; $($item:expr),+ ) => {
        {
            let mut len = 0usize;
            $(
                len += $item.molecule_encode(&mut $encoder)?;
            )+
            len
        }
    };

    ( $encoder:ident; $len:ident; $($item:expr),+ ) => {
        {
            $(
                $len += $item.molecule_encode(&mut $encoder)?;
            )+
            $len
        }
    }
}

#[macro_export]
macro_rules! molecule_decode_self {
    ( $decoder:ident; $($item:ident),+ ) => {
        {
            Self {
            $(
                $item: $crate::molecule::MoleculeDecode::molecule_decode(&mut $decoder)?,
            )+
            }
        }
    };
}

#[macro_export]
macro_rules! impl_enum_molecule_encoding {
    ($type:ty) => {
        impl $crate::molecule::MoleculeEncode for $type {
            #[inline]
            fn molecule_encode<E: ::std::io::Write>(
                &self,
                e: E,
            ) -> Result<usize, $crate::molecule::Error> {
                use ::num_traits::ToPrimitive;

                match self.to_u8() {
                    Some(result) => result.molecule_encode(e),
                    None => {
                        Err($crate::molecule::Error::EnumValueOverflow(
                            stringify!($type).to_string(),
                        ))
                    }
                }
            }
        }

        impl $crate::molecule::MoleculeDecode for $type {
            const STATIC_SIZE: Option<usize> = Some(1);

            #[inline]
            fn molecule_decode<D: ::std::io::Read>(
                d: D,
            ) -> Result<Self, $crate::molecule::Error> {
                use ::num_traits::FromPrimitive;

                let value = u8::molecule_decode(d)?;
                match Self::from_u8(value) {
                    Some(result) => Ok(result),
                    None => {
                        Err($crate::molecule::Error::EnumValueNotKnown(
                            stringify!($type).to_string(),
                            value,
                        ))
                    }
                }
            }
        }
    };
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[derive(
        Clone, Copy, PartialEq, Eq, Debug, MoleculeEncode, MoleculeDecode,
    )]
    struct Pair {
        id: u8,
        value: u32,
    }

    #[derive(Clone, PartialEq, Eq, Debug, MoleculeEncode, MoleculeDecode)]
    struct Dynamic {
        id: u8,
        payload: Bytes,
    }

    #[test]
    fn test_u8_encode() {
        let zero: u8 = 0;
        let one: u8 = 1;
        let thirteen: u8 = 13;
        let confusing: u8 = 0xEF;
        let nearly_full: u8 = 0xFE;
        let full: u8 = 0xFF;

        let byte_0 = &[0u8][..];
        let byte_1 = &[1u8][..];
        let byte_13 = &[13u8][..];
        let byte_ef = &[0xEFu8][..];
        let byte_fe = &[0xFEu8][..];
        let byte_ff = &[0xFFu8][..];

        assert_eq!(molecule_serialize(&zero).unwrap(), byte_0);
        assert_eq!(molecule_serialize(&one).unwrap(), byte_1);
        assert_eq!(molecule_serialize(&thirteen).unwrap(), byte_13);
        assert_eq!(molecule_serialize(&confusing).unwrap(), byte_ef);
        assert_eq!(molecule_serialize(&nearly_full).unwrap(), byte_fe);
        assert_eq!(molecule_serialize(&full).unwrap(), byte_ff);

        assert_eq!(u8::molecule_deserialize(byte_0).unwrap(), zero);
        assert_eq!(u8::molecule_deserialize(byte_1).unwrap(), one);
        assert_eq!(u8::molecule_deserialize(byte_13).unwrap(), thirteen);
        assert_eq!(u8::molecule_deserialize(byte_ef).unwrap(), confusing);
        assert_eq!(u8::molecule_deserialize(byte_fe).unwrap(), nearly_full);
        assert_eq!(u8::molecule_deserialize(byte_ff).unwrap(), full);
    }

    #[test]
    fn test_integers_little_endian() {
        assert_eq!(
            molecule_serialize(&0x0102u16).unwrap(),
            vec![0x02, 0x01]
        );
        assert_eq!(
            molecule_serialize(&0x01020304u32).unwrap(),
            vec![0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(molecule_serialize(&1u64).unwrap(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        let mut ten = vec![0u8; 16];
        ten[0] = 0x0a;
        assert_eq!(molecule_serialize(&10u128).unwrap(), ten);
        assert_eq!(u128::molecule_deserialize(&ten).unwrap(), 10);
        let mut expected = vec![0u8; 16];
        expected[0] = 0x10;
        expected[15] = 0x80;
        let value: u128 = (0x80 << 120) | 0x10;
        assert_eq!(molecule_serialize(&value).unwrap(), expected);
        assert_eq!(u128::molecule_deserialize(&expected).unwrap(), value);
    }

    #[test]
    fn test_struct_layout() {
        let pair = Pair {
            id: 7,
            value: 0x0A0B0C0D,
        };
        assert_eq!(Pair::STATIC_SIZE, Some(5));
        let data = molecule_serialize(&pair).unwrap();
        assert_eq!(data, vec![7, 0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(Pair::molecule_deserialize(&data).unwrap(), pair);
    }

    #[test]
    fn test_struct_length_mismatch() {
        assert_eq!(
            Pair::molecule_deserialize(&[7u8, 1, 2, 3]).unwrap_err(),
            Error::LengthMismatch(5, 4)
        );
        assert_eq!(
            Pair::molecule_deserialize(&[7u8, 1, 2, 3, 4, 5]).unwrap_err(),
            Error::LengthMismatch(5, 6)
        );
        assert_eq!(
            <[u8; 20]>::molecule_deserialize(&[0u8; 19]).unwrap_err(),
            Error::LengthMismatch(20, 19)
        );
    }

    #[test]
    fn test_streaming_truncation() {
        let data = [7u8, 1, 2];
        assert_eq!(
            Pair::molecule_decode(&data[..]).unwrap_err(),
            Error::Truncated
        );
    }

    #[test]
    fn test_dynamic_struct_leftover() {
        let value = Dynamic {
            id: 1,
            payload: Bytes::from(vec![0xAA, 0xBB]),
        };
        assert_eq!(Dynamic::STATIC_SIZE, None);
        let mut data = molecule_serialize(&value).unwrap();
        assert_eq!(data, vec![1, 2, 0, 0, 0, 0xAA, 0xBB]);
        assert_eq!(Dynamic::molecule_deserialize(&data).unwrap(), value);
        data.push(0);
        assert_eq!(
            Dynamic::molecule_deserialize(&data).unwrap_err(),
            Error::LengthMismatch(7, 8)
        );
    }

    #[test]
    fn test_static_size_of() {
        assert_eq!(static_size_of(&[]), Some(0));
        assert_eq!(static_size_of(&[Some(1), Some(32)]), Some(33));
        assert_eq!(static_size_of(&[Some(1), None, Some(32)]), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::LengthMismatch(98, 97).to_string(),
            "Declared data length 98 does not match the actual length 97"
        );
        assert_eq!(
            Error::SchemaViolation(2, 3).to_string(),
            "Table has 2 fields while its schema requires 3"
        );
    }
}
