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

use super::{Error, MoleculeDecode, MoleculeEncode};

macro_rules! impl_molecule_le {
    ($type:ty, $len:expr) => {
        impl MoleculeEncode for $type {
            #[inline]
            fn molecule_encode<E: io::Write>(
                &self,
                mut e: E,
            ) -> Result<usize, Error> {
                e.write_all(&self.to_le_bytes())?;
                Ok($len)
            }
        }

        impl MoleculeDecode for $type {
            const STATIC_SIZE: Option<usize> = Some($len);

            #[inline]
            fn molecule_decode<D: io::Read>(mut d: D) -> Result<Self, Error> {
                let mut buf = [0u8; $len];
                d.read_exact(&mut buf)?;
                Ok(<$type>::from_le_bytes(buf))
            }
        }
    };
}

impl_molecule_le!(u8, 1);
impl_molecule_le!(u16, 2);
impl_molecule_le!(u32, 4);
impl_molecule_le!(u64, 8);
impl_molecule_le!(u128, 16);

impl<const LEN: usize> MoleculeEncode for [u8; LEN] {
    #[inline]
    fn molecule_encode<E: io::Write>(&self, mut e: E) -> Result<usize, Error> {
        e.write_all(self)?;
        Ok(LEN)
    }
}

impl<const LEN: usize> MoleculeDecode for [u8; LEN] {
    const STATIC_SIZE: Option<usize> = Some(LEN);

    #[inline]
    fn molecule_decode<D: io::Read>(mut d: D) -> Result<Self, Error> {
        let mut ret = [0u8; LEN];
        d.read_exact(&mut ret)?;
        Ok(ret)
    }
}

/// Molecule `Option` is a zero-length value for `None` and the inner value
/// itself for `Some`; it can be decoded only when the length of the slot is
/// known, i.e. as a table field (see [`super::TableReader::opt_field`])
impl<T> MoleculeEncode for Option<T>
where
    T: MoleculeEncode,
{
    #[inline]
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        match self {
            None => Ok(0),
            Some(val) => val.molecule_encode(e),
        }
    }
}

impl<T> MoleculeEncode for &T
where
    T: MoleculeEncode,
{
    #[inline]
    fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        (*self).molecule_encode(e)
    }
}
