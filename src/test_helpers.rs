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

use std::fmt::Debug;

use crate::molecule::{MoleculeDecode, MoleculeEncode};

#[macro_export]
macro_rules! test_enum_u8_exhaustive {
    ($enum:ident; $( $item:path => $val:expr ),+) => { {
        use ::num_traits::{FromPrimitive, ToPrimitive};

        $( assert_eq!($item.to_u8().unwrap(), $val); )+
        $( assert_eq!($enum::from_u8($val).unwrap(), $item); )+
        let mut set = ::std::collections::HashSet::new();
        $( set.insert($val); )+
        for x in 0..=core::u8::MAX {
            if !set.contains(&x) {
                assert_eq!($enum::from_u8(x), None);
                let decoded: Result<$enum, _> = $crate::molecule::molecule_deserialize(&[x]);
                assert_eq!(decoded.unwrap_err(), $crate::molecule::Error::EnumValueNotKnown(stringify!($enum).to_string(), x));
            }
        }
        let mut all = ::std::collections::BTreeSet::new();
        $( all.insert($item); )+
        for (idx, a) in all.iter().enumerate() {
            assert_eq!(a, a);
            for b in all.iter().skip(idx + 1) {
                assert_ne!(a, b);
                assert!(a < b);
            }
        }
        $( assert_eq!($crate::molecule::molecule_serialize(&$item).unwrap(), &[$val]); )+
        $( assert_eq!($item, $crate::molecule::molecule_deserialize(&[$val]).unwrap()); )+
    } };
}

/// Test suite function checking that the object encodes into exactly
/// `test_size` bytes, decodes back into itself and that every strictly
/// shorter prefix of the encoding is rejected
pub fn test_suite<T>(object: &T, test_size: usize) -> Vec<u8>
where
    T: MoleculeEncode + MoleculeDecode + PartialEq + Debug,
{
    let mut encoded_object: Vec<u8> = vec![];
    let written = object.molecule_encode(&mut encoded_object).unwrap();
    assert_eq!(written, test_size);
    assert_eq!(encoded_object.len(), test_size);
    if let Some(size) = T::STATIC_SIZE {
        assert_eq!(size, test_size);
    }

    let decoded_object = T::molecule_deserialize(&encoded_object).unwrap();
    assert_eq!(decoded_object, *object);

    for len in 0..test_size {
        assert!(T::molecule_deserialize(&encoded_object[..len]).is_err());
    }
    encoded_object
}
