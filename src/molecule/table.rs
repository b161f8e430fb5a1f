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

use std::io::{self, Read};

use super::{
    encode_len, molecule_deserialize, Error, MoleculeDecode, MoleculeEncode,
    NUMBER_SIZE,
};

fn read_u32(bytes: &[u8], pos: usize) -> Result<usize, Error> {
    let mut buf = [0u8; NUMBER_SIZE];
    buf.copy_from_slice(
        bytes.get(pos..pos + NUMBER_SIZE).ok_or(Error::Truncated)?,
    );
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Parses and validates molecule table (or dynvec) header, returning field
/// offsets with the total size appended as the last item, i.e. `n + 1`
/// numbers for `n` fields.
///
/// When `expected` is `Some(n)` the table must contain exactly `n` fields or,
/// if `compatible` is set, at least `n` fields.
pub fn decode_table_header(
    bytes: &[u8],
    expected: Option<usize>,
    compatible: bool,
) -> Result<Vec<usize>, Error> {
    let total = read_u32(bytes, 0)?;
    if total != bytes.len() {
        return Err(Error::LengthMismatch(total, bytes.len()));
    }

    let field_count = if total == NUMBER_SIZE {
        0
    } else {
        let first = read_u32(bytes, NUMBER_SIZE)?;
        if first % NUMBER_SIZE != 0 || first < NUMBER_SIZE * 2 {
            return Err(Error::CorruptOffsets(format!(
                "first offset {} is not a valid header size",
                first
            )));
        }
        if first > total {
            return Err(Error::Truncated);
        }
        first / NUMBER_SIZE - 1
    };

    match expected {
        Some(count) if field_count < count => {
            return Err(Error::SchemaViolation(field_count, count))
        }
        Some(count) if field_count > count && !compatible => {
            return Err(Error::SchemaViolation(field_count, count))
        }
        _ => {}
    }

    let mut offsets = (1..=field_count)
        .map(|index| read_u32(bytes, index * NUMBER_SIZE))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(beyond) = offsets.iter().copied().filter(|o| *o > total).max() {
        return Err(Error::LengthMismatch(total, beyond));
    }
    offsets.push(total);

    let header_size = NUMBER_SIZE * (field_count + 1);
    if offsets[0] != header_size {
        return Err(Error::CorruptOffsets(format!(
            "first offset {} does not match header size {}",
            offsets[0], header_size
        )));
    }
    if let Some(pair) = offsets.windows(2).find(|pair| pair[0] > pair[1]) {
        return Err(Error::CorruptOffsets(format!(
            "offset {} is followed by a smaller offset {}",
            pair[0], pair[1]
        )));
    }
    Ok(offsets)
}

/// Writes molecule table made of already serialized fields
pub fn encode_table<E: io::Write>(
    mut e: E,
    fields: &[Vec<u8>],
) -> Result<usize, Error> {
    let header_size = NUMBER_SIZE * (fields.len() + 1);
    let total = fields.iter().map(Vec::len).sum::<usize>() + header_size;
    let mut len = encode_len(total)?.molecule_encode(&mut e)?;
    let mut offset = header_size;
    for field in fields {
        len += encode_len(offset)?.molecule_encode(&mut e)?;
        offset += field.len();
    }
    for field in fields {
        e.write_all(field)?;
        len += field.len();
    }
    Ok(len)
}

/// Builder for molecule tables: collects serialized fields in their schema
/// order and writes header with offsets on [`TableBuilder::encode`]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TableBuilder {
    fields: Vec<Vec<u8>>,
}

impl TableBuilder {
    pub fn new() -> Self {
        TableBuilder::default()
    }

    /// Appends next field
    pub fn push<T>(mut self, field: &T) -> Result<Self, Error>
    where
        T: MoleculeEncode,
    {
        self.fields.push(field.molecule_serialize()?);
        Ok(self)
    }

    /// Appends next field with already serialized data
    pub fn push_raw(mut self, field: Vec<u8>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
        encode_table(e, &self.fields)
    }
}

/// Reader for molecule tables providing typed access to the table fields
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TableReader {
    data: Vec<u8>,
    offsets: Vec<usize>,
}

impl TableReader {
    /// Reads table from a stream. Declared total size exceeding available
    /// data results in [`Error::LengthMismatch`].
    pub fn read<D: io::Read>(
        mut d: D,
        expected: usize,
        compatible: bool,
    ) -> Result<Self, Error> {
        let total = u32::molecule_decode(&mut d)? as usize;
        if total < NUMBER_SIZE {
            return Err(Error::CorruptOffsets(format!(
                "total size {} is less than the header size",
                total
            )));
        }
        let mut data = Vec::with_capacity(total.min(u16::MAX as usize));
        data.extend_from_slice(&(total as u32).to_le_bytes());
        let body_len = total - NUMBER_SIZE;
        let read = d.take(body_len as u64).read_to_end(&mut data)?;
        if read != body_len {
            return Err(Error::LengthMismatch(total, NUMBER_SIZE + read));
        }
        TableReader::from_bytes(data, expected, compatible)
    }

    /// Parses table from a buffer which must be consumed entirely
    pub fn from_bytes(
        data: Vec<u8>,
        expected: usize,
        compatible: bool,
    ) -> Result<Self, Error> {
        let offsets = decode_table_header(&data, Some(expected), compatible)?;
        Ok(TableReader { data, offsets })
    }

    /// Number of fields present in the table; may exceed expected number for
    /// tables read in compatible mode
    pub fn field_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Raw bytes of the field with a given index
    pub fn field_bytes(&self, index: usize) -> Result<&[u8], Error> {
        if index >= self.field_count() {
            return Err(Error::SchemaViolation(self.field_count(), index + 1));
        }
        Ok(&self.data[self.offsets[index]..self.offsets[index + 1]])
    }

    /// Decodes field with a given index
    pub fn field<T>(&self, index: usize) -> Result<T, Error>
    where
        T: MoleculeDecode,
    {
        molecule_deserialize(&self.field_bytes(index)?)
    }

    /// Decodes optional field with a given index: zero-sized field means
    /// `None`
    pub fn opt_field<T>(&self, index: usize) -> Result<Option<T>, Error>
    where
        T: MoleculeDecode,
    {
        let bytes = self.field_bytes(index)?;
        if bytes.is_empty() {
            Ok(None)
        } else {
            molecule_deserialize(&bytes).map(Some)
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::{molecule_serialize, Bytes};
    use super::*;

    #[derive(Clone, PartialEq, Eq, Debug)]
    struct Entry {
        version: u32,
        payload: Bytes,
        extra: Option<u64>,
    }

    impl MoleculeEncode for Entry {
        fn molecule_encode<E: io::Write>(&self, e: E) -> Result<usize, Error> {
            TableBuilder::new()
                .push(&self.version)?
                .push(&self.payload)?
                .push(&self.extra)?
                .encode(e)
        }
    }

    impl MoleculeDecode for Entry {
        const STATIC_SIZE: Option<usize> = None;

        fn molecule_decode<D: io::Read>(d: D) -> Result<Self, Error> {
            let table = TableReader::read(d, 3, false)?;
            Ok(Entry {
                version: table.field(0)?,
                payload: table.field(1)?,
                extra: table.opt_field(2)?,
            })
        }
    }

    fn entry() -> Entry {
        Entry {
            version: 1,
            payload: Bytes::from(vec![0xAB]),
            extra: None,
        }
    }

    #[test]
    fn test_table_layout() {
        let data = molecule_serialize(&entry()).unwrap();
        assert_eq!(data, vec![
            25, 0, 0, 0, // total size
            16, 0, 0, 0, // version offset
            20, 0, 0, 0, // payload offset
            25, 0, 0, 0, // extra offset
            1, 0, 0, 0, // version
            1, 0, 0, 0, 0xAB, // payload
        ]);
        assert_eq!(Entry::molecule_deserialize(&data).unwrap(), entry());

        let mut some = entry();
        some.extra = Some(7);
        let data = molecule_serialize(&some).unwrap();
        assert_eq!(data.len(), 33);
        assert_eq!(Entry::molecule_deserialize(&data).unwrap(), some);
    }

    #[test]
    fn test_table_length_mismatch() {
        let mut data = molecule_serialize(&entry()).unwrap();
        data[0] = 26;
        assert_eq!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::LengthMismatch(26, 25)
        );
        data[0] = 24;
        assert_eq!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::LengthMismatch(24, 25)
        );
    }

    #[test]
    fn test_table_schema_violation() {
        let two = TableBuilder::new()
            .push(&1u32)
            .unwrap()
            .push(&Bytes::default())
            .unwrap();
        let data = molecule_serialize_table(&two);
        assert_eq!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::SchemaViolation(2, 3)
        );

        let four = two.push(&None::<u64>).unwrap().push(&0u8).unwrap();
        let data = molecule_serialize_table(&four);
        assert_eq!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::SchemaViolation(4, 3)
        );
        let table = TableReader::from_bytes(data, 3, true).unwrap();
        assert_eq!(table.field_count(), 4);
        assert_eq!(table.field::<u32>(0).unwrap(), 1);
    }

    #[test]
    fn test_table_corrupt_offsets() {
        let mut data = molecule_serialize(&entry()).unwrap();
        // extra offset goes before the payload offset
        data[12] = 18;
        assert!(matches!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::CorruptOffsets(_)
        ));

        let mut data = molecule_serialize(&entry()).unwrap();
        // first offset is not aligned
        data[4] = 15;
        assert!(matches!(
            Entry::molecule_deserialize(&data).unwrap_err(),
            Error::CorruptOffsets(_)
        ));
    }

    #[test]
    fn test_table_truncated() {
        assert_eq!(
            Entry::molecule_deserialize(&[25u8, 0]).unwrap_err(),
            Error::Truncated
        );
        // header declares more offsets than the buffer holds
        let data = [12u8, 0, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            decode_table_header(&data, None, false).unwrap_err(),
            Error::Truncated
        );
    }

    fn molecule_serialize_table(table: &TableBuilder) -> Vec<u8> {
        let mut data = vec![];
        table.encode(&mut data).unwrap();
        data
    }
}
