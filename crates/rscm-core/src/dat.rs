//! Binary `.dat` gameval table codec
//!
//! Wire format, all integers big-endian:
//!
//! ```text
//! i32              table count
//! per table:
//!   u16            name length
//!   [u8; len]      name (UTF-8)
//!   i32            entry count
//!   per entry:
//!     u16          item length
//!     [u8; len]    item (UTF-8, "key=value")
//! ```
//!
//! Decoding is a strict forward pass over the byte slice; any count or length
//! field that implies a read past the end of the input fails with
//! [`Error::MalformedBinaryTable`] instead of panicking or surfacing a raw
//! slice error.

use std::collections::BTreeMap;

use crate::error::Error;

/// Decoded contents of one `.dat` file: table name -> key -> value.
pub type DatTables = BTreeMap<String, BTreeMap<String, String>>;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, context: &str) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                Error::malformed(
                    self.pos,
                    format!("{context}: need {len} bytes, {} remain", self.bytes.len() - self.pos),
                )
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self, context: &str) -> Result<i32, Error> {
        let b = self.take(4, context)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u16(&mut self, context: &str) -> Result<u16, Error> {
        let b = self.take(2, context)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_string(&mut self, context: &str) -> Result<String, Error> {
        let at = self.pos;
        let len = self.read_u16(context)? as usize;
        let bytes = self.take(len, context)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::malformed(at, format!("{context}: invalid UTF-8")))
    }
}

/// Decode a `.dat` byte stream into its tables.
///
/// Entries whose item string contains no `=` are dropped; an entry value may
/// itself contain further `=` characters (split is on the first one only).
pub fn decode_dat(bytes: &[u8]) -> Result<DatTables, Error> {
    let mut cursor = Cursor::new(bytes);
    let mut tables = DatTables::new();

    let table_count = cursor.read_i32("table count")?;
    if table_count < 0 {
        return Err(Error::malformed(0, format!("negative table count {table_count}")));
    }

    for _ in 0..table_count {
        let name = cursor.read_string("table name")?;
        let entry_count_at = cursor.pos;
        let entry_count = cursor.read_i32("entry count")?;
        if entry_count < 0 {
            return Err(Error::malformed(
                entry_count_at,
                format!("negative entry count {entry_count} in table {name}"),
            ));
        }

        let table = tables.entry(name).or_default();
        for _ in 0..entry_count {
            let item = cursor.read_string("entry")?;
            if let Some((key, value)) = item.split_once('=') {
                table.insert(key.to_string(), value.to_string());
            }
        }
    }

    Ok(tables)
}

/// Encode tables back into the `.dat` wire format, symmetric with
/// [`decode_dat`]. Used by tests and the `dump` tooling; the read path never
/// needs it.
pub fn encode_dat(tables: &DatTables) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();

    let table_count = i32::try_from(tables.len())
        .map_err(|_| Error::malformed(0, "too many tables for i32 count"))?;
    out.extend_from_slice(&table_count.to_be_bytes());

    for (name, entries) in tables {
        write_string(&mut out, name)?;
        let entry_count = i32::try_from(entries.len())
            .map_err(|_| Error::malformed(out.len(), format!("too many entries in table {name}")))?;
        out.extend_from_slice(&entry_count.to_be_bytes());
        for (key, value) in entries {
            write_string(&mut out, &format!("{key}={value}"))?;
        }
    }

    Ok(out)
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<(), Error> {
    let len = u16::try_from(s.len())
        .map_err(|_| Error::malformed(out.len(), format!("string too long for u16 length: {s:.32}…")))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}
