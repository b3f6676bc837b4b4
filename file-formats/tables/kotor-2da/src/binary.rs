//! Binary `2DA V2.b` reading and writing
//!
//! Layout:
//!
//! ```text
//! "2DA V2.b\n"
//! column labels, each terminated by '\t', list terminated by '\0'
//! u32     row count
//! row labels, each terminated by '\t'
//! u16     cell offsets (rows * columns), relative to the data block
//! u16     data block size
//! data    NUL-terminated cell strings, shared between identical cells
//! ```

use crate::{Error, Result, TwoDA};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Magic line at the start of every binary 2DA
pub const BINARY_MAGIC: &[u8; 9] = b"2DA V2.b\n";

/// Decode a binary 2DA table
pub fn read_2da(data: &[u8]) -> Result<TwoDA> {
    if data.len() < BINARY_MAGIC.len() || &data[..BINARY_MAGIC.len()] != BINARY_MAGIC {
        let found = String::from_utf8_lossy(&data[..data.len().min(8)]).into_owned();
        return Err(Error::InvalidHeader(format!(
            "expected '2DA V2.b', found '{found}'"
        )));
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position(BINARY_MAGIC.len() as u64);

    let header_block = read_until(&mut cursor, 0)?;
    let headers: Vec<String> = split_tab_terminated(&header_block);

    let row_count = cursor.read_u32::<LittleEndian>()? as usize;
    // every row label carries at least its tab terminator
    if row_count > remaining(&cursor) {
        return Err(Error::invalid_data(format!(
            "row count {row_count} exceeds the {} bytes left",
            remaining(&cursor)
        )));
    }
    let mut labels = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let label = read_until(&mut cursor, b'\t')?;
        labels.push(String::from_utf8_lossy(&label).into_owned());
    }

    let cell_count = row_count
        .checked_mul(headers.len())
        .ok_or_else(|| Error::invalid_data("cell count overflow"))?;
    if cell_count.saturating_mul(2) > remaining(&cursor) {
        return Err(Error::invalid_data(format!(
            "{cell_count} cell offsets exceed the {} bytes left",
            remaining(&cursor)
        )));
    }
    let mut offsets = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        offsets.push(cursor.read_u16::<LittleEndian>()? as usize);
    }

    let data_size = cursor.read_u16::<LittleEndian>()? as usize;
    let data_start = cursor.position() as usize;
    let block = data
        .get(data_start..data_start + data_size)
        .ok_or_else(|| {
            Error::invalid_data(format!(
                "cell data block truncated: need {data_size} bytes at {data_start}"
            ))
        })?;

    let mut table = TwoDA::new(headers.iter().cloned());
    for (row, label) in labels.into_iter().enumerate() {
        let mut cells = Vec::with_capacity(headers.len());
        for col in 0..headers.len() {
            let offset = offsets[row * headers.len() + col];
            cells.push(cell_text(block, offset)?);
        }
        table.add_row(label, cells);
    }

    log::trace!("Decoded {table}");
    Ok(table)
}

/// Encode a table as binary 2DA
pub fn write_2da(table: &TwoDA) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(BINARY_MAGIC);

    for header in table.headers() {
        out.extend_from_slice(header.as_bytes());
        out.push(b'\t');
    }
    out.push(0);

    let row_count = u32::try_from(table.row_count())
        .map_err(|_| Error::CapacityExceeded("too many rows".to_string()))?;
    out.write_u32::<LittleEndian>(row_count)?;
    for row in table.rows() {
        out.extend_from_slice(row.label().as_bytes());
        out.push(b'\t');
    }

    let mut block: Vec<u8> = Vec::new();
    let mut seen: HashMap<&str, u16> = HashMap::new();
    let mut offsets = Vec::with_capacity(table.row_count() * table.column_count());
    for row in table.rows() {
        for cell in row.cells() {
            let offset = match seen.get(cell.as_str()) {
                Some(offset) => *offset,
                None => {
                    let offset = u16::try_from(block.len()).map_err(|_| {
                        Error::CapacityExceeded("cell data exceeds 64 KiB".to_string())
                    })?;
                    block.extend_from_slice(cell.as_bytes());
                    block.push(0);
                    seen.insert(cell.as_str(), offset);
                    offset
                }
            };
            offsets.push(offset);
        }
    }

    for offset in offsets {
        out.write_u16::<LittleEndian>(offset)?;
    }
    let size = u16::try_from(block.len())
        .map_err(|_| Error::CapacityExceeded("cell data exceeds 64 KiB".to_string()))?;
    out.write_u16::<LittleEndian>(size)?;
    out.extend_from_slice(&block);
    Ok(out)
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

fn read_until(cursor: &mut Cursor<&[u8]>, terminator: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        if cursor.read(&mut byte)? == 0 {
            return Err(Error::invalid_data(format!(
                "unexpected end of data looking for terminator 0x{terminator:02X}"
            )));
        }
        if byte[0] == terminator {
            return Ok(bytes);
        }
        bytes.push(byte[0]);
    }
}

fn split_tab_terminated(block: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(block)
        .split('\t')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn cell_text(block: &[u8], offset: usize) -> Result<String> {
    let tail = block.get(offset..).ok_or_else(|| {
        Error::invalid_data(format!(
            "cell offset {offset} outside data block of {} bytes",
            block.len()
        ))
    })?;
    let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shared_cells_are_stored_once() {
        let mut table = TwoDA::new(["a", "b"]);
        table.add_row("0", ["same", "same"]);
        table.add_row("1", ["same", "other"]);
        let bytes = write_2da(&table).unwrap();

        // "same\0other\0"
        let tail = &bytes[bytes.len() - 11..];
        assert_eq!(tail, b"same\0other\0");
    }

    #[test]
    fn test_rejects_ascii_variant() {
        let err = read_2da(b"2DA V2.0\n\nlabel\n").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_rejects_truncated_data_block() {
        let mut table = TwoDA::new(["a"]);
        table.add_row("0", ["value"]);
        let mut bytes = write_2da(&table).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(read_2da(&bytes), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_oversized_row_count() {
        let mut bytes = b"2DA V2.b\nlabel\t\0".to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(read_2da(&bytes), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_oversized_cell_count() {
        let mut bytes = b"2DA V2.b\n".to_vec();
        bytes.extend(std::iter::repeat_n(b"c\t".as_slice(), 200).flatten());
        bytes.push(0);
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(b"0\t1\t2\t");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(read_2da(&bytes), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_empty_table() {
        let table = TwoDA::new(["label"]);
        let decoded = read_2da(&write_2da(&table).unwrap()).unwrap();
        assert_eq!(decoded.row_count(), 0);
        assert_eq!(decoded.headers(), &["label".to_string()]);
    }
}
