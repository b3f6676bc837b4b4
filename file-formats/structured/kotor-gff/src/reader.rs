//! GFF `V3.2` decoding

use crate::{Error, FieldType, Gff, GffStruct, GffValue, LocalizedString, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

/// Version tag of supported files
pub const GFF_VERSION: &[u8; 4] = b"V3.2";

/// Size of the GFF header in bytes
pub const HEADER_SIZE: usize = 56;

/// Deepest struct nesting the reader follows
pub const MAX_DEPTH: usize = 64;

/// GFF header: section offsets and sizes
#[derive(Debug, Clone, Copy, Default)]
pub struct GffHeader {
    /// Content type such as `UTC `
    pub file_type: [u8; 4],
    /// Offset of the struct array
    pub struct_offset: u32,
    /// Number of structs
    pub struct_count: u32,
    /// Offset of the field array
    pub field_offset: u32,
    /// Number of fields
    pub field_count: u32,
    /// Offset of the label array
    pub label_offset: u32,
    /// Number of labels
    pub label_count: u32,
    /// Offset of the field data block
    pub field_data_offset: u32,
    /// Size of the field data block in bytes
    pub field_data_size: u32,
    /// Offset of the field indices block
    pub field_indices_offset: u32,
    /// Size of the field indices block in bytes
    pub field_indices_size: u32,
    /// Offset of the list indices block
    pub list_indices_offset: u32,
    /// Size of the list indices block in bytes
    pub list_indices_size: u32,
}

impl GffHeader {
    /// Parse and validate the header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "file is {} bytes, header needs {HEADER_SIZE}",
                data.len()
            )));
        }
        if &data[4..8] != GFF_VERSION {
            return Err(Error::InvalidHeader(format!(
                "unsupported version '{}'",
                String::from_utf8_lossy(&data[4..8])
            )));
        }

        let mut cursor = Cursor::new(data);
        let mut file_type = [0u8; 4];
        cursor.read_exact(&mut file_type)?;
        cursor.set_position(8);
        let mut next = || cursor.read_u32::<LittleEndian>();
        Ok(Self {
            file_type,
            struct_offset: next()?,
            struct_count: next()?,
            field_offset: next()?,
            field_count: next()?,
            label_offset: next()?,
            label_count: next()?,
            field_data_offset: next()?,
            field_data_size: next()?,
            field_indices_offset: next()?,
            field_indices_size: next()?,
            list_indices_offset: next()?,
            list_indices_size: next()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct RawStruct {
    id: u32,
    data: u32,
    field_count: u32,
}

#[derive(Debug, Clone, Copy)]
struct RawField {
    kind: u32,
    label: u32,
    data: u32,
}

/// Decode a GFF document
pub fn read_gff(data: &[u8]) -> Result<Gff> {
    let header = GffHeader::parse(data)?;
    let reader = Reader::new(data, header)?;
    let root = reader.read_struct(0, 0)?;
    log::trace!(
        "Decoded GFF '{}' with {} structs and {} fields",
        String::from_utf8_lossy(&header.file_type),
        header.struct_count,
        header.field_count
    );
    Ok(Gff {
        file_type: header.file_type,
        root,
    })
}

struct Reader<'a> {
    data: &'a [u8],
    header: GffHeader,
    structs: Vec<RawStruct>,
    fields: Vec<RawField>,
    labels: Vec<String>,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], header: GffHeader) -> Result<Self> {
        let section = move |offset: u32, len: usize| -> Result<&'a [u8]> {
            let start = offset as usize;
            data.get(start..start + len).ok_or_else(|| {
                Error::invalid_format(format!("section at {start} with {len} bytes outside file"))
            })
        };

        let mut structs = Vec::with_capacity(header.struct_count as usize);
        let mut cursor = Cursor::new(section(header.struct_offset, header.struct_count as usize * 12)?);
        for _ in 0..header.struct_count {
            structs.push(RawStruct {
                id: cursor.read_u32::<LittleEndian>()?,
                data: cursor.read_u32::<LittleEndian>()?,
                field_count: cursor.read_u32::<LittleEndian>()?,
            });
        }

        let mut fields = Vec::with_capacity(header.field_count as usize);
        let mut cursor = Cursor::new(section(header.field_offset, header.field_count as usize * 12)?);
        for _ in 0..header.field_count {
            fields.push(RawField {
                kind: cursor.read_u32::<LittleEndian>()?,
                label: cursor.read_u32::<LittleEndian>()?,
                data: cursor.read_u32::<LittleEndian>()?,
            });
        }

        let label_bytes = section(header.label_offset, header.label_count as usize * 16)?;
        let labels = label_bytes
            .chunks_exact(16)
            .map(|chunk| {
                let end = chunk.iter().position(|b| *b == 0).unwrap_or(chunk.len());
                String::from_utf8_lossy(&chunk[..end]).into_owned()
            })
            .collect();

        if structs.is_empty() {
            return Err(Error::invalid_format("GFF has no root struct"));
        }

        Ok(Self {
            data,
            header,
            structs,
            fields,
            labels,
        })
    }

    fn read_struct(&self, index: u32, depth: usize) -> Result<GffStruct> {
        if depth > MAX_DEPTH {
            return Err(Error::NestingTooDeep(MAX_DEPTH));
        }
        let raw = *self
            .structs
            .get(index as usize)
            .ok_or_else(|| Error::invalid_format(format!("struct index {index} out of range")))?;

        let field_indices: Vec<u32> = match raw.field_count {
            0 => Vec::new(),
            1 => vec![raw.data],
            count => {
                let start = self.header.field_indices_offset as usize + raw.data as usize;
                let bytes = self.slice(start, count as usize * 4)?;
                let mut cursor = Cursor::new(bytes);
                (0..count)
                    .map(|_| cursor.read_u32::<LittleEndian>())
                    .collect::<std::io::Result<_>>()?
            }
        };

        let mut result = GffStruct::new(raw.id);
        for field_index in field_indices {
            let field = *self.fields.get(field_index as usize).ok_or_else(|| {
                Error::invalid_format(format!("field index {field_index} out of range"))
            })?;
            let label = self.labels.get(field.label as usize).ok_or_else(|| {
                Error::invalid_format(format!("label index {} out of range", field.label))
            })?;
            let value = self.read_value(field, depth)?;
            result.set(label.clone(), value);
        }
        Ok(result)
    }

    fn read_value(&self, field: RawField, depth: usize) -> Result<GffValue> {
        let kind = FieldType::from_id(field.kind)?;
        let data = field.data;
        Ok(match kind {
            FieldType::Byte => GffValue::Byte(data as u8),
            FieldType::Char => GffValue::Char(data as u8 as i8),
            FieldType::Word => GffValue::Word(data as u16),
            FieldType::Short => GffValue::Short(data as u16 as i16),
            FieldType::DWord => GffValue::DWord(data),
            FieldType::Int => GffValue::Int(data as i32),
            FieldType::Float => GffValue::Float(f32::from_bits(data)),
            FieldType::DWord64 => GffValue::DWord64(self.complex(data, 8)?.read_u64::<LittleEndian>()?),
            FieldType::Int64 => GffValue::Int64(self.complex(data, 8)?.read_i64::<LittleEndian>()?),
            FieldType::Double => GffValue::Double(self.complex(data, 8)?.read_f64::<LittleEndian>()?),
            FieldType::ExoString => {
                let len = self.complex(data, 4)?.read_u32::<LittleEndian>()? as usize;
                GffValue::ExoString(self.text(data as usize + 4, len)?)
            }
            FieldType::ResRef => {
                let len = self.complex(data, 1)?.read_u8()? as usize;
                GffValue::ResRef(self.text(data as usize + 1, len)?)
            }
            FieldType::ExoLocString => GffValue::ExoLocString(self.read_loc_string(data)?),
            FieldType::Binary => {
                let len = self.complex(data, 4)?.read_u32::<LittleEndian>()? as usize;
                let start = self.header.field_data_offset as usize + data as usize + 4;
                GffValue::Binary(self.slice(start, len)?.to_vec())
            }
            FieldType::Orientation => {
                let mut cursor = self.complex(data, 16)?;
                let mut v = [0f32; 4];
                for c in &mut v {
                    *c = cursor.read_f32::<LittleEndian>()?;
                }
                GffValue::Orientation(v)
            }
            FieldType::Position => {
                let mut cursor = self.complex(data, 12)?;
                let mut v = [0f32; 3];
                for c in &mut v {
                    *c = cursor.read_f32::<LittleEndian>()?;
                }
                GffValue::Position(v)
            }
            FieldType::Struct => GffValue::Struct(self.read_struct(data, depth + 1)?),
            FieldType::List => {
                let start = self.header.list_indices_offset as usize + data as usize;
                let count = Cursor::new(self.slice(start, 4)?).read_u32::<LittleEndian>()? as usize;
                let mut cursor = Cursor::new(self.slice(start + 4, count * 4)?);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let index = cursor.read_u32::<LittleEndian>()?;
                    items.push(self.read_struct(index, depth + 1)?);
                }
                GffValue::List(items)
            }
        })
    }

    fn read_loc_string(&self, offset: u32) -> Result<LocalizedString> {
        let mut cursor = self.complex(offset, 12)?;
        let _total = cursor.read_u32::<LittleEndian>()?;
        let strref = cursor.read_u32::<LittleEndian>()?;
        let count = cursor.read_u32::<LittleEndian>()?;

        let mut position = offset as usize + 12;
        let mut substrings = BTreeMap::new();
        for _ in 0..count {
            let mut head = Cursor::new(self.slice(self.header.field_data_offset as usize + position, 8)?);
            let id = head.read_u32::<LittleEndian>()?;
            let len = head.read_u32::<LittleEndian>()? as usize;
            substrings.insert(id, self.text(position + 8, len)?);
            position += 8 + len;
        }

        Ok(LocalizedString {
            string_ref: (strref != u32::MAX).then_some(strref),
            substrings,
        })
    }

    fn complex(&self, offset: u32, len: usize) -> Result<Cursor<&'a [u8]>> {
        let start = self.header.field_data_offset as usize + offset as usize;
        Ok(Cursor::new(self.slice(start, len)?))
    }

    fn text(&self, data_offset: usize, len: usize) -> Result<String> {
        let start = self.header.field_data_offset as usize + data_offset;
        Ok(String::from_utf8_lossy(self.slice(start, len)?).into_owned())
    }

    fn slice(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        self.data.get(start..start + len).ok_or_else(|| {
            Error::invalid_format(format!("read of {len} bytes at {start} outside file"))
        })
    }
}
