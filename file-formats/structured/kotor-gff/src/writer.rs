//! GFF `V3.2` encoding

use crate::reader::{GFF_VERSION, HEADER_SIZE, MAX_DEPTH};
use crate::{Error, Gff, GffField, GffStruct, GffValue, LocalizedString, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::HashMap;

const MAX_LABEL_LEN: usize = 16;

/// Encode a GFF document
pub fn write_gff(gff: &Gff) -> Result<Vec<u8>> {
    let mut builder = Builder::default();
    builder.add_struct(&gff.root, 0)?;
    builder.finish(gff.file_type)
}

#[derive(Default)]
struct Builder {
    structs: Vec<[u32; 3]>,
    fields: Vec<[u32; 3]>,
    labels: Vec<[u8; MAX_LABEL_LEN]>,
    label_lookup: HashMap<String, u32>,
    field_data: Vec<u8>,
    field_indices: Vec<u8>,
    list_indices: Vec<u8>,
}

impl Builder {
    fn add_struct(&mut self, value: &GffStruct, depth: usize) -> Result<u32> {
        if depth > MAX_DEPTH {
            return Err(Error::NestingTooDeep(MAX_DEPTH));
        }
        let index = self.structs.len();
        self.structs.push([value.struct_id, 0, value.len() as u32]);

        let mut field_ids = Vec::with_capacity(value.len());
        for field in value.fields() {
            field_ids.push(self.add_field(field, depth)?);
        }

        let data = match field_ids.as_slice() {
            [] => u32::MAX,
            [only] => *only,
            many => {
                let offset = self.field_indices.len() as u32;
                for id in many {
                    self.field_indices.write_u32::<LittleEndian>(*id)?;
                }
                offset
            }
        };
        self.structs[index][1] = data;
        Ok(index as u32)
    }

    fn add_field(&mut self, field: &GffField, depth: usize) -> Result<u32> {
        let label = self.label(&field.label)?;
        let index = self.fields.len();
        self.fields
            .push([field.value.field_type().id(), label, 0]);

        let data = match &field.value {
            GffValue::Byte(v) => u32::from(*v),
            GffValue::Char(v) => *v as u8 as u32,
            GffValue::Word(v) => u32::from(*v),
            GffValue::Short(v) => *v as u16 as u32,
            GffValue::DWord(v) => *v,
            GffValue::Int(v) => *v as u32,
            GffValue::Float(v) => v.to_bits(),
            GffValue::DWord64(v) => {
                let offset = self.data_offset();
                self.field_data.write_u64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::Int64(v) => {
                let offset = self.data_offset();
                self.field_data.write_i64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::Double(v) => {
                let offset = self.data_offset();
                self.field_data.write_f64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::ExoString(text) => {
                let offset = self.data_offset();
                self.field_data.write_u32::<LittleEndian>(text.len() as u32)?;
                self.field_data.extend_from_slice(text.as_bytes());
                offset
            }
            GffValue::ResRef(text) => {
                let bytes = text.as_bytes();
                let len = bytes.len().min(u8::MAX as usize);
                let offset = self.data_offset();
                self.field_data.push(len as u8);
                self.field_data.extend_from_slice(&bytes[..len]);
                offset
            }
            GffValue::ExoLocString(loc) => self.add_loc_string(loc)?,
            GffValue::Binary(bytes) => {
                let offset = self.data_offset();
                self.field_data.write_u32::<LittleEndian>(bytes.len() as u32)?;
                self.field_data.extend_from_slice(bytes);
                offset
            }
            GffValue::Orientation(v) => {
                let offset = self.data_offset();
                for c in v {
                    self.field_data.write_f32::<LittleEndian>(*c)?;
                }
                offset
            }
            GffValue::Position(v) => {
                let offset = self.data_offset();
                for c in v {
                    self.field_data.write_f32::<LittleEndian>(*c)?;
                }
                offset
            }
            GffValue::Struct(inner) => self.add_struct(inner, depth + 1)?,
            GffValue::List(items) => {
                // slots are reserved up front; nested lists append behind them
                let offset = self.list_indices.len();
                self.list_indices
                    .write_u32::<LittleEndian>(items.len() as u32)?;
                self.list_indices.resize(offset + 4 + items.len() * 4, 0);
                for (i, item) in items.iter().enumerate() {
                    let struct_index = self.add_struct(item, depth + 1)?;
                    let slot = offset + 4 + i * 4;
                    self.list_indices[slot..slot + 4].copy_from_slice(&struct_index.to_le_bytes());
                }
                offset as u32
            }
        };
        self.fields[index][2] = data;
        Ok(index as u32)
    }

    fn add_loc_string(&mut self, loc: &LocalizedString) -> Result<u32> {
        let offset = self.data_offset();
        let body: usize = 8 + loc
            .substrings
            .values()
            .map(|text| 8 + text.len())
            .sum::<usize>();
        self.field_data.write_u32::<LittleEndian>(body as u32)?;
        self.field_data
            .write_u32::<LittleEndian>(loc.string_ref.unwrap_or(u32::MAX))?;
        self.field_data
            .write_u32::<LittleEndian>(loc.substrings.len() as u32)?;
        for (id, text) in &loc.substrings {
            self.field_data.write_u32::<LittleEndian>(*id)?;
            self.field_data.write_u32::<LittleEndian>(text.len() as u32)?;
            self.field_data.extend_from_slice(text.as_bytes());
        }
        Ok(offset)
    }

    fn label(&mut self, label: &str) -> Result<u32> {
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong(label.to_string()));
        }
        if let Some(index) = self.label_lookup.get(label) {
            return Ok(*index);
        }
        let mut raw = [0u8; MAX_LABEL_LEN];
        raw[..label.len()].copy_from_slice(label.as_bytes());
        let index = self.labels.len() as u32;
        self.labels.push(raw);
        self.label_lookup.insert(label.to_string(), index);
        Ok(index)
    }

    fn data_offset(&self) -> u32 {
        self.field_data.len() as u32
    }

    fn finish(self, file_type: [u8; 4]) -> Result<Vec<u8>> {
        let struct_offset = HEADER_SIZE;
        let field_offset = struct_offset + self.structs.len() * 12;
        let label_offset = field_offset + self.fields.len() * 12;
        let field_data_offset = label_offset + self.labels.len() * MAX_LABEL_LEN;
        let field_indices_offset = field_data_offset + self.field_data.len();
        let list_indices_offset = field_indices_offset + self.field_indices.len();
        let total = list_indices_offset + self.list_indices.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&file_type);
        out.extend_from_slice(GFF_VERSION);
        for value in [
            struct_offset,
            self.structs.len(),
            field_offset,
            self.fields.len(),
            label_offset,
            self.labels.len(),
            field_data_offset,
            self.field_data.len(),
            field_indices_offset,
            self.field_indices.len(),
            list_indices_offset,
            self.list_indices.len(),
        ] {
            out.write_u32::<LittleEndian>(value as u32)?;
        }

        for entry in self.structs.iter().chain(&self.fields) {
            for word in entry {
                out.write_u32::<LittleEndian>(*word)?;
            }
        }
        for label in &self.labels {
            out.extend_from_slice(label);
        }
        out.extend_from_slice(&self.field_data);
        out.extend_from_slice(&self.field_indices);
        out.extend_from_slice(&self.list_indices);

        log::trace!(
            "Encoded GFF with {} structs, {} fields, {} bytes",
            self.structs.len(),
            self.fields.len(),
            out.len()
        );
        Ok(out)
    }
}
