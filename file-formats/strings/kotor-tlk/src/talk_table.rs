//! Talk table model and `TLK V3.0` codec

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Signature and version at the start of every talk table
pub const TLK_MAGIC: &[u8; 8] = b"TLK V3.0";

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 20;

/// Size of one entry record in bytes
pub const ENTRY_SIZE: usize = 40;

const FLAG_TEXT_PRESENT: u32 = 0x1;
const FLAG_SOUND_PRESENT: u32 = 0x2;
const FLAG_SOUND_LENGTH_PRESENT: u32 = 0x4;

/// One talk table entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TlkEntry {
    /// Localized text
    pub text: String,
    /// Voice-over resref, at most 16 characters
    pub sound: String,
    /// Voice-over duration in seconds
    pub sound_length: f32,
}

impl TlkEntry {
    /// Create a text-only entry
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach a voice-over resref
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if !self.text.is_empty() {
            flags |= FLAG_TEXT_PRESENT;
        }
        if !self.sound.is_empty() {
            flags |= FLAG_SOUND_PRESENT;
        }
        if self.sound_length > 0.0 {
            flags |= FLAG_SOUND_LENGTH_PRESENT;
        }
        flags
    }
}

/// A talk table: language id plus entries addressed by strref
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TalkTable {
    language: u32,
    entries: Vec<TlkEntry>,
}

impl TalkTable {
    /// Create an empty table for a language id (0 = English)
    pub fn new(language: u32) -> Self {
        Self {
            language,
            entries: Vec::new(),
        }
    }

    /// Language id
    pub fn language(&self) -> u32 {
        self.language
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry and return its strref
    pub fn push(&mut self, entry: TlkEntry) -> u32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }

    /// Entry at a strref
    pub fn get(&self, strref: u32) -> Option<&TlkEntry> {
        self.entries.get(strref as usize)
    }

    /// Text at a strref
    pub fn text(&self, strref: u32) -> Option<&str> {
        self.get(strref).map(|e| e.text.as_str())
    }

    /// All entries in strref order
    pub fn entries(&self) -> &[TlkEntry] {
        &self.entries
    }

    /// Decode a `TLK V3.0` file
    pub fn read(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE || &data[..8] != TLK_MAGIC {
            let found = String::from_utf8_lossy(&data[..data.len().min(8)]).into_owned();
            return Err(Error::InvalidHeader(format!(
                "expected 'TLK V3.0', found '{found}'"
            )));
        }

        let mut cursor = Cursor::new(data);
        cursor.set_position(8);
        let language = cursor.read_u32::<LittleEndian>()?;
        let count = cursor.read_u32::<LittleEndian>()? as usize;
        let strings_offset = cursor.read_u32::<LittleEndian>()? as usize;

        let needed = HEADER_SIZE + count * ENTRY_SIZE;
        if data.len() < needed {
            return Err(Error::InvalidHeader(format!(
                "{count} entries need {needed} bytes, file has {}",
                data.len()
            )));
        }

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let flags = cursor.read_u32::<LittleEndian>()?;
            let mut resref = [0u8; 16];
            std::io::Read::read_exact(&mut cursor, &mut resref)?;
            let _volume_variance = cursor.read_u32::<LittleEndian>()?;
            let _pitch_variance = cursor.read_u32::<LittleEndian>()?;
            let offset = cursor.read_u32::<LittleEndian>()? as usize;
            let size = cursor.read_u32::<LittleEndian>()? as usize;
            let sound_length = cursor.read_f32::<LittleEndian>()?;

            let text = if flags & FLAG_TEXT_PRESENT != 0 || size > 0 {
                let start = strings_offset + offset;
                let bytes = data.get(start..start + size).ok_or_else(|| Error::InvalidEntry {
                    index,
                    reason: format!("text range {start}..{} outside file", start + size),
                })?;
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                String::new()
            };

            let sound = if flags & FLAG_SOUND_PRESENT != 0 {
                let end = resref.iter().position(|b| *b == 0).unwrap_or(resref.len());
                String::from_utf8_lossy(&resref[..end]).into_owned()
            } else {
                String::new()
            };

            entries.push(TlkEntry {
                text,
                sound,
                sound_length: if flags & FLAG_SOUND_LENGTH_PRESENT != 0 {
                    sound_length
                } else {
                    0.0
                },
            });
        }

        log::trace!("Decoded talk table with {} entries", entries.len());
        Ok(Self { language, entries })
    }

    /// Encode as `TLK V3.0`
    pub fn write(&self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| Error::CapacityExceeded("too many entries".to_string()))?;
        let strings_offset = HEADER_SIZE + self.entries.len() * ENTRY_SIZE;

        let mut out = Vec::with_capacity(strings_offset);
        out.extend_from_slice(TLK_MAGIC);
        out.write_u32::<LittleEndian>(self.language)?;
        out.write_u32::<LittleEndian>(count)?;
        out.write_u32::<LittleEndian>(strings_offset as u32)?;

        let mut strings = Vec::new();
        for entry in &self.entries {
            let mut resref = [0u8; 16];
            let sound = entry.sound.as_bytes();
            let len = sound.len().min(resref.len());
            resref[..len].copy_from_slice(&sound[..len]);

            out.write_u32::<LittleEndian>(entry.flags())?;
            out.extend_from_slice(&resref);
            out.write_u32::<LittleEndian>(0)?;
            out.write_u32::<LittleEndian>(0)?;
            out.write_u32::<LittleEndian>(strings.len() as u32)?;
            out.write_u32::<LittleEndian>(entry.text.len() as u32)?;
            out.write_f32::<LittleEndian>(entry.sound_length)?;
            strings.extend_from_slice(entry.text.as_bytes());
        }

        out.extend_from_slice(&strings);
        Ok(out)
    }
}
