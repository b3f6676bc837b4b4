//! GFF field types and values

use crate::{Error, GffStruct, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// GFF field type ids as stored in the field array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Unsigned 8-bit
    Byte,
    /// Signed 8-bit
    Char,
    /// Unsigned 16-bit
    Word,
    /// Signed 16-bit
    Short,
    /// Unsigned 32-bit
    DWord,
    /// Signed 32-bit
    Int,
    /// Unsigned 64-bit
    DWord64,
    /// Signed 64-bit
    Int64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Length-prefixed string
    ExoString,
    /// Resource reference, at most 16 characters
    ResRef,
    /// Localized string: strref plus per-language substrings
    ExoLocString,
    /// Raw bytes
    Binary,
    /// Nested struct
    Struct,
    /// List of structs
    List,
    /// Quaternion
    Orientation,
    /// 3-component vector
    Position,
}

impl FieldType {
    /// Numeric id used in the field array
    pub fn id(self) -> u32 {
        match self {
            FieldType::Byte => 0,
            FieldType::Char => 1,
            FieldType::Word => 2,
            FieldType::Short => 3,
            FieldType::DWord => 4,
            FieldType::Int => 5,
            FieldType::DWord64 => 6,
            FieldType::Int64 => 7,
            FieldType::Float => 8,
            FieldType::Double => 9,
            FieldType::ExoString => 10,
            FieldType::ResRef => 11,
            FieldType::ExoLocString => 12,
            FieldType::Binary => 13,
            FieldType::Struct => 14,
            FieldType::List => 15,
            FieldType::Orientation => 16,
            FieldType::Position => 17,
        }
    }

    /// Type for a numeric id
    pub fn from_id(id: u32) -> Result<Self> {
        Ok(match id {
            0 => FieldType::Byte,
            1 => FieldType::Char,
            2 => FieldType::Word,
            3 => FieldType::Short,
            4 => FieldType::DWord,
            5 => FieldType::Int,
            6 => FieldType::DWord64,
            7 => FieldType::Int64,
            8 => FieldType::Float,
            9 => FieldType::Double,
            10 => FieldType::ExoString,
            11 => FieldType::ResRef,
            12 => FieldType::ExoLocString,
            13 => FieldType::Binary,
            14 => FieldType::Struct,
            15 => FieldType::List,
            16 => FieldType::Orientation,
            17 => FieldType::Position,
            other => return Err(Error::UnknownFieldType(other)),
        })
    }

    /// Name used by patch scripts (`FieldType=` keys)
    pub fn script_name(self) -> &'static str {
        match self {
            FieldType::Byte => "Byte",
            FieldType::Char => "Char",
            FieldType::Word => "Word",
            FieldType::Short => "Short",
            FieldType::DWord => "DWORD",
            FieldType::Int => "Int",
            FieldType::DWord64 => "DWORD64",
            FieldType::Int64 => "Int64",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
            FieldType::ExoString => "ExoString",
            FieldType::ResRef => "ResRef",
            FieldType::ExoLocString => "ExoLocString",
            FieldType::Binary => "Binary",
            FieldType::Struct => "Struct",
            FieldType::List => "List",
            FieldType::Orientation => "Orientation",
            FieldType::Position => "Position",
        }
    }

    /// Types whose payload lives in the field data block
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            FieldType::DWord64
                | FieldType::Int64
                | FieldType::Double
                | FieldType::ExoString
                | FieldType::ResRef
                | FieldType::ExoLocString
                | FieldType::Binary
                | FieldType::Orientation
                | FieldType::Position
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        (0..=17)
            .filter_map(|id| FieldType::from_id(id).ok())
            .find(|t| t.script_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_format(format!("unknown field type name '{s}'")))
    }
}

/// Localized string: an optional talk-table strref plus inline substrings
///
/// Substring keys combine language and gender as `language * 2 + gender`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedString {
    /// Talk-table reference, `None` when stored as `0xFFFFFFFF`
    pub string_ref: Option<u32>,
    /// Inline substrings keyed by `language * 2 + gender`
    pub substrings: BTreeMap<u32, String>,
}

impl LocalizedString {
    /// Localized string that only points at a strref
    pub fn from_strref(strref: u32) -> Self {
        Self {
            string_ref: Some(strref),
            substrings: BTreeMap::new(),
        }
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum GffValue {
    /// Unsigned 8-bit
    Byte(u8),
    /// Signed 8-bit
    Char(i8),
    /// Unsigned 16-bit
    Word(u16),
    /// Signed 16-bit
    Short(i16),
    /// Unsigned 32-bit
    DWord(u32),
    /// Signed 32-bit
    Int(i32),
    /// Unsigned 64-bit
    DWord64(u64),
    /// Signed 64-bit
    Int64(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// String
    ExoString(String),
    /// Resource reference
    ResRef(String),
    /// Localized string
    ExoLocString(LocalizedString),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Nested struct
    Struct(GffStruct),
    /// List of structs
    List(Vec<GffStruct>),
    /// Quaternion (x, y, z, w)
    Orientation([f32; 4]),
    /// Vector (x, y, z)
    Position([f32; 3]),
}

impl GffValue {
    /// Field type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            GffValue::Byte(_) => FieldType::Byte,
            GffValue::Char(_) => FieldType::Char,
            GffValue::Word(_) => FieldType::Word,
            GffValue::Short(_) => FieldType::Short,
            GffValue::DWord(_) => FieldType::DWord,
            GffValue::Int(_) => FieldType::Int,
            GffValue::DWord64(_) => FieldType::DWord64,
            GffValue::Int64(_) => FieldType::Int64,
            GffValue::Float(_) => FieldType::Float,
            GffValue::Double(_) => FieldType::Double,
            GffValue::ExoString(_) => FieldType::ExoString,
            GffValue::ResRef(_) => FieldType::ResRef,
            GffValue::ExoLocString(_) => FieldType::ExoLocString,
            GffValue::Binary(_) => FieldType::Binary,
            GffValue::Struct(_) => FieldType::Struct,
            GffValue::List(_) => FieldType::List,
            GffValue::Orientation(_) => FieldType::Orientation,
            GffValue::Position(_) => FieldType::Position,
        }
    }

    /// Render the value the way patch scripts write literals.
    ///
    /// Localized strings render as their strref (`-1` when unset), vectors as
    /// `|`-separated components. Binary, struct and list values have no
    /// literal form.
    pub fn literal(&self) -> Option<String> {
        Some(match self {
            GffValue::Byte(v) => v.to_string(),
            GffValue::Char(v) => v.to_string(),
            GffValue::Word(v) => v.to_string(),
            GffValue::Short(v) => v.to_string(),
            GffValue::DWord(v) => v.to_string(),
            GffValue::Int(v) => v.to_string(),
            GffValue::DWord64(v) => v.to_string(),
            GffValue::Int64(v) => v.to_string(),
            GffValue::Float(v) => v.to_string(),
            GffValue::Double(v) => v.to_string(),
            GffValue::ExoString(v) | GffValue::ResRef(v) => v.clone(),
            GffValue::ExoLocString(loc) => match loc.string_ref {
                Some(strref) => strref.to_string(),
                None => "-1".to_string(),
            },
            GffValue::Orientation(v) => join_components(v),
            GffValue::Position(v) => join_components(v),
            GffValue::Binary(_) | GffValue::Struct(_) | GffValue::List(_) => return None,
        })
    }

    /// Nested struct, if this is a struct field
    pub fn as_struct(&self) -> Option<&GffStruct> {
        match self {
            GffValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Struct list, if this is a list field
    pub fn as_list(&self) -> Option<&[GffStruct]> {
        match self {
            GffValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Localized string, if this is a localized string field
    pub fn as_loc_string(&self) -> Option<&LocalizedString> {
        match self {
            GffValue::ExoLocString(loc) => Some(loc),
            _ => None,
        }
    }
}

fn join_components(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_type_ids_round_trip() {
        for id in 0..=17 {
            assert_eq!(FieldType::from_id(id).unwrap().id(), id);
        }
        assert!(matches!(
            FieldType::from_id(18),
            Err(Error::UnknownFieldType(18))
        ));
    }

    #[test_case("DWORD", FieldType::DWord)]
    #[test_case("exolocstring", FieldType::ExoLocString)]
    #[test_case("Position", FieldType::Position)]
    fn test_script_names_parse(name: &str, expected: FieldType) {
        assert_eq!(name.parse::<FieldType>().unwrap(), expected);
    }

    #[test]
    fn test_literals() {
        assert_eq!(GffValue::Word(7).literal().as_deref(), Some("7"));
        assert_eq!(GffValue::Int(-3).literal().as_deref(), Some("-3"));
        assert_eq!(
            GffValue::ExoLocString(LocalizedString::from_strref(55))
                .literal()
                .as_deref(),
            Some("55")
        );
        assert_eq!(
            GffValue::ExoLocString(LocalizedString::default())
                .literal()
                .as_deref(),
            Some("-1")
        );
        assert_eq!(
            GffValue::Position([1.0, 2.5, 0.0]).literal().as_deref(),
            Some("1|2.5|0")
        );
        assert_eq!(GffValue::List(Vec::new()).literal(), None);
    }
}
