//! GFF modifiers: field edits and `AddField` inserts

use crate::value::ValueExpr;
use kotor_gff::{FieldPath, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path suffix addressing the strref of a localized string
pub const STRREF_SUFFIX: &str = "(strref)";

/// Split `FirstName(strref)` into `FirstName` and `true`
pub fn split_strref_suffix(path: &str) -> (&str, bool) {
    let len = path.len();
    if len >= STRREF_SUFFIX.len()
        && path.is_char_boundary(len - STRREF_SUFFIX.len())
        && path[len - STRREF_SUFFIX.len()..].eq_ignore_ascii_case(STRREF_SUFFIX)
    {
        (&path[..len - STRREF_SUFFIX.len()], true)
    } else {
        (path, false)
    }
}

/// Case-insensitive path comparison that tolerates `\`, `/` and `[n]` forms
pub fn same_path(a: &str, b: &str) -> bool {
    let (a, a_strref) = split_strref_suffix(a);
    let (b, b_strref) = split_strref_suffix(b);
    a_strref == b_strref && FieldPath::parse(a).eq_ignore_case(&FieldPath::parse(b))
}

/// `Path=value` edit of an existing field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEdit {
    /// Field path; a `(strref)` suffix addresses a localized string's strref
    pub path: String,
    /// New value
    pub value: ValueExpr,
}

impl FieldEdit {
    /// Edit of `path`
    pub fn new(path: impl Into<String>, value: ValueExpr) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// True when the edit targets a localized string's strref
    pub fn is_strref(&self) -> bool {
        split_strref_suffix(&self.path).1
    }
}

/// `AddField` creating a labelled field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInsert {
    /// Path of the parent struct; empty for the root or the enclosing insert
    #[serde(default)]
    pub path: String,
    /// Label of the new field
    pub label: String,
    /// Field type
    #[serde(with = "field_type_name")]
    pub field_type: FieldType,
    /// Value; the strref for localized strings, the struct id for structs
    #[serde(default = "empty_value")]
    pub value: ValueExpr,
    /// Localized substrings keyed by `language * 2 + gender`
    #[serde(default)]
    pub substrings: BTreeMap<u32, String>,
    /// Inserts into the new field (struct or list)
    #[serde(default)]
    pub children: Vec<NestedInsert>,
}

/// `AddField` appending a struct to a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInsert {
    /// Path of the list
    pub path: String,
    /// Struct id of the new element
    #[serde(default)]
    pub struct_id: u32,
    /// Fields of the new element
    #[serde(default)]
    pub children: Vec<NestedInsert>,
    /// `2DAMEMORY<n>=ListIndex` store
    #[serde(default)]
    pub index_token: Option<u32>,
}

/// Insert nested below another insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NestedInsert {
    /// Labelled field
    FieldInsert(FieldInsert),
    /// List element
    ListInsert(ListInsert),
}

/// A GFF modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldTreeModifier {
    /// `Path=value`
    FieldEdit(FieldEdit),
    /// `AddField` of a labelled field
    FieldInsert(FieldInsert),
    /// `AddField` of a list element
    ListInsert(ListInsert),
}

impl From<NestedInsert> for FieldTreeModifier {
    fn from(insert: NestedInsert) -> Self {
        match insert {
            NestedInsert::FieldInsert(field) => FieldTreeModifier::FieldInsert(field),
            NestedInsert::ListInsert(list) => FieldTreeModifier::ListInsert(list),
        }
    }
}

impl FieldTreeModifier {
    /// Row tokens stored by this modifier and its children
    pub fn stored_tokens(&self) -> Vec<u32> {
        let mut out = Vec::new();
        match self {
            FieldTreeModifier::FieldEdit(_) => {}
            FieldTreeModifier::FieldInsert(field) => collect_list_tokens(&field.children, &mut out),
            FieldTreeModifier::ListInsert(list) => {
                out.extend(list.index_token);
                collect_list_tokens(&list.children, &mut out);
            }
        }
        out
    }

    /// True when both modifiers address the same field.
    ///
    /// Field edits are matched by path since their value may have been
    /// linked to a token since submission; inserts by their whole content.
    pub fn same_target(&self, other: &FieldTreeModifier) -> bool {
        match (self, other) {
            (FieldTreeModifier::FieldEdit(a), FieldTreeModifier::FieldEdit(b)) => same_path(&a.path, &b.path),
            (a, b) => a == b,
        }
    }

    /// Every value expression, children included
    pub fn values(&self) -> Vec<&ValueExpr> {
        let mut out = Vec::new();
        match self {
            FieldTreeModifier::FieldEdit(edit) => out.push(&edit.value),
            FieldTreeModifier::FieldInsert(field) => collect_field_values(field, &mut out),
            FieldTreeModifier::ListInsert(list) => collect_nested_values(&list.children, &mut out),
        }
        out
    }
}

fn collect_list_tokens(children: &[NestedInsert], out: &mut Vec<u32>) {
    for child in children {
        match child {
            NestedInsert::FieldInsert(field) => collect_list_tokens(&field.children, out),
            NestedInsert::ListInsert(list) => {
                out.extend(list.index_token);
                collect_list_tokens(&list.children, out);
            }
        }
    }
}

fn collect_field_values<'a>(field: &'a FieldInsert, out: &mut Vec<&'a ValueExpr>) {
    out.push(&field.value);
    collect_nested_values(&field.children, out);
}

fn collect_nested_values<'a>(children: &'a [NestedInsert], out: &mut Vec<&'a ValueExpr>) {
    for child in children {
        match child {
            NestedInsert::FieldInsert(field) => collect_field_values(field, out),
            NestedInsert::ListInsert(list) => collect_nested_values(&list.children, out),
        }
    }
}

fn empty_value() -> ValueExpr {
    ValueExpr::Constant(String::new())
}

/// Serde adapter writing field types by their script name (`DWORD`, `ExoLocString`)
mod field_type_name {
    use kotor_gff::FieldType;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &FieldType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.script_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldType, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(D::Error::custom)
    }
}
