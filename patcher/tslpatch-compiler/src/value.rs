//! Value expressions carried by modifiers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Script keyword for an auto-incremented value
pub const AUTO_INCREMENT: &str = "high()";

/// A value written into a cell, field or slot.
///
/// Only constants, and intra-record references that end in a constant, can be
/// evaluated without the apply-time interpreter. `RowIndex` and `RowLabel`
/// resolve when the owning modifier pins its target row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExpr {
    /// Literal text
    Constant(String),
    /// `StrRef<n>` token
    StringTableToken(u32),
    /// `2DAMEMORY<n>` token
    RowToken(u32),
    /// Value of another column of the same row
    IntraRecordRef(String),
    /// One past the highest value in the column
    AutoIncrement,
    /// Index of the row the modifier touches
    RowIndex,
    /// Label of the row the modifier touches
    RowLabel,
}

/// Record a value expression is evaluated against
pub trait RecordContext {
    /// Value expression bound to a column or field name
    fn lookup(&self, name: &str) -> Option<&ValueExpr>;

    /// Row index, when statically known
    fn row_index(&self) -> Option<usize> {
        None
    }

    /// Row label, when statically known
    fn row_label(&self) -> Option<&str> {
        None
    }
}

/// Context with nothing bound
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRecord;

impl RecordContext for EmptyRecord {
    fn lookup(&self, _name: &str) -> Option<&ValueExpr> {
        None
    }
}

impl ValueExpr {
    /// Constant value from anything string-like
    pub fn constant(value: impl Into<String>) -> Self {
        ValueExpr::Constant(value.into())
    }

    /// Text of a constant
    pub fn as_constant(&self) -> Option<&str> {
        match self {
            ValueExpr::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// True for `StrRef`/`2DAMEMORY` references
    pub fn is_token(&self) -> bool {
        matches!(
            self,
            ValueExpr::StringTableToken(_) | ValueExpr::RowToken(_)
        )
    }

    /// Evaluate without runtime context.
    ///
    /// Returns `None` for tokens, auto-increments, unpinned row selectors and
    /// intra-record reference chains that end nowhere or loop back on
    /// themselves.
    pub fn try_static_eval(&self, record: &dyn RecordContext) -> Option<String> {
        let mut visited = HashSet::new();
        self.eval_with(record, &mut visited)
    }

    fn eval_with(&self, record: &dyn RecordContext, visited: &mut HashSet<String>) -> Option<String> {
        match self {
            ValueExpr::Constant(value) => Some(value.clone()),
            ValueExpr::RowIndex => record.row_index().map(|index| index.to_string()),
            ValueExpr::RowLabel => record.row_label().map(str::to_string),
            ValueExpr::IntraRecordRef(name) => {
                if !visited.insert(name.to_ascii_lowercase()) {
                    log::debug!("Reference cycle through '{name}'");
                    return None;
                }
                record.lookup(name)?.eval_with(record, visited)
            }
            ValueExpr::StringTableToken(_) | ValueExpr::RowToken(_) | ValueExpr::AutoIncrement => {
                None
            }
        }
    }

    /// Render as patch script text
    pub fn to_ini_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Constant(value) => f.write_str(value),
            ValueExpr::StringTableToken(id) => write!(f, "StrRef{id}"),
            ValueExpr::RowToken(id) => write!(f, "2DAMEMORY{id}"),
            ValueExpr::IntraRecordRef(name) => f.write_str(name),
            ValueExpr::AutoIncrement => f.write_str(AUTO_INCREMENT),
            ValueExpr::RowIndex => f.write_str("RowIndex"),
            ValueExpr::RowLabel => f.write_str("RowLabel"),
        }
    }
}

impl From<&str> for ValueExpr {
    fn from(value: &str) -> Self {
        ValueExpr::Constant(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use test_case::test_case;

    struct Row {
        cells: HashMap<String, ValueExpr>,
        index: Option<usize>,
    }

    impl RecordContext for Row {
        fn lookup(&self, name: &str) -> Option<&ValueExpr> {
            self.cells.get(&name.to_ascii_lowercase())
        }

        fn row_index(&self) -> Option<usize> {
            self.index
        }
    }

    fn row(cells: &[(&str, ValueExpr)]) -> Row {
        Row {
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            index: Some(12),
        }
    }

    #[test]
    fn test_reference_chain_resolves_to_constant() {
        let record = row(&[
            ("label", ValueExpr::constant("Bastila")),
            ("alias", ValueExpr::IntraRecordRef("LABEL".into())),
            ("alias2", ValueExpr::IntraRecordRef("alias".into())),
        ]);
        assert_eq!(
            ValueExpr::IntraRecordRef("alias2".into()).try_static_eval(&record),
            Some("Bastila".to_string())
        );
    }

    #[test]
    fn test_reference_cycle_is_not_evaluable() {
        let record = row(&[
            ("a", ValueExpr::IntraRecordRef("b".into())),
            ("b", ValueExpr::IntraRecordRef("A".into())),
        ]);
        assert_eq!(
            ValueExpr::IntraRecordRef("a".into()).try_static_eval(&record),
            None
        );
        let selfref = row(&[("x", ValueExpr::IntraRecordRef("x".into()))]);
        assert_eq!(
            ValueExpr::IntraRecordRef("x".into()).try_static_eval(&selfref),
            None
        );
    }

    #[test]
    fn test_runtime_values_are_not_evaluable() {
        let record = row(&[]);
        assert_eq!(ValueExpr::RowToken(1).try_static_eval(&record), None);
        assert_eq!(ValueExpr::StringTableToken(1).try_static_eval(&record), None);
        assert_eq!(ValueExpr::AutoIncrement.try_static_eval(&record), None);
        assert_eq!(ValueExpr::RowLabel.try_static_eval(&record), None);
        assert_eq!(
            ValueExpr::RowIndex.try_static_eval(&record),
            Some("12".to_string())
        );
        assert_eq!(ValueExpr::RowIndex.try_static_eval(&EmptyRecord), None);
    }

    #[test_case(ValueExpr::constant("7"), "7")]
    #[test_case(ValueExpr::StringTableToken(0), "StrRef0")]
    #[test_case(ValueExpr::RowToken(3), "2DAMEMORY3")]
    #[test_case(ValueExpr::IntraRecordRef("label".into()), "label")]
    #[test_case(ValueExpr::AutoIncrement, "high()")]
    #[test_case(ValueExpr::RowIndex, "RowIndex")]
    fn test_ini_rendering(value: ValueExpr, expected: &str) {
        assert_eq!(value.to_ini_value(), expected);
    }
}
