//! 2DA modifiers: `ChangeRow`, `AddRow`, `CopyRow`, `AddColumn`

use crate::value::{EmptyRecord, RecordContext, ValueExpr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Row a `ChangeRow` or `CopyRow` applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTarget {
    /// `RowIndex=<n>`
    RowIndex(usize),
    /// `RowLabel=<label>`
    RowLabel(String),
    /// `LabelIndex=<value>`: first row whose `label` column holds the value
    LabelColumn(String),
}

/// Cell assignments keyed by column name
pub type Cells = BTreeMap<String, ValueExpr>;

/// `2DAMEMORY<token>=<value>` stores keyed by token id
pub type RowStores = BTreeMap<u32, ValueExpr>;

/// Edit of an existing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRow {
    /// Row to change
    pub target: RowTarget,
    /// New cell values
    #[serde(default)]
    pub cells: Cells,
    /// Token stores
    #[serde(default)]
    pub stores: RowStores,
}

impl ChangeRow {
    /// Edit of the row at `index`
    pub fn at_index(index: usize) -> Self {
        Self {
            target: RowTarget::RowIndex(index),
            cells: Cells::new(),
            stores: RowStores::new(),
        }
    }
}

/// Appended row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRow {
    /// Skip the insert (and edit the existing row) when a row with the same
    /// value in this column exists
    #[serde(default)]
    pub exclusive_column: Option<String>,
    /// Label of the new row; the applier uses the new index when absent
    #[serde(default)]
    pub row_label: Option<String>,
    /// Cell values of the new row
    #[serde(default)]
    pub cells: Cells,
    /// Token stores
    #[serde(default)]
    pub stores: RowStores,
    /// Row index this row had in the installation it was diffed from
    #[serde(default)]
    pub source_row: Option<usize>,
}

/// Row duplicated from an existing one, then edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRow {
    /// Row to copy
    pub target: RowTarget,
    /// Same meaning as on [`AddRow`]
    #[serde(default)]
    pub exclusive_column: Option<String>,
    /// `NewRowLabel=`
    #[serde(default)]
    pub row_label: Option<String>,
    /// Cells overridden on the copy
    #[serde(default)]
    pub cells: Cells,
    /// Token stores
    #[serde(default)]
    pub stores: RowStores,
    /// Row index the copy had in the installation it was diffed from
    #[serde(default)]
    pub source_row: Option<usize>,
}

/// Appended column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumn {
    /// Column header
    pub header: String,
    /// Value of rows without a seed
    #[serde(default)]
    pub default: String,
    /// `I<row>=` seeds
    #[serde(default)]
    pub index_insert: BTreeMap<usize, ValueExpr>,
    /// `L<label>=` seeds
    #[serde(default)]
    pub label_insert: BTreeMap<String, ValueExpr>,
    /// `2DAMEMORY<token>=I<row>` or `L<label>` stores
    #[serde(default)]
    pub stores: BTreeMap<u32, String>,
}

impl AddColumn {
    /// Store key of an index seed
    pub fn index_key(row: usize) -> String {
        format!("I{row}")
    }

    /// Store key of a label seed
    pub fn label_key(label: &str) -> String {
        format!("L{label}")
    }

    /// Seed behind a store key
    pub fn seed(&self, key: &str) -> Option<&ValueExpr> {
        if let Some(row) = key.strip_prefix('I').and_then(|r| r.parse::<usize>().ok()) {
            return self.index_insert.get(&row);
        }
        key.strip_prefix('L')
            .and_then(|label| self.label_insert.get(label))
    }

    /// Seeds with their store keys: index seeds by row, then label seeds
    pub fn seeds(&self) -> impl Iterator<Item = (String, &ValueExpr)> + '_ {
        self.index_insert
            .iter()
            .map(|(row, value)| (Self::index_key(*row), value))
            .chain(
                self.label_insert
                    .iter()
                    .map(|(label, value)| (Self::label_key(label), value)),
            )
    }

    /// Lowest token storing `key`
    pub fn token_for_key(&self, key: &str) -> Option<u32> {
        self.stores
            .iter()
            .find(|(_, stored)| stored.as_str() == key)
            .map(|(token, _)| *token)
    }
}

/// A 2DA modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowTableModifier {
    /// `ChangeRow`
    ChangeRow(ChangeRow),
    /// `AddRow`
    AddRow(AddRow),
    /// `CopyRow`
    CopyRow(CopyRow),
    /// `AddColumn`
    AddColumn(AddColumn),
}

/// View of one row modifier as a record, for static evaluation
struct RowRecord<'a> {
    cells: &'a Cells,
    index: Option<usize>,
    label: Option<&'a str>,
}

impl RecordContext for RowRecord<'_> {
    fn lookup(&self, name: &str) -> Option<&ValueExpr> {
        self.cells
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn row_index(&self) -> Option<usize> {
        self.index
    }

    fn row_label(&self) -> Option<&str> {
        self.label
    }
}

impl RowTableModifier {
    /// Script section prefix (`ChangeRow`, `AddRow`, ...)
    pub fn keyword(&self) -> &'static str {
        match self {
            RowTableModifier::ChangeRow(_) => "ChangeRow",
            RowTableModifier::AddRow(_) => "AddRow",
            RowTableModifier::CopyRow(_) => "CopyRow",
            RowTableModifier::AddColumn(_) => "AddColumn",
        }
    }

    /// Every token id this modifier stores into
    pub fn stored_tokens(&self) -> Vec<u32> {
        match self {
            RowTableModifier::ChangeRow(m) => m.stores.keys().copied().collect(),
            RowTableModifier::AddRow(m) => m.stores.keys().copied().collect(),
            RowTableModifier::CopyRow(m) => m.stores.keys().copied().collect(),
            RowTableModifier::AddColumn(m) => m.stores.keys().copied().collect(),
        }
    }

    /// Every value expression the modifier writes
    pub fn values(&self) -> Vec<&ValueExpr> {
        match self {
            RowTableModifier::ChangeRow(m) => m.cells.values().chain(m.stores.values()).collect(),
            RowTableModifier::AddRow(m) => m.cells.values().chain(m.stores.values()).collect(),
            RowTableModifier::CopyRow(m) => m.cells.values().chain(m.stores.values()).collect(),
            RowTableModifier::AddColumn(m) => m
                .index_insert
                .values()
                .chain(m.label_insert.values())
                .collect(),
        }
    }

    /// Statically evaluable stores as `(token, stored text)`
    pub fn evaluable_stores(&self) -> Vec<(u32, String)> {
        match self {
            RowTableModifier::ChangeRow(m) => {
                let (index, label) = match &m.target {
                    RowTarget::RowIndex(index) => (Some(*index), None),
                    RowTarget::RowLabel(label) => (None, Some(label.as_str())),
                    RowTarget::LabelColumn(_) => (None, None),
                };
                eval_stores(
                    &m.stores,
                    &RowRecord {
                        cells: &m.cells,
                        index,
                        label,
                    },
                )
            }
            RowTableModifier::AddRow(m) => eval_stores(
                &m.stores,
                &RowRecord {
                    cells: &m.cells,
                    index: None,
                    label: m.row_label.as_deref(),
                },
            ),
            RowTableModifier::CopyRow(m) => eval_stores(
                &m.stores,
                &RowRecord {
                    cells: &m.cells,
                    index: None,
                    label: m.row_label.as_deref(),
                },
            ),
            RowTableModifier::AddColumn(m) => m
                .stores
                .iter()
                .filter_map(|(token, key)| {
                    m.seed(key)?
                        .try_static_eval(&EmptyRecord)
                        .map(|s| (*token, s))
                })
                .collect(),
        }
    }

    /// True when both modifiers address the same row or column.
    ///
    /// Buffered modifiers gain stores and linked tokens after submission, so
    /// a resubmitted modifier is matched by what it targets. An `AddRow` with
    /// neither label nor source row is matched by its cells.
    pub fn same_target(&self, other: &RowTableModifier) -> bool {
        match (self, other) {
            (RowTableModifier::ChangeRow(a), RowTableModifier::ChangeRow(b)) => a.target == b.target,
            (RowTableModifier::CopyRow(a), RowTableModifier::CopyRow(b)) => {
                a.target == b.target && a.row_label == b.row_label && a.source_row == b.source_row
            }
            (RowTableModifier::AddRow(a), RowTableModifier::AddRow(b)) => {
                let anchored = |m: &AddRow| m.row_label.is_some() || m.source_row.is_some();
                if anchored(a) || anchored(b) {
                    a.row_label == b.row_label && a.source_row == b.source_row
                } else {
                    a.exclusive_column == b.exclusive_column && a.cells == b.cells
                }
            }
            (RowTableModifier::AddColumn(a), RowTableModifier::AddColumn(b)) => {
                a.header.eq_ignore_ascii_case(&b.header)
            }
            _ => false,
        }
    }

    /// Copy the cells, seeds and stores of `other` that this modifier lacks.
    ///
    /// Values already present win, including tokens linked into them.
    /// Returns the number of entries copied.
    pub fn merge_missing(&mut self, other: RowTableModifier) -> usize {
        match (self, other) {
            (RowTableModifier::ChangeRow(a), RowTableModifier::ChangeRow(b)) => {
                fill_missing(&mut a.cells, b.cells) + fill_missing(&mut a.stores, b.stores)
            }
            (RowTableModifier::AddRow(a), RowTableModifier::AddRow(b)) => {
                fill_missing(&mut a.cells, b.cells) + fill_missing(&mut a.stores, b.stores)
            }
            (RowTableModifier::CopyRow(a), RowTableModifier::CopyRow(b)) => {
                fill_missing(&mut a.cells, b.cells) + fill_missing(&mut a.stores, b.stores)
            }
            (RowTableModifier::AddColumn(a), RowTableModifier::AddColumn(b)) => {
                fill_missing(&mut a.index_insert, b.index_insert)
                    + fill_missing(&mut a.label_insert, b.label_insert)
                    + fill_missing(&mut a.stores, b.stores)
            }
            _ => 0,
        }
    }

    /// Apply `rewrite` to every cell or seed value
    pub fn rewrite_values<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&ValueExpr) -> Option<ValueExpr>,
    {
        let targets: Vec<&mut ValueExpr> = match self {
            RowTableModifier::ChangeRow(m) => m.cells.values_mut().collect(),
            RowTableModifier::AddRow(m) => m.cells.values_mut().collect(),
            RowTableModifier::CopyRow(m) => m.cells.values_mut().collect(),
            RowTableModifier::AddColumn(m) => m
                .index_insert
                .values_mut()
                .chain(m.label_insert.values_mut())
                .collect(),
        };
        let mut count = 0;
        for value in targets {
            if let Some(new) = rewrite(value) {
                *value = new;
                count += 1;
            }
        }
        count
    }
}

fn fill_missing<K: Ord, V>(into: &mut BTreeMap<K, V>, from: BTreeMap<K, V>) -> usize {
    let mut copied = 0;
    for (key, value) in from {
        if let Entry::Vacant(slot) = into.entry(key) {
            slot.insert(value);
            copied += 1;
        }
    }
    copied
}

fn eval_stores(stores: &RowStores, record: &dyn RecordContext) -> Vec<(u32, String)> {
    stores
        .iter()
        .filter_map(|(token, value)| value.try_static_eval(record).map(|s| (*token, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_change_row_stores_pinned_index() {
        let mut change = ChangeRow::at_index(4);
        change.cells.insert("label".into(), ValueExpr::constant("Mission"));
        change.stores.insert(1, ValueExpr::RowIndex);
        change
            .stores
            .insert(2, ValueExpr::IntraRecordRef("LABEL".into()));
        change.stores.insert(3, ValueExpr::RowLabel);
        assert_eq!(
            RowTableModifier::ChangeRow(change).evaluable_stores(),
            vec![(1, "4".to_string()), (2, "Mission".to_string())]
        );
    }

    #[test]
    fn test_add_row_index_is_unknown() {
        let add = AddRow {
            row_label: Some("new_row".into()),
            stores: RowStores::from([(0, ValueExpr::RowIndex), (5, ValueExpr::RowLabel)]),
            ..AddRow::default()
        };
        assert_eq!(
            RowTableModifier::AddRow(add).evaluable_stores(),
            vec![(5, "new_row".to_string())]
        );
    }

    #[test]
    fn test_add_column_stores_follow_seeds() {
        let column = AddColumn {
            header: "newcol".into(),
            default: "****".into(),
            index_insert: BTreeMap::from([(2, ValueExpr::constant("7"))]),
            label_insert: BTreeMap::from([("bastila".into(), ValueExpr::AutoIncrement)]),
            stores: BTreeMap::from([(3, "I2".to_string()), (4, "Lbastila".to_string())]),
        };
        assert_eq!(column.seed("I2"), Some(&ValueExpr::constant("7")));
        assert_eq!(column.token_for_key("I2"), Some(3));
        assert_eq!(
            column.seeds().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["I2", "Lbastila"]
        );
        assert_eq!(
            RowTableModifier::AddColumn(column).evaluable_stores(),
            vec![(3, "7".to_string())]
        );
    }

    #[test]
    fn test_rewrite_values_counts_changes() {
        let mut modifier = RowTableModifier::ChangeRow(ChangeRow {
            target: RowTarget::RowLabel("7".into()),
            cells: Cells::from([
                ("a".into(), ValueExpr::constant("x")),
                ("b".into(), ValueExpr::constant("y")),
            ]),
            stores: RowStores::new(),
        });
        let n = modifier.rewrite_values(|v| {
            (v.as_constant() == Some("x")).then_some(ValueExpr::RowToken(9))
        });
        assert_eq!(n, 1);
        assert_eq!(
            modifier.values(),
            vec![&ValueExpr::RowToken(9), &ValueExpr::constant("y")]
        );
    }

    #[test]
    fn test_add_row_matched_by_source_row() {
        let buffered = RowTableModifier::AddRow(AddRow {
            cells: Cells::from([("label".into(), ValueExpr::constant("HK47"))]),
            stores: RowStores::from([(0, ValueExpr::RowIndex)]),
            source_row: Some(7),
            ..AddRow::default()
        });
        let resubmitted = RowTableModifier::AddRow(AddRow {
            cells: Cells::from([("label".into(), ValueExpr::constant("HK47"))]),
            source_row: Some(7),
            ..AddRow::default()
        });
        assert_ne!(buffered, resubmitted);
        assert!(buffered.same_target(&resubmitted));

        let other = RowTableModifier::AddRow(AddRow {
            source_row: Some(8),
            ..AddRow::default()
        });
        assert!(!buffered.same_target(&other));
    }

    #[test]
    fn test_merge_keeps_linked_values() {
        let mut buffered = ChangeRow::at_index(4);
        buffered.cells.insert("name".into(), ValueExpr::StringTableToken(2));
        let mut buffered = RowTableModifier::ChangeRow(buffered);

        let mut incoming = ChangeRow::at_index(4);
        incoming.cells.insert("name".into(), ValueExpr::constant("42"));
        incoming.cells.insert("portrait".into(), ValueExpr::constant("po_hk47"));
        let incoming = RowTableModifier::ChangeRow(incoming);

        assert!(buffered.same_target(&incoming));
        assert_eq!(buffered.merge_missing(incoming.clone()), 1);
        assert_eq!(buffered.merge_missing(incoming), 0);
        assert_eq!(
            buffered.values(),
            vec![&ValueExpr::StringTableToken(2), &ValueExpr::constant("po_hk47")]
        );
    }

    #[test]
    fn test_add_column_matched_by_header() {
        let a = RowTableModifier::AddColumn(AddColumn {
            header: "Droid".into(),
            ..AddColumn::default()
        });
        let b = RowTableModifier::AddColumn(AddColumn {
            header: "droid".into(),
            default: "0".into(),
            ..AddColumn::default()
        });
        assert!(a.same_target(&b));
        assert!(!a.same_target(&RowTableModifier::ChangeRow(ChangeRow::at_index(0))));
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = "type: change_row\ntarget:\n  row_index: 4\ncells:\n  name:\n    constant: '135'\n";
        let modifier: RowTableModifier = serde_yaml_ng::from_str(yaml).unwrap();
        let mut expected = ChangeRow::at_index(4);
        expected.cells.insert("name".into(), ValueExpr::constant("135"));
        assert_eq!(modifier, RowTableModifier::ChangeRow(expected));
    }
}
