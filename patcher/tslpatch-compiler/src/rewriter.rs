//! Final literal-to-token pass
//!
//! Runs over a copy of the whole modification set right before
//! serialization, so every flush starts again from the submitted literals.
//! Two steps:
//!
//! 1. GFF field edits whose constant equals a seeded `AddColumn` cell are
//!    linked to the row token storing that cell, allocating one if the column
//!    does not store it yet.
//! 2. Row table modifiers are replayed in processing order. Each modifier
//!    first has its constant cells rewritten to tokens stored by earlier
//!    modifiers, then contributes its own statically known stores.
//!
//! Because a modifier records its stores only after its own cells were
//! rewritten, a cell never references a token stored by itself or by a later
//! modifier. A second run finds nothing left to rewrite.

use crate::modification::{Modification, ModificationSet, Variant};
use crate::modifiers::{FieldTreeModifier, RowTableModifier};
use crate::tokens::{TokenAllocator, TokenKind};
use crate::value::ValueExpr;
use kotor_2da::is_blank;
use serde::Serialize;
use std::collections::HashMap;

/// What one rewrite pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Field edits linked to `AddColumn` stores
    pub field_links: usize,
    /// Stores added to `AddColumn` modifiers for those links
    pub stores_added: usize,
    /// Row table cells rewritten to tokens
    pub cell_rewrites: usize,
}

impl RewriteReport {
    /// Total number of rewritten values
    pub fn rewrites(&self) -> usize {
        self.field_links + self.cell_rewrites
    }
}

/// Position of an `AddColumn` seed
#[derive(Debug, Clone)]
struct SeedSite {
    file: usize,
    modifier: usize,
    key: String,
}

/// Rewrites literal values into token references
#[derive(Debug, Clone, Copy, Default)]
pub struct CellTokenRewriter;

impl CellTokenRewriter {
    /// Run both steps over the set
    pub fn rewrite(set: &mut ModificationSet, tokens: &mut TokenAllocator) -> RewriteReport {
        let mut report = RewriteReport::default();
        Self::link_column_seeds(set, tokens, &mut report);
        Self::rewrite_cells(set, &mut report);
        if report.rewrites() > 0 {
            log::info!(
                "Rewrote {} field(s) and {} cell(s) into tokens",
                report.field_links,
                report.cell_rewrites
            );
        }
        report
    }

    fn link_column_seeds(set: &mut ModificationSet, tokens: &mut TokenAllocator, report: &mut RewriteReport) {
        // first seed per literal wins
        let mut seeds: HashMap<String, SeedSite> = HashMap::new();
        for (file, modification) in set.list(Variant::RowTable).iter().enumerate() {
            let Modification::RowTable(table) = modification else {
                continue;
            };
            for (index, modifier) in table.modifiers.iter().enumerate() {
                let RowTableModifier::AddColumn(column) = modifier else {
                    continue;
                };
                for (key, value) in column.seeds() {
                    let Some(literal) = value.as_constant().filter(|c| !is_blank(c)) else {
                        continue;
                    };
                    seeds.entry(literal.to_string()).or_insert(SeedSite {
                        file,
                        modifier: index,
                        key,
                    });
                }
            }
        }
        if seeds.is_empty() {
            return;
        }

        let mut links = Vec::new();
        for (file, modification) in set.list(Variant::FieldTree).iter().enumerate() {
            let Modification::FieldTree(tree) = modification else {
                continue;
            };
            for (index, modifier) in tree.modifiers.iter().enumerate() {
                let FieldTreeModifier::FieldEdit(edit) = modifier else {
                    continue;
                };
                if edit.is_strref() {
                    continue;
                }
                if let Some(site) = edit.value.as_constant().and_then(|c| seeds.get(c)) {
                    links.push((file, index, site.clone()));
                }
            }
        }

        for (file, index, site) in links {
            let Some(token) = Self::column_token(set, tokens, &site, report) else {
                continue;
            };
            if let Some(Modification::FieldTree(tree)) = set.list_mut(Variant::FieldTree).get_mut(file)
                && let Some(FieldTreeModifier::FieldEdit(edit)) = tree.modifiers.get_mut(index)
            {
                log::debug!("{} in {} -> 2DAMEMORY{token}", edit.path, tree.header.filename);
                edit.value = ValueExpr::RowToken(token);
                report.field_links += 1;
            }
        }
    }

    /// Lowest token storing the seed, or a new one recorded as a store
    fn column_token(
        set: &mut ModificationSet,
        tokens: &mut TokenAllocator,
        site: &SeedSite,
        report: &mut RewriteReport,
    ) -> Option<u32> {
        let Some(Modification::RowTable(table)) = set.list_mut(Variant::RowTable).get_mut(site.file) else {
            return None;
        };
        let Some(RowTableModifier::AddColumn(column)) = table.modifiers.get_mut(site.modifier) else {
            return None;
        };
        if let Some(token) = column.token_for_key(&site.key) {
            return Some(token);
        }
        let token = tokens.allocate(TokenKind::Row)?.id;
        column.stores.insert(token, site.key.clone());
        report.stores_added += 1;
        Some(token)
    }

    fn rewrite_cells(set: &mut ModificationSet, report: &mut RewriteReport) {
        let mut available: HashMap<String, u32> = HashMap::new();
        for modification in set.list_mut(Variant::RowTable) {
            let Modification::RowTable(table) = modification else {
                continue;
            };
            for modifier in &mut table.modifiers {
                report.cell_rewrites += modifier.rewrite_values(|value| {
                    let literal = value.as_constant().filter(|c| !is_blank(c))?;
                    available.get(literal).map(|token| ValueExpr::RowToken(*token))
                });
                for (token, literal) in modifier.evaluable_stores() {
                    if is_blank(&literal) {
                        continue;
                    }
                    available
                        .entry(literal)
                        .and_modify(|existing| *existing = (*existing).min(token))
                        .or_insert(token);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::{AddColumn, AddRow, ChangeRow, FieldEdit};
    use pretty_assertions::assert_eq;

    fn rows(modification: &Modification) -> &[RowTableModifier] {
        match modification {
            Modification::RowTable(m) => &m.modifiers,
            _ => &[],
        }
    }

    fn fields(modification: &Modification) -> &[FieldTreeModifier] {
        match modification {
            Modification::FieldTree(m) => &m.modifiers,
            _ => &[],
        }
    }

    fn push_rows(set: &mut ModificationSet, file: &str, modifiers: Vec<RowTableModifier>) {
        let mut modification = Modification::row_table(file);
        if let Modification::RowTable(m) = &mut modification {
            m.modifiers = modifiers;
        }
        set.push(modification);
    }

    fn push_fields(set: &mut ModificationSet, file: &str, modifiers: Vec<FieldTreeModifier>) {
        let mut modification = Modification::field_tree(file);
        if let Modification::FieldTree(m) = &mut modification {
            m.modifiers = modifiers;
        }
        set.push(modification);
    }

    fn seeded_column(store: Option<u32>) -> RowTableModifier {
        let mut column = AddColumn {
            header: "newcol".into(),
            default: "****".into(),
            ..AddColumn::default()
        };
        column.index_insert.insert(2, ValueExpr::constant("7"));
        if let Some(token) = store {
            column.stores.insert(token, AddColumn::index_key(2));
        }
        RowTableModifier::AddColumn(column)
    }

    #[test]
    fn test_field_links_existing_column_store() {
        let mut set = ModificationSet::new();
        let mut tokens = TokenAllocator::new();
        tokens.reserve(TokenKind::Row, [3]);
        push_rows(&mut set, "appearance.2da", vec![seeded_column(Some(3))]);
        push_fields(
            &mut set,
            "p_hk47.utc",
            vec![
                FieldTreeModifier::FieldEdit(FieldEdit::new("Appearance_Type", "7".into())),
                FieldTreeModifier::FieldEdit(FieldEdit::new("FirstName(strref)", "7".into())),
            ],
        );

        let report = CellTokenRewriter::rewrite(&mut set, &mut tokens);
        assert_eq!(report.field_links, 1);
        assert_eq!(report.stores_added, 0);
        let edits = fields(&set.list(Variant::FieldTree)[0]);
        assert_eq!(
            edits[0],
            FieldTreeModifier::FieldEdit(FieldEdit::new("Appearance_Type", ValueExpr::RowToken(3)))
        );
        assert_eq!(
            edits[1],
            FieldTreeModifier::FieldEdit(FieldEdit::new("FirstName(strref)", "7".into()))
        );
        assert_eq!(tokens.namespace(TokenKind::Row).next_id(), Some(4));
    }

    #[test]
    fn test_field_link_allocates_store() {
        let mut set = ModificationSet::new();
        let mut tokens = TokenAllocator::new();
        push_rows(&mut set, "appearance.2da", vec![seeded_column(None)]);
        push_fields(
            &mut set,
            "p_hk47.utc",
            vec![FieldTreeModifier::FieldEdit(FieldEdit::new("Appearance_Type", "7".into()))],
        );

        let report = CellTokenRewriter::rewrite(&mut set, &mut tokens);
        assert_eq!(report.stores_added, 1);
        let RowTableModifier::AddColumn(column) = &rows(&set.list(Variant::RowTable)[0])[0] else {
            panic!("wrong modifier");
        };
        assert_eq!(column.stores.get(&0).map(String::as_str), Some("I2"));

        let again = CellTokenRewriter::rewrite(&mut set, &mut tokens);
        assert_eq!(again, RewriteReport::default());
    }

    #[test]
    fn test_cells_only_reference_earlier_stores() {
        let mut earlier = ChangeRow::at_index(0);
        earlier.cells.insert("name".into(), "42".into());
        earlier.cells.insert("label".into(), "dup".into());
        earlier.stores.insert(1, ValueExpr::IntraRecordRef("label".into()));

        let mut same = AddRow::default();
        same.cells.insert("label".into(), "mine".into());
        same.stores.insert(5, ValueExpr::IntraRecordRef("label".into()));
        same.cells.insert("other".into(), "mine".into());

        let mut later = ChangeRow::at_index(3);
        later.cells.insert("label".into(), "dup".into());
        later.cells.insert("copy".into(), "mine".into());
        later.cells.insert("blank".into(), "****".into());

        let mut set = ModificationSet::new();
        push_rows(
            &mut set,
            "x.2da",
            vec![
                RowTableModifier::ChangeRow(earlier),
                RowTableModifier::AddRow(same),
            ],
        );
        push_rows(&mut set, "y.2da", vec![RowTableModifier::ChangeRow(later)]);

        let report = CellTokenRewriter::rewrite(&mut set, &mut TokenAllocator::new());
        assert_eq!(report.cell_rewrites, 2);

        let RowTableModifier::AddRow(same) = &rows(&set.list(Variant::RowTable)[0])[1] else {
            panic!("wrong modifier");
        };
        assert_eq!(same.cells["other"], ValueExpr::constant("mine"));

        let RowTableModifier::ChangeRow(later) = &rows(&set.list(Variant::RowTable)[1])[0] else {
            panic!("wrong modifier");
        };
        assert_eq!(later.cells["label"], ValueExpr::RowToken(1));
        assert_eq!(later.cells["copy"], ValueExpr::RowToken(5));
        assert_eq!(later.cells["blank"], ValueExpr::constant("****"));
    }

    #[test]
    fn test_lowest_token_wins() {
        let mut a = ChangeRow::at_index(0);
        a.stores.insert(4, ValueExpr::constant("x"));
        let mut b = ChangeRow::at_index(1);
        b.stores.insert(2, ValueExpr::constant("x"));
        let mut c = ChangeRow::at_index(2);
        c.cells.insert("col".into(), "x".into());

        let mut set = ModificationSet::new();
        push_rows(
            &mut set,
            "x.2da",
            vec![
                RowTableModifier::ChangeRow(a),
                RowTableModifier::ChangeRow(b),
                RowTableModifier::ChangeRow(c),
            ],
        );
        CellTokenRewriter::rewrite(&mut set, &mut TokenAllocator::new());
        let RowTableModifier::ChangeRow(c) = &rows(&set.list(Variant::RowTable)[0])[2] else {
            panic!("wrong modifier");
        };
        assert_eq!(c.cells["col"], ValueExpr::RowToken(2));
    }
}
