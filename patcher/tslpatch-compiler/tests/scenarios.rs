//! End-to-end compilation scenarios

use kotor_2da::TwoDA;
use kotor_gff::{Gff, GffStruct, GffValue, LocalizedString, ROOT_STRUCT_ID};
use pretty_assertions::assert_eq;
use tslpatch_compiler::{
    AddColumn, ChangeRow, FieldEdit, FieldTreeModifier, IncrementalWriter, MemoryFileSystem,
    Modification, OriginId, PendingReference, ReferenceLocation, RowTableModifier, StringAppend,
    TokenAllocator, TokenKind, TokenRef, ValueExpr, Variant, WriteRequest, WriteStatus,
    WriterConfig,
};

const SCRIPT: &str = "tslpatchdata/changes.ini";

fn writer() -> IncrementalWriter<MemoryFileSystem> {
    IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new())
}

fn script(writer: &IncrementalWriter<MemoryFileSystem>) -> String {
    writer.fs().text(SCRIPT).unwrap()
}

fn appends(texts: &[&str]) -> Modification {
    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers = texts.iter().map(|t| StringAppend::new(*t)).collect();
    }
    tlk
}

fn rows(file: &str, modifiers: Vec<RowTableModifier>) -> Modification {
    let mut modification = Modification::row_table(file);
    if let Modification::RowTable(m) = &mut modification {
        m.modifiers = modifiers;
    }
    modification
}

fn fields(file: &str, modifiers: Vec<FieldTreeModifier>) -> Modification {
    let mut modification = Modification::field_tree(file);
    if let Modification::FieldTree(m) = &mut modification {
        m.modifiers = modifiers;
    }
    modification
}

fn strref_table(row4: &str) -> Vec<u8> {
    let mut table = TwoDA::new(["label", "StrRef"]);
    for row in 0..6 {
        let value = if row == 4 { row4 } else { "****" };
        table.add_row(row.to_string(), [format!("entry{row}"), value.to_string()]);
    }
    kotor_2da::write_2da(&table).unwrap()
}

fn creature(name_strref: u32) -> Vec<u8> {
    let mut gff = Gff::new(*b"UTC ");
    gff.root = GffStruct::new(ROOT_STRUCT_ID)
        .with("FirstName", GffValue::ExoLocString(LocalizedString::from_strref(name_strref)))
        .with("Appearance_Type", GffValue::Word(7));
    kotor_gff::write_gff(&gff).unwrap()
}

#[test]
fn test_field_edit_reuses_add_column_store() {
    let mut w = writer();

    let outcome = w.write(WriteRequest::new(appends(&["Hello"]))).unwrap();
    assert_eq!(outcome.status, WriteStatus::Buffered);

    let mut column = AddColumn {
        header: "kotor_mod".into(),
        default: "****".into(),
        ..AddColumn::default()
    };
    column.index_insert.insert(2, ValueExpr::constant("7"));
    column.stores.insert(3, AddColumn::index_key(2));
    w.write(WriteRequest::new(rows(
        "appearance.2da",
        vec![RowTableModifier::AddColumn(column)],
    )))
    .unwrap();

    let mut change = ChangeRow::at_index(10);
    change.cells.insert("appearance".into(), ValueExpr::constant("7"));
    w.write(WriteRequest::new(rows(
        "heads.2da",
        vec![RowTableModifier::ChangeRow(change)],
    )))
    .unwrap();

    w.write(WriteRequest::new(fields(
        "p_hk47.utc",
        vec![FieldTreeModifier::FieldEdit(FieldEdit::new(
            "Appearance_Type",
            ValueExpr::constant("7"),
        ))],
    )))
    .unwrap();

    let summary = w.finalize().unwrap();
    assert_eq!(summary.string_tokens, 1);
    assert_eq!(summary.row_tokens, 0);
    assert_eq!(summary.rewrites.field_links, 1);
    assert_eq!(summary.rewrites.cell_rewrites, 1);

    let text = script(&w);
    assert!(text.contains("[TLKList]\nStrRef0=0\n"));
    assert!(text.contains("[p_hk47.utc]\nAppearance_Type=2DAMEMORY3\n"));
    assert!(text.contains("[heads_2da_changerow_0]\nRowIndex=10\nappearance=2DAMEMORY3\n"));
    assert!(text.contains("I2=7\n2DAMEMORY3=I2\n"));
    assert!(!text.contains("2DAMEMORY4"));
}

#[test]
fn test_same_file_twice_emits_one_section() {
    let mut w = writer();
    let edit = || {
        fields(
            "p_hk47.utc",
            vec![FieldTreeModifier::FieldEdit(FieldEdit::new("Tag", "hk47".into()))],
        )
    };
    assert_eq!(w.write(WriteRequest::new(edit())).unwrap().status, WriteStatus::Buffered);
    let again = w.write(WriteRequest::new(edit())).unwrap();
    assert_eq!(again.status, WriteStatus::Unchanged);
    assert_eq!(again.handle, w.modifications().find(Variant::FieldTree, "P_HK47.UTC"));

    w.finalize().unwrap();
    assert_eq!(w.written().len(Variant::FieldTree), 1);
    assert_eq!(w.modifications().count(Variant::FieldTree), 1);
    let text = script(&w);
    assert_eq!(text.matches("[p_hk47.utc]").count(), 1);
    assert_eq!(text.matches("Tag=hk47").count(), 1);
}

#[test]
fn test_stale_pending_reference_is_not_materialized() {
    let mut w = writer();
    let report = w.add_pending(PendingReference {
        target: "x.2da".into(),
        origin: OriginId::default(),
        source: "dialog.tlk".into(),
        literal: "55".into(),
        token: TokenRef::string_table(2),
        location: ReferenceLocation::Cell {
            row: 4,
            column: "StrRef".into(),
            row_label: "4".into(),
        },
    });
    assert!(report.is_empty());
    assert_eq!(w.linker().len(), 1);

    let outcome = w
        .write(WriteRequest::new(rows("x.2da", Vec::new())).verify(strref_table("999")))
        .unwrap();
    assert_eq!(outcome.links.stale, 1);
    assert_eq!(outcome.links.resolved, 0);

    let summary = w.finalize().unwrap();
    assert_eq!(summary.unresolved, 0);
    assert!(w.modifications().list(Variant::RowTable)[0].is_empty());
    assert!(!script(&w).contains("StrRef2"));
}

#[test]
fn test_pending_reference_resolves_when_literal_matches() {
    let mut w = writer();
    w.add_pending(PendingReference {
        target: "x.2da".into(),
        origin: OriginId::default(),
        source: "dialog.tlk".into(),
        literal: "55".into(),
        token: TokenRef::string_table(2),
        location: ReferenceLocation::Cell {
            row: 4,
            column: "StrRef".into(),
            row_label: "4".into(),
        },
    });
    let outcome = w
        .write(WriteRequest::new(rows("x.2da", Vec::new())).verify(strref_table("55")))
        .unwrap();
    assert_eq!(outcome.links.resolved, 1);

    w.finalize().unwrap();
    assert!(script(&w).contains("[x_2da_changerow_0]\nRowIndex=4\nStrRef=StrRef2\n"));
}

#[test]
fn test_token_allocation_and_reservation() {
    let mut tokens = TokenAllocator::new();
    let ids: Vec<u32> = (0..5)
        .map(|_| tokens.allocate(TokenKind::StringTable).unwrap().id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    tokens.reserve(TokenKind::StringTable, [2, 7]);
    assert_eq!(tokens.allocate(TokenKind::StringTable).unwrap().id, 8);
    assert_eq!(tokens.allocate(TokenKind::Row).unwrap().id, 0);
}

#[test]
fn test_finalize_twice_is_byte_identical() {
    let mut w = writer();
    w.write(WriteRequest::new(appends(&["one", "two"]))).unwrap();
    let mut column = AddColumn {
        header: "extra".into(),
        ..AddColumn::default()
    };
    column.label_insert.insert("hk47".into(), ValueExpr::constant("12"));
    w.write(WriteRequest::new(rows("appearance.2da", vec![RowTableModifier::AddColumn(column)])))
        .unwrap();
    w.write(WriteRequest::new(fields(
        "p_hk47.utc",
        vec![FieldTreeModifier::FieldEdit(FieldEdit::new("PortraitId", "12".into()))],
    )))
    .unwrap();

    w.finalize().unwrap();
    let first = script(&w);
    let second_summary = w.finalize().unwrap();
    let second = script(&w);
    assert_eq!(first, second);
    assert_eq!(second_summary.rewrites.stores_added, 1);
    assert_eq!(second_summary.row_tokens, 1);
    assert!(second.contains("PortraitId=2DAMEMORY0"));
    assert!(second.contains("Lhk47=12\n2DAMEMORY0=Lhk47\n"));
}

#[test]
fn test_origin_isolation() {
    let mut w = writer();
    let location = ReferenceLocation::Field {
        path: "FirstName(strref)".into(),
    };
    for (origin, token) in [("k1", 0), ("k2", 1)] {
        w.add_pending(PendingReference {
            target: "p_hk47.utc".into(),
            origin: OriginId::from(origin),
            source: "dialog.tlk".into(),
            literal: "100".into(),
            token: TokenRef::string_table(token),
            location: location.clone(),
        });
    }

    let outcome = w
        .write(
            WriteRequest::new(fields("p_hk47.utc", Vec::new()))
                .verify(creature(100))
                .origin("k2"),
        )
        .unwrap();
    assert_eq!(outcome.links.resolved, 1);
    assert_eq!(outcome.links.origin_mismatch, 1);

    let summary = w.finalize().unwrap();
    assert_eq!(summary.unresolved, 1);
    let text = script(&w);
    assert!(text.contains("FirstName(strref)=StrRef1"));
    assert!(!text.contains("StrRef0"));
}

#[test]
fn test_appended_string_relinks_scanned_sites() {
    let mut w = writer();
    let origin = OriginId::from("mod");
    w.scanner_mut().scan(&origin, "p_hk47.utc", &creature(100));

    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend {
            source_strref: Some(100),
            ..StringAppend::new("HK-47")
        });
    }
    let outcome = w.write(WriteRequest::new(tlk).origin("mod")).unwrap();
    assert_eq!(outcome.generated, 1);
    assert_eq!(w.linker().len(), 1);

    let outcome = w
        .write(
            WriteRequest::new(fields("p_hk47.utc", Vec::new()))
                .verify(creature(100))
                .origin("mod"),
        )
        .unwrap();
    assert_eq!(outcome.links.resolved, 1);

    w.finalize().unwrap();
    assert!(script(&w).contains("[p_hk47.utc]\nFirstName(strref)=StrRef0\n"));
    assert!(w.fs().get("tslpatchdata/append.tlk").is_some());
}

#[test]
fn test_late_reference_patches_buffered_file_in_place() {
    let mut w = writer();
    let origin = OriginId::from("mod");
    w.scanner_mut().scan(&origin, "p_hk47.utc", &creature(100));

    w.write(
        WriteRequest::new(fields(
            "p_hk47.utc",
            vec![FieldTreeModifier::FieldEdit(FieldEdit::new("Tag", "hk47".into()))],
        ))
        .verify(creature(100))
        .origin("mod"),
    )
    .unwrap();
    w.flush().unwrap();
    assert!(!script(&w).contains("StrRef0"));

    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend {
            source_strref: Some(100),
            ..StringAppend::new("HK-47")
        });
    }
    w.write(WriteRequest::new(tlk).origin("mod")).unwrap();

    let summary = w.finalize().unwrap();
    assert_eq!(summary.links.resolved, 1);
    assert_eq!(summary.unresolved, 0);
    assert!(w.written().contains(Variant::FieldTree, "p_hk47.utc"));

    let text = script(&w);
    assert_eq!(text.matches("[p_hk47.utc]").count(), 1);
    assert!(text.contains("[p_hk47.utc]\nTag=hk47\nFirstName(strref)=StrRef0\n"));
}

#[test]
fn test_inserted_row_relinks_row_references() {
    let mut w = writer();
    let origin = OriginId::from("mod");
    w.scanner_mut().scan(&origin, "p_hk47.utc", &creature(100));

    let add = tslpatch_compiler::AddRow {
        row_label: Some("hk47_new".into()),
        source_row: Some(7),
        ..Default::default()
    };
    let outcome = w
        .write(WriteRequest::new(rows("appearance.2da", vec![RowTableModifier::AddRow(add)])).origin("mod"))
        .unwrap();
    assert_eq!(outcome.generated, 1);

    w.write(
        WriteRequest::new(fields("p_hk47.utc", Vec::new()))
            .verify(creature(100))
            .origin("mod"),
    )
    .unwrap();

    w.finalize().unwrap();
    let text = script(&w);
    assert!(text.contains("[appearance_2da_addrow_0]\nRowLabel=hk47_new\n2DAMEMORY0=RowIndex\n"));
    assert!(text.contains("Appearance_Type=2DAMEMORY0"));
}

#[test]
fn test_batch_size_does_not_change_output() {
    let run = |batch: usize| {
        let mut w = IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new().batch_size(batch));
        w.write(WriteRequest::new(appends(&["a", "b", "c"]))).unwrap();
        let mut change = ChangeRow::at_index(1);
        change.stores.insert(0, ValueExpr::constant("5"));
        let mut later = ChangeRow::at_index(2);
        later.cells.insert("x".into(), "5".into());
        w.write(WriteRequest::new(rows(
            "x.2da",
            vec![RowTableModifier::ChangeRow(change), RowTableModifier::ChangeRow(later)],
        )))
        .unwrap();
        let summary = w.finalize().unwrap();
        (script(&w), summary.flushes)
    };
    let (eager, eager_flushes) = run(1);
    let (lazy, lazy_flushes) = run(100);
    assert_eq!(eager, lazy);
    assert_eq!(eager_flushes, 3);
    assert_eq!(lazy_flushes, 1);
}

#[test]
fn test_seed_link_token_does_not_depend_on_batch_size() {
    let run = |batch: usize| {
        let mut w = IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new().batch_size(batch));
        let mut column = AddColumn {
            header: "droid".into(),
            default: "****".into(),
            ..AddColumn::default()
        };
        column.index_insert.insert(2, ValueExpr::constant("7"));
        w.write(WriteRequest::new(rows("appearance.2da", vec![RowTableModifier::AddColumn(column)])))
            .unwrap();
        w.write(WriteRequest::new(fields(
            "p_hk47.utc",
            vec![FieldTreeModifier::FieldEdit(FieldEdit::new("Appearance_Type", "7".into()))],
        )))
        .unwrap();
        let mut change = ChangeRow::at_index(0);
        change.stores.insert(0, ValueExpr::constant("x"));
        w.write(WriteRequest::new(rows("baseitems.2da", vec![RowTableModifier::ChangeRow(change)])))
            .unwrap();
        let summary = w.finalize().unwrap();
        (script(&w), summary)
    };
    let (eager, eager_summary) = run(1);
    let (lazy, lazy_summary) = run(100);
    assert_eq!(eager, lazy);
    assert_eq!(eager_summary.rewrites, lazy_summary.rewrites);
    assert_eq!(eager_summary.row_tokens, 1);

    assert!(eager.contains("I2=7\n2DAMEMORY1=I2\n"));
    assert!(eager.contains("Appearance_Type=2DAMEMORY1\n"));
    assert!(eager.contains("RowIndex=0\n2DAMEMORY0=x\n"));
}

#[test]
fn test_resubmitted_add_row_keeps_one_row_token() {
    let mut w = writer();
    let origin = OriginId::from("mod");
    w.scanner_mut().scan(&origin, "p_hk47.utc", &creature(100));

    let add = || {
        rows(
            "appearance.2da",
            vec![RowTableModifier::AddRow(tslpatch_compiler::AddRow {
                row_label: Some("hk47_new".into()),
                source_row: Some(7),
                ..Default::default()
            })],
        )
    };
    let first = w.write(WriteRequest::new(add()).origin("mod")).unwrap();
    assert_eq!(first.generated, 1);
    let again = w.write(WriteRequest::new(add()).origin("mod")).unwrap();
    assert_eq!(again.status, WriteStatus::Unchanged);
    assert_eq!(again.added, 0);
    assert_eq!(again.generated, 0);

    let summary = w.finalize().unwrap();
    assert_eq!(summary.row_tokens, 1);
    let text = script(&w);
    assert_eq!(text.matches("RowLabel=hk47_new").count(), 1);
    assert_eq!(text.matches("=RowIndex\n").count(), 1);
    assert!(!text.contains("[appearance_2da_addrow_1]"));
}

#[test]
fn test_resubmitted_table_does_not_depend_on_batch_size() {
    let table = || {
        let mut change = ChangeRow::at_index(1);
        change.stores.insert(0, ValueExpr::constant("5"));
        let mut later = ChangeRow::at_index(2);
        later.cells.insert("x".into(), "5".into());
        rows(
            "x.2da",
            vec![RowTableModifier::ChangeRow(change), RowTableModifier::ChangeRow(later)],
        )
    };
    let run = |batch: usize| {
        let mut w = IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new().batch_size(batch));
        w.write(WriteRequest::new(table())).unwrap();
        let again = w.write(WriteRequest::new(table())).unwrap();
        assert_eq!(again.status, WriteStatus::Unchanged);
        w.finalize().unwrap();
        script(&w)
    };
    let eager = run(1);
    let lazy = run(100);
    assert_eq!(eager, lazy);
    assert_eq!(eager.matches("[x_2da_changerow_").count(), 2);
    assert!(eager.contains("x=2DAMEMORY0\n"));
}
