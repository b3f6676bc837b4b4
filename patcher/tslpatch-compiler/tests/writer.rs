//! Writer behavior around templates, installs, skips and the real filesystem

use kotor_ssf::{SoundSet, SoundSlot};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tslpatch_compiler::{
    DiskFileSystem, FieldEdit, FieldTreeModifier, IncrementalWriter, MemoryFileSystem,
    Modification, OriginId, ReferenceScanner, SoundEdit, StringAppend, TemplateSource,
    TokenAllocator, TokenKind, ValueExpr, Variant, WriteRequest, WriteStatus, WriterConfig,
};

fn writer() -> IncrementalWriter<MemoryFileSystem> {
    IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new())
}

fn tag_edit(file: &str) -> Modification {
    let mut modification = Modification::field_tree(file);
    if let Modification::FieldTree(m) = &mut modification {
        m.modifiers
            .push(FieldTreeModifier::FieldEdit(FieldEdit::new("Tag", "new_tag".into())));
    }
    modification
}

#[test]
fn test_variant_mismatch_is_skipped() {
    let mut w = writer();
    let outcome = w.write(WriteRequest::new(Modification::row_table("p_hk47.utc"))).unwrap();
    assert_eq!(outcome.status, WriteStatus::Skipped);
    assert_eq!(outcome.handle, None);

    let outcome = w.write(WriteRequest::new(tag_edit("notes.txt"))).unwrap();
    assert_eq!(outcome.status, WriteStatus::Skipped);

    let summary = w.finalize().unwrap();
    assert_eq!(summary.files.values().sum::<usize>(), 0);
}

#[test]
fn test_template_written_once() {
    let mut w = writer();
    w.write(WriteRequest::new(tag_edit("p_hk47.utc")).template(TemplateSource::Bytes(b"first".to_vec())))
        .unwrap();
    let outcome = w
        .write(WriteRequest::new(tag_edit("p_hk47.utc")).template(TemplateSource::Bytes(b"second".to_vec())))
        .unwrap();
    assert_eq!(outcome.status, WriteStatus::Unchanged);
    assert_eq!(w.fs().get("tslpatchdata/p_hk47.utc"), Some(&b"first"[..]));
}

#[test]
fn test_missing_template_keeps_modification() {
    let mut w = writer();
    let outcome = w
        .write(WriteRequest::new(tag_edit("p_hk47.utc")).template(TemplateSource::Path("missing/p_hk47.utc".into())))
        .unwrap();
    assert_eq!(outcome.status, WriteStatus::Buffered);
    assert!(w.fs().get("tslpatchdata/p_hk47.utc").is_none());

    w.finalize().unwrap();
    let script = w.fs().text("tslpatchdata/changes.ini").unwrap();
    assert!(script.contains("[p_hk47.utc]\nTag=new_tag\n"));
}

#[test]
fn test_template_read_through_filesystem() {
    let mut fs = MemoryFileSystem::new();
    fs.insert("override/p_hk47.utc", b"GFF bytes".to_vec());
    let mut w = IncrementalWriter::new(fs, WriterConfig::new());
    w.write(WriteRequest::new(tag_edit("p_hk47.utc")).template(TemplateSource::Path("override/p_hk47.utc".into())))
        .unwrap();
    assert_eq!(w.fs().get("tslpatchdata/p_hk47.utc"), Some(&b"GFF bytes"[..]));
}

#[test]
fn test_string_table_has_no_template() {
    let mut w = writer();
    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend::new("text"));
    }
    w.write(WriteRequest::new(tlk).template(TemplateSource::Bytes(vec![1, 2, 3])))
        .unwrap();
    assert!(w.fs().get("tslpatchdata/dialog.tlk").is_none());
}

#[test]
fn test_install_and_destination() {
    let mut w = writer();
    let mut modification = tag_edit("m01aa_door.utd");
    modification.header_mut().destination = "modules/danm13.rim/".into();
    modification.header_mut().install = true;
    w.write(WriteRequest::new(modification)).unwrap();

    assert!(w.add_install_file("Override", "custom.tga", b"tga").unwrap());
    assert!(!w.add_install_file(".", "custom.tga", b"tga").unwrap());

    let summary = w.finalize().unwrap();
    assert_eq!(summary.install_files, 2);

    let script = w.fs().text("tslpatchdata/changes.ini").unwrap();
    assert!(script.contains("[InstallList]\ninstall_folder0=modules\\danm13.rim\ninstall_folder1=Override\n"));
    assert!(script.contains("[install_folder0]\nFile0=m01aa_door.utd\n"));
    assert!(script.contains("[install_folder1]\nFile0=custom.tga\n"));
    assert!(script.contains("[m01aa_door.utd]\n!Destination=modules\\danm13.rim\nTag=new_tag\n"));
    assert_eq!(w.fs().get("tslpatchdata/custom.tga"), Some(&b"tga"[..]));
}

#[test]
fn test_sound_set_reference_resolved() {
    let origin = OriginId::from("vanilla");
    let mut set = SoundSet::new();
    set.set(SoundSlot::BattleCry1, Some(4242));
    let bytes = set.write().unwrap();

    let mut scanner = ReferenceScanner::new();
    assert_eq!(scanner.scan(&origin, "c_drdmk4.ssf", &bytes), 1);

    let mut w = IncrementalWriter::with_scanner(MemoryFileSystem::new(), WriterConfig::new(), scanner);
    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend::new("Statement: die."));
        m.modifiers.push(StringAppend {
            source_strref: Some(4242),
            ..StringAppend::new("Query: why?")
        });
    }
    w.write(WriteRequest::new(tlk).origin(origin.clone())).unwrap();

    let mut ssf = Modification::sound_table("c_drdmk4.ssf");
    if let Modification::SoundTable(m) = &mut ssf {
        m.modifiers
            .push(SoundEdit::new(SoundSlot::Select1, ValueExpr::StringTableToken(0)));
    }
    let outcome = w
        .write(WriteRequest::new(ssf).verify(bytes).origin(origin))
        .unwrap();
    assert_eq!(outcome.links.resolved, 1);

    w.finalize().unwrap();
    let script = w.fs().text("tslpatchdata/changes.ini").unwrap();
    assert!(script.contains("[SSFList]\nFile0=c_drdmk4.ssf\n"));
    assert!(script.contains("Battlecry 1=StrRef1"));
}

#[test]
fn test_unverifiable_reference_is_dropped() {
    let origin = OriginId::from("vanilla");
    let mut set = SoundSet::new();
    set.set(SoundSlot::BattleCry1, Some(7));
    let mut scanner = ReferenceScanner::new();
    scanner.scan(&origin, "c_drdmk4.ssf", &set.write().unwrap());

    let mut w = IncrementalWriter::with_scanner(MemoryFileSystem::new(), WriterConfig::new(), scanner);
    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend {
            source_strref: Some(7),
            ..StringAppend::new("line")
        });
    }
    w.write(WriteRequest::new(tlk).origin(origin.clone())).unwrap();

    let outcome = w
        .write(WriteRequest::new(Modification::sound_table("c_drdmk4.ssf")).origin(origin))
        .unwrap();
    assert_eq!(outcome.links.unverifiable, 1);
    assert_eq!(w.linker().len(), 0);
}

#[test]
fn test_script_listed_without_section() {
    let mut w = writer();
    w.write(WriteRequest::new(Modification::script("k_ai_master.nss"))).unwrap();
    let mut moved = Modification::script("a_spawn.nss");
    moved.header_mut().destination = "modules\\danm14aa.mod".into();
    w.write(WriteRequest::new(moved).verify(b"void main() {}".to_vec()))
        .unwrap();

    let summary = w.finalize().unwrap();
    assert_eq!(summary.files[&Variant::Script], 2);
    let script = w.fs().text("tslpatchdata/changes.ini").unwrap();
    assert!(script.contains("[CompileList]\nFile0=k_ai_master.nss\nFile1=a_spawn.nss\n"));
    assert!(!script.contains("[k_ai_master.nss]"));
    assert!(script.contains("[a_spawn.nss]\n!Destination=modules\\danm14aa.mod\n"));
}

#[test]
fn test_disk_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tslpatchdata");
    let mut w = IncrementalWriter::new(DiskFileSystem, WriterConfig::new().output_dir(&out));

    let mut tlk = Modification::string_table("dialog.tlk");
    if let Modification::StringTable(m) = &mut tlk {
        m.modifiers.push(StringAppend::new("On disk"));
    }
    w.write(WriteRequest::new(tlk)).unwrap();
    w.write(WriteRequest::new(tag_edit("p_hk47.utc")).template(TemplateSource::Bytes(b"utc".to_vec())))
        .unwrap();
    let summary = w.finalize().unwrap();

    assert_eq!(summary.script, out.join("changes.ini"));
    let script = std::fs::read_to_string(out.join("changes.ini")).unwrap();
    assert!(script.starts_with("[Settings]\n"));
    assert!(script.contains("[GFFList]\nFile0=p_hk47.utc\n"));
    assert_eq!(std::fs::read(out.join("p_hk47.utc")).unwrap(), b"utc");

    let table = kotor_tlk::TalkTable::read(&std::fs::read(out.join("append.tlk")).unwrap()).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.text(0), Some("On disk"));
}

#[derive(Debug, Clone)]
enum TokenOp {
    Allocate,
    Reserve(Vec<u32>),
}

fn token_op() -> impl Strategy<Value = TokenOp> {
    prop_oneof![
        Just(TokenOp::Allocate),
        prop::collection::vec(0u32..200, 0..4).prop_map(TokenOp::Reserve),
    ]
}

proptest! {
    #[test]
    fn prop_tokens_never_collide(ops in prop::collection::vec(token_op(), 1..60)) {
        let mut tokens = TokenAllocator::new();
        let mut taken: Vec<u32> = Vec::new();
        let mut last: Option<u32> = None;
        for op in ops {
            match op {
                TokenOp::Allocate => {
                    let id = tokens.allocate(TokenKind::Row).unwrap().id;
                    prop_assert!(last.is_none_or(|l| id > l));
                    prop_assert!(!taken.contains(&id));
                    taken.push(id);
                    last = Some(id);
                }
                TokenOp::Reserve(ids) => {
                    tokens.reserve(TokenKind::Row, ids.iter().copied());
                    taken.extend(ids);
                }
            }
        }
        prop_assert_eq!(tokens.namespace(TokenKind::StringTable).issued(), 0);
    }
}
