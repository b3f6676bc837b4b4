//! CLI integration tests

use assert_cmd::Command;
use kotor_gff::{Gff, GffStruct, GffValue, LocalizedString, ROOT_STRUCT_ID};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn patchgen() -> Command {
    Command::cargo_bin("kotor-patchgen").unwrap()
}

fn creature(strref: u32) -> Vec<u8> {
    let mut gff = Gff::new(*b"UTC ");
    gff.root = GffStruct::new(ROOT_STRUCT_ID)
        .with("Tag", GffValue::ExoString("hk47".into()))
        .with("FirstName", GffValue::ExoLocString(LocalizedString::from_strref(strref)));
    kotor_gff::write_gff(&gff).unwrap()
}

const MANIFEST: &str = r"
settings:
  window_caption: HK-47 Restoration
scan:
  - origin: vanilla
    path: game
files:
  - origin: vanilla
    modification:
      kind: string_table
      header:
        filename: dialog.tlk
      modifiers:
        - text: 'Statement: I am HK-47.'
          source_strref: 100
  - modification:
      kind: texture
      header:
        filename: hk47.tga
  - origin: vanilla
    template: game/p_hk47.utc
    verify: game/p_hk47.utc
    modification:
      kind: field_tree
      header:
        filename: p_hk47.utc
      modifiers:
        - type: field_edit
          path: Tag
          value:
            constant: hk47_restored
install:
  - path: mod/hk47_portrait.tga
";

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("game")).unwrap();
    fs::create_dir_all(root.join("mod")).unwrap();
    fs::write(root.join("game/p_hk47.utc"), creature(100)).unwrap();
    fs::write(root.join("mod/hk47_portrait.tga"), b"TGA").unwrap();
    fs::write(root.join("patch.yaml"), MANIFEST).unwrap();
    dir
}

fn script(root: &Path) -> String {
    fs::read_to_string(root.join("tslpatchdata/changes.ini")).unwrap()
}

#[test]
fn test_compile_links_appended_string() {
    let dir = project();
    patchgen()
        .arg("compile")
        .arg(dir.path().join("patch.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("changes.ini"));

    let text = script(dir.path());
    assert!(text.contains("WindowCaption=HK-47 Restoration\n"));
    assert!(text.contains("[TLKList]\nStrRef0=0\n"));
    assert!(text.contains("[p_hk47.utc]\nTag=hk47_restored\nFirstName(strref)=StrRef0\n"));
    assert!(text.contains("[install_folder0]\nFile0=hk47_portrait.tga\n"));
    assert!(dir.path().join("tslpatchdata/append.tlk").exists());
    assert!(dir.path().join("tslpatchdata/p_hk47.utc").exists());
    assert!(dir.path().join("tslpatchdata/hk47_portrait.tga").exists());
}

#[test]
fn test_compile_json_summary() {
    let dir = project();
    let out = dir.path().join("build");
    patchgen()
        .arg("compile")
        .arg(dir.path().join("patch.yaml"))
        .arg("--output")
        .arg(&out)
        .arg("--batch-size")
        .arg("1")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"string_tokens\": 1"))
        .stdout(predicate::str::contains("\"unresolved\": 0"))
        .stdout(predicate::str::contains("\"flushes\": 3"));
    assert!(out.join("changes.ini").exists());
}

#[test]
fn test_verbose_flag_enables_info_logging() {
    let dir = project();
    patchgen()
        .env_remove("RUST_LOG")
        .arg("compile")
        .arg(dir.path().join("patch.yaml"))
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed").not());

    patchgen()
        .env_remove("RUST_LOG")
        .arg("-v")
        .arg("compile")
        .arg(dir.path().join("patch.yaml"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed 1 reference site(s)"));
}

#[test]
fn test_compile_missing_manifest() {
    let dir = TempDir::new().unwrap();
    patchgen()
        .arg("compile")
        .arg(dir.path().join("missing.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read manifest"));
}

#[test]
fn test_scan_json() {
    let dir = project();
    patchgen()
        .args(["scan", "--json", "--origin", "vanilla"])
        .arg(dir.path().join("game"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resources\": 1"))
        .stdout(predicate::str::contains("\"sites\": 1"));
}

#[test]
fn test_info_gff() {
    let dir = project();
    patchgen()
        .arg("info")
        .arg(dir.path().join("game/p_hk47.utc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("UTC"))
        .stdout(predicate::str::contains("Localized strings"));
}

#[test]
fn test_info_rejects_script() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("k_ai_master.nss");
    fs::write(&path, "void main() {}").unwrap();
    patchgen().arg("info").arg(&path).assert().failure();
}
