//! Integration tests for the TLK codec.

use kotor_tlk::{TalkTable, TlkEntry};
use pretty_assertions::assert_eq;

#[test]
fn test_entries_survive_encoding() {
    let mut table = TalkTable::new(0);
    table.push(TlkEntry::new("Hello"));
    table.push(TlkEntry::default());
    table.push(TlkEntry::new("Voiced line").with_sound("n_carth_12"));

    let decoded = TalkTable::read(&table.write().unwrap()).unwrap();
    assert_eq!(decoded, table);
    assert_eq!(decoded.text(0), Some("Hello"));
    assert_eq!(decoded.text(1), Some(""));
    assert_eq!(decoded.get(2).map(|e| e.sound.as_str()), Some("n_carth_12"));
    assert_eq!(decoded.get(3), None);
}

#[test]
fn test_empty_table() {
    let decoded = TalkTable::read(&TalkTable::new(1).write().unwrap()).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(decoded.language(), 1);
}
