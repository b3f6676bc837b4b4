//! Integration tests for the SSF codec.

use kotor_ssf::{SoundSet, SoundSlot};
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test_case(SoundSlot::BattleCry1, 12_000)]
#[test_case(SoundSlot::Poisoned, 7)]
#[test_case(SoundSlot::UnlockFailed, 0)]
fn test_assigned_slot_survives_encoding(slot: SoundSlot, strref: u32) {
    let mut set = SoundSet::new();
    set.set(slot, Some(strref));
    let decoded = SoundSet::read(&set.write().unwrap()).unwrap();
    assert_eq!(decoded.get(slot), Some(strref));
    assert_eq!(decoded.assigned().count(), 1);
}

#[test]
fn test_rejects_other_signatures() {
    assert!(SoundSet::read(b"GFF V3.2\x0c\0\0\0").is_err());
    assert!(SoundSet::read(b"SSF").is_err());
}
