//! Integration tests for the GFF codec.

use kotor_gff::{
    Error, FieldPath, Gff, GffStruct, GffValue, LocalizedString, ROOT_STRUCT_ID, read_gff,
    write_gff,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use test_case::test_case;

fn creature() -> Gff {
    let mut name = LocalizedString::from_strref(31);
    name.substrings.insert(0, "Carth".to_string());

    let item = |resref: &str, charges: u8| {
        GffStruct::new(0)
            .with("InventoryRes", GffValue::ResRef(resref.into()))
            .with("Charges", GffValue::Byte(charges))
    };

    let mut gff = Gff::new(*b"UTC ");
    gff.root = GffStruct::new(ROOT_STRUCT_ID)
        .with("Appearance_Type", GffValue::Word(7))
        .with("FirstName", GffValue::ExoLocString(name))
        .with("Tag", GffValue::ExoString("carth".into()))
        .with("ChallengeRating", GffValue::Float(2.5))
        .with("Gold", GffValue::DWord64(1 << 40))
        .with("Offset", GffValue::Int64(-9))
        .with("Scale", GffValue::Double(0.125))
        .with("Blob", GffValue::Binary(vec![1, 2, 3]))
        .with("Bearing", GffValue::Orientation([0.0, 0.0, 0.5, 1.0]))
        .with("Position", GffValue::Position([1.0, -2.0, 3.5]))
        .with("Mood", GffValue::Char(-4))
        .with("Tilt", GffValue::Short(-300))
        .with(
            "ItemList",
            GffValue::List(vec![
                item("g_w_blstrpstl001", 0),
                item("g_i_medeqpmnt01", 3),
            ]),
        )
        .with(
            "Stats",
            GffValue::Struct(
                GffStruct::new(5)
                    .with("Str", GffValue::Byte(14))
                    .with("Feats", GffValue::List(vec![GffStruct::new(1)])),
            ),
        )
        .with("Empty", GffValue::List(Vec::new()));
    gff
}

#[test]
fn test_document_survives_encoding() {
    let gff = creature();
    let decoded = read_gff(&write_gff(&gff).unwrap()).unwrap();
    assert_eq!(decoded, gff);
    assert_eq!(decoded.content_type(), "UTC");
}

#[test_case("Appearance_Type", Some("7"))]
#[test_case("FirstName", Some("31"))]
#[test_case("ItemList\\1\\Charges", Some("3"))]
#[test_case("ItemList\\1\\InventoryRes", Some("g_i_medeqpmnt01"))]
#[test_case("Stats\\Str", Some("14"))]
#[test_case("Stats\\Missing", None)]
fn test_literals_after_decode(path: &str, expected: Option<&str>) {
    let decoded = read_gff(&write_gff(&creature()).unwrap()).unwrap();
    let literal = decoded
        .root
        .resolve(&FieldPath::parse(path))
        .and_then(GffValue::literal);
    assert_eq!(literal.as_deref(), expected);
}

#[test]
fn test_unset_strref_round_trips_as_none() {
    let mut gff = Gff::new(*b"UTI ");
    gff.root.set(
        "Description",
        GffValue::ExoLocString(LocalizedString {
            string_ref: None,
            substrings: BTreeMap::from([(0, "A blaster".to_string())]),
        }),
    );
    let decoded = read_gff(&write_gff(&gff).unwrap()).unwrap();
    assert_eq!(decoded, gff);
}

#[test]
fn test_rejects_wrong_version_and_truncation() {
    let bytes = write_gff(&creature()).unwrap();

    let mut wrong = bytes.clone();
    wrong[4..8].copy_from_slice(b"V1.0");
    assert!(matches!(read_gff(&wrong), Err(Error::InvalidHeader(_))));

    assert!(read_gff(&bytes[..40]).is_err());
    assert!(read_gff(&bytes[..bytes.len() - 10]).is_err());
}
