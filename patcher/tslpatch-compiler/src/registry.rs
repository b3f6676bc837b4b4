//! Static knowledge of where game data holds strrefs and row references

/// Columns holding strrefs, for tables known to the registry
const STRREF_COLUMNS: &[(&str, &[&str])] = &[
    ("appearance.2da", &["string_ref"]),
    ("baseitems.2da", &["name"]),
    ("classes.2da", &["name", "description"]),
    ("doortypes.2da", &["stringrefgame"]),
    ("feat.2da", &["name", "description"]),
    ("genericdoors.2da", &["strref"]),
    ("iprp_abilities.2da", &["name"]),
    ("iprp_feats.2da", &["name"]),
    ("placeables.2da", &["strref"]),
    ("planetary.2da", &["name", "description"]),
    ("racialtypes.2da", &["name", "namelower", "description"]),
    ("skills.2da", &["name", "description"]),
    ("spells.2da", &["name", "spelldesc"]),
    ("traps.2da", &["trapname", "name"]),
];

/// Columns checked in tables the registry does not list
const GENERIC_STRREF_COLUMNS: &[&str] = &[
    "name",
    "description",
    "desc",
    "strref",
    "string_ref",
    "stringref",
];

/// GFF fields holding a row index, optionally restricted to one content type
const ROW_REFERENCES: &[(Option<&str>, &str, &str)] = &[
    (None, "Appearance_Type", "appearance.2da"),
    (None, "BaseItem", "baseitems.2da"),
    (None, "Race", "racialtypes.2da"),
    (None, "SoundSetFile", "soundset.2da"),
    (None, "PortraitId", "portraits.2da"),
    (None, "FactionID", "repute.2da"),
    (None, "Faction", "repute.2da"),
    (None, "Subrace", "subrace.2da"),
    (None, "Class", "classes.2da"),
    (None, "Feat", "feat.2da"),
    (None, "Spell", "spells.2da"),
    (None, "Gender", "gender.2da"),
    (None, "Camera", "camerastyle.2da"),
    (Some("UTP"), "Appearance", "placeables.2da"),
    (Some("UTD"), "GenericType", "genericdoors.2da"),
    (Some("UTT"), "Cursor", "cursors.2da"),
];

/// Strref columns of a table.
///
/// Tables in the registry use their own list; other tables fall back to
/// the generic column names that exist in `headers`.
pub fn strref_columns<'a>(table: &str, headers: &'a [String]) -> Vec<&'a str> {
    let wanted: &[&str] = STRREF_COLUMNS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(table))
        .map_or(GENERIC_STRREF_COLUMNS, |(_, columns)| columns);
    headers
        .iter()
        .filter(|h| wanted.iter().any(|w| w.eq_ignore_ascii_case(h)))
        .map(String::as_str)
        .collect()
}

/// 2DA a GFF field's value indexes into
pub fn row_reference_table(content_type: &str, label: &str) -> Option<&'static str> {
    ROW_REFERENCES
        .iter()
        .find(|(restrict, field, _)| {
            field.eq_ignore_ascii_case(label)
                && restrict.is_none_or(|t| t.eq_ignore_ascii_case(content_type.trim()))
        })
        .map(|(_, _, table)| *table)
}
