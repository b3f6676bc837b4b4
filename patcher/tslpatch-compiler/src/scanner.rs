//! Baseline reference index
//!
//! The scanner reads a corpus of resources once and records every place a
//! strref or a row index of a known table shows up. Writers consult the index
//! to find the files that must be relinked when an appended string or an
//! inserted row takes over the role of an existing one.

use crate::codec::{DecodedResource, ResourceKind};
use crate::modifiers::gff::STRREF_SUFFIX;
use crate::registry::{row_reference_table, strref_columns};
use crate::Result;
use kotor_gff::GffValue;
use kotor_ssf::SoundSlot;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Identity of the installation or folder a resource was read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginId(pub String);

impl OriginId {
    /// Create an origin id
    pub fn new(id: impl Into<String>) -> Self {
        OriginId(id.into())
    }

    /// Id text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<default>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for OriginId {
    fn from(id: &str) -> Self {
        OriginId(id.to_string())
    }
}

impl From<String> for OriginId {
    fn from(id: String) -> Self {
        OriginId(id)
    }
}

/// Literal the index is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralKey {
    /// A talk table string reference
    StrRef(u32),
    /// A row index into a 2DA; the table name is lowercase
    Row {
        /// Table filename
        table: String,
        /// Row index
        index: usize,
    },
}

impl LiteralKey {
    /// Row key with a normalized table name
    pub fn row(table: &str, index: usize) -> Self {
        LiteralKey::Row {
            table: table.to_ascii_lowercase(),
            index,
        }
    }

    /// The literal as it appears in resources
    pub fn literal(&self) -> String {
        match self {
            LiteralKey::StrRef(strref) => strref.to_string(),
            LiteralKey::Row { index, .. } => index.to_string(),
        }
    }
}

/// Exact place a literal was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLocation {
    /// 2DA cell
    Cell {
        /// Row index
        row: usize,
        /// Column header
        column: String,
        /// Row label at scan time
        row_label: String,
    },
    /// SSF slot
    SoundSlot(
        #[serde(
            serialize_with = "crate::modifiers::ssf::slot_name",
            deserialize_with = "crate::modifiers::ssf::parse_slot"
        )]
        SoundSlot,
    ),
    /// GFF field; localized-string strrefs carry the `(strref)` suffix
    Field {
        /// Backslash-separated field path
        path: String,
    },
}

impl fmt::Display for ReferenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceLocation::Cell { row, column, .. } => write!(f, "row {row} column {column}"),
            ReferenceLocation::SoundSlot(slot) => write!(f, "slot {}", slot.script_name()),
            ReferenceLocation::Field { path } => write!(f, "field {path}"),
        }
    }
}

/// One indexed occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSite {
    /// Where the resource came from
    pub origin: OriginId,
    /// Resource filename
    pub resource: String,
    /// Location inside the resource
    pub location: ReferenceLocation,
}

/// Index statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Resources indexed
    pub resources: usize,
    /// Resources that could not be read or decoded
    pub failures: usize,
    /// Distinct literal keys
    pub keys: usize,
    /// Total indexed sites
    pub sites: usize,
}

/// Literal → sites index over a baseline corpus
#[derive(Debug, Clone, Default)]
pub struct ReferenceScanner {
    index: HashMap<LiteralKey, Vec<ReferenceSite>>,
    scanned: HashSet<(OriginId, String)>,
    failures: usize,
}

impl ReferenceScanner {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and index one resource. Returns the number of sites added.
    ///
    /// Decode failures are logged and leave the index untouched; resources
    /// already scanned for the same origin are skipped.
    pub fn scan(&mut self, origin: &OriginId, resource: &str, bytes: &[u8]) -> usize {
        if self.is_scanned(origin, resource) {
            log::debug!("{resource} from {origin} already scanned");
            return 0;
        }
        match DecodedResource::decode(resource, bytes) {
            Ok(decoded) => self.scan_decoded(origin, resource, &decoded),
            Err(e) => {
                log::warn!("Skipping {resource} from {origin}: {e}");
                self.failures += 1;
                0
            }
        }
    }

    /// Index an already decoded resource
    pub fn scan_decoded(&mut self, origin: &OriginId, resource: &str, decoded: &DecodedResource) -> usize {
        if !self
            .scanned
            .insert((origin.clone(), resource.to_ascii_lowercase()))
        {
            return 0;
        }

        let mut found: Vec<(LiteralKey, ReferenceLocation)> = Vec::new();
        match decoded {
            DecodedResource::TwoDA(table) => {
                for column in strref_columns(resource, table.headers()) {
                    for row in 0..table.row_count() {
                        let Some(strref) = table.cell(row, column).and_then(|c| c.parse::<u32>().ok()) else {
                            continue;
                        };
                        found.push((
                            LiteralKey::StrRef(strref),
                            ReferenceLocation::Cell {
                                row,
                                column: column.to_string(),
                                row_label: table.row_label(row).unwrap_or_default().to_string(),
                            },
                        ));
                    }
                }
            }
            DecodedResource::Gff(gff) => {
                let content_type = gff.content_type();
                gff.root.walk(&mut |path, value| {
                    if let GffValue::ExoLocString(loc) = value {
                        if let Some(strref) = loc.string_ref {
                            found.push((
                                LiteralKey::StrRef(strref),
                                ReferenceLocation::Field {
                                    path: format!("{path}{STRREF_SUFFIX}"),
                                },
                            ));
                        }
                        return;
                    }
                    let Some(table) = path.label().and_then(|l| row_reference_table(&content_type, l)) else {
                        return;
                    };
                    if let Some(index) = value.literal().and_then(|v| v.parse::<usize>().ok()) {
                        found.push((
                            LiteralKey::row(table, index),
                            ReferenceLocation::Field {
                                path: path.to_string(),
                            },
                        ));
                    }
                });
            }
            DecodedResource::Ssf(set) => {
                for (slot, strref) in set.assigned() {
                    found.push((LiteralKey::StrRef(strref), ReferenceLocation::SoundSlot(slot)));
                }
            }
            DecodedResource::Tlk(_) => {}
        }

        let added = found.len();
        for (key, location) in found {
            self.index.entry(key).or_default().push(ReferenceSite {
                origin: origin.clone(),
                resource: resource.to_string(),
                location,
            });
        }
        log::debug!("Indexed {added} references in {resource} from {origin}");
        added
    }

    /// Walk a folder and index every supported resource in it.
    ///
    /// A file that cannot be read is logged, counted in
    /// [`ScanStats::failures`] and skipped. Only a bad folder pattern fails
    /// the walk.
    pub fn scan_directory(&mut self, origin: &OriginId, dir: &Path) -> Result<usize> {
        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        let mut added = 0;
        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Cannot access {}: {}", e.path().display(), e.error());
                    continue;
                }
            };
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match ResourceKind::from_filename(name) {
                None | Some(ResourceKind::Nss) | Some(ResourceKind::Tlk) => continue,
                Some(_) => {}
            }
            let read = std::fs::metadata(&path).and_then(|meta| {
                if meta.is_file() {
                    std::fs::read(&path).map(Some)
                } else {
                    Ok(None)
                }
            });
            match read {
                Ok(Some(bytes)) => added += self.scan(origin, name, &bytes),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Cannot read {}: {e}", path.display());
                    self.failures += 1;
                }
            }
        }
        Ok(added)
    }

    /// Every site holding the literal
    pub fn query(&self, key: &LiteralKey) -> &[ReferenceSite] {
        self.index.get(key).map_or(&[], Vec::as_slice)
    }

    /// True if the resource was indexed for the origin
    pub fn is_scanned(&self, origin: &OriginId, resource: &str) -> bool {
        self.scanned
            .contains(&(origin.clone(), resource.to_ascii_lowercase()))
    }

    /// Index statistics
    pub fn stats(&self) -> ScanStats {
        ScanStats {
            resources: self.scanned.len(),
            failures: self.failures,
            keys: self.index.len(),
            sites: self.index.values().map(Vec::len).sum(),
        }
    }
}
