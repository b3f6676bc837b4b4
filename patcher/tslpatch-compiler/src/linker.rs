//! Deferred cross-file token links

use crate::codec::DecodedResource;
use crate::modification::Modification;
use crate::modifiers::gff::same_path;
use crate::modifiers::{ChangeRow, FieldEdit, FieldTreeModifier, RowTableModifier, RowTarget, SoundEdit};
use crate::scanner::{OriginId, ReferenceLocation, ReferenceSite};
use crate::tokens::TokenRef;
use crate::value::ValueExpr;
use serde::Serialize;
use std::ops::AddAssign;

/// A literal that should become a token once its file is written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingReference {
    /// File the literal lives in
    pub target: String,
    /// Origin the literal was found in
    pub origin: OriginId,
    /// File whose modifier stored the token
    pub source: String,
    /// Literal expected at the location
    pub literal: String,
    /// Token replacing the literal
    pub token: TokenRef,
    /// Where the literal lives
    pub location: ReferenceLocation,
}

impl PendingReference {
    /// Reference to an indexed site
    pub fn from_site(site: &ReferenceSite, source: &str, literal: impl Into<String>, token: TokenRef) -> Self {
        Self {
            target: site.resource.clone(),
            origin: site.origin.clone(),
            source: source.to_string(),
            literal: literal.into(),
            token,
            location: site.location.clone(),
        }
    }

    fn targets(&self, filename: &str) -> bool {
        self.target.eq_ignore_ascii_case(filename)
    }
}

/// Outcome counts of resolution passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Turned into token edits
    pub resolved: usize,
    /// Discarded because the literal is no longer at its location
    pub stale: usize,
    /// Discarded because there was nothing to verify against
    pub unverifiable: usize,
    /// Kept back because the file came from another origin
    pub origin_mismatch: usize,
}

impl ResolveReport {
    /// True if nothing happened
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for ResolveReport {
    fn add_assign(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.stale += other.stale;
        self.unverifiable += other.unverifiable;
        self.origin_mismatch += other.origin_mismatch;
    }
}

/// Holds pending references until their target file is written
#[derive(Debug, Clone, Default)]
pub struct PendingReferenceLinker {
    pending: Vec<PendingReference>,
}

impl PendingReferenceLinker {
    /// Create an empty linker
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reference. Returns `false` for an exact duplicate.
    pub fn add(&mut self, reference: PendingReference) -> bool {
        if self.pending.contains(&reference) {
            return false;
        }
        log::debug!(
            "Pending {} -> {} at {} in {}",
            reference.literal,
            reference.token,
            reference.location,
            reference.target
        );
        self.pending.push(reference);
        true
    }

    /// True if any reference targets the file
    pub fn has_pending(&self, filename: &str) -> bool {
        self.pending.iter().any(|r| r.targets(filename))
    }

    /// References targeting the file
    pub fn pending_for<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a PendingReference> + 'a {
        self.pending.iter().filter(move |r| r.targets(filename))
    }

    /// All queued references
    pub fn pending(&self) -> &[PendingReference] {
        &self.pending
    }

    /// Number of queued references
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolve every reference targeting `filename` against its modification.
    ///
    /// References from another origin stay queued. The rest are verified
    /// against `fresh` and either become token edits on `modification` or are
    /// discarded.
    pub fn resolve(
        &mut self,
        filename: &str,
        modification: &mut Modification,
        fresh: Option<&DecodedResource>,
        origin: &OriginId,
    ) -> ResolveReport {
        let mut report = ResolveReport::default();
        let mut kept = Vec::with_capacity(self.pending.len());

        for reference in std::mem::take(&mut self.pending) {
            if !reference.targets(filename) {
                kept.push(reference);
                continue;
            }
            if reference.origin != *origin {
                log::debug!(
                    "Holding {} for {}: origin {} differs from {}",
                    reference.token,
                    reference.target,
                    reference.origin,
                    origin
                );
                report.origin_mismatch += 1;
                kept.push(reference);
                continue;
            }
            let Some(fresh) = fresh else {
                log::debug!("Cannot verify {} in {}", reference.token, reference.target);
                report.unverifiable += 1;
                continue;
            };
            let found = fresh.literal_at(&reference.location);
            if found.as_deref() != Some(reference.literal.as_str()) {
                log::debug!(
                    "Stale reference at {} in {}: expected {}, found {}",
                    reference.location,
                    reference.target,
                    reference.literal,
                    found.as_deref().unwrap_or("nothing")
                );
                report.stale += 1;
                continue;
            }
            if apply(modification, &reference.location, reference.token.to_value()) {
                log::info!(
                    "Linked {} at {} in {}",
                    reference.token,
                    reference.location,
                    reference.target
                );
                report.resolved += 1;
            } else {
                report.unverifiable += 1;
            }
        }

        self.pending = kept;
        report
    }
}

/// Write a token into the modification, merging with an edit of the same location
fn apply(modification: &mut Modification, location: &ReferenceLocation, value: ValueExpr) -> bool {
    match (modification, location) {
        (Modification::RowTable(m), ReferenceLocation::Cell { row, column, .. }) => {
            let target = RowTarget::RowIndex(*row);
            let index = match m.modifiers.iter().position(|modifier| {
                matches!(modifier, RowTableModifier::ChangeRow(change) if change.target == target)
            }) {
                Some(index) => index,
                None => {
                    m.modifiers
                        .push(RowTableModifier::ChangeRow(ChangeRow::at_index(*row)));
                    m.modifiers.len() - 1
                }
            };
            let RowTableModifier::ChangeRow(change) = &mut m.modifiers[index] else {
                return false;
            };
            let key = change
                .cells
                .keys()
                .find(|k| k.eq_ignore_ascii_case(column))
                .cloned()
                .unwrap_or_else(|| column.clone());
            change.cells.insert(key, value);
            true
        }
        (Modification::SoundTable(m), ReferenceLocation::SoundSlot(slot)) => {
            match m.modifiers.iter().position(|edit| edit.slot == *slot) {
                Some(index) => m.modifiers[index].value = value,
                None => m.modifiers.push(SoundEdit::new(*slot, value)),
            }
            true
        }
        (Modification::FieldTree(m), ReferenceLocation::Field { path }) => {
            let existing = m.modifiers.iter().position(|modifier| {
                matches!(modifier, FieldTreeModifier::FieldEdit(edit) if same_path(&edit.path, path))
            });
            match existing {
                Some(index) => {
                    if let FieldTreeModifier::FieldEdit(edit) = &mut m.modifiers[index] {
                        edit.value = value;
                    }
                }
                None => m
                    .modifiers
                    .push(FieldTreeModifier::FieldEdit(FieldEdit::new(path.clone(), value))),
            }
            true
        }
        (modification, location) => {
            log::warn!(
                "{} cannot hold a reference at {location}",
                modification.filename()
            );
            false
        }
    }
}
