//! Per-file modifications and the session-wide modification set

use crate::install::DEFAULT_DESTINATION;
use crate::modifiers::{FieldTreeModifier, RowTableModifier, SoundEdit, StringAppend};
use crate::value::ValueExpr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource family of a modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 2DA tables
    RowTable,
    /// GFF resources
    FieldTree,
    /// Talk table
    StringTable,
    /// Sound sets
    SoundTable,
    /// NSS scripts
    Script,
}

impl Variant {
    /// Every variant in script section order
    pub const ALL: [Variant; 5] = [
        Variant::StringTable,
        Variant::RowTable,
        Variant::FieldTree,
        Variant::Script,
        Variant::SoundTable,
    ];

    /// Name of the list section (`[2DAList]`, ...)
    pub fn list_section(self) -> &'static str {
        match self {
            Variant::RowTable => "2DAList",
            Variant::FieldTree => "GFFList",
            Variant::StringTable => "TLKList",
            Variant::SoundTable => "SSFList",
            Variant::Script => "CompileList",
        }
    }

    fn slot(self) -> usize {
        match self {
            Variant::RowTable => 0,
            Variant::FieldTree => 1,
            Variant::StringTable => 2,
            Variant::SoundTable => 3,
            Variant::Script => 4,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::RowTable => "2DA",
            Variant::FieldTree => "GFF",
            Variant::StringTable => "TLK",
            Variant::SoundTable => "SSF",
            Variant::Script => "NSS",
        })
    }
}

/// Target file of a modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    /// Resource filename, e.g. `appearance.2da`
    pub filename: String,
    /// Install destination relative to the game folder
    #[serde(default = "default_destination")]
    pub destination: String,
    /// Ship the file and overwrite the installed copy before patching
    #[serde(default)]
    pub replace_file: bool,
    /// Also list the file in `[InstallList]`
    #[serde(default)]
    pub install: bool,
}

impl FileHeader {
    /// Header for a file patched in `Override`
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            destination: default_destination(),
            replace_file: false,
            install: false,
        }
    }

    /// Same header with another destination
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Case-insensitive key of the file
    pub fn key(&self) -> String {
        self.filename.to_ascii_lowercase()
    }
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

/// 2DA modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTableModification {
    /// Target file
    pub header: FileHeader,
    /// Modifiers in insertion order
    #[serde(default)]
    pub modifiers: Vec<RowTableModifier>,
}

/// GFF modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTreeModification {
    /// Target file
    pub header: FileHeader,
    /// Modifiers in insertion order
    #[serde(default)]
    pub modifiers: Vec<FieldTreeModifier>,
}

/// Talk table modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTableModification {
    /// Target file, normally `dialog.tlk`
    pub header: FileHeader,
    /// Appends in insertion order
    #[serde(default)]
    pub modifiers: Vec<StringAppend>,
}

/// Sound set modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundTableModification {
    /// Target file
    pub header: FileHeader,
    /// Slot edits in insertion order
    #[serde(default)]
    pub modifiers: Vec<SoundEdit>,
}

/// Script compiled at apply time; carries no modifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptModification {
    /// Target file (`.nss` source)
    pub header: FileHeader,
}

/// All edits to one resource file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modification {
    /// 2DA edits
    RowTable(RowTableModification),
    /// GFF edits
    FieldTree(FieldTreeModification),
    /// Talk table appends
    StringTable(StringTableModification),
    /// Sound set edits
    SoundTable(SoundTableModification),
    /// Script compile
    Script(ScriptModification),
}

impl Modification {
    /// Empty 2DA modification
    pub fn row_table(filename: impl Into<String>) -> Self {
        Modification::RowTable(RowTableModification {
            header: FileHeader::new(filename),
            modifiers: Vec::new(),
        })
    }

    /// Empty GFF modification
    pub fn field_tree(filename: impl Into<String>) -> Self {
        Modification::FieldTree(FieldTreeModification {
            header: FileHeader::new(filename),
            modifiers: Vec::new(),
        })
    }

    /// Empty talk table modification
    pub fn string_table(filename: impl Into<String>) -> Self {
        Modification::StringTable(StringTableModification {
            header: FileHeader::new(filename),
            modifiers: Vec::new(),
        })
    }

    /// Empty sound set modification
    pub fn sound_table(filename: impl Into<String>) -> Self {
        Modification::SoundTable(SoundTableModification {
            header: FileHeader::new(filename),
            modifiers: Vec::new(),
        })
    }

    /// Script compile entry
    pub fn script(filename: impl Into<String>) -> Self {
        Modification::Script(ScriptModification {
            header: FileHeader::new(filename),
        })
    }

    /// Resource family
    pub fn variant(&self) -> Variant {
        match self {
            Modification::RowTable(_) => Variant::RowTable,
            Modification::FieldTree(_) => Variant::FieldTree,
            Modification::StringTable(_) => Variant::StringTable,
            Modification::SoundTable(_) => Variant::SoundTable,
            Modification::Script(_) => Variant::Script,
        }
    }

    /// Target file
    pub fn header(&self) -> &FileHeader {
        match self {
            Modification::RowTable(m) => &m.header,
            Modification::FieldTree(m) => &m.header,
            Modification::StringTable(m) => &m.header,
            Modification::SoundTable(m) => &m.header,
            Modification::Script(m) => &m.header,
        }
    }

    /// Mutable target file
    pub fn header_mut(&mut self) -> &mut FileHeader {
        match self {
            Modification::RowTable(m) => &mut m.header,
            Modification::FieldTree(m) => &mut m.header,
            Modification::StringTable(m) => &mut m.header,
            Modification::SoundTable(m) => &mut m.header,
            Modification::Script(m) => &mut m.header,
        }
    }

    /// Target filename
    pub fn filename(&self) -> &str {
        &self.header().filename
    }

    /// Number of modifiers
    pub fn len(&self) -> usize {
        match self {
            Modification::RowTable(m) => m.modifiers.len(),
            Modification::FieldTree(m) => m.modifiers.len(),
            Modification::StringTable(m) => m.modifiers.len(),
            Modification::SoundTable(m) => m.modifiers.len(),
            Modification::Script(_) => 0,
        }
    }

    /// True when no modifiers are present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge a resubmission of this file into the buffered modification.
    ///
    /// Incoming modifiers are matched against buffered ones by target, since
    /// buffered modifiers may have gained tokens and stores since they were
    /// submitted. Unmatched modifiers are appended. Matched row table
    /// modifiers receive the cells and stores they lack; other matched
    /// modifiers keep their buffered value. Nothing happens when the
    /// variants differ.
    pub fn absorb(&mut self, other: Modification) -> Absorbed {
        fn merge<T>(
            into: &mut Vec<T>,
            from: Vec<T>,
            same: impl Fn(&T, &T) -> bool,
            fill: impl Fn(&mut T, T) -> usize,
        ) -> Absorbed {
            let mut absorbed = Absorbed::default();
            for item in from {
                match into.iter().position(|existing| same(existing, &item)) {
                    Some(index) => absorbed.merged += fill(&mut into[index], item),
                    None => {
                        into.push(item);
                        absorbed.appended += 1;
                    }
                }
            }
            absorbed
        }

        match (self, other) {
            (Modification::RowTable(a), Modification::RowTable(b)) => merge(
                &mut a.modifiers,
                b.modifiers,
                RowTableModifier::same_target,
                RowTableModifier::merge_missing,
            ),
            (Modification::FieldTree(a), Modification::FieldTree(b)) => {
                merge(&mut a.modifiers, b.modifiers, FieldTreeModifier::same_target, |_, _| 0)
            }
            (Modification::StringTable(a), Modification::StringTable(b)) => {
                merge(&mut a.modifiers, b.modifiers, StringAppend::is_same_entry, |_, _| 0)
            }
            (Modification::SoundTable(a), Modification::SoundTable(b)) => {
                merge(&mut a.modifiers, b.modifiers, |x, y| x.slot == y.slot, |_, _| 0)
            }
            _ => Absorbed::default(),
        }
    }

    /// Token ids this modification names explicitly, per token space
    pub fn named_tokens(&self) -> (Vec<u32>, Vec<u32>) {
        let mut strings = Vec::new();
        let mut rows = Vec::new();
        let mut values: Vec<&ValueExpr> = Vec::new();
        match self {
            Modification::RowTable(m) => {
                for modifier in &m.modifiers {
                    values.extend(modifier.values());
                    rows.extend(modifier.stored_tokens());
                }
            }
            Modification::FieldTree(m) => {
                for modifier in &m.modifiers {
                    values.extend(modifier.values());
                    rows.extend(modifier.stored_tokens());
                }
            }
            Modification::StringTable(m) => strings.extend(m.modifiers.iter().filter_map(|a| a.token)),
            Modification::SoundTable(m) => values.extend(m.modifiers.iter().map(|e| &e.value)),
            Modification::Script(_) => {}
        }
        for value in values {
            match value {
                ValueExpr::StringTableToken(id) => strings.push(*id),
                ValueExpr::RowToken(id) => rows.push(*id),
                _ => {}
            }
        }
        (strings, rows)
    }
}

/// What [`Modification::absorb`] did with a resubmission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Absorbed {
    /// Modifiers appended after the buffered ones
    pub appended: usize,
    /// Cells, seeds or stores copied into buffered modifiers
    pub merged: usize,
}

/// Stable handle to a buffered modification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModHandle {
    /// Owning list
    pub variant: Variant,
    /// Position in the list
    pub index: usize,
}

/// Every buffered modification, one list per variant in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationSet {
    lists: [Vec<Modification>; 5],
}

impl ModificationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modification to its variant's list
    pub fn push(&mut self, modification: Modification) -> ModHandle {
        let variant = modification.variant();
        let list = &mut self.lists[variant.slot()];
        list.push(modification);
        ModHandle {
            variant,
            index: list.len() - 1,
        }
    }

    /// Modification behind a handle
    pub fn get(&self, handle: ModHandle) -> Option<&Modification> {
        self.lists[handle.variant.slot()].get(handle.index)
    }

    /// Mutable modification behind a handle
    pub fn get_mut(&mut self, handle: ModHandle) -> Option<&mut Modification> {
        self.lists[handle.variant.slot()].get_mut(handle.index)
    }

    /// Find a buffered file by name, case-insensitively
    pub fn find(&self, variant: Variant, filename: &str) -> Option<ModHandle> {
        self.lists[variant.slot()]
            .iter()
            .position(|m| m.filename().eq_ignore_ascii_case(filename))
            .map(|index| ModHandle { variant, index })
    }

    /// Modifications of one variant in processing order
    pub fn list(&self, variant: Variant) -> &[Modification] {
        &self.lists[variant.slot()]
    }

    /// Mutable modifications of one variant
    pub fn list_mut(&mut self, variant: Variant) -> &mut [Modification] {
        &mut self.lists[variant.slot()]
    }

    /// 2DA modifications in processing order
    pub fn row_tables(&self) -> impl Iterator<Item = &RowTableModification> {
        self.list(Variant::RowTable).iter().filter_map(|m| match m {
            Modification::RowTable(m) => Some(m),
            _ => None,
        })
    }

    /// GFF modifications in processing order
    pub fn field_trees(&self) -> impl Iterator<Item = &FieldTreeModification> {
        self.list(Variant::FieldTree).iter().filter_map(|m| match m {
            Modification::FieldTree(m) => Some(m),
            _ => None,
        })
    }

    /// Talk table modifications in processing order
    pub fn string_tables(&self) -> impl Iterator<Item = &StringTableModification> {
        self.list(Variant::StringTable).iter().filter_map(|m| match m {
            Modification::StringTable(m) => Some(m),
            _ => None,
        })
    }

    /// Sound set modifications in processing order
    pub fn sound_tables(&self) -> impl Iterator<Item = &SoundTableModification> {
        self.list(Variant::SoundTable).iter().filter_map(|m| match m {
            Modification::SoundTable(m) => Some(m),
            _ => None,
        })
    }

    /// Scripts in processing order
    pub fn scripts(&self) -> impl Iterator<Item = &ScriptModification> {
        self.list(Variant::Script).iter().filter_map(|m| match m {
            Modification::Script(m) => Some(m),
            _ => None,
        })
    }

    /// Every talk-table append across all string table files, in order
    pub fn appends(&self) -> impl Iterator<Item = &StringAppend> {
        self.string_tables().flat_map(|m| m.modifiers.iter())
    }

    /// Number of modifications of one variant
    pub fn count(&self, variant: Variant) -> usize {
        self.lists[variant.slot()].len()
    }

    /// Number of modifications across all variants
    pub fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }
}
