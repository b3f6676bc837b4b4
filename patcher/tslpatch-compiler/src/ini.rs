//! `changes.ini` emission
//!
//! The script is rebuilt from scratch on every flush. Section names are
//! derived from the filename and a per-file counter, so the same state
//! always serializes to the same text.
//!
//! Line breaks inside keys and values are written as the installer's
//! `<#CR#>` and `<#LF#>` escapes so every entry stays on one line.

use crate::config::PatchSettings;
use crate::install::{DEFAULT_DESTINATION, InstallFolderRegistry, normalize_destination};
use crate::modification::{FileHeader, ModificationSet, Variant};
use crate::modifiers::gff::split_strref_suffix;
use crate::modifiers::{AddColumn, FieldInsert, FieldTreeModifier, ListInsert, NestedInsert, RowTableModifier, RowTarget};
use crate::modifiers::twoda::{Cells, RowStores};
use crate::value::ValueExpr;
use kotor_2da::BLANK_CELL;
use kotor_gff::{FieldPath, FieldType};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered `[section]` / `key=value` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

/// One section of an [`IniDocument`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSection {
    /// Section name without brackets
    pub name: String,
    /// Entries in insertion order
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((escape_line_breaks(key.into()), escape_line_breaks(value.into())));
    }

    /// Value of the first entry with the key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl IniDocument {
    fn push(&mut self, section: IniSection) {
        self.sections.push(section);
    }

    /// All sections in output order
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// Section by name, case-insensitively
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Escape the installer reads back as `\n`
pub const LINE_FEED_ESCAPE: &str = "<#LF#>";

/// Escape the installer reads back as `\r`
pub const CARRIAGE_RETURN_ESCAPE: &str = "<#CR#>";

fn escape_line_breaks(text: String) -> String {
    if !text.contains(['\n', '\r']) {
        return text;
    }
    log::debug!("Escaping line breaks in {text:?}");
    text.replace('\r', CARRIAGE_RETURN_ESCAPE)
        .replace('\n', LINE_FEED_ESCAPE)
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Name of a modifier section: `appearance_2da_changerow_0`
fn section_name(filename: &str, keyword: &str, n: usize) -> String {
    format!(
        "{}_{}_{n}",
        filename.replace('.', "_"),
        keyword.to_ascii_lowercase()
    )
}

fn script_path(path: &str) -> String {
    let (base, strref) = split_strref_suffix(path);
    let normalized = FieldPath::parse(base).to_string();
    if strref {
        format!("{normalized}(strref)")
    } else {
        normalized
    }
}

/// Builds the patch script from the whole session state
#[derive(Debug, Clone, Copy)]
pub struct PatchScriptSerializer<'a> {
    settings: &'a PatchSettings,
}

impl<'a> PatchScriptSerializer<'a> {
    /// Serializer writing the given settings
    pub fn new(settings: &'a PatchSettings) -> Self {
        Self { settings }
    }

    /// Render the script text
    pub fn serialize(&self, set: &ModificationSet, installs: &InstallFolderRegistry) -> String {
        self.document(set, installs).to_string()
    }

    /// Build the script as a document
    pub fn document(&self, set: &ModificationSet, installs: &InstallFolderRegistry) -> IniDocument {
        let mut doc = IniDocument::default();
        doc.push(self.settings_section());
        doc.push(Self::tlk_list(set));
        Self::install_list(&mut doc, installs);
        Self::twoda_list(&mut doc, set);
        Self::gff_list(&mut doc, set);
        Self::compile_list(&mut doc, set);
        Self::ssf_list(&mut doc, set);
        doc
    }

    fn settings_section(&self) -> IniSection {
        let s = self.settings;
        let mut section = IniSection::new("Settings");
        section.set("FileExists", "1");
        section.set("WindowCaption", s.window_caption.as_str());
        section.set("ConfirmMessage", s.confirm_message.as_str());
        section.set("LogLevel", s.log_level.to_string());
        section.set("InstallerMode", flag(s.installer_mode));
        section.set("BackupFiles", flag(s.backup_files));
        section.set("PlaintextLog", flag(s.plaintext_log));
        section.set("LookupGameFolder", flag(s.lookup_game_folder));
        section.set("LookupGameNumber", s.lookup_game_number.to_string());
        section.set("SaveProcessedScripts", flag(s.save_processed_scripts));
        if let Some(required) = &s.required {
            section.set("Required", required.as_str());
        }
        if let Some(message) = &s.required_msg {
            section.set("RequiredMsg", message.as_str());
        }
        section
    }

    fn tlk_list(set: &ModificationSet) -> IniSection {
        let mut section = IniSection::new(Variant::StringTable.list_section());
        for (index, append) in set.appends().enumerate() {
            match append.token {
                Some(token) => section.set(format!("StrRef{token}"), index.to_string()),
                None => log::warn!("Append {index} has no token and cannot be referenced"),
            }
        }
        section
    }

    fn install_list(doc: &mut IniDocument, installs: &InstallFolderRegistry) {
        let mut list = IniSection::new("InstallList");
        let mut folders = Vec::new();
        for (n, folder) in installs.folders().iter().enumerate() {
            let name = format!("install_folder{n}");
            list.set(name.as_str(), folder.destination.as_str());
            let mut section = IniSection::new(name);
            for (i, file) in folder.files.iter().enumerate() {
                section.set(format!("File{i}"), file.as_str());
            }
            folders.push(section);
        }
        doc.push(list);
        for section in folders {
            doc.push(section);
        }
    }

    /// `File<n>`/`Replace<n>` list entry key
    fn list_key(header: &FileHeader, prefix: &str, n: usize) -> String {
        if header.replace_file {
            format!("Replace{n}")
        } else {
            format!("{prefix}{n}")
        }
    }

    fn file_section(header: &FileHeader) -> IniSection {
        let mut section = IniSection::new(header.filename.as_str());
        let destination = normalize_destination(&header.destination);
        if destination != DEFAULT_DESTINATION {
            section.set("!Destination", destination);
        }
        section
    }

    fn twoda_list(doc: &mut IniDocument, set: &ModificationSet) {
        let mut list = IniSection::new(Variant::RowTable.list_section());
        let mut sections = Vec::new();
        for (n, table) in set.row_tables().enumerate() {
            list.set(format!("Table{n}"), table.header.filename.as_str());

            let mut file = Self::file_section(&table.header);
            let mut counters: BTreeMap<&str, usize> = BTreeMap::new();
            let mut modifier_sections = Vec::new();
            for modifier in &table.modifiers {
                let keyword = modifier.keyword();
                let counter = counters.entry(keyword).or_default();
                let name = section_name(&table.header.filename, keyword, *counter);
                file.set(format!("{keyword}{counter}"), name.as_str());
                *counter += 1;
                modifier_sections.push(Self::row_modifier_section(name, modifier));
            }
            sections.push(file);
            sections.extend(modifier_sections);
        }
        doc.push(list);
        for section in sections {
            doc.push(section);
        }
    }

    fn row_target(section: &mut IniSection, target: &RowTarget) {
        match target {
            RowTarget::RowIndex(index) => section.set("RowIndex", index.to_string()),
            RowTarget::RowLabel(label) => section.set("RowLabel", label.as_str()),
            RowTarget::LabelColumn(value) => section.set("LabelIndex", value.as_str()),
        }
    }

    fn cells(section: &mut IniSection, cells: &Cells, stores: &RowStores) {
        for (column, value) in cells {
            section.set(column.as_str(), cell_value(value));
        }
        for (token, value) in stores {
            section.set(format!("2DAMEMORY{token}"), value.to_ini_value());
        }
    }

    fn row_modifier_section(name: String, modifier: &RowTableModifier) -> IniSection {
        let mut section = IniSection::new(name);
        match modifier {
            RowTableModifier::ChangeRow(change) => {
                Self::row_target(&mut section, &change.target);
                Self::cells(&mut section, &change.cells, &change.stores);
            }
            RowTableModifier::AddRow(add) => {
                if let Some(column) = &add.exclusive_column {
                    section.set("ExclusiveColumn", column.as_str());
                }
                if let Some(label) = &add.row_label {
                    section.set("RowLabel", label.as_str());
                }
                Self::cells(&mut section, &add.cells, &add.stores);
            }
            RowTableModifier::CopyRow(copy) => {
                Self::row_target(&mut section, &copy.target);
                if let Some(column) = &copy.exclusive_column {
                    section.set("ExclusiveColumn", column.as_str());
                }
                if let Some(label) = &copy.row_label {
                    section.set("NewRowLabel", label.as_str());
                }
                Self::cells(&mut section, &copy.cells, &copy.stores);
            }
            RowTableModifier::AddColumn(column) => Self::add_column(&mut section, column),
        }
        section
    }

    fn add_column(section: &mut IniSection, column: &AddColumn) {
        section.set("ColumnLabel", column.header.as_str());
        let default = if column.default.is_empty() {
            BLANK_CELL
        } else {
            column.default.as_str()
        };
        section.set("DefaultValue", default);
        for (row, value) in &column.index_insert {
            section.set(AddColumn::index_key(*row), cell_value(value));
        }
        for (label, value) in &column.label_insert {
            section.set(AddColumn::label_key(label), cell_value(value));
        }
        for (token, key) in &column.stores {
            section.set(format!("2DAMEMORY{token}"), key.as_str());
        }
    }

    fn gff_list(doc: &mut IniDocument, set: &ModificationSet) {
        let mut list = IniSection::new(Variant::FieldTree.list_section());
        let mut sections = Vec::new();
        for (n, tree) in set.field_trees().enumerate() {
            list.set(Self::list_key(&tree.header, "File", n), tree.header.filename.as_str());

            let mut file = Self::file_section(&tree.header);
            let mut inserts = Vec::new();
            let mut counter = 0;
            for modifier in &tree.modifiers {
                match modifier {
                    FieldTreeModifier::FieldEdit(edit) => {
                        file.set(script_path(&edit.path), edit.value.to_ini_value());
                    }
                    FieldTreeModifier::FieldInsert(field) => {
                        let name = Self::insert_field(&tree.header.filename, field, &mut counter, &mut inserts);
                        file.set(format!("AddField{}", file_add_count(&file)), name);
                    }
                    FieldTreeModifier::ListInsert(insert) => {
                        let name = Self::insert_list(&tree.header.filename, insert, &mut counter, &mut inserts);
                        file.set(format!("AddField{}", file_add_count(&file)), name);
                    }
                }
            }
            sections.push(file);
            sections.extend(inserts);
        }
        doc.push(list);
        for section in sections {
            doc.push(section);
        }
    }

    fn next_insert_name(filename: &str, counter: &mut usize) -> String {
        let name = section_name(filename, "AddField", *counter);
        *counter += 1;
        name
    }

    fn nested(filename: &str, section: &mut IniSection, children: &[NestedInsert], counter: &mut usize, out: &mut Vec<IniSection>) {
        for (i, child) in children.iter().enumerate() {
            let name = match child {
                NestedInsert::FieldInsert(field) => Self::insert_field(filename, field, counter, out),
                NestedInsert::ListInsert(list) => Self::insert_list(filename, list, counter, out),
            };
            section.set(format!("AddField{i}"), name);
        }
    }

    /// Emit an `AddField` section and its children depth-first
    fn insert_field(filename: &str, field: &FieldInsert, counter: &mut usize, out: &mut Vec<IniSection>) -> String {
        let name = Self::next_insert_name(filename, counter);
        let slot = out.len();
        out.push(IniSection::new(name.as_str()));

        let mut section = IniSection::new(name.as_str());
        section.set("FieldType", field.field_type.script_name());
        section.set("Path", script_path(&field.path));
        section.set("Label", field.label.as_str());
        match field.field_type {
            FieldType::ExoLocString => {
                let strref = match &field.value {
                    ValueExpr::Constant(c) if c.is_empty() => "-1".to_string(),
                    value => value.to_ini_value(),
                };
                section.set("StrRef", strref);
                for (id, text) in &field.substrings {
                    section.set(format!("lang{id}"), text.as_str());
                }
            }
            FieldType::Struct => {
                let type_id = match &field.value {
                    ValueExpr::Constant(c) if c.is_empty() => "0".to_string(),
                    value => value.to_ini_value(),
                };
                section.set("TypeId", type_id);
            }
            FieldType::List => {}
            _ => section.set("Value", field.value.to_ini_value()),
        }
        Self::nested(filename, &mut section, &field.children, counter, out);
        out[slot] = section;
        name
    }

    /// Emit a list-entry `AddField` section and its children depth-first
    fn insert_list(filename: &str, list: &ListInsert, counter: &mut usize, out: &mut Vec<IniSection>) -> String {
        let name = Self::next_insert_name(filename, counter);
        let slot = out.len();
        out.push(IniSection::new(name.as_str()));

        let mut section = IniSection::new(name.as_str());
        section.set("FieldType", FieldType::Struct.script_name());
        section.set("Path", script_path(&list.path));
        section.set("Label", "");
        section.set("TypeId", list.struct_id.to_string());
        if let Some(token) = list.index_token {
            section.set(format!("2DAMEMORY{token}"), "ListIndex");
        }
        Self::nested(filename, &mut section, &list.children, counter, out);
        out[slot] = section;
        name
    }

    fn compile_list(doc: &mut IniDocument, set: &ModificationSet) {
        let mut list = IniSection::new(Variant::Script.list_section());
        let mut sections = Vec::new();
        for (n, script) in set.scripts().enumerate() {
            list.set(Self::list_key(&script.header, "File", n), script.header.filename.as_str());
            let section = Self::file_section(&script.header);
            if !section.entries.is_empty() {
                sections.push(section);
            }
        }
        doc.push(list);
        for section in sections {
            doc.push(section);
        }
    }

    fn ssf_list(doc: &mut IniDocument, set: &ModificationSet) {
        let mut list = IniSection::new(Variant::SoundTable.list_section());
        let mut sections = Vec::new();
        for (n, sounds) in set.sound_tables().enumerate() {
            list.set(Self::list_key(&sounds.header, "File", n), sounds.header.filename.as_str());
            let mut section = Self::file_section(&sounds.header);
            for edit in &sounds.modifiers {
                section.set(edit.slot.script_name(), edit.value.to_ini_value());
            }
            sections.push(section);
        }
        doc.push(list);
        for section in sections {
            doc.push(section);
        }
    }
}

fn file_add_count(section: &IniSection) -> usize {
    section
        .entries
        .iter()
        .filter(|(k, _)| k.starts_with("AddField"))
        .count()
}

fn cell_value(value: &ValueExpr) -> String {
    match value {
        ValueExpr::Constant(c) if c.is_empty() => BLANK_CELL.to_string(),
        value => value.to_ini_value(),
    }
}
