//! YAML manifest describing one compilation
//!
//! ```yaml
//! output: tslpatchdata
//! settings:
//!   window_caption: HK-47 Restoration
//! scan:
//!   - origin: vanilla
//!     path: extracted/override
//! files:
//!   - origin: vanilla
//!     template: mod/p_hk47.utc
//!     verify: extracted/override/p_hk47.utc
//!     modification:
//!       kind: field_tree
//!       header:
//!         filename: p_hk47.utc
//!       modifiers:
//!         - type: field_edit
//!           path: Tag
//!           value:
//!             constant: hk47
//! install:
//!   - destination: Override
//!     path: mod/hk47_portrait.tga
//! ```
//!
//! Relative paths resolve against the manifest's folder.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tslpatch_compiler::{Modification, OriginId, PatchSettings, TemplateSource, WriteRequest, WriterConfig};

/// Folder of unmodified resources indexed before compiling
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanRoot {
    /// Installation the folder was extracted from
    #[serde(default)]
    pub origin: OriginId,
    /// Folder to index
    pub path: PathBuf,
}

/// File copied as-is and listed under `[InstallList]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallEntry {
    /// Install destination, `Override` when omitted
    #[serde(default = "default_destination")]
    pub destination: String,
    /// File to ship
    pub path: PathBuf,
}

fn default_destination() -> String {
    tslpatch_compiler::install::DEFAULT_DESTINATION.to_string()
}

/// One submitted file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    /// Edits of the file
    pub modification: Modification,
    /// Template copied into the output folder
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Current copy of the file, used to verify references into it
    #[serde(default)]
    pub verify: Option<PathBuf>,
    /// Installation the edits were diffed against
    #[serde(default)]
    pub origin: OriginId,
}

/// A compilation manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Template folder
    pub output: Option<PathBuf>,
    /// Script filename
    pub script_name: Option<String>,
    /// Appended-strings table filename
    pub append_table: Option<String>,
    /// Writes between flushes
    pub batch_size: Option<usize>,
    /// Installer settings
    pub settings: PatchSettings,
    /// Folders to index for references
    pub scan: Vec<ScanRoot>,
    /// Plain files to ship
    pub install: Vec<InstallEntry>,
    files: Vec<serde_yaml_ng::Value>,
    #[serde(skip)]
    base: PathBuf,
}

impl Manifest {
    /// Read a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&text, base).with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest text, resolving relative paths against `base`
    pub fn parse(text: &str, base: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: Self = serde_yaml_ng::from_str(text)?;
        manifest.base = base.into();
        Ok(manifest)
    }

    /// Resolve a path relative to the manifest
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    /// Number of file entries, including ones that fail to parse
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// File entries in manifest order.
    ///
    /// Entries that do not describe a known modification are logged and
    /// left out.
    pub fn entries(&self) -> Vec<FileEntry> {
        self.files
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_yaml_ng::from_value(value.clone())
                    .map_err(|e| log::warn!("Skipping file entry {index}: {e}"))
                    .ok()
            })
            .collect()
    }

    /// Writer configuration, with command line overrides applied
    pub fn writer_config(&self, output: Option<&Path>, batch_size: Option<usize>) -> WriterConfig {
        let mut config = WriterConfig::new().settings(self.settings.clone());
        let dir = output
            .map(Path::to_path_buf)
            .or_else(|| self.output.as_deref().map(|dir| self.resolve(dir)));
        if let Some(dir) = dir {
            config = config.output_dir(dir);
        }
        if let Some(name) = &self.script_name {
            config = config.script_name(name.as_str());
        }
        if let Some(name) = &self.append_table {
            config = config.append_table(name.as_str());
        }
        if let Some(size) = batch_size.or(self.batch_size) {
            config = config.batch_size(size);
        }
        config
    }

    /// Build the writer request for an entry.
    ///
    /// A verify file that cannot be read is logged; the file is then
    /// submitted without verification.
    pub fn request(&self, entry: FileEntry) -> WriteRequest {
        let mut request = WriteRequest::new(entry.modification).origin(entry.origin);
        if let Some(template) = &entry.template {
            request = request.template(TemplateSource::Path(self.resolve(template)));
        }
        if let Some(verify) = &entry.verify {
            let path = self.resolve(verify);
            match std::fs::read(&path) {
                Ok(bytes) => request = request.verify(bytes),
                Err(e) => log::warn!("Cannot read {}: {e}", path.display()),
            }
        }
        request
    }
}
