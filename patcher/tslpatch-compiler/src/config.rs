//! Writer configuration and installer settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default template folder
pub const DEFAULT_OUTPUT_DIR: &str = "tslpatchdata";
/// Default patch script name
pub const DEFAULT_SCRIPT_NAME: &str = "changes.ini";
/// Default name of the talk table holding appended strings
pub const DEFAULT_APPEND_TABLE: &str = "append.tlk";
/// Default number of writes between script flushes
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// `[Settings]` block of the patch script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PatchSettings {
    /// Installer window title
    pub window_caption: String,
    /// Message shown before installing, `N/A` for none
    pub confirm_message: String,
    /// Installer log verbosity, 0 to 4
    pub log_level: u8,
    /// Show the installer UI (`1`) or run as a plain patcher (`0`)
    pub installer_mode: bool,
    /// Back up files before changing them
    pub backup_files: bool,
    /// Write the install log as plain text instead of RTF
    pub plaintext_log: bool,
    /// Ask the user for the game folder instead of looking it up
    pub lookup_game_folder: bool,
    /// Game to look up, 1 for KotOR, 2 for TSL
    pub lookup_game_number: u8,
    /// Keep the preprocessed script sources
    pub save_processed_scripts: bool,
    /// File that must exist before the installer runs
    pub required: Option<String>,
    /// Message shown when the required file is missing
    pub required_msg: Option<String>,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            window_caption: String::new(),
            confirm_message: "N/A".to_string(),
            log_level: 3,
            installer_mode: true,
            backup_files: true,
            plaintext_log: false,
            lookup_game_folder: false,
            lookup_game_number: 1,
            save_processed_scripts: false,
            required: None,
            required_msg: None,
        }
    }
}

/// Output layout and flush policy of an [`IncrementalWriter`](crate::IncrementalWriter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    output_dir: PathBuf,
    script_name: String,
    append_table: String,
    batch_size: usize,
    settings: PatchSettings,
}

impl WriterConfig {
    /// Create a configuration with default settings
    ///
    /// - output folder `tslpatchdata`
    /// - script `changes.ini`, appended strings in `append.tlk`
    /// - flush every 50 writes
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            append_table: DEFAULT_APPEND_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            settings: PatchSettings::default(),
        }
    }

    /// Set the folder templates and the script are written to
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the script filename
    pub fn script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = name.into();
        self
    }

    /// Set the filename of the appended-strings table
    pub fn append_table(mut self, name: impl Into<String>) -> Self {
        self.append_table = name.into();
        self
    }

    /// Set how many writes may accumulate before the script is flushed.
    ///
    /// Only affects how often the script is rewritten, never its content.
    /// Zero is treated as one.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the installer settings
    pub fn settings(mut self, settings: PatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Template folder
    pub fn dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full path of the script
    pub fn script_path(&self) -> PathBuf {
        self.output_dir.join(&self.script_name)
    }

    /// Full path of the appended-strings table
    pub fn append_table_path(&self) -> PathBuf {
        self.output_dir.join(&self.append_table)
    }

    /// Full path of a template
    pub fn template_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Writes between flushes
    pub fn flush_every(&self) -> usize {
        self.batch_size
    }

    /// Installer settings
    pub fn patch_settings(&self) -> &PatchSettings {
        &self.settings
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::new()
    }
}
