//! `[InstallList]` membership

/// Destination of files without an explicit folder
pub const DEFAULT_DESTINATION: &str = "Override";

/// Normalize a destination folder: `.` and empty mean `Override`,
/// separators become backslashes, trailing separators are dropped
pub fn normalize_destination(destination: &str) -> String {
    let trimmed = destination
        .trim()
        .trim_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty() || trimmed == "." {
        return DEFAULT_DESTINATION.to_string();
    }
    let folder = trimmed.replace('/', "\\");
    if folder.eq_ignore_ascii_case(DEFAULT_DESTINATION) {
        DEFAULT_DESTINATION.to_string()
    } else {
        folder
    }
}

/// One install destination and its files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallFolder {
    /// Destination folder
    pub destination: String,
    /// Files in registration order
    pub files: Vec<String>,
}

/// Destination folders and their files, in first-registration order.
/// Never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallFolderRegistry {
    folders: Vec<InstallFolder>,
}

impl InstallFolderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. Returns `false` if it was already listed.
    pub fn add(&mut self, destination: &str, filename: &str) -> bool {
        let destination = normalize_destination(destination);
        let index = match self
            .folders
            .iter()
            .position(|f| f.destination.eq_ignore_ascii_case(&destination))
        {
            Some(index) => index,
            None => {
                self.folders.push(InstallFolder {
                    destination,
                    files: Vec::new(),
                });
                self.folders.len() - 1
            }
        };
        let folder = &mut self.folders[index];
        if folder.files.iter().any(|f| f.eq_ignore_ascii_case(filename)) {
            return false;
        }
        folder.files.push(filename.to_string());
        true
    }

    /// True if the file is listed under the destination
    pub fn contains(&self, destination: &str, filename: &str) -> bool {
        let destination = normalize_destination(destination);
        self.folders.iter().any(|f| {
            f.destination.eq_ignore_ascii_case(&destination)
                && f.files.iter().any(|n| n.eq_ignore_ascii_case(filename))
        })
    }

    /// Folders in registration order
    pub fn folders(&self) -> &[InstallFolder] {
        &self.folders
    }

    /// Number of files across all folders
    pub fn file_count(&self) -> usize {
        self.folders.iter().map(|f| f.files.len()).sum()
    }
}
