//! Talk table appends

use serde::{Deserialize, Serialize};

/// Entry appended to `dialog.tlk` through `append.tlk`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringAppend {
    /// Text of the entry
    pub text: String,
    /// Voice-over resref
    #[serde(default)]
    pub sound: String,
    /// `StrRef<n>` token bound to the entry; assigned on write when absent
    #[serde(default)]
    pub token: Option<u32>,
    /// Strref the entry had in the installation it was diffed from
    #[serde(default)]
    pub source_strref: Option<u32>,
}

impl StringAppend {
    /// Append of plain text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Same entry, ignoring a token the other side has not been given yet
    pub fn is_same_entry(&self, other: &StringAppend) -> bool {
        self.text == other.text
            && self.sound == other.sound
            && self.source_strref == other.source_strref
            && (other.token.is_none() || self.token == other.token)
    }
}
