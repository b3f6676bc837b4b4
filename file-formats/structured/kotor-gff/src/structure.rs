//! GFF structs, documents and path navigation

use crate::GffValue;
use std::fmt;

/// Struct id used by the root struct of every GFF
pub const ROOT_STRUCT_ID: u32 = 0xFFFF_FFFF;

/// A labelled field inside a struct
#[derive(Debug, Clone, PartialEq)]
pub struct GffField {
    /// Field label, at most 16 characters
    pub label: String,
    /// Field value
    pub value: GffValue,
}

/// An ordered set of labelled fields
#[derive(Debug, Clone, PartialEq)]
pub struct GffStruct {
    /// Struct type id
    pub struct_id: u32,
    fields: Vec<GffField>,
}

impl Default for GffStruct {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GffStruct {
    /// Create an empty struct
    pub fn new(struct_id: u32) -> Self {
        Self {
            struct_id,
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with(mut self, label: impl Into<String>, value: GffValue) -> Self {
        self.set(label, value);
        self
    }

    /// Fields in file order
    pub fn fields(&self) -> &[GffField] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the struct has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field value by label (labels compare case-insensitively)
    pub fn get(&self, label: &str) -> Option<&GffValue> {
        self.fields
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
            .map(|f| &f.value)
    }

    /// Mutable field value by label
    pub fn get_mut(&mut self, label: &str) -> Option<&mut GffValue> {
        self.fields
            .iter_mut()
            .find(|f| f.label.eq_ignore_ascii_case(label))
            .map(|f| &mut f.value)
    }

    /// Set a field, replacing an existing one with the same label
    pub fn set(&mut self, label: impl Into<String>, value: GffValue) {
        let label = label.into();
        match self.get_mut(&label) {
            Some(existing) => *existing = value,
            None => self.fields.push(GffField { label, value }),
        }
    }

    /// Resolve a path relative to this struct
    pub fn resolve(&self, path: &FieldPath) -> Option<&GffValue> {
        let (first, rest) = path.segments().split_first()?;
        let PathSegment::Label(label) = first else {
            return None;
        };
        let mut current = self.get(label)?;
        let mut i = 0;
        while i < rest.len() {
            match (&rest[i], current) {
                (PathSegment::Label(label), GffValue::Struct(s)) => current = s.get(label)?,
                (PathSegment::Index(index), GffValue::List(items)) => {
                    // a list element is a struct, so a label must follow
                    let item = items.get(*index)?;
                    let PathSegment::Label(label) = rest.get(i + 1)? else {
                        return None;
                    };
                    current = item.get(label)?;
                    i += 1;
                }
                _ => return None,
            }
            i += 1;
        }
        Some(current)
    }

    /// Resolve a path to a struct: the root for an empty path, a nested
    /// struct, or a list element
    pub fn resolve_struct(&self, path: &FieldPath) -> Option<&GffStruct> {
        if path.is_empty() {
            return Some(self);
        }
        let (parent, last) = path.split_last()?;
        match last {
            PathSegment::Index(i) => self.resolve(&parent)?.as_list()?.get(*i),
            PathSegment::Label(_) => self.resolve(path)?.as_struct(),
        }
    }

    /// Visit every leaf field depth-first with its full path
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&FieldPath, &GffValue),
    {
        self.walk_from(&FieldPath::default(), visit);
    }

    fn walk_from<F>(&self, base: &FieldPath, visit: &mut F)
    where
        F: FnMut(&FieldPath, &GffValue),
    {
        for field in &self.fields {
            let path = base.child(&field.label);
            match &field.value {
                GffValue::Struct(inner) => inner.walk_from(&path, visit),
                GffValue::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        item.walk_from(&path.index(i), visit);
                    }
                }
                value => visit(&path, value),
            }
        }
    }
}

/// A decoded GFF document
#[derive(Debug, Clone, PartialEq)]
pub struct Gff {
    /// Four-character content type such as `UTC ` or `DLG `
    pub file_type: [u8; 4],
    /// Root struct
    pub root: GffStruct,
}

impl Gff {
    /// Create an empty document of the given content type
    pub fn new(file_type: [u8; 4]) -> Self {
        Self {
            file_type,
            root: GffStruct::new(ROOT_STRUCT_ID),
        }
    }

    /// Content type as text, trailing spaces removed
    pub fn content_type(&self) -> String {
        String::from_utf8_lossy(&self.file_type).trim_end().to_string()
    }
}

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Field label inside a struct
    Label(String),
    /// Element index inside a list
    Index(usize),
}

/// Path to a field, written `ItemList\1\Tag`, `ItemList/1/Tag` or `ItemList[1]\Tag`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a textual path
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        for part in text.split(['\\', '/']).filter(|p| !p.is_empty()) {
            let mut rest = part;
            // name[N][M] style indices
            let label_end = rest.find('[').unwrap_or(rest.len());
            let label = &rest[..label_end];
            if !label.is_empty() {
                match label.parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Label(label.to_string())),
                }
            }
            rest = &rest[label_end..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    segments.push(PathSegment::Label(rest.to_string()));
                    break;
                };
                match stripped[..close].trim().parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Label(stripped[..close].to_string())),
                }
                rest = &stripped[close + 1..];
            }
        }
        Self { segments }
    }

    /// Build a path from segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path extended by a label
    pub fn child(&self, label: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Label(label.to_string()));
        Self { segments }
    }

    /// Path extended by a list index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Split into parent path and final segment
    pub fn split_last(&self) -> Option<(FieldPath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((FieldPath::from_segments(parent.to_vec()), last))
    }

    /// Final label, if the path ends in one
    pub fn label(&self) -> Option<&str> {
        match self.segments.last()? {
            PathSegment::Label(label) => Some(label),
            PathSegment::Index(_) => None,
        }
    }

    /// Case-insensitive comparison
    pub fn eq_ignore_case(&self, other: &FieldPath) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (PathSegment::Label(a), PathSegment::Label(b)) => a.eq_ignore_ascii_case(b),
                    (PathSegment::Index(a), PathSegment::Index(b)) => a == b,
                    _ => false,
                })
    }
}

impl fmt::Display for FieldPath {
    /// Backslash-separated form used by patch scripts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("\\")?;
            }
            match segment {
                PathSegment::Label(label) => f.write_str(label)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}
