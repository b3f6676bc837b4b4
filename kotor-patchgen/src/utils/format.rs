//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a count with a singular or plural noun
pub fn format_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "file"), "1 file");
        assert_eq!(format_count(3, "reference"), "3 references");
        assert_eq!(format_count(0, "token"), "0 tokens");
    }
}
