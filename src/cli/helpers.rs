//! Shared helper functions for CLI commands
//!
//! Formatting used by more than one command module.

use crate::core::value::FieldValue;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a value for TSV output
///
/// Tabs and newlines inside a value would break the column layout.
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Join option values for one-line display
pub fn join_values(values: &[FieldValue], max_len: usize) -> String {
    let joined = values
        .iter()
        .map(|v| if v.is_null() { "(null)".to_string() } else { v.to_string() })
        .collect::<Vec<_>>()
        .join(", ");
    truncate_str(&joined, max_len)
}

/// Format an optional float with fixed precision; empty when missing
pub fn format_number(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("µµµµµ", 4), "µ...");
    }

    #[test]
    fn test_escape_tsv() {
        assert_eq!(escape_tsv("simple"), "simple");
        assert_eq!(escape_tsv("a\tb\nc"), "a b c");
    }

    #[test]
    fn test_join_values() {
        let values = vec![FieldValue::from("Lot A"), FieldValue::Null, FieldValue::from(2i64)];
        assert_eq!(join_values(&values, 80), "Lot A, (null), 2");
        assert_eq!(join_values(&values, 8), "Lot A...");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1.23456), 3), "1.235");
        assert_eq!(format_number(None, 3), "");
    }
}
