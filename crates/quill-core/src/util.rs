//! Shared utility functions used across multiple modules.

/// Normalize text by trimming whitespace and removing empties.
///
/// Returns `None` when the trimmed value is empty.
pub fn normalize_text(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Uppercase the first character of `text`.
#[must_use]
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Current Unix timestamp in milliseconds.
#[must_use]
pub fn unix_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_rejects_empty() {
        assert_eq!(normalize_text(""), None);
        assert_eq!(normalize_text(" \n\t "), None);
    }

    #[test]
    fn normalize_text_trims_value() {
        assert_eq!(normalize_text("  hello  "), Some("hello".to_string()));
    }

    #[test]
    fn capitalize_first_uppercases_only_the_first_char() {
        assert_eq!(capitalize_first("sunt aut facere"), "Sunt aut facere");
        assert_eq!(capitalize_first("Already"), "Already");
        assert_eq!(capitalize_first(""), "");
    }
}
