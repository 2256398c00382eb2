//! Quote export helpers

use chrono::{DateTime, Utc};

use crate::models::Quote;

/// Render the full canonical collection as pretty-printed JSON.
pub fn render_json_export(quotes: &[Quote]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(quotes)
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(timestamp_ms: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d");
    format!("quotes-backup-{date}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuoteId, QuoteSource};
    use pretty_assertions::assert_eq;

    #[test]
    fn render_json_export_is_pretty_printed() {
        let quotes = vec![Quote {
            id: QuoteId::new(1),
            text: "Hello".to_string(),
            category: "Wisdom".to_string(),
            last_modified: Some(123),
            source: Some(QuoteSource::Local),
        }];

        let rendered = render_json_export(&quotes).unwrap();
        assert!(rendered.contains('\n'));
        assert!(rendered.contains(r#""text": "Hello""#));
        assert!(rendered.contains(r#""lastModified": 123"#));

        let parsed: Vec<Quote> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, quotes);
    }

    #[test]
    fn suggested_export_file_name_uses_date_stamp() {
        // 2024-03-01T12:00:00Z
        assert_eq!(
            suggested_export_file_name(1_709_294_400_000),
            "quotes-backup-2024-03-01.json"
        );
        assert_eq!(suggested_export_file_name(0), "quotes-backup-1970-01-01.json");
    }
}
