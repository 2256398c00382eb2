//! Import payload validation

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::QuoteSource;
use crate::util::normalize_text;

/// How an import batch is applied to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Replace the whole collection with the imported records
    Replace,
    /// Append records whose text + category pair is not already present
    Merge,
}

/// A validated import record, before id assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedQuote {
    /// Identity carried by the payload, when present
    pub id: Option<i64>,
    /// Trimmed quote text
    pub text: String,
    /// Trimmed category label
    pub category: String,
    /// Modification timestamp carried by the payload
    pub last_modified: Option<i64>,
    /// Originating side carried by the payload
    pub source: Option<QuoteSource>,
}

/// Parse and validate an import payload.
///
/// The payload must be a JSON array. An entry is valid iff it is an object
/// with non-empty trimmed string `text` and `category`; invalid entries are
/// dropped silently. An array with zero valid entries is an error, and no
/// partial import is ever applied.
pub fn parse_import(payload: &str) -> Result<Vec<ImportedQuote>> {
    let values: Vec<Value> = serde_json::from_str(payload)
        .map_err(|error| Error::Import(format!("expected a JSON array of quotes: {error}")))?;

    let valid: Vec<ImportedQuote> = values.iter().filter_map(import_entry).collect();
    if valid.is_empty() {
        return Err(Error::Import("no valid quotes found in payload".to_string()));
    }
    Ok(valid)
}

fn import_entry(value: &Value) -> Option<ImportedQuote> {
    let object = value.as_object()?;
    let text = normalize_text(object.get("text")?.as_str()?)?;
    let category = normalize_text(object.get("category")?.as_str()?)?;

    Some(ImportedQuote {
        id: object.get("id").and_then(Value::as_i64),
        text,
        category,
        last_modified: object.get("lastModified").and_then(Value::as_i64),
        source: object
            .get("source")
            .and_then(Value::as_str)
            .and_then(|source| match source {
                "local" => Some(QuoteSource::Local),
                "server" => Some(QuoteSource::Server),
                _ => None,
            }),
    })
}
