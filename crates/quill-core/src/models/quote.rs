//! Quote model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A unique identifier for a quote.
///
/// Identity is a plain integer: the store assigns `max existing id + 1`
/// to locally created quotes, while server records carry their own id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct QuoteId(i64);

impl QuoteId {
    /// Wrap a raw id value
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw id value
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for QuoteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for QuoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Which side a quote record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Created on this device
    Local,
    /// Fetched from the remote source
    Server,
}

/// A quote in the canonical collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique identifier
    pub id: QuoteId,
    /// Quote text
    pub text: String,
    /// Category label, matched case-sensitively by filtering
    pub category: String,
    /// Last modification timestamp (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    /// Originating side, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<QuoteSource>,
}

impl Quote {
    /// Two quotes are the same record when their ids match.
    #[must_use]
    pub fn same_record(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Same record with matching text and category.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.same_record(other) && self.text == other.text && self.category == other.category
    }
}

/// Starter collection seeded when no persisted quotes exist.
#[must_use]
pub fn default_quotes() -> Vec<Quote> {
    let starter = [
        (1, "The only way to do great work is to love what you do.", "Motivation"),
        (2, "Innovation distinguishes between a leader and a follower.", "Leadership"),
        (3, "Life is what happens when you're busy making other plans.", "Life"),
        (
            4,
            "The future belongs to those who believe in the beauty of their dreams.",
            "Inspiration",
        ),
        (
            5,
            "Success is not final, failure is not fatal: it is the courage to continue that counts.",
            "Success",
        ),
    ];

    starter
        .into_iter()
        .map(|(id, text, category)| Quote {
            id: QuoteId::new(id),
            text: text.to_string(),
            category: category.to_string(),
            last_modified: None,
            source: None,
        })
        .collect()
}
