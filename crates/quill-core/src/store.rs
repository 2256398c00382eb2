//! Canonical quote collection

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::import::{ImportMode, ImportedQuote};
use crate::models::{default_quotes, Quote, QuoteId, QuoteSource};
use crate::storage::{
    KeyValueStore, CATEGORY_FILTER_KEY, LAST_SYNC_KEY, LAST_VIEWED_KEY, QUOTES_KEY,
};
use crate::util::unix_timestamp_ms;

/// Shared handle to the store, used by interfaces and the sync pipeline.
pub type SharedQuoteStore = Arc<tokio::sync::Mutex<QuoteStore>>;

/// Category selector understood by filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Synthetic selector matching every quote
    All,
    /// Exact, case-sensitive category match
    Category(String),
}

impl CategoryFilter {
    /// Parse a selector string; `"all"` is the synthetic match-everything
    /// selector, anything else names a category.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Category(value.to_string())
        }
    }

    /// Whether `quote` passes this filter.
    #[must_use]
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => quote.category == *category,
        }
    }

    /// The selector string persisted for this filter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Category(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage usage snapshot for display surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSummary {
    /// Number of quotes in the canonical collection
    pub quote_count: usize,
    /// Size of the serialized collection in bytes
    pub serialized_bytes: usize,
    /// Currently selected category filter
    pub filter: CategoryFilter,
    /// Unix-ms timestamp of the last committed sync, when any
    pub last_sync: Option<i64>,
}

/// Uniform random pick from a prepared sequence.
///
/// Callers whose filter yields nothing should render an empty state
/// instead of calling this.
pub fn random_from(quotes: &[Quote]) -> Result<&Quote> {
    quotes
        .choose(&mut rand::thread_rng())
        .ok_or(Error::EmptyCollection)
}

/// The canonical quote collection with injected persistence.
///
/// Owns id uniqueness and category indexing. All writes go through
/// [`QuoteStore::add`] and [`QuoteStore::replace_all`]; other components
/// operate on copies and hand back new collections.
pub struct QuoteStore {
    quotes: Vec<Quote>,
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl QuoteStore {
    /// Open the store, loading persisted quotes or seeding the defaults.
    ///
    /// A corrupt persisted payload falls back to the starter collection
    /// rather than failing the open.
    pub fn open(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Result<Self> {
        let quotes = match local.get(QUOTES_KEY)? {
            Some(payload) => match serde_json::from_str::<Vec<Quote>>(&payload) {
                Ok(quotes) => {
                    tracing::debug!("Loaded {} quotes from storage", quotes.len());
                    quotes
                }
                Err(error) => {
                    tracing::warn!("Stored quotes are unreadable ({error}), using defaults");
                    default_quotes()
                }
            },
            None => {
                let quotes = default_quotes();
                local.set(QUOTES_KEY, &serde_json::to_string(&quotes)?)?;
                tracing::info!("Seeded {} starter quotes", quotes.len());
                quotes
            }
        };

        Ok(Self {
            quotes,
            local,
            session,
        })
    }

    fn persist(&self) -> Result<()> {
        self.local
            .set(QUOTES_KEY, &serde_json::to_string(&self.quotes)?)
    }

    /// All quotes in canonical order.
    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Number of quotes in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    fn next_id(&self) -> QuoteId {
        let max = self
            .quotes
            .iter()
            .map(|quote| quote.id.value())
            .max()
            .unwrap_or(0);
        QuoteId::new(max + 1)
    }

    /// Add a new locally authored quote.
    ///
    /// Both fields are trimmed; an empty remainder fails validation.
    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote> {
        let text = text.trim();
        let category = category.trim();
        if text.is_empty() {
            return Err(Error::Validation("quote text must not be empty".to_string()));
        }
        if category.is_empty() {
            return Err(Error::Validation(
                "quote category must not be empty".to_string(),
            ));
        }

        let quote = Quote {
            id: self.next_id(),
            text: text.to_string(),
            category: category.to_string(),
            last_modified: Some(unix_timestamp_ms()),
            source: Some(QuoteSource::Local),
        };
        self.quotes.push(quote.clone());
        self.persist()?;
        Ok(quote)
    }

    /// Atomically replace the canonical collection.
    ///
    /// The in-memory swap happens before persistence, so memory stays
    /// authoritative even when the write fails.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        self.quotes = quotes;
        self.persist()
    }

    /// Distinct categories, sorted ascending.
    ///
    /// The synthetic "all" selector is [`CategoryFilter::All`], not a
    /// stored category.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|quote| quote.category.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// Quotes passing `filter`, order preserved.
    #[must_use]
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.quotes
            .iter()
            .filter(|quote| filter.matches(quote))
            .cloned()
            .collect()
    }

    /// Uniform random pick over the filtered collection.
    ///
    /// The picked quote is recorded as the session's last viewed quote; a
    /// session write failure is logged but does not fail the pick.
    pub fn random_quote(&self, filter: &CategoryFilter) -> Result<Quote> {
        let candidates = self.filtered(filter);
        let quote = random_from(&candidates)?.clone();

        match serde_json::to_string(&quote) {
            Ok(payload) => {
                if let Err(error) = self.session.set(LAST_VIEWED_KEY, &payload) {
                    tracing::warn!("Could not record last viewed quote: {error}");
                }
            }
            Err(error) => tracing::warn!("Could not serialize last viewed quote: {error}"),
        }

        Ok(quote)
    }

    /// Last quote viewed in this session, when one was recorded.
    #[must_use]
    pub fn last_viewed(&self) -> Option<Quote> {
        let payload = self.session.get(LAST_VIEWED_KEY).ok().flatten()?;
        serde_json::from_str(&payload).ok()
    }

    /// Persist the active category filter.
    pub fn set_selected_filter(&self, filter: &CategoryFilter) -> Result<()> {
        self.local.set(CATEGORY_FILTER_KEY, filter.as_str())
    }

    /// Restore the persisted category filter.
    ///
    /// A persisted category that no longer selects anything falls back to
    /// the "all" selector.
    #[must_use]
    pub fn selected_filter(&self) -> CategoryFilter {
        let Ok(Some(value)) = self.local.get(CATEGORY_FILTER_KEY) else {
            return CategoryFilter::All;
        };
        match CategoryFilter::parse(&value) {
            CategoryFilter::Category(category)
                if !self.categories().iter().any(|c| *c == category) =>
            {
                CategoryFilter::All
            }
            filter => filter,
        }
    }

    /// Unix-ms timestamp of the last committed sync, when any.
    #[must_use]
    pub fn last_sync_time(&self) -> Option<i64> {
        self.local
            .get(LAST_SYNC_KEY)
            .ok()
            .flatten()?
            .parse()
            .ok()
    }

    /// Record a committed sync timestamp.
    pub fn record_sync_time(&self, timestamp_ms: i64) -> Result<()> {
        self.local.set(LAST_SYNC_KEY, &timestamp_ms.to_string())
    }

    /// Apply a validated import batch.
    ///
    /// Entries without an id are assigned one (max existing + 1, counting
    /// up). Returns the number of records applied: everything for
    /// [`ImportMode::Replace`], only the non-duplicate remainder for
    /// [`ImportMode::Merge`] (dedup key: exact text + category pair).
    pub fn import(&mut self, entries: Vec<ImportedQuote>, mode: ImportMode) -> Result<usize> {
        let mut next_id = self
            .quotes
            .iter()
            .map(|quote| quote.id.value())
            .max()
            .unwrap_or(0);

        let imported: Vec<Quote> = entries
            .into_iter()
            .map(|entry| {
                let id = entry.id.map_or_else(
                    || {
                        next_id += 1;
                        QuoteId::new(next_id)
                    },
                    QuoteId::new,
                );
                Quote {
                    id,
                    text: entry.text,
                    category: entry.category,
                    last_modified: entry.last_modified,
                    source: entry.source,
                }
            })
            .collect();

        let applied = match mode {
            ImportMode::Replace => {
                let count = imported.len();
                self.quotes = imported;
                count
            }
            ImportMode::Merge => {
                let mut count = 0;
                for quote in imported {
                    let duplicate = self
                        .quotes
                        .iter()
                        .any(|q| q.text == quote.text && q.category == quote.category);
                    if !duplicate {
                        self.quotes.push(quote);
                        count += 1;
                    }
                }
                count
            }
        };

        self.persist()?;
        Ok(applied)
    }

    /// Snapshot of storage usage for display surfaces.
    #[must_use]
    pub fn storage_summary(&self) -> StorageSummary {
        let serialized_bytes = serde_json::to_string(&self.quotes).map_or(0, |payload| payload.len());
        StorageSummary {
            quote_count: self.quotes.len(),
            serialized_bytes,
            filter: self.selected_filter(),
            last_sync: self.last_sync_time(),
        }
    }
}
