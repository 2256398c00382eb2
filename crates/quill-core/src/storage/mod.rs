//! String-valued key-value storage.
//!
//! The quote collection, the category filter, and sync bookkeeping all
//! persist as string values by key: a durable local store plus a
//! shorter-lived session store, both injected into the [`QuoteStore`].
//!
//! [`QuoteStore`]: crate::store::QuoteStore

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key for the serialized quote collection in the local store.
pub const QUOTES_KEY: &str = "quotes";

/// Key for the persisted category filter selection.
pub const CATEGORY_FILTER_KEY: &str = "selectedCategory";

/// Key for the last committed sync timestamp (Unix ms).
pub const LAST_SYNC_KEY: &str = "lastSyncTime";

/// Key for the last viewed quote in the session store.
pub const LAST_VIEWED_KEY: &str = "lastViewedQuote";

/// Trait for string-valued key-value storage.
///
/// Write failures (quota exhaustion, unwritable files) surface as
/// [`Error::Storage`](crate::Error::Storage).
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
