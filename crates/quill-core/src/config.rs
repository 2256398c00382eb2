//! Sync configuration

use std::time::Duration;

/// Default remote endpoint serving raw quote records.
pub const DEFAULT_SERVER_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Default periodic sync interval.
pub const SYNC_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default number of remote records taken per fetch.
pub const REMOTE_FETCH_LIMIT: usize = 8;

/// Configuration for server sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote endpoint returning a JSON array of `{id, title}` records
    pub server_url: String,
    /// Interval between scheduled sync attempts
    pub sync_interval: Duration,
    /// Number of remote records taken per fetch
    pub fetch_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            sync_interval: SYNC_INTERVAL,
            fetch_limit: REMOTE_FETCH_LIMIT,
        }
    }
}

impl SyncConfig {
    /// Use a different remote endpoint.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Use a different interval between scheduled syncs.
    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Take a different number of remote records per fetch.
    #[must_use]
    pub const fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }
}
