//! Remote quote source adapter

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{Quote, QuoteId, QuoteSource};
use crate::util::{capitalize_first, unix_timestamp_ms};

/// Abstract remote quote source.
///
/// Fetch failures propagate unchanged; retry is the scheduler's
/// responsibility, not the adapter's.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the current remote quote set.
    async fn fetch(&self) -> Result<Vec<Quote>>;
}

/// Raw record shape served by the remote endpoint.
#[derive(Debug, Deserialize)]
struct RemotePost {
    id: i64,
    title: String,
}

/// HTTP-backed fetcher normalizing remote posts into quotes.
pub struct HttpRemoteFetcher {
    client: reqwest::Client,
    server_url: String,
    fetch_limit: usize,
}

impl HttpRemoteFetcher {
    /// Build a fetcher for the configured endpoint.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            server_url: config.server_url.clone(),
            fetch_limit: config.fetch_limit,
        })
    }
}

#[async_trait]
impl RemoteFetcher for HttpRemoteFetcher {
    async fn fetch(&self) -> Result<Vec<Quote>> {
        let response = self.client.get(&self.server_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "server responded with status {}",
                response.status()
            )));
        }

        let posts = response.json::<Vec<RemotePost>>().await?;
        let now = unix_timestamp_ms();
        Ok(posts
            .into_iter()
            .take(self.fetch_limit)
            .map(|post| remote_quote(post, now))
            .collect())
    }
}

/// Map a raw remote record into the canonical quote shape.
fn remote_quote(post: RemotePost, now_ms: i64) -> Quote {
    Quote {
        id: QuoteId::new(post.id),
        text: format!("{}.", capitalize_first(&post.title)),
        category: category_for_id(post.id).to_string(),
        last_modified: Some(now_ms),
        source: Some(QuoteSource::Server),
    }
}

/// Deterministic category assignment for remote records.
#[must_use]
pub fn category_for_id(id: i64) -> &'static str {
    if id % 4 == 0 {
        "Technology"
    } else if id % 3 == 0 {
        "Philosophy"
    } else if id % 2 == 0 {
        "Wisdom"
    } else {
        "Innovation"
    }
}
