//! Remote quote gateway
//!
//! Talks to an append-only JSON collection (by default the public
//! jsonplaceholder `/posts` endpoint) and maps its records to quotes.
//! The mapping is deterministic and content-blind: `title` becomes the
//! quote text and `id mod 6` picks the category.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{QuoteError, Result};
use crate::models::Quote;

/// Categories assigned to remote records by `id mod 6`
pub const REMOTE_CATEGORIES: [&str; 6] =
    ["Motivation", "Life", "Wisdom", "Inspiration", "Success", "API"];

/// Maximum number of remote records kept per fetch
pub const MAX_FETCHED: usize = 20;

/// Maximum number of quotes sent per post
pub const MAX_POSTED: usize = 5;

/// Maximum characters of a remote title kept as quote text
pub const MAX_TEXT_CHARS: usize = 100;

/// Result of a fetch; `degraded` means the data is cached or built-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub quotes: Vec<Quote>,
    pub degraded: bool,
}

/// Source of remote quotes
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the remote set; never fails, degrades to cached or fallback data
    async fn fetch(&self) -> FetchOutcome;

    /// Send local quotes to the remote collection
    async fn post(&self, quotes: &[Quote]) -> Result<usize>;
}

/// Record shape returned by the remote collection
#[derive(Debug, Deserialize)]
struct RemoteRecord {
    id: i64,
    title: String,
}

/// Record shape sent to the remote collection
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct OutgoingRecord {
    title: String,
    body: String,
    user_id: u32,
}

/// HTTP implementation of [`RemoteGateway`]
pub struct HttpGateway {
    url: String,
    client: reqwest::Client,
    cache: Mutex<Option<Vec<Quote>>>,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotebook/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
            cache: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.remote_url.clone(), config.request_timeout())
    }

    async fn fetch_inner(&self) -> Result<Vec<Quote>> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(QuoteError::Network(format!(
                "server responded with {}",
                response.status()
            )));
        }

        let records: Vec<RemoteRecord> = response.json().await?;
        Ok(records
            .into_iter()
            .take(MAX_FETCHED)
            .map(|r| map_record(r.id, &r.title))
            .collect())
    }

    fn cached(&self) -> Option<Vec<Quote>> {
        self.cache.lock().ok().and_then(|cache| cache.clone())
    }

    fn remember(&self, quotes: &[Quote]) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(quotes.to_vec());
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn fetch(&self) -> FetchOutcome {
        debug!("Fetching remote quotes from {}", self.url);

        match self.fetch_inner().await {
            Ok(quotes) => {
                info!("Fetched {} remote quotes", quotes.len());
                self.remember(&quotes);
                FetchOutcome {
                    quotes,
                    degraded: false,
                }
            }
            Err(e) => {
                let quotes = match self.cached() {
                    Some(cached) => {
                        warn!("Remote fetch failed, using {} cached quotes: {}", cached.len(), e);
                        cached
                    }
                    None => {
                        warn!("Remote fetch failed, using fallback quotes: {}", e);
                        fallback_quotes()
                    }
                };
                FetchOutcome {
                    quotes,
                    degraded: true,
                }
            }
        }
    }

    async fn post(&self, quotes: &[Quote]) -> Result<usize> {
        let records: Vec<OutgoingRecord> = quotes.iter().take(MAX_POSTED).map(outgoing).collect();
        let count = records.len();

        debug!("Posting {} quotes to {}", count, self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&records)
            .send()
            .await
            .map_err(|e| {
                warn!("Posting quotes failed: {}", e);
                QuoteError::from(e)
            })?;

        if !response.status().is_success() {
            warn!("Posting quotes rejected with {}", response.status());
            return Err(QuoteError::Network(format!(
                "server responded with {}",
                response.status()
            )));
        }

        info!("Posted {} quotes", count);
        Ok(count)
    }
}

/// Map a remote record to a quote
pub fn map_record(id: i64, title: &str) -> Quote {
    let category = REMOTE_CATEGORIES[id.rem_euclid(REMOTE_CATEGORIES.len() as i64) as usize];
    Quote::new(truncate(title, MAX_TEXT_CHARS), category)
}

/// Cut `s` to `max_chars` characters, appending "..." when cut
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// Built-in set served when the remote is unreachable and nothing is cached
pub fn fallback_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The quote server is unreachable right now; these are offline quotes.",
            "API",
        ),
        Quote::new("Every sync starts with a single request.", "API"),
        Quote::new("Patience is also a form of action.", "API"),
    ]
}

fn outgoing(quote: &Quote) -> OutgoingRecord {
    OutgoingRecord {
        title: quote.text.clone(),
        body: format!("Category: {}", quote.category),
        user_id: 1,
    }
}
