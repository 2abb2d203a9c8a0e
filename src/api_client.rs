// Feed Client - Two-line record feeds over HTTP
// Fetches tracked-object records asynchronously; results are merged into a
// shared cache unless a newer request has superseded them.

use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::FeedConfig;
use crate::ephemeris_adapter::{parse_tle_text, TleRecord};
use crate::error::OrbitError;

// =============================================================================
// API CLIENT
// =============================================================================

pub struct TleFeedClient {
    url: String,
    client: reqwest::Client,
}

impl TleFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, OrbitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OrbitError::Feed(format!("Client setup failed: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the whole feed; no retries
    pub async fn fetch(&self) -> Result<Vec<TleRecord>, OrbitError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| OrbitError::Feed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OrbitError::Feed(format!(
                "Feed returned status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OrbitError::Feed(format!("Failed to read response: {}", e)))?;

        let records = parse_tle_text(&body);
        if records.is_empty() {
            return Err(OrbitError::Feed("No valid records in feed".to_string()));
        }
        info!("Fetched {} records from {}", records.len(), self.url);
        Ok(records)
    }
}

// =============================================================================
// REQUEST TICKETS
// =============================================================================

/// Handle for one in-flight fetch. The flag flips when a newer request
/// starts or the caller cancels; the result is then discarded on merge.
#[derive(Debug, Clone)]
pub struct FeedTicket {
    id: u64,
    superseded: Arc<AtomicBool>,
}

impl FeedTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_superseded(&self) -> bool {
        self.superseded.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.superseded.store(true, Ordering::Release);
    }
}

// =============================================================================
// CACHE MANAGER
// =============================================================================

pub struct FeedCache {
    records: RwLock<Vec<TleRecord>>,
    last_fetch: RwLock<Option<Instant>>,
    max_age: Duration,
    /// Bumped on every accepted merge
    generation: AtomicU64,
    next_ticket: AtomicU64,
    in_flight: Mutex<Option<FeedTicket>>,
}

impl FeedCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            last_fetch: RwLock::new(None),
            max_age,
            generation: AtomicU64::new(0),
            next_ticket: AtomicU64::new(1),
            in_flight: Mutex::new(None),
        }
    }

    /// Supersedes whatever request was still in flight
    pub fn begin_request(&self) -> FeedTicket {
        let ticket = FeedTicket {
            id: self.next_ticket.fetch_add(1, Ordering::Relaxed),
            superseded: Arc::new(AtomicBool::new(false)),
        };
        if let Some(previous) = self.in_flight.lock().replace(ticket.clone()) {
            previous.cancel();
        }
        ticket
    }

    /// Returns false when the ticket was superseded and nothing changed
    pub fn merge(&self, ticket: &FeedTicket, records: Vec<TleRecord>) -> bool {
        let mut in_flight = self.in_flight.lock();
        if ticket.is_superseded() {
            warn!("Dropping superseded feed result (request {})", ticket.id);
            return false;
        }
        if in_flight.as_ref().map(|t| t.id) == Some(ticket.id) {
            *in_flight = None;
        }

        let count = records.len();
        *self.records.write() = records;
        *self.last_fetch.write() = Some(Instant::now());
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!("Merged {} records (generation {})", count, generation);
        true
    }

    pub fn records(&self) -> Vec<TleRecord> {
        self.records.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Records newer than the generation the caller last consumed
    pub fn take_if_newer(&self, seen_generation: u64) -> Option<(u64, Vec<TleRecord>)> {
        let generation = self.generation();
        if generation > seen_generation {
            Some((generation, self.records()))
        } else {
            None
        }
    }

    pub fn is_fresh(&self) -> bool {
        match *self.last_fetch.read() {
            Some(last) => last.elapsed() < self.max_age,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600)) // 1 hour cache
    }
}

/// Starts a fetch on the runtime; resolves to whether the result was merged.
/// The ticket is taken before spawning so request order is call order.
pub fn spawn_refresh(
    client: Arc<TleFeedClient>,
    cache: Arc<FeedCache>,
) -> tokio::task::JoinHandle<Result<bool, OrbitError>> {
    let ticket = cache.begin_request();
    tokio::spawn(async move {
        let records = client.fetch().await?;
        Ok(cache.merge(&ticket, records))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> TleRecord {
        TleRecord::new(name, "1 00001U", "2 00001").unwrap()
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let cache = FeedCache::default();
        let first = cache.begin_request();
        let second = cache.begin_request();
        assert!(first.is_superseded());
        assert!(!second.is_superseded());

        assert!(!cache.merge(&first, vec![record("OLD")]));
        assert_eq!(cache.generation(), 0);
        assert!(cache.is_empty());

        assert!(cache.merge(&second, vec![record("NEW"), record("NEWER")]));
        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.is_fresh());
    }

    #[test]
    fn test_cancelled_request_is_dropped() {
        let cache = FeedCache::default();
        let ticket = cache.begin_request();
        ticket.cancel();
        assert!(!cache.merge(&ticket, vec![record("X")]));
        assert!(!cache.is_fresh());
    }

    #[test]
    fn test_take_if_newer() {
        let cache = FeedCache::default();
        assert!(cache.take_if_newer(0).is_none());
        let ticket = cache.begin_request();
        cache.merge(&ticket, vec![record("A")]);
        let (generation, records) = cache.take_if_newer(0).unwrap();
        assert_eq!(generation, 1);
        assert_eq!(records[0].name, "A");
        assert!(cache.take_if_newer(generation).is_none());
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        let cache = Arc::new(FeedCache::default());
        let slow = cache.begin_request();
        let fast = cache.begin_request();

        let fast_task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.merge(&fast, vec![record("FAST")]) })
        };
        let slow_task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cache.merge(&slow, vec![record("SLOW")])
            })
        };

        assert!(fast_task.await.unwrap());
        assert!(!slow_task.await.unwrap());
        assert_eq!(cache.records()[0].name, "FAST");
    }

    #[tokio::test]
    async fn test_unreachable_feed_reports_error() {
        let client = Arc::new(
            TleFeedClient::new(&FeedConfig {
                url: "http://127.0.0.1:9/tle.txt".to_string(),
                request_timeout_secs: 2,
            })
            .unwrap(),
        );
        let cache = Arc::new(FeedCache::default());
        let result = spawn_refresh(client, Arc::clone(&cache)).await.unwrap();
        assert!(matches!(result, Err(OrbitError::Feed(_))));
        assert_eq!(cache.generation(), 0);
    }
}
