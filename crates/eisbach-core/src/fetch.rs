//! Generic request lifecycle for one backend data source.
//!
//! A [`DataSource`] owns the state of one endpoint: its status
//! (`idle → loading → success | error`), the last successfully decoded value,
//! a rotating status message that runs while a request is in flight, and an
//! optional local cache with a time-to-live.
//!
//! Fetching never returns an error. Failures are recorded in the
//! [`FetchState`] and the previously held value is kept.
//!
//! Overlapping fetches on one source resolve as latest-request-wins: every
//! fetch takes a generation number and a response from an older generation
//! is discarded without touching state, cache, or the status ticker.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, CachedValue, read_cached, write_cached};
use crate::client::{Query, Transport, decode};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::messages::LOADING_INTERVAL;
use crate::rotating::{RestPolicy, RotatingMessages};

/// Static description of a data source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Human-readable name used in logs and error messages.
    pub name: String,
    /// Backend path, e.g. `/conditions/water`.
    pub endpoint: String,
    /// Cache freshness window. `None` disables caching.
    pub ttl: Option<Duration>,
    /// Cache key. `None` disables caching.
    pub cache_key: Option<String>,
    pub messages: Vec<String>,
    pub message_interval: Duration,
    pub rest: RestPolicy,
    /// Execute at most one successful fetch per session.
    pub fetch_once: bool,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            ttl: None,
            cache_key: None,
            messages: Vec::new(),
            message_interval: LOADING_INTERVAL,
            rest: RestPolicy::First,
            fetch_once: false,
        }
    }

    /// Persist results under `key` and serve them for `ttl`.
    #[must_use]
    pub fn cached(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.cache_key = Some(key.into());
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn messages(mut self, messages: Vec<String>, interval: Duration) -> Self {
        self.messages = messages;
        self.message_interval = interval;
        self
    }

    #[must_use]
    pub fn rest(mut self, rest: RestPolicy) -> Self {
        self.rest = rest;
        self
    }

    #[must_use]
    pub fn fetch_once(mut self, once: bool) -> Self {
        self.fetch_once = once;
        self
    }
}

/// Request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchStatus::Idle => "idle",
            FetchStatus::Loading => "loading",
            FetchStatus::Success => "success",
            FetchStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Observable state of a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub status: FetchStatus,
    /// Set only while `status` is [`FetchStatus::Error`].
    pub error_message: Option<String>,
    /// Last successfully fetched value.
    pub value: Option<T>,
    /// When `value` was fetched.
    pub fetched_at: Option<OffsetDateTime>,
    /// `value` predates the request currently in flight or the last failure.
    pub stale: bool,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            error_message: None,
            value: None,
            fetched_at: None,
            stale: false,
        }
    }
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

/// Whether a fresh cached value may satisfy a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Use,
    Bypass,
}

/// What a call to [`DataSource::fetch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetch-once source already fetched; nothing happened.
    Skipped,
    /// Served from a fresh cache entry without network.
    Cached,
    /// Fetched from the backend.
    Fresh,
    /// The request failed; the error is recorded in the state.
    Failed,
    /// A newer fetch started before this one finished; the response was dropped.
    Superseded,
}

impl FetchOutcome {
    /// Whether the source now holds a current value from this call.
    pub fn is_success(self) -> bool {
        matches!(self, FetchOutcome::Cached | FetchOutcome::Fresh)
    }
}

type Decoder<T> = fn(&str) -> Result<T>;

/// Tracks one in-flight request. Dropping it before [`finish`](Self::finish)
/// means the caller cancelled the fetch.
struct InFlight<'a, T> {
    source: &'a DataSource<T>,
    mine: u64,
    done: bool,
}

impl<T> InFlight<'_, T> {
    fn is_current(&self) -> bool {
        self.source.generation.load(Ordering::SeqCst) == self.mine
    }

    /// Release the ticker once the response is in hand.
    fn finish(mut self) {
        self.done = true;
        if self.is_current() {
            self.source.status.stop();
        }
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.done || !self.is_current() {
            return;
        }
        let source = self.source;
        source.status.stop();
        if source.config.fetch_once {
            source.fetched_once.store(false, Ordering::SeqCst);
        }
        debug!(source = %source.config.name, generation = self.mine, "Fetch cancelled");
        let message = format!("Request for {} was cancelled", source.config.name);
        source.state.send_modify(|state| {
            state.status = FetchStatus::Error;
            state.error_message = Some(message);
            state.stale = state.value.is_some();
        });
    }
}

/// Request lifecycle and held value for one endpoint.
pub struct DataSource<T> {
    config: SourceConfig,
    transport: Arc<dyn Transport>,
    cache: Option<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
    decoder: Decoder<T>,
    status: RotatingMessages,
    state: watch::Sender<FetchState<T>>,
    fetched_once: AtomicBool,
    generation: AtomicU64,
}

impl<T> fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.config.name)
            .field("endpoint", &self.config.endpoint)
            .field("status", &self.state.borrow().status)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> DataSource<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a source decoding response bodies as JSON `T`.
    pub fn new(config: SourceConfig, transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        let status = RotatingMessages::new(
            config.messages.clone(),
            config.message_interval,
            config.rest,
        );
        Self {
            config,
            transport,
            cache: None,
            clock: Arc::new(SystemClock),
            decoder: decode::<T>,
            status,
            state,
            fetched_once: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Use `cache` for sources configured with a cache key.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Decode response bodies with `decoder` instead of plain JSON `T`.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Decoder<T>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Last successfully fetched value.
    pub fn value(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// The rotating status message of this source.
    pub fn status(&self) -> &RotatingMessages {
        &self.status
    }

    /// Whether a fetch-once source has already fetched.
    pub fn has_fetched_once(&self) -> bool {
        self.fetched_once.load(Ordering::SeqCst)
    }

    /// Allow a fetch-once source to fetch again.
    pub fn reset_once(&self) {
        self.fetched_once.store(false, Ordering::SeqCst);
    }

    /// Record a failure that happened outside [`fetch`](Self::fetch).
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| {
            state.status = FetchStatus::Error;
            state.error_message = Some(message);
            state.stale = state.value.is_some();
        });
    }

    /// Fetch the endpoint with `query`.
    pub async fn fetch(&self, query: &Query, policy: CachePolicy) -> FetchOutcome {
        if self.config.fetch_once && self.fetched_once.swap(true, Ordering::SeqCst) {
            debug!(source = %self.config.name, "Already fetched, skipping");
            return FetchOutcome::Skipped;
        }

        if policy == CachePolicy::Use && self.serve_from_cache() {
            return FetchOutcome::Cached;
        }

        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.status = FetchStatus::Loading;
            state.error_message = None;
            state.stale = state.value.is_some();
        });
        self.status.start();
        let guard = InFlight {
            source: self,
            mine,
            done: false,
        };

        let result = match self.transport.get(&self.config.endpoint, query).await {
            Ok(body) => (self.decoder)(&body),
            Err(e) => Err(e),
        };

        if !guard.is_current() {
            debug!(source = %self.config.name, generation = mine, "Discarding superseded response");
            return FetchOutcome::Superseded;
        }
        guard.finish();

        match result {
            Ok(value) => {
                let now = self.clock.now();
                self.persist(&value);
                self.state.send_modify(|state| {
                    state.status = FetchStatus::Success;
                    state.error_message = None;
                    state.value = Some(value);
                    state.fetched_at = Some(now);
                    state.stale = false;
                });
                info!(source = %self.config.name, "Fetched");
                FetchOutcome::Fresh
            }
            Err(e) => {
                warn!(source = %self.config.name, error = %e, "Fetch failed");
                if self.config.fetch_once {
                    self.fetched_once.store(false, Ordering::SeqCst);
                }
                self.record_error(format!("Failed to fetch {}: {}", self.config.name, e));
                FetchOutcome::Failed
            }
        }
    }

    /// Serve a fresh cache entry. Returns `false` on miss, expiry, or cache error.
    fn serve_from_cache(&self) -> bool {
        let (Some(cache), Some(key), Some(ttl)) =
            (&self.cache, &self.config.cache_key, self.config.ttl)
        else {
            return false;
        };

        let entry = match read_cached::<T>(cache.as_ref(), key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return false,
            Err(e) => {
                warn!(source = %self.config.name, error = %e, "Cache read failed");
                return false;
            }
        };

        let now = self.clock.now_millis();
        if !entry.is_fresh(now, ttl) {
            debug!(source = %self.config.name, age = ?entry.age(now), "Cache entry expired");
            return false;
        }

        let fetched_at =
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(entry.timestamp) * 1_000_000)
                .ok();
        debug!(source = %self.config.name, "Serving cached value");
        // Supersede any request still in flight.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.stop();
        self.state.send_modify(|state| {
            state.status = FetchStatus::Success;
            state.error_message = None;
            state.value = Some(entry.value);
            state.fetched_at = fetched_at;
            state.stale = false;
        });
        true
    }

    fn persist(&self, value: &T) {
        let (Some(cache), Some(key)) = (&self.cache, &self.config.cache_key) else {
            return;
        };
        let entry = CachedValue::new(value, self.clock.now_millis());
        if let Err(e) = write_cached(cache.as_ref(), key, &entry) {
            warn!(source = %self.config.name, error = %e, "Cache write failed");
        }
    }
}
