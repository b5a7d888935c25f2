//! Shared collaborators for building data sources.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheStore;
use crate::client::Transport;
use crate::clock::{Clock, SystemClock};
use crate::fetch::{DataSource, SourceConfig};
use crate::messages::Locale;

/// Transport, cache, clock and locale shared by every source of a tracker.
#[derive(Clone)]
pub struct SourceContext {
    pub transport: Arc<dyn Transport>,
    pub cache: Option<Arc<dyn CacheStore>>,
    pub clock: Arc<dyn Clock>,
    pub locale: Locale,
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("cache", &self.cache.is_some())
            .field("locale", &self.locale)
            .finish()
    }
}

impl SourceContext {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: None,
            clock: Arc::new(SystemClock),
            locale: Locale::default(),
        }
    }

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

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Build a data source wired to this context.
    pub fn source<T>(&self, config: SourceConfig) -> DataSource<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let source = DataSource::new(config, Arc::clone(&self.transport))
            .with_clock(Arc::clone(&self.clock));
        match &self.cache {
            Some(cache) => source.with_cache(Arc::clone(cache)),
            None => source,
        }
    }
}
