use std::time::Duration;

/// The second-level cache eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CacheKind {
    /// Entries expire after a configured lifetime and are swept periodically.
    #[default]
    Ttl,
    /// Bounded capacity with least-recently-accessed eviction.
    Lru,
}

/// Engine configuration: plain typed key/values, no file format of its own.
///
/// ```
/// use oxoom::{CacheKind, OomConfig};
/// use std::time::Duration;
///
/// let config = OomConfig::default()
///     .with_cache_kind(CacheKind::Lru)
///     .with_lru_capacity(1024);
/// assert!(config.cache_enabled());
/// assert_eq!(config.ttl(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct OomConfig {
    cache_enabled: bool,
    cache_kind: CacheKind,
    ttl: Duration,
    sweep_interval: Duration,
    lru_capacity: usize,
    ignore_inferred_value_removal: bool,
    default_language: Option<String>,
}

impl Default for OomConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_kind: CacheKind::Ttl,
            ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(1),
            lru_capacity: 65_536,
            ignore_inferred_value_removal: false,
            default_language: None,
        }
    }
}

impl OomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cache_enabled(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }

    #[must_use]
    pub fn with_cache_kind(mut self, cache_kind: CacheKind) -> Self {
        self.cache_kind = cache_kind;
        self
    }

    /// Lifetime of a cached entity under the TTL policy.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// How often expired TTL entries are swept.
    #[must_use]
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    #[must_use]
    pub fn with_lru_capacity(mut self, lru_capacity: usize) -> Self {
        self.lru_capacity = lru_capacity;
        self
    }

    /// When set, merging an attribute whose values are inferred silently keeps the stored
    /// values instead of failing the merge.
    #[must_use]
    pub fn with_ignore_inferred_value_removal(mut self, ignore: bool) -> Self {
        self.ignore_inferred_value_removal = ignore;
        self
    }

    /// Language tag applied when saving plain string values of attributes that declare no
    /// language of their own.
    #[must_use]
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = Some(language.into());
        self
    }

    #[inline]
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    #[inline]
    pub fn cache_kind(&self) -> CacheKind {
        self.cache_kind
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[inline]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    #[inline]
    pub fn lru_capacity(&self) -> usize {
        self.lru_capacity
    }

    #[inline]
    pub fn ignore_inferred_value_removal(&self) -> bool {
        self.ignore_inferred_value_removal
    }

    #[inline]
    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }
}
