use serde::{Deserialize, Serialize};

use super::defaults;

/// Cache-intercepting worker configuration.
///
/// Each cache namespace is named `{prefix}-{generation}`. Only the current
/// generation of each namespace survives activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Prefix of the static-asset cache namespace.
    pub cache_prefix: String,
    /// Prefix of the read-endpoint cache namespace.
    pub api_cache_prefix: String,
    /// Generation tag of the static-asset cache.
    pub static_generation: String,
    /// Generation tag of the read-endpoint cache.
    pub api_generation: String,
    /// Assets pre-warmed during install. Any failure aborts the install.
    pub static_assets: Vec<String>,
    /// Regexes matched against `path + query` of API reads that may be cached.
    pub cacheable_api_patterns: Vec<String>,
    /// Path prefix identifying API calls.
    pub api_prefix: String,
    /// Page served to navigations when both cache and network miss.
    pub offline_page: String,
    /// Origin the worker serves; only same-origin assets are cached.
    pub origin: String,
    /// Entries held by the in-process cache tier.
    pub l1_capacity: u64,
    /// Lifetime of an in-process cache entry.
    pub l1_ttl_secs: u64,
}

impl WorkerConfig {
    /// Name of the current static-asset cache namespace.
    pub fn static_cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.static_generation)
    }

    /// Name of the current read-endpoint cache namespace.
    pub fn api_cache_name(&self) -> String {
        format!("{}-{}", self.api_cache_prefix, self.api_generation)
    }

    /// Every namespace that must survive activation.
    pub fn current_cache_names(&self) -> Vec<String> {
        vec![self.static_cache_name(), self.api_cache_name()]
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_prefix: defaults::DEFAULT_CACHE_PREFIX.to_string(),
            api_cache_prefix: defaults::DEFAULT_API_CACHE_PREFIX.to_string(),
            static_generation: defaults::DEFAULT_CACHE_GENERATION.to_string(),
            api_generation: defaults::DEFAULT_CACHE_GENERATION.to_string(),
            static_assets: defaults::DEFAULT_STATIC_ASSETS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cacheable_api_patterns: defaults::DEFAULT_CACHEABLE_API_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            api_prefix: defaults::DEFAULT_API_PREFIX.to_string(),
            offline_page: defaults::DEFAULT_OFFLINE_PAGE.to_string(),
            origin: defaults::DEFAULT_ORIGIN.to_string(),
            l1_capacity: defaults::DEFAULT_L1_CAPACITY,
            l1_ttl_secs: defaults::DEFAULT_L1_TTL_SECS,
        }
    }
}
