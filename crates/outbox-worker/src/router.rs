//! Request classification.

use regex::RegexSet;

use outbox_core::config::WorkerConfig;
use outbox_core::errors::ConfigError;
use outbox_core::models::OutboundRequest;

/// Fetch strategy chosen for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRoute {
    /// Any method with side effects. Network, else persist and defer.
    Mutation,
    /// Allow-listed API read. Network first, cache fallback.
    CacheableApi,
    /// API read outside the allow-list. Network only, never cached.
    ApiPassthrough,
    /// Everything else. Cache first, network fallback.
    StaticAsset,
}

impl RequestRoute {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mutation => "mutation",
            Self::CacheableApi => "cacheable_api",
            Self::ApiPassthrough => "api_passthrough",
            Self::StaticAsset => "static_asset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    api_prefix: String,
    cacheable: RegexSet,
}

impl Router {
    pub fn new(api_prefix: impl Into<String>, patterns: &[String]) -> Result<Self, ConfigError> {
        let cacheable = RegexSet::new(patterns).map_err(|e| ConfigError::ValidationFailed {
            field: "worker.cacheable_api_patterns".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            api_prefix: api_prefix.into(),
            cacheable,
        })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, ConfigError> {
        Self::new(config.api_prefix.clone(), &config.cacheable_api_patterns)
    }

    pub fn route(&self, request: &OutboundRequest) -> RequestRoute {
        if !request.is_read() {
            return RequestRoute::Mutation;
        }
        // Unparseable URLs never reach the API branches.
        let Ok(target) = request.path_and_query() else {
            return RequestRoute::StaticAsset;
        };
        if !target.starts_with(&self.api_prefix) {
            return RequestRoute::StaticAsset;
        }
        if self.cacheable.is_match(&target) {
            RequestRoute::CacheableApi
        } else {
            RequestRoute::ApiPassthrough
        }
    }
}
