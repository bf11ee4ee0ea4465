use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::response::{CapturedResponse, ResponseSource};

/// Last known-good response for one request identity in one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub namespace: String,
    /// `METHOD URL`, see `OutboundRequest::cache_key`.
    pub key: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_response(namespace: &str, key: &str, response: &CapturedResponse) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: Utc::now(),
        }
    }

    /// Replay the entry as a response served from cache.
    pub fn to_response(&self) -> CapturedResponse {
        CapturedResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            source: ResponseSource::Network,
        }
        .with_source(ResponseSource::Cache)
    }
}
