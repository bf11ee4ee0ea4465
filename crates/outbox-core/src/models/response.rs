use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFERRED_STATUS, SOURCE_HEADER, UNAVAILABLE_STATUS};

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Stored cache entry.
    Cache,
    /// Write could not reach the network and was queued for replay.
    Deferred,
    /// Network unreachable and nothing usable in the cache.
    Unavailable,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Deferred => "deferred",
            Self::Unavailable => "unavailable",
        }
    }
}

/// A complete HTTP response (status, headers, body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl CapturedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
            source: ResponseSource::Network,
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string()).with_header("content-type", "application/json")
    }

    pub fn text(status: u16, text: &str) -> Self {
        Self::new(status, text.as_bytes().to_vec()).with_header("content-type", "text/plain")
    }

    /// Response to a write that was persisted for replay.
    pub fn deferred(queued_id: i64) -> Self {
        Self::json(
            DEFERRED_STATUS,
            &serde_json::json!({
                "error": "Offline - request queued for sync",
                "queued": true,
                "offline": true,
                "id": queued_id,
            }),
        )
        .with_source(ResponseSource::Deferred)
    }

    /// Response to a cacheable read with no live network and no cache entry.
    pub fn no_cached_data() -> Self {
        Self::json(
            UNAVAILABLE_STATUS,
            &serde_json::json!({
                "error": "Offline - no cached data available",
                "offline": true,
            }),
        )
        .with_source(ResponseSource::Unavailable)
    }

    /// Response to a static asset with no network and no cache entry.
    pub fn offline() -> Self {
        Self::text(UNAVAILABLE_STATUS, "Offline").with_source(ResponseSource::Unavailable)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Tag the response with its source, both in the struct and as a header.
    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self.headers
            .insert(SOURCE_HEADER.to_string(), source.as_str().to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_deferred(&self) -> bool {
        self.source == ResponseSource::Deferred
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
