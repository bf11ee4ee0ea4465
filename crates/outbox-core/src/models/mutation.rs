use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{resource_key_of, OutboundRequest};

/// Everything needed to persist a write intent. The queue never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSpec {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// When the write was issued.
    pub timestamp: DateTime<Utc>,
}

impl MutationSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into().to_ascii_uppercase(),
            headers: BTreeMap::new(),
            body: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body plus the matching content type.
    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(value.to_string())
    }

    /// Capture an intercepted request for later replay.
    pub fn from_request(request: &OutboundRequest) -> Self {
        Self {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// A persisted write intent awaiting confirmation by the server.
///
/// Present in the store if and only if the server has not yet confirmed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMutation {
    /// Assigned at persistence time, strictly increasing, never reused.
    pub id: i64,
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    /// Failed replay attempts so far.
    pub retry_count: u32,
    /// Earliest time the next replay may be attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedMutation {
    /// Rebuild the exact recorded request.
    pub fn to_request(&self) -> OutboundRequest {
        OutboundRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            mode: Default::default(),
        }
    }

    /// Whether the backoff window (if any) has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.map_or(true, |at| at <= now)
    }

    /// The resource this mutation targets: scheme, host, and path without query.
    pub fn resource_key(&self) -> String {
        resource_key_of(&self.url)
    }

    pub fn summary(&self) -> MutationSummary {
        MutationSummary {
            id: self.id,
            url: self.url.clone(),
            method: self.method.clone(),
            timestamp: self.timestamp,
            retry_count: self.retry_count,
        }
    }
}

/// Queue entry without headers and body, safe to hand to any client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSummary {
    pub id: i64,
    pub url: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
}

/// A mutation removed from the queue without being confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub mutation: QueuedMutation,
    pub reason: String,
    pub dead_lettered_at: DateTime<Utc>,
}
