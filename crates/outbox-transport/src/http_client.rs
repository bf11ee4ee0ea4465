//! HTTP transport with timeout, gzip, and optional retry with exponential backoff.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;

use outbox_core::config::TransportConfig;
use outbox_core::errors::TransportError;
use outbox_core::models::{CapturedResponse, OutboundRequest};
use outbox_core::traits::ITransport;

/// Blocking HTTP transport. The client is built once and reused.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .gzip(config.gzip);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder.build().map_err(|e| TransportError::InvalidRequest {
            reason: format!("client construction failed: {e}"),
        })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn send_once(&self, request: &OutboundRequest) -> Result<CapturedResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TransportError::InvalidRequest {
                reason: format!("method {}: {e}", request.method),
            }
        })?;
        let url = request.parsed_url()?;

        let mut req = self.client.request(method, url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            req = req.body(request.body.clone());
        }

        let resp = req.send().map_err(|e| self.classify(&request.url, e))?;
        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().map_err(|e| self.classify(&request.url, e))?;

        Ok(CapturedResponse {
            headers,
            ..CapturedResponse::new(status, body.to_vec())
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout_ms: self.config.timeout().as_millis() as u64,
            }
        } else if e.is_builder() {
            TransportError::InvalidRequest {
                reason: e.to_string(),
            }
        } else {
            TransportError::Unreachable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl ITransport for HttpTransport {
    /// Retries only when no response arrived. HTTP error statuses are
    /// returned to the caller untouched.
    fn send(&self, request: &OutboundRequest) -> Result<CapturedResponse, TransportError> {
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let max_backoff = Duration::from_millis(self.config.max_backoff_ms);
        let mut attempt = 0;

        loop {
            match self.send_once(request) {
                Ok(resp) => return Ok(resp),
                Err(e @ TransportError::InvalidRequest { .. }) => return Err(e),
                Err(e) if attempt >= self.config.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    tracing::debug!(
                        url = %request.url,
                        attempt,
                        max_retries = self.config.max_retries,
                        ?backoff,
                        error = %e,
                        "transport retry"
                    );
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(max_backoff);
                }
            }
        }
    }
}
