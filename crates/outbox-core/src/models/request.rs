use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::TransportError;

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    #[default]
    Fetch,
}

/// An outbound network call as seen at the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub mode: RequestMode,
}

impl OutboundRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: String::new(),
            mode: RequestMode::Fetch,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    /// A navigation request (document load).
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
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

    /// GET and HEAD have no side effects. Every other method mutates state.
    pub fn is_read(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn parsed_url(&self) -> Result<Url, TransportError> {
        Url::parse(&self.url).map_err(|e| TransportError::InvalidRequest {
            reason: format!("invalid url {}: {e}", self.url),
        })
    }

    /// Cache identity: method plus the full URL including query.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// `path` or `path?query`, the string matched against cache allow-lists.
    pub fn path_and_query(&self) -> Result<String, TransportError> {
        let url = self.parsed_url()?;
        Ok(match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        })
    }

    /// Whether the request targets `origin` (scheme, host, port).
    pub fn is_same_origin(&self, origin: &str) -> bool {
        match (self.parsed_url(), Url::parse(origin)) {
            (Ok(a), Ok(b)) => a.origin() == b.origin(),
            _ => false,
        }
    }
}

/// Resource identity of a URL: everything except query and fragment.
pub(crate) fn resource_key_of(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.split(['?', '#']).next().unwrap_or(raw).to_string(),
    }
}
