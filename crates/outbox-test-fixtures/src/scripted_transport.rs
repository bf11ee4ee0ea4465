use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use outbox_core::errors::TransportError;
use outbox_core::models::{CapturedResponse, OutboundRequest};
use outbox_core::traits::ITransport;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    Respond(CapturedResponse),
    Unreachable,
    Timeout,
}

impl ScriptedStep {
    pub fn status(status: u16, body: &str) -> Self {
        Self::Respond(
            CapturedResponse::new(status, body.as_bytes().to_vec())
                .with_header("content-type", "application/json"),
        )
    }

    pub fn unreachable() -> Self {
        Self::Unreachable
    }
}

/// Deterministic in-process network.
///
/// Requests consume scripted steps keyed by `METHOD URL`; once a key's script
/// runs out, the fallback step answers (200 `{}` unless changed). While
/// `set_online(false)`, every request fails as unreachable.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedStep>>>,
    fallback: Mutex<ScriptedStep>,
    online: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<OutboundRequest>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: Mutex::new(ScriptedStep::status(200, "{}")),
            online: AtomicBool::new(true),
            delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue one answer for `METHOD URL`.
    pub fn script(&self, method: &str, url: &str, step: ScriptedStep) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(format!("{} {url}", method.to_ascii_uppercase()))
            .or_default()
            .push_back(step);
        self
    }

    pub fn set_fallback(&self, step: ScriptedStep) {
        *self.fallback.lock().unwrap() = step;
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Hold every request this long before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `METHOD URL` of every request, in arrival order.
    pub fn call_keys(&self) -> Vec<String> {
        self.calls().iter().map(OutboundRequest::cache_key).collect()
    }

    /// Block until at least `n` requests arrived. Returns false on timeout.
    pub fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.call_count() >= n {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.call_count() >= n
    }
}

impl ITransport for ScriptedTransport {
    fn send(&self, request: &OutboundRequest) -> Result<CapturedResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason: "offline".to_string(),
            });
        }

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.cache_key())
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());

        match step {
            ScriptedStep::Respond(resp) => Ok(resp),
            ScriptedStep::Unreachable => Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason: "connection refused".to_string(),
            }),
            ScriptedStep::Timeout => Err(TransportError::Timeout {
                url: request.url.clone(),
                timeout_ms: 30_000,
            }),
        }
    }
}
