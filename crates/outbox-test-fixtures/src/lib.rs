//! Test doubles and fixture loading shared by the outbox crates.
//!
//! - `ScriptedTransport`: deterministic network with per-request scripts
//! - `UnavailableStore`: a queue whose every operation reports the store unavailable
//! - scenario JSON files under `test-fixtures/`

mod scripted_transport;
mod unavailable_store;

pub use scripted_transport::{ScriptedStep, ScriptedTransport};
pub use unavailable_store::UnavailableStore;

use std::path::PathBuf;
use std::sync::Arc;

use outbox_core::models::MutationSpec;
use outbox_storage::StorageEngine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root directory of the shared fixtures folder.
fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// A replay scenario: what gets queued, how the network answers, what a
/// single drain must leave behind.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScenario {
    pub name: String,
    pub mutations: Vec<FixtureMutation>,
    /// Answers keyed by `METHOD URL`, consumed in order.
    pub script: Vec<FixtureStep>,
    pub expected: ExpectedDrain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureMutation {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureStep {
    pub method: String,
    pub url: String,
    /// HTTP status to answer with; `None` means the network is unreachable.
    pub status: Option<u16>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedDrain {
    pub succeeded: usize,
    pub failed: usize,
    pub remaining: usize,
    pub sync_complete_count: usize,
}

impl FixtureMutation {
    pub fn to_spec(&self) -> MutationSpec {
        let spec = MutationSpec::new(&self.method, &self.url);
        match &self.body {
            Some(body) => spec.with_json(body),
            None => spec,
        }
    }
}

impl ReplayScenario {
    pub fn load(name: &str) -> Self {
        load_fixture(&format!("scenarios/{name}.json"))
    }

    /// A transport answering according to `script`.
    pub fn transport(&self) -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        for step in &self.script {
            let scripted = match step.status {
                Some(status) => ScriptedStep::status(status, step.body.as_deref().unwrap_or("{}")),
                None => ScriptedStep::unreachable(),
            };
            transport.script(&step.method, &step.url, scripted);
        }
        transport
    }
}

/// JSON write intent for `url`.
pub fn mutation(method: &str, url: &str) -> MutationSpec {
    MutationSpec::new(method, url).with_json(&serde_json::json!({ "name": "A" }))
}

/// A file-backed store in a fresh temp directory. Keep the `TempDir` alive.
pub fn temp_store() -> (tempfile::TempDir, Arc<StorageEngine>) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = StorageEngine::open(&dir.path().join("outbox.db"))
        .unwrap_or_else(|e| panic!("open store: {e}"));
    (dir, Arc::new(store))
}
