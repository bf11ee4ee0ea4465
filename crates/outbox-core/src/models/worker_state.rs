use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Pre-warming static assets.
    Installing,
    /// Installed; another generation still controls clients.
    Waiting,
    /// Intercepting requests and draining the queue.
    Active,
    /// Replaced or failed to install. Never leaves this state.
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}
