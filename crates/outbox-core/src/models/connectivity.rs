use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One connectivity edge observed by an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityChange {
    pub is_online: bool,
    pub at: DateTime<Utc>,
}

impl ConnectivityChange {
    pub fn now(is_online: bool) -> Self {
        Self {
            is_online,
            at: Utc::now(),
        }
    }

    /// Offline → online. The edge that triggers a drain.
    pub fn is_restored(&self) -> bool {
        self.is_online
    }
}
