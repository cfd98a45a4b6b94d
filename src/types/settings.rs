use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::BoundaryPolicy;

/// Top-level configuration for a tab editing deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabsSettings {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    "course_tabs.db".to_string()
}

impl Default for TabsSettings {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            boundary_policy: BoundaryPolicy::default(),
            database_path: default_database_path(),
        }
    }
}

/// How the sync client reaches the handler and retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub handler_base_url: String,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            handler_base_url: "http://localhost:8001".to_string(),
            request_timeout_ms: 5_000,
            max_retries: 3,
            initial_backoff_ms: 250,
            backoff_multiplier: 2,
        }
    }
}

impl SyncSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}
