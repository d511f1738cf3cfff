//! Session configuration.

use clipforge_core::{ClipforgeError, Result};
use clipforge_render::{CacheConfig, CompositorConfig, WorkerConfig};
use serde::{Deserialize, Serialize};

/// Everything tunable about an editing session. Missing sections take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cache: CacheConfig,
    pub compositor: CompositorConfig,
    pub worker: WorkerConfig,
}

impl SessionConfig {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| ClipforgeError::Serialization(format!("Invalid session config: {}", e)))
    }
}
