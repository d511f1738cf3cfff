//! Project serialization with versioning and migration.
//!
//! Uses JSON with a schema version field. The engine performs no I/O; callers
//! hand bytes in and out. Loading validates the timeline, so a structurally
//! corrupt document is a blocking error.

use clipforge_core::{ClipforgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::project::Project;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned project file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version for migration.
    pub version: u32,
    pub project: Project,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl ProjectFile {
    pub fn new(project: Project) -> Self {
        Self {
            version: CURRENT_VERSION,
            project,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ClipforgeError::Serialization(format!("Failed to serialize project: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ClipforgeError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        if version > CURRENT_VERSION {
            warn!(version, supported = CURRENT_VERSION, "refusing newer project file");
            return Err(ClipforgeError::Serialization(format!(
                "Project file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;

        let file: Self = serde_json::from_value(migrated)
            .map_err(|e| ClipforgeError::Serialization(format!("Failed to parse project: {}", e)))?;
        debug!(
            project = %file.project.id,
            tracks = file.project.timeline.tracks().len(),
            duration = file.project.duration(),
            "project loaded"
        );
        Ok(file)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 → v1: the whole document is the bare project
                if data.get("version").is_none() {
                    data = serde_json::json!({
                        "version": 1,
                        "project": data,
                        "app_version": "0.0.0",
                    });
                } else {
                    data["version"] = serde_json::json!(1);
                }
                version = 1;
            }
            _ => {
                return Err(ClipforgeError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
