//! Configuration document for MockIt.
//!
//! The document is a single JSON file:
//!
//! ```json
//! {
//!   "routes": [ { "id": "...", "route": "/users", "httpMethod": "GET", ... } ],
//!   "settings": { "features": { "cors": true } }
//! }
//! ```
//!
//! It is always read and written as a whole.

mod de;
mod route;
mod settings;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use route::{
    is_catalogued, parse_status, Condition, ConditionResponse, HttpMethod, Route, RouteHeader,
    STATUS_CATALOG,
};
pub use settings::{BasicAuthConfig, ChaosMonkeyConfig, DelayConfig, Features, Settings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate route id '{0}'")]
    DuplicateRouteId(String),
    #[error("Route '{route}' has duplicate {kind} id '{id}'")]
    DuplicateNestedId {
        route: String,
        kind: &'static str,
        id: String,
    },
}

/// The whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = serde_json::from_str(contents)?;
        document.validate()?;
        Ok(document)
    }

    /// Serialize with four-space indentation, the format the editor writes.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Write the document, replacing the file in one rename.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.to_json_pretty()?;
        let tmp_path = path.with_extension("json.tmp");
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        std::fs::write(&tmp_path, contents).map_err(write_err)?;
        std::fs::rename(&tmp_path, path).map_err(write_err)
    }

    /// Identity checks only; field contents are checked when the route table
    /// is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut route_ids = HashSet::new();
        for route in &self.routes {
            if !route.id.is_empty() && !route_ids.insert(route.id.as_str()) {
                return Err(ConfigError::DuplicateRouteId(route.id.clone()));
            }

            let mut condition_ids = HashSet::new();
            let mut response_ids = HashSet::new();
            for condition in &route.conditions {
                if !condition.id.is_empty() && !condition_ids.insert(condition.id.as_str()) {
                    return Err(ConfigError::DuplicateNestedId {
                        route: route.label(),
                        kind: "condition",
                        id: condition.id.clone(),
                    });
                }
                for response in &condition.responses {
                    if !response.id.is_empty() && !response_ids.insert(response.id.as_str()) {
                        return Err(ConfigError::DuplicateNestedId {
                            route: route.label(),
                            kind: "response",
                            id: response.id.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
