//! Process-wide settings read by the middleware chain.

use super::de;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature switches under `settings.features`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub cors: bool,
    #[serde(default)]
    pub basic_auth: bool,
    #[serde(default)]
    pub delay: bool,
    #[serde(default)]
    pub chaos_monkey: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared credential for the Basic auth gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicAuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Global latency added to every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    #[serde(default, deserialize_with = "de::millis")]
    pub ms: u64,
}

fn default_chaos_probability() -> f64 {
    0.1
}

fn default_chaos_status_codes() -> Vec<String> {
    vec!["500".to_string()]
}

/// Random fault injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosMonkeyConfig {
    /// Chance in `[0, 1]` that a request is failed.
    #[serde(default = "default_chaos_probability")]
    pub probability: f64,
    /// Candidate statuses, one picked uniformly per injected fault.
    #[serde(
        default = "default_chaos_status_codes",
        deserialize_with = "de::string_or_number_vec"
    )]
    pub status_codes: Vec<String>,
}

impl Default for ChaosMonkeyConfig {
    fn default() -> Self {
        Self {
            probability: default_chaos_probability(),
            status_codes: default_chaos_status_codes(),
        }
    }
}

/// The `settings` object of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub features: Features,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaos_monkey: Option<ChaosMonkeyConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Credentials to enforce, when the gate is switched on and configured.
    pub fn active_basic_auth(&self) -> Option<&BasicAuthConfig> {
        if !self.features.basic_auth {
            return None;
        }
        self.basic_auth
            .as_ref()
            .filter(|auth| !auth.username.is_empty())
    }

    /// Global delay in milliseconds, when switched on and non-zero.
    pub fn active_delay_ms(&self) -> Option<u64> {
        if !self.features.delay {
            return None;
        }
        self.delay.as_ref().map(|d| d.ms).filter(|ms| *ms > 0)
    }

    /// Chaos configuration, when switched on. Falls back to defaults when
    /// the feature is on but no `chaosMonkey` block exists.
    pub fn active_chaos(&self) -> Option<ChaosMonkeyConfig> {
        if !self.features.chaos_monkey {
            return None;
        }
        Some(self.chaos_monkey.clone().unwrap_or_default())
    }

    /// Shallow merge: every top-level key in `patch` replaces the current one.
    pub fn merged(&self, patch: &Map<String, Value>) -> Result<Settings, serde_json::Error> {
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(current))
    }
}
