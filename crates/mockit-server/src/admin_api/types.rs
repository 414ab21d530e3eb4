//! Request types and helpers for the admin API.

use crate::config::ConfigError;
use crate::response::{error_response, HttpResponse};
use crate::store::StoreError;
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys a route body must carry, in addition to `id` on replace.
pub const REQUIRED_ROUTE_KEYS: [&str; 5] =
    ["route", "httpMethod", "statusCode", "delay", "payload"];

/// Body of `DELETE /route`.
#[derive(Debug, Deserialize)]
pub struct DeleteRouteRequest {
    #[serde(default)]
    pub id: Option<String>,
}

/// Parse a JSON body, answering `400` on failure.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpResponse> {
    serde_json::from_slice(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {e}"))
    })
}

/// Names of required keys missing from a route body. `null` counts as
/// present; only absent keys are reported.
pub fn missing_route_keys(body: &Map<String, Value>, require_id: bool) -> Vec<&'static str> {
    let id = require_id.then_some("id");
    REQUIRED_ROUTE_KEYS
        .iter()
        .copied()
        .chain(id)
        .filter(|key| !body.contains_key(*key))
        .collect()
}

/// Map a store failure to the status the caller sees.
pub fn store_error_response(err: &StoreError) -> HttpResponse {
    let status = match err {
        StoreError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidRoute(_) | StoreError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
        StoreError::Config(ConfigError::Read { .. } | ConfigError::Write { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        StoreError::Config(_) => StatusCode::BAD_REQUEST,
    };
    error_response(status, &err.to_string())
}
