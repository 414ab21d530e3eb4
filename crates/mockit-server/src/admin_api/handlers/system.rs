//! System handlers: health, settings, reload.

use crate::admin_api::types::{parse_json, store_error_response};
use crate::response::{build_response, json_response, HttpResponse};
use crate::store::{ConfigStore, StoreError};
use hyper::StatusCode;
use serde_json::{Map, Value};
use tracing::info;

/// GET /health
pub fn handle_health() -> HttpResponse {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /settings
pub fn handle_get_settings(store: &ConfigStore) -> HttpResponse {
    json_response(StatusCode::OK, &store.snapshot().document.settings)
}

/// POST /settings - Shallow merge: each top-level key in the body replaces
/// the stored value for that key.
pub fn handle_update_settings(body: &[u8], store: &ConfigStore) -> HttpResponse {
    let patch: Map<String, Value> = match parse_json(body) {
        Ok(patch) => patch,
        Err(response) => return response,
    };

    let result = store.update(|doc| {
        doc.settings = doc
            .settings
            .merged(&patch)
            .map_err(|e| StoreError::InvalidSettings(e.to_string()))?;
        Ok(())
    });

    match result {
        Ok(()) => {
            let keys: Vec<&str> = patch.keys().map(String::as_str).collect();
            info!(keys = ?keys, "Updated settings");
            build_response(StatusCode::NO_CONTENT, "")
        }
        Err(e) => store_error_response(&e),
    }
}

/// POST /reload - Re-read the configuration file
pub fn handle_reload(store: &ConfigStore) -> HttpResponse {
    match store.reload() {
        Ok(()) => build_response(StatusCode::NO_CONTENT, ""),
        Err(e) => store_error_response(&e),
    }
}
