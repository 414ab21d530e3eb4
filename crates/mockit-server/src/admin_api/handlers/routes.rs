//! Route management handlers.

use crate::admin_api::types::{
    missing_route_keys, parse_json, store_error_response, DeleteRouteRequest,
};
use crate::config::Route;
use crate::response::{build_response, error_response, json_response, HttpResponse};
use crate::store::{ConfigStore, StoreError};
use hyper::StatusCode;
use serde_json::{Map, Value};
use tracing::info;

/// GET /route - All routes, disabled ones included
pub fn handle_list(store: &ConfigStore) -> HttpResponse {
    json_response(StatusCode::OK, &store.snapshot().document.routes)
}

/// POST /route - Append a route under a fresh id
pub fn handle_create(body: &[u8], store: &ConfigStore) -> HttpResponse {
    let mut fields = match route_fields(body, false) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    // An id in the body wins over the generated one
    if !fields.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty()) {
        fields.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }

    let route = match into_route(fields) {
        Ok(route) => route,
        Err(response) => return response,
    };

    let created = route.clone();
    match store.update(move |doc| {
        doc.routes.push(route);
        Ok(())
    }) {
        Ok(()) => {
            info!(route_id = %created.id, "Created route {}", created.label());
            json_response(StatusCode::CREATED, &created)
        }
        Err(e) => store_error_response(&e),
    }
}

/// PUT /route - Replace the route with the same id, keeping its position
pub fn handle_replace(body: &[u8], store: &ConfigStore) -> HttpResponse {
    let route = match route_fields(body, true).and_then(into_route) {
        Ok(route) => route,
        Err(response) => return response,
    };

    let id = route.id.clone();
    let label = route.label();
    match store.update(move |doc| {
        let slot = doc
            .routes
            .iter_mut()
            .find(|r| r.id == route.id)
            .ok_or_else(|| StoreError::RouteNotFound(route.id.clone()))?;
        *slot = route;
        Ok(())
    }) {
        Ok(()) => {
            info!(route_id = %id, "Replaced route {}", label);
            build_response(StatusCode::NO_CONTENT, "")
        }
        Err(e) => store_error_response(&e),
    }
}

/// DELETE /route - Remove the route named by `{"id": ...}`
pub fn handle_delete(body: &[u8], store: &ConfigStore) -> HttpResponse {
    let request: DeleteRouteRequest = match parse_json(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let Some(id) = request.id.filter(|id| !id.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing route id");
    };

    let result = store.update(|doc| {
        let index = doc
            .routes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::RouteNotFound(id.clone()))?;
        Ok(doc.routes.remove(index))
    });

    match result {
        Ok(removed) => {
            info!(route_id = %id, "Deleted route {}", removed.label());
            build_response(StatusCode::NO_CONTENT, "")
        }
        Err(e) => store_error_response(&e),
    }
}

fn route_fields(body: &[u8], require_id: bool) -> Result<Map<String, Value>, HttpResponse> {
    let fields: Map<String, Value> = parse_json(body)?;
    let missing = missing_route_keys(&fields, require_id);
    if !missing.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            &format!("Missing required route fields: {}", missing.join(", ")),
        ));
    }
    Ok(fields)
}

fn into_route(fields: Map<String, Value>) -> Result<Route, HttpResponse> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| {
        store_error_response(&StoreError::InvalidRoute(e.to_string()))
    })
}
