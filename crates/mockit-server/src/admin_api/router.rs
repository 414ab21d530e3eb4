//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{routes, system};
use crate::middleware::{allow_any_origin, preflight_response};
use crate::response::{error_response, read_body, HttpResponse};
use crate::store::ConfigStore;
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use tracing::debug;

/// Main request router
pub async fn route_request<B>(req: Request<B>, store: &ConfigStore) -> HttpResponse
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (head, body) = req.into_parts();
    debug!("Admin API: {} {}", head.method, head.uri.path());

    if head.method == Method::OPTIONS {
        return preflight_response(&head.headers);
    }

    let body = match read_body(body).await {
        Ok(b) => b,
        Err(mut response) => {
            allow_any_origin(&mut response);
            return response;
        }
    };

    let mut response = match (&head.method, head.uri.path()) {
        (&Method::GET, "/health") => system::handle_health(),
        (&Method::GET, "/settings") => system::handle_get_settings(store),
        (&Method::POST, "/settings") => system::handle_update_settings(&body, store),
        (&Method::POST, "/reload") => system::handle_reload(store),

        (&Method::GET, "/route") => routes::handle_list(store),
        (&Method::POST, "/route") => routes::handle_create(&body, store),
        (&Method::PUT, "/route") => routes::handle_replace(&body, store),
        (&Method::DELETE, "/route") => routes::handle_delete(&body, store),

        _ => error_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    allow_any_origin(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDocument;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use serde_json::{json, Value};

    fn request(method: Method, path: &str, body: Value) -> Request<Full<Bytes>> {
        let body = if body.is_null() {
            Bytes::new()
        } else {
            Bytes::from(body.to_string())
        };
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_with_cors() {
        let store = ConfigStore::in_memory(ConfigDocument::default());
        let response = route_request(request(Method::GET, "/health", Value::Null), &store).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_preflight() {
        let store = ConfigStore::in_memory(ConfigDocument::default());
        let response = route_request(request(Method::OPTIONS, "/route", Value::Null), &store).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key("access-control-allow-methods"));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let store = ConfigStore::in_memory(ConfigDocument::default());
        let response = route_request(request(Method::GET, "/routes", Value::Null), &store).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = route_request(request(Method::PATCH, "/route", Value::Null), &store).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_route_body_is_rejected() {
        let store = ConfigStore::in_memory(ConfigDocument::default());
        let huge = json!({
            "route": "/big",
            "httpMethod": "GET",
            "statusCode": 200,
            "delay": 0,
            "payload": "x".repeat(crate::response::MAX_BODY_BYTES)
        });

        let response = route_request(request(Method::POST, "/route", huge), &store).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        assert!(store.snapshot().document.routes.is_empty());
    }

    #[tokio::test]
    async fn test_route_lifecycle() {
        let store = ConfigStore::in_memory(ConfigDocument::default());
        let new_route = json!({
            "route": "/ping",
            "httpMethod": "GET",
            "statusCode": 200,
            "delay": 0,
            "payload": "pong"
        });

        let response = route_request(request(Method::POST, "/route", new_route), &store).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = store.snapshot().document.routes[0].id.clone();

        let response = route_request(request(Method::GET, "/route", Value::Null), &store).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed[0]["id"], json!(id));
        assert_eq!(listed[0]["statusCode"], json!("200"));

        let response =
            route_request(request(Method::DELETE, "/route", json!({"id": id})), &store).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.snapshot().document.routes.is_empty());
    }
}
