use super::{Flow, Middleware};
use crate::config::Settings;
use crate::response::{build_response, HttpResponse};
use async_trait::async_trait;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_LENGTH, VARY,
};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, StatusCode};

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Permissive CORS for every origin.
pub struct Cors;

/// Answer to an `OPTIONS` preflight. Requested headers are echoed back.
pub fn preflight_response(request_headers: &HeaderMap) -> HttpResponse {
    let mut response = build_response(StatusCode::NO_CONTENT, "");
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

pub fn allow_any_origin(response: &mut HttpResponse) {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

#[async_trait]
impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn before(&self, head: &Parts, settings: &Settings) -> Flow {
        if settings.features.cors && head.method == Method::OPTIONS {
            return Flow::Respond(preflight_response(&head.headers));
        }
        Flow::Continue
    }

    fn after(&self, _head: &Parts, settings: &Settings, response: &mut HttpResponse) {
        if settings.features.cors {
            allow_any_origin(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;
    use serde_json::json;

    fn settings(cors: bool) -> Settings {
        serde_json::from_value(json!({"features": {"cors": cors}})).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_answered_when_enabled() {
        let head = Request::builder()
            .method(Method::OPTIONS)
            .uri("/users")
            .header(ACCESS_CONTROL_REQUEST_HEADERS, "x-custom, content-type")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        match Cors.before(&head, &settings(true)).await {
            Flow::Respond(response) => {
                assert_eq!(response.status(), StatusCode::NO_CONTENT);
                let headers = response.headers();
                assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
                assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), ALLOWED_METHODS);
                assert_eq!(
                    headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
                    "x-custom, content-type"
                );
            }
            Flow::Continue => panic!("expected preflight response"),
        }
    }

    #[tokio::test]
    async fn test_options_passes_through_when_disabled() {
        let head = Request::builder()
            .method(Method::OPTIONS)
            .uri("/users")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert!(matches!(
            Cors.before(&head, &settings(false)).await,
            Flow::Continue
        ));
    }

    #[test]
    fn test_after_sets_origin_only_when_enabled() {
        let head = Request::builder().uri("/").body(()).unwrap().into_parts().0;

        let mut response = build_response(StatusCode::OK, "");
        Cors.after(&head, &settings(true), &mut response);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

        let mut response = build_response(StatusCode::OK, "");
        Cors.after(&head, &settings(false), &mut response);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
