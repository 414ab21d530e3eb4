//! Shared-credential Basic auth gate.

use super::{Flow, Middleware};
use crate::config::{BasicAuthConfig, Settings};
use crate::response::build_response_with_headers;
use async_trait::async_trait;
use base64::Engine;
use hyper::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::http::request::Parts;
use hyper::{HeaderMap, StatusCode};
use tracing::debug;

/// Whether `headers` carry `Authorization: Basic` for exactly `credentials`.
pub fn is_authorized(headers: &HeaderMap, credentials: &BasicAuthConfig) -> bool {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some((scheme, encoded)) = value.trim().split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }

    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };

    match decoded.split_once(':') {
        Some((user, pass)) => user == credentials.username && pass == credentials.password,
        None => false,
    }
}

/// Rejects requests without the configured credential.
pub struct CredentialGate;

#[async_trait]
impl Middleware for CredentialGate {
    fn name(&self) -> &'static str {
        "basic-auth"
    }

    async fn before(&self, head: &Parts, settings: &Settings) -> Flow {
        let Some(credentials) = settings.active_basic_auth() else {
            return Flow::Continue;
        };

        if is_authorized(&head.headers, credentials) {
            return Flow::Continue;
        }

        debug!(path = %head.uri.path(), "Rejecting request without valid credentials");
        Flow::Respond(build_response_with_headers(
            StatusCode::UNAUTHORIZED,
            [(WWW_AUTHENTICATE.as_str(), r#"Basic realm="mockit""#)],
            "Unauthorized",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;
    use serde_json::json;

    fn credentials() -> BasicAuthConfig {
        BasicAuthConfig {
            username: "dev".to_string(),
            password: "s3cret:with-colon".to_string(),
        }
    }

    fn basic(user_pass: &str) -> String {
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(user_pass)
        )
    }

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth.parse().unwrap());
        headers
    }

    #[test]
    fn test_valid_credentials() {
        let headers = headers_with(&basic("dev:s3cret:with-colon"));
        assert!(is_authorized(&headers, &credentials()));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let header = basic("dev:s3cret:with-colon").replacen("Basic", "basic", 1);
        assert!(is_authorized(&headers_with(&header), &credentials()));
    }

    #[test]
    fn test_rejections() {
        let creds = credentials();
        assert!(!is_authorized(&HeaderMap::new(), &creds));
        assert!(!is_authorized(&headers_with(&basic("dev:wrong")), &creds));
        assert!(!is_authorized(&headers_with(&basic("other:s3cret:with-colon")), &creds));
        assert!(!is_authorized(&headers_with("Bearer abc"), &creds));
        assert!(!is_authorized(&headers_with("Basic !!!not-base64"), &creds));
        assert!(!is_authorized(&headers_with(&basic("no-colon")), &creds));
    }

    fn settings(enabled: bool) -> Settings {
        serde_json::from_value(json!({
            "features": {"basicAuth": enabled},
            "basicAuth": {"username": "dev", "password": "s3cret:with-colon"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_gate_rejects_with_challenge() {
        let head = Request::builder().uri("/users").body(()).unwrap().into_parts().0;
        match CredentialGate.before(&head, &settings(true)).await {
            Flow::Respond(response) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
                assert_eq!(
                    response.headers().get(WWW_AUTHENTICATE).unwrap(),
                    r#"Basic realm="mockit""#
                );
            }
            Flow::Continue => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn test_gate_passes_when_disabled_or_authorized() {
        let anonymous = Request::builder().uri("/users").body(()).unwrap().into_parts().0;
        assert!(matches!(
            CredentialGate.before(&anonymous, &settings(false)).await,
            Flow::Continue
        ));

        let authorized = Request::builder()
            .uri("/users")
            .header(AUTHORIZATION, basic("dev:s3cret:with-colon"))
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert!(matches!(
            CredentialGate.before(&authorized, &settings(true)).await,
            Flow::Continue
        ));
    }
}
