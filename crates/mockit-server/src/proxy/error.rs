use crate::response::{
    build_response_with_headers, HttpResponse, X_MOCKIT_PROXY_ERROR,
};
use hyper::header::CONTENT_TYPE;
use hyper::StatusCode;

/// Why a proxied request produced no upstream response.
///
/// A non-2xx answer from the upstream is not an error: it is relayed as is.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to build proxy client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Invalid proxy target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Proxy target '{target}' timed out")]
    Timeout { target: String },
    #[error("Proxy target '{target}' is unreachable: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body from '{target}': {source}")]
    Body {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProxyError {
    pub(crate) fn classify(target: &str, err: reqwest::Error) -> Self {
        let target = target.to_string();
        if err.is_timeout() {
            ProxyError::Timeout { target }
        } else if err.is_builder() {
            ProxyError::InvalidTarget {
                target,
                source: err,
            }
        } else if err.is_body() || err.is_decode() {
            ProxyError::Body {
                target,
                source: err,
            }
        } else {
            ProxyError::Unreachable {
                target,
                source: err,
            }
        }
    }

    /// Status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let body = serde_json::json!({ "error": format!("Proxy error: {self}") });
        build_response_with_headers(
            self.status(),
            [
                (CONTENT_TYPE.as_str(), "application/json; charset=utf-8"),
                (X_MOCKIT_PROXY_ERROR.as_str(), "true"),
            ],
            body.to_string(),
        )
    }
}
