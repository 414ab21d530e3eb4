//! Response construction helpers shared by the mock and admin listeners.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

pub type HttpResponse = Response<Full<Bytes>>;

// MockIt diagnostic headers
pub static X_MOCKIT_FAULT: HeaderName = HeaderName::from_static("x-mockit-fault");
pub static X_MOCKIT_PROXY: HeaderName = HeaderName::from_static("x-mockit-proxy");
pub static X_MOCKIT_PROXY_ERROR: HeaderName = HeaderName::from_static("x-mockit-proxy-error");

pub static VALUE_TRUE: HeaderValue = HeaderValue::from_static("true");
pub static VALUE_CHAOS: HeaderValue = HeaderValue::from_static("chaos");

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Largest request body either listener buffers, in bytes.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Build a response with the given status and body.
///
/// Falls back to a bare 500 if the builder rejects its input, which cannot
/// happen for a valid `StatusCode`.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| internal_error())
}

/// Build a response with headers. Invalid header pairs are dropped.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> HttpResponse {
    let mut response = build_response(status, body);
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_ref().as_bytes()),
            HeaderValue::from_str(value.as_ref()),
        ) {
            response.headers_mut().append(name, value);
        }
    }
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    build_response_with_headers(status, [(CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)], json)
}

/// `{"error": "..."}` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Response for a payload authored in the configuration.
///
/// Strings go out as plain text, `null` as an empty body, everything else
/// as compact JSON.
pub fn payload_response(status: StatusCode, payload: &Value) -> HttpResponse {
    match payload {
        Value::Null => build_response(status, Bytes::new()),
        Value::String(text) => build_response_with_headers(
            status,
            [(CONTENT_TYPE.as_str(), TEXT_CONTENT_TYPE)],
            text.clone(),
        ),
        other => json_response(status, other),
    }
}

/// Default response for requests no route claims.
pub fn not_found(method: &Method, path: &str) -> HttpResponse {
    build_response_with_headers(
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE.as_str(), TEXT_CONTENT_TYPE)],
        format!("Cannot {method} {path}"),
    )
}

/// Buffer a request body of at most [`MAX_BODY_BYTES`].
///
/// Answers `413` once the limit is crossed and `400` when the body cannot
/// be read, without buffering past the limit.
pub async fn read_body<B>(body: B) -> Result<Bytes, HttpResponse>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
        )),
        Err(e) => Err(error_response(
            StatusCode::BAD_REQUEST,
            &format!("Failed to read request body: {e}"),
        )),
    }
}

fn internal_error() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
