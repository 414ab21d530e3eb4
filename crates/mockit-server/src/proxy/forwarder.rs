//! Outbound relay to a route's `proxyUrl`.

use super::error::ProxyError;
use crate::response::{HttpResponse, VALUE_TRUE, X_MOCKIT_PROXY};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use hyper::{HeaderMap, Method, Response, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream answer, relayed to the caller unchanged.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxiedResponse {
    pub fn into_response(self) -> HttpResponse {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            // Framing is recomputed for the buffered body
            if name == TRANSFER_ENCODING
                || name == CONTENT_LENGTH
                || name == CONNECTION
                || name == "keep-alive"
            {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        headers.insert(X_MOCKIT_PROXY.clone(), VALUE_TRUE.clone());
        response
    }
}

/// Shared outbound client. Cheap to clone.
#[derive(Clone)]
pub struct ProxyForwarder {
    client: reqwest::Client,
}

impl ProxyForwarder {
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        // Requests go straight to the configured target, never through an
        // environment proxy
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self { client })
    }

    /// Send `method` to `target` with the caller's headers and body and wait
    /// for the full answer.
    pub async fn forward(
        &self,
        method: &Method,
        target: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ProxiedResponse, ProxyError> {
        let mut outbound = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if name == HOST || name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        debug!(method = %method, target = %target, "Forwarding request to proxy target");
        let start = Instant::now();

        let response = self
            .client
            .request(method.clone(), target)
            .headers(outbound)
            .body(body)
            .send()
            .await
            .map_err(|e| ProxyError::classify(target, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::classify(target, e))?;

        debug!(
            target = %target,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Proxy target responded"
        );

        Ok(ProxiedResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;

    #[tokio::test]
    async fn test_into_response_relays_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        headers.insert(TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert("x-upstream", "yes".parse().unwrap());

        let proxied = ProxiedResponse {
            status: StatusCode::IM_A_TEAPOT,
            headers,
            body: Bytes::from_static(br#"{"tea":true}"#),
        };

        let response = proxied.into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(response.headers().get("x-upstream").unwrap(), "yes");
        assert_eq!(response.headers().get(&X_MOCKIT_PROXY).unwrap(), "true");
        assert!(response.headers().get(TRANSFER_ENCODING).is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(br#"{"tea":true}"#));
    }

    #[tokio::test]
    async fn test_unreachable_target() {
        let forwarder = ProxyForwarder::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let err = forwarder
            .forward(&Method::GET, "http://127.0.0.1:9/", &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProxyError::Unreachable { .. } | ProxyError::Timeout { .. }
        ));
        assert!(err.status().is_server_error());
    }

    #[tokio::test]
    async fn test_invalid_target() {
        let forwarder = ProxyForwarder::new(DEFAULT_PROXY_TIMEOUT).unwrap();
        let err = forwarder
            .forward(&Method::GET, "not a url", &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
