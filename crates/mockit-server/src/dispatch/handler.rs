//! Per-route request handling.

use super::condition::{evaluate, serialize_body, MatchedCondition};
use crate::config::{parse_status, Route};
use crate::proxy::ProxyForwarder;
use crate::response::{payload_response, HttpResponse};
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Which of the three response paths a request takes.
#[derive(Debug, Clone, Copy)]
pub enum DispatchOutcome<'a> {
    Condition(MatchedCondition<'a>),
    Proxy(&'a str),
    Static,
}

impl<'a> DispatchOutcome<'a> {
    /// Pick the path for `route` given the serialized request body.
    pub fn select(route: &'a Route, body: &str) -> Self {
        if let Some(matched) = evaluate(&route.conditions, body) {
            return DispatchOutcome::Condition(matched);
        }
        match route.proxy_target() {
            Some(target) => DispatchOutcome::Proxy(target),
            None => DispatchOutcome::Static,
        }
    }
}

/// Turns a matched route and request into a response.
///
/// Holds no route state; the route comes from the snapshot the request
/// started with.
#[derive(Clone)]
pub struct RouteDispatcher {
    forwarder: ProxyForwarder,
}

impl RouteDispatcher {
    pub fn new(forwarder: ProxyForwarder) -> Self {
        Self { forwarder }
    }

    pub async fn dispatch(&self, route: &Route, head: &Parts, body: Bytes) -> HttpResponse {
        let serialized = serialize_body(&body);

        match DispatchOutcome::select(route, &serialized) {
            DispatchOutcome::Condition(matched) => {
                debug!(
                    route_id = %route.id,
                    condition_id = %matched.condition.id,
                    condition_index = matched.index,
                    "Condition matched"
                );
                let status = parse_status(&matched.response.status_code)
                    .unwrap_or_else(|| route_status(route));
                let mut response = payload_response(status, &matched.response.body);
                apply_route_headers(route, &mut response);
                response
            }
            DispatchOutcome::Proxy(target) => {
                wait_route_delay(route).await;
                match self
                    .forwarder
                    .forward(&head.method, target, &head.headers, body)
                    .await
                {
                    Ok(proxied) => proxied.into_response(),
                    Err(e) => {
                        warn!(route_id = %route.id, "Proxy passthrough failed: {}", e);
                        e.into_response()
                    }
                }
            }
            DispatchOutcome::Static => {
                wait_route_delay(route).await;
                let mut response = payload_response(route_status(route), &route.payload);
                apply_route_headers(route, &mut response);
                response
            }
        }
    }
}

// The route table only admits routes with a parsable status.
fn route_status(route: &Route) -> StatusCode {
    route.status().unwrap_or(StatusCode::OK)
}

async fn wait_route_delay(route: &Route) {
    if route.delay > 0 {
        debug!(route_id = %route.id, delay_ms = route.delay, "Applying route delay");
        tokio::time::sleep(Duration::from_millis(route.delay)).await;
    }
}

/// Authored headers override anything already set, including content type.
fn apply_route_headers(route: &Route, response: &mut HttpResponse) {
    for entry in route.response_headers() {
        let name = HeaderName::from_bytes(entry.header.trim().as_bytes());
        let value = HeaderValue::from_str(&entry.value);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => debug!(
                route_id = %route.id,
                header = %entry.header,
                "Skipping invalid route header"
            ),
        }
    }
}
