//! Route declarations: the mock endpoints served by the dispatcher.

use super::de;
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status codes offered by the route editor.
pub const STATUS_CATALOG: &[u16] = &[
    200, 201, 202, 204, 400, 401, 403, 404, 409, 422, 500, 503, 504,
];

/// Methods a route can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Case-insensitive parse of a declared method.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(HttpMethod::Get),
            Method::POST => Some(HttpMethod::Post),
            Method::PUT => Some(HttpMethod::Put),
            Method::PATCH => Some(HttpMethod::Patch),
            Method::DELETE => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a string-encoded status code (`"404"`).
pub fn parse_status(code: &str) -> Option<StatusCode> {
    code.trim()
        .parse::<u16>()
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
}

/// Whether the status is one the editor offers.
pub fn is_catalogued(status: StatusCode) -> bool {
    STATUS_CATALOG.contains(&status.as_u16())
}

fn default_http_method() -> String {
    "GET".to_string()
}

fn default_status_code() -> String {
    "200".to_string()
}

/// A declared mock endpoint.
///
/// Field names follow the on-disk document (`httpMethod`, `statusCode`,
/// `proxyUrl`). Keys this struct does not know about are kept in `extra`
/// so a load/save cycle never drops what the editor wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub id: String,
    pub route: String,
    #[serde(default = "default_http_method")]
    pub http_method: String,
    #[serde(
        default = "default_status_code",
        deserialize_with = "de::string_or_number"
    )]
    pub status_code: String,
    #[serde(default, deserialize_with = "de::millis")]
    pub delay: u64,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub headers: Vec<RouteHeader>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(
        default,
        deserialize_with = "de::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub proxy_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            id: String::new(),
            route: "/".to_string(),
            http_method: default_http_method(),
            status_code: default_status_code(),
            delay: 0,
            payload: Value::Null,
            disabled: false,
            headers: Vec::new(),
            conditions: Vec::new(),
            proxy_url: None,
            extra: Map::new(),
        }
    }
}

impl Route {
    pub fn method(&self) -> Option<HttpMethod> {
        HttpMethod::parse(&self.http_method)
    }

    pub fn status(&self) -> Option<StatusCode> {
        parse_status(&self.status_code)
    }

    /// Proxy target, if one is configured.
    pub fn proxy_target(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Authored response headers with a usable name.
    pub fn response_headers(&self) -> impl Iterator<Item = &RouteHeader> {
        self.headers
            .iter()
            .filter(|h| !h.header.trim().is_empty())
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        format!("{} {}", self.http_method.to_ascii_uppercase(), self.route)
    }
}

/// Extra response header authored on a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteHeader {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub value: String,
}

/// A substring rule that selects an alternate response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub responses: Vec<ConditionResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub status_code: String,
    #[serde(default)]
    pub body: Value,
}
