//! Method/path routing for declared routes.
//!
//! Built from a configuration snapshot. Route patterns use the Express
//! syntax the editor produces (`/users/:id`, `/files/*`) and are translated
//! to matchit's `{param}` form. Lookups try the patterns of a method in
//! declaration order, so when two patterns overlap the earlier one serves.

use crate::config::{is_catalogued, HttpMethod, Route};
use hyper::Method;
use matchit::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RouteTableError {
    #[error("unknown http method '{0}'")]
    UnknownMethod(String),
    #[error("invalid status code '{0}'")]
    InvalidStatus(String),
    #[error("unsupported path pattern '{pattern}': {reason}")]
    UnsupportedPattern { pattern: String, reason: String },
}

/// Translate an Express-style path into a matchit pattern.
pub fn to_matchit_pattern(pattern: &str) -> Result<String, RouteTableError> {
    let trimmed = pattern.trim();
    let unsupported = |reason: &str| RouteTableError::UnsupportedPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() || trimmed == "/" {
        return Ok("/".to_string());
    }

    let path = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut out = String::with_capacity(trimmed.len() + 8);

    for (i, segment) in segments.iter().enumerate() {
        out.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(unsupported("parameter names must be alphanumeric"));
            }
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if *segment == "*" {
            if i != last {
                return Err(unsupported("wildcard is only allowed as the last segment"));
            }
            out.push_str("{*wildcard}");
        } else {
            if segment.contains('*') {
                return Err(unsupported("wildcard must be a whole segment"));
            }
            out.push_str(&segment.replace('{', "{{").replace('}', "}}"));
        }
    }

    Ok(out)
}

/// One declared pattern, compiled on its own so lookups can honour
/// declaration order instead of matchit's static-before-param priority.
struct RouteEntry {
    pattern: String,
    matcher: Router<()>,
    index: usize,
}

impl RouteEntry {
    fn matches(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

/// Enabled routes grouped by method, in declaration order.
#[derive(Default)]
pub struct RouteTable {
    entries: HashMap<HttpMethod, Vec<RouteEntry>>,
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Build the table in declaration order. Entries that cannot be served
    /// are skipped with a warning; for duplicate `(method, path)` pairs the
    /// first declaration wins.
    pub fn build(routes: &[Route]) -> Self {
        let mut table = RouteTable::default();

        for route in routes {
            if route.disabled {
                debug!(route_id = %route.id, "Skipping disabled route {}", route.label());
                continue;
            }

            match table.register(route) {
                Ok(true) => {}
                Ok(false) => warn!(
                    route_id = %route.id,
                    "Route {} is already declared; the first declaration wins",
                    route.label()
                ),
                Err(e) => warn!(route_id = %route.id, "Skipping route {}: {}", route.label(), e),
            }
        }

        table
    }

    /// Returns `Ok(false)` when an earlier route already owns the path.
    fn register(&mut self, route: &Route) -> Result<bool, RouteTableError> {
        let method = route
            .method()
            .ok_or_else(|| RouteTableError::UnknownMethod(route.http_method.clone()))?;
        let status = route
            .status()
            .ok_or_else(|| RouteTableError::InvalidStatus(route.status_code.clone()))?;
        if !is_catalogued(status) {
            warn!(
                route_id = %route.id,
                "Route {} uses status {} which is outside the editor catalog",
                route.label(),
                status.as_u16()
            );
        }

        // Paths match case-insensitively
        let pattern = to_matchit_pattern(&route.route.to_ascii_lowercase())?;
        let entries = self.entries.entry(method).or_default();
        if entries.iter().any(|e| e.pattern == pattern) {
            return Ok(false);
        }

        let mut matcher = Router::new();
        matcher
            .insert(pattern.clone(), ())
            .map_err(|e| RouteTableError::UnsupportedPattern {
                pattern: route.route.clone(),
                reason: e.to_string(),
            })?;

        debug!(route_id = %route.id, method = %method, pattern = %pattern, "Registered route");
        entries.push(RouteEntry {
            pattern,
            matcher,
            index: self.routes.len(),
        });
        self.routes.push(Arc::new(route.clone()));
        Ok(true)
    }

    /// Find the route for a request: the first declared pattern that
    /// matches. `HEAD` is served by `GET` routes, case is ignored and a
    /// trailing slash is tolerated.
    pub fn find(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        let method = if *method == Method::HEAD {
            HttpMethod::Get
        } else {
            HttpMethod::from_method(method)?
        };
        let entries = self.entries.get(&method)?;

        let path = path.to_ascii_lowercase();
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        let entry = entries
            .iter()
            .find(|e| e.matches(&path) || (trimmed != path && e.matches(trimmed)))?;
        self.routes.get(entry.index).cloned()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
