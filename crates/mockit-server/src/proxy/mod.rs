//! Proxy passthrough for routes with a `proxyUrl`.
//!
//! # Module Structure
//!
//! - `forwarder` - outbound client, request relay and response conversion
//! - `error` - failure classification and its HTTP translation

mod error;
mod forwarder;

pub use error::ProxyError;
pub use forwarder::{ProxiedResponse, ProxyForwarder, DEFAULT_PROXY_TIMEOUT};
