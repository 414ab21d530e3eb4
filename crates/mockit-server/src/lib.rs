//! MockIt: a config-driven HTTP mock server.
//!
//! Routes come from one JSON document. Each enabled route answers with a
//! condition-selected response, a proxied upstream response, or its static
//! payload, behind a middleware chain of Basic auth, delay, chaos and CORS.
//! The admin API edits the document and the mock listener picks up every
//! change on its next request.

pub mod admin_api;
pub mod config;
pub mod dispatch;
pub mod middleware;
pub mod proxy;
pub mod response;
pub mod routing;
pub mod server;
pub mod store;

pub use admin_api::AdminApiServer;
pub use config::ConfigDocument;
pub use dispatch::RouteDispatcher;
pub use proxy::ProxyForwarder;
pub use server::MockServer;
pub use store::ConfigStore;
