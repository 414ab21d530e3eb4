//! Admin REST API for editing the live configuration.
//!
//! Endpoints:
//! - `GET/POST/PUT/DELETE /route` - route management
//! - `GET/POST /settings` - read or shallow-merge settings
//! - `POST /reload` - re-read the configuration file
//! - `GET /health`
//!
//! Every mutation is written to the configuration file and published to
//! the mock listener at once. The API listens on its own port
//! (default: 4000) and always answers with permissive CORS headers.

mod handlers;
mod router;
mod server;
mod types;

pub use router::route_request;
pub use server::AdminApiServer;
