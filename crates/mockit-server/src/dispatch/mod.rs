//! Route dispatch.
//!
//! A request that reached a route takes exactly one path:
//! 1. the first condition whose text occurs in the serialized body answers;
//! 2. otherwise a configured `proxyUrl` answers through the forwarder;
//! 3. otherwise the route's own status and payload answer.

mod condition;
mod handler;

pub use condition::{evaluate, serialize_body, MatchedCondition};
pub use handler::{DispatchOutcome, RouteDispatcher};
