use super::{Flow, Middleware};
use crate::config::Settings;
use async_trait::async_trait;
use hyper::http::request::Parts;
use std::time::Duration;
use tracing::debug;

/// Global latency, independent of any per-route `delay`.
pub struct DelayInjection;

#[async_trait]
impl Middleware for DelayInjection {
    fn name(&self) -> &'static str {
        "delay"
    }

    async fn before(&self, head: &Parts, settings: &Settings) -> Flow {
        if let Some(ms) = settings.active_delay_ms() {
            debug!(path = %head.uri.path(), delay_ms = ms, "Applying global delay");
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        Flow::Continue
    }
}
