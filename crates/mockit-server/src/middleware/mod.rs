//! Request middleware run before any route handler.
//!
//! The standard chain, in order:
//! - `auth` - shared-credential Basic auth gate
//! - `delay` - global artificial latency
//! - `chaos` - random fault injection
//! - `cors` - preflight answers and `Access-Control-Allow-Origin`
//!
//! Every stage reads the settings of the snapshot the request started
//! with, so toggling a feature through the admin API applies to the next
//! request without a restart.

mod auth;
mod chaos;
mod cors;
mod delay;

pub use auth::{is_authorized, CredentialGate};
pub use chaos::{decide_fault, ChaosDecision, ChaosMonkey};
pub use cors::{allow_any_origin, preflight_response, Cors};
pub use delay::DelayInjection;

use crate::config::Settings;
use crate::response::HttpResponse;
use async_trait::async_trait;
use hyper::http::request::Parts;
use std::future::Future;
use tracing::debug;

/// Outcome of a middleware stage.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next stage.
    Continue,
    /// End the request with this response.
    Respond(HttpResponse),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn before(&self, head: &Parts, settings: &Settings) -> Flow;

    /// Runs on the way out, only if `before` returned `Continue`.
    fn after(&self, _head: &Parts, _settings: &Settings, _response: &mut HttpResponse) {}
}

/// Linear chain of stages. A stage that responds ends the chain.
#[derive(Default)]
pub struct MiddlewareChain {
    stages: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Auth, delay, chaos, CORS.
    pub fn standard() -> Self {
        Self::new()
            .with(CredentialGate)
            .with(DelayInjection)
            .with(ChaosMonkey)
            .with(Cors)
    }

    pub fn with(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the stages, then `handler` if none of them responded.
    pub async fn run<F, Fut>(&self, head: &Parts, settings: &Settings, handler: F) -> HttpResponse
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HttpResponse>,
    {
        let mut passed = 0;
        let mut terminal = None;

        for stage in &self.stages {
            match stage.before(head, settings).await {
                Flow::Continue => passed += 1,
                Flow::Respond(response) => {
                    debug!(
                        stage = stage.name(),
                        status = response.status().as_u16(),
                        "Middleware ended request"
                    );
                    terminal = Some(response);
                    break;
                }
            }
        }

        let mut response = match terminal {
            Some(response) => response,
            None => handler().await,
        };

        for stage in self.stages[..passed].iter().rev() {
            stage.after(head, settings, &mut response);
        }

        response
    }
}
