//! Mock HTTP listener.

use crate::dispatch::RouteDispatcher;
use crate::middleware::MiddlewareChain;
use crate::response::{not_found, read_body, HttpResponse};
use crate::store::ConfigStore;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Pause after a failed `accept` so a persistent error (such as running out
/// of file descriptors) does not spin the loop.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves the routes of a [`ConfigStore`] behind the middleware chain.
///
/// Cheap to clone; every connection task holds its own handle.
#[derive(Clone)]
pub struct MockServer {
    store: Arc<ConfigStore>,
    chain: Arc<MiddlewareChain>,
    dispatcher: RouteDispatcher,
}

impl MockServer {
    /// A server with the standard middleware chain.
    pub fn new(store: Arc<ConfigStore>, dispatcher: RouteDispatcher) -> Self {
        Self {
            store,
            chain: Arc::new(MiddlewareChain::standard()),
            dispatcher,
        }
    }

    pub async fn run(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until the task is dropped.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let local = listener.local_addr()?;
        info!(
            routes = self.store.snapshot().table.len(),
            "MockIt listening on http://{}", local
        );

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Accept error on {}: {}", local, e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let server = self.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(peer = %peer, "Connection error: {}", e);
                }
            });
        }
    }

    /// Handle one request against the current snapshot.
    pub async fn handle<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let start = Instant::now();
        let current = self.store.snapshot();
        let snapshot = &*current;
        let (head, body) = req.into_parts();
        let head = &head;

        let response = self
            .chain
            .run(head, snapshot.settings(), || async move {
                let body = match read_body(body).await {
                    Ok(body) => body,
                    Err(response) => return response,
                };

                let path = head.uri.path();
                match snapshot.table.find(&head.method, path) {
                    Some(route) => self.dispatcher.dispatch(&route, head, body).await,
                    None => not_found(&head.method, path),
                }
            })
            .await;

        debug!(
            method = %head.method,
            path = %head.uri.path(),
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Handled mock request"
        );
        response
    }
}
