//! Admin API server.

use crate::admin_api::router::route_request;
use crate::server::ACCEPT_BACKOFF;
use crate::store::ConfigStore;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Admin API server for MockIt
pub struct AdminApiServer {
    addr: SocketAddr,
    store: Arc<ConfigStore>,
}

impl AdminApiServer {
    pub fn new(addr: SocketAddr, store: Arc<ConfigStore>) -> Self {
        Self { addr, store }
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("MockIt admin API listening on http://{}", listener.local_addr()?);

        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Admin API accept error: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let store = Arc::clone(&self.store);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let store = Arc::clone(&store);
                    async move { Ok::<_, Infallible>(route_request(req, &store).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Admin API connection error: {}", e);
                }
            });
        }
    }
}
