//! Shared helpers: in-process listeners on ephemeral ports.

#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use mockit_server::{
    AdminApiServer, ConfigDocument, ConfigStore, MockServer, ProxyForwarder, RouteDispatcher,
};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn in_memory_store(document: Value) -> Arc<ConfigStore> {
    let document: ConfigDocument = serde_json::from_value(document).unwrap();
    Arc::new(ConfigStore::in_memory(document))
}

/// Start a mock listener for `store` and return its base URL.
pub async fn spawn_mock(store: Arc<ConfigStore>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let forwarder = ProxyForwarder::new(Duration::from_secs(5)).unwrap();
    let server = MockServer::new(store, RouteDispatcher::new(forwarder));
    tokio::spawn(server.serve(listener));
    format!("http://{addr}")
}

pub async fn spawn_admin(store: Arc<ConfigStore>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let admin = AdminApiServer::new(addr, store);
    tokio::spawn(admin.serve(listener));
    format!("http://{addr}")
}

/// A real upstream: answers every request with 418 and a JSON echo of
/// what it received.
pub async fn spawn_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            tokio::spawn(async move {
                let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                    let method = req.method().to_string();
                    let path = req.uri().path().to_string();
                    let marker = req
                        .headers()
                        .get("x-test")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let body = req.into_body().collect().await.unwrap().to_bytes();

                    let echo = json!({
                        "method": method,
                        "path": path,
                        "marker": marker,
                        "body": String::from_utf8_lossy(&body),
                    });
                    let response = Response::builder()
                        .status(StatusCode::IM_A_TEAPOT)
                        .header("content-type", "application/json")
                        .header("x-upstream", "yes")
                        .body(Full::new(Bytes::from(echo.to_string())))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    format!("http://{addr}")
}

/// The example document: `POST /users` answering 403 for admins.
pub fn users_document() -> Value {
    json!({
        "routes": [{
            "id": "users",
            "route": "/users",
            "httpMethod": "POST",
            "statusCode": "200",
            "delay": "0",
            "payload": {"ok": true},
            "disabled": false,
            "headers": [],
            "conditions": [{
                "id": "c-admin",
                "condition": "admin",
                "responses": [{
                    "id": "r-admin",
                    "statusCode": "403",
                    "body": {"error": "forbidden"}
                }]
            }]
        }],
        "settings": {"features": {}}
    })
}
