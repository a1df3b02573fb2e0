//! Shared utilities for socket-level integration tests.

use std::future::Future;

use serde_json::Value;

use nullables::{HandlerError, HttpRequest, HttpServer, Log};

/// Start a production-mode server on an ephemeral port with a null
/// log, returning the server and its base URL.
pub async fn start_server<H, F>(on_request: H) -> (HttpServer, String)
where
    H: Fn(HttpRequest) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    let mut server = HttpServer::new(Log::create_null());
    server.start(0, on_request).await.unwrap();
    let port = server.local_addr().unwrap().port();
    (server, format!("http://127.0.0.1:{port}"))
}
