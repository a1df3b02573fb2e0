//! HTTP server lifecycle and request pipeline.
//!
//! # State Transitions
//! ```text
//! Stopped --start--> Started --stop--> Stopped
//! ```
//! Repeating a transition is a fail-fast caller error.
//!
//! # Data Flow
//! ```text
//! transport request
//!     → HttpRequest wrapper
//!     → caller-supplied handler
//!     → shape validation
//!     → wire response, or fixed 500 + emergency log entry
//! ```
//!
//! # Design Decisions
//! - A handler malfunction (malformed result, error, panic) never
//!   terminates the process and never leaves the connection unanswered
//! - One handler binding per Started period; the accept loop holds a
//!   clone and exits on the shutdown signal
//! - The null variant keeps the same suspension points (start, stop)
//!   without touching a socket

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::log::{Log, LogData};

/// Error a handler may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;
type RequestHandler = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Error type for server lifecycle operations.
#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("can't start server because it's already running")]
    AlreadyStarted,
    #[error("server isn't running")]
    NotStarted,
    #[error("couldn't start server due to error: {0}")]
    Startup(std::io::Error),
}

/// HTTP server with interchangeable production and null transports.
///
/// Owns the listening resource and the single handler binding for the
/// lifetime of a Started period. Handler malfunctions are reported
/// through [`Log`] at emergency level and masked from the client
/// behind a fixed 500 response.
pub struct HttpServer {
    log: Log,
    mode: Mode,
    state: ServerState,
}

enum Mode {
    Real,
    Null,
}

enum ServerState {
    Stopped,
    Started {
        handler: RequestHandler,
        transport: RunningTransport,
    },
}

enum RunningTransport {
    Real {
        local_addr: SocketAddr,
        shutdown: broadcast::Sender<()>,
        accept_loop: JoinHandle<()>,
    },
    Null,
}

impl HttpServer {
    /// Server backed by a real TCP listener, reporting through `log`.
    pub fn new(log: Log) -> Self {
        Self {
            log,
            mode: Mode::Real,
            state: ServerState::Stopped,
        }
    }

    /// Null server: identical contract, no sockets, null log.
    pub fn create_null() -> Self {
        Self {
            log: Log::create_null(),
            mode: Mode::Null,
            state: ServerState::Stopped,
        }
    }

    /// The log this server reports handler malfunctions through.
    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, ServerState::Started { .. })
    }

    /// The bound address, once started with a real transport. Useful
    /// when starting on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.state {
            ServerState::Started {
                transport: RunningTransport::Real { local_addr, .. },
                ..
            } => Some(*local_addr),
            _ => None,
        }
    }

    /// Bind `port` and begin accepting connections, passing each
    /// request to `on_request`. Resolves once the transport is
    /// listening. Fails fast if already started; a bind failure leaves
    /// the server stopped.
    pub async fn start<H, F>(&mut self, port: u16, on_request: H) -> Result<(), HttpServerError>
    where
        H: Fn(HttpRequest) -> F + Send + Sync + 'static,
        F: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        if self.is_started() {
            return Err(HttpServerError::AlreadyStarted);
        }
        let handler: RequestHandler =
            Arc::new(move |request| Box::pin(on_request(request)) as HandlerFuture);

        let transport = match self.mode {
            Mode::Real => {
                let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                    .await
                    .map_err(HttpServerError::Startup)?;
                let local_addr = listener.local_addr().map_err(HttpServerError::Startup)?;
                tracing::info!(address = %local_addr, "server listening");

                let (shutdown, shutdown_rx) = broadcast::channel(1);
                let accept_loop = tokio::spawn(accept_loop(
                    listener,
                    shutdown_rx,
                    handler.clone(),
                    self.log.clone(),
                ));
                RunningTransport::Real {
                    local_addr,
                    shutdown,
                    accept_loop,
                }
            }
            Mode::Null => {
                tokio::task::yield_now().await;
                RunningTransport::Null
            }
        };

        self.state = ServerState::Started { handler, transport };
        Ok(())
    }

    /// Stop accepting connections and release the listening resource.
    /// Resolves once fully closed. Fails fast if not started.
    pub async fn stop(&mut self) -> Result<(), HttpServerError> {
        match std::mem::replace(&mut self.state, ServerState::Stopped) {
            ServerState::Stopped => Err(HttpServerError::NotStarted),
            ServerState::Started { transport, .. } => {
                match transport {
                    RunningTransport::Real {
                        local_addr,
                        shutdown,
                        accept_loop,
                    } => {
                        let _ = shutdown.send(());
                        let _ = accept_loop.await;
                        tracing::info!(address = %local_addr, "server stopped");
                    }
                    RunningTransport::Null => {
                        tokio::task::yield_now().await;
                    }
                }
                Ok(())
            }
        }
    }

    /// Run the identical handler-invocation-and-validation pipeline
    /// against a caller-supplied request, with no transport involved.
    /// Fails fast if not started.
    pub async fn simulate_request(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, HttpServerError> {
        let ServerState::Started { handler, .. } = &self.state else {
            return Err(HttpServerError::NotStarted);
        };
        Ok(handle_request(&self.log, handler, request).await)
    }
}

/// Source of inbound connections for the accept loop.
trait Accept: Send + 'static {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

async fn accept_loop<A: Accept>(
    mut source: A,
    mut shutdown: broadcast::Receiver<()>,
    handler: RequestHandler,
    log: Log,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            accepted = source.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    tracing::debug!(peer_addr = %peer_addr, "connection accepted");
                    tokio::spawn(serve_connection(stream, handler.clone(), log.clone()));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                }
            }
        }
    }
    // dropping the source releases a real listener's port
}

async fn serve_connection(stream: TcpStream, handler: RequestHandler, log: Log) {
    let service = service_fn(move |transport_request: hyper::Request<Incoming>| {
        let handler = handler.clone();
        let log = log.clone();
        async move {
            let request = HttpRequest::from_hyper(transport_request);
            let response = handle_request(&log, &handler, request).await;
            Ok::<_, std::convert::Infallible>(to_wire(response))
        }
    });

    if let Err(err) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        tracing::debug!(error = %err, "connection closed with error");
    }
}

/// Invoke the handler and translate whatever happens into a response
/// that is always well-formed. Shared verbatim by the real transport
/// and [`HttpServer::simulate_request`].
async fn handle_request(log: &Log, handler: &RequestHandler, request: HttpRequest) -> HttpResponse {
    match std::panic::AssertUnwindSafe(handler(request))
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => match HttpResponse::from_value(&value) {
            Ok(response) => response,
            Err(problem) => {
                log.emergency(
                    LogData::message("request handler returned invalid response")
                        .with("problem", problem.to_string())
                        .with("response", value),
                );
                HttpResponse::internal_server_error()
            }
        },
        Ok(Err(failure)) => {
            log.emergency(LogData::message("request handler failed").with_failure("error", failure));
            HttpResponse::internal_server_error()
        }
        Err(panic) => {
            log.emergency(
                LogData::message("request handler panicked").with("error", panic_text(&*panic)),
            );
            HttpResponse::internal_server_error()
        }
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Write a validated descriptor to the transport representation.
/// Validation guarantees every part is expressible, so the fallbacks
/// here are unreachable.
fn to_wire(response: HttpResponse) -> hyper::Response<Full<Bytes>> {
    let mut wire = hyper::Response::new(Full::new(Bytes::from(response.body)));
    *wire.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            wire.headers_mut().insert(name, value);
        }
    }
    wire
}
