//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (lifecycle, accept loop, pipeline)
//!     → request.rs (wrap transport request, one-shot body)
//!     → caller-supplied handler
//!     → response.rs (shape validation, fixed 500 fallback)
//!     → wire response
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{HttpRequest, HttpRequestError, NullRequestConfig};
pub use response::{HttpResponse, ResponseShapeError};
pub use server::{HandlerError, HttpServer, HttpServerError};
