//! Infrastructure wrappers with paired production and null modes.
//!
//! Every boundary component here exposes two constructors satisfying
//! the identical contract: a production one bound to the real external
//! resource, and a null one bound to an in-memory, deterministic
//! substitute whose output can be inspected through an
//! [`OutputTracker`]. No caller-visible behavior branches on which
//! mode is active.
//!
//! ```text
//!                  ┌──────────────────────────────────────────┐
//!                  │               HttpServer                  │
//!  TCP request ───▶│  wrap → handler → validate → respond      │───▶ wire response
//!                  │        malfunctions → 500 + Log emergency │
//!                  └───────┬──────────────────────────────────┘
//!                          │
//!                  ┌───────▼───────┐      ┌─────────────┐
//!                  │      Log      │─────▶│ CommandLine │───▶ stdout
//!                  └───────┬───────┘      └─────────────┘
//!                          │
//!                  ┌───────▼───────┐
//!                  │     Clock     │
//!                  └───────────────┘
//! ```
//!
//! Dependencies point leaf-ward: `Clock` and the tracker have none,
//! `Log` writes through `CommandLine` and stamps time from `Clock`,
//! and `HttpServer` reports handler malfunctions through `Log`.

pub mod clock;
pub mod command_line;
pub mod http;
pub mod log;
pub mod tracker;

pub use clock::{Clock, ClockError};
pub use command_line::CommandLine;
pub use http::{
    HandlerError, HttpRequest, HttpRequestError, HttpResponse, HttpServer, HttpServerError,
    NullRequestConfig, ResponseShapeError,
};
pub use log::{AlertLevel, Failure, Log, LogData, LogValue};
pub use tracker::OutputTracker;
