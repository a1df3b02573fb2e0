//! Inbound request wrapper.
//!
//! # Responsibilities
//! - Expose the decoded path, normalized method, and a lower-cased
//!   header snapshot
//! - Accumulate the request body into one string, exactly once
//!
//! # Design Decisions
//! - Headers are copied on every access; callers can never mutate
//!   internal state through the returned map
//! - The null variant resolves its body through a real suspension
//!   point, so tests exercising asynchronous ordering stay valid

use std::collections::HashMap;
use std::sync::Mutex;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// Error type for request operations.
#[derive(Debug, Error)]
pub enum HttpRequestError {
    /// The body is a single-read stream; reading twice is caller error.
    #[error("can't read request body because it's already been read")]
    BodyAlreadyRead,
    #[error("failed to read request body: {0}")]
    Transport(#[from] hyper::Error),
}

/// Configuration for a null request. Every field has a default.
pub struct NullRequestConfig {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Default for NullRequestConfig {
    fn default() -> Self {
        Self {
            url: "/null-request-url".to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }
}

/// One inbound HTTP request, production-backed or simulated.
pub struct HttpRequest {
    target: String,
    method: String,
    headers: HashMap<String, String>,
    body: Mutex<BodyState>,
}

enum BodyState {
    Pending(BodySource),
    Consumed,
}

enum BodySource {
    Incoming(Incoming),
    Simulated(String),
}

impl HttpRequest {
    /// Wrap a transport-level request.
    pub(crate) fn from_hyper(request: hyper::Request<Incoming>) -> Self {
        let (parts, body) = request.into_parts();
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self {
            target: parts.uri.to_string(),
            method: parts.method.as_str().to_ascii_uppercase(),
            headers,
            body: Mutex::new(BodyState::Pending(BodySource::Incoming(body))),
        }
    }

    /// Simulated request with the configured url, method, headers, and
    /// body. Behaves identically to a production-backed request.
    pub fn create_null(config: NullRequestConfig) -> Self {
        let headers = config
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            target: config.url,
            method: config.method.to_ascii_uppercase(),
            headers,
            body: Mutex::new(BodyState::Pending(BodySource::Simulated(config.body))),
        }
    }

    /// URL-decoded path with the query string removed.
    pub fn url_pathname(&self) -> String {
        let path = Url::parse("http://unknown.host")
            .ok()
            .and_then(|base| base.join(&self.target).ok())
            .map(|resolved| resolved.path().to_string())
            .unwrap_or_else(|| {
                self.target
                    .split(['?', '#'])
                    .next()
                    .unwrap_or("/")
                    .to_string()
            });
        percent_decode_str(&path).decode_utf8_lossy().into_owned()
    }

    /// Upper-cased HTTP method token.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Lower-cased-key snapshot of the headers. A fresh copy on every
    /// call; mutating it never affects the request.
    pub fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }

    /// True iff the `content-type` header's media type (the segment
    /// before any `;`, trimmed, case-insensitive) equals
    /// `expected_media_type`.
    pub fn has_content_type(&self, expected_media_type: &str) -> bool {
        let Some(content_type) = self.headers.get("content-type") else {
            return false;
        };
        let media_type = content_type.split(';').next().unwrap_or("");
        media_type
            .trim()
            .eq_ignore_ascii_case(expected_media_type.trim())
    }

    /// Accumulate the entire body into one string. The body can be
    /// read exactly once; a second call fails in both modes.
    pub async fn read_body(&self) -> Result<String, HttpRequestError> {
        let source = {
            let mut state = self.body.lock().unwrap();
            match std::mem::replace(&mut *state, BodyState::Consumed) {
                BodyState::Pending(source) => source,
                BodyState::Consumed => return Err(HttpRequestError::BodyAlreadyRead),
            }
        };

        match source {
            BodySource::Incoming(body) => {
                let collected = body.collect().await?;
                Ok(String::from_utf8_lossy(&collected.to_bytes()).into_owned())
            }
            BodySource::Simulated(body) => {
                // completion stays asynchronous, matching the real stream
                tokio::task::yield_now().await;
                Ok(body)
            }
        }
    }
}
