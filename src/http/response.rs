//! Response descriptor and shape validation.
//!
//! # Responsibilities
//! - Define the wire response shape handlers must produce
//! - Validate loosely-typed handler results against that shape
//! - Provide the standardized internal-server-error response
//!
//! # Design Decisions
//! - Validation also proves the descriptor is expressible on the wire
//!   (valid status code, encodable header names and values), so the
//!   transport-writing step cannot fail afterwards

use std::collections::BTreeMap;

use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a handler result was rejected as a protocol violation.
#[derive(Debug, Error)]
pub enum ResponseShapeError {
    #[error("response is not an object")]
    NotAnObject,
    #[error("response is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("response has unexpected field `{0}`")]
    UnexpectedField(String),
    #[error("`status` is not a valid status code")]
    InvalidStatus,
    #[error("`headers` is not an object with string values")]
    InvalidHeaders,
    #[error("header `{0}` can't be sent on the wire")]
    UnsendableHeader(String),
    #[error("`body` is not a string")]
    InvalidBody,
}

/// The response shape the server sends to the transport:
/// `{ status, headers, body }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Response with the given status and body, no headers.
    pub fn of(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The standardized response substituted for every handler
    /// malfunction.
    pub fn internal_server_error() -> Self {
        Self::of(500, "Internal Server Error")
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Validate a loosely-typed handler result against the required
    /// shape: integer `status` expressible as a status code, `headers`
    /// object of wire-encodable strings, string `body`, nothing else.
    pub fn from_value(value: &Value) -> Result<Self, ResponseShapeError> {
        let object = value.as_object().ok_or(ResponseShapeError::NotAnObject)?;
        for key in object.keys() {
            if !matches!(key.as_str(), "status" | "headers" | "body") {
                return Err(ResponseShapeError::UnexpectedField(key.clone()));
            }
        }

        let status = object
            .get("status")
            .ok_or(ResponseShapeError::MissingField("status"))?
            .as_u64()
            .and_then(|status| u16::try_from(status).ok())
            .filter(|status| StatusCode::from_u16(*status).is_ok())
            .ok_or(ResponseShapeError::InvalidStatus)?;

        let header_fields = object
            .get("headers")
            .ok_or(ResponseShapeError::MissingField("headers"))?
            .as_object()
            .ok_or(ResponseShapeError::InvalidHeaders)?;
        let mut headers = BTreeMap::new();
        for (name, value) in header_fields {
            let value = value.as_str().ok_or(ResponseShapeError::InvalidHeaders)?;
            let sendable = HeaderName::try_from(name.as_str()).is_ok()
                && HeaderValue::try_from(value).is_ok();
            if !sendable {
                return Err(ResponseShapeError::UnsendableHeader(name.clone()));
            }
            headers.insert(name.clone(), value.to_string());
        }

        let body = object
            .get("body")
            .ok_or(ResponseShapeError::MissingField("body"))?
            .as_str()
            .ok_or(ResponseShapeError::InvalidBody)?
            .to_string();

        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

impl From<HttpResponse> for Value {
    fn from(response: HttpResponse) -> Self {
        serde_json::to_value(response).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_the_required_shape() {
        let value = json!({
            "status": 201,
            "headers": { "content-type": "text/plain" },
            "body": "created",
        });

        let response = HttpResponse::from_value(&value).unwrap();
        assert_eq!(
            response,
            HttpResponse::of(201, "created").with_header("content-type", "text/plain")
        );
    }

    #[test]
    fn round_trips_through_a_json_value() {
        let response = HttpResponse::of(200, "ok").with_header("x-custom", "yes");
        let value: Value = response.clone().into();
        assert_eq!(HttpResponse::from_value(&value).unwrap(), response);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            HttpResponse::from_value(&json!("not an object")),
            Err(ResponseShapeError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_status_that_is_not_an_integer() {
        let value = json!({ "status": "200", "headers": {}, "body": "ok" });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::InvalidStatus)
        ));
    }

    #[test]
    fn rejects_status_outside_the_wire_range() {
        let value = json!({ "status": 99, "headers": {}, "body": "ok" });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::InvalidStatus)
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let value = json!({ "status": 200, "headers": {} });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::MissingField("body"))
        ));
    }

    #[test]
    fn rejects_unexpected_fields() {
        let value = json!({ "status": 200, "headers": {}, "body": "ok", "extra": true });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::UnexpectedField(field)) if field == "extra"
        ));
    }

    #[test]
    fn rejects_non_string_header_values() {
        let value = json!({ "status": 200, "headers": { "x-count": 3 }, "body": "ok" });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::InvalidHeaders)
        ));
    }

    #[test]
    fn rejects_headers_that_cannot_go_on_the_wire() {
        let value = json!({ "status": 200, "headers": { "bad\nname": "x" }, "body": "ok" });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::UnsendableHeader(_))
        ));
    }

    #[test]
    fn rejects_non_string_bodies() {
        let value = json!({ "status": 200, "headers": {}, "body": 42 });
        assert!(matches!(
            HttpResponse::from_value(&value),
            Err(ResponseShapeError::InvalidBody)
        ));
    }

    #[test]
    fn standardized_error_response_matches_the_contract() {
        let response = HttpResponse::internal_server_error();
        assert_eq!(response.status, 500);
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(response.body, "Internal Server Error");
    }
}
