//! Gateway call errors.

use http::StatusCode;

use super::status_map::{grpc_code_name, http_to_grpc_code};

/// Serialized RPC status object as it appears on the wire:
/// `{"code": …, "message": …, "details": […]}`.
///
/// Error responses and streaming `error` envelopes carry this shape. Details
/// stay as raw JSON values — their `Any`-typed payloads belong to the caller.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RpcStatus {
    /// Numeric gRPC status code.
    #[serde(default)]
    pub code: i32,
    /// Developer-facing message.
    #[serde(default)]
    pub message: String,
    /// Serialized detail payloads, passed through verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

/// An RPC status error: a failed call presented with gRPC status semantics.
///
/// Carries either the server's own status payload (code, message, details
/// propagated verbatim) or a status synthesized from the HTTP status code
/// and response text when no structured payload was available.
#[derive(Clone, Debug)]
pub struct StatusError {
    code: tonic::Code,
    message: String,
    details: Vec<serde_json::Value>,
}

impl StatusError {
    /// Status received from the server as a structured payload.
    pub(crate) fn upstream(payload: RpcStatus) -> Self {
        Self {
            code: tonic::Code::from(payload.code),
            message: payload.message,
            details: payload.details,
        }
    }

    /// Status synthesized from the HTTP status code and the response text.
    pub(crate) fn synthetic(http_status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: http_to_grpc_code(http_status),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// The gRPC status code.
    #[must_use]
    pub const fn code(&self) -> tonic::Code {
        self.code
    }

    /// The status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Detail payloads, empty for synthesized statuses.
    #[must_use]
    pub fn details(&self) -> &[serde_json::Value] {
        &self.details
    }

    /// Convert into a [`tonic::Status`] (details are not carried over —
    /// they are JSON values, not `grpc-status-details-bin`).
    #[must_use]
    pub fn into_status(self) -> tonic::Status {
        tonic::Status::new(self.code, self.message)
    }
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", grpc_code_name(self.code), self.message)
    }
}

impl std::error::Error for StatusError {}

/// Error returned by gateway calls.
///
/// Transport failures, protocol decode failures, and RPC status errors are
/// distinct variants; no variant is ever retried internally, and streaming
/// calls terminate on the first error without revoking values already
/// delivered.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Sending the request (or reading the response body) failed at the
    /// transport level.
    #[error("send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request payload could not be marshalled to JSON.
    #[error("marshal request body: {0}")]
    Marshal(#[source] serde_json::Error),

    /// A successful response (or stream frame) could not be decoded into
    /// the expected shape.
    #[error("decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Per-call metadata contained a header name or value that is not
    /// valid for HTTP.
    #[error("invalid call metadata: {0}")]
    InvalidMetadata(String),

    /// The server reported an RPC status error.
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl GatewayError {
    /// The RPC status error, if that's what this is.
    #[must_use]
    pub fn status(&self) -> Option<&StatusError> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Convenience accessor for the gRPC code of a status error.
    #[must_use]
    pub fn code(&self) -> Option<tonic::Code> {
        self.status().map(StatusError::code)
    }
}

/// Interpret a non-2xx unary response body.
///
/// The body is expected to be a serialized status object; a payload with a
/// non-OK code propagates verbatim, anything else (absent, uncastable, or
/// OK-coded) synthesizes a status from the HTTP code with the body text as
/// the message.
pub(crate) fn status_from_error_body(http_status: StatusCode, body: &[u8]) -> GatewayError {
    match serde_json::from_slice::<RpcStatus>(body) {
        Ok(payload) if payload.code != 0 => StatusError::upstream(payload).into(),
        _ => {
            StatusError::synthetic(http_status, String::from_utf8_lossy(body).into_owned()).into()
        }
    }
}
