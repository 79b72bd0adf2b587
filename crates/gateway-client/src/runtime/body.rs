//! Opaque raw-bytes result type.

use bytes::Bytes;

/// An opaque HTTP payload: content type plus raw bytes.
///
/// Mirrors `google.api.HttpBody` — used for non-JSON downloads where the
/// response body must pass through without JSON decoding. In streamed form
/// every frame carries the response's original `Content-Type`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpBody {
    /// The response's `Content-Type` header value (empty if absent).
    pub content_type: String,
    /// The payload bytes, verbatim.
    pub data: Bytes,
}
