//! HTTP → gRPC status code mapping.

use http::StatusCode;
use tonic::Code;

/// Map an HTTP status code to a gRPC status code.
///
/// Follows the [gateway mapping](https://github.com/grpc/grpc/blob/master/doc/http-grpc-status-mapping.md)
/// used when presenting transport-level failures with RPC status semantics.
/// Total and deterministic: every status maps to exactly one code, with
/// [`Code::Unknown`] as the default.
///
/// # Examples
///
/// ```
/// use gateway_client::http_to_grpc_code;
/// use http::StatusCode;
///
/// assert_eq!(http_to_grpc_code(StatusCode::NOT_FOUND), tonic::Code::Unimplemented);
/// assert_eq!(http_to_grpc_code(StatusCode::TOO_MANY_REQUESTS), tonic::Code::Unavailable);
/// ```
#[must_use]
pub fn http_to_grpc_code(status: StatusCode) -> Code {
    match status.as_u16() {
        200 => Code::Ok,
        400 => Code::Internal,
        401 => Code::Unauthenticated,
        403 => Code::PermissionDenied,
        404 => Code::Unimplemented,
        429 | 502 | 503 | 504 => Code::Unavailable,
        _ => Code::Unknown,
    }
}

/// Return the canonical `SCREAMING_SNAKE_CASE` name for a gRPC status code.
///
/// Follows the [gRPC status code names](https://grpc.github.io/grpc/core/md_doc_statuscodes.html).
/// Used by [`StatusError`](crate::StatusError) display and useful for log
/// fields that want a machine-readable status.
///
/// # Examples
///
/// ```
/// use gateway_client::grpc_code_name;
///
/// assert_eq!(grpc_code_name(tonic::Code::NotFound), "NOT_FOUND");
/// assert_eq!(grpc_code_name(tonic::Code::InvalidArgument), "INVALID_ARGUMENT");
/// ```
#[must_use]
pub fn grpc_code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "CANCELLED",
        Code::Unknown => "UNKNOWN",
        Code::InvalidArgument => "INVALID_ARGUMENT",
        Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        Code::NotFound => "NOT_FOUND",
        Code::AlreadyExists => "ALREADY_EXISTS",
        Code::PermissionDenied => "PERMISSION_DENIED",
        Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
        Code::FailedPrecondition => "FAILED_PRECONDITION",
        Code::Aborted => "ABORTED",
        Code::OutOfRange => "OUT_OF_RANGE",
        Code::Unimplemented => "UNIMPLEMENTED",
        Code::Internal => "INTERNAL",
        Code::Unavailable => "UNAVAILABLE",
        Code::DataLoss => "DATA_LOSS",
        Code::Unauthenticated => "UNAUTHENTICATED",
    }
}
