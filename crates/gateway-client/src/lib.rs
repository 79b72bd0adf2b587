#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! # Types
//!
//! - [`GatewayClient`] — configured HTTP gateway client (base URL, transport, TLS toggle)
//! - [`GatewayRequest`] — one request under construction (path, query, body)
//! - [`CallMeta`] — explicit per-call metadata (authorization, extra headers)
//! - [`ServerStream`] — cancellable typed stream for server-streamed calls
//! - [`HttpBody`] — opaque content-type + bytes result for raw downloads
//! - [`GatewayError`] / [`StatusError`] — error taxonomy and RPC status errors
//! - [`http_to_grpc_code`] — fixed HTTP → gRPC status code mapping

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod runtime;

pub use runtime::*;

/// HTTP method type used by generated bindings (`Method::GET`, `Method::POST`, …).
pub use http::Method;
