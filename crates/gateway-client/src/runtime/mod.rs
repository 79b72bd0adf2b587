//! Runtime types and utilities for generated gateway clients.
//!
//! This module provides the shared machinery that generated bindings
//! reference:
//! - [`GatewayClient`] — configured transport + base URL
//! - [`GatewayRequest`] — request construction (path substitution, query, body)
//! - [`CallMeta`] — explicit per-call metadata
//! - [`ServerStream`] — typed, cancellable server-streaming consumer
//! - [`GatewayError`] / [`StatusError`] — failure taxonomy
//! - [`http_to_grpc_code`] / [`grpc_code_name`] — status translation

mod body;
mod client;
mod error;
mod request;
mod sse;
mod status_map;
mod streaming;

pub use body::HttpBody;
pub use client::{CallMeta, GatewayClient, GatewayClientBuilder};
pub use error::{GatewayError, RpcStatus, StatusError};
pub use request::GatewayRequest;
pub use status_map::{grpc_code_name, http_to_grpc_code};
pub use streaming::ServerStream;
