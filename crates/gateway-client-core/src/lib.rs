//! Shared protobuf descriptor types for the gateway-client ecosystem.
//!
//! This crate provides custom [`prost::Message`] types that preserve the
//! `google.api.http` extension (field 72295728) and the
//! `google.api.field_visibility` extension (field 72295727), both of which
//! standard `prost_types` drops during decoding.
//!
//! `gateway-client-build` (build-time client codegen) depends on these shared
//! types. You should not need to depend on this crate directly — use the
//! higher-level crates instead.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;
