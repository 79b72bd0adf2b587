#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codegen;

pub use codegen::{generate, GatewayCodegenConfig, GenerateError};
