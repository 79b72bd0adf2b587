//! Configuration for gateway client code generation.

use std::collections::HashMap;

/// Error returned by [`generate`](super::generate).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerateError {
    /// Proto `FileDescriptorSet` decoding failure.
    #[error("failed to decode FileDescriptorSet: {0}")]
    ProtoDecode(#[from] prost::DecodeError),

    /// A URL pattern placeholder has no matching input field.
    #[error("method '{method}': no input field matches path placeholder '{{{param}}}'")]
    UnmatchedPathParam {
        /// Proto method name.
        method: String,
        /// Placeholder text (without braces).
        param: String,
    },

    /// A body selector names a field the input message doesn't have.
    #[error("method '{method}': body selector '{selector}' does not name a usable request field")]
    UnknownBodyField {
        /// Proto method name.
        method: String,
        /// The offending selector.
        selector: String,
    },

    /// Generic configuration error.
    #[error("{0}")]
    Config(String),
}

/// Configuration for gateway client code generation.
///
/// Decouples the generator from any specific service — all project-specific
/// knowledge (which packages to process, where the proto types and the
/// runtime crate live) is passed in rather than hardcoded.
///
/// # Auto-Discovery
///
/// When no packages are registered, [`generate`](super::generate)
/// automatically discovers all services with gateway-compatible methods in
/// the descriptor set, inferring Rust module paths from proto package names
/// (dots → `::`, e.g., `test.v1` → `test::v1`). This matches standard
/// `prost-build` module generation.
///
/// # Examples
///
/// ```ignore
/// let config = GatewayCodegenConfig::new()
///     .package("test.v1", "test")
///     .proto_root("crate")
///     .runtime_crate("gateway_client");
///
/// let code = gateway_client_build::generate(&descriptor_bytes, &config)?;
/// ```
#[derive(Clone, Debug)]
pub struct GatewayCodegenConfig {
    /// Proto package → Rust module mapping.
    ///
    /// When empty, packages are auto-discovered from the descriptor set.
    /// When set explicitly, only listed packages are processed:
    /// - Key: proto package name (e.g., `"test.v1"`)
    /// - Value: Rust module path (e.g., `"test"` or `"test::v1"`)
    pub(crate) packages: HashMap<String, String>,

    /// Root module for proto-generated types (default: `"crate"`).
    ///
    /// Used to convert `.test.v1.Item` → `{proto_root}::test::Item`.
    pub(crate) proto_root: String,

    /// Path to the runtime crate (default: `"gateway_client"`).
    ///
    /// Generated clients reference `{runtime_crate}::GatewayClient`, etc.
    pub(crate) runtime_crate: String,
}

impl Default for GatewayCodegenConfig {
    fn default() -> Self {
        Self {
            packages: HashMap::new(),
            proto_root: "crate".to_string(),
            runtime_crate: "gateway_client".to_string(),
        }
    }
}

impl GatewayCodegenConfig {
    /// Create a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proto package for client generation.
    ///
    /// When at least one package is registered, only registered packages are
    /// processed (auto-discovery is disabled).
    #[must_use]
    pub fn package(mut self, proto_package: &str, rust_module: &str) -> Self {
        self.packages
            .insert(proto_package.to_string(), rust_module.to_string());
        self
    }

    /// Set the root module path for proto-generated types.
    ///
    /// Default: `"crate"` — converts `.test.v1.Item` → `crate::test::Item`.
    #[must_use]
    pub fn proto_root(mut self, root: &str) -> Self {
        self.proto_root = root.to_string();
        self
    }

    /// Set the runtime crate path referenced by generated clients.
    ///
    /// Default: `"gateway_client"`. Set to `"crate::gateway"` if the runtime
    /// types are re-exported from within the consuming crate.
    #[must_use]
    pub fn runtime_crate(mut self, path: &str) -> Self {
        self.runtime_crate = path.to_string();
        self
    }

    /// Resolve a proto package name to its Rust module name.
    pub(crate) fn rust_module(&self, proto_package: &str) -> Option<&str> {
        self.packages.get(proto_package).map(String::as_str)
    }

    /// Convert a fully-qualified proto type to a Rust type path.
    ///
    /// Uses the resolved packages map for accurate module resolution:
    /// - `.test.v1.Item` → `{proto_root}::test::Item` (with `.package("test.v1", "test")`)
    /// - `.test.v1.Item` → `{proto_root}::test::v1::Item` (auto-discovered)
    /// - `.google.protobuf.Empty` → `()`
    ///
    /// Falls back to a first-segment heuristic for types whose package is
    /// not in the resolved map (cross-package references).
    pub(crate) fn proto_type_to_rust(&self, proto_fqn: &str) -> String {
        if proto_fqn == ".google.protobuf.Empty" {
            return "()".to_string();
        }

        let trimmed = proto_fqn.trim_start_matches('.');

        // Find the longest matching package prefix in the packages map
        let mut best: Option<(&str, &str)> = None;
        for (package, module) in &self.packages {
            if let Some(rest) = trimmed.strip_prefix(package.as_str()) {
                if rest.starts_with('.') && best.is_none_or(|(p, _)| package.len() > p.len()) {
                    best = Some((package.as_str(), module.as_str()));
                }
            }
        }

        if let Some((package, module)) = best {
            let type_name = &trimmed[package.len() + 1..];
            format!("{}::{module}::{type_name}", self.proto_root)
        } else {
            // Fallback: use first segment as module name
            let parts: Vec<&str> = trimmed.split('.').collect();
            if parts.len() >= 3 {
                let package = parts[0];
                let type_name = parts[parts.len() - 1];
                format!("{}::{package}::{type_name}", self.proto_root)
            } else {
                proto_fqn.to_string()
            }
        }
    }
}
