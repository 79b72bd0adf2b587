//! Service and method extraction from proto descriptors.

use std::collections::HashMap;

use gateway_client_core::descriptor::{
    http_binding, FileDescriptorSet, MethodDescriptorProto,
};

use super::bindings::{synthesize_method, MessageIndex};
use super::config::{GatewayCodegenConfig, GenerateError};
use super::types::{CallShape, MethodBinding, ServiceBindings};

/// Auto-discover packages from a descriptor set by finding services with
/// gateway-compatible methods.
pub(crate) fn discover_packages(fdset: &FileDescriptorSet) -> HashMap<String, String> {
    let mut packages = HashMap::new();

    for file in &fdset.file {
        let package = file.package.as_deref().unwrap_or("");
        if package.is_empty() {
            continue;
        }

        let has_gateway_methods = file
            .service
            .iter()
            .any(|svc| svc.method.iter().any(is_gateway_method));

        if has_gateway_methods {
            packages
                .entry(package.to_string())
                .or_insert_with(|| infer_rust_module(package));
        }
    }

    packages
}

/// Infer a Rust module path from a proto package name.
///
/// Converts dots to `::` to match standard `prost-build` module generation:
/// - `test.v1` → `test::v1`
/// - `org.service.v2` → `org::service::v2`
fn infer_rust_module(package: &str) -> String {
    package.replace('.', "::")
}

/// A method gets a client binding iff it carries a usable `google.api.http`
/// annotation and is not client-streaming (only unary and server-streaming
/// call shapes are supported).
pub(crate) fn is_gateway_method(method: &MethodDescriptorProto) -> bool {
    http_binding(method).is_some() && !method.client_streaming.unwrap_or(false)
}

pub(crate) fn extract_services(
    fdset: &FileDescriptorSet,
    index: &MessageIndex<'_>,
    config: &GatewayCodegenConfig,
) -> Result<Vec<ServiceBindings>, GenerateError> {
    let mut result = Vec::new();

    for file in &fdset.file {
        let package = file.package.as_deref().unwrap_or("");

        // Only process packages registered in the config
        if config.rust_module(package).is_none() {
            continue;
        }

        for service in &file.service {
            let service_name = service.name.as_deref().unwrap_or("").to_string();
            let mut methods = Vec::new();

            for method in &service.method {
                if let Some(binding) = extract_method_binding(method, index, config)? {
                    methods.push(binding);
                }
            }

            if !methods.is_empty() {
                result.push(ServiceBindings {
                    service_name,
                    methods,
                });
            }
        }
    }

    Ok(result)
}

fn extract_method_binding(
    method: &MethodDescriptorProto,
    index: &MessageIndex<'_>,
    config: &GatewayCodegenConfig,
) -> Result<Option<MethodBinding>, GenerateError> {
    if !is_gateway_method(method) {
        return Ok(None);
    }
    // Gated above: the annotation is present.
    let Some(binding) = http_binding(method) else {
        return Ok(None);
    };

    let proto_name = method.name.as_deref().unwrap_or("");
    let rust_name = super::to_snake_case(proto_name);
    let server_streaming = method.server_streaming.unwrap_or(false);

    let input_fqn = method.input_type.as_deref().unwrap_or("");
    let input_type = config.proto_type_to_rust(input_fqn);
    let raw_output = method.output_type.as_deref().unwrap_or("");
    let output_type = config.proto_type_to_rust(raw_output);

    let call_shape = match (server_streaming, raw_output) {
        (true, ".google.api.HttpBody") => CallShape::StreamingRaw,
        (true, _) => CallShape::Streaming,
        (false, ".google.api.HttpBody") => CallShape::UnaryRaw,
        (false, ".google.protobuf.Empty") => CallShape::UnaryEmpty,
        (false, _) => CallShape::Unary,
    };

    let plan = synthesize_method(method, &binding, index, config)?;

    Ok(Some(MethodBinding {
        rust_name,
        http_method: binding.method,
        pattern: binding.pattern,
        input_type,
        output_type,
        call_shape,
        path_params: plan.path_params,
        query: plan.query,
        body: plan.body,
    }))
}
