//! Build-time gateway client generator.
//!
//! Reads the proto file descriptor set, extracts `google.api.http`
//! annotations, and generates typed REST/JSON client bindings that execute
//! through the `gateway-client` runtime.
//!
//! This keeps proto files as the single source of truth for the HTTP
//! surface a gateway exposes.
//!
//! # Architecture
//!
//! Generated code is thin — it builds a request from the method's rule
//! (path substitutions, flattened query parameters, or a JSON body) and
//! delegates to runtime entry points for sending, decoding, streaming, and
//! error mapping. Query flattening is planned as a language-neutral
//! statement tree and rendered by a printer, so the traversal stays free of
//! target-syntax concerns.

mod bindings;
mod config;
mod emit;
mod extract;
mod types;

pub use config::{GatewayCodegenConfig, GenerateError};

use gateway_client_core::descriptor::FileDescriptorSet;
use prost::Message as _;

/// Generate gateway client code from a compiled proto file descriptor set.
///
/// Uses the provided [`GatewayCodegenConfig`] to determine which packages to
/// process. Returns Rust source code to be written to
/// `OUT_DIR/gateway_clients.rs`.
///
/// When [`GatewayCodegenConfig::package`] was never called, packages are
/// auto-discovered by scanning for services with gateway-compatible methods
/// (a usable `google.api.http` annotation on a non-client-streaming method).
///
/// # Errors
///
/// Returns [`GenerateError`] if:
/// - `descriptor_bytes` is not a valid protobuf `FileDescriptorSet`
/// - a URL pattern placeholder matches no visible input field
/// - a body selector names a field the input message doesn't have
pub fn generate(
    descriptor_bytes: &[u8],
    config: &GatewayCodegenConfig,
) -> Result<String, GenerateError> {
    let fdset = FileDescriptorSet::decode(descriptor_bytes)?;

    // Resolve packages: use explicit mapping or auto-discover from descriptor
    let config = config.resolve(&fdset);

    let index = bindings::MessageIndex::build(&fdset);
    let services = extract::extract_services(&fdset, &index, &config)?;
    Ok(emit::generate_code(&services, &config))
}

/// Convert `CamelCase` to `snake_case` (matches prost/tonic output).
pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_uppercase() {
            if !result.is_empty() {
                // Insert underscore before uppercase when:
                // - preceded by lowercase (e.g., "List|U" → "list_u")
                // - preceded by uppercase followed by lowercase (e.g., "OA|u" → "o_au")
                let next_is_lower = chars.peek().is_some_and(|n| n.is_lowercase());
                let prev_is_lower = result.chars().last().is_some_and(char::is_lowercase);
                if prev_is_lower || next_is_lower {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert `snake_case` to `UpperCamelCase` (matches prost oneof/enum naming).
pub(crate) fn to_upper_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

impl GatewayCodegenConfig {
    /// Create a resolved copy of this config, auto-discovering packages if
    /// none are set.
    fn resolve(&self, fdset: &FileDescriptorSet) -> Self {
        let mut resolved = self.clone();
        if resolved.packages.is_empty() {
            resolved.packages = extract::discover_packages(fdset);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_client_core::descriptor::{
        field_label, field_type, DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
        FileDescriptorSet, HttpPattern, HttpRule, MethodDescriptorProto, MethodOptions,
        ServiceDescriptorProto,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    /// Build a method descriptor with an HTTP annotation.
    fn make_method(
        name: &str,
        input: &str,
        output: &str,
        pattern: HttpPattern,
        body: &str,
        server_streaming: bool,
    ) -> MethodDescriptorProto {
        MethodDescriptorProto {
            name: Some(name.to_string()),
            input_type: Some(input.to_string()),
            output_type: Some(output.to_string()),
            options: Some(MethodOptions {
                http: Some(HttpRule {
                    pattern: Some(pattern),
                    body: body.to_string(),
                }),
            }),
            client_streaming: None,
            server_streaming: Some(server_streaming),
        }
    }

    /// Build a message descriptor with typed fields.
    fn make_message(name: &str, fields: &[(&str, i32, Option<&str>)]) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_string()),
            field: fields
                .iter()
                .map(|(fname, ftype, type_name)| FieldDescriptorProto {
                    name: Some((*fname).to_string()),
                    label: Some(field_label::OPTIONAL),
                    r#type: Some(*ftype),
                    type_name: type_name.map(ToString::to_string),
                    oneof_index: None,
                    json_name: None,
                    options: None,
                    proto3_optional: None,
                })
                .collect(),
            nested_type: vec![],
            enum_type: vec![],
            options: None,
            oneof_decl: vec![],
        }
    }

    fn make_file(
        package: &str,
        messages: Vec<DescriptorProto>,
        services: Vec<ServiceDescriptorProto>,
    ) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(format!("{}.proto", package.replace('.', "_"))),
            package: Some(package.to_string()),
            message_type: messages,
            enum_type: vec![],
            service: services,
        }
    }

    /// Encode a `FileDescriptorSet` to bytes for `generate()`.
    fn encode_fdset(fdset: &FileDescriptorSet) -> Vec<u8> {
        fdset.encode_to_vec()
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("ListUsers"), "list_users");
        assert_eq!(to_snake_case("SendInvitation"), "send_invitation");
        assert_eq!(to_snake_case("GetOAuthUrl"), "get_o_auth_url");
        assert_eq!(to_snake_case("TrackInvitation"), "track_invitation");
        assert_eq!(to_snake_case("DownloadLargeFile"), "download_large_file");
    }

    #[test]
    fn snake_case_edge_cases() {
        assert_eq!(to_snake_case(""), "");
        assert_eq!(to_snake_case("a"), "a");
        assert_eq!(to_snake_case("A"), "a");
        assert_eq!(to_snake_case("AB"), "a_b");
        assert_eq!(to_snake_case("ABc"), "a_bc");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_to_upper_camel_case() {
        assert_eq!(to_upper_camel_case("event_type"), "EventType");
        assert_eq!(to_upper_camel_case("contact"), "Contact");
        assert_eq!(to_upper_camel_case("id"), "Id");
        assert_eq!(to_upper_camel_case(""), "");
    }

    #[test]
    fn test_proto_type_to_rust_default_root() {
        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        assert_eq!(
            config.proto_type_to_rust(".test.v1.Item"),
            "crate::test::Item"
        );
        assert_eq!(config.proto_type_to_rust(".google.protobuf.Empty"), "()");
    }

    #[test]
    fn test_proto_type_to_rust_custom_root() {
        let config = GatewayCodegenConfig::new()
            .package("test.v1", "test")
            .proto_root("test_proto");
        assert_eq!(
            config.proto_type_to_rust(".test.v1.Item"),
            "test_proto::test::Item"
        );
    }

    #[test]
    fn proto_type_to_rust_fallback() {
        let config = GatewayCodegenConfig::new();
        // Not in the package map, ≥3 segments → first-segment heuristic
        assert_eq!(
            config.proto_type_to_rust(".users.v1.User"),
            "crate::users::User"
        );
        // Fewer than 3 segments → returned as-is
        assert_eq!(config.proto_type_to_rust("Foo"), "Foo");
    }

    #[test]
    fn config_default_values() {
        let config = GatewayCodegenConfig::new();
        assert!(config.packages.is_empty());
        assert_eq!(config.proto_root, "crate");
        assert_eq!(config.runtime_crate, "gateway_client");
    }

    #[test]
    fn config_builder_chain() {
        let config = GatewayCodegenConfig::new()
            .package("test.v1", "test")
            .package("users.v1", "users")
            .proto_root("my_proto")
            .runtime_crate("my_runtime");

        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.rust_module("test.v1"), Some("test"));
        assert_eq!(config.rust_module("unknown"), None);
        assert_eq!(config.proto_root, "my_proto");
        assert_eq!(config.runtime_crate, "my_runtime");
    }

    #[test]
    fn generate_returns_error_on_invalid_bytes() {
        let config = GatewayCodegenConfig::new();
        let result = generate(b"not a valid protobuf", &config);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("failed to decode"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn generate_error_display() {
        let err = GenerateError::UnmatchedPathParam {
            method: "GetItem".to_string(),
            param: "item_id".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GetItem"), "should contain method: {msg}");
        assert!(msg.contains("{item_id}"), "should contain param: {msg}");

        let err = GenerateError::UnknownBodyField {
            method: "CreateItem".to_string(),
            selector: "nope".to_string(),
        };
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn generate_error_is_std_error() {
        let err = GenerateError::Config("error".to_string());
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn generate_empty_descriptor() {
        let fdset = FileDescriptorSet { file: vec![] };
        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();
        assert!(code.contains("Generated by gateway-client-build"));
        syn::parse_file(&code).expect("empty-descriptor code should be valid Rust syntax");
    }

    #[test]
    fn generate_skips_unregistered_packages() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "other.v1",
                vec![make_message("Req", &[("name", field_type::STRING, None)])],
                vec![ServiceDescriptorProto {
                    name: Some("OtherService".to_string()),
                    method: vec![make_method(
                        "DoStuff",
                        ".other.v1.Req",
                        ".other.v1.Req",
                        HttpPattern::Post("/v1/stuff".to_string()),
                        "*",
                        false,
                    )],
                }],
            )],
        };
        // Config only registers "test.v1", not "other.v1"
        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();
        assert!(!code.contains("OtherServiceGatewayClient"));
    }

    /// Basic CRUD service: POST (body), GET (query + path param), DELETE
    /// (path param, empty return).
    #[test]
    fn generate_basic_crud() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![
                    make_message("CreateItemRequest", &[("name", field_type::STRING, None)]),
                    make_message(
                        "GetItemRequest",
                        &[
                            ("item_id", field_type::STRING, None),
                            ("filter", field_type::STRING, None),
                        ],
                    ),
                    make_message("DeleteItemRequest", &[("item_id", field_type::STRING, None)]),
                    make_message("Item", &[("id", field_type::STRING, None)]),
                ],
                vec![ServiceDescriptorProto {
                    name: Some("ItemService".to_string()),
                    method: vec![
                        make_method(
                            "CreateItem",
                            ".test.v1.CreateItemRequest",
                            ".test.v1.Item",
                            HttpPattern::Post("/v1/items".to_string()),
                            "*",
                            false,
                        ),
                        make_method(
                            "GetItem",
                            ".test.v1.GetItemRequest",
                            ".test.v1.Item",
                            HttpPattern::Get("/v1/items/{item_id}".to_string()),
                            "",
                            false,
                        ),
                        make_method(
                            "DeleteItem",
                            ".test.v1.DeleteItemRequest",
                            ".google.protobuf.Empty",
                            HttpPattern::Delete("/v1/items/{item_id}".to_string()),
                            "",
                            false,
                        ),
                    ],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();

        assert!(code.contains("pub struct ItemServiceGatewayClient"));
        assert!(code.contains("pub async fn create_item"));
        assert!(code.contains("pub async fn get_item"));
        assert!(code.contains("pub async fn delete_item"));
        assert!(code.contains("gateway_client::Method::POST"));
        assert!(code.contains("gateway_client::Method::GET"));
        assert!(code.contains("gateway_client::Method::DELETE"));
        assert!(code.contains("gw_req.json_body(&req)?;"));
        assert!(code.contains("gw_req.path_param(\"item_id\", req.item_id.to_string());"));
        // GET: the path-bound field never reaches the query plan.
        assert!(code.contains("q.push((\"filter\".to_string(), req.filter.to_string()));"));
        assert!(!code.contains("q.push((\"itemId\""));
        // Empty output → unary_empty, body discarded.
        assert!(code.contains("self.gwc.unary_empty(meta, gw_req).await"));

        syn::parse_file(&code).expect("generated code should be valid Rust syntax");
    }

    /// Full-text comparison for one small service.
    #[test]
    fn generate_get_method_text() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![
                    make_message(
                        "GetItemRequest",
                        &[
                            ("item_id", field_type::STRING, None),
                            ("filter", field_type::STRING, None),
                        ],
                    ),
                    make_message("Item", &[("id", field_type::STRING, None)]),
                ],
                vec![ServiceDescriptorProto {
                    name: Some("ItemService".to_string()),
                    method: vec![make_method(
                        "GetItem",
                        ".test.v1.GetItemRequest",
                        ".test.v1.Item",
                        HttpPattern::Get("/v1/items/{item_id}".to_string()),
                        "",
                        false,
                    )],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();

        let expected = indoc! {r#"
            // Generated by gateway-client-build. DO NOT EDIT.
            //
            // REST/JSON gateway client bindings for services annotated with
            // google.api.http rules.

            /// REST/JSON gateway client for `ItemService`.
            ///
            /// Generated from `google.api.http` annotations; each method builds an
            /// HTTP request from its rule and delegates to the gateway runtime.
            pub struct ItemServiceGatewayClient {
                gwc: gateway_client::GatewayClient,
            }

            impl ItemServiceGatewayClient {
                /// Create a client that issues calls through `gwc`.
                pub fn new(gwc: gateway_client::GatewayClient) -> Self {
                    Self { gwc }
                }

                pub async fn get_item(
                    &self,
                    meta: gateway_client::CallMeta,
                    req: crate::test::GetItemRequest,
                ) -> Result<crate::test::Item, gateway_client::GatewayError> {
                    let mut gw_req = self
                        .gwc
                        .request(gateway_client::Method::GET, "/v1/items/{item_id}");
                    gw_req.path_param("item_id", req.item_id.to_string());
                    let mut q: Vec<(String, String)> = Vec::new();
                    q.push(("filter".to_string(), req.filter.to_string()));
                    gw_req.query(q);
                    self.gwc.unary(meta, gw_req).await
                }
            }
        "#};
        assert_eq!(code, expected);
    }

    /// Streaming methods pick the streaming runtime entry points.
    #[test]
    fn generate_streaming_shapes() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![
                    make_message("TrackRequest", &[("id", field_type::STRING, None)]),
                    make_message("TrackResponse", &[("seq", field_type::INT64, None)]),
                    make_message("DownloadRequest", &[("id", field_type::STRING, None)]),
                ],
                vec![ServiceDescriptorProto {
                    name: Some("TrackService".to_string()),
                    method: vec![
                        make_method(
                            "Track",
                            ".test.v1.TrackRequest",
                            ".test.v1.TrackResponse",
                            HttpPattern::Get("/v1/track/{id}".to_string()),
                            "",
                            true,
                        ),
                        make_method(
                            "Download",
                            ".test.v1.DownloadRequest",
                            ".google.api.HttpBody",
                            HttpPattern::Get("/v1/download/{id}".to_string()),
                            "",
                            true,
                        ),
                        make_method(
                            "Fetch",
                            ".test.v1.DownloadRequest",
                            ".google.api.HttpBody",
                            HttpPattern::Get("/v1/fetch/{id}".to_string()),
                            "",
                            false,
                        ),
                    ],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();

        assert!(code
            .contains("Result<gateway_client::ServerStream<crate::test::TrackResponse>, gateway_client::GatewayError>"));
        assert!(code.contains("self.gwc.server_streaming(meta, gw_req).await"));
        assert!(code
            .contains("Result<gateway_client::ServerStream<gateway_client::HttpBody>, gateway_client::GatewayError>"));
        assert!(code.contains("self.gwc.server_streaming_raw(meta, gw_req).await"));
        assert!(code.contains("Result<gateway_client::HttpBody, gateway_client::GatewayError>"));
        assert!(code.contains("self.gwc.unary_raw(meta, gw_req).await"));

        syn::parse_file(&code).expect("generated code should be valid Rust syntax");
    }

    /// Client-streaming methods and methods without annotations are skipped.
    #[test]
    fn generate_skips_incompatible_methods() {
        let mut client_streaming = make_method(
            "Upload",
            ".test.v1.Req",
            ".test.v1.Req",
            HttpPattern::Post("/v1/upload".to_string()),
            "*",
            false,
        );
        client_streaming.client_streaming = Some(true);

        let no_rule = MethodDescriptorProto {
            name: Some("Plain".to_string()),
            input_type: Some(".test.v1.Req".to_string()),
            output_type: Some(".test.v1.Req".to_string()),
            options: None,
            client_streaming: None,
            server_streaming: None,
        };

        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![make_message("Req", &[("name", field_type::STRING, None)])],
                vec![ServiceDescriptorProto {
                    name: Some("MixedService".to_string()),
                    method: vec![
                        client_streaming,
                        no_rule,
                        make_method(
                            "Keep",
                            ".test.v1.Req",
                            ".test.v1.Req",
                            HttpPattern::Get("/v1/keep".to_string()),
                            "",
                            false,
                        ),
                    ],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();
        assert!(!code.contains("pub async fn upload"));
        assert!(!code.contains("pub async fn plain"));
        assert!(code.contains("pub async fn keep"));
        syn::parse_file(&code).expect("generated code should be valid Rust syntax");
    }

    /// Unmatched path placeholders abort generation.
    #[test]
    fn generate_unmatched_placeholder_errors() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![make_message("Req", &[("name", field_type::STRING, None)])],
                vec![ServiceDescriptorProto {
                    name: Some("ItemService".to_string()),
                    method: vec![make_method(
                        "GetItem",
                        ".test.v1.Req",
                        ".test.v1.Req",
                        HttpPattern::Get("/v1/items/{item_id}".to_string()),
                        "",
                        false,
                    )],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let err = generate(&encode_fdset(&fdset), &config).unwrap_err();
        assert!(
            matches!(err, GenerateError::UnmatchedPathParam { ref param, .. } if param == "item_id"),
            "unexpected error: {err}",
        );
    }

    /// Auto-discovery finds annotated services without explicit packages.
    #[test]
    fn auto_discover_packages() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "auto.v1",
                vec![
                    make_message("PingRequest", &[]),
                    make_message("PingResponse", &[("ok", field_type::BOOL, None)]),
                ],
                vec![ServiceDescriptorProto {
                    name: Some("HealthService".to_string()),
                    method: vec![make_method(
                        "Ping",
                        ".auto.v1.PingRequest",
                        ".auto.v1.PingResponse",
                        HttpPattern::Get("/v1/health/ping".to_string()),
                        "",
                        false,
                    )],
                }],
            )],
        };

        // No packages registered — auto-discovery should kick in
        let config = GatewayCodegenConfig::new();
        let code = generate(&encode_fdset(&fdset), &config).unwrap();
        assert!(
            code.contains("HealthServiceGatewayClient"),
            "auto-discovered service should produce a client",
        );
        // Inferred module path: auto.v1 → auto::v1
        assert!(code.contains("crate::auto::v1::PingResponse"));
        syn::parse_file(&code).expect("auto-discovered code should be valid Rust");
    }

    /// Body selectors narrow the marshalled payload to one field.
    #[test]
    fn generate_partial_body_selector() {
        let fdset = FileDescriptorSet {
            file: vec![make_file(
                "test.v1",
                vec![
                    make_message(
                        "UpdateItemRequest",
                        &[
                            ("item_id", field_type::STRING, None),
                            ("item", field_type::MESSAGE, Some(".test.v1.Item")),
                        ],
                    ),
                    make_message("Item", &[("name", field_type::STRING, None)]),
                ],
                vec![ServiceDescriptorProto {
                    name: Some("ItemService".to_string()),
                    method: vec![make_method(
                        "UpdateItem",
                        ".test.v1.UpdateItemRequest",
                        ".test.v1.Item",
                        HttpPattern::Patch("/v1/items/{item_id}".to_string()),
                        "item",
                        false,
                    )],
                }],
            )],
        };

        let config = GatewayCodegenConfig::new().package("test.v1", "test");
        let code = generate(&encode_fdset(&fdset), &config).unwrap();
        assert!(code.contains("gw_req.json_body(&req.item)?;"));
        assert!(!code.contains("let mut q"));
        syn::parse_file(&code).expect("generated code should be valid Rust syntax");
    }
}
