//! Minimal protobuf descriptor types with `google.api` extension support.
//!
//! Standard [`prost_types`] drops two extensions the client generator needs:
//! the `google.api.http` method annotation (field 72295728) and the
//! `google.api.field_visibility` field annotation (field 72295727), because
//! prost doesn't retain unknown fields. These custom types preserve both.
//!
//! Unlike the upstream descriptor mirror this keeps only what binding
//! synthesis consumes: field labels, JSON names, oneof membership,
//! `proto3_optional`, and the `map_entry` marker.

#[allow(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
mod types {
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorSet {
        #[prost(message, repeated, tag = "1")]
        pub file: Vec<FileDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub package: Option<String>,
        #[prost(message, repeated, tag = "4")]
        pub message_type: Vec<DescriptorProto>,
        #[prost(message, repeated, tag = "5")]
        pub enum_type: Vec<EnumDescriptorProto>,
        #[prost(message, repeated, tag = "6")]
        pub service: Vec<ServiceDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct DescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub field: Vec<FieldDescriptorProto>,
        #[prost(message, repeated, tag = "3")]
        pub nested_type: Vec<DescriptorProto>,
        #[prost(message, repeated, tag = "4")]
        pub enum_type: Vec<EnumDescriptorProto>,
        #[prost(message, optional, tag = "7")]
        pub options: Option<MessageOptions>,
        #[prost(message, repeated, tag = "8")]
        pub oneof_decl: Vec<OneofDescriptorProto>,
    }

    /// Message-level options; `map_entry` marks synthesized map entry types.
    #[derive(Clone, PartialEq, Message)]
    pub struct MessageOptions {
        #[prost(bool, optional, tag = "7")]
        pub map_entry: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct OneofDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FieldDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        /// Cardinality: 1=optional, 2=required, 3=repeated.
        #[prost(int32, optional, tag = "4")]
        pub label: Option<i32>,
        /// Protobuf field type enum: 1=double, 5=int32, 9=string, 11=message, 14=enum, …
        #[prost(int32, optional, tag = "5")]
        pub r#type: Option<i32>,
        /// Fully-qualified type name for message/enum fields (e.g., `.test.v1.EventType`).
        #[prost(string, optional, tag = "6")]
        pub type_name: Option<String>,
        /// Index into the containing message's `oneof_decl` list.
        #[prost(int32, optional, tag = "9")]
        pub oneof_index: Option<i32>,
        /// JSON mapping name (lowerCamelCase); protoc always fills this in.
        #[prost(string, optional, tag = "10")]
        pub json_name: Option<String>,
        /// Field-level options including the visibility restriction.
        #[prost(message, optional, tag = "8")]
        pub options: Option<FieldOptions>,
        /// True for proto3 `optional` fields (synthetic-oneof presence).
        #[prost(bool, optional, tag = "17")]
        pub proto3_optional: Option<bool>,
    }

    /// Field-level options with the `google.api.field_visibility` extension.
    #[derive(Clone, PartialEq, Message)]
    pub struct FieldOptions {
        #[prost(message, optional, tag = "72295727")]
        pub field_visibility: Option<VisibilityRule>,
    }

    /// `google.api.VisibilityRule` — comma-separated restriction labels.
    #[derive(Clone, PartialEq, Message)]
    pub struct VisibilityRule {
        #[prost(string, tag = "1")]
        pub restriction: String,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub value: Vec<EnumValueDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumValueDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(int32, optional, tag = "2")]
        pub number: Option<i32>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct ServiceDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub method: Vec<MethodDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct MethodDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub input_type: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub output_type: Option<String>,
        #[prost(message, optional, tag = "4")]
        pub options: Option<MethodOptions>,
        #[prost(bool, optional, tag = "5")]
        pub client_streaming: Option<bool>,
        #[prost(bool, optional, tag = "6")]
        pub server_streaming: Option<bool>,
    }

    /// Method options with the `google.api.http` extension (field 72295728).
    #[derive(Clone, PartialEq, Message)]
    pub struct MethodOptions {
        #[prost(message, optional, tag = "72295728")]
        pub http: Option<HttpRule>,
    }

    /// [`google.api.HttpRule`] — defines the REST mapping for an RPC.
    #[derive(Clone, PartialEq, Message)]
    pub struct HttpRule {
        #[prost(oneof = "HttpPattern", tags = "2, 3, 4, 5, 6")]
        pub pattern: Option<HttpPattern>,
        #[prost(string, tag = "7")]
        pub body: String,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum HttpPattern {
        #[prost(string, tag = "2")]
        Get(String),
        #[prost(string, tag = "3")]
        Put(String),
        #[prost(string, tag = "4")]
        Post(String),
        #[prost(string, tag = "5")]
        Delete(String),
        #[prost(string, tag = "6")]
        Patch(String),
    }
}

pub use types::*;

/// Proto field type constants (from `google.protobuf.FieldDescriptorProto.Type`).
pub mod field_type {
    /// `TYPE_DOUBLE = 1`
    pub const DOUBLE: i32 = 1;
    /// `TYPE_FLOAT = 2`
    pub const FLOAT: i32 = 2;
    /// `TYPE_INT64 = 3`
    pub const INT64: i32 = 3;
    /// `TYPE_UINT64 = 4`
    pub const UINT64: i32 = 4;
    /// `TYPE_INT32 = 5`
    pub const INT32: i32 = 5;
    /// `TYPE_BOOL = 8`
    pub const BOOL: i32 = 8;
    /// `TYPE_STRING = 9`
    pub const STRING: i32 = 9;
    /// `TYPE_MESSAGE = 11`
    pub const MESSAGE: i32 = 11;
    /// `TYPE_BYTES = 12`
    pub const BYTES: i32 = 12;
    /// `TYPE_UINT32 = 13`
    pub const UINT32: i32 = 13;
    /// `TYPE_ENUM = 14`
    pub const ENUM: i32 = 14;
}

/// Proto field label constants (from `google.protobuf.FieldDescriptorProto.Label`).
pub mod field_label {
    /// `LABEL_OPTIONAL = 1`
    pub const OPTIONAL: i32 = 1;
    /// `LABEL_REPEATED = 3`
    pub const REPEATED: i32 = 3;
}

/// HTTP verb recognized from a `google.api.http` pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// `get:` pattern
    Get,
    /// `put:` pattern
    Put,
    /// `post:` pattern
    Post,
    /// `delete:` pattern
    Delete,
    /// `patch:` pattern
    Patch,
}

impl HttpMethod {
    /// Canonical upper-case verb, as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Whether this verb may carry a request body per the transcoding rules.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// One method's normalized REST binding: verb, URL pattern, body selector.
///
/// `body` is `"*"` (whole request), a top-level field name, or `""` (no
/// body). GET bindings never carry a selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBinding {
    /// HTTP verb.
    pub method: HttpMethod,
    /// URL pattern with `{name}` placeholders.
    pub pattern: String,
    /// Body selector (`"*"`, a field name, or empty).
    pub body: String,
}

/// Extract the normalized [`HttpBinding`] from a method's `google.api.http`
/// annotation.
///
/// Recognizes exactly one of the five verb patterns; a method without an
/// annotation (or with an empty pattern oneof) returns `None`. Verb
/// combinations are not supported — the single pattern present wins.
#[must_use]
pub fn http_binding(method: &MethodDescriptorProto) -> Option<HttpBinding> {
    let rule = method.options.as_ref().and_then(|o| o.http.as_ref())?;
    let (verb, pattern) = match rule.pattern.as_ref()? {
        HttpPattern::Get(p) => (HttpMethod::Get, p),
        HttpPattern::Put(p) => (HttpMethod::Put, p),
        HttpPattern::Post(p) => (HttpMethod::Post, p),
        HttpPattern::Delete(p) => (HttpMethod::Delete, p),
        HttpPattern::Patch(p) => (HttpMethod::Patch, p),
    };
    Some(HttpBinding {
        method: verb,
        pattern: pattern.clone(),
        body: if verb.allows_body() {
            rule.body.clone()
        } else {
            String::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;

    fn method_with_rule(pattern: Option<HttpPattern>, body: &str) -> MethodDescriptorProto {
        MethodDescriptorProto {
            name: Some("TestMethod".to_string()),
            input_type: Some(".test.v1.Request".to_string()),
            output_type: Some(".test.v1.Response".to_string()),
            options: Some(MethodOptions {
                http: Some(HttpRule {
                    pattern,
                    body: body.to_string(),
                }),
            }),
            client_streaming: None,
            server_streaming: None,
        }
    }

    #[test]
    fn binding_get() {
        let method = method_with_rule(Some(HttpPattern::Get("/v1/items".to_string())), "");
        let binding = http_binding(&method).unwrap();
        assert_eq!(binding.method, HttpMethod::Get);
        assert_eq!(binding.pattern, "/v1/items");
        assert_eq!(binding.body, "");
    }

    #[test]
    fn binding_post_with_body() {
        let method = method_with_rule(Some(HttpPattern::Post("/v1/items".to_string())), "*");
        let binding = http_binding(&method).unwrap();
        assert_eq!(binding.method, HttpMethod::Post);
        assert_eq!(binding.body, "*");
    }

    #[test]
    fn binding_put_patch_delete() {
        for (pattern, verb) in [
            (HttpPattern::Put("/v1/items/{id}".to_string()), HttpMethod::Put),
            (HttpPattern::Patch("/v1/items/{id}".to_string()), HttpMethod::Patch),
            (HttpPattern::Delete("/v1/items/{id}".to_string()), HttpMethod::Delete),
        ] {
            let method = method_with_rule(Some(pattern), "item");
            let binding = http_binding(&method).unwrap();
            assert_eq!(binding.method, verb);
            assert_eq!(binding.pattern, "/v1/items/{id}");
            assert_eq!(binding.body, "item");
        }
    }

    /// GET patterns never carry a body selector even if the rule sets one.
    #[test]
    fn binding_get_ignores_body_selector() {
        let method = method_with_rule(Some(HttpPattern::Get("/v1/items".to_string())), "*");
        let binding = http_binding(&method).unwrap();
        assert_eq!(binding.body, "");
    }

    #[test]
    fn binding_none_without_options() {
        let method = MethodDescriptorProto {
            name: Some("NoOptions".to_string()),
            input_type: None,
            output_type: None,
            options: None,
            client_streaming: None,
            server_streaming: None,
        };
        assert!(http_binding(&method).is_none());
    }

    #[test]
    fn binding_none_without_pattern() {
        let method = method_with_rule(None, "*");
        assert!(http_binding(&method).is_none());
    }

    #[test]
    fn http_method_strings() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
        assert!(!HttpMethod::Get.allows_body());
        assert!(HttpMethod::Delete.allows_body());
    }

    #[test]
    fn field_type_constants() {
        assert_eq!(field_type::STRING, 9);
        assert_eq!(field_type::ENUM, 14);
        assert_eq!(field_label::REPEATED, 3);
    }

    /// Round-trip: encode → decode a `FileDescriptorSet` with annotations
    /// and visibility rules.
    #[test]
    fn descriptor_round_trip() {
        let original = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("test.proto".to_string()),
                package: Some("test.v1".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("Req".to_string()),
                    field: vec![FieldDescriptorProto {
                        name: Some("internal_id".to_string()),
                        label: Some(field_label::OPTIONAL),
                        r#type: Some(field_type::STRING),
                        type_name: None,
                        oneof_index: None,
                        json_name: Some("internalId".to_string()),
                        options: Some(FieldOptions {
                            field_visibility: Some(VisibilityRule {
                                restriction: "INTERNAL".to_string(),
                            }),
                        }),
                        proto3_optional: None,
                    }],
                    nested_type: vec![],
                    enum_type: vec![],
                    options: None,
                    oneof_decl: vec![],
                }],
                enum_type: vec![],
                service: vec![ServiceDescriptorProto {
                    name: Some("Svc".to_string()),
                    method: vec![method_with_rule(
                        Some(HttpPattern::Post("/v1/test".to_string())),
                        "*",
                    )],
                }],
            }],
        };

        let bytes = original.encode_to_vec();
        let decoded = FileDescriptorSet::decode(bytes.as_slice()).unwrap();
        assert_eq!(original, decoded);
        let vis = decoded.file[0].message_type[0].field[0]
            .options
            .as_ref()
            .and_then(|o| o.field_visibility.as_ref())
            .unwrap();
        assert_eq!(vis.restriction, "INTERNAL");
    }
}
