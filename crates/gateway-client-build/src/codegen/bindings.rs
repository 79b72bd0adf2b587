//! Query/path parameter synthesis.
//!
//! For one method this produces the complete field-binding plan: path
//! substitutions for every `{name}` placeholder, the query statement tree
//! for all remaining fields, and the body binding for body-carrying verbs.
//!
//! The walk is depth-first in field declaration order. Classification rules,
//! in priority order: visibility restriction (field dropped everywhere),
//! path consumption (field and its descendants dropped from the query),
//! body selector, then query flattening by field kind. All traversal state
//! is carried in explicit parameters.

use std::collections::{HashMap, HashSet};

use gateway_client_core::descriptor::{
    field_label, field_type, DescriptorProto, FieldDescriptorProto, FileDescriptorSet,
    HttpBinding, MethodDescriptorProto,
};

use super::config::{GatewayCodegenConfig, GenerateError};
use super::types::{
    Accessor, BodyBinding, KeySeg, PathBinding, PathValue, Stmt, ValueExpr, ValueFmt,
};
use super::{to_snake_case, to_upper_camel_case};

/// Lookup table: fully-qualified message name (leading dot) → descriptor.
pub(crate) struct MessageIndex<'a> {
    messages: HashMap<String, &'a DescriptorProto>,
}

impl<'a> MessageIndex<'a> {
    /// Collect every message in the set, including nested and map-entry types.
    pub(crate) fn build(fdset: &'a FileDescriptorSet) -> Self {
        let mut messages = HashMap::new();
        for file in &fdset.file {
            let package = file.package.as_deref().unwrap_or("");
            for msg in &file.message_type {
                collect_messages(&mut messages, &format!(".{package}"), msg);
            }
        }
        Self { messages }
    }

    pub(crate) fn get(&self, fqn: &str) -> Option<&'a DescriptorProto> {
        self.messages.get(fqn).copied()
    }

    /// Whether `fqn` names a synthesized map entry message.
    fn is_map_entry(&self, fqn: &str) -> bool {
        self.get(fqn)
            .and_then(|m| m.options.as_ref())
            .and_then(|o| o.map_entry)
            .unwrap_or(false)
    }
}

fn collect_messages<'a>(
    map: &mut HashMap<String, &'a DescriptorProto>,
    parent_path: &str,
    msg: &'a DescriptorProto,
) {
    let fqn = format!("{parent_path}.{}", msg.name.as_deref().unwrap_or(""));
    for nested in &msg.nested_type {
        collect_messages(map, &fqn, nested);
    }
    map.insert(fqn, msg);
}

/// Complete binding plan for one method.
#[derive(Debug)]
pub(crate) struct MethodPlan {
    pub path_params: Vec<PathBinding>,
    pub query: Vec<Stmt>,
    pub body: Option<BodyBinding>,
}

/// JSON mapping name of a field: `json_name` from the descriptor, or the
/// lowerCamelCase derivation protoc would have produced.
fn json_name(field: &FieldDescriptorProto) -> String {
    if let Some(name) = field.json_name.as_deref() {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    lower_camel(field.name.as_deref().unwrap_or(""))
}

fn lower_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// A field with a non-empty visibility restriction never reaches any
/// binding kind.
fn is_restricted(field: &FieldDescriptorProto) -> bool {
    field
        .options
        .as_ref()
        .and_then(|o| o.field_visibility.as_ref())
        .is_some_and(|rule| !rule.restriction.trim().is_empty())
}

fn is_repeated(field: &FieldDescriptorProto) -> bool {
    field.label == Some(field_label::REPEATED)
}

fn is_message(field: &FieldDescriptorProto) -> bool {
    field.r#type == Some(field_type::MESSAGE)
}

fn is_enum(field: &FieldDescriptorProto) -> bool {
    field.r#type == Some(field_type::ENUM)
}

/// Real oneof membership — proto3 `optional` fields sit in synthetic
/// oneofs and are not treated as oneof members.
fn oneof_name<'a>(field: &FieldDescriptorProto, parent: &'a DescriptorProto) -> Option<&'a str> {
    if field.proto3_optional.unwrap_or(false) {
        return None;
    }
    let index = usize::try_from(field.oneof_index?).ok()?;
    parent.oneof_decl.get(index)?.name.as_deref()
}

fn scalar_fmt(field: &FieldDescriptorProto) -> ValueFmt {
    if field.r#type == Some(field_type::BYTES) {
        ValueFmt::Debug
    } else {
        ValueFmt::Display
    }
}

/// Scan `{name}` placeholders out of a URL pattern, in order.
pub(crate) fn extract_placeholders(pattern: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = pattern;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        params.push(rest[start + 1..start + end].to_string());
        rest = &rest[start + end + 1..];
    }
    params
}

/// Rust path of the oneof variant for `field` inside `parent`.
///
/// prost nests the oneof enum in a module named after the message:
/// `.test.v1.Req` + oneof `contact` + member `email` →
/// `crate::test::req::Contact::Email`.
fn oneof_variant_path(
    parent_fqn: &str,
    oneof: &str,
    field: &FieldDescriptorProto,
    config: &GatewayCodegenConfig,
) -> String {
    let parent_rust = config.proto_type_to_rust(parent_fqn);
    let (module, msg) = parent_rust
        .rsplit_once("::")
        .unwrap_or(("crate", parent_rust.as_str()));
    format!(
        "{module}::{}::{}::{}",
        to_snake_case(msg),
        to_upper_camel_case(oneof),
        to_upper_camel_case(field.name.as_deref().unwrap_or("")),
    )
}

/// Synthesize the full binding plan for one gateway-compatible method.
pub(crate) fn synthesize_method(
    method: &MethodDescriptorProto,
    binding: &HttpBinding,
    index: &MessageIndex<'_>,
    config: &GatewayCodegenConfig,
) -> Result<MethodPlan, GenerateError> {
    let method_name = method.name.as_deref().unwrap_or("").to_string();
    let input_fqn = method.input_type.as_deref().unwrap_or("");
    let input_desc = index.get(input_fqn);
    let placeholders = extract_placeholders(&binding.pattern);

    // Path bindings: each placeholder must match a visible top-level field
    // by proto name or JSON name. Unmatched placeholders abort generation.
    let mut path_params = Vec::new();
    let mut consumed: HashSet<String> = HashSet::new();
    for placeholder in &placeholders {
        let field = input_desc.and_then(|desc| {
            desc.field.iter().find(|f| {
                !is_restricted(f)
                    && (f.name.as_deref() == Some(placeholder.as_str())
                        || json_name(f) == *placeholder)
            })
        });
        let Some(field) = field else {
            return Err(GenerateError::UnmatchedPathParam {
                method: method_name,
                param: placeholder.clone(),
            });
        };
        let field_name = field.name.as_deref().unwrap_or("").to_string();
        consumed.insert(field_name.clone());
        consumed.insert(json_name(field));

        let fmt = if is_enum(field) {
            ValueFmt::EnumName {
                enum_path: config.proto_type_to_rust(field.type_name.as_deref().unwrap_or("")),
            }
        } else if is_message(field) {
            ValueFmt::Debug
        } else {
            scalar_fmt(field)
        };
        let value = match input_desc.and_then(|desc| oneof_name(field, desc)) {
            Some(oneof) => PathValue::OneofMember {
                oneof: Accessor::req().child(oneof),
                variant: oneof_variant_path(input_fqn, oneof, field, config),
                fmt,
            },
            None => PathValue::Expr(ValueExpr {
                target: Accessor::req().child(&field_name),
                fmt,
            }),
        };
        path_params.push(PathBinding {
            placeholder: placeholder.clone(),
            value,
        });
    }

    // Body binding: "*" takes the whole message and suppresses query
    // synthesis; a named selector takes exactly one field and nothing else
    // is sent; an empty selector sends no body and falls through to query.
    if binding.method.allows_body() && !binding.body.is_empty() {
        if binding.body == "*" {
            return Ok(MethodPlan {
                path_params,
                query: Vec::new(),
                body: Some(BodyBinding::Whole),
            });
        }
        let selector_ok = input_desc.is_some_and(|desc| {
            desc.field
                .iter()
                .any(|f| f.name.as_deref() == Some(binding.body.as_str()) && !is_restricted(f))
        });
        if !selector_ok {
            return Err(GenerateError::UnknownBodyField {
                method: method_name,
                selector: binding.body.clone(),
            });
        }
        return Ok(MethodPlan {
            path_params,
            query: Vec::new(),
            body: Some(BodyBinding::Field {
                field: binding.body.clone(),
            }),
        });
    }

    // Query synthesis over the remaining fields.
    let mut query = Vec::new();
    if let Some(desc) = input_desc {
        let mut next_var = 0u32;
        let mut visiting = vec![input_fqn.to_string()];
        for field in &desc.field {
            synthesize_field(
                field,
                desc,
                input_fqn,
                index,
                config,
                &consumed,
                &[],
                &Accessor::req(),
                false,
                &mut next_var,
                &mut visiting,
                &mut query,
            );
        }
    }

    Ok(MethodPlan {
        path_params,
        query,
        body: None,
    })
}

/// Recursive step of query synthesis for one field.
///
/// `key_prefix` is the accumulated JSON-key path, `accessor` the value
/// accessor of the containing message, `in_repeated` whether a repeated
/// ancestor has been entered (collapsing key prefixes to the leaf name),
/// and `visiting` the message FQNs on the descent path (cycle cutoff).
#[allow(clippy::too_many_arguments)]
fn synthesize_field(
    field: &FieldDescriptorProto,
    parent: &DescriptorProto,
    parent_fqn: &str,
    index: &MessageIndex<'_>,
    config: &GatewayCodegenConfig,
    consumed: &HashSet<String>,
    key_prefix: &[KeySeg],
    accessor: &Accessor,
    in_repeated: bool,
    next_var: &mut u32,
    visiting: &mut Vec<String>,
    out: &mut Vec<Stmt>,
) {
    if is_restricted(field) {
        return;
    }
    let name = field.name.as_deref().unwrap_or("");
    let json = json_name(field);
    // A path-consumed field is never re-emitted as query, at any depth.
    if consumed.contains(name) || consumed.contains(&json) {
        return;
    }

    let key: Vec<KeySeg> = if in_repeated {
        vec![KeySeg::Lit(json.clone())]
    } else {
        let mut k = key_prefix.to_vec();
        k.push(KeySeg::Lit(json.clone()));
        k
    };
    let field_acc = accessor.child(name);
    let type_name = field.type_name.as_deref().unwrap_or("");

    // Map field: one binding per entry, keyed `parentKey[entryKey]`.
    if is_message(field) && is_repeated(field) && index.is_map_entry(type_name) {
        let Some(entry) = index.get(type_name) else {
            return;
        };
        let value_field = entry
            .field
            .iter()
            .find(|f| f.name.as_deref() == Some("value"));
        let Some(value_field) = value_field else {
            return;
        };
        let entry_var = *next_var;
        *next_var += 1;
        let mut entry_key = key;
        entry_key.push(KeySeg::MapKey(entry_var));

        let mut body = Vec::new();
        if is_message(value_field) {
            let value_fqn = value_field.type_name.as_deref().unwrap_or("");
            if let Some(value_desc) = index.get(value_fqn) {
                if !visiting.iter().any(|v| v == value_fqn) {
                    visiting.push(value_fqn.to_string());
                    for f in &value_desc.field {
                        synthesize_field(
                            f,
                            value_desc,
                            value_fqn,
                            index,
                            config,
                            consumed,
                            &entry_key,
                            &Accessor::var(entry_var),
                            in_repeated,
                            next_var,
                            visiting,
                            &mut body,
                        );
                    }
                    visiting.pop();
                }
            }
        } else {
            let fmt = if is_enum(value_field) {
                ValueFmt::EnumName {
                    enum_path: config
                        .proto_type_to_rust(value_field.type_name.as_deref().unwrap_or("")),
                }
            } else {
                scalar_fmt(value_field)
            };
            body.push(Stmt::Push {
                key: entry_key,
                value: ValueExpr {
                    target: Accessor::var(entry_var),
                    fmt,
                },
            });
        }
        out.push(Stmt::ForMap {
            map: field_acc,
            entry_var,
            body,
        });
        return;
    }

    // Repeated field: one binding per element, keyed by the leaf name.
    if is_repeated(field) {
        let value_var = *next_var;
        *next_var += 1;
        let mut body = Vec::new();
        if is_message(field) {
            if let Some(elem_desc) = index.get(type_name) {
                if !visiting.iter().any(|v| v == type_name) {
                    visiting.push(type_name.to_string());
                    for f in &elem_desc.field {
                        synthesize_field(
                            f,
                            elem_desc,
                            type_name,
                            index,
                            config,
                            consumed,
                            &[],
                            &Accessor::var(value_var),
                            true,
                            next_var,
                            visiting,
                            &mut body,
                        );
                    }
                    visiting.pop();
                }
            }
        } else {
            let fmt = if is_enum(field) {
                ValueFmt::EnumName {
                    enum_path: config.proto_type_to_rust(type_name),
                }
            } else {
                scalar_fmt(field)
            };
            body.push(Stmt::Push {
                key,
                value: ValueExpr {
                    target: Accessor::var(value_var),
                    fmt,
                },
            });
        }
        out.push(Stmt::ForRepeated {
            items: field_acc,
            value_var,
            body,
        });
        return;
    }

    // Oneof member: the guard matches on the oneof accessor, not the member.
    if let Some(oneof) = oneof_name(field, parent) {
        let bind_var = *next_var;
        *next_var += 1;
        let variant = oneof_variant_path(parent_fqn, oneof, field, config);
        let mut body = Vec::new();
        if is_message(field) {
            if let Some(member_desc) = index.get(type_name) {
                if !visiting.iter().any(|v| v == type_name) {
                    visiting.push(type_name.to_string());
                    for f in &member_desc.field {
                        synthesize_field(
                            f,
                            member_desc,
                            type_name,
                            index,
                            config,
                            consumed,
                            &key,
                            &Accessor::var(bind_var),
                            in_repeated,
                            next_var,
                            visiting,
                            &mut body,
                        );
                    }
                    visiting.pop();
                }
            }
        } else {
            let fmt = if is_enum(field) {
                ValueFmt::EnumName {
                    enum_path: config.proto_type_to_rust(type_name),
                }
            } else {
                scalar_fmt(field)
            };
            body.push(Stmt::Push {
                key,
                value: ValueExpr {
                    target: Accessor::var(bind_var),
                    fmt,
                },
            });
        }
        out.push(Stmt::IfOneof {
            oneof: accessor.child(oneof),
            variant,
            bind_var,
            body,
        });
        return;
    }

    // Nested message: recurse under a presence guard, extending the prefix.
    if is_message(field) {
        let Some(nested_desc) = index.get(type_name) else {
            return;
        };
        if visiting.iter().any(|v| v == type_name) {
            return;
        }
        let bind_var = *next_var;
        *next_var += 1;
        visiting.push(type_name.to_string());
        let mut body = Vec::new();
        for f in &nested_desc.field {
            synthesize_field(
                f,
                nested_desc,
                type_name,
                index,
                config,
                consumed,
                &key,
                &Accessor::var(bind_var),
                in_repeated,
                next_var,
                visiting,
                &mut body,
            );
        }
        visiting.pop();
        out.push(Stmt::IfSet {
            field: field_acc,
            bind_var,
            body,
        });
        return;
    }

    // Optional scalar: guarded by presence, value dereferenced.
    if field.proto3_optional.unwrap_or(false) {
        let bind_var = *next_var;
        *next_var += 1;
        let fmt = if is_enum(field) {
            ValueFmt::EnumName {
                enum_path: config.proto_type_to_rust(type_name),
            }
        } else {
            scalar_fmt(field)
        };
        out.push(Stmt::IfSet {
            field: field_acc,
            bind_var,
            body: vec![Stmt::Push {
                key,
                value: ValueExpr {
                    target: Accessor::var(bind_var),
                    fmt,
                },
            }],
        });
        return;
    }

    // Enum: symbolic name, not the number.
    if is_enum(field) {
        out.push(Stmt::Push {
            key,
            value: ValueExpr {
                target: field_acc,
                fmt: ValueFmt::EnumName {
                    enum_path: config.proto_type_to_rust(type_name),
                },
            },
        });
        return;
    }

    // Plain scalar.
    out.push(Stmt::Push {
        key,
        value: ValueExpr {
            target: field_acc,
            fmt: scalar_fmt(field),
        },
    });
}
