//! Client code emission.
//!
//! The synthesizer hands over a language-neutral plan ([`Stmt`] trees,
//! path bindings, body bindings); everything Rust-specific — identifier
//! escaping, loop variable naming, `format!` templates — lives in the
//! [`RustPrinter`]. A different target language means a different
//! [`Printer`] implementation, not a different traversal.

use gateway_client_core::descriptor::HttpMethod;

use super::config::GatewayCodegenConfig;
use super::types::{
    Accessor, BodyBinding, CallShape, KeySeg, MethodBinding, PathValue, Root, ServiceBindings,
    Stmt, ValueExpr, ValueFmt,
};

/// Renders plan fragments into target-language source text.
pub(crate) trait Printer {
    /// Render a statement list at the given indent (spaces).
    fn stmts(&self, stmts: &[Stmt], indent: usize, out: &mut String);
    /// Render a leaf value to a string-typed expression.
    fn value(&self, value: &ValueExpr) -> String;
    /// Render a value formatting applied to a bound variable.
    fn bound_value(&self, var: u32, fmt: &ValueFmt) -> String;
}

/// The Rust renderer.
pub(crate) struct RustPrinter;

/// Escape proto field names that collide with Rust keywords, the way prost
/// names the generated struct fields.
fn field_ident(name: &str) -> String {
    match name {
        "as" | "async" | "await" | "box" | "break" | "const" | "continue" | "dyn" | "else"
        | "enum" | "extern" | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop"
        | "match" | "mod" | "move" | "mut" | "pub" | "ref" | "return" | "static" | "struct"
        | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while" | "yield" => {
            format!("r#{name}")
        }
        "self" | "super" | "crate" | "Self" => format!("{name}_"),
        _ => name.to_string(),
    }
}

fn value_var(index: u32) -> String {
    if index == 0 {
        "v".to_string()
    } else {
        format!("v{}", index + 1)
    }
}

fn key_var(index: u32) -> String {
    if index == 0 {
        "k".to_string()
    } else {
        format!("k{}", index + 1)
    }
}

impl RustPrinter {
    fn accessor(&self, acc: &Accessor) -> String {
        let mut out = match acc.root {
            Root::Req => "req".to_string(),
            Root::Var(i) => value_var(i),
        };
        for seg in &acc.path {
            out.push('.');
            out.push_str(&field_ident(seg));
        }
        out
    }

    /// The expression form suitable for `TryFrom<i32>` — loop/guard
    /// bindings are references and need a deref, field reads copy.
    fn copy_expr(&self, acc: &Accessor) -> String {
        if acc.path.is_empty() && matches!(acc.root, Root::Var(_)) {
            format!("*{}", self.accessor(acc))
        } else {
            self.accessor(acc)
        }
    }

    fn key(&self, segs: &[KeySeg]) -> String {
        let dynamic = segs.iter().any(|s| matches!(s, KeySeg::MapKey(_)));
        let mut template = String::new();
        for (i, seg) in segs.iter().enumerate() {
            match seg {
                KeySeg::Lit(lit) => {
                    if i > 0 {
                        template.push('.');
                    }
                    template.push_str(lit);
                }
                KeySeg::MapKey(var) => {
                    template.push('[');
                    template.push('{');
                    template.push_str(&key_var(*var));
                    template.push('}');
                    template.push(']');
                }
            }
        }
        if dynamic {
            format!("format!(\"{template}\")")
        } else {
            format!("\"{template}\".to_string()")
        }
    }

    fn fmt_expr(&self, expr: &str, copy_expr: &str, fmt: &ValueFmt) -> String {
        match fmt {
            ValueFmt::Display => format!("{expr}.to_string()"),
            ValueFmt::Debug => format!("format!(\"{{:?}}\", {expr})"),
            ValueFmt::EnumName { enum_path } => format!(
                "{enum_path}::try_from({copy_expr}).unwrap_or_default().as_str_name().to_string()",
            ),
        }
    }
}

impl Printer for RustPrinter {
    fn stmts(&self, stmts: &[Stmt], indent: usize, out: &mut String) {
        let pad = " ".repeat(indent);
        for stmt in stmts {
            match stmt {
                Stmt::Push { key, value } => {
                    out.push_str(&format!(
                        "{pad}q.push(({}, {}));\n",
                        self.key(key),
                        self.value(value),
                    ));
                }
                Stmt::ForMap {
                    map,
                    entry_var,
                    body,
                } => {
                    out.push_str(&format!(
                        "{pad}for ({}, {}) in &{} {{\n",
                        key_var(*entry_var),
                        value_var(*entry_var),
                        self.accessor(map),
                    ));
                    self.stmts(body, indent + 4, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
                Stmt::ForRepeated {
                    items,
                    value_var: var,
                    body,
                } => {
                    out.push_str(&format!(
                        "{pad}for {} in &{} {{\n",
                        value_var(*var),
                        self.accessor(items),
                    ));
                    self.stmts(body, indent + 4, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
                Stmt::IfSet {
                    field,
                    bind_var,
                    body,
                } => {
                    out.push_str(&format!(
                        "{pad}if let Some({}) = &{} {{\n",
                        value_var(*bind_var),
                        self.accessor(field),
                    ));
                    self.stmts(body, indent + 4, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
                Stmt::IfOneof {
                    oneof,
                    variant,
                    bind_var,
                    body,
                } => {
                    out.push_str(&format!(
                        "{pad}if let Some({variant}({})) = &{} {{\n",
                        value_var(*bind_var),
                        self.accessor(oneof),
                    ));
                    self.stmts(body, indent + 4, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
            }
        }
    }

    fn value(&self, value: &ValueExpr) -> String {
        self.fmt_expr(
            &self.accessor(&value.target),
            &self.copy_expr(&value.target),
            &value.fmt,
        )
    }

    fn bound_value(&self, var: u32, fmt: &ValueFmt) -> String {
        let name = value_var(var);
        self.fmt_expr(&name, &format!("*{name}"), fmt)
    }
}

/// Render the generated source for all services.
pub(crate) fn generate_code(services: &[ServiceBindings], config: &GatewayCodegenConfig) -> String {
    let printer = RustPrinter;
    let mut out = String::new();

    out.push_str("// Generated by gateway-client-build. DO NOT EDIT.\n");
    out.push_str("//\n");
    out.push_str("// REST/JSON gateway client bindings for services annotated with\n");
    out.push_str("// google.api.http rules.\n");

    for service in services {
        emit_service(service, config, &printer, &mut out);
    }

    out
}

fn emit_service(
    service: &ServiceBindings,
    config: &GatewayCodegenConfig,
    printer: &RustPrinter,
    out: &mut String,
) {
    let rt = &config.runtime_crate;
    let name = &service.service_name;

    out.push_str(&format!(
        "\n/// REST/JSON gateway client for `{name}`.\n\
         ///\n\
         /// Generated from `google.api.http` annotations; each method builds an\n\
         /// HTTP request from its rule and delegates to the gateway runtime.\n\
         pub struct {name}GatewayClient {{\n\
         \x20   gwc: {rt}::GatewayClient,\n\
         }}\n\
         \n\
         impl {name}GatewayClient {{\n\
         \x20   /// Create a client that issues calls through `gwc`.\n\
         \x20   pub fn new(gwc: {rt}::GatewayClient) -> Self {{\n\
         \x20       Self {{ gwc }}\n\
         \x20   }}\n",
    ));

    for method in &service.methods {
        emit_method(method, config, printer, out);
    }

    out.push_str("}\n");
}

fn verb_const(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Put => "PUT",
        HttpMethod::Post => "POST",
        HttpMethod::Delete => "DELETE",
        HttpMethod::Patch => "PATCH",
    }
}

fn emit_method(
    method: &MethodBinding,
    config: &GatewayCodegenConfig,
    printer: &RustPrinter,
    out: &mut String,
) {
    let rt = &config.runtime_crate;
    let unit_input = method.input_type == "()";
    let req_param = if unit_input { "_req" } else { "req" };

    let ret = match method.call_shape {
        CallShape::Unary => method.output_type.clone(),
        CallShape::UnaryEmpty => "()".to_string(),
        CallShape::UnaryRaw => format!("{rt}::HttpBody"),
        CallShape::Streaming => format!("{rt}::ServerStream<{}>", method.output_type),
        CallShape::StreamingRaw => format!("{rt}::ServerStream<{rt}::HttpBody>"),
    };
    let entry = match method.call_shape {
        CallShape::Unary => "unary",
        CallShape::UnaryEmpty => "unary_empty",
        CallShape::UnaryRaw => "unary_raw",
        CallShape::Streaming => "server_streaming",
        CallShape::StreamingRaw => "server_streaming_raw",
    };

    let has_body = method.body.is_some() && !unit_input;
    let needs_mut = !method.path_params.is_empty() || !method.query.is_empty() || has_body;
    let binding = if needs_mut { "let mut gw_req" } else { "let gw_req" };

    out.push_str(&format!(
        "\n\
         \x20   pub async fn {fn_name}(\n\
         \x20       &self,\n\
         \x20       meta: {rt}::CallMeta,\n\
         \x20       {req_param}: {input},\n\
         \x20   ) -> Result<{ret}, {rt}::GatewayError> {{\n\
         \x20       {binding} = self\n\
         \x20           .gwc\n\
         \x20           .request({rt}::Method::{verb}, \"{pattern}\");\n",
        fn_name = method.rust_name,
        input = method.input_type,
        verb = verb_const(method.http_method),
        pattern = method.pattern,
    ));

    for param in &method.path_params {
        match &param.value {
            PathValue::Expr(value) => {
                out.push_str(&format!(
                    "        gw_req.path_param(\"{}\", {});\n",
                    param.placeholder,
                    printer.value(value),
                ));
            }
            PathValue::OneofMember {
                oneof,
                variant,
                fmt,
            } => {
                out.push_str(&format!(
                    "        gw_req.path_param(\n\
                     \x20           \"{placeholder}\",\n\
                     \x20           match &{oneof} {{\n\
                     \x20               Some({variant}(v)) => {value},\n\
                     \x20               _ => String::new(),\n\
                     \x20           }},\n\
                     \x20       );\n",
                    placeholder = param.placeholder,
                    oneof = printer.accessor(oneof),
                    value = printer.bound_value(0, fmt),
                ));
            }
        }
    }

    if !method.query.is_empty() {
        out.push_str("        let mut q: Vec<(String, String)> = Vec::new();\n");
        printer.stmts(&method.query, 8, out);
        out.push_str("        gw_req.query(q);\n");
    }

    if has_body {
        match method.body.as_ref() {
            Some(BodyBinding::Whole) => {
                out.push_str("        gw_req.json_body(&req)?;\n");
            }
            Some(BodyBinding::Field { field }) => {
                out.push_str(&format!(
                    "        gw_req.json_body(&req.{})?;\n",
                    field_ident(field),
                ));
            }
            None => {}
        }
    }

    out.push_str(&format!(
        "        self.gwc.{entry}(meta, gw_req).await\n    }}\n",
    ));
}
