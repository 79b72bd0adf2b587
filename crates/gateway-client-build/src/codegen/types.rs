//! Internal types used during codegen — not part of the public API.
//!
//! Query synthesis produces a small language-neutral statement tree
//! ([`Stmt`]) instead of target-language text; the emitter renders it
//! through a [`Printer`](super::emit::Printer) implementation. Traversal
//! state (key prefix, accessor, loop-variable counter) lives in explicit
//! parameters of the synthesizer, never in these types.

use gateway_client_core::descriptor::HttpMethod;

/// Parsed service info from proto descriptors.
#[derive(Debug)]
pub struct ServiceBindings {
    /// Proto service name (e.g., `TestService`)
    pub service_name: String,
    /// Gateway-compatible method bindings, in declaration order
    pub methods: Vec<MethodBinding>,
}

/// Everything the emitter needs for one generated client method.
#[derive(Debug)]
pub struct MethodBinding {
    /// Method name in `snake_case` (e.g., `send_invitation`)
    pub rust_name: String,
    /// HTTP verb from the rule
    pub http_method: HttpMethod,
    /// URL pattern with `{name}` placeholders, as annotated
    pub pattern: String,
    /// Rust input type path (`()` for `google.protobuf.Empty`)
    pub input_type: String,
    /// Rust output type path (unused for empty/raw call shapes)
    pub output_type: String,
    /// Runtime entry point, selected at generation time
    pub call_shape: CallShape,
    /// Path substitutions, one per `{name}` placeholder
    pub path_params: Vec<PathBinding>,
    /// Query synthesis statements (empty when a body binding exists)
    pub query: Vec<Stmt>,
    /// Body binding for POST/PUT/PATCH/DELETE selectors
    pub body: Option<BodyBinding>,
}

/// Which runtime entry point a method delegates to.
///
/// Raw shapes cover the opaque `google.api.HttpBody` result type; the
/// decision is made here, at generation time, so the runtime never inspects
/// result types dynamically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallShape {
    /// JSON-decoded unary response
    Unary,
    /// `google.protobuf.Empty` response, body discarded
    UnaryEmpty,
    /// Raw content-type + bytes response
    UnaryRaw,
    /// Server-streamed JSON envelopes over SSE
    Streaming,
    /// Server-streamed raw byte chunks
    StreamingRaw,
}

/// One `{name}` placeholder substitution.
#[derive(Debug, PartialEq)]
pub struct PathBinding {
    /// Placeholder text between the braces
    pub placeholder: String,
    /// How the substituted value renders
    pub value: PathValue,
}

/// Value source for a path substitution.
#[derive(Debug, PartialEq)]
pub enum PathValue {
    /// Direct field value
    Expr(ValueExpr),
    /// Field inside a oneof: value rendered via the oneof accessor
    OneofMember {
        /// Accessor of the oneof itself (e.g., `req.identifier`)
        oneof: Accessor,
        /// Fully-qualified variant path (e.g., `crate::test::req::Identifier::Id`)
        variant: String,
        /// Formatting of the bound member value
        fmt: ValueFmt,
    },
}

/// Request-body binding for body-carrying verbs.
#[derive(Debug, PartialEq, Eq)]
pub enum BodyBinding {
    /// `body: "*"` — the whole request message
    Whole,
    /// `body: "field"` — a single top-level field, by proto name
    Field {
        /// Proto field name of the selected body field
        field: String,
    },
}

/// Root of a value accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Root {
    /// The request parameter (`req`)
    Req,
    /// A loop or guard binding, by variable index
    Var(u32),
}

/// Dot path from a root to a field, in proto field names.
///
/// Identifier rendering (keyword escaping, variable naming) is the
/// printer's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    /// Where the path starts
    pub root: Root,
    /// Field names from the root, outermost first
    pub path: Vec<String>,
}

impl Accessor {
    /// Accessor rooted at the request parameter.
    pub fn req() -> Self {
        Self {
            root: Root::Req,
            path: Vec::new(),
        }
    }

    /// Accessor rooted at a bound loop/guard variable.
    pub fn var(index: u32) -> Self {
        Self {
            root: Root::Var(index),
            path: Vec::new(),
        }
    }

    /// Extend the path by one field.
    pub fn child(&self, field: &str) -> Self {
        let mut path = self.path.clone();
        path.push(field.to_string());
        Self {
            root: self.root,
            path,
        }
    }
}

/// One segment of a query key template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySeg {
    /// Literal JSON name, joined to the previous segment with `.`
    Lit(String),
    /// Map entry key, rendered as `[<key var>]`
    MapKey(u32),
}

/// How a leaf value renders to its string form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueFmt {
    /// Default `Display` formatting
    Display,
    /// `Debug` formatting (bytes fields)
    Debug,
    /// Enum symbolic name via `as_str_name()`
    EnumName {
        /// Rust path of the enum type
        enum_path: String,
    },
}

/// A leaf value: accessor plus formatting.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueExpr {
    /// Where the value comes from
    pub target: Accessor,
    /// How it renders
    pub fmt: ValueFmt,
}

/// Language-neutral statement tree for query parameter synthesis.
#[derive(Debug, PartialEq)]
pub enum Stmt {
    /// Append one `(key, value)` pair to the query plan.
    Push {
        /// Key template segments
        key: Vec<KeySeg>,
        /// Value expression
        value: ValueExpr,
    },
    /// Iterate the entries of a map field.
    ForMap {
        /// The map field
        map: Accessor,
        /// Variable index bound to each entry key and value
        entry_var: u32,
        /// Per-entry statements
        body: Vec<Stmt>,
    },
    /// Iterate the elements of a repeated field.
    ForRepeated {
        /// The repeated field
        items: Accessor,
        /// Variable index bound to each element
        value_var: u32,
        /// Per-element statements
        body: Vec<Stmt>,
    },
    /// Guard on field presence (`optional` scalars and message fields).
    IfSet {
        /// The optional field
        field: Accessor,
        /// Variable index bound to the contained value
        bind_var: u32,
        /// Statements executed when set
        body: Vec<Stmt>,
    },
    /// Guard on a oneof holding a specific member.
    IfOneof {
        /// Accessor of the oneof itself
        oneof: Accessor,
        /// Fully-qualified variant path
        variant: String,
        /// Variable index bound to the member value
        bind_var: u32,
        /// Statements executed on match
        body: Vec<Stmt>,
    },
}
