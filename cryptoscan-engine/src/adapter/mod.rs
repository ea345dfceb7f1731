//! Lexical/AST adapter
//!
//! Turns a source file into a normalized view that exposes call expressions
//! with resolved callee names, literals, assignments and declaration context,
//! independent of the source grammar. Matchers work exclusively against this
//! view, so adding a language touches nothing downstream.
//!
//! Variable-to-literal resolution is one hop deep: a literal reaches a
//! matcher through at most one binding and one constructor-style wrapper
//! call (`Buffer.from("...")`, `bytes(...)`). Deeper alias chains are a
//! known false-negative source, not a bug.

mod javascript;
mod python;

use std::collections::HashMap;
use std::path::Path;

use tracing::trace;
use tree_sitter::Node;

use crate::error::ScanError;

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    Python,
}

impl Language {
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "javascript" | "node" => Some(Self::JavaScript),
            "py" | "python" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase()
            .as_str()
        {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

/// Line/column span of a node, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    fn of(node: &Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_line: start.row as u32 + 1,
            start_col: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_col: end.column as u32 + 1,
        }
    }
}

/// A literal value appearing in source
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Bytes(String),
    Int(i64),
    Float(f64),
    Null,
}

impl LiteralValue {
    /// Textual payload of string-like literals
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Bytes(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// Normalized call or assignment operand
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Literal(LiteralValue),
    /// Identifier or dotted member path (`AES.MODE_ECB`, `self.iv`)
    Ident(String),
    /// Nested call with its resolved callee
    Call { callee: String, args: Vec<ArgValue> },
    /// Object/dict literal, kept as raw text for shallow field probing
    Object(String),
    /// Keyword argument (`curve='P-256'`)
    Keyword { name: String, value: Box<ArgValue> },
    Other(String),
}

impl ArgValue {
    /// Resolve to a fixed literal, unwrapping at most one constructor-style
    /// wrapper call around a string or byte literal.
    pub fn as_fixed_literal(&self) -> Option<&LiteralValue> {
        match self {
            Self::Literal(lit) => Some(lit),
            Self::Call { args, .. } => args.iter().find_map(|arg| match arg {
                Self::Literal(lit @ (LiteralValue::Str(_) | LiteralValue::Bytes(_))) => Some(lit),
                _ => None,
            }),
            Self::Keyword { value, .. } => value.as_fixed_literal(),
            _ => None,
        }
    }
}

/// Node kinds in the normalized view
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Call { callee: String, args: Vec<ArgValue> },
    Assignment { target: String, value: ArgValue },
    Literal(LiteralValue),
    ClassDecl { name: String },
    FunctionDecl { name: String },
    Import { module: String },
}

/// One normalized AST node with its source context
#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: NodeKind,
    pub span: Span,
    /// Raw source snippet, truncated for reporting
    pub text: String,
    pub enclosing_class: Option<String>,
    pub enclosing_function: Option<String>,
}

/// A literal bound to a name, for one-hop resolution
#[derive(Debug, Clone)]
pub struct BoundLiteral {
    pub value: LiteralValue,
    pub span: Span,
}

/// One analyzed file: normalized nodes plus the one-hop binding table
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: String,
    pub language: Language,
    pub text: String,
    pub nodes: Vec<AstNode>,
    pub bindings: HashMap<String, BoundLiteral>,
}

impl SourceUnit {
    /// Resolve an identifier to a literal through at most one binding.
    /// Dotted targets (`this.iv`) are keyed by their last segment.
    pub fn resolve(&self, name: &str) -> Option<&LiteralValue> {
        let key = name.rsplit('.').next().unwrap_or(name);
        self.bindings.get(key).map(|bound| &bound.value)
    }

    pub fn calls(&self) -> impl Iterator<Item = (&AstNode, &str, &[ArgValue])> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Call { callee, args } => Some((node, callee.as_str(), args.as_slice())),
            _ => None,
        })
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&AstNode, &str, &ArgValue)> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Assignment { target, value } => Some((node, target.as_str(), value)),
            _ => None,
        })
    }
}

const MAX_SNIPPET: usize = 160;

pub(crate) fn snippet(text: &str) -> String {
    if text.len() <= MAX_SNIPPET {
        return text.to_string();
    }
    let mut end = MAX_SNIPPET;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

pub(crate) fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

pub(crate) fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source).to_string())
}

/// Collapse a callee or assignment target to a canonical dotted path
pub(crate) fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if !ch.is_whitespace() {
            out.push(ch);
        }
    }
    out.replace("?.", ".")
}

pub(crate) fn strip_quotes(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ["\"\"\"", "'''"] {
        if raw.len() >= 6 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[3..raw.len() - 3];
        }
    }
    for quote in ['"', '\'', '`'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// String literal with optional prefix (`b"..."`, `rb'...'`)
pub(crate) fn string_literal(node: &Node, source: &str) -> LiteralValue {
    let raw = node_text(node, source);
    let quote_at = raw.find(['"', '\'', '`']).unwrap_or(0);
    let (prefix, rest) = raw.split_at(quote_at);
    let inner = strip_quotes(rest).to_string();
    if prefix.contains('b') || prefix.contains('B') {
        LiteralValue::Bytes(inner)
    } else {
        LiteralValue::Str(inner)
    }
}

pub(crate) fn number_literal(raw: &str) -> Option<LiteralValue> {
    let cleaned = raw.trim().replace('_', "");
    if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok().map(LiteralValue::Int);
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(LiteralValue::Int(n));
    }
    cleaned.parse::<f64>().ok().map(LiteralValue::Float)
}

/// Parse one source file into its normalized view
pub fn parse(path: &str, text: &str, language: Language) -> Result<SourceUnit, ScanError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| ScanError::Parse {
            file: path.to_string(),
            reason: format!("grammar unavailable: {e}"),
        })?;
    let tree = parser.parse(text, None).ok_or_else(|| ScanError::Parse {
        file: path.to_string(),
        reason: "parser returned no tree".to_string(),
    })?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(ScanError::Parse {
            file: path.to_string(),
            reason: "syntax errors in source".to_string(),
        });
    }

    let mut unit = SourceUnit {
        path: path.to_string(),
        language,
        text: text.to_string(),
        nodes: Vec::new(),
        bindings: HashMap::new(),
    };
    match language {
        Language::JavaScript => javascript::extract(&mut unit, root, text),
        Language::Python => python::extract(&mut unit, root, text),
    }
    trace!(
        file = %unit.path,
        nodes = unit.nodes.len(),
        bindings = unit.bindings.len(),
        "normalized source unit"
    );
    Ok(unit)
}
