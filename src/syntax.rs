//! Core syntax types for classified JavaScript trees.
//!
//! The external grammar produces a concrete syntax tree; the classifier
//! (see `classifier`) folds that tree into `ClassifiedNode`, the only node
//! type the rest of the engine ever inspects. Every node carries a span and
//! a position for source tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a byte span in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A source position: 1-based line, 0-based column, byte offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The closed semantic taxonomy every classified node falls into.
///
/// Grammar productions with no entry here fold to `Other`; they are never a
/// classification failure. Checkers dispatch on this enum and on the
/// classifier-computed flags, never on raw grammar tags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Identifier,
    Keyword,
    CallExpression,
    FunctionDeclaration,
    VariableDeclaration,
    Loop,
    ImportLikeConstruct,
    Literal,
    Block,
    Other,
}

impl NodeKind {
    /// Returns the canonical name of this kind as a string.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Identifier => "Identifier",
            NodeKind::Keyword => "Keyword",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::Loop => "Loop",
            NodeKind::ImportLikeConstruct => "ImportLikeConstruct",
            NodeKind::Literal => "Literal",
            NodeKind::Block => "Block",
            NodeKind::Other => "Other",
        }
    }

    /// Parses a canonical kind name. Unknown names yield `None`; callers
    /// that accept user input (the policy builder, the CLI) turn that into
    /// a policy fault rather than guessing.
    pub fn parse(name: &str) -> Option<NodeKind> {
        match name {
            "Identifier" => Some(NodeKind::Identifier),
            "Keyword" => Some(NodeKind::Keyword),
            "CallExpression" => Some(NodeKind::CallExpression),
            "FunctionDeclaration" => Some(NodeKind::FunctionDeclaration),
            "VariableDeclaration" => Some(NodeKind::VariableDeclaration),
            "Loop" => Some(NodeKind::Loop),
            "ImportLikeConstruct" => Some(NodeKind::ImportLikeConstruct),
            "Literal" => Some(NodeKind::Literal),
            "Block" => Some(NodeKind::Block),
            "Other" => Some(NodeKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One node of the classified tree: a grammar-agnostic view over a CST node.
///
/// The `statement`, `scope_root`, and `binding` flags are computed by the
/// classifier so that checkers never need grammar knowledge of their own.
/// `grammar_kind` keeps the raw tag for diagnostics and debugging only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNode {
    pub kind: NodeKind,
    pub grammar_kind: String,
    /// Raw token text, present for identifiers, keywords, and literals.
    pub text: Option<String>,
    pub position: Position,
    pub span: Span,
    /// True when the node occupies statement position.
    pub statement: bool,
    /// True when the node opens a lexical scope.
    pub scope_root: bool,
    /// True for identifiers that introduce a binding rather than reference one.
    pub binding: bool,
    pub children: Vec<ClassifiedNode>,
}

impl ClassifiedNode {
    /// Returns the token text, or the empty string when none applies.
    pub fn token_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// The name an identifier-carrying declaration introduces, if any:
    /// the first direct child that is a binding identifier.
    pub fn declared_name(&self) -> Option<&str> {
        self.children
            .iter()
            .find(|child| child.binding && child.kind == NodeKind::Identifier)
            .map(|child| child.token_text())
    }

    /// Pretty-prints the tree with one node per line, indented by depth.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(0, &mut out);
        out
    }

    fn pretty_into(&self, indent: usize, out: &mut String) {
        for _ in 0..indent {
            out.push_str("  ");
        }
        out.push_str(self.kind.name());
        out.push_str(" (");
        out.push_str(&self.grammar_kind);
        out.push(')');
        if let Some(text) = &self.text {
            out.push_str(" `");
            out.push_str(text);
            out.push('`');
        }
        out.push_str(&format!(" @{}", self.position));
        out.push('\n');
        for child in &self.children {
            child.pretty_into(indent + 1, out);
        }
    }
}
