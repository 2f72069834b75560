//! The tree-sitter binding: source text in, classified tree out.
//!
//! Parsing proper is delegated to the tree-sitter runtime with the
//! tree-sitter-javascript grammar; this module only drives it and turns
//! its failure modes into engine faults. tree-sitter trees are finite and
//! acyclic, which discharges the input contract the walker relies on.

use tree_sitter::{Node, Parser};

use crate::classifier;
use crate::diagnostics::JsvetError;
use crate::syntax::{ClassifiedNode, Span};

/// Parses and classifies JavaScript source. Blank input and syntax errors
/// are faults: an unparseable script can never be vetted as safe.
pub fn parse_source(source: &str) -> Result<ClassifiedNode, JsvetError> {
    if source.trim().is_empty() {
        return Err(JsvetError::empty_code(source));
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| JsvetError::internal(format!("failed to load the JavaScript grammar: {e}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| JsvetError::internal("the parser returned no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let bad = first_error_node(root).unwrap_or(root);
        let span = Span {
            start: bad.start_byte(),
            end: bad.end_byte().max(bad.start_byte() + 1),
        };
        return Err(JsvetError::invalid_code(source, span));
    }

    Ok(classifier::classify_tree(&tree, source))
}

fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}
