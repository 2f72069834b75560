//! Translation from the external tree-sitter grammar into the closed
//! `NodeKind` taxonomy.
//!
//! All grammar knowledge lives in this module: the tables below name the
//! raw tree-sitter-javascript productions, and nothing outside this file
//! ever dispatches on them. Classification is total — a production with no
//! table entry folds to `NodeKind::Other` instead of failing, so grammar
//! evolution degrades into weaker classification rather than a crash.
//!
//! Classification is a pure function of the parsed tree and the source
//! text; classifying the same tree twice yields equal values.

use tree_sitter::{Node, Tree, TreeCursor};

use crate::syntax::{ClassifiedNode, NodeKind, Position, Span};

// ============================================================================
// GRAMMAR TABLES - the only place raw grammar tags appear
// ============================================================================

/// Productions that denote an identifier occurrence, including property
/// names: denying `apply` or `__proto__` must catch `obj.apply` too.
const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "statement_identifier",
    "private_property_identifier",
];

/// Reserved words surfaced as keyword nodes. Anonymous tokens with these
/// tags become `NodeKind::Keyword`; the named `import` node of a dynamic
/// `import(...)` is folded in as well so the keyword policy sees it.
const RESERVED_WORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "finally", "for", "from", "function",
    "get", "if", "import", "in", "instanceof", "let", "new", "of", "return", "set", "static",
    "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Productions that occupy statement position.
const STATEMENT_KINDS: &[&str] = &[
    "expression_statement",
    "variable_declaration",
    "lexical_declaration",
    "statement_block",
    "if_statement",
    "switch_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "with_statement",
    "break_statement",
    "continue_statement",
    "return_statement",
    "throw_statement",
    "empty_statement",
    "labeled_statement",
    "debugger_statement",
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "import_statement",
    "export_statement",
];

/// Function-like productions: they open a scope and their parameters bind
/// inside it.
const FUNCTION_LIKE_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const LITERAL_KINDS: &[&str] = &[
    "string",
    "template_string",
    "number",
    "regex",
    "true",
    "false",
    "null",
    "undefined",
];

fn is_function_like(kind: &str) -> bool {
    FUNCTION_LIKE_KINDS.contains(&kind)
}

fn is_scope_root(kind: &str) -> bool {
    kind == "program" || kind == "statement_block" || kind == "catch_clause" || is_function_like(kind)
}

fn semantic_kind(node: &Node<'_>) -> NodeKind {
    let kind = node.kind();
    if IDENTIFIER_KINDS.contains(&kind) {
        return NodeKind::Identifier;
    }
    // The dynamic-import callee is a named `import` node; everything else
    // keyword-shaped is an anonymous token.
    if kind == "import" || (!node.is_named() && RESERVED_WORDS.contains(&kind)) {
        return NodeKind::Keyword;
    }
    if !node.is_named() {
        return NodeKind::Other;
    }
    match kind {
        "call_expression" | "new_expression" => NodeKind::CallExpression,
        "function_declaration" | "generator_function_declaration" => NodeKind::FunctionDeclaration,
        "variable_declaration" | "lexical_declaration" => NodeKind::VariableDeclaration,
        "for_statement" | "for_in_statement" | "while_statement" | "do_statement" => NodeKind::Loop,
        "import_statement" | "export_statement" => NodeKind::ImportLikeConstruct,
        "statement_block" => NodeKind::Block,
        _ if LITERAL_KINDS.contains(&kind) => NodeKind::Literal,
        _ => NodeKind::Other,
    }
}

/// A node is a statement only in statement position: the body block of a
/// function is reachable through the `body` field and is not itself a
/// statement, while a free-standing block is.
fn is_statement_position(kind: &str, parent_kind: &str, field: Option<&str>) -> bool {
    if !STATEMENT_KINDS.contains(&kind) {
        return false;
    }
    if kind == "statement_block" && is_function_like(parent_kind) && field == Some("body") {
        return false;
    }
    true
}

/// Identifier occurrences that introduce a binding: declarator and
/// declaration names, parameters (including destructuring and rest
/// patterns), catch parameters, and import bindings. Everything else is a
/// reference.
fn is_binding_position(kind: &str, parent_kind: &str, field: Option<&str>) -> bool {
    if !IDENTIFIER_KINDS.contains(&kind) {
        return false;
    }
    if kind == "shorthand_property_identifier_pattern" {
        return true;
    }
    match parent_kind {
        "variable_declarator" => field == Some("name"),
        "class_declaration" | "class" => field == Some("name"),
        "formal_parameters" | "rest_pattern" | "array_pattern" | "namespace_import" => true,
        "assignment_pattern" => field == Some("left"),
        "pair_pattern" => field == Some("value"),
        "catch_clause" => field == Some("parameter"),
        "for_in_statement" => field == Some("left"),
        "import_specifier" => true,
        "import_clause" => kind == "identifier",
        _ => is_function_like(parent_kind) && field == Some("name"),
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classifies a parsed tree into a `ClassifiedNode` tree. Total and pure:
/// never fails, never mutates its input.
pub fn classify_tree(tree: &Tree, source: &str) -> ClassifiedNode {
    let mut cursor = tree.walk();
    classify_at(&mut cursor, source, "")
}

fn classify_at(cursor: &mut TreeCursor<'_>, source: &str, parent_kind: &str) -> ClassifiedNode {
    let node = cursor.node();
    let grammar_kind = node.kind();
    let field = cursor.field_name();
    let kind = semantic_kind(&node);

    let text = match kind {
        NodeKind::Identifier | NodeKind::Keyword | NodeKind::Literal => Some(
            node.utf8_text(source.as_bytes())
                .unwrap_or_default()
                .to_string(),
        ),
        _ => None,
    };

    let start = node.start_position();
    let position = Position {
        line: start.row + 1,
        column: start.column,
        offset: node.start_byte(),
    };
    let span = Span {
        start: node.start_byte(),
        end: node.end_byte(),
    };

    let mut children = Vec::new();
    if cursor.goto_first_child() {
        loop {
            children.push(classify_at(cursor, source, grammar_kind));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }

    ClassifiedNode {
        kind,
        grammar_kind: grammar_kind.to_string(),
        text,
        position,
        span,
        statement: is_statement_position(grammar_kind, parent_kind, field),
        scope_root: is_scope_root(grammar_kind),
        binding: is_binding_position(grammar_kind, parent_kind, field),
        children,
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_source;
    use crate::syntax::NodeKind;

    #[test]
    fn classifies_function_declaration() {
        let root = parse_source("function foo() { return 1 + 1; }").unwrap();
        assert_eq!(root.grammar_kind, "program");
        assert!(root.scope_root);
        assert!(!root.statement);

        let function = &root.children[0];
        assert_eq!(function.kind, NodeKind::FunctionDeclaration);
        assert!(function.statement);
        assert!(function.scope_root);
        assert_eq!(function.declared_name(), Some("foo"));

        // The body block is not in statement position.
        let body = function
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Block)
            .unwrap();
        assert!(!body.statement);
    }

    #[test]
    fn marks_binding_identifiers() {
        let root = parse_source("function f(a) { let b = a; }").unwrap();
        let mut bindings = Vec::new();
        let mut references = Vec::new();
        collect(&root, &mut bindings, &mut references);
        assert_eq!(bindings, vec!["f", "a", "b"]);
        assert_eq!(references, vec!["a"]);

        fn collect(
            node: &crate::syntax::ClassifiedNode,
            bindings: &mut Vec<String>,
            references: &mut Vec<String>,
        ) {
            if node.kind == NodeKind::Identifier {
                if node.binding {
                    bindings.push(node.token_text().to_string());
                } else {
                    references.push(node.token_text().to_string());
                }
            }
            for child in &node.children {
                collect(child, bindings, references);
            }
        }
    }

    #[test]
    fn classification_is_idempotent() {
        let source = "let x = 1; function f() { if (x) { x(); } }";
        let first = parse_source(source).unwrap();
        let second = parse_source(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn positions_are_one_based_lines() {
        let root = parse_source("let a = 1;\nlet b = 2;").unwrap();
        let second = &root.children[1];
        assert_eq!(second.kind, NodeKind::VariableDeclaration);
        assert_eq!(second.position.line, 2);
        assert_eq!(second.position.column, 0);
        assert_eq!(second.position.offset, 11);
    }

    #[test]
    fn unknown_productions_fold_to_other() {
        let root = parse_source("label: a = 1;").unwrap();
        let labeled = &root.children[0];
        assert_eq!(labeled.kind, NodeKind::Other);
        assert!(labeled.statement);
    }
}
