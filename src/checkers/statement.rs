//! Statement-shape enforcement: which statement kinds may appear at all,
//! and which may appear at the top level.
//!
//! Also tracks top-level function declarations and enforces the
//! required-function rule after the walk completes (e.g. a module profile
//! that insists on a `main` entry point).

use std::collections::BTreeSet;

use crate::checkers::{CheckResult, Checker};
use crate::diagnostics::Violation;
use crate::policy::{Policy, UnknownNodePolicy};
use crate::syntax::{ClassifiedNode, NodeKind};
use crate::walker::TraversalState;

pub struct StatementShapeChecker;

fn kind_allowed(set: Option<&BTreeSet<NodeKind>>, node: &ClassifiedNode, policy: &Policy) -> bool {
    let Some(set) = set else {
        return true;
    };
    if node.kind == NodeKind::Other {
        // Statements the taxonomy cannot name follow the configured
        // unknown-node policy instead of the allow set.
        return matches!(policy.unknown_statements(), UnknownNodePolicy::Allow);
    }
    set.contains(&node.kind)
}

impl Checker for StatementShapeChecker {
    fn name(&self) -> &'static str {
        "statement-shape"
    }

    fn enter(
        &self,
        node: &ClassifiedNode,
        state: &mut TraversalState,
        policy: &Policy,
    ) -> CheckResult {
        let mut out = Vec::new();
        if node.statement {
            if state.depth == 0 && node.kind == NodeKind::FunctionDeclaration {
                if let Some(name) = node.declared_name() {
                    state.top_level_functions.insert(name.to_string());
                }
            }

            if !kind_allowed(policy.allowed_statement_kinds(), node, policy) {
                out.push(Violation::disallowed_statement(node.kind, node));
            } else if state.depth == 0
                && !kind_allowed(policy.allowed_top_level_kinds(), node, policy)
            {
                out.push(Violation::disallowed_top_level(node.kind, node));
            }

            state.statement_stack.push(node.kind);
        }
        Ok(out)
    }

    fn exit(&self, node: &ClassifiedNode, state: &mut TraversalState, _policy: &Policy) {
        if node.statement {
            state.statement_stack.pop();
        }
    }

    fn finish(
        &self,
        root: &ClassifiedNode,
        state: &TraversalState,
        policy: &Policy,
    ) -> Vec<Violation> {
        policy
            .required_functions()
            .iter()
            .filter(|name| !state.top_level_functions.contains(*name))
            .map(|name| Violation::missing_function(name, root))
            .collect()
    }
}
