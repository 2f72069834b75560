//! Free-identifier policing with scope-aware shadowing.
//!
//! This checker owns the scope chain: entering a scope-root node pushes a
//! frame and pre-collects the bindings declared directly inside it, so a
//! reference is only reported when it is genuinely free. A parameter or
//! local named `eval` shadows the global and is left alone; a reference to
//! the real global `eval` is not.

use crate::checkers::{CheckResult, Checker};
use crate::diagnostics::Violation;
use crate::policy::Policy;
use crate::syntax::{ClassifiedNode, NodeKind};
use crate::walker::{ScopeChain, TraversalState};

pub struct IdentifierChecker;

impl IdentifierChecker {
    /// Collects the binding identifiers a scope root declares: its own
    /// parameters and local declarations, plus the names of directly
    /// nested functions (which bind in this scope, not their own). Nested
    /// scope roots are not descended into; they collect their own
    /// bindings when the walk enters them.
    fn collect_bindings(node: &ClassifiedNode, scopes: &mut ScopeChain) {
        for child in &node.children {
            if child.scope_root {
                if let Some(name) = child.declared_name() {
                    scopes.bind(name);
                }
                continue;
            }
            if child.binding && child.kind == NodeKind::Identifier {
                scopes.bind(child.token_text());
            }
            Self::collect_bindings(child, scopes);
        }
    }
}

/// Deny-overrides resolution: an explicit denial always wins; an explicit
/// allowance only rescues names caught by the reserved matcher.
fn is_denied(policy: &Policy, name: &str) -> bool {
    if policy.denied_identifiers().contains(name) {
        return true;
    }
    if policy.allowed_identifiers().contains(name) {
        return false;
    }
    policy
        .reserved_matcher()
        .map_or(false, |matcher| matcher(name))
}

impl Checker for IdentifierChecker {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn enter(
        &self,
        node: &ClassifiedNode,
        state: &mut TraversalState,
        policy: &Policy,
    ) -> CheckResult {
        if node.scope_root {
            state.scopes.push();
            // A function's own name is among its direct binding children,
            // so it is visible inside its body and callable recursively.
            Self::collect_bindings(node, &mut state.scopes);
        }

        let mut out = Vec::new();
        if node.kind == NodeKind::Identifier {
            let name = node.token_text();
            if !name.is_empty() && !state.scopes.is_bound(name) && is_denied(policy, name) {
                out.push(Violation::disallowed_identifier(name, node));
            }
        }
        Ok(out)
    }

    fn exit(&self, node: &ClassifiedNode, state: &mut TraversalState, _policy: &Policy) {
        if node.scope_root {
            state.scopes.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;

    #[test]
    fn deny_overrides_allow() {
        let policy = PolicyBuilder::new()
            .allow_identifier("eval")
            .deny_identifier("eval")
            .build();
        assert!(is_denied(&policy, "eval"));
    }

    #[test]
    fn allow_rescues_reserved_matcher_hits() {
        let policy = PolicyBuilder::new()
            .reserved_matcher(|name| name.starts_with('$'))
            .allow_identifier("$host")
            .build();
        assert!(is_denied(&policy, "$secret"));
        assert!(!is_denied(&policy, "$host"));
        assert!(!is_denied(&policy, "plain"));
    }
}
