//! Deterministic pre-order traversal driving the registered checkers.
//!
//! The walker visits every node depth-first, left-to-right, invoking each
//! checker's `enter` hook before descending and its `exit` hook after all
//! children have been visited. Exit hooks run even when a fail-fast abort
//! unwinds the walk, so ambient state (depth, scopes) is always restored
//! symmetrically.

use std::collections::{BTreeSet, HashSet};
use std::ops::ControlFlow;

use crate::checkers::Checker;
use crate::diagnostics::{SanitizeReport, Violation};
use crate::policy::Policy;
use crate::syntax::{ClassifiedNode, NodeKind};

/// Lexical scope chain: one frame of bound names per open scope,
/// innermost last.
#[derive(Debug, Default)]
pub struct ScopeChain {
    frames: Vec<HashSet<String>>,
}

impl ScopeChain {
    pub fn push(&mut self) {
        self.frames.push(HashSet::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Binds a name in the innermost open scope. A bind with no open scope
    /// is ignored; the program node opens the outermost scope on entry.
    pub fn bind(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string());
        }
    }

    /// True when the name is bound in any enclosing scope.
    pub fn is_bound(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.contains(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Call-local ambient traversal state. One instance exists per sanitize
/// call; it is never shared across calls and is discarded when the call
/// returns. Checkers mutate it only in paired enter/exit hooks.
#[derive(Debug, Default)]
pub struct TraversalState {
    /// Current function/block nesting depth. Top-level statements sit at 0.
    pub depth: usize,
    /// Set once the depth bound has been reported for this walk.
    pub depth_exceeded: bool,
    /// Kinds of the statements enclosing the current node, outermost first.
    pub statement_stack: Vec<NodeKind>,
    /// Names visible in the current scope chain.
    pub scopes: ScopeChain,
    /// Names of top-level function declarations seen so far.
    pub top_level_functions: BTreeSet<String>,
}

impl TraversalState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Walks a classified tree with an ordered checker list under one policy.
pub struct Walker<'a> {
    checkers: &'a [Box<dyn Checker>],
    policy: &'a Policy,
}

impl<'a> Walker<'a> {
    pub fn new(checkers: &'a [Box<dyn Checker>], policy: &'a Policy) -> Self {
        Self { checkers, policy }
    }

    /// Runs the full traversal and aggregates every checker's output into
    /// a report. Pure in-memory computation bounded by the tree size.
    pub fn walk(&self, root: &ClassifiedNode) -> SanitizeReport {
        let mut state = TraversalState::new();
        let mut violations = Vec::new();
        let flow = self.visit(root, &mut state, &mut violations);
        // Whole-program rules only fire after a completed walk; an aborted
        // fail-fast walk has already failed.
        if flow.is_continue() {
            for checker in self.checkers {
                violations.extend(checker.finish(root, &state, self.policy));
            }
        }
        SanitizeReport::from_violations(violations)
    }

    fn visit(
        &self,
        node: &ClassifiedNode,
        state: &mut TraversalState,
        out: &mut Vec<Violation>,
    ) -> ControlFlow<()> {
        let mut emitted = false;
        for checker in self.checkers {
            match checker.enter(node, state, self.policy) {
                Ok(violations) => {
                    emitted |= !violations.is_empty();
                    out.extend(violations);
                }
                Err(fault) => {
                    emitted = true;
                    out.push(Violation::checker_failure(
                        checker.name(),
                        &fault.message,
                        node,
                    ));
                }
            }
        }

        let mut flow = ControlFlow::Continue(());
        if self.policy.fail_fast() && emitted {
            flow = ControlFlow::Break(());
        }
        if flow.is_continue() {
            for child in &node.children {
                if self.visit(child, state, out).is_break() {
                    flow = ControlFlow::Break(());
                    break;
                }
            }
        }

        // Exit hooks mirror enter hooks even on an abort, so depth and
        // scope state unwind correctly.
        for checker in self.checkers {
            checker.exit(node, state, self.policy);
        }
        flow
    }
}
