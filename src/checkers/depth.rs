//! Nesting-depth accounting. Blocks (function bodies included) increment
//! the ambient depth on enter and decrement it on exit; the bound is
//! reported once per walk, at the first crossing.

use crate::checkers::{CheckResult, Checker};
use crate::diagnostics::Violation;
use crate::policy::Policy;
use crate::syntax::{ClassifiedNode, NodeKind};
use crate::walker::TraversalState;

pub struct DepthChecker;

impl Checker for DepthChecker {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn enter(
        &self,
        node: &ClassifiedNode,
        state: &mut TraversalState,
        policy: &Policy,
    ) -> CheckResult {
        let mut out = Vec::new();
        if node.kind == NodeKind::Block {
            state.depth += 1;
            if let Some(max) = policy.max_nesting_depth() {
                if state.depth > max && !state.depth_exceeded {
                    state.depth_exceeded = true;
                    out.push(Violation::depth_exceeded(state.depth, max, node));
                }
            }
        }
        Ok(out)
    }

    fn exit(&self, node: &ClassifiedNode, state: &mut TraversalState, _policy: &Policy) {
        if node.kind == NodeKind::Block {
            debug_assert!(state.depth > 0, "unbalanced depth accounting");
            state.depth = state.depth.saturating_sub(1);
        }
    }
}
