//! Keyword policing. Keywords not on the deny list are permitted; an
//! explicit denial wins over an explicit allowance.

use crate::checkers::{CheckResult, Checker};
use crate::diagnostics::Violation;
use crate::policy::Policy;
use crate::syntax::{ClassifiedNode, NodeKind};
use crate::walker::TraversalState;

pub struct KeywordChecker;

impl Checker for KeywordChecker {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn enter(
        &self,
        node: &ClassifiedNode,
        _state: &mut TraversalState,
        policy: &Policy,
    ) -> CheckResult {
        let mut out = Vec::new();
        if node.kind == NodeKind::Keyword {
            let word = node.token_text();
            if policy.denied_keywords().contains(word) {
                out.push(Violation::disallowed_keyword(word, node));
            }
        }
        Ok(out)
    }
}
