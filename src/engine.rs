//! The sanitizer façade: a policy plus an ordered checker list, with
//! one-call entry points.
//!
//! A `Sanitizer` is immutable once assembled and safe to share across
//! threads: the policy is frozen, the checkers are stateless, and every
//! sanitize call gets its own traversal state. Identical inputs always
//! produce identical reports.

use crate::checkers::{default_checkers, Checker};
use crate::diagnostics::{JsvetError, SanitizeReport};
use crate::parser;
use crate::policy::Policy;
use crate::syntax::ClassifiedNode;
use crate::walker::Walker;

pub struct Sanitizer {
    policy: Policy,
    checkers: Vec<Box<dyn Checker>>,
}

impl Sanitizer {
    /// A sanitizer with the default checker set: identifiers, keywords,
    /// statement shape, depth.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            checkers: default_checkers(),
        }
    }

    /// Appends a caller-supplied checker after the defaults. Registration
    /// order is evaluation order.
    pub fn with_checker(mut self, checker: Box<dyn Checker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Vets an already-classified tree. Pure function of the tree, the
    /// policy, and the registered checkers.
    pub fn sanitize(&self, root: &ClassifiedNode) -> SanitizeReport {
        Walker::new(&self.checkers, &self.policy).walk(root)
    }

    /// Parses, classifies, and vets source text in one call. Parse
    /// failures are faults, never report entries.
    pub fn sanitize_source(&self, source: &str) -> Result<SanitizeReport, JsvetError> {
        let root = parser::parse_source(source)?;
        Ok(self.sanitize(&root))
    }
}

/// One-shot convenience over `Sanitizer::sanitize_source` with the default
/// checker set.
pub fn sanitize_source(source: &str, policy: Policy) -> Result<SanitizeReport, JsvetError> {
    Sanitizer::new(policy).sanitize_source(source)
}
