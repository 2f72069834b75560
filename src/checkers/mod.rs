//! Checkers: one rule family per checker, evaluated at every visited node.
//!
//! A checker inspects one classified node (plus the ambient traversal
//! state) against the policy and emits zero or more violations. Checkers
//! are stateless with respect to shared data; the only thing they may
//! mutate is the call-local `TraversalState`, and only in paired
//! enter/exit hooks so that state is restored when a subtree finishes.

pub mod depth;
pub mod identifier;
pub mod keyword;
pub mod statement;

pub use depth::DepthChecker;
pub use identifier::IdentifierChecker;
pub use keyword::KeywordChecker;
pub use statement::StatementShapeChecker;

use std::fmt;

use crate::diagnostics::Violation;
use crate::policy::Policy;
use crate::syntax::ClassifiedNode;
use crate::walker::TraversalState;

/// An internal fault inside a checker: a programming error, not a policy
/// violation. The walker records it as a `CustomCheckerFailure` violation
/// and keeps going, so one broken checker cannot silence the rest of the
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerFault {
    pub message: String,
}

impl CheckerFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for CheckerFault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CheckerFault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

pub type CheckResult = Result<Vec<Violation>, CheckerFault>;

/// One rule family. Implementations must be `Send + Sync` and free of
/// internal mutable state so a single checker list can serve concurrent
/// sanitize calls.
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called before the node's children are visited.
    fn enter(
        &self,
        node: &ClassifiedNode,
        state: &mut TraversalState,
        policy: &Policy,
    ) -> CheckResult;

    /// Called after all of the node's children have been visited. Always
    /// paired with `enter`, including when a fail-fast abort unwinds the
    /// walk.
    fn exit(&self, _node: &ClassifiedNode, _state: &mut TraversalState, _policy: &Policy) {}

    /// Called once after a completed traversal for whole-program rules.
    /// Skipped when fail-fast aborted the walk.
    fn finish(
        &self,
        _root: &ClassifiedNode,
        _state: &TraversalState,
        _policy: &Policy,
    ) -> Vec<Violation> {
        Vec::new()
    }
}

/// The default checker set, in registration order: identifiers, keywords,
/// statement shape, depth.
pub fn default_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(IdentifierChecker),
        Box::new(KeywordChecker),
        Box::new(StatementShapeChecker),
        Box::new(DepthChecker),
    ]
}
