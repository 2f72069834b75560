//! Sanitization policy: immutable allow/deny configuration.
//!
//! A `Policy` is built once through `PolicyBuilder`, frozen by `build()`,
//! and shared read-only across any number of concurrent sanitize calls.
//! The policy is plain data plus lookups; the allow/deny combination logic
//! (deny-overrides) lives in the checkers.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::diagnostics::JsvetError;
use crate::syntax::NodeKind;

/// Caller-supplied predicate marking identifiers as reserved for the host:
/// matching names are denied unless explicitly allowed.
pub type ReservedMatcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// How statements whose kind folds to `Other` are treated when a statement
/// or top-level restriction is in force. `Allow` degrades gracefully under
/// grammar drift; `Deny` refuses anything the taxonomy cannot name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UnknownNodePolicy {
    #[default]
    Allow,
    Deny,
}

// ============================================================================
// DEFAULT DENY TABLES
// ============================================================================

/// Identifiers denied by the secure default policy: reflection, dynamic
/// code loading, prototype manipulation, timers, and host globals.
pub const DEFAULT_DENIED_IDENTIFIERS: &[&str] = &[
    "__proto__",
    "apply",
    "AsyncFunction",
    "AsyncGenerator",
    "AsyncGeneratorFunction",
    "bind",
    "call",
    "clearInterval",
    "clearTimeout",
    "defineProperty",
    "defineProperties",
    "eval",
    "Function",
    "global",
    "globalThis",
    "getPrototypeOf",
    "Generator",
    "GeneratorFunction",
    "Intl",
    "prototype",
    "Proxy",
    "Promise",
    "require",
    "Reflect",
    "setImmediate",
    "setInterval",
    "setTimeout",
    "setPrototypeOf",
    "Symbol",
    "uneval",
    "XMLHttpRequest",
    "WebAssembly",
    "window",
];

/// Keywords denied by the secure default policy.
pub const DEFAULT_DENIED_KEYWORDS: &[&str] = &[
    "async", "await", "debugger", "export", "import", "var", "with", "yield",
];

static SECURE_DEFAULT: Lazy<Policy> = Lazy::new(|| {
    PolicyBuilder::secure()
        .name("secure-default")
        .build()
});

static MODULE: Lazy<Policy> = Lazy::new(|| {
    PolicyBuilder::secure()
        .name("module")
        .require_function("main")
        .allow_top_level_kind(NodeKind::ImportLikeConstruct)
        .build()
});

// ============================================================================
// POLICY
// ============================================================================

/// Immutable description of what a script is permitted to contain. Frozen
/// at construction; sanitize calls only ever read it, so one policy can
/// serve many concurrent calls without locking.
#[derive(Clone)]
pub struct Policy {
    name: String,
    allowed_identifiers: BTreeSet<String>,
    denied_identifiers: BTreeSet<String>,
    allowed_keywords: BTreeSet<String>,
    denied_keywords: BTreeSet<String>,
    allowed_statement_kinds: Option<BTreeSet<NodeKind>>,
    allowed_top_level_kinds: Option<BTreeSet<NodeKind>>,
    max_nesting_depth: Option<usize>,
    fail_fast: bool,
    reserved_matcher: Option<ReservedMatcher>,
    required_functions: BTreeSet<String>,
    unknown_statements: UnknownNodePolicy,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// The strict default: full deny tables, top level restricted to
    /// function declarations, collect-all reporting.
    pub fn secure_default() -> Policy {
        SECURE_DEFAULT.clone()
    }

    /// The module profile: `secure_default` plus a required `main`
    /// function and import/export permitted at the top level once the
    /// `import` keyword is allowed.
    pub fn module() -> Policy {
        MODULE.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_identifiers(&self) -> &BTreeSet<String> {
        &self.allowed_identifiers
    }

    pub fn denied_identifiers(&self) -> &BTreeSet<String> {
        &self.denied_identifiers
    }

    pub fn allowed_keywords(&self) -> &BTreeSet<String> {
        &self.allowed_keywords
    }

    pub fn denied_keywords(&self) -> &BTreeSet<String> {
        &self.denied_keywords
    }

    /// Statement kinds permitted anywhere; `None` means unrestricted.
    pub fn allowed_statement_kinds(&self) -> Option<&BTreeSet<NodeKind>> {
        self.allowed_statement_kinds.as_ref()
    }

    /// Statement kinds permitted at depth 0; `None` means unrestricted.
    pub fn allowed_top_level_kinds(&self) -> Option<&BTreeSet<NodeKind>> {
        self.allowed_top_level_kinds.as_ref()
    }

    /// Nesting bound; `None` means unbounded.
    pub fn max_nesting_depth(&self) -> Option<usize> {
        self.max_nesting_depth
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn reserved_matcher(&self) -> Option<&ReservedMatcher> {
        self.reserved_matcher.as_ref()
    }

    /// Functions that must exist as top-level declarations.
    pub fn required_functions(&self) -> &BTreeSet<String> {
        &self.required_functions
    }

    pub fn unknown_statements(&self) -> UnknownNodePolicy {
        self.unknown_statements
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("name", &self.name)
            .field("allowed_identifiers", &self.allowed_identifiers)
            .field("denied_identifiers", &self.denied_identifiers)
            .field("allowed_keywords", &self.allowed_keywords)
            .field("denied_keywords", &self.denied_keywords)
            .field("allowed_statement_kinds", &self.allowed_statement_kinds)
            .field("allowed_top_level_kinds", &self.allowed_top_level_kinds)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .field("fail_fast", &self.fail_fast)
            .field(
                "reserved_matcher",
                &self.reserved_matcher.as_ref().map(|_| "<fn>"),
            )
            .field("required_functions", &self.required_functions)
            .field("unknown_statements", &self.unknown_statements)
            .finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Fluent builder for `Policy`. `allow_*` removes the name from the deny
/// set and records it in the allow set; `deny_*` only inserts, so a name
/// that is denied after being allowed stays denied (deny-overrides).
#[derive(Default)]
pub struct PolicyBuilder {
    name: String,
    allowed_identifiers: BTreeSet<String>,
    denied_identifiers: BTreeSet<String>,
    allowed_keywords: BTreeSet<String>,
    denied_keywords: BTreeSet<String>,
    allowed_statement_kinds: Option<BTreeSet<NodeKind>>,
    allowed_top_level_kinds: Option<BTreeSet<NodeKind>>,
    max_nesting_depth: Option<usize>,
    fail_fast: bool,
    reserved_matcher: Option<ReservedMatcher>,
    required_functions: BTreeSet<String>,
    unknown_statements: UnknownNodePolicy,
}

impl PolicyBuilder {
    /// An empty, permissive builder: nothing denied, nothing restricted.
    pub fn new() -> Self {
        Self {
            name: "unnamed".to_string(),
            ..Self::default()
        }
    }

    /// A builder seeded with the default deny tables and the
    /// function-declarations-only top level.
    pub fn secure() -> Self {
        let mut builder = Self::new();
        builder.denied_identifiers = DEFAULT_DENIED_IDENTIFIERS
            .iter()
            .map(|s| s.to_string())
            .collect();
        builder.denied_keywords = DEFAULT_DENIED_KEYWORDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        builder.allowed_top_level_kinds =
            Some([NodeKind::FunctionDeclaration].into_iter().collect());
        builder
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn allow_identifier(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.denied_identifiers.remove(&name);
        self.allowed_identifiers.insert(name);
        self
    }

    pub fn deny_identifier(mut self, name: impl Into<String>) -> Self {
        self.denied_identifiers.insert(name.into());
        self
    }

    pub fn allow_keyword(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.denied_keywords.remove(&name);
        self.allowed_keywords.insert(name);
        self
    }

    pub fn deny_keyword(mut self, name: impl Into<String>) -> Self {
        self.denied_keywords.insert(name.into());
        self
    }

    /// Restricts statement kinds permitted anywhere. The first call turns
    /// the restriction on; later calls extend the allowed set.
    pub fn allow_statement_kind(mut self, kind: NodeKind) -> Self {
        self.allowed_statement_kinds
            .get_or_insert_with(BTreeSet::new)
            .insert(kind);
        self
    }

    /// Restricts statement kinds permitted at depth 0.
    pub fn allow_top_level_kind(mut self, kind: NodeKind) -> Self {
        self.allowed_top_level_kinds
            .get_or_insert_with(BTreeSet::new)
            .insert(kind);
        self
    }

    /// Like `allow_statement_kind`, from a user-supplied kind name. An
    /// unknown name is a policy fault, not a silent no-op.
    pub fn allow_statement_kind_named(self, name: &str) -> Result<Self, JsvetError> {
        let kind = parse_kind(name)?;
        Ok(self.allow_statement_kind(kind))
    }

    /// Like `allow_top_level_kind`, from a user-supplied kind name.
    pub fn allow_top_level_kind_named(self, name: &str) -> Result<Self, JsvetError> {
        let kind = parse_kind(name)?;
        Ok(self.allow_top_level_kind(kind))
    }

    /// Bounds function/block nesting. `0` means unbounded.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = if depth == 0 { None } else { Some(depth) };
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn reserved_matcher(
        mut self,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.reserved_matcher = Some(Arc::new(matcher));
        self
    }

    pub fn require_function(mut self, name: impl Into<String>) -> Self {
        self.required_functions.insert(name.into());
        self
    }

    pub fn unknown_statements(mut self, policy: UnknownNodePolicy) -> Self {
        self.unknown_statements = policy;
        self
    }

    /// Freezes the builder into an immutable `Policy`.
    pub fn build(self) -> Policy {
        Policy {
            name: self.name,
            allowed_identifiers: self.allowed_identifiers,
            denied_identifiers: self.denied_identifiers,
            allowed_keywords: self.allowed_keywords,
            denied_keywords: self.denied_keywords,
            allowed_statement_kinds: self.allowed_statement_kinds,
            allowed_top_level_kinds: self.allowed_top_level_kinds,
            max_nesting_depth: self.max_nesting_depth,
            fail_fast: self.fail_fast,
            reserved_matcher: self.reserved_matcher,
            required_functions: self.required_functions,
            unknown_statements: self.unknown_statements,
        }
    }
}

fn parse_kind(name: &str) -> Result<NodeKind, JsvetError> {
    NodeKind::parse(name)
        .ok_or_else(|| JsvetError::policy(format!("unknown node kind name: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_default_denies_eval_and_function() {
        let policy = Policy::secure_default();
        assert!(policy.denied_identifiers().contains("eval"));
        assert!(policy.denied_identifiers().contains("Function"));
        assert!(policy.denied_keywords().contains("import"));
        assert_eq!(
            policy.allowed_top_level_kinds().unwrap().iter().collect::<Vec<_>>(),
            vec![&NodeKind::FunctionDeclaration]
        );
    }

    #[test]
    fn allow_removes_from_deny_set() {
        let policy = PolicyBuilder::secure().allow_keyword("import").build();
        assert!(!policy.denied_keywords().contains("import"));
        assert!(policy.allowed_keywords().contains("import"));
    }

    #[test]
    fn deny_after_allow_stays_denied() {
        let policy = PolicyBuilder::new()
            .allow_identifier("eval")
            .deny_identifier("eval")
            .build();
        assert!(policy.denied_identifiers().contains("eval"));
        assert!(policy.allowed_identifiers().contains("eval"));
    }

    #[test]
    fn unknown_kind_name_is_a_fault() {
        let err = PolicyBuilder::new()
            .allow_top_level_kind_named("FunctionDeclarationContext")
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown node kind"));
    }

    #[test]
    fn zero_depth_means_unbounded() {
        let policy = PolicyBuilder::new().max_nesting_depth(0).build();
        assert_eq!(policy.max_nesting_depth(), None);
        let policy = PolicyBuilder::new().max_nesting_depth(3).build();
        assert_eq!(policy.max_nesting_depth(), Some(3));
    }

    #[test]
    fn module_profile_requires_main() {
        let policy = Policy::module();
        assert!(policy.required_functions().contains("main"));
        assert!(policy
            .allowed_top_level_kinds()
            .unwrap()
            .contains(&NodeKind::ImportLikeConstruct));
    }
}
