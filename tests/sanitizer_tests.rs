//! End-to-end tests for the sanitize pipeline: parse, classify, walk,
//! report. Each test drives the public API the way an embedding host
//! would.

use jsvet::checkers::{CheckResult, Checker, CheckerFault};
use jsvet::diagnostics::Violation;
use jsvet::policy::{Policy, PolicyBuilder, UnknownNodePolicy};
use jsvet::syntax::ClassifiedNode;
use jsvet::walker::TraversalState;
use jsvet::{sanitize_source, NodeKind, Sanitizer, ViolationKind};

fn count_nodes(node: &ClassifiedNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

// ============================================================================
// DEFAULT-POLICY SCENARIOS
// ============================================================================

#[test]
fn plain_function_declaration_passes() {
    let report = sanitize_source("function foo(){ return 1+1; }", Policy::secure_default()).unwrap();
    assert!(report.passed, "unexpected violations: {:?}", report.violations);
    assert!(report.violations.is_empty());
}

#[test]
fn top_level_eval_call_is_one_identifier_violation() {
    let report = sanitize_source("eval('danger');", Policy::secure_default()).unwrap();
    assert!(!report.passed);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::DisallowedIdentifier);
    assert_eq!(violation.detail, "Identifier eval is not allowed.");
    assert_eq!(violation.position.line, 1);
    assert_eq!(violation.position.column, 0);
    assert_eq!(violation.position.offset, 0);
}

#[test]
fn top_level_let_is_rejected_but_function_is_not() {
    let report = sanitize_source("let x = 1; function f(){}", Policy::secure_default()).unwrap();
    assert!(!report.passed);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::DisallowedTopLevelKind);
    assert_eq!(violation.position.offset, 0);
}

#[test]
fn nesting_bound_is_reported_exactly_once() {
    let source = "function f1(){ function f2(){ function f3(){ function f4(){ \
                  function f5(){ function f6(){} } } } } }";
    let policy = PolicyBuilder::new().max_nesting_depth(3).build();
    let report = sanitize_source(source, policy).unwrap();
    assert!(!report.passed);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::DepthExceeded);
    assert_eq!(
        report.violations[0].detail,
        "Nesting depth 4 exceeds the limit of 3."
    );
}

// ============================================================================
// CUSTOM CHECKERS
// ============================================================================

struct AlwaysFaulting;

impl Checker for AlwaysFaulting {
    fn name(&self) -> &'static str {
        "always-faulting"
    }

    fn enter(
        &self,
        _node: &ClassifiedNode,
        _state: &mut TraversalState,
        _policy: &Policy,
    ) -> CheckResult {
        Err(CheckerFault::new("intentional fault"))
    }
}

#[test]
fn faulting_custom_checker_does_not_abort_the_walk() {
    let source = "function foo(){ return 1; }";
    let root = jsvet::parse_source(source).unwrap();
    let total = count_nodes(&root);

    let sanitizer = Sanitizer::new(PolicyBuilder::new().build()).with_checker(Box::new(AlwaysFaulting));
    let report = sanitizer.sanitize(&root);
    assert!(!report.passed);
    assert_eq!(report.violations.len(), total);
    assert!(report
        .violations
        .iter()
        .all(|v| v.kind == ViolationKind::CustomCheckerFailure));
}

#[test]
fn faulting_custom_checker_with_fail_fast_stops_at_the_first_node() {
    let sanitizer = Sanitizer::new(PolicyBuilder::new().fail_fast(true).build())
        .with_checker(Box::new(AlwaysFaulting));
    let report = sanitizer.sanitize_source("function foo(){ return 1; }").unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::CustomCheckerFailure);
}

/// Emits a violation from `finish` when the ambient depth failed to
/// unwind, so a passing report certifies the depth invariant.
struct DepthInvariantProbe;

impl Checker for DepthInvariantProbe {
    fn name(&self) -> &'static str {
        "depth-invariant-probe"
    }

    fn enter(
        &self,
        _node: &ClassifiedNode,
        _state: &mut TraversalState,
        _policy: &Policy,
    ) -> CheckResult {
        Ok(vec![])
    }

    fn finish(
        &self,
        root: &ClassifiedNode,
        state: &TraversalState,
        _policy: &Policy,
    ) -> Vec<Violation> {
        if state.depth != 0 || state.scopes.depth() != 0 {
            vec![Violation::checker_failure(
                self.name(),
                "ambient state leaked past the walk",
                root,
            )]
        } else {
            Vec::new()
        }
    }
}

#[test]
fn depth_and_scopes_unwind_to_zero_after_the_walk() {
    let source = "function a(){ { { function b(){} } } } { let x = 1; }";
    let sanitizer =
        Sanitizer::new(PolicyBuilder::new().build()).with_checker(Box::new(DepthInvariantProbe));
    let report = sanitizer.sanitize_source(source).unwrap();
    assert!(report.passed, "unexpected violations: {:?}", report.violations);
}

// ============================================================================
// DETERMINISM AND FAIL-FAST
// ============================================================================

#[test]
fn identical_inputs_yield_identical_reports() {
    let source = "eval('x'); debugger; function f(){ Function('y'); }";
    let first = sanitize_source(source, Policy::secure_default()).unwrap();
    let second = sanitize_source(source, Policy::secure_default()).unwrap();
    assert_eq!(first, second);
    assert!(!first.passed);
}

#[test]
fn fail_fast_report_is_the_head_of_the_full_report() {
    let source = "eval('x'); debugger; Function('y');";
    let full = sanitize_source(source, Policy::secure_default()).unwrap();
    assert!(full.violations.len() > 1);

    let fast_policy = PolicyBuilder::secure().fail_fast(true).build();
    let fast = sanitize_source(source, fast_policy).unwrap();
    assert_eq!(fast.violations.len(), 1);
    assert_eq!(fast.violations[0], full.violations[0]);
}

// ============================================================================
// IDENTIFIER RESOLUTION
// ============================================================================

#[test]
fn locals_shadow_denied_globals() {
    let source = "function wrap(eval) { return eval(1); }\neval(2);";
    let report = sanitize_source(source, Policy::secure_default()).unwrap();
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::DisallowedIdentifier);
    assert_eq!(violation.position.line, 2);
}

#[test]
fn block_scoped_shadowing_does_not_leak_to_siblings() {
    let source = "function f() { { let eval = 1; eval; } eval; }";
    let report = sanitize_source(source, Policy::secure_default()).unwrap();
    // Only the second reference, outside the inner block, is free.
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::DisallowedIdentifier);
}

#[test]
fn deny_overrides_allow_for_identifiers() {
    let policy = PolicyBuilder::new()
        .allow_identifier("eval")
        .deny_identifier("eval")
        .build();
    let report = sanitize_source("eval(1);", policy).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::DisallowedIdentifier);
}

#[test]
fn denied_property_names_are_caught() {
    let policy = PolicyBuilder::secure().build();
    let report = sanitize_source("function f(o) { return o.__proto__; }", policy).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(
        report.violations[0].detail,
        "Identifier __proto__ is not allowed."
    );
}

#[test]
fn reserved_matcher_denies_unless_allowed() {
    let policy = PolicyBuilder::new()
        .reserved_matcher(|name| name.starts_with('$'))
        .allow_identifier("$host")
        .build();
    let report = sanitize_source("$secret(); $host(); plain();", policy).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(
        report.violations[0].detail,
        "Identifier $secret is not allowed."
    );
}

// ============================================================================
// KEYWORDS
// ============================================================================

#[test]
fn denied_keywords_are_reported_where_they_occur() {
    let report = sanitize_source(
        "function f() { debugger; }",
        Policy::secure_default(),
    )
    .unwrap();
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::DisallowedKeyword);
    assert_eq!(violation.detail, "Keyword debugger is not allowed.");
}

#[test]
fn dynamic_import_is_a_keyword_violation() {
    let policy = PolicyBuilder::new()
        .deny_keyword("import")
        .build();
    let report = sanitize_source("function f() { return import('m'); }", policy).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::DisallowedKeyword);
}

#[test]
fn allowed_keyword_passes() {
    let policy = PolicyBuilder::secure().allow_keyword("debugger").build();
    let report = sanitize_source("function f() { debugger; }", policy).unwrap();
    assert!(report.passed);
}

// ============================================================================
// MODULE PROFILE
// ============================================================================

#[test]
fn module_profile_requires_a_main_function() {
    let report = sanitize_source("function a() {}", Policy::module()).unwrap();
    assert!(!report.passed);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::MissingRequiredFunction);
    assert_eq!(violation.detail, "Function main is not found.");
}

#[test]
fn module_profile_passes_with_main() {
    let report = sanitize_source("function main() {}", Policy::module()).unwrap();
    assert!(report.passed);
}

#[test]
fn module_imports_pass_only_when_the_keyword_is_allowed() {
    let source = "import { x } from 'mod';\nfunction main() { return x; }";

    let denied = sanitize_source(source, Policy::module()).unwrap();
    assert!(!denied.passed);
    assert!(denied
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::DisallowedKeyword
            && v.detail == "Keyword import is not allowed."));

    let allowed_policy = PolicyBuilder::secure()
        .name("module")
        .require_function("main")
        .allow_top_level_kind(NodeKind::ImportLikeConstruct)
        .allow_keyword("import")
        .build();
    let allowed = sanitize_source(source, allowed_policy).unwrap();
    assert!(allowed.passed, "unexpected violations: {:?}", allowed.violations);
}

// ============================================================================
// UNKNOWN STATEMENTS
// ============================================================================

#[test]
fn unclassified_statements_follow_the_unknown_node_policy() {
    let source = "1 + 1;";

    let permissive = sanitize_source(source, Policy::secure_default()).unwrap();
    assert!(permissive.passed);

    let strict_policy = PolicyBuilder::secure()
        .unknown_statements(UnknownNodePolicy::Deny)
        .build();
    let strict = sanitize_source(source, strict_policy).unwrap();
    assert!(!strict.passed);
    assert_eq!(strict.violations.len(), 1);
    assert_eq!(
        strict.violations[0].kind,
        ViolationKind::DisallowedTopLevelKind
    );
}
