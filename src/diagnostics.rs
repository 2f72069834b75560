//! Diagnostics: policy violations (data) and engine faults (errors).
//!
//! These are two disjoint classes. Violations are expected, first-class
//! outcomes — the input code broke the policy — collected in order into a
//! `SanitizeReport`; they never abort a sanitize call. `JsvetError` covers
//! engine faults: unparseable input, a malformed policy, an internal
//! failure. A fault means the engine cannot trust its own verdict, so
//! faults always propagate to the caller and are never folded into a
//! report.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::syntax::{ClassifiedNode, NodeKind, Position, Span};

pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// VIOLATIONS - expected outcomes, plain data
// ============================================================================

/// Classification of a single policy breach.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    DisallowedIdentifier,
    DisallowedKeyword,
    DisallowedStatementKind,
    DisallowedTopLevelKind,
    DepthExceeded,
    MissingRequiredFunction,
    CustomCheckerFailure,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::DisallowedIdentifier => "DisallowedIdentifier",
            ViolationKind::DisallowedKeyword => "DisallowedKeyword",
            ViolationKind::DisallowedStatementKind => "DisallowedStatementKind",
            ViolationKind::DisallowedTopLevelKind => "DisallowedTopLevelKind",
            ViolationKind::DepthExceeded => "DepthExceeded",
            ViolationKind::MissingRequiredFunction => "MissingRequiredFunction",
            ViolationKind::CustomCheckerFailure => "CustomCheckerFailure",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One concrete policy breach with its source position. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub detail: String,
    pub position: Position,
    pub span: Span,
}

impl Violation {
    fn at(kind: ViolationKind, detail: String, node: &ClassifiedNode) -> Self {
        Self {
            kind,
            detail,
            position: node.position,
            span: node.span,
        }
    }

    pub fn disallowed_identifier(name: &str, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::DisallowedIdentifier,
            format!("Identifier {name} is not allowed."),
            node,
        )
    }

    pub fn disallowed_keyword(name: &str, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::DisallowedKeyword,
            format!("Keyword {name} is not allowed."),
            node,
        )
    }

    pub fn disallowed_statement(kind: NodeKind, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::DisallowedStatementKind,
            format!("Statement {kind} is not allowed."),
            node,
        )
    }

    pub fn disallowed_top_level(kind: NodeKind, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::DisallowedTopLevelKind,
            format!("Statement {kind} is not allowed at the top level."),
            node,
        )
    }

    pub fn depth_exceeded(depth: usize, max: usize, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::DepthExceeded,
            format!("Nesting depth {depth} exceeds the limit of {max}."),
            node,
        )
    }

    pub fn missing_function(name: &str, root: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::MissingRequiredFunction,
            format!("Function {name} is not found."),
            root,
        )
    }

    pub fn checker_failure(checker: &str, message: &str, node: &ClassifiedNode) -> Self {
        Self::at(
            ViolationKind::CustomCheckerFailure,
            format!("Checker {checker} failed: {message}"),
            node,
        )
    }
}

/// The ordered outcome of one sanitize call. `passed` holds exactly when
/// `violations` is empty; violations appear in visit order (pre-order,
/// left-to-right), so identical inputs produce identical reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizeReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl SanitizeReport {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

// ============================================================================
// ENGINE FAULTS - the sanitizer cannot trust its own verdict
// ============================================================================

/// Minimal, composable error context for fault diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this fault (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this fault (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source(source: SourceArc) -> Self {
        Self {
            source: Some(source),
            span: None,
            help: None,
        }
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for all engine fault modes. Policy violations are
/// never represented here; they are data in the `SanitizeReport`.
#[derive(Debug, Error)]
pub enum JsvetError {
    #[error("Parse error: {message}")]
    Parse { message: String, ctx: ErrorContext },
    #[error("The JavaScript code is empty.")]
    EmptyCode { ctx: ErrorContext },
    #[error("Policy error: {message}")]
    Policy { message: String, ctx: ErrorContext },
    #[error("Internal error: {message}")]
    Internal { message: String, ctx: ErrorContext },
}

impl JsvetError {
    fn get_ctx(&self) -> &ErrorContext {
        match self {
            JsvetError::Parse { ctx, .. } => ctx,
            JsvetError::EmptyCode { ctx } => ctx,
            JsvetError::Policy { ctx, .. } => ctx,
            JsvetError::Internal { ctx, .. } => ctx,
        }
    }

    fn code_str(&self) -> &'static str {
        match self {
            JsvetError::Parse { .. } => "jsvet::parse::invalid",
            JsvetError::EmptyCode { .. } => "jsvet::parse::empty",
            JsvetError::Policy { .. } => "jsvet::policy::invalid",
            JsvetError::Internal { .. } => "jsvet::internal",
        }
    }

    /// The source could not be parsed as JavaScript.
    pub fn invalid_code(source: &str, span: Span) -> Self {
        JsvetError::Parse {
            message: "The JavaScript code is invalid.".to_string(),
            ctx: ErrorContext::with_source_and_span(to_error_source(source), span),
        }
    }

    /// The source is blank; there is nothing to vet.
    pub fn empty_code(source: &str) -> Self {
        JsvetError::EmptyCode {
            ctx: ErrorContext::with_source(to_error_source(source)),
        }
    }

    /// The policy referenced something the engine does not know, e.g. an
    /// unknown node-kind name.
    pub fn policy(message: impl Into<String>) -> Self {
        JsvetError::Policy {
            message: message.into(),
            ctx: ErrorContext::none(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        JsvetError::Internal {
            message: message.into(),
            ctx: ErrorContext::none(),
        }
    }
}

impl Diagnostic for JsvetError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        let span = ctx.span?;
        let len = if span.is_empty() { 1 } else { span.len() };
        let label = match self {
            JsvetError::Parse { message, .. } => message.clone(),
            JsvetError::EmptyCode { .. } => "empty source".to_string(),
            JsvetError::Policy { message, .. } => message.clone(),
            JsvetError::Internal { message, .. } => message.clone(),
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(label),
            span.start,
            len,
        ))))
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in
/// fault contexts.
pub fn to_error_source<S: AsRef<str>>(source: S) -> SourceArc {
    Arc::new(NamedSource::new("source", source.as_ref().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_passes_only_when_empty() {
        let report = SanitizeReport::from_violations(vec![]);
        assert!(report.passed);

        let node = ClassifiedNode {
            kind: NodeKind::Identifier,
            grammar_kind: "identifier".to_string(),
            text: Some("eval".to_string()),
            position: Position {
                line: 1,
                column: 0,
                offset: 0,
            },
            span: Span { start: 0, end: 4 },
            statement: false,
            scope_root: false,
            binding: false,
            children: vec![],
        };
        let report =
            SanitizeReport::from_violations(vec![Violation::disallowed_identifier("eval", &node)]);
        assert!(!report.passed);
        assert_eq!(report.first().unwrap().detail, "Identifier eval is not allowed.");
    }

    #[test]
    fn faults_render_with_labels() {
        let err = JsvetError::invalid_code("let x = ;", Span { start: 8, end: 9 });
        let report = miette::Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("jsvet::parse::invalid"));
        assert!(output.contains("invalid"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = SanitizeReport::from_violations(vec![]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"passed\":true"));
    }
}
