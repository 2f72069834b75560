pub use crate::diagnostics::{JsvetError, SanitizeReport, Violation, ViolationKind};
pub use crate::engine::{sanitize_source, Sanitizer};
pub use crate::parser::parse_source;
pub use crate::policy::{Policy, PolicyBuilder, UnknownNodePolicy};
pub use crate::syntax::{ClassifiedNode, NodeKind, Position, Span};

pub mod checkers;
pub mod classifier;
pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod parser;
pub mod policy;
pub mod syntax;
pub mod walker;
