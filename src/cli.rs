//!
//! This module is the main entry point for all CLI commands and
//! orchestrates the core library functions.

use std::io::Write as _;
use std::{path::PathBuf, process};

use clap::{Parser, Subcommand, ValueEnum};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    diagnostics::{JsvetError, SanitizeReport},
    engine::Sanitizer,
    parser::parse_source,
    policy::{Policy, PolicyBuilder},
    syntax::NodeKind,
};

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "jsvet",
    version,
    about = "Vets JavaScript source against a security policy before execution."
)]
pub struct JsvetArgs {
    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Parse, classify, and check a script against a policy.
    Check {
        /// The path to the JavaScript file to check.
        #[arg(required = true)]
        file: PathBuf,
        /// The policy preset to start from.
        #[arg(long, value_enum, default_value = "secure")]
        policy: PolicyPreset,
        /// Stop at the first violation instead of collecting all of them.
        #[arg(long)]
        fail_fast: bool,
        /// Maximum function/block nesting depth (0 = unbounded).
        #[arg(long)]
        max_depth: Option<usize>,
        /// Identifiers to deny in addition to the preset.
        #[arg(long = "deny-identifier", value_name = "NAME")]
        deny_identifiers: Vec<String>,
        /// Identifiers to allow, overriding the preset's deny table.
        #[arg(long = "allow-identifier", value_name = "NAME")]
        allow_identifiers: Vec<String>,
        /// Keywords to deny in addition to the preset.
        #[arg(long = "deny-keyword", value_name = "WORD")]
        deny_keywords: Vec<String>,
        /// Keywords to allow, overriding the preset's deny table.
        #[arg(long = "allow-keyword", value_name = "WORD")]
        allow_keywords: Vec<String>,
        /// Statement kinds permitted at the top level (e.g. FunctionDeclaration).
        #[arg(long = "top-level", value_name = "KIND")]
        top_level: Vec<String>,
        /// Functions that must exist as top-level declarations.
        #[arg(long = "require-function", value_name = "NAME")]
        require_functions: Vec<String>,
        /// Emit the report as JSON instead of human-readable lines.
        #[arg(long)]
        json: bool,
    },
    /// Print the classified tree for a script.
    Tree {
        /// The path to the JavaScript file to classify.
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PolicyPreset {
    /// Full deny tables, function declarations only at the top level.
    Secure,
    /// Secure plus a required `main` function and top-level imports.
    Module,
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = JsvetArgs::parse();

    match args.command {
        ArgsCommand::Check {
            file,
            policy,
            fail_fast,
            max_depth,
            deny_identifiers,
            allow_identifiers,
            deny_keywords,
            allow_keywords,
            top_level,
            require_functions,
            json,
        } => {
            let source = read_file_or_exit(&file);
            let policy = build_policy(
                policy,
                fail_fast,
                max_depth,
                deny_identifiers,
                allow_identifiers,
                deny_keywords,
                allow_keywords,
                top_level,
                require_functions,
            )
            .unwrap_or_else(|e| {
                print_error(e);
                process::exit(2);
            });
            let report = Sanitizer::new(policy)
                .sanitize_source(&source)
                .unwrap_or_else(|e| {
                    print_error(e);
                    process::exit(2);
                });
            if json {
                print_json(&report);
            } else {
                print_report(&report);
            }
            if !report.passed {
                process::exit(1);
            }
        }

        ArgsCommand::Tree { file } => {
            let source = read_file_or_exit(&file);
            let root = parse_source(&source).unwrap_or_else(|e| {
                print_error(e);
                process::exit(2);
            });
            print!("{}", root.pretty());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_policy(
    preset: PolicyPreset,
    fail_fast: bool,
    max_depth: Option<usize>,
    deny_identifiers: Vec<String>,
    allow_identifiers: Vec<String>,
    deny_keywords: Vec<String>,
    allow_keywords: Vec<String>,
    top_level: Vec<String>,
    require_functions: Vec<String>,
) -> Result<Policy, JsvetError> {
    let mut builder = match preset {
        PolicyPreset::Secure => PolicyBuilder::secure().name("secure-default"),
        PolicyPreset::Module => PolicyBuilder::secure()
            .name("module")
            .require_function("main")
            .allow_top_level_kind(NodeKind::ImportLikeConstruct),
    };
    builder = builder.fail_fast(fail_fast);
    if let Some(depth) = max_depth {
        builder = builder.max_nesting_depth(depth);
    }
    for name in deny_identifiers {
        builder = builder.deny_identifier(name);
    }
    for name in allow_identifiers {
        builder = builder.allow_identifier(name);
    }
    for word in deny_keywords {
        builder = builder.deny_keyword(word);
    }
    for word in allow_keywords {
        builder = builder.allow_keyword(word);
    }
    for kind in &top_level {
        builder = builder.allow_top_level_kind_named(kind)?;
    }
    for name in require_functions {
        builder = builder.require_function(name);
    }
    Ok(builder.build())
}

// ============================================================================
// OUTPUT FUNCTIONS - Simple, direct output
// ============================================================================

fn read_file_or_exit(path: &PathBuf) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        print_error(JsvetError::internal(format!(
            "failed to read {}: {e}",
            path.display()
        )));
        process::exit(2);
    })
}

fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn print_report(report: &SanitizeReport) {
    let mut stdout = StandardStream::stdout(color_choice());
    if report.passed {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(stdout, "passed");
        let _ = stdout.reset();
        return;
    }
    for violation in &report.violations {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = write!(stdout, "{}", violation.position);
        let _ = stdout.reset();
        let _ = writeln!(stdout, " {}: {}", violation.kind, violation.detail);
    }
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = writeln!(
        stdout,
        "failed with {} violation(s)",
        report.violations.len()
    );
    let _ = stdout.reset();
}

fn print_json(report: &SanitizeReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            print_error(JsvetError::internal(format!(
                "failed to serialize report: {e}"
            )));
            process::exit(2);
        }
    }
}

/// Renders an engine fault through miette for rich, labeled output.
pub fn print_error(error: JsvetError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
