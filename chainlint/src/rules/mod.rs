//! Rule infrastructure: the per-file [`Context`], the [`Finding`] record, and
//! the [`Rule`] trait every check implements.
//!
//! The walker owns a fresh set of rule instances per file and feeds them the
//! traversal callbacks; a rule keeps whatever state it needs across callbacks
//! and returns findings as it detects them. Findings are appended in
//! detection order and never re-sorted.

use std::path::PathBuf;

use serde::Serialize;

use crate::ast::{Expr, Function, Program, Stmt};
use crate::cfg::SegmentId;
use crate::config::Config;
use crate::rules::registry::RuleDescriptor;

/// Module containing the continuation flow analysis.
pub mod flow;
/// Module containing handler-body rules.
pub mod handler;
/// Rule catalog and lookup.
pub mod registry;
/// Module containing route-registration rules.
pub mod routing;

#[derive(Debug, Clone)]
/// Context passed to rules during analysis.
pub struct Context {
    /// Path to the file being analyzed.
    pub filename: PathBuf,
    /// Configuration settings.
    pub config: Config,
}

#[derive(Debug, Clone, Serialize)]
/// A single issue found by a rule.
pub struct Finding {
    /// ID of the rule that triggered the finding.
    pub rule_id: String,
    /// Rule name (kebab-case, stable across releases).
    pub rule_name: String,
    /// Category ("Problem" or "Suggestion").
    pub category: String,
    /// Severity level (e.g., "HIGH", "LOW").
    pub severity: String,
    /// Description of the issue.
    pub message: String,
    /// File where the issue was found.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub col: usize,
}

/// Builds a [`Finding`] for `descriptor` anchored at `span`.
#[must_use]
pub fn create_finding(
    message: impl Into<String>,
    descriptor: &RuleDescriptor,
    context: &Context,
    span: crate::ast::Span,
) -> Finding {
    Finding {
        rule_id: descriptor.id.to_owned(),
        rule_name: descriptor.name.to_owned(),
        category: descriptor.category.as_str().to_owned(),
        severity: descriptor.default_severity.as_str().to_owned(),
        message: message.into(),
        file: context.filename.clone(),
        line: span.line,
        col: span.col,
    }
}

/// Trait defining a linting rule.
///
/// Statement/expression hooks fire in program order during the single walk of
/// a file. The code-path hooks mirror the control-flow lifecycle: for every
/// function the walker emits `code_path_start`, then the interleaved
/// `segment_start`/`segment_end` events for its body, then `code_path_end`;
/// a nested function's events are fully bracketed inside its enclosing
/// function's walk. Segment predecessors may name segments that already ended
/// (joins) or that have not started yet (loop back-edge targets); consumers
/// read whatever state they have stored and default to "nothing known".
pub trait Rule: Send + Sync {
    /// Returns the descriptive name of the rule.
    fn name(&self) -> &'static str;
    /// Returns the rule's catalog entry.
    fn descriptor(&self) -> &'static RuleDescriptor;
    /// Called when the file's top level is entered.
    fn enter_program(&mut self, _program: &Program, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when entering a statement.
    fn enter_stmt(&mut self, _stmt: &Stmt, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when leaving a statement.
    fn leave_stmt(&mut self, _stmt: &Stmt, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when entering an expression.
    fn enter_expr(&mut self, _expr: &Expr, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when leaving an expression.
    fn leave_expr(&mut self, _expr: &Expr, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when a function body's control-flow graph starts.
    fn code_path_start(&mut self, _func: &Function, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when the current function body's control-flow graph ends.
    fn code_path_end(&mut self, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
    /// Called when a control-flow segment starts being walked.
    fn segment_start(
        &mut self,
        _segment: SegmentId,
        _predecessors: &[SegmentId],
        _context: &Context,
    ) -> Option<Vec<Finding>> {
        None
    }
    /// Called when a control-flow segment stops being walked.
    fn segment_end(&mut self, _segment: SegmentId, _context: &Context) -> Option<Vec<Finding>> {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixture runner for rule unit tests: parse a snippet, walk it
    //! with a single rule, return the findings.

    use super::{Context, Finding, Rule};
    use crate::config::Config;
    use crate::parser::{parse_source, Language};
    use crate::visitor::Walker;

    pub(crate) fn run_rule(rule: Box<dyn Rule>, source: &str) -> Vec<Finding> {
        run_rule_with_config(rule, source, Config::default())
    }

    pub(crate) fn run_rule_with_config(
        rule: Box<dyn Rule>,
        source: &str,
        config: Config,
    ) -> Vec<Finding> {
        run_in(rule, source, Language::JavaScript, config)
    }

    pub(crate) fn run_rule_ts(rule: Box<dyn Rule>, source: &str) -> Vec<Finding> {
        run_in(rule, source, Language::TypeScript, Config::default())
    }

    fn run_in(rule: Box<dyn Rule>, source: &str, language: Language, config: Config) -> Vec<Finding> {
        let parsed = parse_source(source, language).expect("fixture must parse");
        assert!(
            parsed.issues.is_empty(),
            "fixture has syntax errors: {:?}",
            parsed.issues
        );
        let context = Context {
            filename: "fixture.js".into(),
            config,
        };
        Walker::new(vec![rule], &context).run(&parsed.program)
    }
}
