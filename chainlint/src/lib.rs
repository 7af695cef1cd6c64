//! chainlint — static analysis for chained-call middleware code.
//!
//! The toolkit inspects JavaScript/TypeScript written against a chained-call,
//! continuation-passing request-handling API (a builder object registering
//! handlers per HTTP method; handlers receive a context plus an optional
//! continuation callback) and flags structural misuses that are syntactically
//! legal but semantically wrong or stylistically harmful — without executing
//! any code.
//!
//! The centerpiece is the continuation single-invocation analysis
//! ([`rules::flow`]): a forward dataflow pass over per-function control-flow
//! segments that verifies a handler's continuation is invoked at most once
//! along every execution path. Around it sit structural rules for route
//! registration, parameter names, discarded responses, environment access,
//! and error types.
//!
//! Analysis is per file and per function body: no execution, no cross-module
//! value resolution, no alias analysis.

/// Per-file pipeline and multi-file driver.
pub mod analyzer;
/// Closed tagged-variant AST.
pub mod ast;
/// Control-flow segment bookkeeping.
pub mod cfg;
/// Command line interface.
pub mod cli;
/// Configuration loading.
pub mod config;
/// Report rendering.
pub mod output;
/// tree-sitter front-end.
pub mod parser;
/// Rule infrastructure and the rule set.
pub mod rules;
/// Shared helpers.
pub mod utils;
/// Single-pass AST walker.
pub mod visitor;

pub use analyzer::{analyze_source, AnalysisResult, Analyzer};
pub use config::Config;
pub use rules::Finding;
