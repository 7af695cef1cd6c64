//! Parsing front-end: tree-sitter concrete syntax trees lowered into the
//! closed AST in [`crate::ast`].
//!
//! tree-sitter is error-tolerant, so a file with syntax problems still
//! produces a usable (partial) AST; the problems are surfaced as
//! [`SyntaxIssue`] records instead of failing the file.

mod lower;

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::ast::Program;

/// Source language of a file, selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// JavaScript (also covers `.mjs`, `.cjs`, `.jsx`).
    JavaScript,
    /// TypeScript.
    TypeScript,
    /// TypeScript with JSX.
    Tsx,
}

impl Language {
    /// Picks the language for a path from its extension. Returns `None` for
    /// files the toolkit does not analyze.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            _ => None,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// A syntax problem found while parsing; the file is still analyzed with the
/// recoverable parts of its tree.
#[derive(Debug, Clone, Serialize)]
pub struct SyntaxIssue {
    /// Line number (1-indexed).
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

/// Result of parsing one file.
#[derive(Debug)]
pub struct ParsedFile {
    /// Lowered AST.
    pub program: Program,
    /// Syntax problems, empty for a clean parse.
    pub issues: Vec<SyntaxIssue>,
}

/// Maximum syntax issues reported per file; beyond this the tree is usually
/// garbage anyway.
const MAX_SYNTAX_ISSUES: usize = 5;

/// Parses `source` as `language` and lowers it to the closed AST.
///
/// # Errors
///
/// Returns an error only when the grammar cannot be loaded or tree-sitter
/// fails outright (timeout/cancellation); ordinary syntax errors are returned
/// as [`SyntaxIssue`]s inside an `Ok` result.
pub fn parse_source(source: &str, language: Language) -> Result<ParsedFile> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| anyhow!("failed to load grammar: {e}"))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("tree-sitter returned no tree"))?;

    let root = tree.root_node();
    let mut issues = Vec::new();
    if root.has_error() {
        collect_syntax_issues(root, &mut issues);
    }

    let program = lower::lower_program(root, source.as_bytes());
    Ok(ParsedFile { program, issues })
}

fn collect_syntax_issues(node: tree_sitter::Node<'_>, issues: &mut Vec<SyntaxIssue>) {
    if issues.len() >= MAX_SYNTAX_ISSUES {
        return;
    }
    if node.is_error() || node.is_missing() {
        let what = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };
        issues.push(SyntaxIssue {
            line: node.start_position().row + 1,
            message: what,
        });
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_issues(child, issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn language_from_extension() {
        assert_eq!(
            Language::from_path(&PathBuf::from("a/handlers.ts")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("app.mjs")),
            Some(Language::JavaScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("view.tsx")),
            Some(Language::Tsx)
        );
        assert_eq!(Language::from_path(&PathBuf::from("readme.md")), None);
        assert_eq!(Language::from_path(&PathBuf::from("Makefile")), None);
    }

    #[test]
    fn clean_parse_has_no_issues() {
        let parsed = parse_source("const x = 1;\n", Language::JavaScript).unwrap();
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.program.body.len(), 1);
    }

    #[test]
    fn broken_source_reports_issue_but_still_lowers() {
        let parsed = parse_source("const x = ;\nconst y = 2;\n", Language::JavaScript).unwrap();
        assert!(!parsed.issues.is_empty());
        assert!(!parsed.program.body.is_empty());
    }
}
