//! Per-file analysis pipeline and the multi-file driver.
//!
//! One file is analyzed completely independently of any other: parse, walk
//! once with a fresh rule set, filter suppressed lines. The driver collects
//! analyzable files (gitignore-aware, default folder exclusions) and fans the
//! per-file work out with rayon; state is never shared between files, so the
//! parallelism needs no coordination.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::Config;
use crate::parser::{parse_source, Language};
use crate::rules::{registry, Context, Finding};
use crate::utils::suppressed_lines;
use crate::visitor::Walker;

/// Folders skipped by default during the file walk.
pub const DEFAULT_EXCLUDE_FOLDERS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "out",
    "coverage",
    ".git",
    ".next",
    "vendor",
];

#[derive(Debug, Clone, Serialize)]
/// A file that could not be read or parsed cleanly.
pub struct ParseErrorRecord {
    /// File the problem occurred in.
    pub file: PathBuf,
    /// Line number (1-indexed; 1 when the whole file failed).
    pub line: usize,
    /// Human-readable description.
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
/// Aggregate result of one analysis run.
pub struct AnalysisResult {
    /// All findings, in file order then detection order.
    pub findings: Vec<Finding>,
    /// Files that failed to read or had syntax problems.
    pub parse_errors: Vec<ParseErrorRecord>,
    /// Number of files analyzed.
    pub files_scanned: usize,
}

impl AnalysisResult {
    /// Total number of reported items.
    #[must_use]
    pub fn total_issues(&self) -> usize {
        self.findings.len() + self.parse_errors.len()
    }
}

#[derive(Debug, Default)]
/// Findings and parse errors for one file.
pub struct FileReport {
    /// Findings in detection order.
    pub findings: Vec<Finding>,
    /// Read/syntax problems.
    pub parse_errors: Vec<ParseErrorRecord>,
}

/// Analyzes one file's source text with the rules enabled by `config`.
///
/// Files with an extension the toolkit does not handle produce an empty
/// report. Syntax problems are data, not errors: the recoverable part of the
/// tree is still analyzed.
#[must_use]
pub fn analyze_source(source: &str, path: &Path, config: &Config) -> FileReport {
    let Some(language) = Language::from_path(path) else {
        return FileReport::default();
    };
    let mut report = FileReport::default();
    let parsed = match parse_source(source, language) {
        Ok(parsed) => parsed,
        Err(err) => {
            report.parse_errors.push(ParseErrorRecord {
                file: path.to_path_buf(),
                line: 1,
                message: err.to_string(),
            });
            return report;
        }
    };
    for issue in &parsed.issues {
        report.parse_errors.push(ParseErrorRecord {
            file: path.to_path_buf(),
            line: issue.line,
            message: issue.message.clone(),
        });
    }

    let context = Context {
        filename: path.to_path_buf(),
        config: config.clone(),
    };
    let rules = registry::build_rules(config);
    let findings = Walker::new(rules, &context).run(&parsed.program);

    let suppressed = suppressed_lines(source);
    report.findings = findings
        .into_iter()
        .filter(|finding| !suppressed.contains(&finding.line))
        .collect();
    report
}

/// Multi-file analysis driver.
pub struct Analyzer {
    config: Config,
    exclude_folders: FxHashSet<String>,
    per_file_ignores: Vec<(GlobMatcher, Vec<String>)>,
}

impl Analyzer {
    /// Builds a driver from `config`, resolving folder exclusions and
    /// per-file ignore globs once up front.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut exclude_folders: FxHashSet<String> = DEFAULT_EXCLUDE_FOLDERS
            .iter()
            .map(|f| (*f).to_owned())
            .collect();
        if let Some(extra) = &config.chainlint.exclude_folders {
            exclude_folders.extend(extra.iter().cloned());
        }
        if let Some(include) = &config.chainlint.include_folders {
            for folder in include {
                exclude_folders.remove(folder);
            }
        }
        let per_file_ignores = config
            .chainlint
            .per_file_ignores
            .iter()
            .flatten()
            .filter_map(|(pattern, rules)| {
                Glob::new(pattern)
                    .ok()
                    .map(|glob| (glob.compile_matcher(), rules.clone()))
            })
            .collect();
        Self {
            config,
            exclude_folders,
            per_file_ignores,
        }
    }

    /// The configuration this driver runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `finding` is switched off for `path` by a per-file ignore.
    fn is_ignored_for_path(&self, path: &Path, finding: &Finding) -> bool {
        let display = crate::utils::normalize_display_path(path);
        self.per_file_ignores.iter().any(|(matcher, rules)| {
            matcher.is_match(&display)
                && rules.iter().any(|rule| {
                    rule.eq_ignore_ascii_case(&finding.rule_id)
                        || rule.eq_ignore_ascii_case(&finding.rule_name)
                })
        })
    }

    /// Collects analyzable files under `paths`, gitignore-aware, skipping
    /// excluded folders, sorted for deterministic output.
    #[must_use]
    pub fn collect_files(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_file() {
                if Language::from_path(path).is_some() {
                    files.push(path.clone());
                }
                continue;
            }
            let exclude = self.exclude_folders.clone();
            let walker = WalkBuilder::new(path)
                .filter_entry(move |entry| {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    if !is_dir {
                        return true;
                    }
                    let name = entry.file_name().to_string_lossy();
                    !exclude.contains(name.as_ref())
                })
                .build();
            for entry in walker.flatten() {
                if entry.file_type().is_some_and(|t| t.is_file()) {
                    let candidate = entry.into_path();
                    if Language::from_path(&candidate).is_some() {
                        files.push(candidate);
                    }
                }
            }
        }
        files.sort();
        files.dedup();
        files
    }

    /// Analyzes every file under `paths` and aggregates the reports in file
    /// order.
    #[must_use]
    pub fn analyze_paths(&self, paths: &[PathBuf]) -> AnalysisResult {
        let files = self.collect_files(paths);
        let reports: Vec<FileReport> = files
            .par_iter()
            .map(|file| self.analyze_file(file))
            .collect();

        let mut result = AnalysisResult {
            files_scanned: files.len(),
            ..AnalysisResult::default()
        };
        for report in reports {
            result.findings.extend(report.findings);
            result.parse_errors.extend(report.parse_errors);
        }
        result
    }

    fn analyze_file(&self, path: &Path) -> FileReport {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                return FileReport {
                    findings: Vec::new(),
                    parse_errors: vec![ParseErrorRecord {
                        file: path.to_path_buf(),
                        line: 1,
                        message: format!("could not read file: {err}"),
                    }],
                }
            }
        };
        let mut report = analyze_source(&source, path, &self.config);
        report
            .findings
            .retain(|finding| !self.is_ignored_for_path(path, finding));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    const DOUBLE_NEXT: &str = "const mw = async (c, next) => {
    await next();
    await next();
};
";

    #[test]
    fn analyze_source_reports_for_js_files() {
        let report = analyze_source(DOUBLE_NEXT, Path::new("mw.js"), &Config::default());
        assert_eq!(report.findings.len(), 1);
        assert!(report.parse_errors.is_empty());
    }

    #[test]
    fn unknown_extensions_produce_empty_reports() {
        let report = analyze_source(DOUBLE_NEXT, Path::new("notes.txt"), &Config::default());
        assert!(report.findings.is_empty());
        assert!(report.parse_errors.is_empty());
    }

    #[test]
    fn suppression_comment_drops_the_finding() {
        let source = "const mw = async (c, next) => {
    await next();
    await next(); // chainlint: ignore
};
";
        let report = analyze_source(source, Path::new("mw.js"), &Config::default());
        assert!(report.findings.is_empty());
    }

    #[test]
    fn per_file_ignores_scope_rules_to_globs() {
        let mut per_file = FxHashMap::default();
        per_file.insert("fixtures/**".to_owned(), vec!["no-multiple-next".to_owned()]);
        let mut config = Config::default();
        config.chainlint.per_file_ignores = Some(per_file);
        let analyzer = Analyzer::new(config);

        let mut report = analyze_source(
            DOUBLE_NEXT,
            Path::new("fixtures/mw.js"),
            analyzer.config(),
        );
        report
            .findings
            .retain(|f| !analyzer.is_ignored_for_path(Path::new("fixtures/mw.js"), f));
        assert!(report.findings.is_empty());

        let mut report = analyze_source(DOUBLE_NEXT, Path::new("src/mw.js"), analyzer.config());
        report
            .findings
            .retain(|f| !analyzer.is_ignored_for_path(Path::new("src/mw.js"), f));
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn driver_walks_directories_and_skips_default_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let vendored = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&vendored).unwrap();
        fs::write(src.join("mw.js"), DOUBLE_NEXT).unwrap();
        fs::write(vendored.join("mw.js"), DOUBLE_NEXT).unwrap();
        fs::write(dir.path().join("README.md"), "# nope\n").unwrap();

        let analyzer = Analyzer::new(Config::default());
        let result = analyzer.analyze_paths(&[dir.path().to_path_buf()]);
        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn unreadable_files_surface_as_parse_errors() {
        let analyzer = Analyzer::new(Config::default());
        let report = analyzer.analyze_file(Path::new("definitely/not/here.js"));
        assert_eq!(report.parse_errors.len(), 1);
        assert!(report.parse_errors[0].message.contains("could not read"));
    }

    #[test]
    fn results_are_deterministic_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), DOUBLE_NEXT).unwrap();
        fs::write(dir.path().join("b.js"), DOUBLE_NEXT).unwrap();
        let analyzer = Analyzer::new(Config::default());
        let first: Vec<(PathBuf, usize)> = analyzer
            .analyze_paths(&[dir.path().to_path_buf()])
            .findings
            .iter()
            .map(|f| (f.file.clone(), f.line))
            .collect();
        let second: Vec<(PathBuf, usize)> = analyzer
            .analyze_paths(&[dir.path().to_path_buf()])
            .findings
            .iter()
            .map(|f| (f.file.clone(), f.line))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}