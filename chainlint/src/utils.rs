//! Small shared helpers.

use rustc_hash::FxHashSet;

/// Inline suppression token: findings anchored on a line carrying this
/// comment are dropped.
pub const SUPPRESSION_TOKEN: &str = "chainlint: ignore";

/// Detects lines with a `// chainlint: ignore` comment.
///
/// Returns a set of line numbers (1-indexed) whose findings should be
/// dropped. This allows users to suppress false positives or intentionally
/// accepted violations at specific lines.
#[must_use]
pub fn suppressed_lines(source: &str) -> FxHashSet<usize> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(SUPPRESSION_TOKEN))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
#[must_use]
pub fn normalize_display_path(path: &std::path::Path) -> String {
    let s = path.to_string_lossy();
    let normalized = s.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn suppression_lines_are_collected() {
        let source = "a();\nb(); // chainlint: ignore\nc();\n// chainlint: ignore\n";
        let lines = suppressed_lines(source);
        assert!(lines.contains(&2));
        assert!(lines.contains(&4));
        assert!(!lines.contains(&1));
        assert!(!lines.contains(&3));
    }

    #[test]
    fn display_paths_are_normalized() {
        assert_eq!(
            normalize_display_path(Path::new("./src/app.ts")),
            "src/app.ts"
        );
        assert_eq!(
            normalize_display_path(Path::new(".\\routes\\users.js")),
            "routes/users.js"
        );
    }
}
