//! Full report rendering.

use std::io::Write;

use colored::Colorize;

use crate::analyzer::AnalysisResult;
use crate::rules::Finding;

use super::summary::{print_header, print_summary_pills};
use super::tables::{print_findings, print_parse_errors};

/// Print the full text report.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_report(writer: &mut impl Write, result: &AnalysisResult) -> std::io::Result<()> {
    print_header(writer)?;

    if result.total_issues() == 0 {
        writeln!(writer, "{}", "✓ All clean! No issues found.".green())?;
        return Ok(());
    }

    let problems: Vec<Finding> = result
        .findings
        .iter()
        .filter(|f| f.category == "Problem")
        .cloned()
        .collect();
    let suggestions: Vec<Finding> = result
        .findings
        .iter()
        .filter(|f| f.category == "Suggestion")
        .cloned()
        .collect();

    print_findings(writer, "Problems", &problems)?;
    print_findings(writer, "Suggestions", &suggestions)?;
    print_parse_errors(writer, &result.parse_errors)?;
    print_summary_pills(writer, result)?;
    Ok(())
}

/// Print the result as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json(writer: &mut impl Write, result: &AnalysisResult) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, result).map_err(std::io::Error::other)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisResult;

    #[test]
    fn empty_result_prints_all_clean() {
        let mut out = Vec::new();
        print_report(&mut out, &AnalysisResult::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("All clean"));
    }

    #[test]
    fn json_output_is_valid() {
        let mut out = Vec::new();
        print_json(&mut out, &AnalysisResult::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["files_scanned"], 0);
        assert!(value["findings"].as_array().is_some());
    }
}
