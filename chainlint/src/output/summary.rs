//! Report header and summary pills.

use std::io::Write;

use colored::Colorize;

use crate::analyzer::AnalysisResult;

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Middleware Static Analysis Results    ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print summary with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(
    writer: &mut impl Write,
    result: &AnalysisResult,
) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().green())
        } else {
            format!("{}: {}", label, count.to_string().red().bold())
        }
    }

    let problems = result
        .findings
        .iter()
        .filter(|f| f.category == "Problem")
        .count();
    let suggestions = result
        .findings
        .iter()
        .filter(|f| f.category == "Suggestion")
        .count();

    writeln!(
        writer,
        "{}  {}  {}    {} file(s) scanned",
        pill("Problems", problems),
        pill("Suggestions", suggestions),
        pill("Parse errors", result.parse_errors.len()),
        result.files_scanned,
    )?;
    writeln!(writer)?;
    Ok(())
}
