//! Table rendering for findings and parse errors.

use std::io::Write;

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::analyzer::ParseErrorRecord;
use crate::rules::Finding;
use crate::utils::normalize_display_path;

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);

    if cfg!(test) {
        table.set_width(120);
    }
    table
}

fn get_severity_color(severity: &str) -> Color {
    match severity.to_uppercase().as_str() {
        "HIGH" => Color::Red,
        "MEDIUM" => Color::Yellow,
        "LOW" => Color::Blue,
        _ => Color::White,
    }
}

/// Print a list of findings under `title`.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_findings(
    writer: &mut impl Write,
    title: &str,
    findings: &[Finding],
) -> std::io::Result<()> {
    if findings.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", title.bold().underline())?;
    let mut table = create_table(vec!["Rule", "Message", "Location", "Severity"]);

    for finding in findings {
        let location = format!("{}:{}", normalize_display_path(&finding.file), finding.line);
        let severity_color = get_severity_color(&finding.severity);

        table.add_row(vec![
            Cell::new(&finding.rule_name).add_attribute(Attribute::Dim),
            Cell::new(&finding.message).add_attribute(Attribute::Bold),
            Cell::new(location),
            Cell::new(&finding.severity).fg(severity_color),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print files that failed to read or parse.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_parse_errors(
    writer: &mut impl Write,
    errors: &[ParseErrorRecord],
) -> std::io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Parse Errors".bold().underline())?;
    let mut table = create_table(vec!["File", "Line", "Message"]);
    for error in errors {
        table.add_row(vec![
            Cell::new(normalize_display_path(&error.file)),
            Cell::new(error.line),
            Cell::new(&error.message).fg(Color::Red),
        ]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}
