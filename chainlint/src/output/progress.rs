//! Scan progress feedback.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create and return a spinner for analysis (file count is not known until
/// the walk completes).
///
/// In test mode, returns a hidden progress bar to avoid polluting test
/// output.
#[must_use]
pub fn create_spinner() -> ProgressBar {
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("chainlint analyzing your code…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
