//! Status messages for CLI commands
//!
//! Trace output goes to stdout; these helpers keep the CLI's own status
//! lines on stderr so replayed traces stay pipeable.

use colored::Colorize;

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}
