//! Terminal UI helpers for consistent colored output.

use std::future::Future;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Print a success message with green checkmark.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print an info message with blue info icon.
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning with a yellow exclamation mark.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an error message with red X.
fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a hint/suggestion (dimmed, indented).
fn hint(msg: &str) {
    eprintln!("  {} {}", "→".dimmed(), msg.dimmed());
}

/// Format a value as bold (for IDs, links, etc.).
pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Formats a countdown like `4m 05s`.
pub fn remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    match (seconds / 3600, seconds % 3600 / 60, seconds % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, _) => format!("{h}h {m:02}m"),
    }
}

/// Run an async operation with a spinner showing the given message.
/// Returns the result of the operation.
pub async fn spin<T, F: Future<Output = T>>(msg: &str, fut: F) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.dim} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = fut.await;

    spinner.finish_and_clear();
    result
}

/// Display an error with contextual hints based on the error message.
pub fn print_error(err: &anyhow::Error) {
    let msg = err.to_string();
    error(&msg);

    if let Some(text) = hint_for(&msg) {
        hint(text);
    }
}

/// Contextual hint for an error message (more specific checks first).
fn hint_for(msg: &str) -> Option<&'static str> {
    if msg.contains("not found or has been deleted") {
        Some("It may have expired, been burned after reading, or been deleted.")
    } else if msg.contains("already been viewed from your IP") {
        Some("This content can only be opened once per IP address.")
    } else if msg.contains("Too many requests") {
        Some("Wait a minute and try again.")
    } else if msg.contains("already exists") {
        Some("Pass -o <PATH> to save it somewhere else.")
    } else if msg.contains("Only image files") {
        Some("Supported formats: JPEG, PNG, GIF, WebP.")
    } else if msg.contains("File not found") {
        Some("Only file shares can be downloaded, and only while they exist.")
    } else if msg.contains("connection")
        || msg.contains("Connection")
        || msg.contains("dns")
        || msg.contains("DNS")
        || msg.contains("timeout")
        || msg.contains("Timeout")
        || msg.contains("error sending request")
    {
        Some("Is the server running? Point VANISH_API_URL at it.")
    } else {
        None
    }
}
