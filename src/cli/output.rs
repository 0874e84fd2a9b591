// Output formatting utilities

use crate::models::{EmailList, ListSummary, ValidationResult};
use crate::pipeline::{Progress, ProgressSink};
use chrono::Local;
use std::io::{IsTerminal, Write};

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";

/// Rows shown by default when printing results
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    // Try terminal_size crate first (most reliable, works after resize)
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    // Fallback to COLUMNS environment variable (set by most shells)
    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 { // Sanity check
                return width;
            }
        }
    }

    // Default fallback - wide enough for an email, status and reason
    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Pad to `width` before colouring so escape codes don't break alignment
fn status_cell(is_valid: bool, width: usize, use_color: bool) -> String {
    let label = if is_valid { "Valid" } else { "Invalid" };
    let padded = format!("{:<width$}", label, width = width);
    if !use_color {
        return padded;
    }
    let color = if is_valid { ANSI_FG_GREEN } else { ANSI_FG_RED };
    format!("{}{}{}", color, padded, ANSI_RESET)
}

/// Cut `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// Embedded newlines would break table rows
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    use chrono::TimeZone;
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Total / valid / invalid line
pub fn format_summary_counts(summary: &ListSummary) -> String {
    format!(
        "Total: {}  Valid: {}  Invalid: {}",
        summary.total, summary.valid, summary.invalid
    )
}

/// Table of validation results, at most `limit` rows.
///
/// The Name column only appears when `show_name` is set (a name column was
/// mapped). Absent names and reasons print as "-".
pub fn format_results_table(
    results: &[ValidationResult],
    show_name: bool,
    limit: usize,
    use_color: bool,
) -> String {
    if results.is_empty() {
        return "No results.\n".to_string();
    }

    let shown = &results[..results.len().min(limit)];
    let term_width = get_terminal_width();

    let status_width = "Invalid".len();
    let reason_width = shown
        .iter()
        .map(|r| r.reason.map(|x| x.as_str().len()).unwrap_or(1))
        .max()
        .unwrap_or(0)
        .max("Reason".len());
    let fixed = status_width + reason_width + if show_name { 6 } else { 4 };
    let flexible = term_width.saturating_sub(fixed).max(20);

    let email_width = shown
        .iter()
        .map(|r| r.email.chars().count())
        .max()
        .unwrap_or(0)
        .max("Email".len());
    let name_width = if show_name {
        shown
            .iter()
            .map(|r| r.name.as_deref().map(|n| n.chars().count()).unwrap_or(1))
            .max()
            .unwrap_or(0)
            .max("Name".len())
    } else {
        0
    };

    // Give email two thirds of the space when a name column competes for it
    let (email_width, name_width) = if email_width + name_width + if show_name { 2 } else { 0 } > flexible {
        if show_name {
            let email_max = (flexible * 2 / 3).max(10);
            let email_w = email_width.min(email_max);
            (email_w, name_width.min(flexible.saturating_sub(email_w + 2).max(4)))
        } else {
            (email_width.min(flexible), 0)
        }
    } else {
        (email_width, name_width)
    };

    // Build header
    let mut out = String::new();
    let mut header = format!("{:<w$}  ", "Email", w = email_width);
    if show_name {
        header.push_str(&format!("{:<w$}  ", "Name", w = name_width));
    }
    header.push_str(&format!("{:<w$}  {}", "Status", "Reason", w = status_width));
    out.push_str(&bold_if_tty(header.trim_end(), use_color));
    out.push('\n');

    let rule_width = email_width + status_width + reason_width + 4 + if show_name { name_width + 2 } else { 0 };
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    // Build rows
    for result in shown {
        let mut line = format!("{:<w$}  ", truncate(&single_line(&result.email), email_width), w = email_width);
        if show_name {
            let name = result.name.as_deref().map(single_line).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!("{:<w$}  ", truncate(&name, name_width), w = name_width));
        }
        line.push_str(&status_cell(result.is_valid, status_width, use_color));
        line.push_str("  ");
        line.push_str(result.reason.map(|r| r.as_str()).unwrap_or("-"));
        out.push_str(&line);
        out.push('\n');
    }

    // Rows past the limit are only counted
    if results.len() > shown.len() {
        out.push_str(&format!("... and {} more\n", results.len() - shown.len()));
    }

    out
}

/// Table of saved lists
pub fn format_list_table(lists: &[EmailList]) -> String {
    if lists.is_empty() {
        return "No lists found.\n".to_string();
    }

    let name_width = lists
        .iter()
        .map(|l| l.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp("Name".len(), 40);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<nw$} {:>7} {:>7} {:>7}  {}\n",
        "ID", "Name", "Total", "Valid", "Invalid", "Created",
        nw = name_width
    ));
    out.push_str(&"-".repeat(6 + name_width + 7 * 3 + 4 + 2 + 19));
    out.push('\n');

    for list in lists {
        out.push_str(&format!(
            "{:<6} {:<nw$} {:>7} {:>7} {:>7}  {}\n",
            list.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            truncate(&list.name, name_width),
            list.total_emails,
            list.valid_emails,
            list.invalid_emails,
            format_timestamp(list.created_ts),
            nw = name_width
        ));
    }

    out
}

/// Header block for a single list
pub fn format_list_summary(list: &EmailList) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "List {}: {}\n",
        list.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
        list.name
    ));
    out.push_str(&format!("Created: {}\n", format_timestamp(list.created_ts)));
    out.push_str(&format_summary_counts(&list.summary()));
    out.push('\n');
    out
}

/// JSON form of a saved list
pub fn list_to_json(list: &EmailList, include_results: bool) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": list.id,
        "name": list.name,
        "user_id": list.user_id,
        "total_emails": list.total_emails,
        "valid_emails": list.valid_emails,
        "invalid_emails": list.invalid_emails,
        "created_ts": list.created_ts,
    });
    if include_results {
        value["results"] = serde_json::json!(list.results);
    }
    value
}

/// Draws a one-line progress indicator on stderr
pub struct TerminalProgress {
    enabled: bool,
}

impl TerminalProgress {
    /// Enabled only when stderr is a terminal and `quiet` is not set
    pub fn new(quiet: bool) -> Self {
        Self {
            enabled: !quiet && std::io::stderr().is_terminal(),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn publish(&mut self, progress: Progress) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut stderr = std::io::stderr().lock();
        write!(
            stderr,
            "\rValidating... {:>3}% ({}/{})",
            progress.percent(),
            progress.completed,
            progress.total
        )?;
        if progress.is_done() {
            writeln!(stderr)?;
        }
        stderr.flush()?;
        Ok(())
    }
}
