//! Plain-text rendering of the minutes and clipboard hand-off.

use anyhow::{Context, Result};
use arboard::Clipboard;
use std::fmt::Write;

use super::MinutesResult;

/// Render the minutes with the fixed section layout used for export.
pub fn render_plain_text(minutes: &MinutesResult) -> String {
    let mut out = String::new();

    out.push_str("MINUTES OF MEETING\n");
    out.push_str("-----------------\n");
    out.push_str("SUMMARY:\n");
    out.push_str(&minutes.summary);
    out.push('\n');

    out.push_str("\nKEY DISCUSSION POINTS:\n");
    for point in &minutes.key_points {
        let _ = writeln!(out, "- {}", point);
    }

    out.push_str("\nDECISIONS MADE:\n");
    for decision in &minutes.decisions {
        let _ = writeln!(out, "- {}", decision);
    }

    out.push_str("\nACTION ITEMS:\n");
    for item in &minutes.action_items {
        match &item.deadline {
            Some(deadline) => {
                let _ = writeln!(
                    out,
                    "- {} (Owner: {}, Deadline: {})",
                    item.task, item.owner, deadline
                );
            }
            None => {
                let _ = writeln!(out, "- {} (Owner: {})", item.task, item.owner);
            }
        }
    }

    out.push_str("\nNEXT STEPS:\n");
    for step in &minutes.next_steps {
        let _ = writeln!(out, "- {}", step);
    }

    out.trim_end().to_string()
}

/// Copy text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Clipboard backend unavailable")?;
    clipboard
        .set_text(text)
        .context("Failed to write to clipboard")?;
    Ok(())
}
