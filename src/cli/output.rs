use clap::ValueEnum;
use colored::Colorize;

use crate::diff::{hunk_header, FileDiff, LineKind, NO_NEWLINE_MARKER};
use crate::utils::{short_id, truncate, DESCRIPTION_PREVIEW_LEN};
use crate::workspace::{CommitResult, EditSummary, PendingEdit};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output with colors
    #[default]
    Pretty,
    /// JSON output for machine consumption
    Json,
}

/// Format a file diff for display
pub fn format_diff(diff: &FileDiff, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => format_diff_pretty(diff),
        OutputFormat::Json => {
            serde_json::to_string_pretty(diff).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

fn format_diff_pretty(diff: &FileDiff) -> String {
    let mut output = String::new();

    if diff.is_binary {
        output.push_str(&format!("{}\n", format!("Binary file {} differs", diff.path).yellow()));
        return output;
    }

    let old_label = if diff.is_new_file {
        "/dev/null".to_string()
    } else {
        format!("a/{}", diff.path)
    };
    let new_label = if diff.is_deleted {
        "/dev/null".to_string()
    } else {
        format!("b/{}", diff.path)
    };
    output.push_str(&format!("{}\n", format!("--- {}", old_label).bold()));
    output.push_str(&format!("{}\n", format!("+++ {}", new_label).bold()));

    for hunk in &diff.hunks {
        output.push_str(&format!("{}\n", hunk_header(hunk).cyan()));
        for line in &hunk.lines {
            let text = match line.kind {
                LineKind::Add => format!("+{}", line.content).green().to_string(),
                LineKind::Remove => format!("-{}", line.content).red().to_string(),
                LineKind::Unchanged => format!(" {}", line.content),
            };
            output.push_str(&text);
            output.push('\n');
            if line.no_newline {
                output.push_str(&format!("{}\n", NO_NEWLINE_MARKER.dimmed()));
            }
        }
    }

    output
}

/// One-line description of a staged edit
pub fn format_edit_line(edit: &PendingEdit) -> String {
    let target = match &edit.original_path {
        Some(from) => format!("{} -> {}", from, edit.path),
        None => edit.path.clone(),
    };
    let mut line = format!(
        "{} {:<7} {}",
        short_id(&edit.id).yellow(),
        edit.operation.to_string().bold(),
        target
    );
    if let Some(description) = &edit.description {
        line.push_str(&format!(
            "  {}",
            truncate(description, DESCRIPTION_PREVIEW_LEN).dimmed()
        ));
    }
    line
}

/// Totals line for a set of staged edits
pub fn format_summary(summary: &EditSummary) -> String {
    let mut kinds = Vec::new();
    for (count, label) in [
        (summary.new_files, "new"),
        (summary.modified_files, "modified"),
        (summary.deleted_files, "deleted"),
        (summary.renamed_files, "renamed"),
    ] {
        if count > 0 {
            kinds.push(format!("{} {}", count, label));
        }
    }

    let mut output = format!(
        "{} file(s) changed, {} {}",
        summary.total_files,
        format!("+{}", summary.additions).green(),
        format!("-{}", summary.deletions).red()
    );
    if !kinds.is_empty() {
        output.push_str(&format!(" ({})", kinds.join(", ")));
    }
    output
}

pub fn format_commit_result(result: &CommitResult) -> String {
    let mut output = String::new();
    let status = if result.success {
        "Committed:".green().bold()
    } else {
        "Partially committed:".yellow().bold()
    };
    output.push_str(&format!("{} {}\n", status, result.summary));

    for path in &result.committed_paths {
        output.push_str(&format!("  {} {}\n", "✓".green(), path));
    }
    for failed in &result.failed_paths {
        output.push_str(&format!(
            "  {} {} {}\n",
            "✗".red(),
            failed.path,
            format!("({})", failed.error).dimmed()
        ));
    }
    output
}
