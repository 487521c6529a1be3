use std::fmt::Write;

use crate::diff::engine::{DiffHunk, DiffLine, FileDiff, LineKind};

/// Marker git emits after a line lacking its trailing newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Render a diff as unified-diff text
pub fn format_unified_diff(diff: &FileDiff) -> String {
    if diff.is_binary {
        return format!("Binary file {} differs\n", diff.path);
    }

    let mut out = String::new();
    out.push_str(&format!("--- a/{}\n", diff.path));
    out.push_str(&format!("+++ b/{}\n", diff.path));

    for hunk in &diff.hunks {
        out.push_str(&hunk_header(hunk));
        out.push('\n');
        for line in &hunk.lines {
            push_line(&mut out, line);
        }
    }

    out
}

/// `@@ -old_start,old_lines +new_start,new_lines @@`
pub fn hunk_header(hunk: &DiffHunk) -> String {
    format!(
        "@@ -{},{} +{},{} @@",
        hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines
    )
}

/// Diff prefix character for a line kind
pub fn line_prefix(kind: LineKind) -> char {
    match kind {
        LineKind::Add => '+',
        LineKind::Remove => '-',
        LineKind::Unchanged => ' ',
    }
}

fn push_line(out: &mut String, line: &DiffLine) {
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}{}", line_prefix(line.kind), line.content);
    if line.no_newline {
        out.push_str(NO_NEWLINE_MARKER);
        out.push('\n');
    }
}
