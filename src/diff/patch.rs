//! Unified-diff parsing and application.
//!
//! Accepts the text produced by [`format_unified_diff`](super::format_unified_diff)
//! (and ordinary `diff -u` output) and replays it against a base text. Context
//! and removed lines are verified, so a patch made against different content
//! is rejected rather than half-applied.

use crate::diff::engine::{split_lines, DiffHunk, DiffLine, FileDiff, Line, LineKind};
use crate::error::{EditError, Result};

/// Label used in errors when a patch carries no `+++` header
const UNNAMED_PATCH: &str = "<patch>";

/// A parsed unified diff for a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPatch {
    /// Target path from the `+++ b/...` header, if present
    pub path: Option<String>,
    pub hunks: Vec<DiffHunk>,
}

/// Parse unified-diff text into hunks
pub fn parse_unified_diff(text: &str) -> Result<ParsedPatch> {
    let lines: Vec<&str> = text.split_terminator('\n').collect();
    let mut path: Option<String> = None;
    let mut hunks = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let label = path.as_deref().unwrap_or(UNNAMED_PATCH);

        if line.starts_with("Binary file ") {
            return Err(EditError::invalid_content(
                label,
                "binary diffs cannot be applied",
            ));
        }

        if let Some(target) = line.strip_prefix("+++ ") {
            let target = target.trim_end();
            path = Some(target.strip_prefix("b/").unwrap_or(target).to_string());
            idx += 1;
            continue;
        }

        if line.starts_with("@@") {
            let (old_start, old_lines, new_start, new_lines) = parse_hunk_header(line)
                .ok_or_else(|| {
                    EditError::invalid_content(label, format!("malformed hunk header '{}'", line))
                })?;
            idx += 1;

            let mut hunk = DiffHunk {
                old_start,
                old_lines,
                new_start,
                new_lines,
                lines: Vec::new(),
            };
            let mut old_seen = 0;
            let mut new_seen = 0;

            while idx < lines.len() {
                let body = lines[idx];
                if body.starts_with('\\') {
                    if let Some(last) = hunk.lines.last_mut() {
                        last.no_newline = true;
                    }
                    idx += 1;
                    continue;
                }
                if old_seen == old_lines && new_seen == new_lines {
                    break;
                }

                let (kind, content) = match body.chars().next() {
                    Some(' ') => (LineKind::Unchanged, &body[1..]),
                    Some('-') => (LineKind::Remove, &body[1..]),
                    Some('+') => (LineKind::Add, &body[1..]),
                    // Some tools strip the space from empty context lines
                    None => (LineKind::Unchanged, ""),
                    Some(_) => {
                        return Err(EditError::invalid_content(
                            label,
                            format!("unexpected line in hunk: '{}'", body),
                        ))
                    }
                };

                let old_line_number = (kind != LineKind::Add).then(|| old_start + old_seen);
                let new_line_number = (kind != LineKind::Remove).then(|| new_start + new_seen);
                if kind != LineKind::Add {
                    old_seen += 1;
                }
                if kind != LineKind::Remove {
                    new_seen += 1;
                }
                hunk.lines.push(DiffLine {
                    kind,
                    content: content.to_string(),
                    old_line_number,
                    new_line_number,
                    no_newline: false,
                });
                idx += 1;
            }

            if old_seen != old_lines || new_seen != new_lines {
                return Err(EditError::invalid_content(
                    label,
                    format!("truncated hunk '{}'", line),
                ));
            }
            hunks.push(hunk);
            continue;
        }

        // File headers and git metadata lines carry nothing to apply
        idx += 1;
    }

    Ok(ParsedPatch { path, hunks })
}

/// Apply unified-diff text to `original`, returning the patched content
pub fn apply_unified_diff(original: &str, patch: &str) -> Result<String> {
    let parsed = parse_unified_diff(patch)?;
    let label = parsed.path.as_deref().unwrap_or(UNNAMED_PATCH);
    apply_hunks(label, original, &parsed.hunks)
}

/// Apply a structural diff to `original`
pub fn apply_diff(original: &str, diff: &FileDiff) -> Result<String> {
    if diff.is_binary {
        return Err(EditError::invalid_content(
            &diff.path,
            "binary diffs cannot be applied",
        ));
    }
    apply_hunks(&diff.path, original, &diff.hunks)
}

fn apply_hunks(path: &str, original: &str, hunks: &[DiffHunk]) -> Result<String> {
    let base = split_lines(Some(original));
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;

    for hunk in hunks {
        let start = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start.checked_sub(1).ok_or_else(|| {
                EditError::invalid_content(path, "hunk starts at line 0 but removes lines")
            })?
        };
        if start < cursor || start > base.len() {
            return Err(EditError::invalid_content(
                path,
                format!("hunk at line {} is out of range or out of order", hunk.old_start),
            ));
        }
        for line in &base[cursor..start] {
            push_line(&mut out, line.text, line.terminated);
        }
        cursor = start;

        for line in &hunk.lines {
            match line.kind {
                LineKind::Add => push_line(&mut out, &line.content, !line.no_newline),
                LineKind::Unchanged | LineKind::Remove => {
                    let expected = Line {
                        text: &line.content,
                        terminated: !line.no_newline,
                    };
                    if base.get(cursor) != Some(&expected) {
                        return Err(EditError::invalid_content(
                            path,
                            format!("patch does not apply at line {}", cursor + 1),
                        ));
                    }
                    if line.kind == LineKind::Unchanged {
                        push_line(&mut out, &line.content, !line.no_newline);
                    }
                    cursor += 1;
                }
            }
        }
    }

    for line in &base[cursor..] {
        push_line(&mut out, line.text, line.terminated);
    }

    Ok(out)
}

fn push_line(out: &mut String, text: &str, terminated: bool) {
    out.push_str(text);
    if terminated {
        out.push('\n');
    }
}

/// Parse `@@ -a[,b] +c[,d] @@` into `(a, b, c, d)`
fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let (old, rest) = rest.split_once(" +")?;
    let (new, _) = rest.split_once(" @@")?;
    let (old_start, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new)?;
    Some((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
