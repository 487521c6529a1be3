use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::diff::align::align;

/// Number of characters sampled for binary detection
pub const BINARY_SAMPLE_CHARS: usize = 8_000;

/// Default lines of unchanged context around each change
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Largest `old_lines × new_lines` product diffed with the exact LCS table
pub const DEFAULT_MAX_LCS_CELLS: usize = 10_000_000;

/// Kind of a single diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Line exists only in the new content
    Add,
    /// Line exists only in the original content
    Remove,
    /// Line is identical on both sides
    Unchanged,
}

/// A single line within a hunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line text without its terminator
    pub content: String,
    /// 1-indexed line number in the original (None for added lines)
    pub old_line_number: Option<usize>,
    /// 1-indexed line number in the new content (None for removed lines)
    pub new_line_number: Option<usize>,
    /// Last line of its side and not terminated by `\n`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_newline: bool,
}

/// A contiguous block of changes plus surrounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Starting line in the original (1-indexed, or the preceding line when `old_lines` is 0)
    pub old_start: usize,
    pub old_lines: usize,
    /// Starting line in the new content (1-indexed, or the preceding line when `new_lines` is 0)
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

/// Structural diff of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<DiffHunk>,
    /// Total added lines across hunks (0 for binary content)
    pub additions: usize,
    /// Total removed lines across hunks (0 for binary content)
    pub deletions: usize,
    pub is_binary: bool,
    pub is_new_file: bool,
    pub is_deleted: bool,
}

impl FileDiff {
    /// Whether the diff contains any line-level change
    pub fn has_changes(&self) -> bool {
        !self.hunks.is_empty()
    }
}

/// Tuning knobs for [`compute_diff_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Unchanged lines kept around each change
    pub context_lines: usize,
    /// Above this many DP cells the unique-line approximation is used
    pub max_lcs_cells: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            max_lcs_cells: DEFAULT_MAX_LCS_CELLS,
        }
    }
}

/// A line as compared by the aligner: text plus whether it was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub terminated: bool,
}

/// Split content into `\n`-terminated lines; a trailing `\n` adds no empty line
pub(crate) fn split_lines(content: Option<&str>) -> Vec<Line<'_>> {
    let Some(content) = content else {
        return Vec::new();
    };
    content
        .split_inclusive('\n')
        .map(|segment| match segment.strip_suffix('\n') {
            Some(text) => Line {
                text,
                terminated: true,
            },
            None => Line {
                text: segment,
                terminated: false,
            },
        })
        .collect()
}

/// Heuristic binary check over the first [`BINARY_SAMPLE_CHARS`] characters.
///
/// Any NUL, or more than 10% control characters other than tab/LF/CR,
/// marks the content as binary.
pub fn looks_binary(content: &str) -> bool {
    let mut sampled = 0usize;
    let mut control = 0usize;

    for ch in content.chars().take(BINARY_SAMPLE_CHARS) {
        sampled += 1;
        if ch == '\0' {
            return true;
        }
        if (ch as u32) < 32 && !matches!(ch, '\t' | '\n' | '\r') {
            control += 1;
        }
    }

    sampled > 0 && control * 10 > sampled
}

/// Compute the diff between two optional texts with default options
pub fn compute_diff(path: &str, original: Option<&str>, modified: Option<&str>) -> FileDiff {
    compute_diff_with(path, original, modified, &DiffOptions::default())
}

/// Compute the diff between two optional texts.
///
/// Absent `original` means the file is new; absent `modified` means it is
/// deleted. Total and deterministic: the same inputs always produce the same
/// hunks and counts.
pub fn compute_diff_with(
    path: &str,
    original: Option<&str>,
    modified: Option<&str>,
    options: &DiffOptions,
) -> FileDiff {
    let is_new_file = original.map_or(true, str::is_empty);
    let is_deleted = modified.is_none();

    let is_binary = original.map_or(false, looks_binary) || modified.map_or(false, looks_binary);
    if is_binary {
        return FileDiff {
            path: path.to_string(),
            hunks: Vec::new(),
            additions: 0,
            deletions: 0,
            is_binary: true,
            is_new_file,
            is_deleted,
        };
    }

    let old_lines = split_lines(original);
    let new_lines = split_lines(modified);
    let anchors = align(&old_lines, &new_lines, options.max_lcs_cells);
    let lines = walk_alignment(&old_lines, &new_lines, &anchors);
    let hunks = build_hunks(lines, options.context_lines);

    let mut additions = 0;
    let mut deletions = 0;
    for line in hunks.iter().flat_map(|h| &h.lines) {
        match line.kind {
            LineKind::Add => additions += 1,
            LineKind::Remove => deletions += 1,
            LineKind::Unchanged => {}
        }
    }

    FileDiff {
        path: path.to_string(),
        hunks,
        additions,
        deletions,
        is_binary: false,
        is_new_file,
        is_deleted,
    }
}

/// A diff line plus how many old/new lines precede it
struct Positioned {
    line: DiffLine,
    old_before: usize,
    new_before: usize,
}

impl Positioned {
    fn is_unchanged(&self) -> bool {
        self.line.kind == LineKind::Unchanged
    }
}

/// Emit the old-only lines of a gap as removes, then its new-only lines as adds
fn emit_gap(
    out: &mut Vec<Positioned>,
    old: &[Line],
    new: &[Line],
    cursor: &mut (usize, usize),
    to: (usize, usize),
) {
    while cursor.0 < to.0 {
        let line = old[cursor.0];
        out.push(Positioned {
            line: DiffLine {
                kind: LineKind::Remove,
                content: line.text.to_string(),
                old_line_number: Some(cursor.0 + 1),
                new_line_number: None,
                no_newline: !line.terminated,
            },
            old_before: cursor.0,
            new_before: cursor.1,
        });
        cursor.0 += 1;
    }
    while cursor.1 < to.1 {
        let line = new[cursor.1];
        out.push(Positioned {
            line: DiffLine {
                kind: LineKind::Add,
                content: line.text.to_string(),
                old_line_number: None,
                new_line_number: Some(cursor.1 + 1),
                no_newline: !line.terminated,
            },
            old_before: cursor.0,
            new_before: cursor.1,
        });
        cursor.1 += 1;
    }
}

/// Walk the alignment, emitting each gap followed by its anchor as unchanged
fn walk_alignment(old: &[Line], new: &[Line], anchors: &[(usize, usize)]) -> Vec<Positioned> {
    let mut out = Vec::with_capacity(old.len().max(new.len()));
    let mut cursor = (0, 0);

    for &(anchor_old, anchor_new) in anchors {
        emit_gap(&mut out, old, new, &mut cursor, (anchor_old, anchor_new));
        let line = old[anchor_old];
        out.push(Positioned {
            line: DiffLine {
                kind: LineKind::Unchanged,
                content: line.text.to_string(),
                old_line_number: Some(anchor_old + 1),
                new_line_number: Some(anchor_new + 1),
                no_newline: !line.terminated,
            },
            old_before: cursor.0,
            new_before: cursor.1,
        });
        cursor = (anchor_old + 1, anchor_new + 1);
    }
    emit_gap(&mut out, old, new, &mut cursor, (old.len(), new.len()));

    out
}

fn push_leading(leading: &mut VecDeque<Positioned>, line: Positioned, context: usize) {
    if context == 0 {
        return;
    }
    if leading.len() == context {
        leading.pop_front();
    }
    leading.push_back(line);
}

/// Group lines into hunks with `context` lines of surrounding context.
///
/// A hunk closes once its trailing unchanged run exceeds `2 * context`,
/// keeping `context` of those lines; the rest can lead the next hunk.
fn build_hunks(lines: Vec<Positioned>, context: usize) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut current: Vec<Positioned> = Vec::new();
    let mut open = false;
    let mut trailing = 0usize;
    let mut leading: VecDeque<Positioned> = VecDeque::with_capacity(context);

    for line in lines {
        if !line.is_unchanged() {
            if !open {
                current.extend(leading.drain(..));
                open = true;
            }
            current.push(line);
            trailing = 0;
            continue;
        }

        if !open {
            push_leading(&mut leading, line, context);
            continue;
        }

        current.push(line);
        trailing += 1;
        if trailing > context * 2 {
            let keep = current.len() - trailing + context;
            let overflow = current.split_off(keep);
            hunks.extend(finish_hunk(std::mem::take(&mut current)));
            open = false;
            trailing = 0;
            for line in overflow {
                push_leading(&mut leading, line, context);
            }
        }
    }

    if open {
        let keep = current.len() - trailing + trailing.min(context);
        current.truncate(keep);
        hunks.extend(finish_hunk(current));
    }

    hunks
}

fn finish_hunk(lines: Vec<Positioned>) -> Option<DiffHunk> {
    if lines.iter().all(Positioned::is_unchanged) {
        return None;
    }
    let first = lines.first()?;
    let old_lines = lines.iter().filter(|l| l.line.kind != LineKind::Add).count();
    let new_lines = lines.iter().filter(|l| l.line.kind != LineKind::Remove).count();
    let old_start = if old_lines == 0 {
        first.old_before
    } else {
        first.old_before + 1
    };
    let new_start = if new_lines == 0 {
        first.new_before
    } else {
        first.new_before + 1
    };

    Some(DiffHunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
        lines: lines.into_iter().map(|p| p.line).collect(),
    })
}
