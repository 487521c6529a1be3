mod align;
pub mod engine;
pub mod patch;
pub mod render;

pub use engine::{
    compute_diff, compute_diff_with, looks_binary, DiffHunk, DiffLine, DiffOptions, FileDiff,
    LineKind,
};
pub use patch::{apply_diff, apply_unified_diff, parse_unified_diff, ParsedPatch};
pub use render::{format_unified_diff, hunk_header, NO_NEWLINE_MARKER};
