//! Shared utility functions and constants

use std::path::{Component, Path};

use sha2::{Digest, Sha256};

use crate::error::{EditError, Result};

/// Number of bytes to use from SHA256 hash for snapshot content hashing
pub const CONTENT_HASH_BYTES: usize = 16;

/// Length of description preview in plan output
pub const DESCRIPTION_PREVIEW_LEN: usize = 60;

/// Short edit ID length
pub const SHORT_ID_LEN: usize = 8;

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// First characters of an edit ID, for display
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Normalize a workspace-relative path.
///
/// Separators are unified to `/`, `.` segments dropped and `..` segments
/// resolved. Absolute paths and paths climbing above the root are rejected.
pub fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(EditError::invalid_operation(path, "empty path"));
    }

    let as_path = Path::new(trimmed);
    if trimmed.starts_with('/')
        || trimmed.starts_with('\\')
        || as_path.is_absolute()
        || as_path
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(EditError::PathEscape(path.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(EditError::PathEscape(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(EditError::invalid_operation(
            path,
            "path resolves to the workspace root",
        ));
    }

    Ok(segments.join("/"))
}

/// Parent directory portion of a normalized path ("" for top-level files)
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Compute truncated SHA-256 hex hash of content
pub fn compute_hash(content: &str) -> String {
    compute_hash_bytes(content.as_bytes())
}

pub fn compute_hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(&result[..CONTENT_HASH_BYTES])
}

/// Hex encoding utilities
pub mod hex {
    /// Encode bytes as hex string
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
