use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::{compute_diff_with, DiffOptions, FileDiff};

/// Kind of file operation a staged edit performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Modify,
    Delete,
    /// Rename within the same directory
    Rename,
    /// Rename into a different directory
    Move,
}

impl OperationType {
    pub fn is_rename(&self) -> bool {
        matches!(self, Self::Rename | Self::Move)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Modify => write!(f, "modify"),
            Self::Delete => write!(f, "delete"),
            Self::Rename => write!(f, "rename"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// Lifecycle of a staged edit; `Accepted` and `Rejected` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One staged change to a single path
#[derive(Debug, Clone, Serialize)]
pub struct PendingEdit {
    /// Unique ID for this edit (UUID v4)
    pub id: String,
    /// Normalized workspace-relative path; the ledger key
    pub path: String,
    pub operation: OperationType,
    /// Content before the edit (None if the file did not exist)
    pub original_content: Option<String>,
    /// Content after the edit (None for deletes)
    pub new_content: Option<String>,
    /// Pre-rename path for renames and moves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    /// Conversation that staged this edit
    pub chat_id: Option<String>,
    pub status: EditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The filesystem already reflects this edit (recorded via `track_*`)
    pub applied: bool,
    pub created_at: DateTime<Utc>,
    /// Insertion order within the ledger, used for eviction
    #[serde(skip)]
    pub(crate) sequence: u64,
    #[serde(skip)]
    diff: OnceLock<FileDiff>,
}

impl PendingEdit {
    pub(crate) fn new(
        path: String,
        operation: OperationType,
        original_content: Option<String>,
        new_content: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path,
            operation,
            original_content,
            new_content,
            original_path: None,
            chat_id: None,
            status: EditStatus::Pending,
            description: None,
            applied: false,
            created_at: Utc::now(),
            sequence: 0,
            diff: OnceLock::new(),
        }
    }

    pub(crate) fn with_original_path(mut self, original_path: String) -> Self {
        self.original_path = Some(original_path);
        self
    }

    pub(crate) fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }

    pub(crate) fn mark_applied(mut self) -> Self {
        self.applied = true;
        self
    }

    /// The diff of this edit, computed on first access and cached
    pub fn diff(&self, options: &DiffOptions) -> &FileDiff {
        self.diff.get_or_init(|| {
            compute_diff_with(
                &self.path,
                self.original_content.as_deref(),
                self.new_content.as_deref(),
                options,
            )
        })
    }

    /// The diff if it has already been computed
    pub fn cached_diff(&self) -> Option<&FileDiff> {
        self.diff.get()
    }
}

/// Point-in-time read of a file, independent of any staged edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSnapshot {
    pub path: String,
    pub content: Option<String>,
    pub exists: bool,
    pub mtime: Option<DateTime<Utc>>,
    pub size: u64,
    /// Truncated SHA-256 of the raw bytes, for drift detection
    pub content_hash: Option<String>,
    /// Content was not valid UTF-8; `content` is a lossy decoding
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub lossy: bool,
    /// Why the file could not be read; such a snapshot cannot be restored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
    pub taken_at: DateTime<Utc>,
}

impl FileSnapshot {
    pub(crate) fn missing(path: &str) -> Self {
        Self {
            path: path.to_string(),
            content: None,
            exists: false,
            mtime: None,
            size: 0,
            content_hash: None,
            lossy: false,
            read_error: None,
            taken_at: Utc::now(),
        }
    }

    pub(crate) fn unreadable(path: &str, error: String) -> Self {
        Self {
            read_error: Some(error),
            ..Self::missing(path)
        }
    }

    /// Whether writing `content` back reproduces the file exactly
    pub fn is_restorable(&self) -> bool {
        self.read_error.is_none() && !self.lossy
    }
}

/// Which edits a query or batch applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatScope {
    /// Every edit regardless of chat
    All,
    /// Edits staged while no chat was current
    Unscoped,
    /// Edits staged by one chat
    Chat(String),
}

impl ChatScope {
    /// Scope of the given current chat: that chat, or unscoped edits when none
    pub fn current(chat_id: Option<&str>) -> Self {
        match chat_id {
            Some(id) => Self::Chat(id.to_string()),
            None => Self::Unscoped,
        }
    }

    pub fn matches(&self, chat_id: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Unscoped => chat_id.is_none(),
            Self::Chat(id) => chat_id == Some(id.as_str()),
        }
    }
}

/// Aggregate of staged changes over a scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditSummary {
    pub total_files: usize,
    pub additions: usize,
    pub deletions: usize,
    pub new_files: usize,
    pub modified_files: usize,
    pub deleted_files: usize,
    pub renamed_files: usize,
}

impl EditSummary {
    pub(crate) fn add(&mut self, operation: OperationType, diff: &FileDiff) {
        self.total_files += 1;
        self.additions += diff.additions;
        self.deletions += diff.deletions;
        match operation {
            OperationType::Create => self.new_files += 1,
            OperationType::Modify => self.modified_files += 1,
            OperationType::Delete => self.deleted_files += 1,
            OperationType::Rename | OperationType::Move => self.renamed_files += 1,
        }
    }
}

/// A path whose commit failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPath {
    pub path: String,
    pub error: String,
}

/// Outcome of committing one or more edits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    /// True only when every targeted edit committed
    pub success: bool,
    pub committed_paths: Vec<String>,
    pub failed_paths: Vec<FailedPath>,
    pub summary: String,
}
