pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod utils;
pub mod workspace;

pub use config::{LedgerConfig, ShadowConfig};
pub use diff::{
    apply_unified_diff, compute_diff, format_unified_diff, DiffHunk, DiffLine, DiffOptions,
    FileDiff, LineKind,
};
pub use error::{EditError, Result};
pub use workspace::{
    ChatScope, CommitResult, EditSummary, FileGateway, LedgerEvent, OperationType, PendingEdit,
    ShadowWorkspace, WorkspaceFs,
};
