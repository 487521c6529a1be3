//! The shadow workspace: staged edits, snapshots and change events

pub mod edit;
pub mod events;
pub mod gateway;
pub mod ledger;

pub use edit::{
    ChatScope, CommitResult, EditStatus, EditSummary, FailedPath, FileSnapshot, OperationType,
    PendingEdit,
};
pub use events::{EventBus, LedgerEvent, SubscriptionId};
pub use gateway::{FileGateway, FileStat, WorkspaceFs};
pub use ledger::ShadowWorkspace;
