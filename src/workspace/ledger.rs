use std::collections::HashMap;
use std::io;

use tracing::{debug, info, warn};

use crate::config::ShadowConfig;
use crate::diff::{apply_unified_diff, DiffOptions, FileDiff};
use crate::error::{EditError, Result};
use crate::utils::{compute_hash_bytes, normalize_path, parent_dir};
use crate::workspace::edit::{
    ChatScope, CommitResult, EditStatus, EditSummary, FailedPath, FileSnapshot, OperationType,
    PendingEdit,
};
use crate::workspace::events::{EventBus, LedgerEvent, SubscriptionId};
use crate::workspace::gateway::FileGateway;

/// Staging area for speculative file edits.
///
/// Holds at most one pending edit per path plus a cache of file snapshots.
/// Edits are previewed as diffs and later committed to, or undone from, the
/// workspace through a [`FileGateway`]. State is volatile and owned by a
/// single writer; wrap the ledger in a `Mutex` to share it between threads.
#[derive(Debug)]
pub struct ShadowWorkspace<G: FileGateway> {
    gateway: G,
    pending_by_path: HashMap<String, PendingEdit>,
    snapshots_by_path: HashMap<String, FileSnapshot>,
    max_pending_edits: usize,
    eager_diff: bool,
    diff_options: DiffOptions,
    current_chat_id: Option<String>,
    next_sequence: u64,
    events: EventBus,
}

impl<G: FileGateway> ShadowWorkspace<G> {
    /// Create a ledger with default settings
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, &ShadowConfig::default())
    }

    pub fn with_config(gateway: G, config: &ShadowConfig) -> Self {
        Self {
            gateway,
            pending_by_path: HashMap::new(),
            snapshots_by_path: HashMap::new(),
            max_pending_edits: config.ledger.max_pending_edits.max(1),
            eager_diff: config.ledger.eager_diff,
            diff_options: config.diff,
            current_chat_id: None,
            next_sequence: 0,
            events: EventBus::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn diff_options(&self) -> &DiffOptions {
        &self.diff_options
    }

    pub fn max_pending_edits(&self) -> usize {
        self.max_pending_edits
    }

    /// Change the capacity, evicting the oldest edits if already over it
    pub fn set_max_pending_edits(&mut self, max: usize) {
        self.max_pending_edits = max.max(1);
        while self.pending_by_path.len() > self.max_pending_edits {
            self.evict_oldest();
        }
    }

    // ---- Chat scoping ----

    /// Tag applied to edits created from now on; existing edits keep theirs
    pub fn set_current_chat_id(&mut self, chat_id: Option<String>) {
        self.current_chat_id = chat_id;
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.current_chat_id.as_deref()
    }

    // ---- Events ----

    pub fn on_event<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&LedgerEvent) + Send + 'static,
    {
        self.events.subscribe(subscriber)
    }

    pub fn off_event(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ---- Propose ----

    /// Stage writing `content` to `path` (a modify if the file already exists)
    pub fn propose_create(
        &mut self,
        path: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        self.propose_write(path, content, description)
    }

    /// Stage replacing the content of `path` (a create if the file is missing)
    pub fn propose_modify(
        &mut self,
        path: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        self.propose_write(path, content, description)
    }

    /// Stage deleting `path`; fails with `NotFound` if it does not exist
    pub fn propose_delete(&mut self, path: &str, description: Option<&str>) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let original = self
            .current_content(&path)?
            .ok_or_else(|| EditError::NotFound(path.clone()))?;

        let edit = PendingEdit::new(path, OperationType::Delete, Some(original), None)
            .with_description(description);
        Ok(self.stage(edit))
    }

    /// Stage renaming `from` to `to`, keyed under the destination path.
    ///
    /// A destination in another directory is recorded as a move. An existing
    /// destination is refused, since neither commit nor undo could keep it.
    pub fn propose_rename(
        &mut self,
        from: &str,
        to: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;
        if from == to {
            return Err(EditError::invalid_operation(
                &to,
                "source and destination are the same path",
            ));
        }
        match self.gateway.stat(&to) {
            Ok(_) => {
                return Err(EditError::invalid_operation(
                    &to,
                    "destination already exists",
                ))
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let content = self
            .current_content(&from)?
            .ok_or_else(|| EditError::NotFound(from.clone()))?;
        let operation = if parent_dir(&from) == parent_dir(&to) {
            OperationType::Rename
        } else {
            OperationType::Move
        };

        let edit = PendingEdit::new(to, operation, Some(content.clone()), Some(content))
            .with_original_path(from)
            .with_description(description);
        Ok(self.stage(edit))
    }

    /// Apply a unified diff to the effective content of `path` and stage the result
    pub fn propose_patch(
        &mut self,
        path: &str,
        patch: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let base = self.get_effective_content(&path).unwrap_or_default();
        let patched = apply_unified_diff(&base, patch)?;
        self.propose_write(&path, &patched, description)
    }

    fn propose_write(
        &mut self,
        path: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let original = self.current_content(&path)?;
        let operation = if original.is_some() {
            OperationType::Modify
        } else {
            OperationType::Create
        };

        let edit = PendingEdit::new(path, operation, original, Some(content.to_string()))
            .with_description(description);
        Ok(self.stage(edit))
    }

    // ---- Track (filesystem already written) ----

    /// Record an undoable create the caller has already written
    pub fn track_create(
        &mut self,
        path: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let edit = PendingEdit::new(path, OperationType::Create, None, Some(content.to_string()))
            .with_description(description)
            .mark_applied();
        Ok(self.stage(edit))
    }

    /// Record an undoable modify the caller has already written
    pub fn track_modify(
        &mut self,
        path: &str,
        original: Option<&str>,
        content: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let edit = PendingEdit::new(
            path,
            OperationType::Modify,
            original.map(str::to_string),
            Some(content.to_string()),
        )
        .with_description(description)
        .mark_applied();
        Ok(self.stage(edit))
    }

    /// Record an undoable delete the caller has already performed
    pub fn track_delete(
        &mut self,
        path: &str,
        original: &str,
        description: Option<&str>,
    ) -> Result<PendingEdit> {
        let path = normalize_path(path)?;
        let edit = PendingEdit::new(path, OperationType::Delete, Some(original.to_string()), None)
            .with_description(description)
            .mark_applied();
        Ok(self.stage(edit))
    }

    /// Tag, number and store a new edit, returning a copy of what was stored
    fn stage(&mut self, mut edit: PendingEdit) -> PendingEdit {
        edit.chat_id = self.current_chat_id.clone();
        edit.sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.eager_diff {
            edit.diff(&self.diff_options);
        }

        debug!(
            path = %edit.path,
            operation = %edit.operation,
            applied = edit.applied,
            "Staged edit"
        );
        self.insert(edit.clone());
        edit
    }

    fn insert(&mut self, edit: PendingEdit) {
        if let Some(replaced) = self.pending_by_path.remove(&edit.path) {
            self.events.emit(&LedgerEvent::EditRemoved(replaced));
        }
        while self.pending_by_path.len() >= self.max_pending_edits {
            self.evict_oldest();
        }

        self.pending_by_path.insert(edit.path.clone(), edit.clone());
        self.events.emit(&LedgerEvent::EditAdded(edit));
    }

    /// Silently forget the oldest edit; it is neither committed nor undone
    fn evict_oldest(&mut self) {
        let oldest = self
            .pending_by_path
            .values()
            .min_by_key(|e| e.sequence)
            .map(|e| e.path.clone());
        if let Some(edit) = oldest.and_then(|path| self.pending_by_path.remove(&path)) {
            info!(
                path = %edit.path,
                max_pending_edits = self.max_pending_edits,
                "Evicted oldest pending edit"
            );
            self.events.emit(&LedgerEvent::EditRemoved(edit));
        }
    }

    /// Pre-edit content of `path`: cached snapshot, else a fresh snapshot
    fn current_content(&mut self, path: &str) -> Result<Option<String>> {
        if let Some(snapshot) = self.snapshots_by_path.get(path) {
            if let Some(error) = &snapshot.read_error {
                return Err(EditError::Io {
                    path: path.to_string(),
                    source: io::Error::new(io::ErrorKind::Other, error.clone()),
                });
            }
            return Ok(snapshot.content.clone());
        }
        let snapshot = self.read_snapshot(path)?;
        let content = snapshot.content.clone();
        self.snapshots_by_path.insert(path.to_string(), snapshot);
        Ok(content)
    }

    // ---- Queries ----

    pub fn get_pending_edit(&self, path: &str) -> Option<&PendingEdit> {
        let path = normalize_path(path).ok()?;
        self.pending_by_path.get(&path)
    }

    pub fn get_edit(&self, id: &str) -> Option<&PendingEdit> {
        self.pending_by_path.values().find(|e| e.id == id)
    }

    /// Edits in `scope`, oldest first
    pub fn get_pending_edits(&self, scope: &ChatScope) -> Vec<&PendingEdit> {
        let mut edits: Vec<&PendingEdit> = self
            .pending_by_path
            .values()
            .filter(|e| scope.matches(e.chat_id.as_deref()))
            .collect();
        edits.sort_by_key(|e| e.sequence);
        edits
    }

    /// Whether the current chat (or unscoped work when no chat is set) has edits
    pub fn has_pending_changes(&self) -> bool {
        let scope = ChatScope::current(self.current_chat_id());
        self.pending_by_path
            .values()
            .any(|e| scope.matches(e.chat_id.as_deref()))
    }

    pub fn has_pending_changes_global(&self) -> bool {
        !self.pending_by_path.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_by_path.len()
    }

    /// Content `path` would have if its staged edit were committed.
    ///
    /// Falls back to the live file, then to `None`.
    pub fn get_effective_content(&self, path: &str) -> Option<String> {
        let path = normalize_path(path).ok()?;
        match self.pending_by_path.get(&path) {
            Some(edit) => edit.new_content.clone(),
            None => self.gateway.read(&path).ok(),
        }
    }

    /// Diff of the staged edit for `path`, computed on first access
    pub fn get_diff(&self, path: &str) -> Option<&FileDiff> {
        let path = normalize_path(path).ok()?;
        self.pending_by_path
            .get(&path)
            .map(|edit| edit.diff(&self.diff_options))
    }

    pub fn get_summary(&self, scope: &ChatScope) -> EditSummary {
        let mut summary = EditSummary::default();
        for edit in self.get_pending_edits(scope) {
            summary.add(edit.operation, edit.diff(&self.diff_options));
        }
        summary
    }

    // ---- Commit ----

    /// Commit one edit to the workspace
    pub fn accept_edit(&mut self, id: &str) -> CommitResult {
        match self.get_edit(id).map(|e| e.path.clone()) {
            Some(path) => self.commit_paths(vec![path], false),
            None => CommitResult {
                success: false,
                summary: format!("No pending edit with id {}", id),
                ..Default::default()
            },
        }
    }

    /// Commit every pending edit
    pub fn accept_all(&mut self) -> CommitResult {
        self.accept_scope(&ChatScope::All)
    }

    /// Commit every pending edit in `scope`, oldest first
    pub fn accept_scope(&mut self, scope: &ChatScope) -> CommitResult {
        let paths = self.paths_in(scope);
        self.commit_paths(paths, true)
    }

    fn commit_paths(&mut self, paths: Vec<String>, batch: bool) -> CommitResult {
        let attempted = paths.len();
        let mut committed_paths = Vec::new();
        let mut failed_paths = Vec::new();

        for path in paths {
            let Some(edit) = self.pending_by_path.get(&path) else {
                continue;
            };

            match self.apply_to_disk(edit) {
                Ok(()) => {
                    if let Some(mut edit) = self.pending_by_path.remove(&path) {
                        edit.status = EditStatus::Accepted;
                        self.refresh_snapshots(&edit);
                        debug!(path = %edit.path, operation = %edit.operation, "Committed edit");
                        self.events.emit(&LedgerEvent::EditAccepted(edit));
                    }
                    committed_paths.push(path);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to commit edit");
                    failed_paths.push(FailedPath {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        if batch && !committed_paths.is_empty() && self.pending_by_path.is_empty() {
            self.events.emit(&LedgerEvent::AllAccepted);
        }

        let summary = if failed_paths.is_empty() {
            format!("Committed {} of {} edit(s)", committed_paths.len(), attempted)
        } else {
            format!(
                "Committed {} of {} edit(s); {} failed",
                committed_paths.len(),
                attempted,
                failed_paths.len()
            )
        };

        CommitResult {
            success: failed_paths.is_empty(),
            committed_paths,
            failed_paths,
            summary,
        }
    }

    fn apply_to_disk(&self, edit: &PendingEdit) -> Result<()> {
        if edit.applied {
            return Ok(());
        }

        match edit.operation {
            OperationType::Create | OperationType::Modify => {
                let content = edit.new_content.as_deref().ok_or_else(|| {
                    EditError::invalid_content(&edit.path, "no new content to write")
                })?;
                self.gateway.write(&edit.path, content)
            }
            OperationType::Delete => self.gateway.unlink(&edit.path),
            OperationType::Rename | OperationType::Move => {
                let from = edit.original_path.as_deref().ok_or_else(|| {
                    EditError::invalid_operation(&edit.path, "rename without an original path")
                })?;
                self.gateway.rename(from, &edit.path)
            }
        }
    }

    /// Re-read cached snapshots of paths a committed edit touched
    fn refresh_snapshots(&mut self, edit: &PendingEdit) {
        let touched = std::iter::once(edit.path.as_str()).chain(edit.original_path.as_deref());
        let stale: Vec<String> = touched
            .filter(|p| self.snapshots_by_path.contains_key(*p))
            .map(str::to_string)
            .collect();
        for path in stale {
            let snapshot = self.lenient_snapshot(&path);
            self.snapshots_by_path.insert(path, snapshot);
        }
    }

    // ---- Reject / undo ----

    /// Discard one edit.
    ///
    /// With `undo_from_disk`, an edit the filesystem already reflects (one
    /// recorded via `track_*`) is reversed on disk. Staged edits never reached
    /// the disk and leave it untouched. Returns false for an unknown id.
    pub fn reject_edit(&mut self, id: &str, undo_from_disk: bool) -> bool {
        match self.get_edit(id).map(|e| e.path.clone()) {
            Some(path) => self.reject_path(&path, undo_from_disk),
            None => false,
        }
    }

    /// Discard every pending edit; returns how many were rejected
    pub fn reject_all(&mut self, undo_from_disk: bool) -> usize {
        self.reject_scope(&ChatScope::All, undo_from_disk)
    }

    /// Discard every pending edit in `scope`, oldest first
    pub fn reject_scope(&mut self, scope: &ChatScope, undo_from_disk: bool) -> usize {
        let mut rejected = 0;
        for path in self.paths_in(scope) {
            if self.reject_path(&path, undo_from_disk) {
                rejected += 1;
            }
        }

        if rejected > 0 && self.pending_by_path.is_empty() {
            self.events.emit(&LedgerEvent::AllRejected);
        }
        rejected
    }

    fn reject_path(&mut self, path: &str, undo_from_disk: bool) -> bool {
        let Some(mut edit) = self.pending_by_path.remove(path) else {
            return false;
        };

        if undo_from_disk && edit.applied {
            if let Err(e) = self.undo_on_disk(&edit) {
                warn!(path = %edit.path, error = %e, "Failed to undo edit on disk");
            }
        }

        edit.status = EditStatus::Rejected;
        debug!(path = %edit.path, undo_from_disk, "Rejected edit");
        self.events.emit(&LedgerEvent::EditRejected(edit));
        true
    }

    fn undo_on_disk(&self, edit: &PendingEdit) -> Result<()> {
        match edit.operation {
            OperationType::Create => ignore_missing(self.gateway.unlink(&edit.path)),
            OperationType::Modify => match edit.original_content.as_deref() {
                Some(original) => self.gateway.write(&edit.path, original),
                None => ignore_missing(self.gateway.unlink(&edit.path)),
            },
            OperationType::Delete => match edit.original_content.as_deref() {
                Some(original) => self.gateway.write(&edit.path, original),
                None => Ok(()),
            },
            OperationType::Rename | OperationType::Move => {
                let original_path = edit.original_path.as_deref().ok_or_else(|| {
                    EditError::invalid_operation(&edit.path, "rename without an original path")
                })?;
                self.gateway.rename(&edit.path, original_path)
            }
        }
    }

    fn paths_in(&self, scope: &ChatScope) -> Vec<String> {
        self.get_pending_edits(scope)
            .into_iter()
            .map(|e| e.path.clone())
            .collect()
    }

    // ---- Snapshots ----

    /// Record the current disk state of `path`; unreadable files snapshot as missing
    pub fn snapshot_file(&mut self, path: &str) -> Result<FileSnapshot> {
        let path = normalize_path(path)?;
        let snapshot = self.lenient_snapshot(&path);
        self.snapshots_by_path.insert(path, snapshot.clone());
        Ok(snapshot)
    }

    pub fn get_snapshot(&self, path: &str) -> Option<&FileSnapshot> {
        let path = normalize_path(path).ok()?;
        self.snapshots_by_path.get(&path)
    }

    /// Write the snapshot back to disk and drop any pending edit for the path.
    ///
    /// Bypasses accept/reject: the edit is removed, not rejected. Snapshots
    /// that failed to read, or whose non-UTF-8 file has since changed, are
    /// refused and leave the disk alone.
    pub fn restore_from_snapshot(&mut self, path: &str) -> Result<()> {
        let path = normalize_path(path)?;
        let snapshot = self
            .snapshots_by_path
            .get(&path)
            .cloned()
            .ok_or_else(|| EditError::NotFound(path.clone()))?;

        if snapshot.is_restorable() {
            match (snapshot.exists, snapshot.content.as_deref()) {
                (true, Some(content)) => self.gateway.write(&path, content)?,
                _ => ignore_missing(self.gateway.unlink(&path))?,
            }
        } else if let Some(error) = &snapshot.read_error {
            return Err(EditError::invalid_operation(
                &path,
                format!("snapshot could not read the file ({}), refusing to restore", error),
            ));
        } else if self.snapshot_drifted(&path)? {
            // Lossy text cannot reproduce the original bytes
            return Err(EditError::invalid_content(
                &path,
                "file is not valid UTF-8 and changed since the snapshot",
            ));
        }

        if let Some(edit) = self.pending_by_path.remove(&path) {
            self.events.emit(&LedgerEvent::EditRemoved(edit));
        }
        info!(path = %path, exists = snapshot.exists, "Restored file from snapshot");
        Ok(())
    }

    /// Whether the live file differs from its recorded snapshot
    pub fn snapshot_drifted(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        let snapshot = self
            .snapshots_by_path
            .get(&path)
            .ok_or_else(|| EditError::NotFound(path.clone()))?;

        match self.gateway.read_bytes(&path) {
            Ok(bytes) => {
                Ok(snapshot.content_hash.as_deref() != Some(compute_hash_bytes(&bytes).as_str()))
            }
            Err(e) if e.is_not_found() => Ok(snapshot.exists),
            Err(e) => Err(e),
        }
    }

    /// Read a snapshot, surfacing failures other than a missing file
    fn read_snapshot(&self, path: &str) -> Result<FileSnapshot> {
        match self.gateway.read_bytes(path) {
            Ok(bytes) => {
                let stat = self.gateway.stat(path).ok();
                let content_hash = compute_hash_bytes(&bytes);
                let size = stat.map(|s| s.size).unwrap_or(bytes.len() as u64);
                let (content, lossy) = match String::from_utf8(bytes) {
                    Ok(text) => (text, false),
                    Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
                };
                Ok(FileSnapshot {
                    path: path.to_string(),
                    content: Some(content),
                    exists: true,
                    mtime: stat.map(|s| s.mtime),
                    size,
                    content_hash: Some(content_hash),
                    lossy,
                    read_error: None,
                    taken_at: chrono::Utc::now(),
                })
            }
            Err(e) if e.is_not_found() => Ok(FileSnapshot::missing(path)),
            Err(e) => Err(e),
        }
    }

    fn lenient_snapshot(&self, path: &str) -> FileSnapshot {
        self.read_snapshot(path).unwrap_or_else(|e| {
            warn!(path = %path, error = %e, "Snapshot read failed, recording file as unreadable");
            FileSnapshot::unreadable(path, e.to_string())
        })
    }

    /// Drop every pending edit and snapshot
    pub fn clear(&mut self) {
        self.pending_by_path.clear();
        self.snapshots_by_path.clear();
        self.events.emit(&LedgerEvent::Cleared);
    }
}

fn ignore_missing(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use crate::config::LedgerConfig;
    use crate::diff::LineKind;
    use crate::workspace::gateway::WorkspaceFs;

    fn workspace() -> (TempDir, ShadowWorkspace<WorkspaceFs>) {
        let dir = TempDir::new().unwrap();
        let ledger = ShadowWorkspace::new(WorkspaceFs::new(dir.path()));
        (dir, ledger)
    }

    fn workspace_with(ledger: LedgerConfig) -> (TempDir, ShadowWorkspace<WorkspaceFs>) {
        let dir = TempDir::new().unwrap();
        let config = ShadowConfig {
            ledger,
            ..Default::default()
        };
        let ledger = ShadowWorkspace::with_config(WorkspaceFs::new(dir.path()), &config);
        (dir, ledger)
    }

    fn record_events<G: FileGateway>(ledger: &mut ShadowWorkspace<G>) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ledger.on_event(move |event| {
            let label = match event.edit() {
                Some(edit) => format!("{}:{}", event.kind(), edit.path),
                None => event.kind().to_string(),
            };
            sink.lock().unwrap().push(label);
        });
        seen
    }

    #[test]
    fn test_propose_create_new_file() {
        let (dir, mut ledger) = workspace();

        let edit = ledger.propose_create("a.txt", "hello\n", None).unwrap();
        assert_eq!(edit.operation, OperationType::Create);
        assert_eq!(edit.original_content, None);
        assert_eq!(edit.status, EditStatus::Pending);

        let diff = ledger.get_diff("a.txt").unwrap();
        assert_eq!(diff.additions, 1);
        assert!(diff.is_new_file);
        assert_eq!(ledger.get_effective_content("a.txt").as_deref(), Some("hello\n"));
        // Nothing written yet
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_propose_create_on_existing_becomes_modify() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "old\n").unwrap();

        let edit = ledger.propose_create("a.txt", "new\n", None).unwrap();
        assert_eq!(edit.operation, OperationType::Modify);
        assert_eq!(edit.original_content.as_deref(), Some("old\n"));
    }

    #[test]
    fn test_propose_modify_appends_line() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();

        ledger
            .propose_modify("a.txt", "hello\nworld\n", Some("add world"))
            .unwrap();
        let diff = ledger.get_diff("a.txt").unwrap();

        assert_eq!(diff.hunks.len(), 1);
        let kinds: Vec<LineKind> = diff.hunks[0].lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::Unchanged, LineKind::Add]);
        assert_eq!(diff.additions, 1);
        assert_eq!(diff.deletions, 0);
    }

    #[test]
    fn test_propose_modify_missing_becomes_create() {
        let (_dir, mut ledger) = workspace();
        let edit = ledger.propose_modify("b.txt", "x\n", None).unwrap();
        assert_eq!(edit.operation, OperationType::Create);
    }

    #[test]
    fn test_propose_delete_missing_is_not_found() {
        let (_dir, mut ledger) = workspace();
        let err = ledger.propose_delete("ghost.txt", None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_propose_rename_missing_source_is_not_found() {
        let (_dir, mut ledger) = workspace();
        let err = ledger.propose_rename("ghost.txt", "b.txt", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_propose_rename_vs_move() {
        let (dir, mut ledger) = workspace();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "fn a() {}\n").unwrap();

        let rename = ledger.propose_rename("src/a.rs", "src/b.rs", None).unwrap();
        assert_eq!(rename.operation, OperationType::Rename);
        assert_eq!(rename.original_path.as_deref(), Some("src/a.rs"));
        assert_eq!(rename.path, "src/b.rs");

        let moved = ledger.propose_rename("src/a.rs", "lib/a.rs", None).unwrap();
        assert_eq!(moved.operation, OperationType::Move);
        assert!(!ledger.get_diff("lib/a.rs").unwrap().has_changes());
    }

    #[test]
    fn test_escaping_path_rejected() {
        let (_dir, mut ledger) = workspace();
        let err = ledger.propose_create("../evil.txt", "x", None).unwrap_err();
        assert!(matches!(err, EditError::PathEscape(_)));
        let err = ledger.track_create("/abs.txt", "x", None).unwrap_err();
        assert!(matches!(err, EditError::PathEscape(_)));
    }

    #[test]
    fn test_single_edit_per_path() {
        let (_dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);

        let first = ledger.propose_create("a.txt", "one\n", None).unwrap();
        let second = ledger.propose_create("./a.txt", "two\n", None).unwrap();

        assert_eq!(ledger.pending_count(), 1);
        assert_ne!(first.id, second.id);
        assert!(ledger.get_edit(&first.id).is_none());
        assert_eq!(ledger.get_pending_edit("a.txt").unwrap().id, second.id);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["edit-added:a.txt", "edit-removed:a.txt", "edit-added:a.txt"]
        );
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let (_dir, mut ledger) = workspace_with(LedgerConfig {
            max_pending_edits: 2,
            ..Default::default()
        });
        let events = record_events(&mut ledger);

        for path in ["a", "b", "c"] {
            ledger.propose_create(path, "x\n", None).unwrap();
        }

        let mut staged: Vec<&str> = ledger
            .get_pending_edits(&ChatScope::All)
            .iter()
            .map(|e| e.path.as_str())
            .collect();
        staged.sort();
        assert_eq!(staged, vec!["b", "c"]);
        assert!(events.lock().unwrap().contains(&"edit-removed:a".to_string()));
    }

    #[test]
    fn test_shrinking_capacity_evicts() {
        let (_dir, mut ledger) = workspace();
        for path in ["a", "b", "c"] {
            ledger.propose_create(path, "x\n", None).unwrap();
        }
        ledger.set_max_pending_edits(1);
        assert_eq!(ledger.pending_count(), 1);
        assert!(ledger.get_pending_edit("c").is_some());
    }

    #[test]
    fn test_lazy_diff_computed_on_access() {
        let (_dir, mut ledger) = workspace_with(LedgerConfig {
            eager_diff: false,
            ..Default::default()
        });
        let edit = ledger.propose_create("a.txt", "a\nb\n", None).unwrap();
        assert!(edit.cached_diff().is_none());
        assert!(ledger.get_pending_edit("a.txt").unwrap().cached_diff().is_none());

        assert_eq!(ledger.get_diff("a.txt").unwrap().additions, 2);
        assert!(ledger.get_pending_edit("a.txt").unwrap().cached_diff().is_some());
    }

    #[test]
    fn test_accept_create_writes_file() {
        let (dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        let edit = ledger.propose_create("src/new.rs", "fn x() {}\n", None).unwrap();

        let result = ledger.accept_edit(&edit.id);

        assert!(result.success);
        assert_eq!(result.committed_paths, vec!["src/new.rs"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/new.rs")).unwrap(),
            "fn x() {}\n"
        );
        assert!(!ledger.has_pending_changes_global());
        // Single accepts never report all-accepted
        assert_eq!(
            *events.lock().unwrap(),
            vec!["edit-added:src/new.rs", "edit-accepted:src/new.rs"]
        );
    }

    #[test]
    fn test_accept_then_reject_same_id() {
        let (_dir, mut ledger) = workspace();
        let edit = ledger.propose_create("a.txt", "x\n", None).unwrap();

        assert!(ledger.accept_edit(&edit.id).success);
        assert!(!ledger.reject_edit(&edit.id, true));
        assert!(!ledger.accept_edit(&edit.id).success);
    }

    #[test]
    fn test_accept_delete_and_rename() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("gone.txt"), "bye\n").unwrap();
        fs::write(dir.path().join("old.txt"), "keep\n").unwrap();

        ledger.propose_delete("gone.txt", None).unwrap();
        ledger.propose_rename("old.txt", "docs/new.txt", None).unwrap();
        let result = ledger.accept_all();

        assert!(result.success, "{:?}", result);
        assert!(!dir.path().join("gone.txt").exists());
        assert!(!dir.path().join("old.txt").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("docs/new.txt")).unwrap(),
            "keep\n"
        );
    }

    #[test]
    fn test_accept_all_partial_failure_keeps_failed_pending() {
        let (dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        fs::write(dir.path().join("victim.txt"), "data\n").unwrap();

        ledger.propose_delete("victim.txt", None).unwrap();
        ledger.propose_create("ok.txt", "fine\n", None).unwrap();
        // File disappears behind the ledger's back
        fs::remove_file(dir.path().join("victim.txt")).unwrap();

        let result = ledger.accept_all();

        assert!(!result.success);
        assert_eq!(result.committed_paths, vec!["ok.txt"]);
        assert_eq!(result.failed_paths.len(), 1);
        assert_eq!(result.failed_paths[0].path, "victim.txt");
        assert!(ledger.get_pending_edit("victim.txt").is_some());
        assert!(dir.path().join("ok.txt").exists());
        assert!(!events.lock().unwrap().contains(&"all-accepted".to_string()));
    }

    #[test]
    fn test_accept_all_emits_all_accepted_when_emptied() {
        let (_dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        ledger.propose_create("a.txt", "a\n", None).unwrap();
        ledger.propose_create("b.txt", "b\n", None).unwrap();

        assert!(ledger.accept_all().success);
        assert_eq!(events.lock().unwrap().last().unwrap(), "all-accepted");
    }

    #[test]
    fn test_accept_tracked_edit_skips_disk() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "user changed it\n").unwrap();
        let edit = ledger
            .track_modify("a.txt", Some("before\n"), "after\n", None)
            .unwrap();

        assert!(ledger.accept_edit(&edit.id).success);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "user changed it\n"
        );
        assert!(ledger.get_pending_edit("a.txt").is_none());
    }

    #[test]
    fn test_track_delete_then_reject_restores() {
        let (dir, mut ledger) = workspace();
        ledger.track_delete("a.txt", "orig\n", Some("desc")).unwrap();

        assert_eq!(ledger.reject_all(true), 1);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "orig\n");
    }

    #[test]
    fn test_track_create_then_reject_removes_file() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("made.txt"), "agent wrote this\n").unwrap();
        let edit = ledger.track_create("made.txt", "agent wrote this\n", None).unwrap();

        assert!(ledger.reject_edit(&edit.id, true));
        assert!(!dir.path().join("made.txt").exists());

        // Already gone: undo is a no-op
        let edit = ledger.track_create("made.txt", "x\n", None).unwrap();
        assert!(ledger.reject_edit(&edit.id, true));
    }

    #[test]
    fn test_track_modify_reject_without_original_deletes() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "new\n").unwrap();
        ledger.track_modify("a.txt", None, "new\n", None).unwrap();

        ledger.reject_all(true);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_reject_without_undo_leaves_disk() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "agent\n").unwrap();
        let edit = ledger
            .track_modify("a.txt", Some("human\n"), "agent\n", None)
            .unwrap();

        assert!(ledger.reject_edit(&edit.id, false));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "agent\n");
    }

    #[test]
    fn test_reject_all_continues_past_undo_failures() {
        let (dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        // Undo cannot unlink through a regular file standing in for a directory
        fs::write(dir.path().join("blocker"), "not a dir\n").unwrap();
        ledger.track_create("blocker/made.txt", "x\n", None).unwrap();
        ledger.track_delete("b.txt", "restored\n", None).unwrap();

        assert_eq!(ledger.reject_all(true), 2);
        assert!(!ledger.has_pending_changes_global());
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "restored\n");
        assert_eq!(fs::read_to_string(dir.path().join("blocker")).unwrap(), "not a dir\n");
        assert_eq!(events.lock().unwrap().last().unwrap(), "all-rejected");
    }

    #[test]
    fn test_reject_staged_modify_keeps_user_work() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "v1\n").unwrap();
        let edit = ledger.propose_modify("a.txt", "v2\n", None).unwrap();
        // User keeps editing while the proposal is pending
        fs::write(dir.path().join("a.txt"), "v1\nuser work\n").unwrap();

        assert!(ledger.reject_edit(&edit.id, true));
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "v1\nuser work\n"
        );
    }

    #[test]
    fn test_reject_staged_edits_leave_disk_untouched() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::write(dir.path().join("keep.txt"), "keep\n").unwrap();
        ledger.propose_rename("a.txt", "nested/b.txt", None).unwrap();
        ledger.propose_delete("keep.txt", None).unwrap();
        ledger.propose_create("new.txt", "n\n", None).unwrap();
        fs::write(dir.path().join("new.txt"), "written by hand\n").unwrap();

        assert_eq!(ledger.reject_all(true), 3);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a\n");
        assert!(!dir.path().join("nested/b.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("keep.txt")).unwrap(), "keep\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("new.txt")).unwrap(),
            "written by hand\n"
        );
    }

    #[test]
    fn test_propose_rename_onto_existing_file_fails() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "A\n").unwrap();
        fs::write(dir.path().join("b.txt"), "B\n").unwrap();

        let err = ledger.propose_rename("a.txt", "b.txt", None).unwrap_err();
        assert!(matches!(err, EditError::InvalidOperation { .. }));
        assert_eq!(ledger.pending_count(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "A\n");
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "B\n");
    }

    #[test]
    fn test_accept_rename_when_destination_appears_fails() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "A\n").unwrap();
        let edit = ledger.propose_rename("a.txt", "b.txt", None).unwrap();
        fs::write(dir.path().join("b.txt"), "B\n").unwrap();

        let result = ledger.accept_edit(&edit.id);
        assert!(!result.success);
        assert_eq!(result.failed_paths[0].path, "b.txt");
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "B\n");
        assert!(ledger.get_pending_edit("b.txt").is_some());
    }

    const PNG_BYTES: [u8; 10] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, 0xff, 0xfe, 0x00];

    #[test]
    fn test_stage_delete_and_rename_of_binary_file() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("logo.png"), PNG_BYTES).unwrap();
        fs::write(dir.path().join("icon.png"), PNG_BYTES).unwrap();

        ledger.propose_delete("logo.png", None).unwrap();
        ledger.propose_rename("icon.png", "assets/icon.png", None).unwrap();
        assert!(ledger.get_diff("logo.png").unwrap().is_binary);
        assert!(ledger.get_diff("assets/icon.png").unwrap().is_binary);

        assert!(ledger.accept_all().success);
        assert!(!dir.path().join("logo.png").exists());
        // Renames move the bytes untouched
        assert_eq!(fs::read(dir.path().join("assets/icon.png")).unwrap(), PNG_BYTES);
    }

    #[test]
    fn test_restore_binary_snapshot_keeps_file() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("logo.png"), PNG_BYTES).unwrap();

        let snapshot = ledger.snapshot_file("logo.png").unwrap();
        assert!(snapshot.exists);
        assert!(snapshot.lossy);
        assert_eq!(snapshot.size, PNG_BYTES.len() as u64);
        assert!(!ledger.snapshot_drifted("logo.png").unwrap());

        ledger.propose_delete("logo.png", None).unwrap();
        ledger.restore_from_snapshot("logo.png").unwrap();
        assert_eq!(fs::read(dir.path().join("logo.png")).unwrap(), PNG_BYTES);
        assert!(ledger.get_pending_edit("logo.png").is_none());

        // Changed binary content cannot be rebuilt from lossy text
        fs::write(dir.path().join("logo.png"), [0xffu8, 0x00]).unwrap();
        assert!(ledger.restore_from_snapshot("logo.png").is_err());
        assert_eq!(fs::read(dir.path().join("logo.png")).unwrap(), [0xffu8, 0x00]);
    }

    #[test]
    fn test_unreadable_snapshot_refuses_restore() {
        let (dir, mut ledger) = workspace();
        fs::create_dir_all(dir.path().join("data/inner")).unwrap();

        let snapshot = ledger.snapshot_file("data").unwrap();
        assert!(!snapshot.exists);
        assert!(snapshot.read_error.is_some());

        let err = ledger.restore_from_snapshot("data").unwrap_err();
        assert!(matches!(err, EditError::InvalidOperation { .. }));
        assert!(dir.path().join("data/inner").is_dir());
        // Not mistaken for a missing file either
        assert!(ledger.propose_create("data", "x\n", None).is_err());
    }

    #[test]
    fn test_chat_scoping() {
        let (_dir, mut ledger) = workspace();

        ledger.propose_create("unscoped.txt", "u\n", None).unwrap();
        ledger.set_current_chat_id(Some("chat-1".to_string()));
        ledger.propose_create("one.txt", "1\n", None).unwrap();
        ledger.set_current_chat_id(Some("chat-2".to_string()));
        ledger.propose_create("two.txt", "2\n2\n", None).unwrap();

        assert_eq!(ledger.get_pending_edits(&ChatScope::All).len(), 3);
        let unscoped = ledger.get_pending_edits(&ChatScope::Unscoped);
        assert_eq!(unscoped.len(), 1);
        assert_eq!(unscoped[0].path, "unscoped.txt");
        let chat_one = ledger.get_pending_edits(&ChatScope::Chat("chat-1".into()));
        assert_eq!(chat_one.len(), 1);
        assert_eq!(chat_one[0].chat_id.as_deref(), Some("chat-1"));

        assert_eq!(ledger.get_summary(&ChatScope::Chat("chat-2".into())).additions, 2);

        ledger.set_current_chat_id(Some("chat-3".to_string()));
        assert!(!ledger.has_pending_changes());
        assert!(ledger.has_pending_changes_global());

        ledger.set_current_chat_id(None);
        assert!(ledger.has_pending_changes());
    }

    #[test]
    fn test_scoped_accept_leaves_other_chats() {
        let (dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        ledger.set_current_chat_id(Some("mine".to_string()));
        ledger.propose_create("mine.txt", "m\n", None).unwrap();
        ledger.set_current_chat_id(Some("theirs".to_string()));
        ledger.propose_create("theirs.txt", "t\n", None).unwrap();

        let result = ledger.accept_scope(&ChatScope::Chat("mine".into()));

        assert!(result.success);
        assert!(dir.path().join("mine.txt").exists());
        assert!(!dir.path().join("theirs.txt").exists());
        assert!(ledger.get_pending_edit("theirs.txt").is_some());
        assert!(!events.lock().unwrap().contains(&"all-accepted".to_string()));
    }

    #[test]
    fn test_summary_consistency() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("m.txt"), "a\nb\nc\n").unwrap();
        fs::write(dir.path().join("d.txt"), "x\ny\n").unwrap();
        fs::write(dir.path().join("r.txt"), "r\n").unwrap();

        ledger.propose_create("n.txt", "1\n2\n3\n", None).unwrap();
        ledger.propose_modify("m.txt", "a\nB\nc\n", None).unwrap();
        ledger.propose_delete("d.txt", None).unwrap();
        ledger.propose_rename("r.txt", "r2.txt", None).unwrap();

        let summary = ledger.get_summary(&ChatScope::All);
        let edits = ledger.get_pending_edits(&ChatScope::All);
        let additions: usize = edits.iter().map(|e| e.diff(ledger.diff_options()).additions).sum();
        let deletions: usize = edits.iter().map(|e| e.diff(ledger.diff_options()).deletions).sum();

        assert_eq!(summary.additions, additions);
        assert_eq!(summary.deletions, deletions);
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.new_files, 1);
        assert_eq!(summary.modified_files, 1);
        assert_eq!(summary.deleted_files, 1);
        assert_eq!(summary.renamed_files, 1);
        assert_eq!(summary.additions, 4);
        assert_eq!(summary.deletions, 3);
    }

    #[test]
    fn test_effective_content_falls_back_to_disk() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("live.txt"), "live\n").unwrap();
        fs::write(dir.path().join("doomed.txt"), "bye\n").unwrap();
        ledger.propose_delete("doomed.txt", None).unwrap();

        assert_eq!(ledger.get_effective_content("live.txt").as_deref(), Some("live\n"));
        assert_eq!(ledger.get_effective_content("doomed.txt"), None);
        assert_eq!(ledger.get_effective_content("missing.txt"), None);
    }

    #[test]
    fn test_propose_patch_stacks_on_staged_content() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        ledger.propose_modify("a.txt", "one\ntwo\n", None).unwrap();

        let patch = "--- a/a.txt\n+++ b/a.txt\n@@ -1,2 +1,3 @@\n one\n two\n+three\n";
        let edit = ledger.propose_patch("a.txt", patch, None).unwrap();

        assert_eq!(edit.new_content.as_deref(), Some("one\ntwo\nthree\n"));
        assert_eq!(edit.original_content.as_deref(), Some("one\n"));
        assert_eq!(ledger.get_diff("a.txt").unwrap().additions, 2);
    }

    #[test]
    fn test_propose_patch_mismatch_leaves_ledger_untouched() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        let patch = "@@ -1,1 +1,1 @@\n-other\n+new\n";

        assert!(ledger.propose_patch("a.txt", patch, None).is_err());
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "original\n").unwrap();

        let snapshot = ledger.snapshot_file("a.txt").unwrap();
        assert!(snapshot.exists);
        assert_eq!(snapshot.size, 9);
        assert!(snapshot.mtime.is_some());

        ledger.track_modify("a.txt", Some("original\n"), "agent\n", None).unwrap();
        fs::write(dir.path().join("a.txt"), "agent\n").unwrap();
        assert!(ledger.snapshot_drifted("a.txt").unwrap());

        ledger.restore_from_snapshot("a.txt").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "original\n");
        assert!(ledger.get_pending_edit("a.txt").is_none());
        assert!(!ledger.snapshot_drifted("a.txt").unwrap());
    }

    #[test]
    fn test_restore_missing_snapshot_deletes_file() {
        let (dir, mut ledger) = workspace();
        let snapshot = ledger.snapshot_file("later.txt").unwrap();
        assert!(!snapshot.exists);

        fs::write(dir.path().join("later.txt"), "appeared\n").unwrap();
        ledger.restore_from_snapshot("later.txt").unwrap();
        assert!(!dir.path().join("later.txt").exists());
    }

    #[test]
    fn test_restore_without_snapshot_is_not_found() {
        let (_dir, mut ledger) = workspace();
        assert!(ledger.restore_from_snapshot("a.txt").unwrap_err().is_not_found());
        assert!(ledger.get_snapshot("a.txt").is_none());
    }

    #[test]
    fn test_propose_uses_snapshot_cache() {
        let (dir, mut ledger) = workspace();
        fs::write(dir.path().join("a.txt"), "v1\n").unwrap();
        ledger.snapshot_file("a.txt").unwrap();
        fs::write(dir.path().join("a.txt"), "v2\n").unwrap();

        let edit = ledger.propose_modify("a.txt", "v3\n", None).unwrap();
        assert_eq!(edit.original_content.as_deref(), Some("v1\n"));
    }

    #[test]
    fn test_commit_refreshes_snapshot() {
        let (_dir, mut ledger) = workspace();
        let edit = ledger.propose_create("a.txt", "first\n", None).unwrap();
        assert!(!ledger.get_snapshot("a.txt").unwrap().exists);

        ledger.accept_edit(&edit.id);
        let snapshot = ledger.get_snapshot("a.txt").unwrap();
        assert!(snapshot.exists);
        assert_eq!(snapshot.content.as_deref(), Some("first\n"));

        let next = ledger.propose_modify("a.txt", "second\n", None).unwrap();
        assert_eq!(next.operation, OperationType::Modify);
        assert_eq!(next.original_content.as_deref(), Some("first\n"));
    }

    #[test]
    fn test_clear_drops_everything() {
        let (_dir, mut ledger) = workspace();
        let events = record_events(&mut ledger);
        ledger.propose_create("a.txt", "a\n", None).unwrap();

        ledger.clear();

        assert_eq!(ledger.pending_count(), 0);
        assert!(ledger.get_snapshot("a.txt").is_none());
        assert_eq!(events.lock().unwrap().last().unwrap(), "cleared");
    }

    #[test]
    fn test_panicking_subscriber_does_not_abort_propose() {
        let (_dir, mut ledger) = workspace();
        ledger.on_event(|_| panic!("ui crashed"));
        let events = record_events(&mut ledger);

        ledger.propose_create("a.txt", "a\n", None).unwrap();

        assert_eq!(ledger.pending_count(), 1);
        assert_eq!(*events.lock().unwrap(), vec!["edit-added:a.txt"]);
    }

    #[test]
    fn test_binary_content_reports_zero_counts() {
        let (_dir, mut ledger) = workspace();
        ledger.propose_create("blob.bin", "head\0tail", None).unwrap();

        let diff = ledger.get_diff("blob.bin").unwrap();
        assert!(diff.is_binary);
        assert!(diff.hunks.is_empty());
        assert_eq!(ledger.get_summary(&ChatScope::All).additions, 0);
    }
}
