//! Stage a batch of edits from a JSON plan file.
//!
//! ```json
//! {
//!   "operations": [
//!     { "op": "create", "path": "src/new.rs", "content": "fn x() {}\n" },
//!     { "op": "rename", "from": "old.txt", "to": "docs/new.txt" },
//!     { "op": "patch", "path": "README.md", "patch": "@@ -1,1 +1,1 @@\n-a\n+b\n" }
//!   ]
//! }
//! ```
//!
//! Without `--accept` the staged edits are previewed and then discarded.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::output::{
    format_commit_result, format_diff, format_edit_line, format_summary, OutputFormat,
};
use crate::workspace::{ChatScope, FileGateway, PendingEdit, ShadowWorkspace, WorkspaceFs};

/// Plan command arguments
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// JSON plan file
    pub plan: PathBuf,

    /// Workspace root the plan's paths are relative to
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Chat ID to tag the staged edits with
    #[arg(long)]
    pub chat: Option<String>,

    /// Commit the staged edits instead of discarding them
    #[arg(long)]
    pub accept: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

/// A batch of file operations to stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(default)]
    pub operations: Vec<PlanOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PlanOperation {
    Create {
        path: String,
        content: String,
        #[serde(default)]
        description: Option<String>,
    },
    Modify {
        path: String,
        content: String,
        #[serde(default)]
        description: Option<String>,
    },
    Delete {
        path: String,
        #[serde(default)]
        description: Option<String>,
    },
    Rename {
        from: String,
        to: String,
        #[serde(default)]
        description: Option<String>,
    },
    Patch {
        path: String,
        patch: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl PlanOperation {
    /// Path the operation is keyed under
    pub fn target(&self) -> &str {
        match self {
            Self::Create { path, .. }
            | Self::Modify { path, .. }
            | Self::Delete { path, .. }
            | Self::Patch { path, .. } => path,
            Self::Rename { to, .. } => to,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Modify { .. } => "modify",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::Patch { .. } => "patch",
        }
    }
}

pub fn load_plan(path: &Path) -> Result<EditPlan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse plan file: {}", path.display()))
}

/// Stage every operation of a plan, stopping at the first failure
pub fn stage_plan<G: FileGateway>(
    ledger: &mut ShadowWorkspace<G>,
    plan: &EditPlan,
) -> Result<Vec<PendingEdit>> {
    let mut staged = Vec::with_capacity(plan.operations.len());

    for (idx, operation) in plan.operations.iter().enumerate() {
        let edit = match operation {
            PlanOperation::Create {
                path,
                content,
                description,
            } => ledger.propose_create(path, content, description.as_deref()),
            PlanOperation::Modify {
                path,
                content,
                description,
            } => ledger.propose_modify(path, content, description.as_deref()),
            PlanOperation::Delete { path, description } => {
                ledger.propose_delete(path, description.as_deref())
            }
            PlanOperation::Rename {
                from,
                to,
                description,
            } => ledger.propose_rename(from, to, description.as_deref()),
            PlanOperation::Patch {
                path,
                patch,
                description,
            } => ledger.propose_patch(path, patch, description.as_deref()),
        }
        .with_context(|| {
            format!(
                "Operation {} ({} {}) could not be staged",
                idx + 1,
                operation.name(),
                operation.target()
            )
        })?;
        staged.push(edit);
    }

    Ok(staged)
}

pub fn run(args: PlanArgs) -> Result<()> {
    let plan = load_plan(&args.plan)?;
    let config = super::load_config(&args.workspace);

    let mut ledger = ShadowWorkspace::with_config(WorkspaceFs::new(&args.workspace), &config);
    ledger.on_event(|event| match event.edit() {
        Some(edit) => debug!(event = event.kind(), path = %edit.path, "Ledger event"),
        None => debug!(event = event.kind(), "Ledger event"),
    });
    ledger.set_current_chat_id(args.chat.clone());

    stage_plan(&mut ledger, &plan)?;

    let scope = ChatScope::current(args.chat.as_deref());
    let summary = ledger.get_summary(&scope);
    let edits: Vec<PendingEdit> = ledger
        .get_pending_edits(&scope)
        .into_iter()
        .cloned()
        .collect();

    let commit = if args.accept {
        Some(ledger.accept_scope(&scope))
    } else {
        None
    };
    let discarded = if args.accept {
        0
    } else {
        ledger.reject_scope(&scope, false)
    };

    match args.format {
        OutputFormat::Pretty => {
            for edit in &edits {
                println!("{}", format_edit_line(edit));
                print!("{}", format_diff(edit.diff(ledger.diff_options()), OutputFormat::Pretty));
                println!();
            }
            println!("{}", format_summary(&summary));
            match &commit {
                Some(result) => print!("{}", format_commit_result(result)),
                None => println!(
                    "{} discarded {} staged edit(s); re-run with {} to apply",
                    "Preview only:".yellow(),
                    discarded,
                    "--accept".cyan()
                ),
            }
        }
        OutputFormat::Json => {
            let edits_json: Vec<serde_json::Value> = edits
                .iter()
                .map(|edit| {
                    serde_json::json!({
                        "edit": edit,
                        "diff": edit.diff(ledger.diff_options()),
                    })
                })
                .collect();
            let report = serde_json::json!({
                "edits": edits_json,
                "summary": summary,
                "commit": commit,
                "discarded": discarded,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(result) = commit {
        if !result.success {
            anyhow::bail!("{} edit(s) failed to commit", result.failed_paths.len());
        }
    }

    Ok(())
}
