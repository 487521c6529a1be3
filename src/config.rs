//! Configuration for shadow-edit
//!
//! Supports loading from `.shadow-edit.toml` (workspace) or
//! `~/.config/shadow-edit/config.toml` (global).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::diff::DiffOptions;

/// Workspace-local config file name
const WORKSPACE_CONFIG_FILE: &str = ".shadow-edit.toml";
/// Directory under the user config dir holding the global config
const GLOBAL_CONFIG_DIR: &str = "shadow-edit";

/// Ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Staged edits kept before the oldest is silently evicted
    /// Default: 100
    pub max_pending_edits: usize,

    /// Compute diffs when edits are staged rather than on first access
    /// Default: true
    pub eager_diff: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_pending_edits: 100,
            eager_diff: true,
        }
    }
}

/// Full shadow-edit configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub ledger: LedgerConfig,

    /// Diff settings (`context_lines`, `max_lcs_cells`)
    pub diff: DiffOptions,
}

impl ShadowConfig {
    /// Load configuration from the workspace root, falling back to global config
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let workspace_config = Self::workspace_config_path(workspace_root);
        if workspace_config.exists() {
            return Self::load_from_file(&workspace_config);
        }

        if let Some(global_config) = Self::global_config_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get global config path (`<config dir>/shadow-edit/config.toml`)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(GLOBAL_CONFIG_DIR).join("config.toml"))
    }

    /// Get workspace-local config path
    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(WORKSPACE_CONFIG_FILE)
    }
}
