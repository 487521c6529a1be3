use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::diff::apply_unified_diff;
use crate::workspace::{FileGateway, WorkspaceFs};

/// Patch command arguments
#[derive(Debug, Args)]
pub struct PatchArgs {
    /// File to patch (a missing file is patched from empty)
    pub file: String,

    /// Unified diff to apply
    pub patch: String,

    /// Write the result back to FILE instead of printing it
    #[arg(long)]
    pub write: bool,
}

pub fn run(args: PatchArgs) -> Result<()> {
    let base = match fs::read_to_string(&args.file) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", args.file)),
    };
    let patch = fs::read_to_string(&args.patch)
        .with_context(|| format!("Failed to read patch {}", args.patch))?;

    let patched = apply_unified_diff(&base, &patch)
        .with_context(|| format!("Patch does not apply to {}", args.file))?;

    if args.write {
        write_beside(Path::new(&args.file), &patched)?;
        eprintln!("{} {}", "Patched".green(), args.file);
    } else {
        print!("{}", patched);
    }

    Ok(())
}

/// Atomically replace `path`, going through a gateway rooted at its directory
fn write_beside(path: &Path, content: &str) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    WorkspaceFs::new(dir)
        .write(name, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}
