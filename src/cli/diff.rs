use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{format_diff, OutputFormat};
use crate::diff::{compute_diff_with, DiffOptions, FileDiff};

/// Diff command arguments
#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Original file (a missing file counts as empty, as for a new file)
    pub old: String,

    /// Modified file (a missing file counts as deleted)
    pub new: String,

    /// Lines of unchanged context around each change
    #[arg(long, short = 'U')]
    pub context: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

pub fn run(args: DiffArgs) -> Result<()> {
    let config = super::load_config(Path::new("."));
    let mut options = config.diff;
    if let Some(context) = args.context {
        options.context_lines = context;
    }

    let diff = diff_files(&args.old, &args.new, &options)?;
    print!("{}", format_diff(&diff, args.format));
    if args.format == OutputFormat::Json {
        println!();
    }

    Ok(())
}

/// Diff two files on disk, labelled with the new path
pub fn diff_files(old: &str, new: &str, options: &DiffOptions) -> Result<FileDiff> {
    let original = read_optional(old)?;
    let modified = read_optional(new)?;
    if original.is_none() && modified.is_none() {
        anyhow::bail!("Neither '{}' nor '{}' exists", old, new);
    }

    let label = if modified.is_some() { new } else { old };
    Ok(compute_diff_with(
        label,
        original.as_deref(),
        modified.as_deref(),
        options,
    ))
}

fn read_optional(path: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path)),
    }
}
