use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SHADOW_EDIT_LOG=debug`
const LOG_ENV: &str = "SHADOW_EDIT_LOG";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = shadow_edit::cli::run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
