//! Run command implementation.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use tracing::info;

use xprobe_cli::{SmokeTestOptions, XprobeConfig, run_smoke_test};

use super::common::{ServiceKind, Session};
use super::version;

/// Execute the smoke test. Returns the process exit code.
pub async fn execute(kind: ServiceKind, config: &XprobeConfig, progress: bool) -> Result<i32> {
    let mut stdout = io::stdout();
    version::write_banner(&mut stdout)?;
    writeln!(stdout)?;

    let session = Session::new(kind, config);
    let options = SmokeTestOptions {
        filter: session.filter,
        wait: config.wait_options(),
        progress,
    };
    info!(service = ?kind, filter = %options.filter, "Starting smoke test");

    let outcome = run_smoke_test(
        &mut stdout,
        session.connector.as_ref(),
        session.credentials,
        &options,
    )
    .await?;

    if !outcome.is_success() {
        eprintln!(
            "{} smoke test did not complete (exit code {})",
            style("✗").red().bold(),
            outcome.exit_code()
        );
    }

    Ok(outcome.exit_code())
}
