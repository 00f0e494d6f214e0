//! Status command implementation.

use anyhow::Result;
use console::style;

use xprobe_cli::XprobeConfig;
use xprobe_hal::{JobId, JobStatus};

use super::common::{ServiceKind, Session};

/// Execute the status command.
pub async fn execute(kind: ServiceKind, config: &XprobeConfig, job_id: &str) -> Result<()> {
    let service = Session::new(kind, config).connect().await?;
    let job_id = JobId::new(job_id);

    let status = service.status(&job_id).await?;
    let styled = match &status {
        JobStatus::Completed => style(status.to_string()).green(),
        JobStatus::Failed(_) | JobStatus::Cancelled => style(status.to_string()).red(),
        JobStatus::Queued | JobStatus::Running => style(status.to_string()).yellow(),
    };
    println!("Job {}: {styled}", style(&job_id).cyan());

    if status.is_success() {
        let result = service.estimator_result(&job_id).await?;
        for (i, pub_result) in result.pubs.iter().enumerate() {
            print!("  pub {i}: evs = {}", pub_result.data.evs);
            if let Some(stds) = &pub_result.data.stds {
                print!(", stds = {stds}");
            }
            println!();
        }
    }

    Ok(())
}
