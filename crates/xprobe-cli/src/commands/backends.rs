//! Backends command implementation.

use anyhow::Result;
use console::style;

use xprobe_cli::XprobeConfig;
use xprobe_hal::select_least_busy;

use super::common::{ServiceKind, Session};

/// Execute the backends command.
pub async fn execute(kind: ServiceKind, config: &XprobeConfig) -> Result<()> {
    let session = Session::new(kind, config);
    let filter = session.filter;
    let service = session.connect().await?;

    let mut backends = service.backends().await?;
    backends.sort_by(|a, b| a.name.cmp(&b.name));
    let least_busy = select_least_busy(backends.iter().cloned(), &filter)
        .ok()
        .map(|b| b.name);

    println!(
        "{} backends on {} ({filter}):\n",
        style("xprobe").cyan().bold(),
        style(service.name()).yellow()
    );

    for backend in &backends {
        let marker = if !filter.matches(backend) {
            style("○").dim()
        } else if backend.operational {
            style("●").green()
        } else {
            style("○").red()
        };
        let queue = backend
            .pending_jobs
            .map_or_else(|| "unknown".to_string(), |n| n.to_string());

        print!("  {marker} {}", style(&backend.name).bold());
        if backend.simulator {
            print!(" (simulator)");
        }
        if least_busy.as_deref() == Some(backend.name.as_str()) {
            print!(" {}", style("<- least busy").green());
        }
        println!();
        println!("    Qubits: {}  Pending jobs: {queue}", backend.num_qubits);
        if let Some(msg) = &backend.status_msg {
            println!("    Status: {}", style(msg).dim());
        }
    }

    if backends.is_empty() {
        println!("  {}", style("No backends visible to this account").dim());
    } else if least_busy.is_none() {
        println!("\n  {}", style("No backend matches the filter").yellow());
    }

    Ok(())
}
