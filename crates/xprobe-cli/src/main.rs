//! xprobe Command-Line Interface
//!
//! Smoke test for IBM Quantum hardware: build an X-gate probe, run it through
//! the estimator on the least busy backend and compare `<Z>` with the ideal -1.
//!
//! ```text
//! xprobe run                    # IBM Quantum, credentials from the environment
//! xprobe run --backend local    # offline, noiseless reference run
//! xprobe backends               # list backends, mark the least busy
//! xprobe status <job-id>        # check a submitted job
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use xprobe_cli::config::LOG_LEVEL_ENV;
use xprobe_hal::Channel;

mod commands;

use commands::common::{Overrides, ServiceKind, load_config};
use commands::{backends, circuit, run, status, version};

/// xprobe - estimator smoke test for IBM Quantum hardware
#[derive(Parser)]
#[command(name = "xprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.xprobe/config.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Service to run on
    #[arg(short, long, value_enum, default_value = "ibm", global = true)]
    backend: ServiceKind,

    /// Channel (ibm_quantum_platform, ibm_cloud, ibm_quantum)
    #[arg(long, global = true)]
    channel: Option<Channel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the X-gate smoke test
    Run {
        /// Give up waiting after this many seconds and cancel the job
        #[arg(long)]
        timeout: Option<u64>,

        /// Seconds between job status polls
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Do not draw a spinner while waiting
        #[arg(long)]
        no_progress: bool,
    },

    /// List backends and mark the least busy one
    Backends,

    /// Query the status of a job
    Status {
        /// Job ID
        job_id: String,
    },

    /// Print the probe circuit and its OpenQASM 3.0 form
    Circuit,

    /// Show version information
    Version,
}

/// Install the stderr log subscriber.
fn init_tracing(verbose: u8, configured: Option<&str>) {
    let filter = match verbose {
        0 => configured.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let overrides = match &cli.command {
        Commands::Run {
            timeout,
            poll_interval,
            ..
        } => Overrides {
            channel: cli.channel,
            timeout_secs: *timeout,
            poll_interval_secs: *poll_interval,
        },
        _ => Overrides {
            channel: cli.channel,
            ..Overrides::default()
        },
    };

    match cli.command {
        Commands::Version => {
            init_tracing(cli.verbose, std::env::var(LOG_LEVEL_ENV).ok().as_deref());
            version::execute()?;
            Ok(0)
        }
        Commands::Circuit => {
            init_tracing(cli.verbose, std::env::var(LOG_LEVEL_ENV).ok().as_deref());
            circuit::execute()?;
            Ok(0)
        }
        command => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            init_tracing(cli.verbose, Some(&config.log_level));
            tracing::debug!(?config, "Loaded configuration");

            match command {
                Commands::Run { no_progress, .. } => {
                    run::execute(cli.backend, &config, !no_progress).await
                }
                Commands::Backends => backends::execute(cli.backend, &config).await.map(|()| 0),
                Commands::Status { job_id } => status::execute(cli.backend, &config, &job_id)
                    .await
                    .map(|()| 0),
                Commands::Version | Commands::Circuit => Ok(0),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}
