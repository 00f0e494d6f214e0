//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use xprobe_adapter_ibm::{EstimatorOptions, IbmConnector};
use xprobe_adapter_sim::LocalConnector;
use xprobe_cli::XprobeConfig;
use xprobe_hal::{
    BackendFilter, Channel, Credentials, HalResult, QuantumService, SessionConnector,
};

/// Which runtime to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    /// IBM Quantum hardware.
    Ibm,
    /// In-process noiseless estimator.
    Local,
}

/// Everything needed to open a session, before anything touches the network.
pub struct Session {
    pub connector: Box<dyn SessionConnector>,
    pub credentials: HalResult<Credentials>,
    pub filter: BackendFilter,
}

impl Session {
    /// Build the connector, credentials and backend filter for `kind`.
    pub fn new(kind: ServiceKind, config: &XprobeConfig) -> Self {
        match kind {
            ServiceKind::Ibm => {
                let mut connector = IbmConnector::new().with_options(EstimatorOptions {
                    resilience_level: config.resilience_level,
                    default_shots: None,
                });
                if let Some(endpoint) = &config.endpoint {
                    connector = connector.with_endpoint(endpoint.as_str());
                }
                if let Some(iam_url) = &config.iam_url {
                    connector = connector.with_iam_url(iam_url.as_str());
                }
                Self {
                    connector: Box::new(connector),
                    credentials: config.credentials(),
                    filter: BackendFilter::hardware(),
                }
            }
            ServiceKind::Local => Self {
                connector: Box::new(LocalConnector::new()),
                credentials: Ok(Credentials::local()),
                filter: BackendFilter::any(1),
            },
        }
    }

    /// Authenticate and open the session.
    pub async fn connect(self) -> Result<Box<dyn QuantumService>> {
        let credentials = self.credentials?;
        self.connector
            .connect(&credentials)
            .await
            .with_context(|| {
                format!(
                    "Failed to open a session on channel {}",
                    credentials.channel()
                )
            })
    }
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub channel: Option<Channel>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

/// Load configuration and apply command-line overrides.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<XprobeConfig> {
    let mut config = XprobeConfig::load(path).context("Failed to load configuration")?;

    if let Some(channel) = overrides.channel {
        config.channel = Some(channel);
    }
    if let Some(secs) = overrides.timeout_secs {
        config.timeout_secs = Some(secs);
    }
    if let Some(secs) = overrides.poll_interval_secs {
        config.poll_interval_secs = secs;
    }

    config.validate().context("Invalid command-line option")?;
    Ok(config)
}
