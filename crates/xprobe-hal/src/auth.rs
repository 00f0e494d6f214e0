//! Credentials for remote quantum services.
//!
//! Credentials are resolved at startup from the environment (or a config
//! file the caller reads) and never written back anywhere.
//!
//! | Channel | Secret | Instance |
//! |---------|--------|----------|
//! | `ibm_quantum_platform` / `ibm_cloud` | `IBM_API_KEY` | `IBM_SERVICE_CRN` |
//! | `ibm_quantum` (legacy) | `IBM_QUANTUM_TOKEN` | optional |
//! | `local` | none | none |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Environment variable holding an IBM Cloud API key.
pub const IBM_API_KEY_ENV: &str = "IBM_API_KEY";
/// Environment variable holding a legacy IBM Quantum token.
pub const IBM_QUANTUM_TOKEN_ENV: &str = "IBM_QUANTUM_TOKEN";
/// Environment variable holding the service instance CRN.
pub const IBM_SERVICE_CRN_ENV: &str = "IBM_SERVICE_CRN";

/// How a session reaches its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// IBM Quantum Platform (cloud API, IAM API key + CRN).
    IbmQuantumPlatform,
    /// IBM Cloud; same wire protocol as the platform channel.
    IbmCloud,
    /// Legacy IBM Quantum endpoint with a bearer token.
    IbmQuantum,
    /// In-process simulator, no credentials.
    Local,
}

impl Channel {
    /// The channel's configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::IbmQuantumPlatform => "ibm_quantum_platform",
            Channel::IbmCloud => "ibm_cloud",
            Channel::IbmQuantum => "ibm_quantum",
            Channel::Local => "local",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ibm_quantum_platform" => Ok(Channel::IbmQuantumPlatform),
            "ibm_cloud" => Ok(Channel::IbmCloud),
            "ibm_quantum" => Ok(Channel::IbmQuantum),
            "local" => Ok(Channel::Local),
            other => Err(HalError::Configuration(format!(
                "unknown channel '{other}' (expected ibm_quantum_platform, ibm_cloud, ibm_quantum or local)"
            ))),
        }
    }
}

/// Secret plus instance identifier for one service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    channel: Channel,
    token: String,
    instance: Option<String>,
}

impl Credentials {
    /// Credentials for `channel` authenticated by `token`.
    ///
    /// For IAM channels `token` is the API key; otherwise it is the bearer token.
    pub fn new(channel: Channel, token: impl Into<String>) -> Self {
        Self {
            channel,
            token: token.into(),
            instance: None,
        }
    }

    /// Credentials for the in-process simulator.
    pub fn local() -> Self {
        Self::new(Channel::Local, "")
    }

    /// Set the service instance (CRN).
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// The channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The API key or bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The service instance, if any.
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Pick credentials from whatever sources were found.
    ///
    /// Without an explicit channel an API key selects the platform channel
    /// and a bare token selects the legacy one.
    pub fn resolve(
        channel: Option<Channel>,
        api_key: Option<String>,
        legacy_token: Option<String>,
        instance: Option<String>,
    ) -> HalResult<Self> {
        let api_key = api_key.filter(|s| !s.trim().is_empty());
        let legacy_token = legacy_token.filter(|s| !s.trim().is_empty());
        let instance = instance.filter(|s| !s.trim().is_empty());

        let channel = match channel {
            Some(channel) => channel,
            None if api_key.is_some() => Channel::IbmQuantumPlatform,
            None if legacy_token.is_some() => Channel::IbmQuantum,
            None => {
                return Err(HalError::Auth(format!(
                    "no credentials found: set {IBM_API_KEY_ENV} and {IBM_SERVICE_CRN_ENV}, or {IBM_QUANTUM_TOKEN_ENV}"
                )));
            }
        };

        let credentials = match channel {
            Channel::Local => return Ok(Self::local()),
            Channel::IbmQuantumPlatform | Channel::IbmCloud => {
                let key = api_key.ok_or_else(|| {
                    HalError::Auth(format!("{IBM_API_KEY_ENV} is required for channel {channel}"))
                })?;
                let crn = instance.ok_or_else(|| {
                    HalError::Auth(format!(
                        "{IBM_SERVICE_CRN_ENV} is required for channel {channel}"
                    ))
                })?;
                Self::new(channel, key).with_instance(crn)
            }
            Channel::IbmQuantum => {
                let token = legacy_token.ok_or_else(|| {
                    HalError::Auth(format!(
                        "{IBM_QUANTUM_TOKEN_ENV} is required for channel {channel}"
                    ))
                })?;
                let mut credentials = Self::new(channel, token);
                credentials.instance = instance;
                credentials
            }
        };
        Ok(credentials)
    }

    /// Resolve credentials from the process environment.
    pub fn from_env(channel: Option<Channel>) -> HalResult<Self> {
        Self::resolve(
            channel,
            std::env::var(IBM_API_KEY_ENV).ok(),
            std::env::var(IBM_QUANTUM_TOKEN_ENV).ok(),
            std::env::var(IBM_SERVICE_CRN_ENV).ok(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("channel", &self.channel)
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .finish()
    }
}
