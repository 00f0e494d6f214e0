//! Configuration for the xprobe CLI.
//!
//! Settings are layered, highest precedence first:
//! 1. Environment variables (`XPROBE_*`, plus the IBM credential variables)
//! 2. A `.env` file in the working directory
//! 3. The YAML config file (`--config`, or `~/.xprobe/config.yaml` if present)
//! 4. Default values
//!
//! The config file is only ever read. Secrets may live in its `account`
//! section, but the environment is the preferred place for them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use xprobe_hal::auth::{IBM_API_KEY_ENV, IBM_QUANTUM_TOKEN_ENV, IBM_SERVICE_CRN_ENV};
use xprobe_hal::{Channel, Credentials, HalResult, WaitOptions};

/// Environment variable selecting the channel.
pub const CHANNEL_ENV: &str = "XPROBE_CHANNEL";
/// Environment variable overriding the API endpoint.
pub const ENDPOINT_ENV: &str = "XPROBE_ENDPOINT";
/// Environment variable for the poll interval in seconds.
pub const POLL_INTERVAL_ENV: &str = "XPROBE_POLL_INTERVAL";
/// Environment variable for the wait timeout in seconds.
pub const TIMEOUT_ENV: &str = "XPROBE_TIMEOUT";
/// Environment variable for the log level.
pub const LOG_LEVEL_ENV: &str = "XPROBE_LOG_LEVEL";

/// Complete CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XprobeConfig {
    /// Channel to connect through; inferred from the credentials when unset.
    #[serde(default)]
    pub channel: Option<Channel>,

    /// Runtime API endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// IAM token endpoint override.
    #[serde(default)]
    pub iam_url: Option<String>,

    /// Seconds between job status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up waiting after this many seconds and cancel the job.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Estimator error mitigation level (0-2).
    #[serde(default)]
    pub resilience_level: Option<u8>,

    /// Log level used when no `-v` flag is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Account secrets.
    #[serde(default)]
    pub account: AccountConfig,
}

/// Service account settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// IBM Cloud API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Legacy IBM Quantum token.
    #[serde(default)]
    pub token: Option<String>,

    /// Service instance CRN (or hub/group/project on the legacy channel).
    #[serde(default)]
    pub instance: Option<String>,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("AccountConfig")
            .field("api_key", &redact(&self.api_key))
            .field("token", &redact(&self.token))
            .field("instance", &self.instance)
            .finish()
    }
}

fn default_poll_interval() -> u64 {
    2
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for XprobeConfig {
    fn default() -> Self {
        Self {
            channel: None,
            endpoint: None,
            iam_url: None,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: None,
            resilience_level: None,
            log_level: default_log_level(),
            account: AccountConfig::default(),
        }
    }
}

impl XprobeConfig {
    /// Default config file location (`~/.xprobe/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".xprobe").join("config.yaml"))
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;

        let config: XprobeConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the documented precedence.
    ///
    /// An explicit `config_file` must exist; the default location is used
    /// only when present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "Using default config file");
                    Self::from_file(path)?
                }
                None => Self::default(),
            },
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the process environment into this configuration.
    fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge variables from `lookup` into this configuration.
    ///
    /// Only variables that are set override the file-loaded (or default)
    /// values.
    pub fn merge_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup(CHANNEL_ENV) {
            let channel = v
                .parse::<Channel>()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            self.channel = Some(channel);
        }
        if let Some(v) = lookup(ENDPOINT_ENV) {
            self.endpoint = Some(v);
        }
        if let Some(v) = lookup(POLL_INTERVAL_ENV) {
            self.poll_interval_secs = parse_secs(POLL_INTERVAL_ENV, &v)?;
        }
        if let Some(v) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = Some(parse_secs(TIMEOUT_ENV, &v)?);
        }
        if let Some(v) = lookup(LOG_LEVEL_ENV) {
            self.log_level = v;
        }

        // Credentials
        if let Some(v) = lookup(IBM_API_KEY_ENV) {
            self.account.api_key = Some(v);
        }
        if let Some(v) = lookup(IBM_QUANTUM_TOKEN_ENV) {
            self.account.token = Some(v);
        }
        if let Some(v) = lookup(IBM_SERVICE_CRN_ENV) {
            self.account.instance = Some(v);
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0; omit it to wait indefinitely".to_string(),
            ));
        }

        if let Some(level) = self.resilience_level {
            if level > 2 {
                return Err(ConfigError::ValidationError(format!(
                    "resilience_level must be 0, 1 or 2, got {level}"
                )));
            }
        }

        for (field, url) in [("endpoint", &self.endpoint), ("iam_url", &self.iam_url)] {
            if let Some(url) = url {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "{field} must be an http(s) URL: {url}"
                    )));
                }
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Resolve credentials for the configured remote channel.
    pub fn credentials(&self) -> HalResult<Credentials> {
        Credentials::resolve(
            self.channel,
            self.account.api_key.clone(),
            self.account.token.clone(),
            self.account.instance.clone(),
        )
    }

    /// Polling behaviour derived from this configuration.
    pub fn wait_options(&self) -> WaitOptions {
        let options =
            WaitOptions::default().with_poll_interval(Duration::from_secs(self.poll_interval_secs));
        match self.timeout_secs {
            Some(secs) => options.with_timeout(Duration::from_secs(secs)),
            None => options,
        }
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{var} must be a whole number of seconds, got '{value}'"))
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = XprobeConfig::default();
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.log_level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "channel: ibm_cloud\npoll_interval_secs: 5\ntimeout_secs: 600\nresilience_level: 1\naccount:\n  instance: crn:v1:test"
        )
        .unwrap();

        let config = XprobeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel, Some(Channel::IbmCloud));
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.timeout_secs, Some(600));
        assert_eq!(config.resilience_level, Some(1));
        assert_eq!(config.account.instance.as_deref(), Some("crn:v1:test"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = XprobeConfig::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs: [not, a, number]").unwrap();
        let err = XprobeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resilience_level: 3").unwrap();
        let err = XprobeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = XprobeConfig {
            poll_interval_secs: 10,
            endpoint: Some("https://file.example".into()),
            ..XprobeConfig::default()
        }
        .merge_vars(vars(&[
            (POLL_INTERVAL_ENV, "1"),
            (TIMEOUT_ENV, "30"),
            (CHANNEL_ENV, "ibm_quantum"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.channel, Some(Channel::IbmQuantum));
        assert_eq!(config.endpoint.as_deref(), Some("https://file.example"));
    }

    #[test]
    fn test_env_rejects_bad_numbers_and_channels() {
        let err = XprobeConfig::default()
            .merge_vars(vars(&[(TIMEOUT_ENV, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_ENV));

        let err = XprobeConfig::default()
            .merge_vars(vars(&[(CHANNEL_ENV, "ibm_moon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_credentials_from_env_vars() {
        let config = XprobeConfig::default()
            .merge_vars(vars(&[
                (IBM_API_KEY_ENV, "key"),
                (IBM_SERVICE_CRN_ENV, "crn:v1:bluemix:public:quantum-computing:us-east:a/x:y::"),
            ]))
            .unwrap();

        let creds = config.credentials().unwrap();
        assert_eq!(creds.channel(), Channel::IbmQuantumPlatform);
        assert_eq!(creds.token(), "key");
    }

    #[test]
    fn test_missing_credentials_is_auth_error() {
        let err = XprobeConfig::default().credentials().unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_wait_options() {
        let config = XprobeConfig {
            poll_interval_secs: 3,
            timeout_secs: Some(90),
            ..XprobeConfig::default()
        };
        let options = config.wait_options();
        assert_eq!(options.poll_interval, Duration::from_secs(3));
        assert_eq!(options.timeout, Some(Duration::from_secs(90)));
        assert!(options.cancel_on_timeout);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = XprobeConfig::default();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = XprobeConfig::default();
        config.endpoint = Some("ftp://example".into());
        assert!(config.validate().is_err());

        let mut config = XprobeConfig::default();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = XprobeConfig::default();
        config.account.api_key = Some("super-secret-key".into());
        config.account.token = Some("super-secret-token".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
