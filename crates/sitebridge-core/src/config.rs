//! Configuration: a JSON file, environment overrides and a default path.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{ConfigError, Error};
use crate::expiry::ExpiryHeuristic;
use crate::types::BaseUrl;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SITEBRIDGE_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;

/// A site the bridge logs into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Export,
    Tracking,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Export => "export",
            Target::Tracking => "tracking",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            Target::Export => "SITEBRIDGE_EXPORT",
            Target::Tracking => "SITEBRIDGE_TRACKING",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "export" => Ok(Target::Export),
            "tracking" => Ok(Target::Tracking),
            other => Err(ConfigError::InvalidValue {
                field: "target".to_string(),
                reason: format!("unknown target '{other}'"),
            }),
        }
    }
}

/// Login settings for one target.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    #[serde(alias = "username", alias = "email")]
    pub identifier: Option<String>,
    #[serde(alias = "password")]
    pub secret: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub export: TargetConfig,
    pub tracking: TargetConfig,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub expire_on_parse_failure: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            export: TargetConfig::default(),
            tracking: TargetConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            expire_on_parse_failure: true,
        }
    }
}

impl BridgeConfig {
    /// Platform config path, e.g. `~/.config/sitebridge/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sitebridge").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Pick the config path: explicit flag, then `SITEBRIDGE_CONFIG`, then the
    /// platform default.
    pub fn resolve_path<F>(explicit: Option<PathBuf>, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        explicit
            .or_else(|| lookup(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(Self::default_path)
    }

    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` (if any) and apply the process environment on top.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `SITEBRIDGE_*` variables read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for target in [Target::Export, Target::Tracking] {
            let prefix = target.env_prefix();
            let section = self.target_mut(target);
            if let Some(value) = lookup(&format!("{prefix}_IDENTIFIER")) {
                section.identifier = Some(value);
            }
            if let Some(value) = lookup(&format!("{prefix}_SECRET")) {
                section.secret = Some(value);
            }
            if let Some(value) = lookup(&format!("{prefix}_BASE_URL")) {
                section.base_url = Some(value);
            }
        }

        if let Some(value) = lookup("SITEBRIDGE_TIMEOUT_SECS") {
            self.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                reason: format!("'{value}' is not a number of seconds"),
            })?;
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn target(&self, target: Target) -> &TargetConfig {
        match target {
            Target::Export => &self.export,
            Target::Tracking => &self.tracking,
        }
    }

    fn target_mut(&mut self, target: Target) -> &mut TargetConfig {
        match target {
            Target::Export => &mut self.export,
            Target::Tracking => &mut self.tracking,
        }
    }

    /// Credentials for `target`. Blank values count as missing.
    pub fn credentials(&self, target: Target) -> Result<Credentials, ConfigError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|s| !s.trim().is_empty())
        }

        let section = self.target(target);

        match (present(&section.identifier), present(&section.secret)) {
            (Some(identifier), Some(secret)) => Ok(Credentials::new(identifier, secret)),
            _ => Err(ConfigError::MissingCredentials {
                target: target.to_string(),
            }),
        }
    }

    /// Configured base URL for `target`, if any.
    pub fn base_url(&self, target: Target) -> Result<Option<BaseUrl>, Error> {
        self.target(target)
            .base_url
            .as_deref()
            .map(BaseUrl::new)
            .transpose()
    }

    /// Request timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn heuristic(&self) -> ExpiryHeuristic {
        ExpiryHeuristic::default().with_parse_failure_as_expiry(self.expire_on_parse_failure)
    }
}
