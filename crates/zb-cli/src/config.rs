//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use zb_api::{ClientConfig, Credentials, DEFAULT_HOST};
use zb_core::{NormalizeOptions, parse_utc_offset};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account name for the password grant.
    pub username: Option<String>,
    /// Account password for the password grant.
    pub password: Option<String>,
    /// API base URL.
    pub host: String,
    /// Zone that naive timestamps are localized to, e.g. `+01:00`.
    pub utc_offset: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Reject suspicious input instead of repairing it with a warning.
    pub strict: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("utc_offset", &self.utc_offset)
            .field("timeout_secs", &self.timeout_secs)
            .field("strict", &self.strict)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            host: DEFAULT_HOST.to_string(),
            utc_offset: "+00:00".to_string(),
            timeout_secs: 60,
            strict: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ZB_*)
        figment = figment.merge(Env::prefixed("ZB_"));

        figment.extract()
    }

    /// Picks the grant: password when both account fields are set,
    /// client credentials when neither is.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::password(username, password)),
            (None, None) => Ok(Credentials::ClientCredentials),
            (Some(_), None) => anyhow::bail!("password is not configured (set ZB_PASSWORD)"),
            (None, Some(_)) => anyhow::bail!("username is not configured (set ZB_USERNAME)"),
        }
    }

    pub fn normalize_options(&self) -> Result<NormalizeOptions> {
        let zone = parse_utc_offset(&self.utc_offset)
            .with_context(|| format!("invalid utc_offset {:?}", self.utc_offset))?;
        Ok(NormalizeOptions::new(zone).with_strict(self.strict))
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be at least 1");
        }
        Ok(ClientConfig {
            host: self.host.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            strict_limits: self.strict,
        })
    }
}

/// Returns the platform-specific config directory for zb.
///
/// On Linux: `~/.config/zb`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("zb"))
}
