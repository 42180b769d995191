//! User configuration, read from `~/.gvoice` (TOML).
//!
//! ```toml
//! [auth]
//! email = "me@example.com"
//! password = "..."
//! sms_key = "JBSW Y3DP EHPK 3PXP"   # optional TOTP secret for two-step sign-in
//!
//! [gvoice]
//! forwarding_number = "+14155551234"
//! phone_type = 2
//!
//! [service]
//! timeout_secs = 30
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoints::{Endpoints, DEFAULT_ACCOUNTS_URL, DEFAULT_VOICE_URL};
use crate::error::{GvError, Result};

pub const CONFIG_PATH_ENV: &str = "GVOICE_CONFIG";
pub const USER_ENV: &str = "GOOGLE_VOICE_USER";
pub const PASS_ENV: &str = "GOOGLE_VOICE_PASS";
pub const BATCH_ENV: &str = "GOOGLE_VOICE_BATCH";

/// Default config path.
///
/// 1. `GVOICE_CONFIG` env var (tilde-expanded)
/// 2. `~/.gvoice`
/// 3. `./.gvoice` when there is no home directory
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(shellexpand::tilde(&path).to_string());
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gvoice")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub gvoice: CallConfig,
    pub service: ServiceConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Base32 TOTP secret used to answer SMS verification automatically.
    pub sms_key: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("sms_key", &self.sms_key.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Defaults for placing calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub forwarding_number: Option<String>,
    pub phone_type: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub accounts_url: String,
    pub voice_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Wait between SMS verification attempts.
    pub sms_retry_delay_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            voice_url: DEFAULT_VOICE_URL.to_string(),
            user_agent: format!("gvoice/{} Rust", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            sms_retry_delay_secs: 10,
        }
    }
}

impl ServiceConfig {
    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(&self.accounts_url, &self.voice_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sms_retry_delay(&self) -> Duration {
        Duration::from_secs(self.sms_retry_delay_secs)
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            GvError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| GvError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from the default path, then apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let mut config = Self::load(default_config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Override credentials from `GOOGLE_VOICE_USER` / `GOOGLE_VOICE_PASS`.
    ///
    /// Takes the lookup as a closure so callers (and tests) choose the source.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup(USER_ENV).filter(|v| !v.is_empty()) {
            self.auth.email = Some(email);
        }
        if let Some(password) = lookup(PASS_ENV).filter(|v| !v.is_empty()) {
            self.auth.password = Some(password);
        }
    }
}

/// `GOOGLE_VOICE_BATCH` accepts `1`, `true`, `yes` (case-insensitive).
pub fn env_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            [auth]
            email = "me@example.com"
            password = "hunter2"

            [gvoice]
            forwarding_number = "+14155551234"
            phone_type = 2

            [service]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.email.as_deref(), Some("me@example.com"));
        assert_eq!(config.gvoice.forwarding_number.as_deref(), Some("+14155551234"));
        assert_eq!(config.gvoice.phone_type, Some(2));
        assert_eq!(config.service.timeout(), Duration::from_secs(5));
        // Unspecified keys keep their defaults
        assert_eq!(config.service.voice_url, DEFAULT_VOICE_URL);
        assert_eq!(config.service.sms_retry_delay_secs, 10);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("[auth\nemail = ").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("nope")).unwrap();
        assert!(config.auth.email.is_none());
        assert_eq!(config.service.accounts_url, DEFAULT_ACCOUNTS_URL);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvoice.toml");
        std::fs::write(&path, "phone_type = [").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, GvError::Config(_)));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let env: HashMap<&str, &str> = [(USER_ENV, "env@example.com"), (PASS_ENV, "")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config.auth.password = Some("from-file".into());
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.auth.email.as_deref(), Some("env@example.com"));
        // Empty values don't clobber the file
        assert_eq!(config.auth.password.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthConfig {
            email: Some("me@example.com".into()),
            password: Some("hunter2".into()),
            sms_key: None,
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("me@example.com"));
    }

    #[test]
    fn test_env_flag() {
        assert!(env_flag(Some("true")));
        assert!(env_flag(Some("1")));
        assert!(!env_flag(Some("0")));
        assert!(!env_flag(None));
    }
}
