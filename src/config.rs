use crate::api::retry::ConnectionRetry;
use crate::wake::WakePolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const STATE_FILE_NAME: &str = "tesla_api.json";

/// Application configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Account email used for the password grant
    #[serde(default)]
    pub email: Option<String>,
    /// Account password (fallback when keychain unavailable)
    /// WARNING: Stored in plaintext - prefer keychain storage
    #[serde(default)]
    pub password: Option<String>,
    /// Where the credential record lives
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub wake: WakeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Retry policy for token exchanges; not user-configurable
    #[serde(skip)]
    pub retry: ConnectionRetry,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            client_id: default_client_id(),
            client_secret: None,
            user_agent: default_user_agent(),
            retry: ConnectionRetry::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// How long an access token is used before it is refreshed
    #[serde(default = "default_lifetime_days")]
    pub lifetime_days: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lifetime_days: default_lifetime_days(),
        }
    }
}

impl TokenConfig {
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lifetime_days))
    }
}

#[derive(Debug, Deserialize)]
pub struct WakeConfig {
    #[serde(default = "default_wake_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_wake_attempts")]
    pub max_attempts: u32,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_wake_interval(),
            max_attempts: default_wake_attempts(),
        }
    }
}

impl WakeConfig {
    pub fn policy(&self) -> WakePolicy {
        WakePolicy::new(Duration::from_secs(self.interval_secs), self.max_attempts)
    }
}

fn default_base_url() -> String {
    "https://owner-api.teslamotors.com/api/1/vehicles".to_string()
}

fn default_token_url() -> String {
    "https://auth.tesla.com/oauth2/v3/token".to_string()
}

fn default_client_id() -> String {
    "ownerapi".to_string()
}

fn default_user_agent() -> String {
    concat!("teslactl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_lifetime_days() -> u32 {
    30
}

fn default_wake_interval() -> u64 {
    5
}

fn default_wake_attempts() -> u32 {
    60
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "teslactl")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Default location of the credential record
    pub fn default_state_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join(STATE_FILE_NAME))
    }

    /// Load config from `path` (or the default location), returning
    /// defaults if the file does not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the state file location: explicit override, config, then default
    pub fn state_path(&self, override_path: Option<PathBuf>) -> Option<PathBuf> {
        override_path
            .or_else(|| self.state_file.clone())
            .or_else(Self::default_state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api.base_url, "https://owner-api.teslamotors.com/api/1/vehicles");
        assert_eq!(config.api.client_id, "ownerapi");
        assert_eq!(config.token.lifetime(), chrono::Duration::days(30));
        assert_eq!(config.wake.interval_secs, 5);
        assert_eq!(config.wake.max_attempts, 60);
        assert!(config.email.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            email = "owner@example.com"
            state_file = "/mutable/tesla_api.json"

            [wake]
            max_attempts = 12

            [api]
            user_agent = "github.com/marcone/teslausb"
            "#,
        )
        .unwrap();

        assert_eq!(config.email.as_deref(), Some("owner@example.com"));
        assert_eq!(config.wake.max_attempts, 12);
        assert_eq!(config.wake.interval_secs, 5);
        assert_eq!(config.api.user_agent, "github.com/marcone/teslausb");
        assert_eq!(config.api.token_url, "https://auth.tesla.com/oauth2/v3/token");
        assert_eq!(
            config.state_path(None),
            Some(PathBuf::from("/mutable/tesla_api.json"))
        );
        assert_eq!(
            config.state_path(Some(PathBuf::from("/tmp/other.json"))),
            Some(PathBuf::from("/tmp/other.json"))
        );
    }

    #[test]
    fn test_missing_file_is_default_and_bad_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Config::load(Some(&missing)).unwrap().email.is_none());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "wake = [").unwrap();
        assert!(Config::load(Some(&bad)).is_err());
    }
}
