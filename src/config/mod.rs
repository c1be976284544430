//! Configuration management for the shutter gateway
//!
//! Values resolve env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::backend::RetryPolicy;
use crate::locale::Locale;
use crate::Result;

/// Default backend API base URL
pub const DEFAULT_BACKEND_URL: &str = "https://app.velux-active.com";

/// Default API server port
pub const DEFAULT_PORT: u16 = 18790;

/// Default web app address spoken during setup
pub const DEFAULT_SETUP_URL: &str = "alexa.t-h.cc";

/// Shutter gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database)
    pub data_dir: PathBuf,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Home-automation backend configuration
    pub backend: BackendConfig,

    /// Conversational skill configuration
    pub skill: SkillConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Home-automation backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API base URL
    pub base_url: String,

    /// Access token used when a request carries no bearer token
    pub access_token: Option<SecretString>,

    /// Home to operate on; the first listed home when unset
    pub home_id: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry policy applied to every backend call
    pub retry: RetryPolicy,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            access_token: None,
            home_id: None,
            timeout: Duration::from_secs(8),
            retry: RetryPolicy::default(),
        }
    }
}

/// Conversational skill configuration
#[derive(Debug, Clone)]
pub struct SkillConfig {
    /// Locale used when a request names an unsupported one
    pub default_locale: Locale,

    /// Web app address spoken during setup
    pub setup_url: String,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            setup_url: DEFAULT_SETUP_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let api_server = ApiServerConfig {
            port: env_var("SHUTTER_PORT")
                .or_else(|| env_var("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let defaults = BackendConfig::default();
        let retry_defaults = RetryPolicy::default();
        let backend = BackendConfig {
            base_url: env_var("SHUTTER_BACKEND_URL")
                .or(fc.backend.base_url)
                .unwrap_or(defaults.base_url),
            access_token: env_var("SHUTTER_BACKEND_TOKEN")
                .or(fc.backend.access_token)
                .map(SecretString::from),
            home_id: env_var("SHUTTER_HOME_ID").or(fc.backend.home_id),
            timeout: env_var("SHUTTER_BACKEND_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .or(fc.backend.timeout_secs)
                .map_or(defaults.timeout, Duration::from_secs),
            retry: RetryPolicy {
                max_retries: env_var("SHUTTER_BACKEND_RETRIES")
                    .and_then(|s| s.parse().ok())
                    .or(fc.backend.max_retries)
                    .unwrap_or(retry_defaults.max_retries),
                base_delay: fc
                    .backend
                    .retry_base_delay_ms
                    .map_or(retry_defaults.base_delay, Duration::from_millis),
                max_delay: fc
                    .backend
                    .retry_max_delay_ms
                    .map_or(retry_defaults.max_delay, Duration::from_millis),
            },
        };

        let default_locale = env_var("SHUTTER_DEFAULT_LOCALE")
            .or(fc.skill.default_locale)
            .map_or_else(Locale::default, |tag| {
                Locale::parse(&tag).unwrap_or_else(|| {
                    tracing::warn!(locale = %tag, "unsupported default locale, using de-DE");
                    Locale::default()
                })
            });
        let skill = SkillConfig {
            default_locale,
            setup_url: env_var("SHUTTER_SETUP_URL")
                .or(fc.skill.setup_url)
                .unwrap_or_else(|| DEFAULT_SETUP_URL.to_string()),
        };

        // Data directory (~/.local/share/shutter-gateway on Linux)
        let data_dir = env_var("SHUTTER_DATA_DIR")
            .or(fc.server.data_dir)
            .map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from("."),
                        |d| d.data_dir().join("shutter-gateway"),
                    )
                },
                PathBuf::from,
            );
        std::fs::create_dir_all(&data_dir)?;

        if backend.access_token.is_none() {
            tracing::debug!("no static backend token configured, relying on request tokens");
        }

        Ok(Self {
            data_dir,
            api_server,
            backend,
            skill,
        })
    }

    /// Path of the `SQLite` database
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("shutter.db")
    }
}

/// Read a non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
