//! TOML configuration file loading
//!
//! Supports `~/.config/shutter-gateway/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Home-automation backend configuration
    #[serde(default)]
    pub backend: BackendFileConfig,

    /// Conversational skill configuration
    #[serde(default)]
    pub skill: SkillFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Data directory (database)
    pub data_dir: Option<String>,
}

/// Backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// API base URL
    pub base_url: Option<String>,

    /// Static access token used when a request carries none
    pub access_token: Option<String>,

    /// Home to operate on (defaults to the first listed home)
    pub home_id: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Retry attempts after the first failure
    pub max_retries: Option<u32>,

    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: Option<u64>,

    /// Backoff cap in milliseconds
    pub retry_max_delay_ms: Option<u64>,
}

/// Skill configuration
#[derive(Debug, Default, Deserialize)]
pub struct SkillFileConfig {
    /// Locale used when a request does not name a supported one
    pub default_locale: Option<String>,

    /// Web app address spoken during setup
    pub setup_url: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GatewayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> GatewayConfigFile {
    let Some(path) = config_file_path() else {
        return GatewayConfigFile::default();
    };

    if !path.exists() {
        return GatewayConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config file, using defaults"
            );
            GatewayConfigFile::default()
        }),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            GatewayConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config(content: &str) -> crate::Result<GatewayConfigFile> {
    let config = toml::from_str(content)?;
    Ok(config)
}

/// Return the config file path: `~/.config/shutter-gateway/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("shutter-gateway").join("config.toml"))
}
