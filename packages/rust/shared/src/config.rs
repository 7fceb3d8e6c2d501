//! Application configuration for babelwiki.
//!
//! User config lives at `~/.babelwiki/babelwiki.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BabelWikiError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "babelwiki.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".babelwiki";

// ---------------------------------------------------------------------------
// Config structs (matching babelwiki.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI-compatible generation settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum keywords shown on the index page.
    #[serde(default = "default_index_limit")]
    pub index_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            index_limit: default_index_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_index_limit() -> u32 {
    50
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file. `~` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.babelwiki/babelwiki.db".into()
}

impl StorageConfig {
    /// Resolve the configured path, expanding a leading `~`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| BabelWikiError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        } else {
            Ok(PathBuf::from(&self.db_path))
        }
    }
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for article and summary generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature — creative but consistent mid-range.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output length bound per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Encourages mentioning new concepts.
    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f32,

    /// Discourages repetition.
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,

    /// Outer timeout applied to each generation call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            presence_penalty: default_presence_penalty(),
            frequency_penalty: default_frequency_penalty(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_presence_penalty() -> f32 {
    0.6
}
fn default_frequency_penalty() -> f32 {
    0.6
}
fn default_request_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.babelwiki/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BabelWikiError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.babelwiki/babelwiki.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BabelWikiError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BabelWikiError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BabelWikiError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BabelWikiError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BabelWikiError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the configured env var.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BabelWikiError::config(format!(
            "OpenAI API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.openai.model, "gpt-4o");
        assert_eq!(parsed.openai.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[server]
port = 9000

[openai]
model = "gpt-4o-mini"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.max_tokens, 2000);
    }

    #[test]
    fn sampling_defaults_are_stable() {
        let config = OpenAiConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.presence_penalty, 0.6);
        assert_eq!(config.frequency_penalty, 0.6);
    }

    #[test]
    fn db_path_without_tilde_passes_through() {
        let storage = StorageConfig {
            db_path: "/tmp/wiki.db".into(),
        };
        assert_eq!(
            storage.resolved_db_path().unwrap(),
            PathBuf::from("/tmp/wiki.db")
        );
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openai.api_key_env = "BW_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
