//! Configuration management for taskdeck.
//!
//! Loads configuration from ${TASKDECK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Env var overriding `[backend] url`.
pub const URL_ENV: &str = "TASKDECK_URL";
/// Env var overriding `[backend] anon_key`.
pub const ANON_KEY_ENV: &str = "TASKDECK_ANON_KEY";

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments/sections from the template are always present,
/// while the user's customized values are preserved.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;
    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for taskdeck configuration and data directories.
    //!
    //! TASKDECK_HOME resolution order:
    //! 1. TASKDECK_HOME environment variable (if set)
    //! 2. ~/.config/taskdeck (default)

    use std::path::PathBuf;

    /// Returns the user's home directory, if it can be determined.
    pub fn home_dir() -> Option<PathBuf> {
        dirs::home_dir()
    }

    /// Returns the taskdeck home directory.
    ///
    /// Checks TASKDECK_HOME env var first, falls back to ~/.config/taskdeck
    /// (or ./.taskdeck when no home directory exists).
    pub fn taskdeck_home() -> PathBuf {
        if let Ok(home) = std::env::var("TASKDECK_HOME") {
            return PathBuf::from(home);
        }

        home_dir().map_or_else(
            || PathBuf::from(".taskdeck"),
            |h| h.join(".config").join("taskdeck"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        taskdeck_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        taskdeck_home().join("session.json")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        taskdeck_home().join("logs")
    }
}

/// Backend connection settings as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL (e.g. `https://<ref>.supabase.co`).
    pub url: Option<String>,
    /// Public anon key.
    pub anon_key: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when TASKDECK_LOG is unset.
    pub level: String,
    /// Optional log file override.
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Config::DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the remote table holding tasks.
    pub tasks_table: String,

    /// Backend connection settings.
    pub backend: BackendConfig,

    /// Logging settings.
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_table: Self::DEFAULT_TASKS_TABLE.to_string(),
            backend: BackendConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Fully resolved backend settings (env and config applied, URL validated).
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: Url,
    pub anon_key: String,
    pub tasks_table: String,
}

impl Config {
    const DEFAULT_TASKS_TABLE: &str = "tasks";
    const DEFAULT_LOG_LEVEL: &str = "info";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves backend settings with precedence: env > config.
    pub fn backend_settings(&self) -> Result<BackendSettings> {
        self.backend_settings_with(
            std::env::var(URL_ENV).ok().as_deref(),
            std::env::var(ANON_KEY_ENV).ok().as_deref(),
        )
    }

    /// Resolves backend settings from explicit env values.
    pub fn backend_settings_with(
        &self,
        env_url: Option<&str>,
        env_anon_key: Option<&str>,
    ) -> Result<BackendSettings> {
        let url = pick(env_url, self.backend.url.as_deref()).with_context(|| {
            format!("No backend URL configured. Set {URL_ENV} or url in [backend].")
        })?;
        let anon_key = pick(env_anon_key, self.backend.anon_key.as_deref()).with_context(|| {
            format!("No backend anon key configured. Set {ANON_KEY_ENV} or anon_key in [backend].")
        })?;
        let url = Url::parse(&url).with_context(|| format!("Invalid backend URL: {url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Invalid backend URL scheme: {}", url.scheme());
        }

        Ok(BackendSettings {
            url,
            anon_key,
            tasks_table: self.tasks_table.clone(),
        })
    }

    /// Returns the log file path (config override or `<home>/logs/taskdeck.log`).
    pub fn log_file(&self) -> PathBuf {
        self.log
            .file
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| paths::logs_dir().join("taskdeck.log"), PathBuf::from)
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves the `[backend]` table to the default config file.
    pub fn save_backend(url: &str, anon_key: &str) -> Result<()> {
        Self::save_backend_to(&paths::config_path(), url, anon_key)
    }

    /// Saves only the `[backend]` values to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    pub fn save_backend_to(path: &Path, url: &str, anon_key: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        Url::parse(url).with_context(|| format!("Invalid backend URL: {url}"))?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["backend"]["url"] = value(url);
        doc["backend"]["anon_key"] = value(anon_key);

        Self::write_config(path, &doc.to_string())
    }

    fn write_config(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// First non-blank value, trimmed.
fn pick(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.tasks_table, "tasks");
        assert_eq!(config.log.level, "info");
        assert!(config.backend.url.is_none());
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config.tasks_table, "tasks");
        assert!(config.backend.anon_key.is_none());
    }

    #[test]
    fn env_values_take_precedence_over_config() {
        let config = Config {
            backend: BackendConfig {
                url: Some("https://config.example.com".into()),
                anon_key: Some("config-key".into()),
            },
            ..Config::default()
        };

        let settings = config
            .backend_settings_with(Some("https://env.example.com"), None)
            .unwrap();
        assert_eq!(settings.url.as_str(), "https://env.example.com/");
        assert_eq!(settings.anon_key, "config-key");
    }

    #[test]
    fn blank_env_value_falls_back_to_config() {
        let config = Config {
            backend: BackendConfig {
                url: Some("https://config.example.com".into()),
                anon_key: Some("config-key".into()),
            },
            ..Config::default()
        };

        let settings = config.backend_settings_with(Some("  "), Some("")).unwrap();
        assert_eq!(settings.url.host_str(), Some("config.example.com"));
    }

    #[test]
    fn missing_backend_url_is_an_error() {
        let err = Config::default()
            .backend_settings_with(None, Some("key"))
            .unwrap_err();
        assert!(err.to_string().contains(URL_ENV));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = Config::default()
            .backend_settings_with(Some("ftp://example.com"), Some("key"))
            .unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn init_fails_if_file_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path).unwrap();
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn save_backend_preserves_other_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tasks_table = \"todos\"\n").unwrap();

        Config::save_backend_to(&path, "https://abc.supabase.co", "anon").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[log]"));
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tasks_table, "todos");
        assert_eq!(
            config.backend.url.as_deref(),
            Some("https://abc.supabase.co")
        );
        assert_eq!(config.backend.anon_key.as_deref(), Some("anon"));
    }
}
