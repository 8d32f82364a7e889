//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use support_db::StoreSettings;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Schema provisioning settings.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Database name; resolved to a SQLite file by [`StoreSettings::database_path`].
    #[serde(default = "default_db_name")]
    pub name: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Schema provisioning configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// Skip the first-request schema pass entirely.
    #[serde(default)]
    pub skip_init: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "support_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    10000
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_db_name() -> String {
    "support_db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

impl DatabaseConfig {
    /// Connection settings for the database layer.
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            name: self.name.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Interprets a boolean-like setting: `1`, `true`, or `yes` (any case) are
/// true, everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SUPPORT_HOST` overrides `server.host`
/// - `SUPPORT_PORT` overrides `server.port`
/// - `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` override the matching
///   `database` keys
/// - `DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `SKIP_DB_INIT` overrides `schema.skip_init` (`1`/`true`/`yes`)
/// - `SUPPORT_LOG_LEVEL` overrides `logging.level`
/// - `SUPPORT_LOG_JSON` overrides `logging.json` (`1`/`true`/`yes`)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], reading overrides through `env` instead of the
/// process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config_with<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = env("SUPPORT_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = env("SUPPORT_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(host) = env("DB_HOST") {
        config.database.host = host;
    }
    if let Some(user) = env("DB_USER") {
        config.database.user = user;
    }
    if let Some(password) = env("DB_PASSWORD") {
        config.database.password = password;
    }
    if let Some(name) = env("DB_NAME") {
        config.database.name = name;
    }
    if let Some(timeout) = env("DB_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = timeout.parse() {
            config.database.busy_timeout_ms = parsed;
        }
    }
    if let Some(skip) = env("SKIP_DB_INIT") {
        config.schema.skip_init = parse_flag(&skip);
    }
    if let Some(level) = env("SUPPORT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("SUPPORT_LOG_JSON") {
        config.logging.json = parse_flag(&json);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = load_config_with(None, env_from(&[])).unwrap();
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.user, "root");
        assert_eq!(config.database.password, "");
        assert_eq!(config.database.name, "support_db");
        assert!(!config.schema.skip_init);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_with(path.to_str(), env_from(&[])).unwrap();
        assert_eq!(config.server.port, 10000);
    }

    #[test]
    fn file_values_are_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[database]\nname = \"helpdesk\"\n\n[schema]\nskip_init = true\n"
        )
        .unwrap();

        let config = load_config_with(file.path().to_str(), env_from(&[])).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.name, "helpdesk");
        assert_eq!(config.database.user, "root");
        assert!(config.schema.skip_init);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = load_config_with(file.path().to_str(), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nname = \"from_file\"\n").unwrap();

        let env = env_from(&[
            ("SUPPORT_HOST", "0.0.0.0"),
            ("SUPPORT_PORT", "9000"),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "support"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "from_env"),
            ("DB_BUSY_TIMEOUT_MS", "250"),
            ("SKIP_DB_INIT", "YES"),
            ("SUPPORT_LOG_LEVEL", "debug"),
            ("SUPPORT_LOG_JSON", "1"),
        ]);
        let config = load_config_with(file.path().to_str(), env).unwrap();

        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.user, "support");
        assert_eq!(config.database.password, "s3cret");
        assert_eq!(config.database.name, "from_env");
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert!(config.schema.skip_init);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn unparsable_overrides_are_ignored() {
        let env = env_from(&[("SUPPORT_PORT", "not-a-port"), ("SUPPORT_HOST", "nope")]);
        let config = load_config_with(None, env).unwrap();
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.server.host, default_host());
    }

    #[test]
    fn parse_flag_accepts_documented_values() {
        for value in ["1", "true", "TRUE", "yes", "Yes", " true "] {
            assert!(parse_flag(value), "{value:?} should be true");
        }
        for value in ["0", "false", "no", "", "on", "y"] {
            assert!(!parse_flag(value), "{value:?} should be false");
        }
    }

    #[test]
    fn skip_flag_can_be_turned_off_by_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schema]\nskip_init = true\n").unwrap();
        let config =
            load_config_with(file.path().to_str(), env_from(&[("SKIP_DB_INIT", "0")])).unwrap();
        assert!(!config.schema.skip_init);
    }

    #[test]
    fn store_settings_carry_database_values() {
        let config = load_config_with(None, env_from(&[("DB_NAME", "helpdesk")])).unwrap();
        let settings = config.database.store_settings();
        assert_eq!(settings.name, "helpdesk");
        assert_eq!(settings.database_path(), "helpdesk.db");
        assert_eq!(settings.busy_timeout_ms, 5_000);
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = load_config_with(None, env_from(&[("DB_PASSWORD", "s3cret")])).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
