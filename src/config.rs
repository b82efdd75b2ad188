use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Nano node RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node host name or address
    pub host: String,
    /// Node RPC port
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Largest history batch requested while looking for the last known transaction
    pub max_history_batch: u32,
}

/// Email delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Send emails; when false notifications are only logged
    pub enabled: bool,
    /// HTTP mail relay endpoint
    pub relay_url: String,
    /// Sender address for received transaction notifications
    pub received_from: String,
    /// Sender address for pending transaction notifications
    pub pending_from: String,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between poll cycles
    pub poll_interval_seconds: u64,
    /// Where last-known account state is kept between polls
    pub state_path: String,
    #[serde(default)]
    pub accounts: Vec<WatchedAccount>,
}

/// An account to watch and who to tell about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedAccount {
    pub account: String,
    pub emails: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Structured line format (json, pretty)
    pub format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7076,
            timeout_seconds: 30,
            max_history_batch: 1000,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relay_url: "http://127.0.0.1:8025/send".to_string(),
            received_from: "received@nanotify.co".to_string(),
            pending_from: "pending@nanotify.co".to_string(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            state_path: "./notifier-state.json".to_string(),
            accounts: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl NodeConfig {
    /// Full RPC endpoint URL
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_string(),
            None => env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string()),
        };

        let mut config = Self::load_from_file(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    pub fn load_from_file(config_path: &str) -> Result<Self, ConfigError> {
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Node configuration
        if let Ok(host) = env::var("NODE_HOST") {
            self.node.host = host;
        }
        if let Some(port) = parse_env("NODE_PORT")? {
            self.node.port = port;
        }
        if let Some(timeout) = parse_env("NODE_TIMEOUT_SECONDS")? {
            self.node.timeout_seconds = timeout;
        }
        if let Some(max_batch) = parse_env("MAX_HISTORY_BATCH")? {
            self.node.max_history_batch = max_batch;
        }

        // Email configuration
        if let Some(enabled) = parse_env("EMAIL_ENABLED")? {
            self.email.enabled = enabled;
        }
        if let Ok(relay_url) = env::var("EMAIL_RELAY_URL") {
            self.email.relay_url = relay_url;
        }

        // Watcher configuration
        if let Some(interval) = parse_env("POLL_INTERVAL")? {
            self.watcher.poll_interval_seconds = interval;
        }
        if let Ok(state_path) = env::var("STATE_PATH") {
            self.watcher.state_path = state_path;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "node.host".to_string(),
                value: self.node.host.clone(),
            });
        }

        if self.node.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "node.port".to_string(),
                value: self.node.port.to_string(),
            });
        }

        if self.node.timeout_seconds == 0 || self.node.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "node.timeout_seconds".to_string(),
                value: self.node.timeout_seconds.to_string(),
            });
        }

        // At least the initial history batch must fit
        if self.node.max_history_batch < crate::monitor::diff::INITIAL_HISTORY_BATCH {
            return Err(ConfigError::InvalidValue {
                key: "node.max_history_batch".to_string(),
                value: self.node.max_history_batch.to_string(),
            });
        }

        if self.email.enabled
            && !self.email.relay_url.starts_with("http://")
            && !self.email.relay_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidUrl(self.email.relay_url.clone()));
        }

        for (key, address) in [
            ("email.received_from", &self.email.received_from),
            ("email.pending_from", &self.email.pending_from),
        ] {
            if !address.contains('@') {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: address.clone(),
                });
            }
        }

        if self.watcher.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "watcher.poll_interval_seconds".to_string(),
                value: self.watcher.poll_interval_seconds.to_string(),
            });
        }

        if self.watcher.state_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "watcher.state_path".to_string(),
                value: self.watcher.state_path.clone(),
            });
        }

        for watched in &self.watcher.accounts {
            if watched.account.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "watcher.accounts.account".to_string(),
                    value: watched.account.clone(),
                });
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Defaults plus one example watched account
    pub fn sample() -> Self {
        let mut config = Self::default();
        config.watcher.accounts.push(WatchedAccount {
            account: "xrb_3t6k35gi95xu6tergt6p69ck76ogmitsa8mnijtpxm9fkcm736xtoncuohr3".to_string(),
            emails: vec!["you@example.com".to_string()],
        });
        config
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::sample()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.node.endpoint(), "http://127.0.0.1:7076");
        assert_eq!(config.node.max_history_batch, 1000);
        assert!(!config.email.enabled);
        assert_eq!(config.email.received_from, "received@nanotify.co");
        assert_eq!(config.email.pending_from, "pending@nanotify.co");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.node.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.node.max_history_batch = 5;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.email.enabled = true;
        config.email.relay_url = "smtp.example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config = AppConfig::default();
        config.watcher.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("NODE_HOST", "node.internal");
        env::set_var("EMAIL_ENABLED", "true");
        env::set_var("MAX_HISTORY_BATCH", "200");
        env::set_var("LOG_LEVEL", "debug");

        let mut config = AppConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.node.endpoint(), "http://node.internal:7076");
        assert!(config.email.enabled);
        assert_eq!(config.node.max_history_batch, 200);
        assert_eq!(config.logging.level, "debug");

        env::remove_var("NODE_HOST");
        env::remove_var("EMAIL_ENABLED");
        env::remove_var("MAX_HISTORY_BATCH");
        env::remove_var("LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        env::set_var("EMAIL_ENABLED", "sometimes");

        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        env::remove_var("EMAIL_ENABLED");
    }

    #[test]
    #[serial]
    fn test_config_file_loading() {
        let config_content = r#"
[node]
host = "10.0.0.5"
port = 7076
timeout_seconds = 10
max_history_batch = 500

[email]
enabled = true
relay_url = "https://mail.example.com/send"
received_from = "received@example.com"
pending_from = "pending@example.com"

[watcher]
poll_interval_seconds = 15
state_path = "/tmp/state.json"

[[watcher.accounts]]
account = "xrb_1first"
emails = ["a@example.com", "b@example.com"]

[logging]
level = "warn"
format = "pretty"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp_file, config_content.as_bytes()).unwrap();

        let config = AppConfig::load(temp_file.path().to_str()).unwrap();

        assert_eq!(config.node.host, "10.0.0.5");
        assert_eq!(config.node.timeout_seconds, 10);
        assert_eq!(config.node.max_history_batch, 500);
        assert!(config.email.enabled);
        assert_eq!(config.email.received_from, "received@example.com");
        assert_eq!(config.watcher.poll_interval_seconds, 15);
        assert_eq!(config.watcher.accounts.len(), 1);
        assert_eq!(config.watcher.accounts[0].emails.len(), 2);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/notifier.toml").unwrap();
        assert_eq!(config.node.port, 7076);
    }

    #[test]
    fn test_generate_sample_config() {
        let sample = AppConfig::generate_sample_config().unwrap();
        assert!(sample.contains("[node]"));
        assert!(sample.contains("[email]"));
        assert!(sample.contains("[watcher]"));
        assert!(sample.contains("[[watcher.accounts]]"));
        assert!(sample.contains("[logging]"));

        let parsed: AppConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.watcher.accounts[0].emails, vec!["you@example.com".to_string()]);
    }

    #[test]
    #[serial]
    fn test_save_to_file_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notifier.toml");
        let path = path.to_str().unwrap();

        let mut config = AppConfig::sample();
        config.node.host = "10.1.2.3".to_string();
        config.save_to_file(path).unwrap();

        let loaded = AppConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.node.host, "10.1.2.3");
        assert_eq!(loaded.watcher.accounts, config.watcher.accounts);
        assert_eq!(loaded.email.pending_from, "pending@nanotify.co");
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let result = AppConfig::sample().save_to_file("/nonexistent/dir/notifier.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
