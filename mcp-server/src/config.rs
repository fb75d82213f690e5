use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
}

/// TickTick account and open-platform app credentials. All five are
/// required; they normally arrive via the `.env` file.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (pretty, json, compact)
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional config
    /// file and environment variables.
    pub fn from_env() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        builder = builder.add_source(File::from_str(
            include_str!("../config/default.toml"),
            FileFormat::Toml,
        ));

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(
                File::with_name(&config_file)
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("TICKTICK_MCP")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut result: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Self::apply_standard_env_vars(&mut result);

        Ok(result)
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from_str(
                include_str!("../config/default.toml"),
                FileFormat::Toml,
            ))
            .add_source(File::with_name(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix("TICKTICK_MCP")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder
            .build()
            .context("Failed to build configuration from file")?;

        let mut result: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration from file")?;

        Self::apply_standard_env_vars(&mut result);

        Ok(result)
    }

    /// Apply the well-known environment variables: the five `TICKTICK_*`
    /// credentials from the `.env` file, plus `LOG_LEVEL`.
    fn apply_standard_env_vars(config: &mut Config) {
        if let Ok(client_id) = env::var("TICKTICK_CLIENT_ID") {
            config.credentials.client_id = client_id;
        }
        if let Ok(client_secret) = env::var("TICKTICK_CLIENT_SECRET") {
            config.credentials.client_secret = client_secret;
        }
        if let Ok(redirect_uri) = env::var("TICKTICK_REDIRECT_URI") {
            config.credentials.redirect_uri = redirect_uri;
        }
        if let Ok(username) = env::var("TICKTICK_USERNAME") {
            config.credentials.username = username;
        }
        if let Ok(password) = env::var("TICKTICK_PASSWORD") {
            config.credentials.password = password;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.logging.level = log_level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ));
            }
        }

        let creds = &self.credentials;
        let missing: Vec<&str> = [
            ("TICKTICK_CLIENT_ID", &creds.client_id),
            ("TICKTICK_CLIENT_SECRET", &creds.client_secret),
            ("TICKTICK_REDIRECT_URI", &creds.redirect_uri),
            ("TICKTICK_USERNAME", &creds.username),
            ("TICKTICK_PASSWORD", &creds.password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "TickTick credentials missing: {}. Add them to the .env file in the \
                 --dotenv-dir directory",
                missing.join(", ")
            ));
        }

        url::Url::parse(&creds.redirect_uri).with_context(|| {
            format!(
                "TICKTICK_REDIRECT_URI is not a valid URL: '{}'",
                creds.redirect_uri
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            credentials: CredentialsConfig {
                client_id: "cid".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://127.0.0.1:8080/cb".into(),
                username: "user@example.com".into(),
                password: "hunter2".into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.credentials.client_id.is_empty());
    }

    #[test]
    fn test_validation_passes_with_credentials() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_reports_missing_credentials() {
        let mut config = valid_config();
        config.credentials.password = String::new();
        config.credentials.username = "  ".into();

        let error = config.validate().unwrap_err().to_string();
        assert!(error.contains("TICKTICK_USERNAME"));
        assert!(error.contains("TICKTICK_PASSWORD"));
        assert!(!error.contains("TICKTICK_CLIENT_ID"));
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let mut config = valid_config();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_redirect_uri() {
        let mut config = valid_config();
        config.credentials.redirect_uri = "not a url".into();
        assert!(config.validate().is_err());
    }
}
