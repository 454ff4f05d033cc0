use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub email: String,
    pub zone_id: String,
    pub record_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reads the same fields from `CF_*` environment variables, for
    /// deployments without a config file.
    pub fn from_env() -> Result<Self> {
        let config = Config {
            api_key: required_var("CF_API_KEY")?,
            email: required_var("CF_EMAIL")?,
            zone_id: required_var("CF_ZONE_ID")?,
            record_name: required_var("CF_RECORD_NAME")?,
            log_level: env::var("CF_LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_key", &self.api_key),
            ("email", &self.email),
            ("zone_id", &self.zone_id),
            ("record_name", &self.record_name),
        ] {
            if value.is_empty() {
                bail!("Config field must not be empty: {}", name);
            }
        }
        Ok(())
    }

    /// Form of the API key that is safe to log.
    pub fn masked_api_key(&self) -> String {
        let len = self.api_key.len();
        if len > 10 {
            format!("{}***{}", &self.api_key[..2], &self.api_key[len - 2..])
        } else {
            "*".repeat(7)
        }
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing environment variable: {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            api_key = "0123456789abcdef"
            email = "admin@example.com"
            zone_id = "023e105f4ecef8ad9ca31a8372d0c353"
            record_name = "home.example.com"
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key, "0123456789abcdef");
        assert_eq!(config.email, "admin@example.com");
        assert_eq!(config.zone_id, "023e105f4ecef8ad9ca31a8372d0c353");
        assert_eq!(config.record_name, "home.example.com");
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn log_level_defaults_to_info() {
        let config: Config = toml::from_str(
            r#"
            api_key = "key"
            email = "admin@example.com"
            zone_id = "zone"
            record_name = "home.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_field_fails_to_parse() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            api_key = "key"
            email = "admin@example.com"
            zone_id = "zone"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_field() {
        let config = Config {
            api_key: "key".to_string(),
            email: "admin@example.com".to_string(),
            zone_id: String::new(),
            record_name: "home.example.com".to_string(),
            log_level: default_log_level(),
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("zone_id"));
    }

    #[test]
    fn from_env_reads_and_validates() {
        // Single test for all env cases; no other test may touch these vars.
        for var in ["CF_API_KEY", "CF_EMAIL", "CF_ZONE_ID", "CF_RECORD_NAME"] {
            env::remove_var(var);
        }
        assert!(Config::from_env().is_err());

        env::set_var("CF_API_KEY", "0123456789abcdef");
        env::set_var("CF_EMAIL", "admin@example.com");
        env::set_var("CF_ZONE_ID", "zone");
        env::set_var("CF_RECORD_NAME", "home.example.com");

        let config = Config::from_env().unwrap();
        assert_eq!(config.record_name, "home.example.com");
        assert_eq!(config.log_level, "info");

        env::set_var("CF_ZONE_ID", "");
        assert!(Config::from_env().is_err());

        for var in ["CF_API_KEY", "CF_EMAIL", "CF_ZONE_ID", "CF_RECORD_NAME"] {
            env::remove_var(var);
        }
    }

    #[test]
    fn masks_api_key_in_log_form() {
        let mut config = Config {
            api_key: "0123456789abcdef".to_string(),
            email: "admin@example.com".to_string(),
            zone_id: "zone".to_string(),
            record_name: "home.example.com".to_string(),
            log_level: default_log_level(),
        };

        assert_eq!(config.masked_api_key(), "01***ef");

        config.api_key = "short".to_string();
        assert!(!config.masked_api_key().contains("short"));
    }
}
