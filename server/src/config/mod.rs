use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{RelayError, Result};

pub const DEFAULT_USER_AGENT: &str = "guest-token-relay/1.0";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ListenConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub guest_user: GuestUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Service account used for the login call, plus the referer the
/// platform's allow-list expects on guest token requests.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub referer: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Echo upstream error bodies back to the caller on auth failures.
    pub expose_error_body: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            expose_error_body: true,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Synthetic identity embedded in every guest token.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuestUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for GuestUser {
    fn default() -> Self {
        Self {
            username: "guest_username".to_string(),
            first_name: "Guest".to_string(),
            last_name: "User".to_string(),
        }
    }
}

impl RelayConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Applies `SUPERSET_*` and `SERVER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup("SUPERSET_USERNAME") {
            self.credentials.username = username;
        }
        if let Some(password) = lookup("SUPERSET_PASSWORD") {
            self.credentials.password = SecretString::from(password);
        }
        if let Some(referer) = lookup("SUPERSET_REFERER") {
            self.credentials.referer = referer;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| RelayError::Config(format!("Invalid SERVER_PORT: {}", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.credentials.username.trim().is_empty() {
            return Err(RelayError::Config(
                "credentials.username must not be empty".to_string(),
            ));
        }
        if self.credentials.password.expose_secret().is_empty() {
            return Err(RelayError::Config(
                "credentials.password must not be empty".to_string(),
            ));
        }
        match url::Url::parse(&self.credentials.referer) {
            Ok(referer) if matches!(referer.scheme(), "http" | "https") && referer.has_host() => {}
            _ => {
                return Err(RelayError::Config(format!(
                    "credentials.referer is not an absolute http(s) URL: {}",
                    self.credentials.referer
                )))
            }
        }
        if self.upstream.timeout_secs == 0 {
            return Err(RelayError::Config(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[credentials]
username = "admin"
password = "1234"
referer = "https://portal.example.com"
    "#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = RelayConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.upstream.user_agent, DEFAULT_USER_AGENT);
        assert!(config.upstream.expose_error_body);
        assert_eq!(config.guest_user.username, "guest_username");
        assert_eq!(config.guest_user.first_name, "Guest");
        assert_eq!(config.guest_user.last_name, "User");
        assert_eq!(config.credentials.password.expose_secret(), "1234");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_section() {
        let result = RelayConfig::from_toml_str("[server]\nport = 9000\n");
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            ("SUPERSET_USERNAME", "embed-bot"),
            ("SUPERSET_PASSWORD", "s3cret"),
            ("SERVER_PORT", "9100"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.credentials.username, "embed-bot");
        assert_eq!(config.credentials.password.expose_secret(), "s3cret");
        assert_eq!(config.credentials.referer, "https://portal.example.com");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        let result = config.apply_overrides(|key| {
            (key == "SERVER_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_referer() {
        let mut config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        config.credentials.referer = "portal.example.com".to_string();
        assert!(config.validate().is_err());

        config.credentials.referer = "ftp://portal.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_password_and_zero_timeout() {
        let mut config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        config.credentials.password = SecretString::from(String::new());
        assert!(config.validate().is_err());

        let mut config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        config.upstream.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_output_hides_password() {
        let config = RelayConfig::from_toml_str(MINIMAL).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("1234"));
    }
}
