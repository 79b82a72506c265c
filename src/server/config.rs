//! Server configuration.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::chat::SharedSecret;
use crate::{DEFAULT_LISTEN_ADDR, DEFAULT_LISTEN_PORT, DEFAULT_MAX_AUTH_ATTEMPTS, DEFAULT_MAX_LINE_LEN};

/// Line sent to the client once it has authenticated.
pub const DEFAULT_WELCOME: &str = "Welcome to the secure chat server! Type your messages.\n";

/// Line sent to the client when the server operator quits.
pub const DEFAULT_FAREWELL: &str = "Server is shutting down. Goodbye!\n";

/// Server configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: String,
    /// Listen port
    pub listen_port: u16,
    /// Password clients must present
    pub secret: SharedSecret,
    /// Password attempts per connection
    pub max_auth_attempts: u32,
    /// Largest single read and largest local line, in bytes
    pub max_line_len: usize,
    /// Sent after authentication
    pub welcome_message: String,
    /// Sent when the operator quits
    pub farewell_message: String,
}

impl ServerConfig {
    /// Default configuration protected by `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            secret: SharedSecret::new(secret),
            max_auth_attempts: DEFAULT_MAX_AUTH_ATTEMPTS,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            welcome_message: DEFAULT_WELCOME.to_string(),
            farewell_message: DEFAULT_FAREWELL.to_string(),
        }
    }

    /// Parsed listen socket address.
    pub fn listen_socket_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .map_err(|e| format!("invalid listen_addr {:?}: {}", self.listen_addr, e))?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr cannot be empty".into());
        }
        self.listen_socket_addr()?;
        if self.secret.is_empty() {
            return Err("secret cannot be empty".into());
        }
        if self.max_auth_attempts == 0 {
            return Err("max_auth_attempts must be at least 1".into());
        }
        if self.max_line_len == 0 {
            return Err("max_line_len must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = ServerConfig::new("secret123");

        assert!(config.validate().is_ok());
        assert_eq!(
            config.listen_socket_addr().unwrap(),
            "127.0.0.1:1234".parse().unwrap()
        );
        assert!(config.secret.matches("secret123"));
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::new("secret123");

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("secret = \"secret123\""));

        let restored: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.listen_addr, restored.listen_addr);
        assert_eq!(config.listen_port, restored.listen_port);
        assert!(restored.secret.matches("secret123"));
        assert_eq!(restored.welcome_message, DEFAULT_WELCOME);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("secret = \"hunter2\"\nlisten_port = 4000\n").unwrap();

        assert_eq!(config.listen_port, 4000);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.max_auth_attempts, DEFAULT_MAX_AUTH_ATTEMPTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(ServerConfig::default().validate().is_err());

        let mut config = ServerConfig::new("secret123");
        config.listen_addr = "localhost".into();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::new("secret123");
        config.max_auth_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::new("secret123");
        config.max_line_len = 0;
        assert!(config.validate().is_err());
    }
}
