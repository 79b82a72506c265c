//! Client configuration.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::proxy::socks5::MAX_DOMAIN_LEN;
use crate::{DEFAULT_MAX_AUTH_ATTEMPTS, DEFAULT_MAX_LINE_LEN, DEFAULT_PROXY_ADDR, DEFAULT_PROXY_PORT};

/// Client configuration, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// SOCKS5 proxy address (a literal IP)
    pub proxy_addr: String,
    /// SOCKS5 proxy port
    pub proxy_port: u16,
    /// Hidden service (or other domain) to reach through the proxy
    pub target_host: String,
    /// Target port
    pub target_port: u16,
    /// Password prompts answered before giving up
    pub max_auth_attempts: u32,
    /// Largest single read and largest local line, in bytes
    pub max_line_len: usize,
}

impl ClientConfig {
    /// Default proxy settings for reaching `target_host:target_port`.
    pub fn new(target_host: impl Into<String>, target_port: u16) -> Self {
        Self {
            target_host: target_host.into(),
            target_port,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.proxy_addr.parse::<IpAddr>().is_err() {
            return Err(format!("proxy_addr {:?} is not an IP address", self.proxy_addr));
        }
        if self.proxy_port == 0 {
            return Err("proxy_port cannot be 0".into());
        }
        if self.target_host.is_empty() {
            return Err("target_host cannot be empty".into());
        }
        if self.target_host.len() > MAX_DOMAIN_LEN {
            return Err(format!(
                "target_host is {} bytes, the limit is {}",
                self.target_host.len(),
                MAX_DOMAIN_LEN
            ));
        }
        if self.target_port == 0 {
            return Err("target_port cannot be 0".into());
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

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_addr: DEFAULT_PROXY_ADDR.to_string(),
            proxy_port: DEFAULT_PROXY_PORT,
            target_host: String::new(),
            target_port: 0,
            max_auth_attempts: DEFAULT_MAX_AUTH_ATTEMPTS,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("example.onion", 1234);
        assert_eq!(config.proxy_addr, "127.0.0.1");
        assert_eq!(config.proxy_port, 9050);
        assert_eq!(config.max_auth_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "proxy_port": 9150, "target_host": "abc.onion", "target_port": 80 }"#)
                .unwrap();
        assert_eq!(config.proxy_port, 9150);
        assert_eq!(config.proxy_addr, DEFAULT_PROXY_ADDR);
        assert_eq!(config.max_line_len, DEFAULT_MAX_LINE_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("example.onion", 0).validate().is_err());

        let long = "a".repeat(MAX_DOMAIN_LEN + 1);
        assert!(ClientConfig::new(long, 80).validate().is_err());
        assert!(ClientConfig::new("a".repeat(MAX_DOMAIN_LEN), 80).validate().is_ok());

        let mut config = ClientConfig::new("example.onion", 80);
        config.proxy_addr = "localhost".into();
        assert!(config.validate().is_err());
    }
}
