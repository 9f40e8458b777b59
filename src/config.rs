use std::{env, net::SocketAddr, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::InvalidTransport),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub bind_addr: String,
    pub bind_port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: stdio, http")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let transport = lookup("MCP_TRANSPORT")
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.parse::<Transport>())
            .transpose()?
            .unwrap_or(Transport::Stdio);

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = lookup("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let config = Self {
            transport,
            bind_addr,
            bind_port,
        };

        if config.transport == Transport::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = config(&[]).expect("config should parse");

        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
    }

    #[test]
    fn http_transport_parses_case_insensitively() {
        let config = config(&[("MCP_TRANSPORT", " HTTP "), ("BIND_PORT", "9000")])
            .expect("config should parse");

        assert_eq!(config.transport, Transport::Http);
        assert_eq!(
            config.bind_socket().expect("valid socket"),
            "127.0.0.1:9000".parse().expect("socket literal")
        );
    }

    #[test]
    fn unknown_transport_fails() {
        let err = config(&[("MCP_TRANSPORT", "websocket")]).expect_err("expected transport error");
        assert!(matches!(err, ConfigError::InvalidTransport));
    }

    #[test]
    fn invalid_port_fails() {
        let err = config(&[("BIND_PORT", "70000")]).expect_err("expected port error");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn invalid_bind_address_fails_for_http() {
        let err = config(&[("MCP_TRANSPORT", "http"), ("BIND_ADDR", "not an address")])
            .expect_err("expected socket error");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }
}
