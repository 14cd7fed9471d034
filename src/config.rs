//! Configuration management for bucket-kv
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::errors::{GatewayError, Result};

/// Backend storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Google Cloud Storage
    Gcp,
    /// AWS S3 or an S3-compatible service
    Aws,
    /// Azure Blob Storage
    Azure,
    /// Process-local store, contents are lost on exit
    Memory,
}

impl FromStr for BackendType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gcp" | "gcs" | "google" => Ok(BackendType::Gcp),
            "aws" | "s3" => Ok(BackendType::Aws),
            "azure" => Ok(BackendType::Azure),
            "memory" | "mem" => Ok(BackendType::Memory),
            _ => Err(GatewayError::Config(format!("Unknown backend type: {}", s))),
        }
    }
}

/// Backend storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend type (gcp, aws, azure, memory)
    #[serde(rename = "type")]
    pub backend_type: BackendType,

    /// Bucket (or Azure container) holding every entry
    pub bucket_name: String,

    /// AWS-specific: region
    pub region: Option<String>,

    /// AWS-specific: custom endpoint URL (for S3-compatible services)
    pub endpoint: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendType::Gcp,
            bucket_name: String::new(),
            region: None,
            endpoint: None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0:8080)
    pub bind_address: SocketAddr,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Max request body size in bytes (default: 1MiB)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            timeout_secs: 30,
            max_body_size: 1024 * 1024,
        }
    }
}

const DEFAULT_PORT: u16 = 8080;

/// Main configuration structure
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Backend storage configuration
    pub backend: BackendConfig,

    /// Shared bearer token; `None` disables authentication
    pub auth_token: Option<String>,

    /// Prepended to every object name
    pub key_prefix: String,

    /// Log level (default: info)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            auth_token: None,
            key_prefix: String::new(),
            log_level: "info".to_string(),
        }
    }
}

// Hand-written so the token never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("backend", &self.backend)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("key_prefix", &self.key_prefix)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - PORT: listen port (default: 8080)
    /// - BUCKET_NAME: bucket holding the entries (required)
    /// - AUTH_TOKEN: shared bearer token, empty disables auth
    /// - KEY_PREFIX: prepended to every object name (default: empty)
    /// - BACKEND_TYPE: gcp|aws|azure|memory (default: gcp)
    /// - BACKEND_REGION: AWS region (optional)
    /// - BACKEND_ENDPOINT: custom endpoint URL (optional)
    /// - REQUEST_TIMEOUT_SECS: request timeout (default: 30)
    /// - MAX_BODY_SIZE: max request size in bytes (default: 1MiB)
    /// - LOG_LEVEL: log level (default: info)
    /// - CONFIG_FILE: optional path to TOML config file
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CONFIG_FILE") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid PORT: {}", port)))?;
            config.server.bind_address.set_port(port);
        }

        if let Some(bucket) = lookup("BUCKET_NAME") {
            config.backend.bucket_name = bucket;
        }

        if let Some(token) = lookup("AUTH_TOKEN") {
            config.auth_token = Some(token);
        }

        if let Some(prefix) = lookup("KEY_PREFIX") {
            config.key_prefix = prefix;
        }

        if let Some(backend_type) = lookup("BACKEND_TYPE") {
            config.backend.backend_type = backend_type.parse()?;
        }

        if let Some(region) = lookup("BACKEND_REGION") {
            config.backend.region = Some(region);
        }

        if let Some(endpoint) = lookup("BACKEND_ENDPOINT") {
            config.backend.endpoint = Some(endpoint);
        }

        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            config.server.timeout_secs = timeout.parse().map_err(|_| {
                GatewayError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", timeout))
            })?;
        }

        if let Some(size) = lookup("MAX_BODY_SIZE") {
            config.server.max_body_size = size
                .parse()
                .map_err(|_| GatewayError::Config(format!("Invalid MAX_BODY_SIZE: {}", size)))?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        // An empty token means "no auth", whichever source it came from.
        if config.auth_token.as_deref() == Some("") {
            config.auth_token = None;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("Cannot read {}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Cannot parse {}: {}", path, e)))
    }

    fn validate(&self) -> Result<()> {
        if self.backend.bucket_name.is_empty() {
            return Err(GatewayError::Config("BUCKET_NAME is required".to_string()));
        }
        // Object names never start with `/` or hold an empty segment.
        if self.key_prefix.starts_with('/') || self.key_prefix.contains("//") {
            return Err(GatewayError::Config(format!(
                "KEY_PREFIX cannot start with '/' or contain '//': {}",
                self.key_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_backend_type_parsing() {
        assert_eq!(BackendType::from_str("gcs").unwrap(), BackendType::Gcp);
        assert_eq!(BackendType::from_str("S3").unwrap(), BackendType::Aws);
        assert_eq!(BackendType::from_str("azure").unwrap(), BackendType::Azure);
        assert_eq!(BackendType::from_str("memory").unwrap(), BackendType::Memory);
        assert!(BackendType::from_str("ftp").is_err());
    }

    #[test]
    fn test_bucket_name_required() {
        let err = load(&[("PORT", "9000")]).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));

        let err = load(&[("BUCKET_NAME", "")]).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BUCKET_NAME", "kv")]).unwrap();
        assert_eq!(config.server.bind_address.port(), 8080);
        assert_eq!(config.backend.backend_type, BackendType::Gcp);
        assert_eq!(config.key_prefix, "");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = load(&[
            ("BUCKET_NAME", "kv"),
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("KEY_PREFIX", "apps/"),
            ("BACKEND_TYPE", "memory"),
        ])
        .unwrap();
        assert_eq!(config.server.bind_address.port(), 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.key_prefix, "apps/");
        assert_eq!(config.backend.backend_type, BackendType::Memory);
    }

    #[test]
    fn test_empty_token_disables_auth() {
        let config = load(&[("BUCKET_NAME", "kv"), ("AUTH_TOKEN", "")]).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_key_prefix_must_be_an_object_name() {
        for prefix in ["/kv/", "/", "kv//", "a//b/"] {
            let err = load(&[("BUCKET_NAME", "kv"), ("KEY_PREFIX", prefix)]).unwrap_err();
            assert!(matches!(err, GatewayError::Config(_)), "{prefix}");
        }
        assert!(load(&[("BUCKET_NAME", "kv"), ("KEY_PREFIX", "kv/")]).is_ok());
        assert!(load(&[("BUCKET_NAME", "kv"), ("KEY_PREFIX", "app-")]).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        assert!(load(&[("BUCKET_NAME", "kv"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[("BUCKET_NAME", "kv"), ("AUTH_TOKEN", "s3cret")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            key_prefix = "kv/"

            [backend]
            bucket_name = "from-file"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.bucket_name, "from-file");
        assert_eq!(config.key_prefix, "kv/");
        assert_eq!(config.server.timeout_secs, 30);
    }
}
