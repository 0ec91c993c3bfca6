//! Configuration management for the uidrange webhook
//!
//! Settings are loaded from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UidRangeConfig {
    /// Listener configuration
    pub server: ServerConfig,
    /// Serving certificate for the admission listener
    pub tls: TlsConfig,
    /// Range assignment and enforcement
    pub ranges: RangesConfig,
    /// SubjectAccessReview bypass for pod validation
    pub bypass: BypassConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind both listeners to
    pub host: String,
    /// Admission webhook port
    pub port: u16,
    /// Plain HTTP port for probes and range inspection
    pub ops_port: u16,
}

/// TLS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve the admission listener over HTTPS
    pub enabled: bool,
    /// PEM certificate chain
    pub cert_path: PathBuf,
    /// PEM private key
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangesConfig {
    /// Mint uid/supplemental-group ranges onto new namespaces
    pub assign: bool,
    /// Namespaces ignored by both the annotator and the pod validator
    pub excluded_namespaces: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BypassConfig {
    /// Ask the API server whether the requesting user may skip validation
    pub enabled: bool,
    /// API group of the bypass permission
    pub group: String,
    /// Resource of the bypass permission
    pub resource: String,
    /// Verb of the bypass permission
    pub verb: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines on stdout
    pub json: bool,
    /// Directory for rolling log files, stdout only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9443,
            ops_port: 8080,
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        let cert_dir = PathBuf::from("/tmp/k8s-webhook-server/serving-certs");
        Self {
            enabled: true,
            cert_path: cert_dir.join("tls.crt"),
            key_path: cert_dir.join("tls.key"),
        }
    }
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            assign: true,
            excluded_namespaces: [
                "kube-system",
                "local-path-storage",
                "cert-manager",
                "uidrange-system",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            group: "uidrange.dev".to_string(),
            resource: "idranges".to_string(),
            verb: "bypass".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

impl UidRangeConfig {
    /// Load configuration from environment variables and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.clone(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("UIDRANGE_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/uidrange/config.toml")),
            Some(PathBuf::from("./uidrange.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        // Server
        if let Ok(host) = std::env::var("UIDRANGE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("UIDRANGE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(port) = std::env::var("UIDRANGE_OPS_PORT") {
            if let Ok(port) = port.parse() {
                self.server.ops_port = port;
            }
        }

        // TLS
        if let Ok(enabled) = std::env::var("UIDRANGE_TLS_ENABLED") {
            self.tls.enabled = enabled.parse().unwrap_or(true);
        }
        if let Ok(path) = std::env::var("UIDRANGE_TLS_CERT") {
            self.tls.cert_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("UIDRANGE_TLS_KEY") {
            self.tls.key_path = PathBuf::from(path);
        }

        // Ranges
        if let Ok(assign) = std::env::var("UIDRANGE_ASSIGN_RANGES") {
            self.ranges.assign = assign.parse().unwrap_or(true);
        }
        if let Ok(list) = std::env::var("UIDRANGE_EXCLUDED_NAMESPACES") {
            self.ranges.excluded_namespaces = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        // Bypass
        if let Ok(enabled) = std::env::var("UIDRANGE_BYPASS_ENABLED") {
            self.bypass.enabled = enabled.parse().unwrap_or(false);
        }

        // Logging
        if let Ok(level) = std::env::var("UIDRANGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("UIDRANGE_LOG_JSON") {
            self.logging.json = json.parse().unwrap_or(false);
        }
        if let Ok(path) = std::env::var("UIDRANGE_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(path));
        }
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 || self.server.ops_port == 0 {
            return Err(ConfigError::Validation("Port cannot be 0".to_string()));
        }

        if self.server.port == self.server.ops_port {
            return Err(ConfigError::Validation(
                "Admission and ops listeners need different ports".to_string(),
            ));
        }

        if self.bypass.enabled && (self.bypass.resource.is_empty() || self.bypass.verb.is_empty()) {
            return Err(ConfigError::Validation(
                "Bypass check needs a resource and a verb".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {1}", .0.display())]
    FileRead(PathBuf, String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UidRangeConfig::default();
        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.ops_port, 8080);
        assert!(config.ranges.assign);
        assert!(config.ranges.excluded_namespaces.contains("kube-system"));
        assert!(!config.bypass.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = UidRangeConfig::default();
        assert!(config.validate().is_ok());

        config.server.ops_port = config.server.port;
        assert!(config.validate().is_err());

        let mut config = UidRangeConfig::default();
        config.bypass.enabled = true;
        config.bypass.verb = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: UidRangeConfig = toml::from_str(
            r#"
            [ranges]
            excluded_namespaces = ["kube-system", "monitoring"]
            "#,
        )
        .unwrap();

        assert!(config.ranges.assign);
        assert!(config.ranges.excluded_namespaces.contains("monitoring"));
        assert_eq!(config.server.port, 9443);
    }

    #[test]
    fn test_generate_sample() {
        let sample = UidRangeConfig::generate_sample();
        assert!(sample.contains("[ranges]"));
        assert!(sample.contains("excluded_namespaces"));
    }
}
