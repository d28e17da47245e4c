//! Runtime configuration
//!
//! Loaded from an optional TOML file; command-line flags are applied on top
//! (see [`crate::cli`]). Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use speedsim_core::protocol::DEFAULT_BAUD_RATE;

/// Default TCP address tuning clients connect to
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5555";

/// Default HTTP monitor address
pub const DEFAULT_MONITOR_ADDR: &str = "127.0.0.1:8080";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    #[error("Invalid {what} address '{addr}'")]
    InvalidAddress { what: &'static str, addr: String },

    #[error("Serial port path is empty")]
    EmptyPort,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Where tuning clients reach the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Accept TCP clients on `listen`
    Tcp { listen: String },
    /// Attach to a physical or virtual serial port
    Serial { port: String },
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Tcp {
            listen: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// HTTP/JSON monitor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Serve the monitor at all
    pub enabled: bool,
    /// Listen address
    pub listen: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: DEFAULT_MONITOR_ADDR.to_string(),
        }
    }
}

/// Complete simulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Client transport
    pub transport: TransportConfig,
    /// Serial data rate (ignored for TCP)
    pub baud_rate: u32,
    /// Fixed random seed for a reproducible run; entropy when absent
    pub seed: Option<u32>,
    /// HTTP monitor
    pub monitor: MonitorConfig,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            seed: None,
            monitor: MonitorConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate(self.baud_rate));
        }

        match &self.transport {
            TransportConfig::Tcp { listen } => {
                parse_addr("transport", listen)?;
            }
            TransportConfig::Serial { port } => {
                if port.trim().is_empty() {
                    return Err(ConfigError::EmptyPort);
                }
            }
        }

        if self.monitor.enabled {
            parse_addr("monitor", &self.monitor.listen)?;
        }

        Ok(())
    }

    /// Monitor address, if the monitor is enabled
    pub fn monitor_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        if !self.monitor.enabled {
            return Ok(None);
        }
        parse_addr("monitor", &self.monitor.listen).map(Some)
    }
}

fn parse_addr(what: &'static str, addr: &str) -> Result<SocketAddr, ConfigError> {
    addr.parse().map_err(|_| ConfigError::InvalidAddress {
        what,
        addr: addr.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(
            config.transport,
            TransportConfig::Tcp {
                listen: "127.0.0.1:5555".to_string()
            }
        );
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.seed, None);
        assert_eq!(
            config.monitor_addr().unwrap(),
            Some("127.0.0.1:8080".parse().unwrap())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = write_config("");
        assert_eq!(SimConfig::load(file.path()).unwrap(), SimConfig::default());
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
baud_rate = 57600
seed = 42
log_format = "json"

[transport]
kind = "serial"
port = "/dev/ttyUSB0"

[monitor]
enabled = false
"#,
        );

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(
            config.transport,
            TransportConfig::Serial {
                port: "/dev/ttyUSB0".to_string()
            }
        );
        assert_eq!(config.baud_rate, 57600);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.monitor_addr().unwrap(), None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("baud = 9600\n");
        let err = SimConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{}", err);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_values_rejected() {
        let file = write_config("baud_rate = 0\n");
        assert!(matches!(
            SimConfig::load(file.path()),
            Err(ConfigError::InvalidBaudRate(0))
        ));

        let file = write_config("[transport]\nkind = \"tcp\"\nlisten = \"not an address\"\n");
        assert!(matches!(
            SimConfig::load(file.path()),
            Err(ConfigError::InvalidAddress { what: "transport", .. })
        ));

        let file = write_config("[transport]\nkind = \"serial\"\nport = \"  \"\n");
        assert!(matches!(
            SimConfig::load(file.path()),
            Err(ConfigError::EmptyPort)
        ));
    }
}
