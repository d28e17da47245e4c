//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, LogFormat, SimConfig, TransportConfig};

#[derive(Parser, Debug)]
#[command(name = "speedsim")]
#[command(about = "Speeduino-compatible ECU simulator for tuning software and loggers")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Serve a serial port instead of TCP (e.g. /dev/ttyUSB0, COM3)
    #[arg(short, long, conflicts_with = "listen")]
    pub port: Option<String>,

    /// TCP address to accept tuning clients on
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u32>,

    /// HTTP monitor address
    #[arg(long, conflicts_with = "no_http")]
    pub http: Option<String>,

    /// Disable the HTTP monitor
    #[arg(long)]
    pub no_http: bool,

    /// Log output format (defaults to $LOG_FORMAT, then the config file)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,
}

impl Cli {
    /// Load the config file (if any) and apply the command-line overrides on top
    pub fn resolve(&self) -> Result<SimConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        self.apply(&mut config, std::env::var("LOG_FORMAT").ok().as_deref());
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut SimConfig, env_log_format: Option<&str>) {
        if let Some(port) = &self.port {
            config.transport = TransportConfig::Serial { port: port.clone() };
        }
        if let Some(listen) = &self.listen {
            config.transport = TransportConfig::Tcp {
                listen: listen.clone(),
            };
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(http) = &self.http {
            config.monitor.enabled = true;
            config.monitor.listen = http.clone();
        }
        if self.no_http {
            config.monitor.enabled = false;
        }

        match (self.log_format, env_log_format) {
            (Some(format), _) => config.log_format = format,
            (None, Some("json")) => config.log_format = LogFormat::Json,
            (None, Some("text")) => config.log_format = LogFormat::Text,
            _ => {}
        }
    }
}
