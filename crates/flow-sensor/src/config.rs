//! Flow sensor configuration

use crate::error::FlowSensorError;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `FLOW_SENSOR_PORT`
pub const ENV_PREFIX: &str = "FLOW_SENSOR";

/// Flow sensor connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial port device path
    pub port: String,

    /// Baud rate the firmware sketch was built for
    pub baud_rate: u32,

    /// Log handshake and response lines
    pub verbose: bool,

    /// Wait after opening the port while the board resets (milliseconds)
    pub settle_delay_ms: u64,

    /// Use the in-memory mock sensor instead of a serial port
    pub mock: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: crate::DEFAULT_BAUD_RATE,
            verbose: false,
            settle_delay_ms: 5000,
            mock: false,
        }
    }
}

impl SensorConfig {
    /// Load settings: defaults, then an optional file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self, FlowSensorError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
