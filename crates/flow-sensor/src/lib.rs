//! Flow Sensor Driver
//!
//! This crate provides async serial communication with a flow sensor running
//! the single-character ASCII command firmware. Each command is answered with
//! one newline-terminated line, and the device must identify itself before
//! any other query is issued.

mod client;
mod command;
mod config;
mod error;
mod mock;
mod transport;

pub use client::{ConnectionState, FlowSensorClient, DEVICE_ID};
pub use command::{Command, CMD_NOT_DEFINED};
pub use config::SensorConfig;
pub use error::FlowSensorError;
pub use mock::{MockEvent, MockLog, MockSensor};
pub use transport::{open_serial, Transport};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Baud rate of the sensor firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Initialize logging; `verbose` raises the level to DEBUG
pub fn init_logging(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
