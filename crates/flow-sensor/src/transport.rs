//! Serial Transport
//!
//! The driver talks to anything that is an async byte stream with explicit
//! buffer-clear operations. Real hardware goes through `tokio_serial`.

use crate::error::FlowSensorError;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::info;

/// Byte-stream link to a flow sensor
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Discard bytes received but not yet read
    fn clear_input(&mut self) -> io::Result<()>;

    /// Discard bytes written but not yet transmitted
    fn clear_output(&mut self) -> io::Result<()>;

    /// Port name or address, if the transport has one
    fn port_name(&self) -> Option<String> {
        None
    }

    /// Release the link. Called at most once, right before the transport is dropped.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for SerialStream {
    fn clear_input(&mut self) -> io::Result<()> {
        SerialPort::clear(&*self, ClearBuffer::Input).map_err(io::Error::from)
    }

    fn clear_output(&mut self) -> io::Result<()> {
        SerialPort::clear(&*self, ClearBuffer::Output).map_err(io::Error::from)
    }

    fn port_name(&self) -> Option<String> {
        SerialPort::name(self)
    }
}

/// Open a serial port at `baud_rate`, 8N1 with no flow control
///
/// # Arguments
/// * `device` - Serial port device path (e.g., "/dev/ttyACM0" or "COM10")
/// * `baud_rate` - Baud rate the firmware was built for
pub fn open_serial(device: &str, baud_rate: u32) -> Result<SerialStream, FlowSensorError> {
    info!("Opening serial port {} at {} baud", device, baud_rate);

    let stream = tokio_serial::new(device, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_port_fails() {
        let result = open_serial("/dev/flow-sensor-does-not-exist", 115_200);
        assert!(matches!(result, Err(FlowSensorError::SerialError(_))));
    }
}
