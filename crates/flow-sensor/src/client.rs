//! Flow Sensor Client
//!
//! Provides async request/response communication with the flow sensor
//! firmware. Every operation is one exchange: clear the transport buffers,
//! write a single command character and a newline, then read one line back.

use crate::command::{Command, LINE_TERMINATOR};
use crate::error::FlowSensorError;
use crate::transport::Transport;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, trace, warn};

/// Identity string the firmware reports for the identification query
pub const DEVICE_ID: &str = "flowSensor";

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake succeeded and the transport is open
    Connected,
    /// Transport has been closed; no further exchanges are possible
    Closed,
}

/// Flow sensor client
///
/// Operations take `&mut self`, so at most one exchange is ever in flight.
pub struct FlowSensorClient<T: Transport> {
    /// Line reader over the owned transport, `None` once closed
    port: Option<BufReader<T>>,
    /// Log handshake and response lines at info level
    verbose: bool,
}

impl<T: Transport> FlowSensorClient<T> {
    /// Connect to a flow sensor with verbose logging off
    pub async fn new(transport: T) -> Result<Self, FlowSensorError> {
        Self::with_verbosity(transport, false).await
    }

    /// Connect to a flow sensor
    ///
    /// Issues the identification query immediately. If the exchange fails or
    /// the device does not identify as [`DEVICE_ID`], the transport is closed
    /// and the error is returned.
    ///
    /// # Arguments
    /// * `transport` - Open link to the sensor
    /// * `verbose` - Log the handshake and every response line
    pub async fn with_verbosity(transport: T, verbose: bool) -> Result<Self, FlowSensorError> {
        let mut client = Self {
            port: Some(BufReader::new(transport)),
            verbose,
        };

        let identity = match client.get_identification().await {
            Ok(identity) => identity,
            Err(err) => {
                error!("Identification query failed, disconnecting: {}", err);
                client.close();
                return Err(err);
            }
        };

        if identity != DEVICE_ID {
            error!(
                "Initialization error: expected device {:?}, got {:?}. Disconnecting",
                DEVICE_ID, identity
            );
            client.close();
            return Err(FlowSensorError::DeviceMismatch {
                expected: DEVICE_ID,
                actual: identity,
            });
        }

        if verbose {
            info!(
                "Connected to flow sensor on port {}",
                client.port_name().as_deref().unwrap_or("<unknown>")
            );
        }

        Ok(client)
    }

    /// Identification query (`Y`)
    pub async fn get_identification(&mut self) -> Result<String, FlowSensorError> {
        self.write_and_read(Command::Identify).await
    }

    /// Current flow rate (`F`), as reported by the firmware
    pub async fn get_flow_rate(&mut self) -> Result<String, FlowSensorError> {
        self.write_and_read(Command::FlowRate).await
    }

    /// Current temperature (`T`)
    pub async fn get_temp(&mut self) -> Result<String, FlowSensorError> {
        self.write_and_read(Command::Temperature).await
    }

    /// Bubble fault status (`B`)
    pub async fn query_bubble_fault(&mut self) -> Result<String, FlowSensorError> {
        self.write_and_read(Command::BubbleFault).await
    }

    /// Flow fault status (`W`)
    pub async fn query_flow_fault(&mut self) -> Result<String, FlowSensorError> {
        self.write_and_read(Command::FlowFault).await
    }

    /// Send one command and return the stripped response line
    async fn write_and_read(&mut self, command: Command) -> Result<String, FlowSensorError> {
        let port = self.port.as_mut().ok_or(FlowSensorError::NotConnected)?;

        // Read-ahead from an earlier exchange is stale input too
        let buffered = port.buffer().len();
        port.consume(buffered);
        port.get_mut().clear_input()?;
        port.get_mut().clear_output()?;

        debug!("Sending {} command {:?}", command.description(), command.as_char());
        let stream = port.get_mut();
        stream.write_all(&command.wire_bytes()).await?;
        stream.flush().await?;

        let mut line = Vec::new();
        port.read_until(LINE_TERMINATOR, &mut line).await?;
        let response = decode_line(&line)?;

        if self.verbose {
            info!("{}", response);
        } else {
            trace!("{} response: {:?}", command.description(), response);
        }

        Ok(response)
    }

    /// Check if client is connected
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Get the connection state
    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Closed
        }
    }

    /// Port name of the underlying transport
    pub fn port_name(&self) -> Option<String> {
        self.port.as_ref().and_then(|port| port.get_ref().port_name())
    }

    /// Whether handshake and response lines are logged at info level
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Close the connection. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(port) = self.port.take() {
            info!("Closing flow sensor connection");
            let mut transport = port.into_inner();
            if let Err(err) = transport.close() {
                warn!("Error while closing flow sensor transport: {}", err);
            }
        }
    }
}

impl<T: Transport> Drop for FlowSensorClient<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Turn one raw response line into text
fn decode_line(raw: &[u8]) -> Result<String, FlowSensorError> {
    if raw.is_empty() {
        return Err(FlowSensorError::NoResponse);
    }
    if raw.last() != Some(&LINE_TERMINATOR) {
        return Err(FlowSensorError::UnterminatedResponse(
            String::from_utf8_lossy(raw).into_owned(),
        ));
    }
    if !raw.is_ascii() {
        return Err(FlowSensorError::InvalidResponse(format!(
            "non-ASCII bytes {:02X?}",
            raw
        )));
    }

    let text = std::str::from_utf8(raw)
        .map_err(|err| FlowSensorError::InvalidResponse(err.to_string()))?;
    Ok(text.trim_matches(is_strippable).to_string())
}

/// Whitespace plus the ASCII separators U+001C..=U+001F
fn is_strippable(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}
