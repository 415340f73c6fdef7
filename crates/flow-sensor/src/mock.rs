//! Mock Flow Sensor
//!
//! In-memory transport that behaves like the sensor firmware, for running
//! the driver without hardware.

use crate::command::{Command, CMD_NOT_DEFINED, LINE_TERMINATOR};
use crate::transport::Transport;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

/// Something the host did to the mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    ClearInput,
    ClearOutput,
    Write(Vec<u8>),
    Close,
}

/// Shared record of host activity, readable after the mock has been moved into a client
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    events: Arc<Mutex<Vec<MockEvent>>>,
}

impl MockLog {
    fn record(&self, event: MockEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// All events so far, in order
    pub fn events(&self) -> Vec<MockEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every byte the host wrote, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MockEvent::Write(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn clear_input_count(&self) -> usize {
        self.count(|event| *event == MockEvent::ClearInput)
    }

    pub fn clear_output_count(&self) -> usize {
        self.count(|event| *event == MockEvent::ClearOutput)
    }

    pub fn close_count(&self) -> usize {
        self.count(|event| *event == MockEvent::Close)
    }

    fn count(&self, predicate: impl Fn(&MockEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

/// Simulated flow sensor
pub struct MockSensor {
    /// Raw bytes sent back for each command, terminator included
    responses: HashMap<Command, Vec<u8>>,
    /// Partial command line written by the host
    incoming: Vec<u8>,
    /// Bytes waiting for the host to read
    outgoing: VecDeque<u8>,
    port_name: String,
    log: MockLog,
}

impl MockSensor {
    /// Create a mock sensor with the stock firmware responses
    pub fn new() -> Self {
        let mut sensor = Self {
            responses: HashMap::new(),
            incoming: Vec::new(),
            outgoing: VecDeque::new(),
            port_name: "mock".to_string(),
            log: MockLog::default(),
        };
        sensor.set_response(Command::Identify, crate::DEVICE_ID);
        sensor.set_response(Command::FlowRate, "12.3");
        sensor.set_response(Command::Temperature, "24.5");
        sensor.set_response(Command::BubbleFault, "0");
        sensor.set_response(Command::FlowFault, "0");
        sensor
    }

    /// Answer `command` with `line` followed by a newline
    pub fn with_response(mut self, command: Command, line: &str) -> Self {
        self.set_response(command, line);
        self
    }

    /// Answer `command` with exactly `raw`, terminator and all
    pub fn with_raw_response(mut self, command: Command, raw: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(command, raw.into());
        self
    }

    /// Change the reported port name
    pub fn with_port_name(mut self, name: &str) -> Self {
        self.port_name = name.to_string();
        self
    }

    /// Queue bytes as if left over from an earlier, abandoned exchange
    pub fn inject_stale(&mut self, bytes: &[u8]) {
        self.outgoing.extend(bytes);
    }

    /// Handle onto the activity log
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    fn set_response(&mut self, command: Command, line: &str) {
        let mut raw = line.as_bytes().to_vec();
        raw.push(LINE_TERMINATOR);
        self.responses.insert(command, raw);
    }

    fn handle_line(&mut self, line: &[u8]) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let command = match line {
            [byte] => Command::from_byte(*byte),
            _ => None,
        };

        match command.and_then(|cmd| self.responses.get(&cmd)).cloned() {
            Some(raw) => {
                debug!("Mock sensor answering {:?}", command);
                self.outgoing.extend(raw);
            }
            None => {
                debug!("Mock sensor rejecting unknown command {:?}", line);
                self.outgoing.extend([CMD_NOT_DEFINED, LINE_TERMINATOR]);
            }
        }
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for MockSensor {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = buf.remaining().min(this.outgoing.len());
        let chunk: Vec<u8> = this.outgoing.drain(..n).collect();
        buf.put_slice(&chunk);
        // Nothing queued reads as EOF
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSensor {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.log.record(MockEvent::Write(buf.to_vec()));
        this.incoming.extend_from_slice(buf);

        while let Some(pos) = this.incoming.iter().position(|b| *b == LINE_TERMINATOR) {
            let line: Vec<u8> = this.incoming.drain(..=pos).collect();
            this.handle_line(&line[..pos]);
        }

        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Transport for MockSensor {
    fn clear_input(&mut self) -> io::Result<()> {
        self.log.record(MockEvent::ClearInput);
        self.outgoing.clear();
        Ok(())
    }

    fn clear_output(&mut self) -> io::Result<()> {
        self.log.record(MockEvent::ClearOutput);
        self.incoming.clear();
        Ok(())
    }

    fn port_name(&self) -> Option<String> {
        Some(self.port_name.clone())
    }

    fn close(&mut self) -> io::Result<()> {
        self.log.record(MockEvent::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn read_all(sensor: &mut MockSensor) -> Vec<u8> {
        let mut out = Vec::new();
        sensor.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_identify_response() {
        let mut sensor = MockSensor::new();
        sensor.write_all(b"Y\n").await.unwrap();
        assert_eq!(read_all(&mut sensor).await, b"flowSensor\n");
    }

    #[tokio::test]
    async fn test_unknown_command_is_rejected() {
        let mut sensor = MockSensor::new();
        sensor.write_all(b"Z\n").await.unwrap();
        assert_eq!(read_all(&mut sensor).await, vec![CMD_NOT_DEFINED, b'\n']);
    }

    #[tokio::test]
    async fn test_command_split_across_writes() {
        let mut sensor = MockSensor::new().with_response(Command::Temperature, "30.1");
        sensor.write_all(b"T").await.unwrap();
        assert!(read_all(&mut sensor).await.is_empty());
        sensor.write_all(b"\n").await.unwrap();
        assert_eq!(read_all(&mut sensor).await, b"30.1\n");
    }

    #[tokio::test]
    async fn test_clear_input_drops_stale_bytes() {
        let mut sensor = MockSensor::new();
        sensor.inject_stale(b"garbage\n");
        sensor.clear_input().unwrap();
        assert!(read_all(&mut sensor).await.is_empty());
        assert_eq!(sensor.log().clear_input_count(), 1);
    }

    #[tokio::test]
    async fn test_log_records_writes_in_order() {
        let mut sensor = MockSensor::new();
        let log = sensor.log();
        sensor.clear_output().unwrap();
        sensor.write_all(b"F\n").await.unwrap();
        sensor.close().unwrap();

        assert_eq!(
            log.events(),
            vec![
                MockEvent::ClearOutput,
                MockEvent::Write(b"F\n".to_vec()),
                MockEvent::Close,
            ]
        );
        assert_eq!(log.written(), b"F\n");
        assert_eq!(log.close_count(), 1);
    }
}
