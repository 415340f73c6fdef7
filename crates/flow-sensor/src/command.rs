//! Flow Sensor Command Set
//!
//! The firmware understands a closed set of single-character commands, each
//! answered with exactly one newline-terminated ASCII line.

/// Byte the firmware answers with for a command it does not know
pub const CMD_NOT_DEFINED: u8 = 0x15;

/// Line terminator appended to every command and expected after every response
pub const LINE_TERMINATOR: u8 = b'\n';

/// Commands accepted by the flow sensor firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Identification query (`Y`)
    Identify = b'Y',
    /// Current flow rate (`F`)
    FlowRate = b'F',
    /// Current temperature (`T`)
    Temperature = b'T',
    /// Bubble (air-in-line) fault status (`B`)
    BubbleFault = b'B',
    /// Flow fault status (`W`)
    FlowFault = b'W',
}

impl Command {
    /// Every command, in firmware table order
    pub const ALL: [Command; 5] = [
        Command::Identify,
        Command::FlowRate,
        Command::Temperature,
        Command::BubbleFault,
        Command::FlowFault,
    ];

    /// Get the command byte
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Get the command character
    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }

    /// Bytes written to the wire: the command character followed by a newline
    pub fn wire_bytes(&self) -> [u8; 2] {
        [self.as_byte(), LINE_TERMINATOR]
    }

    /// Look up a command by its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.as_byte() == byte)
    }

    /// Human-readable name, used in log output
    pub fn description(&self) -> &'static str {
        match self {
            Command::Identify => "identification",
            Command::FlowRate => "flow rate",
            Command::Temperature => "temperature",
            Command::BubbleFault => "bubble fault",
            Command::FlowFault => "flow fault",
        }
    }
}
