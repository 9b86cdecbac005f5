use chirplink_core::{constants::MAX_FRAME_LEN, error::ErrorKind};

use crate::wire::MessageType;

/// Byte that switches the framer into local command mode.
const COMMAND_PREFIX: u8 = b'!';
/// Byte replaced by ESC in the outbound buffer, used to poke remote
/// debug behavior without a literal escape key.
const ESCAPE_TRIGGER: u8 = b'$';
/// ASCII escape.
const ESCAPE_BYTE: u8 = 27;

/// A local setting change parsed from the `!` command mini-protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    /// `S<d>`: select a spreading factor by table index.
    SetSpreadingFactor(u8),
    /// `B<d>`: select a bandwidth by table index.
    SetBandwidth(u8),
    /// `C<d>` or `C<dd>`: select a frequency channel by table index.
    SetFrequencyChannel(u8),
    /// `P<d>` or `P<dd>`: select a transmit power in dBm.
    SetTxPower(i8),
}

/// What one fed byte produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    /// Byte consumed, nothing to act on yet.
    Pending,
    /// A newline completed the outbound buffer; call `take_frame`.
    FrameReady,
    /// A newline completed a `!` command.
    Command(LocalCommand),
}

/// Builds outbound data frames from a serial-like byte stream.
///
/// Two modes. In data mode the buffer lazily starts with the data-request
/// tag, printable bytes accumulate, and a newline marks the frame ready.
/// A `!` switches to command mode, where bytes accumulate in a separate
/// command buffer until a newline parses them into a `LocalCommand`; the
/// outbound data buffer is never touched while in command mode.
#[derive(Debug, Default)]
pub struct MessageFramer {
    outbound: Vec<u8>,
    command: Vec<u8>,
    command_mode: bool,
}

impl MessageFramer {
    /// Creates an empty framer in data mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one serial byte.
    pub fn feed(&mut self, byte: u8) -> Result<SerialEvent, ErrorKind> {
        if byte == COMMAND_PREFIX {
            self.command_mode = true;
            self.command.clear();
            return Ok(SerialEvent::Pending);
        }
        if self.command_mode {
            return self.feed_command(byte);
        }
        self.feed_data(byte)
    }

    fn feed_data(&mut self, byte: u8) -> Result<SerialEvent, ErrorKind> {
        if self.outbound.is_empty() {
            self.outbound.push(MessageType::DataRequest.tag());
        }
        if self.outbound.len() < MAX_FRAME_LEN {
            match byte {
                b'\n' | b'\r' => {}
                ESCAPE_TRIGGER => self.outbound.push(ESCAPE_BYTE),
                other => self.outbound.push(other),
            }
        }
        if byte == b'\n' {
            Ok(SerialEvent::FrameReady)
        } else {
            Ok(SerialEvent::Pending)
        }
    }

    fn feed_command(&mut self, byte: u8) -> Result<SerialEvent, ErrorKind> {
        match byte {
            b'\n' => {
                self.command_mode = false;
                let parsed = parse_command(&self.command);
                self.command.clear();
                parsed.map(SerialEvent::Command)
            }
            b'\r' => Ok(SerialEvent::Pending),
            other => {
                if self.command.len() < MAX_FRAME_LEN {
                    self.command.push(other);
                }
                Ok(SerialEvent::Pending)
            }
        }
    }

    /// Hands the completed outbound buffer to the transmit path, leaving
    /// the framer empty for the next frame.
    pub fn take_frame(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Overwrites the outbound buffer with tag + payload directly,
    /// bypassing byte-at-a-time accumulation.
    pub fn set_message(&mut self, payload: &[u8]) {
        self.outbound.clear();
        self.outbound.push(MessageType::DataRequest.tag());
        self.outbound
            .extend_from_slice(&payload[..payload.len().min(MAX_FRAME_LEN - 1)]);
    }

    /// Returns the number of buffered outbound bytes, tag included.
    pub fn pending_len(&self) -> usize {
        self.outbound.len()
    }
}

fn parse_command(buf: &[u8]) -> Result<LocalCommand, ErrorKind> {
    let (&opcode, args) = buf.split_first().ok_or(ErrorKind::InvalidCommand)?;
    let value = parse_decimal(args)?;
    match opcode {
        b'S' => Ok(LocalCommand::SetSpreadingFactor(value)),
        b'B' => Ok(LocalCommand::SetBandwidth(value)),
        b'C' => Ok(LocalCommand::SetFrequencyChannel(value)),
        b'P' => Ok(LocalCommand::SetTxPower(value as i8)),
        _ => Err(ErrorKind::InvalidCommand),
    }
}

fn parse_decimal(args: &[u8]) -> Result<u8, ErrorKind> {
    if args.is_empty() || args.len() > 2 || !args.iter().all(u8::is_ascii_digit) {
        return Err(ErrorKind::InvalidCommand);
    }
    Ok(args
        .iter()
        .fold(0u8, |acc, &digit| acc * 10 + (digit - b'0')))
}
