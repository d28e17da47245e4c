//! Command dispatch
//!
//! [`ProtocolHandler`] owns the transport and answers one command byte per
//! [`poll`](ProtocolHandler::poll) from the wire record it is handed. It never
//! touches the simulator itself.

use byteorder::{ByteOrder, LittleEndian};

use super::commands::Command;
use super::stream::SerialInterface;
use super::{
    ProtocolError, DEFAULT_BAUD_RATE, FIRMWARE_VERSION, PAGE_COUNT, PAGE_SIZES, SIGNATURE,
    SIGNATURE_LEN, STATUS_RESPONSE, UNKNOWN_COMMAND_RESPONSE,
};
use crate::ecu::EngineStatus;

/// Result of a single [`ProtocolHandler::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No byte was pending
    NoCommand,
    /// One byte was consumed and answered
    Processed(Command),
}

impl PollOutcome {
    /// Whether a command byte was consumed
    pub fn is_processed(&self) -> bool {
        matches!(self, PollOutcome::Processed(_))
    }
}

/// Speeduino command handler over a transport
pub struct ProtocolHandler<S> {
    channel: S,
    baud_rate: u32,
    command_count: u32,
    error_count: u32,
}

impl<S: SerialInterface> ProtocolHandler<S> {
    /// Handler at [`DEFAULT_BAUD_RATE`]
    pub fn new(channel: S) -> Self {
        Self::with_baud_rate(channel, DEFAULT_BAUD_RATE)
    }

    /// Handler that opens its transport at `baud_rate`
    pub fn with_baud_rate(channel: S, baud_rate: u32) -> Self {
        Self {
            channel,
            baud_rate,
            command_count: 0,
            error_count: 0,
        }
    }

    /// Open the transport and reset both counters
    pub fn begin(&mut self) -> Result<(), ProtocolError> {
        self.channel.begin(self.baud_rate)?;
        self.command_count = 0;
        self.error_count = 0;
        Ok(())
    }

    /// Answer at most one pending command byte from `status`.
    ///
    /// Returns [`PollOutcome::NoCommand`] without blocking when nothing is pending.
    pub fn poll(&mut self, status: &EngineStatus) -> Result<PollOutcome, ProtocolError> {
        if self.channel.available()? == 0 {
            return Ok(PollOutcome::NoCommand);
        }
        let Some(byte) = self.channel.read_byte()? else {
            return Ok(PollOutcome::NoCommand);
        };

        self.command_count = self.command_count.wrapping_add(1);
        let command = Command::from_byte(byte);

        match command {
            Command::RealtimeData => self.send(&status.encode())?,
            Command::Status => self.send(&STATUS_RESPONSE)?,
            Command::Version => self.send(version_string().as_bytes())?,
            Command::Signature => self.send(&signature_bytes())?,
            Command::PageSizes => self.send(&page_sizes_response())?,
            Command::Unknown(byte) => {
                self.error_count = self.error_count.wrapping_add(1);
                tracing::debug!(byte = format_args!("{:#04x}", byte), "unknown command");
                self.send(&[UNKNOWN_COMMAND_RESPONSE])?;
            }
        }

        tracing::trace!(?command, count = self.command_count, "command processed");
        Ok(PollOutcome::Processed(command))
    }

    /// Commands consumed since `begin()`, recognized or not
    pub fn command_count(&self) -> u32 {
        self.command_count
    }

    /// Unrecognized commands since `begin()`
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Baud rate passed to the transport on `begin()`
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Underlying transport
    pub fn channel(&self) -> &S {
        &self.channel
    }

    /// Underlying transport, mutably
    pub fn channel_mut(&mut self) -> &mut S {
        &mut self.channel
    }

    /// Consume the handler, returning the transport
    pub fn into_inner(self) -> S {
        self.channel
    }

    fn send(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.channel.write(data)?;
        self.channel.flush()
    }
}

/// 'V' response text
pub fn version_string() -> String {
    format!("{}-sim {}\n", SIGNATURE, FIRMWARE_VERSION)
}

/// 'S' response: the signature, zero-padded to [`SIGNATURE_LEN`]
pub fn signature_bytes() -> [u8; SIGNATURE_LEN] {
    let mut out = [0u8; SIGNATURE_LEN];
    let sig = SIGNATURE.as_bytes();
    let len = sig.len().min(SIGNATURE_LEN);
    out[..len].copy_from_slice(&sig[..len]);
    out
}

const PAGE_SIZES_RESPONSE_LEN: usize = 1 + 2 * PAGE_SIZES.len();

/// 'n' response: page count, then each page size little-endian
pub fn page_sizes_response() -> [u8; PAGE_SIZES_RESPONSE_LEN] {
    let mut out = [0u8; PAGE_SIZES_RESPONSE_LEN];
    out[0] = PAGE_COUNT;
    for (i, size) in PAGE_SIZES.iter().enumerate() {
        LittleEndian::write_u16(&mut out[1 + 2 * i..3 + 2 * i], *size);
    }
    out
}
