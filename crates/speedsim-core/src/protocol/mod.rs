//! Serial Protocol
//!
//! Speeduino-compatible command handler and the byte-stream transports it runs
//! over (serial port, TCP socket, in-memory fake).
//!
//! The handler reads at most one command byte per poll and answers it from the
//! engine's current wire record.

pub mod commands;
mod error;
mod handler;
pub mod serial;
mod stream;

pub use commands::Command;
pub use error::ProtocolError;
pub use handler::{
    page_sizes_response, signature_bytes, version_string, PollOutcome, ProtocolHandler,
};
pub use serial::{list_ports, open_port, PortInfo};
pub use stream::{MemoryChannel, SerialChannel, SerialInterface, TcpChannel};

/// Default baud rate for ECU communication (8-N-1)
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Signature reported by the 'S' command
pub const SIGNATURE: &str = "speeduino 202310";

/// Length of the zero-padded 'S' response
pub const SIGNATURE_LEN: usize = 20;

/// Simulator firmware version
pub const FIRMWARE_VERSION: &str = "2.0.0";

/// Real-time record format implemented by the handler
pub const PROTOCOL_VERSION: &str = crate::ecu::FORMAT_VERSION;

/// 'Q' response: signature id, running flag, page count, reserved
pub const STATUS_RESPONSE: [u8; 4] = [0x00, 0x01, 0x01, 0x00];

/// Number of configuration pages reported by 'n'
pub const PAGE_COUNT: u8 = 2;

/// Page sizes reported by 'n'; the last slot is reserved
pub const PAGE_SIZES: [u16; 3] = [32, 256, 0];

/// Sentinel byte sent for unrecognized commands
pub const UNKNOWN_COMMAND_RESPONSE: u8 = 0xFF;
