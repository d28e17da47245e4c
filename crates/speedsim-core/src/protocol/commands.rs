//! Protocol commands
//!
//! Single-byte commands understood by the simulator. Everything else is
//! answered with [`UNKNOWN_COMMAND_RESPONSE`](super::UNKNOWN_COMMAND_RESPONSE).

/// A decoded command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Real-time data ('A' command)
    RealtimeData,

    /// Controller status ('Q' command)
    Status,

    /// Firmware version string ('V' or 'v' command)
    Version,

    /// ECU signature ('S' command)
    Signature,

    /// Configuration page sizes ('n' command)
    PageSizes,

    /// Any byte the simulator does not implement
    Unknown(u8),
}

impl Command {
    /// Decode a command byte. Never fails: unrecognized bytes map to [`Command::Unknown`].
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'A' => Command::RealtimeData,
            b'Q' => Command::Status,
            b'V' | b'v' => Command::Version,
            b'S' => Command::Signature,
            b'n' => Command::PageSizes,
            other => Command::Unknown(other),
        }
    }

    /// Canonical command byte
    pub fn byte(&self) -> u8 {
        match self {
            Command::RealtimeData => b'A',
            Command::Status => b'Q',
            Command::Version => b'V',
            Command::Signature => b'S',
            Command::PageSizes => b'n',
            Command::Unknown(byte) => *byte,
        }
    }

    /// Whether the simulator implements this command
    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bytes() {
        assert_eq!(Command::from_byte(b'A'), Command::RealtimeData);
        assert_eq!(Command::from_byte(b'Q'), Command::Status);
        assert_eq!(Command::from_byte(b'S'), Command::Signature);
        assert_eq!(Command::from_byte(b'n'), Command::PageSizes);
    }

    #[test]
    fn test_version_accepts_both_cases() {
        assert_eq!(Command::from_byte(b'V'), Command::Version);
        assert_eq!(Command::from_byte(b'v'), Command::Version);
        assert_eq!(Command::Version.byte(), b'V');
    }

    #[test]
    fn test_everything_else_is_unknown() {
        let known = [b'A', b'Q', b'V', b'v', b'S', b'n'];
        for byte in 0..=u8::MAX {
            let command = Command::from_byte(byte);
            assert_eq!(command.is_known(), known.contains(&byte), "byte {:#04x}", byte);
            if !command.is_known() {
                assert_eq!(command.byte(), byte);
            }
        }
    }
}
