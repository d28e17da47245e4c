//! Serial port handling
//!
//! Port discovery and 8-N-1 setup for the physical transport.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::time::Duration;

use super::{ProtocolError, DEFAULT_BAUD_RATE};

/// Read timeout for an open port. Reads are only issued once bytes are pending.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// An available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB product string, when the port is a USB adapter
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let product = match info.port_type {
            SerialPortType::UsbPort(usb) => usb.product,
            _ => None,
        };

        Self {
            name: info.port_name,
            product,
        }
    }
}

/// USB adapters first (ttyUSB, then ttyACM, numerically), then everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in [(0, "ttyUSB"), (1, "ttyACM")] {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank, num, basename.to_string());
        }
    }
    (2, 0, basename.to_string())
}

/// List the serial ports the simulator could be attached to
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = match serialport::available_ports() {
        Ok(found) => found.into_iter().map(PortInfo::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "serial port enumeration failed");
            Vec::new()
        }
    };

    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports.dedup_by(|a, b| a.name == b.name);
    ports
}

/// Open a serial port, defaulting to [`DEFAULT_BAUD_RATE`]
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    serialport::new(name, baud)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| ProtocolError::SerialError(format!("{}: {}", name, e)))
}

/// Configure a port for 8-N-1 without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;

    // USB-serial adapters that wire DTR/RTS to a reset line need both held high.
    // Pseudo-terminals reject the request, which is harmless.
    if let Err(e) = port.write_data_terminal_ready(true) {
        tracing::debug!(error = %e, "could not assert DTR");
    }
    if let Err(e) = port.write_request_to_send(true) {
        tracing::debug!(error = %e, "could not assert RTS");
    }

    Ok(())
}

/// Discard both directions of the port's buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    Ok(port.clear(serialport::ClearBuffer::All)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Only checks enumeration does not panic on this host
        let ports = list_ports();
        for pair in ports.windows(2) {
            assert!(port_sort_key(&pair[0].name) <= port_sort_key(&pair[1].name));
        }
    }

    #[test]
    fn test_port_sorting() {
        let mut names = vec![
            "/dev/ttyACM1",
            "/dev/ttyUSB10",
            "/dev/pts/3",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/ttyUSB2",
        ];
        names.sort_by_key(|n| port_sort_key(n));

        assert_eq!(
            names,
            vec![
                "/dev/ttyUSB0",
                "/dev/ttyUSB2",
                "/dev/ttyUSB10",
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/pts/3",
            ]
        );
    }

    #[test]
    fn test_open_missing_port_fails() {
        let err = open_port("/dev/speedsim-no-such-port", None).err();
        assert!(matches!(err, Some(ProtocolError::SerialError(_))));
    }
}
