//! Byte-stream transports
//!
//! The [`SerialInterface`] trait and its serial-port, TCP and in-memory
//! implementations.

use serialport::SerialPort;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use super::serial::{clear_buffers, configure_port, open_port};
use super::ProtocolError;

/// Byte-stream transport the protocol handler talks through
///
/// Implementations must never block in [`available`](Self::available); reads
/// are only issued after it reported pending input.
pub trait SerialInterface: Send {
    /// Open or reset the transport at `baud_rate`
    fn begin(&mut self, baud_rate: u32) -> Result<(), ProtocolError>;

    /// Whether a peer is attached
    fn is_ready(&self) -> bool {
        true
    }

    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> Result<usize, ProtocolError>;

    /// Read one byte, or `None` if nothing is pending
    fn read_byte(&mut self) -> Result<Option<u8>, ProtocolError>;

    /// Write all of `data`
    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Push buffered output to the peer
    fn flush(&mut self) -> Result<(), ProtocolError>;

    /// Discard pending input
    fn clear(&mut self) -> Result<(), ProtocolError>;
}

impl<S: SerialInterface + ?Sized> SerialInterface for Box<S> {
    fn begin(&mut self, baud_rate: u32) -> Result<(), ProtocolError> {
        (**self).begin(baud_rate)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn available(&mut self) -> Result<usize, ProtocolError> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        (**self).read_byte()
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        (**self).flush()
    }

    fn clear(&mut self) -> Result<(), ProtocolError> {
        (**self).clear()
    }
}

/// Physical serial port, opened on `begin()`
pub struct SerialChannel {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialChannel {
    /// Channel for the port at `path` (e.g. "/dev/ttyUSB0" or "COM3")
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            port: None,
        }
    }

    /// Port path
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialInterface for SerialChannel {
    fn begin(&mut self, baud_rate: u32) -> Result<(), ProtocolError> {
        // Drop any previous handle first so the device can be reopened
        self.port = None;

        let mut port = open_port(&self.path, Some(baud_rate))?;
        configure_port(&mut *port)?;
        clear_buffers(&mut *port)?;
        self.port = Some(port);

        tracing::info!(port = %self.path, baud_rate, "serial port opened");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.port.is_some()
    }

    fn available(&mut self) -> Result<usize, ProtocolError> {
        match self.port.as_mut() {
            Some(port) => Ok(port.bytes_to_read()? as usize),
            None => Ok(0),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(None);
        };

        let mut buf = [0u8; 1];
        match port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if let Some(port) = self.port.as_mut() {
            port.write_all(data)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        if let Some(port) = self.port.as_mut() {
            port.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ProtocolError> {
        match self.port.as_mut() {
            Some(port) => clear_buffers(&mut **port),
            None => Ok(()),
        }
    }
}

/// TCP server transport: one tuning client at a time
///
/// Clients are accepted lazily from `available()`. A client that disconnects
/// is dropped and the next one can attach without restarting the simulator.
pub struct TcpChannel {
    listener: TcpListener,
    client: Option<TcpStream>,
}

impl TcpChannel {
    /// Bind a listener on `addr`
    pub fn listen(addr: impl ToSocketAddrs) -> Result<Self, ProtocolError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            client: None,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ProtocolError> {
        Ok(self.listener.local_addr()?)
    }

    /// Address of the attached client, if any
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.client.as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn accept_pending(&mut self) -> Result<(), ProtocolError> {
        if self.client.is_some() {
            return Ok(());
        }

        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                stream.set_nodelay(true)?;
                tracing::info!(%peer, "client connected");
                self.client = Some(stream);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.client.take() {
            match stream.peer_addr() {
                Ok(peer) => tracing::info!(%peer, "client disconnected"),
                Err(_) => tracing::info!("client disconnected"),
            }
        }
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}

impl SerialInterface for TcpChannel {
    fn begin(&mut self, _baud_rate: u32) -> Result<(), ProtocolError> {
        self.disconnect();
        tracing::info!(addr = %self.listener.local_addr()?, "listening for clients");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    fn available(&mut self) -> Result<usize, ProtocolError> {
        self.accept_pending()?;
        let Some(stream) = self.client.as_mut() else {
            return Ok(0);
        };

        stream.set_nonblocking(true)?;
        let mut buf = [0u8; 256];
        let result = stream.peek(&mut buf);
        stream.set_nonblocking(false)?;

        match result {
            // Orderly shutdown from the peer
            Ok(0) => {
                self.disconnect();
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if is_disconnect(&e) => {
                self.disconnect();
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        let Some(stream) = self.client.as_mut() else {
            return Ok(None);
        };

        let mut buf = [0u8; 1];
        match stream.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => {
                self.disconnect();
                Ok(None)
            }
            Err(e) if is_disconnect(&e) => {
                self.disconnect();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let Some(stream) = self.client.as_mut() else {
            return Ok(());
        };

        match stream.write_all(data) {
            Ok(()) => Ok(()),
            Err(e) if is_disconnect(&e) => {
                self.disconnect();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        match self.client.as_mut() {
            Some(stream) => Ok(stream.flush()?),
            None => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), ProtocolError> {
        let Some(stream) = self.client.as_mut() else {
            return Ok(());
        };

        // Drain whatever is queued without blocking
        stream.set_nonblocking(true)?;
        let mut buf = [0u8; 1024];
        let result = loop {
            match stream.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        stream.set_nonblocking(false)?;
        Ok(result?)
    }
}

/// In-memory transport for tests and embedding
///
/// Input is queued with [`push_input`](Self::push_input); everything the
/// handler writes is captured until [`take_output`](Self::take_output).
#[derive(Debug, Default, Clone)]
pub struct MemoryChannel {
    input: VecDeque<u8>,
    output: Vec<u8>,
    baud_rate: Option<u32>,
    flushes: usize,
}

impl MemoryChannel {
    /// Empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the handler to read
    pub fn push_input(&mut self, data: &[u8]) {
        self.input.extend(data);
    }

    /// Return and clear everything written so far
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Everything written since the last [`take_output`](Self::take_output)
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Baud rate passed to the last `begin()`
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Number of `flush()` calls
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl SerialInterface for MemoryChannel {
    fn begin(&mut self, baud_rate: u32) -> Result<(), ProtocolError> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    fn available(&mut self) -> Result<usize, ProtocolError> {
        Ok(self.input.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        Ok(self.input.pop_front())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.flushes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ProtocolError> {
        self.input.clear();
        Ok(())
    }
}
