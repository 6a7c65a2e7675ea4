//! # Stream Transport
//!
//! Carries SHTP frames over any tokio byte stream.
//!
//! This module handles:
//! - Opening a serial port for a UART or USB bridge to the sensor hub
//! - Exact-length reads with a per-read timeout
//! - Writing and flushing complete frames
//! - Discarding pending input to regain frame alignment

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt};
use tracing::{debug, info, warn};

use super::{CargoRead, Transport};
use crate::error::{BridgeError, Result};

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 3_000_000;

/// Default per-read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on a discard, in read timeouts
const DISCARD_WINDOWS: u32 = 4;

/// Default device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC bridges
];

/// Transport over a byte stream
///
/// Reads continue where the previous one stopped, so the default cargo mode
/// is [`CargoRead::Remaining`]. Bridges that replay the full frame per read
/// can be configured with [`CargoRead::FullFrame`].
pub struct StreamTransport<S> {
    stream: S,
    mode: CargoRead,
    read_timeout: Duration,
    label: String,
    clear_input: Option<fn(&S) -> io::Result<()>>,
}

impl<S> std::fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("label", &self.label)
            .field("mode", &self.mode)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-open stream
    ///
    /// # Arguments
    ///
    /// * `stream` - Byte stream to the sensor hub
    /// * `mode` - Cargo read behaviour of the link
    /// * `read_timeout` - Upper bound on each `receive`
    pub fn new(stream: S, mode: CargoRead, read_timeout: Duration) -> Self {
        Self {
            stream,
            mode,
            read_timeout,
            label: "stream".to_string(),
            clear_input: None,
        }
    }

    /// Human-readable name of the link (device path for serial ports)
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl StreamTransport<tokio_serial::SerialStream> {
    /// Open the first available default serial device
    ///
    /// # Errors
    ///
    /// Returns error if no device could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sh2_bridge::transport::StreamTransport;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let transport = StreamTransport::open_default()?;
    ///     println!("Connected to: {}", transport.label());
    ///     Ok(())
    /// }
    /// ```
    pub fn open_default() -> Result<Self> {
        Self::open_with_paths(
            DEFAULT_DEVICE_PATHS,
            DEFAULT_BAUD_RATE,
            CargoRead::Remaining,
            DEFAULT_READ_TIMEOUT,
        )
    }

    /// Open the first serial device in `paths` that succeeds
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line rate
    /// * `mode` - Cargo read behaviour of the link
    /// * `read_timeout` - Upper bound on each `receive`
    pub fn open_with_paths(
        paths: &[&str],
        baud_rate: u32,
        mode: CargoRead,
        read_timeout: Duration,
    ) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(stream) => {
                    info!("Opened sensor hub link at {} ({} baud)", path, baud_rate);
                    let mut transport = Self::new(stream, mode, read_timeout);
                    transport.label = path.to_string();
                    transport.clear_input = Some(clear_serial_input);
                    return Ok(transport);
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(BridgeError::Serial(format!(
            "No serial device found (tried: {})",
            paths.join(", ")
        )))
    }

    /// Open a serial device with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))
    }
}

/// Drop whatever the serial driver has buffered
fn clear_serial_input(stream: &tokio_serial::SerialStream) -> io::Result<()> {
    stream.clear(ClearBuffer::Input).map_err(io::Error::from)
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        debug!("Sent SHTP frame ({} bytes)", data.len());
        Ok(())
    }

    /// Fill `buf` within one read timeout
    ///
    /// A timeout before any byte arrives is `TimedOut`; a timeout after some
    /// bytes arrived returns the short count so the caller knows the stream
    /// advanced.
    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = Instant::now() + self.read_timeout;
        let mut filled = 0;

        while filled < buf.len() {
            match tokio::time::timeout_at(deadline, self.stream.read(&mut buf[filled..])).await {
                Ok(Ok(0)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("{} closed", self.label),
                    ))
                }
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => return Err(e),
                Err(_) if filled == 0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("No data from {} within {:?}", self.label, self.read_timeout),
                    ))
                }
                Err(_) => break,
            }
        }
        Ok(filled)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    /// Clear the driver buffer, then drain until the line stays quiet for
    /// one read timeout
    async fn discard_input(&mut self) -> io::Result<usize> {
        if let Some(clear) = self.clear_input {
            clear(&self.stream)?;
        }

        let deadline = Instant::now() + self.read_timeout * DISCARD_WINDOWS;
        let mut scratch = [0u8; 64];
        let mut discarded = 0;

        while Instant::now() < deadline {
            match tokio::time::timeout(self.read_timeout, self.stream.read(&mut scratch)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e),
            }
        }

        debug!("Discarded {} pending bytes from {}", discarded, self.label);
        Ok(discarded)
    }

    fn cargo_read(&self) -> CargoRead {
        self.mode
    }
}
