//! # I2C Transport
//!
//! Carries SHTP frames over a Linux I2C adapter.
//!
//! Every read on the BNO08x I2C interface starts at the beginning of the
//! pending frame, so this transport reports [`CargoRead::FullFrame`]. Bus
//! calls are blocking and run on tokio's blocking pool.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use linux_embedded_hal::I2cdev;
use tracing::{debug, info};

use super::{CargoRead, Transport};
use crate::error::{BridgeError, Result};

/// Default I2C bus number (`/dev/i2c-1` on a Raspberry Pi header)
pub const DEFAULT_I2C_BUS: &str = "1";

/// Default BNO08x address with SA0 pulled low
pub const DEFAULT_I2C_ADDRESS: u8 = 0x4A;

/// Transport over an `embedded-hal` I2C bus
pub struct I2cTransport<D> {
    bus: Arc<Mutex<D>>,
    address: u8,
    label: String,
}

impl<D> std::fmt::Debug for I2cTransport<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I2cTransport")
            .field("label", &self.label)
            .field("address", &format_args!("{:#04x}", self.address))
            .finish_non_exhaustive()
    }
}

impl<D> I2cTransport<D>
where
    D: I2c + Send + 'static,
{
    /// Wrap an already-open bus
    ///
    /// # Arguments
    ///
    /// * `device` - I2C bus the sensor hub sits on
    /// * `address` - 7-bit device address
    pub fn new(device: D, address: u8) -> Self {
        Self {
            bus: Arc::new(Mutex::new(device)),
            address,
            label: "i2c".to_string(),
        }
    }

    /// Human-readable name of the link (device path for Linux adapters)
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Run one bus operation on the blocking pool
    async fn with_bus<R, F>(&self, op: F) -> io::Result<R>
    where
        F: FnOnce(&mut D, u8) -> std::result::Result<R, D::Error> + Send + 'static,
        R: Send + 'static,
    {
        let bus = Arc::clone(&self.bus);
        let address = self.address;

        tokio::task::spawn_blocking(move || {
            let mut device = bus
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "I2C bus lock poisoned"))?;
            op(&mut *device, address).map_err(bus_error)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

impl I2cTransport<I2cdev> {
    /// Open a Linux I2C adapter
    ///
    /// # Arguments
    ///
    /// * `bus` - Bus number (e.g., "1") or device path (e.g., "/dev/i2c-1")
    /// * `address` - 7-bit device address
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::I2c` if the adapter cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sh2_bridge::transport::i2c::{I2cTransport, DEFAULT_I2C_ADDRESS, DEFAULT_I2C_BUS};
    ///
    /// let transport = I2cTransport::open(DEFAULT_I2C_BUS, DEFAULT_I2C_ADDRESS)?;
    /// println!("Connected to: {}", transport.label());
    /// # Ok::<(), sh2_bridge::error::BridgeError>(())
    /// ```
    pub fn open(bus: &str, address: u8) -> Result<Self> {
        let path = bus_path(bus);
        let device = I2cdev::new(&path)
            .map_err(|e| BridgeError::I2c(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened sensor hub link at {} (address {:#04x})", path, address);
        let mut transport = Self::new(device, address);
        transport.label = path;
        Ok(transport)
    }
}

/// Device path for a bus number, or the path itself
pub fn bus_path(bus: &str) -> String {
    if bus.starts_with('/') {
        bus.to_string()
    } else {
        format!("/dev/i2c-{}", bus)
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(e: E) -> io::Error {
    let kind = match e.kind() {
        ErrorKind::NoAcknowledge(_) => io::ErrorKind::NotConnected,
        ErrorKind::ArbitrationLoss => io::ErrorKind::Interrupted,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("I2C {:?}", e))
}

#[async_trait]
impl<D> Transport for I2cTransport<D>
where
    D: I2c + Send + 'static,
{
    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let frame = data.to_vec();
        let len = frame.len();
        self.with_bus(move |device, address| device.write(address, &frame))
            .await?;
        debug!("Sent SHTP frame ({} bytes)", len);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        let data = self
            .with_bus(move |device, address| {
                let mut data = vec![0u8; len];
                device.read(address, &mut data).map(|_| data)
            })
            .await?;
        buf.copy_from_slice(&data);
        Ok(len)
    }

    async fn close(&mut self) -> io::Result<()> {
        debug!("Releasing {}", self.label);
        Ok(())
    }

    async fn discard_input(&mut self) -> io::Result<usize> {
        // The next read starts at a frame boundary anyway
        Ok(0)
    }

    fn cargo_read(&self) -> CargoRead {
        CargoRead::FullFrame
    }
}
