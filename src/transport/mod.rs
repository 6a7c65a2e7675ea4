//! # Transport Module
//!
//! Byte-in/byte-out boundary between the protocol engine and the bus.
//!
//! The session never touches the bus directly. It only needs to write a
//! complete frame, read an exact number of bytes, and tear the link down.
//! How cargo is re-read after the header differs per bus and is reported by
//! the transport through [`CargoRead`].
//!
//! Two buses are provided:
//! - [`I2cTransport`] for a Linux I2C adapter (full-frame re-reads)
//! - [`StreamTransport`] for serial ports and other byte streams

pub mod i2c;
pub mod serial;

use async_trait::async_trait;
use serde::Deserialize;
use std::io;

pub use i2c::I2cTransport;
pub use serial::StreamTransport;

/// Bus used to reach the sensor hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    I2c,
    Serial,
}

/// How a transport delivers the cargo after the header has been read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CargoRead {
    /// A new read restarts at offset 0, so the whole frame (header included)
    /// is read again. BNO08x over I²C behaves this way.
    FullFrame,

    /// Reads continue where the header left off; only `length - 4` bytes
    /// follow.
    #[default]
    Remaining,
}

/// Trait for transport I/O operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Write one complete frame
    async fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Fill `buf`, returning the number of bytes read
    ///
    /// Anything less than `buf.len()` is a short read.
    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the underlying bus
    async fn close(&mut self) -> io::Result<()>;

    /// Drop pending inbound bytes after a frame was lost part way
    ///
    /// Returns the number of bytes discarded. Buses whose reads always start
    /// at a frame boundary have nothing to drop.
    async fn discard_input(&mut self) -> io::Result<usize>;

    /// Cargo read behaviour of this bus
    fn cargo_read(&self) -> CargoRead;
}
