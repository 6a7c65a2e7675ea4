//! # SHTP Framing Module
//!
//! Sensor Hub Transport Protocol framing used by BNO08x-class sensors.
//!
//! This module handles:
//! - Channel identities and framing constants
//! - 4-byte header encoding and decoding
//! - Per-channel sequence number bookkeeping

pub mod protocol;
pub mod header;
pub mod sequence;
