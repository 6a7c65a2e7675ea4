//! # SH2 Bridge Library
//!
//! Decode BNO08x sensor hub telemetry carried over SHTP framing.
//!
//! This library provides the SHTP frame layer, the SH-2 report decoder, and a
//! session that keeps the latest orientation and motion readings from a sensor
//! hub reachable over any byte transport.

pub mod config;
pub mod error;
pub mod session;
pub mod sh2;
pub mod shtp;
pub mod telemetry;
pub mod transport;
