//! # SH-2 Sensor Hub Module
//!
//! SH-2 report layer carried inside SHTP cargo.
//!
//! This module handles:
//! - Report identities and the fixed record-length / Q-point table
//! - Segmenting batched input-report cargo into records
//! - Fixed-point decoding into vectors, quaternions and classifier bytes
//! - Quaternion to Euler angle conversion
//! - Building control payloads (Set Feature, Product ID request, reset)

pub mod report;
pub mod reading;
pub mod decoder;
pub mod batch;
pub mod command;
pub mod euler;
