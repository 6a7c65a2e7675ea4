//! # SHTP Header Codec
//!
//! Encodes and decodes the 4-byte header that prefixes every SHTP frame.
//!
//! ```text
//! Byte 0-1: Length (little-endian, includes header, bit 15 masked)
//! Byte 2:   Channel
//! Byte 3:   Sequence number
//! ```

use bytes::{Buf, BufMut};

use super::protocol::*;
use crate::error::{BridgeError, Result};

/// Decoded SHTP frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total frame length, header included
    pub length: u16,

    /// Raw channel byte
    pub channel: u8,

    /// Sequence number for this channel
    pub sequence: u8,
}

impl Header {
    /// Create a header for a frame carrying `cargo_len` bytes of cargo
    ///
    /// # Errors
    ///
    /// Returns error if the resulting frame length does not fit in 15 bits
    pub fn for_cargo(channel: Channel, sequence: u8, cargo_len: usize) -> Result<Self> {
        let length = cargo_len + SHTP_HEADER_LEN;
        if length > SHTP_MAX_FRAME_LEN {
            return Err(BridgeError::Format(format!(
                "Frame length {} exceeds maximum {}",
                length, SHTP_MAX_FRAME_LEN
            )));
        }

        Ok(Self {
            length: length as u16,
            channel: channel as u8,
            sequence,
        })
    }

    /// Decode a header from the first 4 bytes of `data`
    ///
    /// # Arguments
    ///
    /// * `data` - Raw bytes, at least 4 long
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Format` if fewer than 4 bytes are supplied
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < SHTP_HEADER_LEN {
            return Err(BridgeError::Format(format!(
                "Header too short: {} bytes",
                data.len()
            )));
        }

        let mut buf = &data[..SHTP_HEADER_LEN];
        let length = buf.get_u16_le() & SHTP_LENGTH_MASK;
        let channel = buf.get_u8();
        let sequence = buf.get_u8();

        Ok(Self {
            length,
            channel,
            sequence,
        })
    }

    /// Encode the header into its 4-byte wire form
    pub fn encode(&self) -> [u8; SHTP_HEADER_LEN] {
        let mut out = [0u8; SHTP_HEADER_LEN];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.length & SHTP_LENGTH_MASK);
        buf.put_u8(self.channel);
        buf.put_u8(self.sequence);
        out
    }

    /// Number of cargo bytes following the header
    pub fn cargo_len(&self) -> usize {
        (self.length as usize).saturating_sub(SHTP_HEADER_LEN)
    }

    /// Whether the frame carries no cargo
    pub fn is_empty(&self) -> bool {
        self.length as usize <= SHTP_HEADER_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_header() {
        let header = Header::decode(&[0x17, 0x00, 0x03, 0x2A]).unwrap();
        assert_eq!(header.length, 23);
        assert_eq!(header.channel, 3);
        assert_eq!(header.sequence, 0x2A);
        assert_eq!(header.cargo_len(), 19);
    }

    #[test]
    fn test_decode_header_too_short() {
        let result = Header::decode(&[0x17, 0x00, 0x03]);
        assert!(matches!(result, Err(BridgeError::Format(_))));
    }

    #[test]
    fn test_decode_masks_continuation_bit() {
        let header = Header::decode(&[0x14, 0x80, 0x02, 0x01]).unwrap();
        assert_eq!(header.length, 0x0014);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let header = Header::decode(&[0x06, 0x00, 0x02, 0x05, 0xF8, 0x00]).unwrap();
        assert_eq!(header.length, 6);
        assert_eq!(header.channel, 2);
        assert_eq!(header.sequence, 5);
    }

    #[test]
    fn test_encode_header() {
        let header = Header {
            length: 0x0119,
            channel: 2,
            sequence: 7,
        };
        assert_eq!(header.encode(), [0x19, 0x01, 0x02, 0x07]);
    }

    #[test]
    fn test_encode_never_sets_top_bit() {
        let header = Header {
            length: 0xFFFF,
            channel: 0,
            sequence: 0,
        };
        let bytes = header.encode();
        assert_eq!(bytes[1] & 0x80, 0);
    }

    #[test]
    fn test_round_trip_extremes() {
        for length in [4u16, 5, 255, 256, 0x4000, 32767] {
            for channel in [0u8, 5, 255] {
                for sequence in [0u8, 1, 128, 255] {
                    let header = Header { length, channel, sequence };
                    assert_eq!(Header::decode(&header.encode()).unwrap(), header);
                }
            }
        }
    }

    #[test]
    fn test_empty_frame() {
        let header = Header::decode(&[0x04, 0x00, 0x03, 0x00]).unwrap();
        assert!(header.is_empty());
        assert_eq!(header.cargo_len(), 0);

        let header = Header::decode(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert!(header.is_empty());
        assert_eq!(header.cargo_len(), 0);
    }

    #[test]
    fn test_for_cargo() {
        let header = Header::for_cargo(Channel::Control, 3, 21).unwrap();
        assert_eq!(header.length, 25);
        assert_eq!(header.channel, 2);
        assert_eq!(header.sequence, 3);
    }

    #[test]
    fn test_for_cargo_too_large() {
        let result = Header::for_cargo(Channel::Control, 0, SHTP_MAX_FRAME_LEN);
        assert!(matches!(result, Err(BridgeError::Format(_))));

        // Exactly at the limit is fine
        let header = Header::for_cargo(Channel::Control, 0, SHTP_MAX_FRAME_LEN - 4).unwrap();
        assert_eq!(header.length as usize, SHTP_MAX_FRAME_LEN);
    }
}
