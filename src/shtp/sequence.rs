//! # Sequence Tracker
//!
//! One rolling sequence counter per SHTP channel.
//!
//! Outbound frames are stamped with the channel's current counter, which is
//! advanced only once the transport accepted the frame. Inbound headers
//! overwrite the counter with whatever the device sent; gaps and resets are
//! adopted without complaint.

use super::protocol::{Channel, SHTP_NUM_CHANNELS};

/// Per-channel sequence counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    counters: [u8; SHTP_NUM_CHANNELS],
}

impl SequenceTracker {
    /// Create a tracker with every counter at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter for `channel`, without advancing it
    pub fn current(&self, channel: Channel) -> u8 {
        self.counters[channel.index()]
    }

    /// Return the counter for `channel`, then advance it (wrapping at 256)
    ///
    /// Call only after a successful send on that channel.
    pub fn next(&mut self, channel: Channel) -> u8 {
        let slot = &mut self.counters[channel.index()];
        let value = *slot;
        *slot = value.wrapping_add(1);
        value
    }

    /// Overwrite the counter for `channel` with an inbound sequence number
    pub fn observe(&mut self, channel: Channel, sequence: u8) {
        self.counters[channel.index()] = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let tracker = SequenceTracker::new();
        for channel in Channel::ALL {
            assert_eq!(tracker.current(channel), 0);
        }
    }

    #[test]
    fn test_next_returns_then_increments() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.next(Channel::Control), 0);
        assert_eq!(tracker.next(Channel::Control), 1);
        assert_eq!(tracker.current(Channel::Control), 2);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut tracker = SequenceTracker::new();
        tracker.next(Channel::Control);
        tracker.next(Channel::Control);
        tracker.next(Channel::Executable);

        assert_eq!(tracker.current(Channel::Control), 2);
        assert_eq!(tracker.current(Channel::Executable), 1);
        assert_eq!(tracker.current(Channel::InputSensorReports), 0);
    }

    #[test]
    fn test_wraps_after_256_sends() {
        let mut tracker = SequenceTracker::new();
        let initial = tracker.current(Channel::Control);
        for _ in 0..256 {
            tracker.next(Channel::Control);
        }
        assert_eq!(tracker.next(Channel::Control), initial);
    }

    #[test]
    fn test_observe_overwrites() {
        let mut tracker = SequenceTracker::new();
        tracker.next(Channel::InputSensorReports);
        tracker.observe(Channel::InputSensorReports, 200);
        assert_eq!(tracker.current(Channel::InputSensorReports), 200);

        // Going backwards is accepted too
        tracker.observe(Channel::InputSensorReports, 3);
        assert_eq!(tracker.current(Channel::InputSensorReports), 3);
    }

    #[test]
    fn test_observe_then_next() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(Channel::Control, 255);
        assert_eq!(tracker.next(Channel::Control), 255);
        assert_eq!(tracker.current(Channel::Control), 0);
    }
}
