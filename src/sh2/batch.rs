//! # Batch Segmenter
//!
//! Walks input-report cargo that packs zero or more records back to back.
//!
//! Records carry no length prefix; the length comes from the report table.
//! Timestamp base/rebase markers are skipped. The first record whose length
//! is unknown, or that would overrun the buffer, ends the walk: nothing after
//! it can be located reliably.

use tracing::debug;

use super::report::{ReportId, TIMESTAMP_RECORD_LEN};

/// One record located inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Report identity (record byte 0)
    pub report: ReportId,

    /// Offset of the record within the cargo
    pub offset: usize,

    /// Record bytes, exactly the table length for `report`
    pub bytes: &'a [u8],
}

/// Lazy iterator over the records of one cargo buffer
///
/// Created by [`segment`]. Once it returns `None` it stays exhausted.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    cargo: &'a [u8],
    cursor: usize,
    halted: bool,
}

/// Segment a cargo buffer into records
///
/// # Examples
///
/// ```
/// use sh2_bridge::sh2::batch::segment;
/// use sh2_bridge::sh2::report::ReportId;
///
/// let cargo = [
///     0xFB, 0, 0, 0, 0,
///     0x05, 0, 0x03, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
/// ];
/// let records: Vec<_> = segment(&cargo).collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].report, ReportId::RotationVector);
/// assert_eq!(records[0].offset, 5);
/// ```
pub fn segment(cargo: &[u8]) -> Records<'_> {
    Records {
        cargo,
        cursor: 0,
        halted: false,
    }
}

impl<'a> Records<'a> {
    /// Whether the walk stopped on an unknown or incomplete record
    pub fn halted(&self) -> bool {
        self.halted
    }

    fn halt(&mut self, report_id: u8) -> Option<Record<'a>> {
        debug!(
            "Unknown (0x{:02X}) or incomplete report at offset {}, dropping {} bytes",
            report_id,
            self.cursor,
            self.cargo.len() - self.cursor
        );
        self.halted = true;
        None
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.halted && self.cursor < self.cargo.len() {
            let report_id = self.cargo[self.cursor];

            let Some(report) = ReportId::from_u8(report_id) else {
                return self.halt(report_id);
            };

            if report.is_timestamp() {
                self.cursor += TIMESTAMP_RECORD_LEN;
                continue;
            }

            let Some(length) = report.record_length() else {
                return self.halt(report_id);
            };

            let end = self.cursor + length;
            if end > self.cargo.len() {
                return self.halt(report_id);
            }

            let record = Record {
                report,
                offset: self.cursor,
                bytes: &self.cargo[self.cursor..end],
            };
            self.cursor = end;
            return Some(record);
        }

        None
    }
}

impl std::iter::FusedIterator for Records<'_> {}
