//! # Reading Store
//!
//! Latest decoded value and accuracy per report.
//!
//! Entries are overwritten, never merged, each time a fresh record of that
//! report arrives. The store lives as long as its session.

use std::collections::{BTreeMap, HashSet};

use crate::sh2::reading::{Accuracy, ProductId, Reading};
use crate::sh2::report::ReportId;

/// Latest readings keyed by report
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    readings: BTreeMap<ReportId, Reading>,
    accuracies: BTreeMap<ReportId, Accuracy>,
    responses: HashSet<ReportId>,
    product_id: Option<ProductId>,
}

/// One entry of a store snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredReading {
    pub report: ReportId,
    pub reading: Reading,
    pub accuracy: Accuracy,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly decoded value, replacing any previous one
    pub fn update(&mut self, report: ReportId, reading: Reading, accuracy: Accuracy) {
        self.readings.insert(report, reading);
        self.accuracies.insert(report, accuracy);
    }

    pub fn reading(&self, report: ReportId) -> Option<Reading> {
        self.readings.get(&report).copied()
    }

    /// Last accuracy for `report`; `Unreliable` if nothing was decoded yet
    pub fn accuracy(&self, report: ReportId) -> Accuracy {
        self.accuracies.get(&report).copied().unwrap_or_default()
    }

    /// Mark a control response as seen
    pub fn mark_response(&mut self, report: ReportId) {
        self.responses.insert(report);
    }

    /// Forget a control response, before issuing a fresh request
    pub fn clear_response(&mut self, report: ReportId) {
        self.responses.remove(&report);
        if report == ReportId::ProductIdResponse {
            self.product_id = None;
        }
    }

    pub fn set_product_id(&mut self, product_id: ProductId) {
        self.product_id = Some(product_id);
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    /// Whether a reading or control response exists for `report`
    pub fn contains(&self, report: ReportId) -> bool {
        self.readings.contains_key(&report) || self.responses.contains(&report)
    }

    /// Copy of every stored reading, ordered by report ID
    pub fn snapshot(&self) -> Vec<StoredReading> {
        self.readings
            .iter()
            .map(|(&report, &reading)| StoredReading {
                report,
                reading,
                accuracy: self.accuracy(report),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
