//! Sorted price series and point-in-time lookup.

use chrono::{DateTime, Utc};

use crate::error::{LedgerError, Result};
use crate::fiat::PriceLookup;
use crate::types::price::PricePoint;

/// Price points sorted by ascending timestamp.
///
/// The series is sorted once on construction and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, stably sorting `points` by timestamp.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return the last price at or before `timestamp`.
    ///
    /// Prices are carried forward from the most recent observation; they are
    /// never interpolated.
    pub fn get_price(&self, timestamp: DateTime<Utc>) -> Result<&PricePoint> {
        let first = self.points.first().ok_or(LedgerError::NoPrices)?;
        if timestamp < first.timestamp {
            return Err(LedgerError::PriceOutOfRange {
                requested: timestamp,
                earliest: first.timestamp,
            });
        }

        let idx = self.points.partition_point(|p| p.timestamp <= timestamp);
        Ok(&self.points[idx - 1])
    }
}

impl PriceLookup for PriceSeries {
    fn price_at(&self, timestamp: DateTime<Utc>) -> Result<PricePoint> {
        self.get_price(timestamp).cloned()
    }
}
