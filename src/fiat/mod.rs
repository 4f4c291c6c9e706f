//! Fiat valuation: price backends, the chunked price oracle, and point
//! lookups.
//!
//! ```text
//!  PriceBackend ──query()──▶ PriceOracle ──price_series()──▶ PriceSeries
//!  (CoinCap, CoinDesk)       (chunks, retries)               (get_price)
//! ```
//!
//! Ledger entries are valued through the [`PriceLookup`] trait, implemented
//! by [`PriceSeries`] and by [`ZeroPrice`] when valuation is disabled.

pub mod backends;
pub mod convert;
pub mod granularity;
pub mod oracle;
pub mod retry;
pub mod series;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::types::price::PricePoint;

pub use backends::{CoinCapBackend, CoinDeskBackend};
pub use convert::{msat_to_fiat, usd_to_currency};
pub use granularity::{best_granularity, best_granularity_from, query_windows};
pub use oracle::{PriceBackend, PriceOracle};
pub use retry::RetryPolicy;
pub use series::PriceSeries;

/// Answers "what was the price at `timestamp`?".
pub trait PriceLookup: Send + Sync {
    fn price_at(&self, timestamp: DateTime<Utc>) -> Result<PricePoint>;
}

/// Prices everything at zero; used when fiat valuation is disabled.
#[derive(Debug, Clone)]
pub struct ZeroPrice {
    currency: String,
}

impl ZeroPrice {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl PriceLookup for ZeroPrice {
    fn price_at(&self, timestamp: DateTime<Utc>) -> Result<PricePoint> {
        Ok(PricePoint::new(timestamp, Decimal::ZERO, self.currency.clone()))
    }
}
