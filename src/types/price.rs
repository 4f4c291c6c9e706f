//! Price types: the normalized [`PricePoint`] and backend wire formats.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Price Point
// ---------------------------------------------------------------------------

/// The price of one whole bitcoin at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub currency: String,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal, currency: impl Into<String>) -> Self {
        Self {
            timestamp,
            price,
            currency: currency.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CoinCap
// ---------------------------------------------------------------------------

/// Response of `GET /v2/assets/{id}/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinCapHistory {
    pub data: Vec<CoinCapPrice>,
}

/// A single aggregated CoinCap quote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinCapPrice {
    /// USD price, sent as a decimal string.
    pub price_usd: Decimal,
    /// Start of the bucket (epoch milliseconds).
    pub time: i64,
}

/// Response of `GET /v2/rates`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinCapRates {
    pub data: Vec<CoinCapRate>,
}

/// The USD value of one unit of a currency.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinCapRate {
    pub id: String,
    /// Currency code (e.g. `"EUR"`).
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rate_usd: Decimal,
}

// ---------------------------------------------------------------------------
// CoinDesk
// ---------------------------------------------------------------------------

/// Response of `GET /v1/bpi/historical/close.json`.
///
/// Closing prices keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDeskHistory {
    pub bpi: BTreeMap<String, Decimal>,
}
