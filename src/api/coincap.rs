//! CoinCap endpoints: asset price history and fiat exchange rates.

use chrono::{DateTime, Utc};

use crate::client::PriceClient;
use crate::error::Result;
use crate::types::enums::Granularity;
use crate::types::price::*;

/// CoinCap's identifier for bitcoin.
pub const BITCOIN_ASSET_ID: &str = "bitcoin";

impl PriceClient {
    /// Retrieve USD price history for an asset, aggregated at `granularity`.
    ///
    /// `start` and `end` are sent as epoch milliseconds. A single request may
    /// not span more than [`Granularity::max_query`].
    ///
    /// **Endpoint:** `GET /v2/assets/{id}/history?interval=&start=&end=`
    pub async fn get_coincap_history(
        &self,
        asset_id: &str,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CoinCapHistory> {
        let path = format!("/v2/assets/{asset_id}/history");
        let query = [
            ("interval", granularity.label().to_owned()),
            ("start", start.timestamp_millis().to_string()),
            ("end", end.timestamp_millis().to_string()),
        ];
        self.get(&path, &query).await
    }

    /// Retrieve current USD exchange rates for fiat and crypto currencies.
    ///
    /// **Endpoint:** `GET /v2/rates`
    pub async fn get_coincap_rates(&self) -> Result<CoinCapRates> {
        self.get("/v2/rates", &[]).await
    }
}
