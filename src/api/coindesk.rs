//! CoinDesk endpoints: daily Bitcoin Price Index closes.

use chrono::NaiveDate;

use crate::client::PriceClient;
use crate::error::Result;
use crate::types::price::CoinDeskHistory;

impl PriceClient {
    /// Retrieve daily closing prices between two dates (inclusive).
    ///
    /// Dates are sent in `YYYY-MM-DD` format.
    ///
    /// **Endpoint:** `GET /v1/bpi/historical/close.json?start=&end=&currency=`
    pub async fn get_coindesk_close(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        currency: &str,
    ) -> Result<CoinDeskHistory> {
        let query = [
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
            ("currency", currency.to_owned()),
        ];
        self.get("/v1/bpi/historical/close.json", &query).await
    }
}
