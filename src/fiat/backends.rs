//! HTTP price backends.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::OnceCell;

use crate::api::coincap::BITCOIN_ASSET_ID;
use crate::client::PriceClient;
use crate::constants::{COINCAP_BASE_URL, COINDESK_BASE_URL, USD};
use crate::error::{LedgerError, Result};
use crate::fiat::convert::usd_to_currency;
use crate::fiat::oracle::PriceBackend;
use crate::types::enums::Granularity;
use crate::types::price::{CoinCapHistory, CoinCapRates, CoinDeskHistory, PricePoint};

// ---------------------------------------------------------------------------
// CoinCap
// ---------------------------------------------------------------------------

/// CoinCap history, converted from USD through `/v2/rates` when another
/// currency is requested.
#[derive(Debug)]
pub struct CoinCapBackend {
    client: PriceClient,
    currency: String,
    /// USD value of one unit of `currency`, fetched once.
    usd_rate: OnceCell<Decimal>,
}

impl CoinCapBackend {
    pub fn new(client: PriceClient, currency: impl Into<String>) -> Self {
        Self {
            client,
            currency: currency.into(),
            usd_rate: OnceCell::new(),
        }
    }

    /// A backend pointing at the public CoinCap API.
    pub fn public(currency: impl Into<String>) -> Result<Self> {
        Ok(Self::new(PriceClient::new(COINCAP_BASE_URL)?, currency))
    }

    async fn usd_rate(&self) -> Result<Decimal> {
        let rate = self
            .usd_rate
            .get_or_try_init(|| async {
                let rates = self.client.get_coincap_rates().await?;
                fiat_usd_rate(&rates, &self.currency)
            })
            .await?;
        Ok(*rate)
    }

    /// Convert USD points into the backend's currency.
    async fn convert(&self, points: Vec<PricePoint>) -> Result<Vec<PricePoint>> {
        if self.currency == USD {
            return Ok(points);
        }
        usd_to_currency(points, self.usd_rate().await?, &self.currency)
    }
}

/// USD value of one unit of the fiat currency `currency`.
///
/// Crypto assets may share a fiat symbol, so only `fiat` rates count.
fn fiat_usd_rate(rates: &CoinCapRates, currency: &str) -> Result<Decimal> {
    rates
        .data
        .iter()
        .find(|r| r.kind == "fiat" && r.symbol.eq_ignore_ascii_case(currency))
        .map(|r| r.rate_usd)
        .ok_or_else(|| LedgerError::UnknownCurrency(currency.to_owned()))
}

/// USD price points from a CoinCap history response.
fn coincap_points(history: CoinCapHistory) -> Result<Vec<PricePoint>> {
    history
        .data
        .into_iter()
        .map(|p| {
            let timestamp = DateTime::from_timestamp_millis(p.time).ok_or_else(|| {
                LedgerError::InvalidArgument(format!("price timestamp {} out of range", p.time))
            })?;
            Ok(PricePoint::new(timestamp, p.price_usd, USD))
        })
        .collect()
}

#[async_trait]
impl PriceBackend for CoinCapBackend {
    fn name(&self) -> &'static str {
        "coincap"
    }

    async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<PricePoint>> {
        let history = self
            .client
            .get_coincap_history(BITCOIN_ASSET_ID, granularity, start, end)
            .await?;

        self.convert(coincap_points(history)?).await
    }
}

// ---------------------------------------------------------------------------
// CoinDesk
// ---------------------------------------------------------------------------

/// CoinDesk daily closes, quoted natively in the requested currency.
#[derive(Debug)]
pub struct CoinDeskBackend {
    client: PriceClient,
    currency: String,
}

impl CoinDeskBackend {
    pub fn new(client: PriceClient, currency: impl Into<String>) -> Self {
        Self {
            client,
            currency: currency.into(),
        }
    }

    /// A backend pointing at the public CoinDesk API.
    pub fn public(currency: impl Into<String>) -> Result<Self> {
        Ok(Self::new(PriceClient::new(COINDESK_BASE_URL)?, currency))
    }
}

#[async_trait]
impl PriceBackend for CoinDeskBackend {
    fn name(&self) -> &'static str {
        "coindesk"
    }

    fn granularities(&self) -> &[Granularity] {
        &[Granularity::Day]
    }

    async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _granularity: Granularity,
    ) -> Result<Vec<PricePoint>> {
        let (first, last) = coindesk_dates(start, end);
        let history = self.client.get_coindesk_close(first, last, &self.currency).await?;
        coindesk_points(history, &self.currency)
    }
}

/// Inclusive date range covering `[start, end)`; never empty.
fn coindesk_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let first = start.date_naive();
    let last = (end - Duration::seconds(1)).date_naive().max(first);
    (first, last)
}

/// Midnight UTC price points from a CoinDesk close response.
fn coindesk_points(history: CoinDeskHistory, currency: &str) -> Result<Vec<PricePoint>> {
    history
        .bpi
        .into_iter()
        .map(|(day, price)| {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                LedgerError::InvalidArgument(format!("bad price date {day:?}: {e}"))
            })?;
            let timestamp = date.and_time(NaiveTime::MIN).and_utc();
            Ok(PricePoint::new(timestamp, price, currency))
        })
        .collect()
}
