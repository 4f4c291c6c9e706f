//! Report assembly.
//!
//! [`ReportBuilder`] wires the node collaborators and an optional price
//! backend into a [`ReportGenerator`], which validates a [`ReportConfig`],
//! builds the fiat valuation and combines both halves of the ledger.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use ln_ledger::ledger::source::{OnChainSource, OffChainSource};
//! use chrono::{Duration, Utc};
//! use ln_ledger::fiat::CoinCapBackend;
//! use ln_ledger::{ReportBuilder, ReportConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(
//! #     wallet: Arc<dyn OnChainSource>,
//! #     node: Arc<dyn OffChainSource>,
//! # ) -> ln_ledger::Result<()> {
//! let generator = ReportBuilder::new(wallet, node)
//!     .price_backend(Arc::new(CoinCapBackend::public("USD")?))
//!     .build();
//!
//! let end = Utc::now();
//! let config = ReportConfig::new(end - Duration::days(30), end);
//! let report = generator.generate(&config, &CancellationToken::new()).await?;
//! println!("{} entries", report.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::{GranularityChoice, ReportConfig};
use crate::error::{LedgerError, Result};
use crate::fiat::{PriceBackend, PriceLookup, PriceOracle, PriceSeries, RetryPolicy, ZeroPrice};
use crate::ledger::categories::CategoryMatcher;
use crate::ledger::offchain::off_chain_report;
use crate::ledger::onchain::{OnChainData, on_chain_report};
use crate::ledger::source::{FeeLookup, OffChainSource, OnChainSource};
use crate::types::entry::{LedgerEntry, Report};

/// Collects the collaborators needed to generate reports.
pub struct ReportBuilder {
    on_chain: Arc<dyn OnChainSource>,
    off_chain: Arc<dyn OffChainSource>,
    fees: Option<Arc<dyn FeeLookup>>,
    prices: Option<Arc<dyn PriceBackend>>,
    retry: RetryPolicy,
}

impl ReportBuilder {
    pub fn new(on_chain: Arc<dyn OnChainSource>, off_chain: Arc<dyn OffChainSource>) -> Self {
        Self {
            on_chain,
            off_chain,
            fees: None,
            prices: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Look up fees of cooperative closes for channels we opened.
    ///
    /// Without a fee lookup, close fees are not recorded.
    #[must_use]
    pub fn fee_lookup(mut self, fees: Arc<dyn FeeLookup>) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Backend used when the config asks for fiat valuation without custom
    /// prices.
    #[must_use]
    pub fn price_backend(mut self, backend: Arc<dyn PriceBackend>) -> Self {
        self.prices = Some(backend);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> ReportGenerator {
        ReportGenerator {
            on_chain: self.on_chain,
            off_chain: self.off_chain,
            fees: self.fees,
            prices: self.prices,
            retry: self.retry,
        }
    }
}

/// Generates ledger reports for a node.
#[derive(Clone)]
pub struct ReportGenerator {
    on_chain: Arc<dyn OnChainSource>,
    off_chain: Arc<dyn OffChainSource>,
    fees: Option<Arc<dyn FeeLookup>>,
    prices: Option<Arc<dyn PriceBackend>>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("fee_lookup", &self.fees.is_some())
            .field("price_backend", &self.prices.as_ref().map(|b| b.name()))
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Validated config plus its compiled categories.
struct Prepared {
    categories: CategoryMatcher,
    prices: Box<dyn PriceLookup>,
}

/// Every price must be quoted in the report currency.
fn ensure_currency(series: &PriceSeries, currency: &str, origin: &str) -> Result<()> {
    match series.points().iter().find(|p| p.currency != currency) {
        Some(point) => Err(LedgerError::InvalidArgument(format!(
            "{origin} are quoted in {}, report requires {currency}",
            point.currency
        ))),
        None => Ok(()),
    }
}

fn ensure_running(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(LedgerError::ShuttingDown);
    }
    Ok(())
}

impl ReportGenerator {
    /// Generate the full report for `config`, sorted by timestamp.
    ///
    /// Any error aborts the report; no partial result is returned.
    pub async fn generate(
        &self,
        config: &ReportConfig,
        cancel: &CancellationToken,
    ) -> Result<Report> {
        let prepared = self.prepare(config, cancel).await?;

        let mut entries = self.on_chain_entries(config, &prepared).await?;
        ensure_running(cancel)?;
        entries.extend(self.off_chain_entries(config, &prepared).await?);
        ensure_running(cancel)?;

        let report = Report::new(entries);
        tracing::info!(entries = report.len(), "report generated");
        Ok(report)
    }

    /// Generate only the on-chain half of the report.
    pub async fn generate_on_chain(
        &self,
        config: &ReportConfig,
        cancel: &CancellationToken,
    ) -> Result<Report> {
        let prepared = self.prepare(config, cancel).await?;
        let entries = self.on_chain_entries(config, &prepared).await?;
        ensure_running(cancel)?;
        Ok(Report::new(entries))
    }

    /// Generate only the off-chain half of the report.
    pub async fn generate_off_chain(
        &self,
        config: &ReportConfig,
        cancel: &CancellationToken,
    ) -> Result<Report> {
        let prepared = self.prepare(config, cancel).await?;
        let entries = self.off_chain_entries(config, &prepared).await?;
        ensure_running(cancel)?;
        Ok(Report::new(entries))
    }

    async fn prepare(&self, config: &ReportConfig, cancel: &CancellationToken) -> Result<Prepared> {
        let categories = config.validate(Utc::now())?;
        ensure_running(cancel)?;

        let prices = self.valuation(config, cancel).await?;
        ensure_running(cancel)?;

        Ok(Prepared { categories, prices })
    }

    async fn on_chain_entries(
        &self,
        config: &ReportConfig,
        prepared: &Prepared,
    ) -> Result<Vec<LedgerEntry>> {
        let data = OnChainData::fetch(self.on_chain.as_ref()).await?;
        on_chain_report(
            data,
            config,
            &prepared.categories,
            self.fees.as_deref(),
            &*prepared.prices,
        )
        .await
    }

    async fn off_chain_entries(
        &self,
        config: &ReportConfig,
        prepared: &Prepared,
    ) -> Result<Vec<LedgerEntry>> {
        off_chain_report(
            self.off_chain.as_ref(),
            config,
            &prepared.categories,
            &*prepared.prices,
        )
        .await
    }

    /// Price lookup for the report period.
    ///
    /// Disabled valuation prices everything at zero, custom prices are used
    /// as given, and otherwise the price backend is queried for the whole
    /// period.
    async fn valuation(
        &self,
        config: &ReportConfig,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn PriceLookup>> {
        if config.disable_fiat {
            tracing::debug!("fiat valuation disabled");
            return Ok(Box::new(ZeroPrice::new(config.fiat_currency.clone())));
        }
        if !config.custom_prices.is_empty() {
            tracing::debug!(points = config.custom_prices.len(), "using custom prices");
            let series = PriceSeries::new(config.custom_prices.clone());
            ensure_currency(&series, &config.fiat_currency, "custom prices")?;
            return Ok(Box::new(series));
        }

        let backend = self.prices.clone().ok_or_else(|| {
            LedgerError::InvalidArgument("fiat valuation requires a price backend".into())
        })?;
        let oracle = match config.granularity {
            Some(GranularityChoice::Fixed(granularity)) => PriceOracle::new(backend, granularity)?,
            Some(GranularityChoice::BestEffort) => {
                PriceOracle::best_effort(backend, config.start, config.end)?
            }
            None => return Err(LedgerError::GranularityRequired),
        }
        .with_retry_policy(self.retry);

        let series = oracle.price_series(config.start, config.end, cancel).await?;
        ensure_currency(&series, &config.fiat_currency, "price backend")?;
        Ok(Box::new(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node::*;
    use crate::types::price::PricePoint;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone};
    use rust_decimal_macros::dec;

    struct Empty;

    #[async_trait]
    impl OnChainSource for Empty {
        async fn list_channels(&self) -> Result<Vec<Channel>> {
            Ok(Vec::new())
        }
        async fn list_closed_channels(&self) -> Result<Vec<ClosedChannel>> {
            Ok(Vec::new())
        }
        async fn list_transactions(&self) -> Result<Vec<OnChainTransaction>> {
            Ok(Vec::new())
        }
        async fn list_sweeps(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl OffChainSource for Empty {
        async fn node_pubkey(&self) -> Result<String> {
            Ok("02own".into())
        }
        async fn list_invoices(&self) -> Result<Vec<Invoice>> {
            Ok(Vec::new())
        }
        async fn list_payments(&self) -> Result<Vec<Payment>> {
            Ok(Vec::new())
        }
        async fn list_forwards(
            &self,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<Vec<ForwardingEvent>> {
            Ok(Vec::new())
        }
        async fn decode_payment_request(&self, _: &str) -> Result<PayReq> {
            Err(LedgerError::InvalidArgument("no payment requests".into()))
        }
    }

    fn generator() -> ReportGenerator {
        ReportBuilder::new(Arc::new(Empty), Arc::new(Empty)).build()
    }

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    #[tokio::test]
    async fn pricing_without_backend_fails() {
        let config = ReportConfig::new(t(0), t(5));
        let err = generator()
            .generate(&config, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn custom_prices_skip_the_backend() {
        let config = ReportConfig::new(t(0), t(5))
            .with_granularity(None)
            .with_custom_prices(vec![PricePoint::new(t(0), dec!(42000), "USD")]);
        let prices = generator()
            .valuation(&config, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(prices.price_at(t(3)).unwrap().price, dec!(42000));
    }

    #[tokio::test]
    async fn custom_prices_must_use_report_currency() {
        let config = ReportConfig::new(t(0), t(5))
            .with_currency("EUR")
            .with_custom_prices(vec![PricePoint::new(t(0), dec!(42000), "USD")]);
        let err = generator()
            .generate(&config, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(ref msg) if msg.contains("EUR")));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = ReportConfig::new(t(0), t(5)).without_fiat();
        let err = generator().generate(&config, &cancel).await.unwrap_err();
        assert!(matches!(err, LedgerError::ShuttingDown));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_first() {
        let config = ReportConfig::new(t(5), t(0)).without_fiat();
        let err = generator()
            .generate(&config, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange { .. }));
    }
}
