//! The price oracle: chunked, retried historical price queries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{LedgerError, Result};
use crate::fiat::granularity::{best_granularity_from, query_windows};
use crate::fiat::retry::RetryPolicy;
use crate::fiat::series::PriceSeries;
use crate::types::enums::Granularity;
use crate::types::price::PricePoint;

/// A source of historical bitcoin prices.
#[async_trait]
pub trait PriceBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Granularities the backend can aggregate at, finest first.
    fn granularities(&self) -> &[Granularity] {
        &Granularity::ALL
    }

    /// Fetch prices for `[start, end)` at `granularity`.
    ///
    /// `end - start` never exceeds `granularity.max_query()`.
    async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<PricePoint>>;
}

/// Fetches price series from a [`PriceBackend`] in bounded chunks.
///
/// Chunks are fetched one after another so that backend rate limits are
/// respected; each chunk is retried according to the [`RetryPolicy`].
#[derive(Clone)]
pub struct PriceOracle {
    backend: Arc<dyn PriceBackend>,
    granularity: Granularity,
    retry: RetryPolicy,
}

impl std::fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceOracle")
            .field("backend", &self.backend.name())
            .field("granularity", &self.granularity)
            .field("retry", &self.retry)
            .finish()
    }
}

impl PriceOracle {
    /// Create an oracle querying at a fixed granularity.
    pub fn new(backend: Arc<dyn PriceBackend>, granularity: Granularity) -> Result<Self> {
        if !backend.granularities().contains(&granularity) {
            return Err(LedgerError::InvalidArgument(format!(
                "{} does not support granularity {granularity}",
                backend.name()
            )));
        }
        Ok(Self {
            backend,
            granularity,
            retry: RetryPolicy::default(),
        })
    }

    /// Create an oracle using the finest granularity the backend supports
    /// for a period of `[start, end)`.
    pub fn best_effort(
        backend: Arc<dyn PriceBackend>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let granularity = best_granularity_from(backend.granularities(), end - start)?;
        Self::new(backend, granularity)
    }

    /// Replace the default retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Fetch every price needed to value timestamps in `[start, end)`.
    ///
    /// The first chunk starts one aggregation bucket early so that a price
    /// at or before `start` is available.
    pub async fn price_series(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<PriceSeries> {
        let windows = query_windows(start, end, self.granularity);
        tracing::info!(
            backend = self.backend.name(),
            granularity = %self.granularity,
            chunks = windows.len(),
            %start,
            %end,
            "fetching price series"
        );

        let mut points = Vec::new();
        for (from, to) in windows {
            let chunk = self
                .retry
                .run(cancel, || self.backend.query(from, to, self.granularity))
                .await?;
            tracing::debug!(%from, %to, count = chunk.len(), "price chunk");
            points.extend(chunk);
        }

        Ok(PriceSeries::new(points))
    }

    /// Look up the price at each of `timestamps`, fetching only the period
    /// they span.
    pub async fn prices_at(
        &self,
        timestamps: &[DateTime<Utc>],
        cancel: &CancellationToken,
    ) -> Result<Vec<PricePoint>> {
        let (Some(first), Some(last)) = (timestamps.iter().min(), timestamps.iter().max()) else {
            return Ok(Vec::new());
        };

        // `end` is exclusive, so extend past the latest timestamp
        let end = *last + self.granularity.aggregation();
        let series = self.price_series(*first, end, cancel).await?;
        timestamps
            .iter()
            .map(|ts| series.get_price(*ts).cloned())
            .collect()
    }
}
