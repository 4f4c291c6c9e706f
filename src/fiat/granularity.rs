//! Granularity selection and query chunking.

use chrono::{DateTime, Duration, Utc};

use crate::constants::price_queries::MAX_QUERY_CHUNKS;
use crate::error::{LedgerError, Result};
use crate::types::enums::Granularity;

/// Pick the finest supported granularity able to cover `duration`.
pub fn best_granularity(duration: Duration) -> Result<Granularity> {
    best_granularity_from(&Granularity::ALL, duration)
}

/// Pick the finest granularity in `supported` (ordered finest first) whose
/// chunked query limit covers `duration`.
///
/// The covered span includes the extra leading bucket added by
/// [`query_windows`], so the chosen granularity never needs more than
/// `MAX_QUERY_CHUNKS` queries.
pub fn best_granularity_from(
    supported: &[Granularity],
    duration: Duration,
) -> Result<Granularity> {
    supported
        .iter()
        .copied()
        .find(|g| duration + g.aggregation() <= g.max_query() * MAX_QUERY_CHUNKS)
        .ok_or(LedgerError::QueryTooLong(duration))
}

/// Split `[start, end)` into consecutive query windows.
///
/// The first window opens one aggregation bucket before `start`, so the
/// first price returned precedes `start`. No window is wider than the
/// granularity's maximum query span.
pub fn query_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows = Vec::new();
    let mut cursor = start - granularity.aggregation();

    while cursor < end {
        let next = (cursor + granularity.max_query()).min(end);
        windows.push((cursor, next));
        cursor = next;
    }

    windows
}
