//! Error types for the `ln-ledger` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, LedgerError>`.
//!
//! [`LedgerError`] covers:
//! - **Validation errors**: Bad time ranges, missing granularity, malformed categories
//! - **Data-consistency errors**: Duplicate payments, conflicting self-payments, unexpected fees
//! - **Price errors**: Empty series, out-of-range lookups, exhausted retries, shutdown
//! - **HTTP / JSON / URL errors**: Failures talking to a price backend
//! - **Source errors**: Failures reported by a node data collaborator

use std::fmt;

use chrono::{DateTime, Utc};

/// Error body returned by JSON price APIs (`{"error": "..."}`).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable description of the error.
    #[serde(default)]
    pub error: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error.as_deref().unwrap_or("No message"))
    }
}

/// All possible errors produced while building an accounting report.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    // -- validation ---------------------------------------------------------
    /// The report end time does not come after its start time.
    #[error("invalid range: end {end} is not after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The report starts in the future.
    #[error("range starts in the future: {start} is after {now}")]
    FutureRange {
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// Fiat valuation is enabled but no price granularity was chosen.
    #[error("price granularity required when fiat valuation is enabled")]
    GranularityRequired,

    /// A custom category is malformed.
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// A custom category pattern failed to compile.
    #[error("invalid category pattern: {0}")]
    Regex(#[from] regex::Error),

    /// The caller provided an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -- data consistency ---------------------------------------------------
    /// Two settled payments share a payment hash.
    #[error("duplicates not supported: payment hash {0} appears more than once")]
    DuplicatesNotSupported(String),

    /// Two payments share a hash but only one of them was paid to ourselves.
    #[error("different duplicates: payment hash {0} is both a circular and a regular payment")]
    DifferentDuplicates(String),

    /// An incoming on-chain transaction carries a fee.
    #[error("receive with fee: transaction {txid} has fee {fee_sat} sat")]
    ReceiveWithFee { txid: String, fee_sat: i64 },

    /// A transaction's fee would have to be split across several entries.
    #[error("batched transaction {0}: fee attribution across outputs is not supported")]
    BatchedTransaction(String),

    /// More than one custom category matched a single entry.
    #[error("entry {reference} matches multiple categories: {categories:?}")]
    MultipleCategories {
        reference: String,
        categories: Vec<String>,
    },

    // -- prices -------------------------------------------------------------
    /// No granularity can cover the requested period.
    #[error("query too long: no granularity covers {0}")]
    QueryTooLong(chrono::Duration),

    /// A price lookup was made against an empty series.
    #[error("no prices available")]
    NoPrices,

    /// A price lookup preceded the first point of the series.
    #[error("price out of range: {requested} is before earliest price {earliest}")]
    PriceOutOfRange {
        requested: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },

    /// Every attempt of a retried query failed.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Cancellation was requested while work was pending.
    #[error("shutting down")]
    ShuttingDown,

    /// The backend has no exchange rate for the requested currency.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    // -- transport ----------------------------------------------------------
    /// An error response returned by a price API.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to deserialize a JSON response body.
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    // -- collaborators ------------------------------------------------------
    /// A node data source failed.
    #[error("source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Wrap an arbitrary collaborator failure.
    pub fn from_source(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Source(err.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LedgerError>;
