//! Constants shared by the ledger engine and the price backends.
//!
//! Contains backend base URLs, unit ratios, and retry/chunking limits.
//! These are used internally by [`PriceClient`](crate::client::PriceClient)
//! and the report assembler, but are also exported for advanced usage.

// ---------------------------------------------------------------------------
// Base URLs
// ---------------------------------------------------------------------------

/// Base URL for the CoinCap REST API.
pub const COINCAP_BASE_URL: &str = "https://api.coincap.io";

/// Base URL for the CoinDesk price index API.
pub const COINDESK_BASE_URL: &str = "https://api.coindesk.com";

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Millisatoshis per satoshi.
pub const MSAT_PER_SAT: i64 = 1_000;

/// Satoshis per bitcoin.
pub const SAT_PER_BTC: i64 = 100_000_000;

/// Millisatoshis per bitcoin; prices are quoted per whole bitcoin.
pub const MSAT_PER_BTC: i64 = MSAT_PER_SAT * SAT_PER_BTC;

/// Currency code every backend natively quotes in.
pub const USD: &str = "USD";

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Suffix appended to a parent entry's reference to form its fee entry's
/// reference.
pub const FEE_REFERENCE_SUFFIX: &str = ":-1";

// ---------------------------------------------------------------------------
// Price queries
// ---------------------------------------------------------------------------

/// Price query limits.
pub mod price_queries {
    /// Maximum number of chunked queries a single granularity may need.
    pub const MAX_QUERY_CHUNKS: i32 = 5;
    /// Attempts made for each chunk before giving up.
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Delay between attempts (seconds).
    pub const RETRY_BACKOFF_SECS: u64 = 2;
    /// Timeout for a single HTTP request (seconds).
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}
