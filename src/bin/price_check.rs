//! Fetch a short BTC price series from CoinCap and print it, for checking
//! backend connectivity and granularity selection.
//!
//! # Usage
//!
//! ```sh
//! export COINCAP_API_KEY="your-api-key"   # optional
//! export PRICE_CHECK_DAYS=3               # optional, defaults to 1
//! export PRICE_CHECK_CURRENCY=EUR         # optional, defaults to USD
//! cargo run --bin price_check --features cli
//! ```

use std::env;
use std::sync::Arc;

use chrono::{Duration, Utc};
use ln_ledger::client::PriceClient;
use ln_ledger::constants::{COINCAP_BASE_URL, USD};
use ln_ledger::error::LedgerError;
use ln_ledger::fiat::{CoinCapBackend, PriceOracle};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ln_ledger::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let days: i64 = match env::var("PRICE_CHECK_DAYS") {
        Ok(days) => days
            .parse()
            .map_err(|_| LedgerError::InvalidArgument(format!("PRICE_CHECK_DAYS: {days}")))?,
        Err(_) => 1,
    };
    let currency = env::var("PRICE_CHECK_CURRENCY").unwrap_or_else(|_| USD.to_owned());

    let mut client = PriceClient::new(COINCAP_BASE_URL)?;
    if let Ok(key) = env::var("COINCAP_API_KEY") {
        client = client.with_api_key(&key)?;
    }

    let end = Utc::now();
    let start = end - Duration::days(days);
    let backend = Arc::new(CoinCapBackend::new(client, currency.clone()));
    let oracle = PriceOracle::best_effort(backend, start, end)?;
    println!("Fetching {currency} prices for {start} .. {end} at {}", oracle.granularity());

    // ctrl-c aborts in-flight queries and retry waits
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let series = oracle.price_series(start, end, &cancel).await?;
    for point in series.points() {
        println!("{}  {} {}", point.timestamp, point.price, point.currency);
    }
    println!("{} points.", series.len());

    Ok(())
}
