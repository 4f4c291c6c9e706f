//! Price backend endpoint implementations.
//!
//! Each sub-module adds high-level `async` methods to
//! [`PriceClient`](crate::client::PriceClient) via `impl` blocks. All methods
//! handle query encoding, HTTP transport, and error mapping automatically.
//!
//! ## Usage
//!
//! ```no_run
//! use ln_ledger::client::PriceClient;
//! use ln_ledger::constants::COINCAP_BASE_URL;
//!
//! # #[tokio::main]
//! # async fn main() -> ln_ledger::Result<()> {
//! let client = PriceClient::new(COINCAP_BASE_URL)?;
//! let rates = client.get_coincap_rates().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Endpoints | Description |
//! |---|---|---|
//! | [`coincap`] | 2 | Granular price history, exchange rates |
//! | [`coindesk`] | 1 | Daily closing prices |

pub mod coincap;
pub mod coindesk;
