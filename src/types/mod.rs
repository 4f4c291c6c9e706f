//! Data types used by the ledger engine and the price backends.
//!
//! ## Organization
//!
//! - [`enums`]: Entry types, price granularities, node record states
//! - [`entry`]: [`LedgerEntry`](entry::LedgerEntry) and [`Report`](entry::Report)
//! - [`node`]: Wallet transactions, channels, invoices, payments, forwards
//! - [`price`]: [`PricePoint`](price::PricePoint) and backend wire formats
//!
//! All enums are re-exported at the module root via `pub use enums::*`.

pub mod entry;
pub mod enums;
pub mod node;
pub mod price;

pub use enums::*;
