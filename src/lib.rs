//! # ln-ledger
//!
//! Accounting reports for a Lightning node: every on-chain and off-chain
//! balance change within a period, as typed ledger entries valued in fiat.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use ln_ledger::ledger::{OffChainSource, OnChainSource};
//! use ln_ledger::{ReportBuilder, ReportConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn monthly(
//!     wallet: Arc<dyn OnChainSource>,
//!     node: Arc<dyn OffChainSource>,
//! ) -> ln_ledger::Result<()> {
//!     let end = Utc::now();
//!     let config = ReportConfig::new(end - Duration::days(30), end).without_fiat();
//!     let report = ReportBuilder::new(wallet, node)
//!         .build()
//!         .generate(&config, &CancellationToken::new())
//!         .await?;
//!
//!     for entry in &report {
//!         println!("{} {} {} msat", entry.timestamp, entry.entry_type, entry.amount);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod fiat;
pub mod ledger;
pub mod types;

/// Re-export the HTTP client used by price backends.
pub use client::PriceClient;
/// Re-export the configuration type.
pub use config::ReportConfig;
/// Re-export the error type and Result alias.
pub use error::{LedgerError, Result};
/// Re-export the report entry points.
pub use ledger::{ReportBuilder, ReportGenerator};
pub use types::entry::{LedgerEntry, Report};
pub use types::enums::EntryType;
