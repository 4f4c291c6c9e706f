//! The accounting engine.
//!
//! Node records flow through three stages:
//!
//! 1. [`filter`] drops records outside the report period and normalizes
//!    on-chain amounts;
//! 2. [`circular`] flags payments we made to ourselves;
//! 3. [`entries`] turns each record into one or more [`LedgerEntry`]s.
//!
//! [`onchain`] and [`offchain`] run these stages for each half of the
//! ledger, and [`report`] combines them.
//!
//! [`LedgerEntry`]: crate::types::entry::LedgerEntry

pub mod categories;
pub mod circular;
pub mod entries;
pub mod filter;
pub mod offchain;
pub mod onchain;
pub mod report;
pub mod source;

pub use categories::CategoryMatcher;
pub use report::{ReportBuilder, ReportGenerator};
pub use source::{FeeLookup, OffChainSource, OnChainSource};
