//! Report configuration.
//!
//! [`ReportConfig`] is plain data and can be deserialized from JSON (or any
//! serde format). Call [`ReportConfig::validate`] before generating a report;
//! the report builder does this automatically.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::USD;
use crate::error::{LedgerError, Result};
use crate::ledger::categories::CategoryMatcher;
use crate::types::enums::Granularity;
use crate::types::price::PricePoint;

/// How the price granularity is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranularityChoice {
    /// Pick the finest granularity that covers the report period.
    BestEffort,
    /// Always query at this granularity.
    Fixed(Granularity),
}

/// A user-defined label applied to matching entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub name: String,
    /// Match on-chain entries against the transaction label.
    #[serde(default)]
    pub on_chain: bool,
    /// Match off-chain entries against the invoice memo or payment description.
    #[serde(default)]
    pub off_chain: bool,
    /// Regular expressions; any match applies the category.
    pub label_patterns: Vec<String>,
}

/// Parameters for a single report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Inclusive start of the report period.
    pub start: DateTime<Utc>,
    /// Exclusive end of the report period.
    pub end: DateTime<Utc>,
    /// Skip fiat valuation entirely; every entry is priced at zero.
    #[serde(default)]
    pub disable_fiat: bool,
    #[serde(default)]
    pub granularity: Option<GranularityChoice>,
    #[serde(default = "default_currency")]
    pub fiat_currency: String,
    #[serde(default)]
    pub categories: Vec<CustomCategory>,
    /// Fixed prices used instead of a price backend.
    #[serde(default)]
    pub custom_prices: Vec<PricePoint>,
    /// Timestamp given to unconfirmed transactions; when unset they are
    /// left out of the report.
    #[serde(default)]
    pub unconfirmed_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    USD.to_owned()
}

impl ReportConfig {
    /// A config for `[start, end)` with best-effort USD pricing.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            disable_fiat: false,
            granularity: Some(GranularityChoice::BestEffort),
            fiat_currency: default_currency(),
            categories: Vec::new(),
            custom_prices: Vec::new(),
            unconfirmed_at: None,
        }
    }

    /// Disable fiat valuation.
    #[must_use]
    pub fn without_fiat(mut self) -> Self {
        self.disable_fiat = true;
        self
    }

    #[must_use]
    pub fn with_granularity(mut self, granularity: Option<GranularityChoice>) -> Self {
        self.granularity = granularity;
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.fiat_currency = currency.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: CustomCategory) -> Self {
        self.categories.push(category);
        self
    }

    #[must_use]
    pub fn with_custom_prices(mut self, prices: Vec<PricePoint>) -> Self {
        self.custom_prices = prices;
        self
    }

    #[must_use]
    pub fn with_unconfirmed_at(mut self, at: DateTime<Utc>) -> Self {
        self.unconfirmed_at = Some(at);
        self
    }

    /// Check the config against the current time and compile its
    /// categories.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<CategoryMatcher> {
        if self.end <= self.start {
            return Err(LedgerError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.start > now {
            return Err(LedgerError::FutureRange {
                start: self.start,
                now,
            });
        }
        if !self.disable_fiat && self.custom_prices.is_empty() && self.granularity.is_none() {
            return Err(LedgerError::GranularityRequired);
        }
        let currency = &self.fiat_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(LedgerError::InvalidArgument(format!(
                "fiat currency must be a three letter upper-case code, got {:?}",
                self.fiat_currency
            )));
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(LedgerError::InvalidCategory(format!(
                    "duplicate category name {:?}",
                    category.name
                )));
            }
        }
        CategoryMatcher::new(&self.categories)
    }
}
