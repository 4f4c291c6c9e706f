//! Ledger entry and report types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::enums::EntryType;
use crate::types::price::PricePoint;

// ---------------------------------------------------------------------------
// Ledger Entry
// ---------------------------------------------------------------------------

/// A single balance-affecting event, valued in msat and fiat.
///
/// `amount` is always a magnitude; the direction is carried by `credit`.
/// Entries are never modified once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    /// Magnitude in millisatoshis.
    pub amount: u64,
    /// Fiat value of `amount` at `btc_price`.
    pub fiat_value: Decimal,
    pub txid: String,
    /// Identifier of the entry; fee entries use `<parent>:-1`.
    pub reference: String,
    pub note: String,
    pub entry_type: EntryType,
    /// Custom category label, if one matched.
    pub category: Option<String>,
    pub on_chain: bool,
    /// `true` when the entry increases our balance.
    pub credit: bool,
    /// Price used for `fiat_value`.
    pub btc_price: PricePoint,
}

impl LedgerEntry {
    /// The entry's effect on our balance in msat.
    pub fn signed_amount(&self) -> i128 {
        let amount = i128::from(self.amount);
        if self.credit { amount } else { -amount }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Ledger entries ordered by ascending timestamp.
///
/// Entries with equal timestamps keep the order they were produced in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<LedgerEntry>,
}

impl Report {
    /// Build a report, stably sorting the entries by timestamp.
    pub fn new(mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by_key(|entry| entry.timestamp);
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LedgerEntry> {
        self.entries.iter()
    }

    /// Net balance change across all entries, in msat.
    pub fn balance_msat(&self) -> i128 {
        self.entries.iter().map(LedgerEntry::signed_amount).sum()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(secs: i64, amount: u64, credit: bool, reference: &str) -> LedgerEntry {
        let timestamp = Utc.timestamp_opt(secs, 0).unwrap();
        LedgerEntry {
            timestamp,
            amount,
            fiat_value: Decimal::ZERO,
            txid: String::new(),
            reference: reference.to_owned(),
            note: String::new(),
            entry_type: EntryType::Receipt,
            category: None,
            on_chain: false,
            credit,
            btc_price: PricePoint::new(timestamp, Decimal::ZERO, "USD"),
        }
    }

    #[test]
    fn report_sorts_stably_by_timestamp() {
        let report = Report::new(vec![
            entry(20, 1, true, "late"),
            entry(10, 1, true, "first-tie"),
            entry(10, 1, true, "second-tie"),
        ]);
        let refs: Vec<_> = report.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, ["first-tie", "second-tie", "late"]);
    }

    #[test]
    fn balance_uses_credit_for_sign() {
        let report = Report::new(vec![entry(1, 5_000, true, "a"), entry(2, 2_000, false, "b")]);
        assert_eq!(report.balance_msat(), 3_000);
        assert_eq!(report.entries()[1].signed_amount(), -2_000);
    }
}
