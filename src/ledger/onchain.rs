//! On-chain half of the report.

use std::collections::{HashMap, HashSet};

use crate::config::ReportConfig;
use crate::error::Result;
use crate::fiat::PriceLookup;
use crate::ledger::categories::CategoryMatcher;
use crate::ledger::entries::{
    ChannelOpen, batched_open_entries, channel_close_entries, close_fee_attributable,
    on_chain_entries, sweep_entries,
};
use crate::ledger::filter::filter_on_chain;
use crate::ledger::source::{FeeLookup, OnChainSource};
use crate::types::entry::LedgerEntry;
use crate::types::node::{Channel, ClosedChannel, OnChainTransaction};

/// Everything fetched from an [`OnChainSource`] for one report.
#[derive(Debug, Clone, Default)]
pub struct OnChainData {
    pub channels: Vec<Channel>,
    pub closed_channels: Vec<ClosedChannel>,
    pub transactions: Vec<OnChainTransaction>,
    pub sweeps: HashSet<String>,
}

impl OnChainData {
    /// Fetch channels, closed channels, transactions and sweeps together.
    pub async fn fetch(source: &dyn OnChainSource) -> Result<Self> {
        let (channels, closed_channels, transactions, sweeps) = futures_util::try_join!(
            source.list_channels(),
            source.list_closed_channels(),
            source.list_transactions(),
            source.list_sweeps(),
        )?;

        tracing::debug!(
            channels = channels.len(),
            closed = closed_channels.len(),
            transactions = transactions.len(),
            sweeps = sweeps.len(),
            "fetched on-chain data"
        );

        Ok(Self {
            channels,
            closed_channels,
            transactions,
            sweeps: sweeps.into_iter().collect(),
        })
    }
}

/// Lookup tables from transaction id to the channel activity it carries.
struct ChannelIndex<'a> {
    /// Funding txid to the channels it opened, open channels first.
    opens: HashMap<&'a str, Vec<ChannelOpen<'a>>>,
    closes: HashMap<&'a str, &'a ClosedChannel>,
}

impl<'a> ChannelIndex<'a> {
    fn new(channels: &'a [Channel], closed: &'a [ClosedChannel]) -> Self {
        let mut opens: HashMap<&str, Vec<ChannelOpen<'_>>> = HashMap::new();
        for channel in channels {
            opens.entry(channel.funding_txid()).or_default().push(channel.into());
        }
        // closed channels no longer show up as open, so their opens are
        // reconstructed from the close record
        for channel in closed {
            opens.entry(channel.funding_txid()).or_default().push(channel.into());
        }

        let closes = closed
            .iter()
            .filter(|c| !c.closing_tx_hash.is_empty())
            .map(|c| (c.closing_tx_hash.as_str(), c))
            .collect();

        Self { opens, closes }
    }
}

/// Convert on-chain data into ledger entries.
///
/// Each transaction is classified as a channel open, a channel close, a
/// sweep, or a generic wallet transaction, in that order of precedence.
pub async fn on_chain_report(
    data: OnChainData,
    config: &ReportConfig,
    categories: &CategoryMatcher,
    fees: Option<&dyn FeeLookup>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let OnChainData {
        channels,
        closed_channels,
        transactions,
        sweeps,
    } = data;

    let transactions = filter_on_chain(
        transactions,
        config.start,
        config.end,
        &sweeps,
        config.unconfirmed_at,
    )?;
    let index = ChannelIndex::new(&channels, &closed_channels);

    let mut entries = Vec::new();
    for tx in &transactions {
        let category = categories.category(&tx.label, true, &tx.tx_hash)?;

        if let Some(opens) = index.opens.get(tx.tx_hash.as_str()) {
            entries.extend(batched_open_entries(opens, tx, category, prices)?);
        } else if let Some(closed) = index.closes.get(tx.tx_hash.as_str()) {
            let close_fee = match fees {
                Some(fees) if close_fee_attributable(closed) => {
                    Some(fees.transaction_fee(&tx.tx_hash).await?)
                }
                _ => None,
            };
            entries.extend(channel_close_entries(closed, tx, close_fee, category, prices)?);
        } else if sweeps.contains(&tx.tx_hash) {
            entries.extend(sweep_entries(tx, category, prices)?);
        } else {
            entries.extend(on_chain_entries(tx, category, prices)?);
        }
    }

    tracing::info!(
        transactions = transactions.len(),
        entries = entries.len(),
        "on-chain entries created"
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiat::ZeroPrice;
    use crate::types::enums::{CloseType, EntryType, Initiator};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn tx(hash: &str, amount: i64, fee: i64) -> OnChainTransaction {
        OnChainTransaction {
            tx_hash: hash.into(),
            amount_sat: amount,
            fee_sat: fee,
            timestamp: t(1),
            confirmations: 6,
            label: String::new(),
        }
    }

    fn closed(funding: &str, closing: &str, open_initiator: Initiator) -> ClosedChannel {
        ClosedChannel {
            channel_point: format!("{funding}:0"),
            chan_id: 7,
            closing_tx_hash: closing.into(),
            remote_pubkey: "02peer".into(),
            capacity_sat: 50_000,
            settled_balance_sat: 40_000,
            close_type: CloseType::Cooperative,
            open_initiator,
            close_initiator: Initiator::Local,
        }
    }

    struct FixedFee(AtomicU32);

    #[async_trait]
    impl FeeLookup for FixedFee {
        async fn transaction_fee(&self, _txid: &str) -> Result<i64> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(250)
        }
    }

    fn types(entries: &[LedgerEntry]) -> Vec<EntryType> {
        entries.iter().map(|e| e.entry_type).collect()
    }

    #[tokio::test]
    async fn dispatches_by_transaction_role() {
        let data = OnChainData {
            channels: vec![Channel {
                channel_point: "open:1".into(),
                chan_id: 1,
                remote_pubkey: "02peer".into(),
                capacity_sat: 20_000,
                initiator: true,
            }],
            closed_channels: vec![closed("old", "close", Initiator::Local)],
            transactions: vec![
                tx("open", -20_000, 100),
                tx("old", -50_000, 200),
                tx("close", 40_000, 0),
                tx("sweep", 9_000, 50),
                tx("recv", 1_000, 0),
            ],
            sweeps: HashSet::from(["sweep".to_string()]),
        };
        let config = ReportConfig::new(t(0), t(5)).without_fiat();
        let fees = FixedFee(AtomicU32::new(0));

        let entries = on_chain_report(
            data,
            &config,
            &CategoryMatcher::default(),
            Some(&fees),
            &ZeroPrice::new("USD"),
        )
        .await
        .unwrap();

        assert_eq!(
            types(&entries),
            [
                EntryType::LocalChannelOpen,
                EntryType::ChannelOpenFee,
                EntryType::LocalChannelOpen,
                EntryType::ChannelOpenFee,
                EntryType::ChannelClose,
                EntryType::ChannelCloseFee,
                EntryType::Sweep,
                EntryType::SweepFee,
                EntryType::Receipt,
            ]
        );
        assert_eq!(fees.0.load(Ordering::SeqCst), 1);
        assert_eq!(entries[5].amount, 250_000);
    }

    #[tokio::test]
    async fn close_fee_skipped_without_lookup_or_for_remote_opens() {
        let config = ReportConfig::new(t(0), t(5)).without_fiat();
        let fees = FixedFee(AtomicU32::new(0));
        let data = || OnChainData {
            closed_channels: vec![closed("a", "close", Initiator::Remote)],
            transactions: vec![tx("close", 40_000, 0)],
            ..Default::default()
        };

        let entries = on_chain_report(
            data(),
            &config,
            &CategoryMatcher::default(),
            Some(&fees),
            &ZeroPrice::new("USD"),
        )
        .await
        .unwrap();
        assert_eq!(types(&entries), [EntryType::ChannelClose]);
        assert_eq!(fees.0.load(Ordering::SeqCst), 0);

        let mut local = data();
        local.closed_channels[0].open_initiator = Initiator::Local;
        let entries = on_chain_report(
            local,
            &config,
            &CategoryMatcher::default(),
            None,
            &ZeroPrice::new("USD"),
        )
        .await
        .unwrap();
        assert_eq!(types(&entries), [EntryType::ChannelClose]);
    }
}
