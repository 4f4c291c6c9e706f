//! Entry factory: converts one filtered record into ledger entries.
//!
//! Every function here is pure apart from the price lookup. Amounts are
//! passed in signed msat; [`new_ledger_entry`] splits them into a magnitude
//! and a credit flag. Fee entries reuse their parent's reference with
//! [`FEE_REFERENCE_SUFFIX`] appended.

use chrono::{DateTime, Utc};

use crate::constants::{FEE_REFERENCE_SUFFIX, MSAT_PER_SAT};
use crate::error::{LedgerError, Result};
use crate::fiat::{PriceLookup, msat_to_fiat};
use crate::ledger::filter::PaymentInfo;
use crate::types::entry::LedgerEntry;
use crate::types::enums::{CloseType, EntryType, Initiator};
use crate::types::node::*;

/// Convert satoshis to millisatoshis.
pub fn sat_to_msat(sat: i64) -> i64 {
    sat * MSAT_PER_SAT
}

// ---------------------------------------------------------------------------
// Entry draft
// ---------------------------------------------------------------------------

/// Everything needed to create an entry except its valuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub timestamp: DateTime<Utc>,
    /// Signed amount in msat; negative amounts become debits.
    pub amount_msat: i64,
    pub entry_type: EntryType,
    pub txid: String,
    pub reference: String,
    pub note: String,
    pub on_chain: bool,
    pub category: Option<String>,
}

impl EntryDraft {
    /// A fee entry attached to this one.
    pub fn fee(&self, entry_type: EntryType, amount_msat: i64) -> Self {
        Self {
            timestamp: self.timestamp,
            amount_msat,
            entry_type,
            txid: self.txid.clone(),
            reference: fee_reference(&self.reference),
            note: String::new(),
            on_chain: self.on_chain,
            category: self.category.clone(),
        }
    }
}

/// Reference of the fee entry belonging to `parent`.
pub fn fee_reference(parent: &str) -> String {
    format!("{parent}{FEE_REFERENCE_SUFFIX}")
}

/// Value a draft and turn it into an entry.
pub fn new_ledger_entry(draft: EntryDraft, prices: &dyn PriceLookup) -> Result<LedgerEntry> {
    let btc_price = prices.price_at(draft.timestamp)?;
    let amount = draft.amount_msat.unsigned_abs();
    let fiat_value = msat_to_fiat(btc_price.price, amount);

    Ok(LedgerEntry {
        timestamp: draft.timestamp,
        amount,
        fiat_value,
        txid: draft.txid,
        reference: draft.reference,
        note: draft.note,
        entry_type: draft.entry_type,
        category: draft.category,
        on_chain: draft.on_chain,
        credit: draft.amount_msat >= 0,
        btc_price,
    })
}

/// A parent entry plus an optional fee entry.
fn with_fee(
    parent: EntryDraft,
    fee: Option<(EntryType, i64)>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let fee = fee.map(|(entry_type, amount)| parent.fee(entry_type, amount));
    let mut entries = vec![new_ledger_entry(parent, prices)?];
    if let Some(fee) = fee {
        entries.push(new_ledger_entry(fee, prices)?);
    }
    Ok(entries)
}

fn on_chain_draft(
    tx: &OnChainTransaction,
    entry_type: EntryType,
    amount_msat: i64,
    reference: String,
    note: String,
    category: Option<String>,
) -> EntryDraft {
    EntryDraft {
        timestamp: tx.timestamp,
        amount_msat,
        entry_type,
        txid: tx.tx_hash.clone(),
        reference,
        note,
        on_chain: true,
        category,
    }
}

// ---------------------------------------------------------------------------
// Channel opens
// ---------------------------------------------------------------------------

/// The open side of a channel, from either an open or a closed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOpen<'a> {
    pub channel_point: &'a str,
    pub chan_id: u64,
    pub remote_pubkey: &'a str,
    pub capacity_sat: i64,
    pub initiator: Initiator,
}

impl<'a> From<&'a Channel> for ChannelOpen<'a> {
    fn from(channel: &'a Channel) -> Self {
        Self {
            channel_point: &channel.channel_point,
            chan_id: channel.chan_id,
            remote_pubkey: &channel.remote_pubkey,
            capacity_sat: channel.capacity_sat,
            initiator: if channel.initiator {
                Initiator::Local
            } else {
                Initiator::Remote
            },
        }
    }
}

impl<'a> From<&'a ClosedChannel> for ChannelOpen<'a> {
    fn from(channel: &'a ClosedChannel) -> Self {
        Self {
            channel_point: &channel.channel_point,
            chan_id: channel.chan_id,
            remote_pubkey: &channel.remote_pubkey,
            capacity_sat: channel.capacity_sat,
            initiator: channel.open_initiator,
        }
    }
}

impl ChannelOpen<'_> {
    /// Whether we funded the channel, falling back to the funding
    /// transaction's direction when the initiator is not recorded.
    pub fn opened_locally(&self, tx: &OnChainTransaction) -> bool {
        match self.initiator {
            Initiator::Local => true,
            Initiator::Remote => false,
            Initiator::Unknown | Initiator::Both => tx.amount_sat < 0,
        }
    }
}

/// Entries for a channel funding transaction.
///
/// A channel we funded debits the funding amount and its fee; a channel
/// the peer funded is recorded with a zero amount.
pub fn channel_open_entries(
    channel: &ChannelOpen<'_>,
    tx: &OnChainTransaction,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let note = format!(
        "remote peer {}, capacity {} sat",
        channel.remote_pubkey, channel.capacity_sat
    );
    let reference = channel.channel_point.to_owned();

    if !channel.opened_locally(tx) {
        let draft = on_chain_draft(tx, EntryType::RemoteChannelOpen, 0, reference, note, category);
        return Ok(vec![new_ledger_entry(draft, prices)?]);
    }

    let draft = on_chain_draft(
        tx,
        EntryType::LocalChannelOpen,
        sat_to_msat(tx.amount_sat),
        reference,
        note,
        category,
    );
    with_fee(
        draft,
        Some((EntryType::ChannelOpenFee, -sat_to_msat(tx.fee_sat))),
        prices,
    )
}

/// Entries for a funding transaction shared by several channels.
///
/// Only peer-funded channels can share a transaction; our own batched opens
/// would need their fee split, which is not supported.
pub fn batched_open_entries(
    channels: &[ChannelOpen<'_>],
    tx: &OnChainTransaction,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    if let [channel] = channels {
        return channel_open_entries(channel, tx, category, prices);
    }
    if channels.iter().any(|c| c.opened_locally(tx)) {
        return Err(LedgerError::BatchedTransaction(tx.tx_hash.clone()));
    }

    let mut entries = Vec::with_capacity(channels.len());
    for channel in channels {
        entries.extend(channel_open_entries(channel, tx, category.clone(), prices)?);
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Channel closes
// ---------------------------------------------------------------------------

/// Whether the close fee of `channel` is ours to book.
///
/// Only cooperative closes of channels we opened are attributed.
pub fn close_fee_attributable(channel: &ClosedChannel) -> bool {
    channel.open_initiator == Initiator::Local && channel.close_type == CloseType::Cooperative
}

/// Entries for a channel closing transaction.
///
/// `close_fee_sat` is only set when the fee was looked up for a channel
/// we opened; otherwise no fee entry is produced.
pub fn channel_close_entries(
    channel: &ClosedChannel,
    tx: &OnChainTransaction,
    close_fee_sat: Option<i64>,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let note = format!(
        "close type: {}, close initiator: {}",
        channel.close_type, channel.close_initiator
    );
    let draft = on_chain_draft(
        tx,
        EntryType::ChannelClose,
        sat_to_msat(tx.amount_sat),
        tx.tx_hash.clone(),
        note,
        category,
    );
    let fee = close_fee_sat.map(|fee| (EntryType::ChannelCloseFee, -sat_to_msat(fee.abs())));
    with_fee(draft, fee, prices)
}

// ---------------------------------------------------------------------------
// Sweeps and generic on-chain transactions
// ---------------------------------------------------------------------------

/// Entries for a sweep of timelocked funds back into the wallet.
pub fn sweep_entries(
    tx: &OnChainTransaction,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let draft = on_chain_draft(
        tx,
        EntryType::Sweep,
        sat_to_msat(tx.amount_sat),
        tx.tx_hash.clone(),
        tx.label.clone(),
        category,
    );
    let fee = (tx.fee_sat != 0).then(|| (EntryType::SweepFee, -sat_to_msat(tx.fee_sat)));
    with_fee(draft, fee, prices)
}

/// Entries for a wallet transaction unrelated to channels.
///
/// The amount has already had its fee removed by the on-chain filter.
pub fn on_chain_entries(
    tx: &OnChainTransaction,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let entry_type = if tx.amount_sat < 0 {
        EntryType::Payment
    } else {
        EntryType::Receipt
    };
    let draft = on_chain_draft(
        tx,
        entry_type,
        sat_to_msat(tx.amount_sat),
        tx.tx_hash.clone(),
        tx.label.clone(),
        category,
    );
    let fee = (tx.fee_sat != 0).then(|| (EntryType::Fee, -sat_to_msat(tx.fee_sat)));
    with_fee(draft, fee, prices)
}

// ---------------------------------------------------------------------------
// Off-chain
// ---------------------------------------------------------------------------

/// Note describing an invoice's memo, overpayment and keysend status.
pub fn invoice_note(invoice: &Invoice) -> String {
    let mut notes = Vec::new();
    if !invoice.memo.is_empty() {
        notes.push(format!("memo: {}", invoice.memo));
    }
    if invoice.amt_paid_msat != invoice.value_msat {
        notes.push(format!(
            "invoice overpaid original amount: {} msat, paid: {} msat",
            invoice.value_msat, invoice.amt_paid_msat
        ));
    }
    if invoice.is_keysend {
        notes.push("keysend payment".to_owned());
    }
    notes.join("/")
}

/// Entry for a settled invoice.
pub fn invoice_entry(
    invoice: &Invoice,
    circular: bool,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<LedgerEntry> {
    let entry_type = if circular {
        EntryType::CircularReceipt
    } else {
        EntryType::Receipt
    };
    let draft = EntryDraft {
        timestamp: invoice.settle_date,
        amount_msat: invoice.amt_paid_msat,
        entry_type,
        txid: invoice.payment_hash.clone(),
        reference: invoice.preimage.clone(),
        note: invoice_note(invoice),
        on_chain: false,
        category,
    };
    new_ledger_entry(draft, prices)
}

/// Reference of a payment, unique even across repeated payment hashes.
pub fn payment_reference(payment: &Payment) -> String {
    format!("{}:{}", payment.payment_index, payment.preimage)
}

/// Entries for a settled outgoing payment and its routing fee.
pub fn payment_entries(
    info: &PaymentInfo,
    circular: bool,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let (entry_type, fee_type) = if circular {
        (EntryType::CircularPayment, EntryType::CircularPaymentFee)
    } else {
        (EntryType::Payment, EntryType::Fee)
    };
    let note = info
        .destination
        .as_ref()
        .map(|dest| format!("payment to: {dest}"))
        .unwrap_or_default();

    let payment = &info.payment;
    let draft = EntryDraft {
        timestamp: info.settle_time,
        amount_msat: -payment.value_msat.abs(),
        entry_type,
        txid: payment.payment_hash.clone(),
        reference: payment_reference(payment),
        note,
        on_chain: false,
        category,
    };
    let fee = (payment.fee_msat != 0).then(|| (fee_type, -payment.fee_msat.abs()));
    with_fee(draft, fee, prices)
}

/// Entries for a forwarded HTLC.
///
/// The forward itself moves no balance; only the fee earned is credited.
pub fn forward_entries(
    forward: &ForwardingEvent,
    category: Option<String>,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let draft = EntryDraft {
        timestamp: forward.timestamp,
        amount_msat: 0,
        entry_type: EntryType::Forward,
        txid: String::new(),
        reference: format!(
            "{}:{}:{}",
            forward.timestamp.timestamp(),
            forward.chan_id_in,
            forward.chan_id_out
        ),
        note: format!(
            "incoming: {} msat outgoing: {} msat",
            forward.amt_in_msat, forward.amt_out_msat
        ),
        on_chain: false,
        category,
    };
    let fee = (forward.fee_msat != 0).then(|| (EntryType::ForwardFee, forward.fee_msat.abs()));
    with_fee(draft, fee, prices)
}
