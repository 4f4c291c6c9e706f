#![allow(missing_docs)]
//! Node record types: wallet transactions, channels, invoices, payments,
//! and forwarding events as returned by the node data sources.
//!
//! On-chain amounts are in satoshis, off-chain amounts in millisatoshis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::enums::*;

// ---------------------------------------------------------------------------
// On-chain Transaction
// ---------------------------------------------------------------------------

/// A wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainTransaction {
    pub tx_hash: String,
    /// Net effect on the wallet (sat). Outgoing amounts include the fee.
    pub amount_sat: i64,
    /// Total fee paid by the wallet (sat).
    #[serde(default)]
    pub fee_sat: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub label: String,
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// A currently open channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Funding outpoint (`txid:index`).
    pub channel_point: String,
    pub chan_id: u64,
    pub remote_pubkey: String,
    pub capacity_sat: i64,
    /// Whether we opened the channel.
    pub initiator: bool,
}

/// A channel that has already been closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedChannel {
    /// Funding outpoint (`txid:index`).
    pub channel_point: String,
    pub chan_id: u64,
    pub closing_tx_hash: String,
    pub remote_pubkey: String,
    pub capacity_sat: i64,
    pub settled_balance_sat: i64,
    pub close_type: CloseType,
    #[serde(default)]
    pub open_initiator: Initiator,
    #[serde(default)]
    pub close_initiator: Initiator,
}

/// Split a `txid:index` outpoint into its transaction id.
pub fn outpoint_txid(channel_point: &str) -> &str {
    channel_point
        .split_once(':')
        .map_or(channel_point, |(txid, _)| txid)
}

impl Channel {
    pub fn funding_txid(&self) -> &str {
        outpoint_txid(&self.channel_point)
    }
}

impl ClosedChannel {
    pub fn funding_txid(&self) -> &str {
        outpoint_txid(&self.channel_point)
    }
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// An invoice we created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Hex-encoded payment hash.
    pub payment_hash: String,
    /// Hex-encoded preimage.
    pub preimage: String,
    #[serde(default)]
    pub memo: String,
    /// Amount requested (msat).
    pub value_msat: i64,
    /// Amount actually paid (msat).
    pub amt_paid_msat: i64,
    pub settle_date: DateTime<Utc>,
    pub state: InvoiceState,
    /// Whether the invoice was created on receipt of a spontaneous payment.
    #[serde(default)]
    pub is_keysend: bool,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// An outgoing off-chain payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Hex-encoded payment hash.
    pub payment_hash: String,
    /// Hex-encoded preimage.
    #[serde(default)]
    pub preimage: String,
    /// Amount delivered to the destination (msat), excluding fees.
    pub value_msat: i64,
    /// Routing fees paid (msat).
    #[serde(default)]
    pub fee_msat: i64,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_request: String,
    pub status: PaymentStatus,
    /// Monotonic index assigned by the node.
    pub payment_index: u64,
    /// Routing attempts; empty for legacy records.
    #[serde(default)]
    pub htlcs: Vec<HtlcAttempt>,
}

/// A single routing attempt of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcAttempt {
    pub status: HtlcStatus,
    pub attempt_time: DateTime<Utc>,
    #[serde(default)]
    pub resolve_time: Option<DateTime<Utc>>,
    pub route: Route,
}

/// Route taken by an HTLC attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub hops: Vec<Hop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub chan_id: u64,
    pub pub_key: String,
}

/// A decoded payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayReq {
    pub destination: String,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Forwards
// ---------------------------------------------------------------------------

/// An HTLC forwarded through our node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingEvent {
    pub timestamp: DateTime<Utc>,
    pub chan_id_in: u64,
    pub chan_id_out: u64,
    pub amt_in_msat: i64,
    pub amt_out_msat: i64,
    pub fee_msat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outpoint_txid_strips_index() {
        assert_eq!(outpoint_txid("abcd:1"), "abcd");
        assert_eq!(outpoint_txid("abcd"), "abcd");
    }

    #[test]
    fn closed_channel_parses_node_enums() {
        let json = r#"{
            "channel_point": "ff00:0",
            "chan_id": 7,
            "closing_tx_hash": "ee11",
            "remote_pubkey": "02aa",
            "capacity_sat": 100000,
            "settled_balance_sat": 40000,
            "close_type": "COOPERATIVE_CLOSE",
            "open_initiator": "INITIATOR_LOCAL"
        }"#;
        let closed: ClosedChannel = serde_json::from_str(json).unwrap();
        assert_eq!(closed.close_type, CloseType::Cooperative);
        assert_eq!(closed.open_initiator, Initiator::Local);
        assert_eq!(closed.close_initiator, Initiator::Unknown);
        assert_eq!(closed.funding_txid(), "ff00");
    }
}
