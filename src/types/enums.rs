//! Shared enum types for ledger entries, node records, and price queries.
//!
//! Node record enums deserialize from the upper-case strings used by the
//! node's JSON interface (e.g. `"SETTLED"`, `"INITIATOR_LOCAL"`).

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entry Type
// ---------------------------------------------------------------------------

/// Classification of a single ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A channel we funded.
    LocalChannelOpen,
    /// A channel a peer funded; no balance change for us.
    RemoteChannelOpen,
    /// On-chain fee paid to open a channel.
    ChannelOpenFee,
    /// Balance returned to our wallet by a channel close.
    ChannelClose,
    /// On-chain fee paid to close a channel.
    ChannelCloseFee,
    /// Incoming payment (on-chain receive or settled invoice).
    Receipt,
    /// Outgoing payment (on-chain send or off-chain payment).
    Payment,
    /// Fee paid for an on-chain or off-chain payment.
    Fee,
    /// Invoice settled by one of our own payments.
    CircularReceipt,
    /// Payment made to ourselves.
    CircularPayment,
    /// Routing fee paid for a payment to ourselves.
    CircularPaymentFee,
    /// A forwarded HTLC; balance is unaffected.
    Forward,
    /// Fee earned for forwarding.
    ForwardFee,
    /// Funds swept back to the wallet after a timelock.
    Sweep,
    /// On-chain fee paid by a sweep.
    SweepFee,
}

impl EntryType {
    /// Every entry type, in declaration order.
    pub const ALL: [EntryType; 15] = [
        Self::LocalChannelOpen,
        Self::RemoteChannelOpen,
        Self::ChannelOpenFee,
        Self::ChannelClose,
        Self::ChannelCloseFee,
        Self::Receipt,
        Self::Payment,
        Self::Fee,
        Self::CircularReceipt,
        Self::CircularPayment,
        Self::CircularPaymentFee,
        Self::Forward,
        Self::ForwardFee,
        Self::Sweep,
        Self::SweepFee,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalChannelOpen => "local_channel_open",
            Self::RemoteChannelOpen => "remote_channel_open",
            Self::ChannelOpenFee => "channel_open_fee",
            Self::ChannelClose => "channel_close",
            Self::ChannelCloseFee => "channel_close_fee",
            Self::Receipt => "receipt",
            Self::Payment => "payment",
            Self::Fee => "fee",
            Self::CircularReceipt => "circular_receipt",
            Self::CircularPayment => "circular_payment",
            Self::CircularPaymentFee => "circular_payment_fee",
            Self::Forward => "forward",
            Self::ForwardFee => "forward_fee",
            Self::Sweep => "sweep",
            Self::SweepFee => "sweep_fee",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown entry type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

/// Bucket width at which a price backend aggregates historical quotes.
///
/// Each granularity also bounds how long a single query may span; longer
/// periods are split into several queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "m1")]
    Minute,
    #[serde(rename = "m5")]
    FiveMinutes,
    #[serde(rename = "m15")]
    FifteenMinutes,
    #[serde(rename = "m30")]
    ThirtyMinutes,
    #[serde(rename = "h1")]
    Hour,
    #[serde(rename = "h6")]
    SixHours,
    #[serde(rename = "h12")]
    TwelveHours,
    #[serde(rename = "d1")]
    Day,
}

impl Granularity {
    /// Supported granularities, finest first.
    pub const ALL: [Granularity; 8] = [
        Self::Minute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::Hour,
        Self::SixHours,
        Self::TwelveHours,
        Self::Day,
    ];

    /// Width of one aggregation bucket.
    pub fn aggregation(self) -> Duration {
        match self {
            Self::Minute => Duration::minutes(1),
            Self::FiveMinutes => Duration::minutes(5),
            Self::FifteenMinutes => Duration::minutes(15),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::Hour => Duration::hours(1),
            Self::SixHours => Duration::hours(6),
            Self::TwelveHours => Duration::hours(12),
            Self::Day => Duration::days(1),
        }
    }

    /// Longest period a single query may cover at this granularity.
    pub fn max_query(self) -> Duration {
        match self {
            Self::Minute => Duration::days(1),
            Self::FiveMinutes => Duration::days(5),
            Self::FifteenMinutes => Duration::days(7),
            Self::ThirtyMinutes => Duration::days(14),
            Self::Hour => Duration::days(30),
            Self::SixHours => Duration::days(183),
            Self::TwelveHours => Duration::days(365),
            Self::Day => Duration::days(7305),
        }
    }

    /// Label sent to the backend.
    pub fn label(self) -> &'static str {
        match self {
            Self::Minute => "m1",
            Self::FiveMinutes => "m5",
            Self::FifteenMinutes => "m15",
            Self::ThirtyMinutes => "m30",
            Self::Hour => "h1",
            Self::SixHours => "h6",
            Self::TwelveHours => "h12",
            Self::Day => "d1",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.label() == s)
            .ok_or_else(|| format!("unknown granularity: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Invoice State
// ---------------------------------------------------------------------------

/// Lifecycle state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceState {
    Open,
    Settled,
    Canceled,
    Accepted,
}

// ---------------------------------------------------------------------------
// Payment / HTLC Status
// ---------------------------------------------------------------------------

/// Final or current status of an outgoing payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unknown,
    InFlight,
    Succeeded,
    Failed,
}

/// Status of a single HTLC attempt within a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HtlcStatus {
    InFlight,
    Succeeded,
    Failed,
}

// ---------------------------------------------------------------------------
// Channel Initiator / Close Type
// ---------------------------------------------------------------------------

/// Which side initiated a channel open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Initiator {
    #[default]
    #[serde(rename = "INITIATOR_UNKNOWN")]
    Unknown,
    #[serde(rename = "INITIATOR_LOCAL")]
    Local,
    #[serde(rename = "INITIATOR_REMOTE")]
    Remote,
    #[serde(rename = "INITIATOR_BOTH")]
    Both,
}

impl fmt::Display for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Both => "both",
        })
    }
}

/// How a channel was closed on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseType {
    #[serde(rename = "COOPERATIVE_CLOSE")]
    Cooperative,
    #[serde(rename = "LOCAL_FORCE_CLOSE")]
    LocalForce,
    #[serde(rename = "REMOTE_FORCE_CLOSE")]
    RemoteForce,
    #[serde(rename = "BREACH_CLOSE")]
    Breach,
    #[serde(rename = "FUNDING_CANCELED")]
    FundingCanceled,
    #[serde(rename = "ABANDONED")]
    Abandoned,
}

impl fmt::Display for CloseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cooperative => "cooperative",
            Self::LocalForce => "local force",
            Self::RemoteForce => "remote force",
            Self::Breach => "breach",
            Self::FundingCanceled => "funding canceled",
            Self::Abandoned => "abandoned",
        })
    }
}
