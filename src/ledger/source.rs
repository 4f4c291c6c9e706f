//! Node data collaborators.
//!
//! The engine never talks to a node directly; callers implement these traits
//! over whatever transport they use (gRPC, REST, fixtures in tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::node::*;

/// Wallet and channel data.
#[async_trait]
pub trait OnChainSource: Send + Sync {
    /// Channels that are currently open.
    async fn list_channels(&self) -> Result<Vec<Channel>>;

    /// Channels that have been closed.
    async fn list_closed_channels(&self) -> Result<Vec<ClosedChannel>>;

    /// Every wallet transaction, confirmed or not.
    async fn list_transactions(&self) -> Result<Vec<OnChainTransaction>>;

    /// Transaction ids of sweeps that reclaimed timelocked outputs.
    async fn list_sweeps(&self) -> Result<Vec<String>>;
}

/// Computes the fee paid by a transaction from its inputs and outputs.
#[async_trait]
pub trait FeeLookup: Send + Sync {
    /// Fee paid by `txid`, in satoshis.
    async fn transaction_fee(&self, txid: &str) -> Result<i64>;
}

/// Invoice, payment and forwarding data.
#[async_trait]
pub trait OffChainSource: Send + Sync {
    /// Hex-encoded public key of our node.
    async fn node_pubkey(&self) -> Result<String>;

    async fn list_invoices(&self) -> Result<Vec<Invoice>>;

    /// Payments including their HTLC attempts.
    async fn list_payments(&self) -> Result<Vec<Payment>>;

    /// Forwards that happened within `[start, end)`.
    async fn list_forwards(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ForwardingEvent>>;

    async fn decode_payment_request(&self, payment_request: &str) -> Result<PayReq>;
}
