//! Record filters applied before classification.
//!
//! Filters drop records outside the report period or not yet final, and
//! normalize the rest so the entry factory can convert them directly.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, TryStreamExt, stream};

use crate::error::{LedgerError, Result};
use crate::ledger::source::OffChainSource;
use crate::types::enums::{HtlcStatus, InvoiceState, PaymentStatus};
use crate::types::node::{Invoice, OnChainTransaction, Payment};

/// Whether `ts` lies in `[start, end)`.
pub fn in_range(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= ts && ts < end
}

// ---------------------------------------------------------------------------
// On-chain
// ---------------------------------------------------------------------------

/// Keep confirmed, in-range wallet transactions and correct their amounts.
///
/// Unconfirmed transactions are dropped unless `unconfirmed_at` is set, in
/// which case they are stamped with that time. Outgoing amounts reported by
/// the wallet include the fee, which is added back so the fee can be booked
/// separately. Incoming transactions may only carry a fee when they are
/// sweeps.
pub fn filter_on_chain(
    txs: Vec<OnChainTransaction>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    sweeps: &HashSet<String>,
    unconfirmed_at: Option<DateTime<Utc>>,
) -> Result<Vec<OnChainTransaction>> {
    let mut filtered = Vec::with_capacity(txs.len());

    for mut tx in txs {
        if tx.confirmations == 0 {
            match unconfirmed_at {
                Some(now) => tx.timestamp = now,
                None => {
                    tracing::debug!(txid = %tx.tx_hash, "skipping unconfirmed transaction");
                    continue;
                }
            }
        }

        if !in_range(tx.timestamp, start, end) {
            continue;
        }

        let fee = tx.fee_sat.abs();
        if tx.amount_sat < 0 {
            tx.amount_sat += fee;
        } else if tx.amount_sat > 0 && fee != 0 && !sweeps.contains(&tx.tx_hash) {
            return Err(LedgerError::ReceiveWithFee {
                txid: tx.tx_hash,
                fee_sat: tx.fee_sat,
            });
        }
        tx.fee_sat = fee;

        filtered.push(tx);
    }

    Ok(filtered)
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// Keep invoices settled within the period.
pub fn filter_invoices(
    invoices: Vec<Invoice>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Invoice> {
    invoices
        .into_iter()
        .filter(|inv| inv.state == InvoiceState::Settled && in_range(inv.settle_date, start, end))
        .collect()
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// A payment with its resolved destination and settle time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInfo {
    pub payment: Payment,
    /// Final hop of the payment, if it could be determined.
    pub destination: Option<String>,
    /// Description from the decoded payment request.
    pub description: Option<String>,
    /// Resolve time of the last successful HTLC.
    pub settle_time: DateTime<Utc>,
}

/// When the payment became final.
///
/// A multi-part payment is only settled once its last successful HTLC
/// resolves. Legacy records without HTLCs fall back to their creation date.
pub fn settle_time(payment: &Payment) -> DateTime<Utc> {
    payment
        .htlcs
        .iter()
        .filter(|htlc| htlc.status == HtlcStatus::Succeeded)
        .filter_map(|htlc| htlc.resolve_time)
        .max()
        .unwrap_or(payment.creation_date)
}

/// Final hop of the first HTLC's route.
pub fn route_destination(payment: &Payment) -> Option<String> {
    payment
        .htlcs
        .first()
        .and_then(|htlc| htlc.route.hops.last())
        .map(|hop| hop.pub_key.clone())
}

/// Resolve destination and settle time for every payment.
///
/// Destinations come from HTLC routes where available; otherwise the
/// payment request is decoded. Payments with neither keep `None`.
/// Payments are resolved one at a time, in order.
pub async fn pre_process_payments(
    payments: Vec<Payment>,
    source: &dyn OffChainSource,
) -> Result<Vec<PaymentInfo>> {
    stream::iter(payments)
        .then(|payment| resolve_payment(payment, source))
        .try_collect()
        .await
}

async fn resolve_payment(payment: Payment, source: &dyn OffChainSource) -> Result<PaymentInfo> {
    let settle_time = settle_time(&payment);

    let (destination, description) = match route_destination(&payment) {
        Some(dest) => (Some(dest), None),
        None if !payment.payment_request.is_empty() => {
            let decoded = source.decode_payment_request(&payment.payment_request).await?;
            let description = Some(decoded.description).filter(|d| !d.is_empty());
            (Some(decoded.destination), description)
        }
        None => {
            tracing::debug!(
                payment_hash = %payment.payment_hash,
                "payment has no route or payment request, destination unknown"
            );
            (None, None)
        }
    };

    Ok(PaymentInfo {
        payment,
        destination,
        description,
        settle_time,
    })
}

/// Keep succeeded payments settled within the period.
///
/// Fails if two of them share a payment hash.
pub fn filter_payments(
    payments: Vec<PaymentInfo>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PaymentInfo>> {
    let mut seen = HashSet::new();
    let mut filtered = Vec::new();

    for info in payments {
        if info.payment.status != PaymentStatus::Succeeded {
            continue;
        }
        if !in_range(info.settle_time, start, end) {
            continue;
        }
        if !seen.insert(info.payment.payment_hash.clone()) {
            return Err(LedgerError::DuplicatesNotSupported(info.payment.payment_hash));
        }
        filtered.push(info);
    }

    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node::{ForwardingEvent, HtlcAttempt, Hop, PayReq, Route};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn tx(hash: &str, amount: i64, fee: i64, at: i64, confs: u32) -> OnChainTransaction {
        OnChainTransaction {
            tx_hash: hash.into(),
            amount_sat: amount,
            fee_sat: fee,
            timestamp: t(at),
            confirmations: confs,
            label: String::new(),
        }
    }

    fn htlc(status: HtlcStatus, resolved: Option<i64>, hops: &[&str]) -> HtlcAttempt {
        HtlcAttempt {
            status,
            attempt_time: t(0),
            resolve_time: resolved.map(t),
            route: Route {
                hops: hops
                    .iter()
                    .enumerate()
                    .map(|(i, key)| Hop {
                        chan_id: i as u64,
                        pub_key: key.to_string(),
                    })
                    .collect(),
            },
        }
    }

    fn payment(hash: &str, status: PaymentStatus, htlcs: Vec<HtlcAttempt>) -> Payment {
        Payment {
            payment_hash: hash.into(),
            preimage: "00".into(),
            value_msat: 1_000,
            fee_msat: 0,
            creation_date: t(1),
            payment_request: String::new(),
            status,
            payment_index: 1,
            htlcs,
        }
    }

    fn info(hash: &str, status: PaymentStatus, settled: i64) -> PaymentInfo {
        PaymentInfo {
            payment: payment(hash, status, Vec::new()),
            destination: None,
            description: None,
            settle_time: t(settled),
        }
    }

    #[test]
    fn range_is_half_open() {
        assert!(in_range(t(0), t(0), t(2)));
        assert!(in_range(t(1), t(0), t(2)));
        assert!(!in_range(t(2), t(0), t(2)));
        assert!(!in_range(t(-1), t(0), t(2)));
    }

    #[test]
    fn on_chain_adds_fee_back_to_sends() {
        let txs = vec![tx("a", -10_000, 1_000, 1, 6)];
        let out = filter_on_chain(txs, t(0), t(5), &HashSet::new(), None).unwrap();
        assert_eq!(out[0].amount_sat, -9_000);
        assert_eq!(out[0].fee_sat, 1_000);
    }

    #[test]
    fn on_chain_drops_unconfirmed_and_out_of_range() {
        let txs = vec![tx("early", 5, 0, -1, 3), tx("late", 5, 0, 5, 3), tx("mempool", 5, 0, 1, 0)];
        let out = filter_on_chain(txs, t(0), t(5), &HashSet::new(), None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unconfirmed_override_restamps() {
        let txs = vec![tx("mempool", 5, 0, -100, 0)];
        let out = filter_on_chain(txs, t(0), t(5), &HashSet::new(), Some(t(3))).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, t(3));
    }

    #[test]
    fn receive_with_fee_fails_unless_sweep() {
        let err = filter_on_chain(vec![tx("r", 5_000, 10, 1, 1)], t(0), t(5), &HashSet::new(), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ReceiveWithFee { fee_sat: 10, .. }));

        let sweeps = HashSet::from(["r".to_string()]);
        let txs = vec![tx("r", 5_000, 10, 1, 1)];
        let out = filter_on_chain(txs, t(0), t(5), &sweeps, None).unwrap();
        assert_eq!(out[0].amount_sat, 5_000);
    }

    #[test]
    fn settle_time_is_latest_successful_resolve() {
        let p = payment(
            "h",
            PaymentStatus::Succeeded,
            vec![
                htlc(HtlcStatus::Succeeded, Some(3), &["b", "c"]),
                htlc(HtlcStatus::Failed, Some(9), &["x"]),
                htlc(HtlcStatus::Succeeded, Some(5), &["d"]),
            ],
        );
        assert_eq!(settle_time(&p), t(5));
        assert_eq!(route_destination(&p).as_deref(), Some("c"));

        let legacy = payment("h", PaymentStatus::Succeeded, Vec::new());
        assert_eq!(settle_time(&legacy), t(1));
        assert_eq!(route_destination(&legacy), None);
    }

    #[test]
    fn payments_filtered_by_status_and_range() {
        let out = filter_payments(
            vec![
                info("a", PaymentStatus::Succeeded, 1),
                info("b", PaymentStatus::Failed, 1),
                info("c", PaymentStatus::Succeeded, 7),
                info("d", PaymentStatus::InFlight, 1),
            ],
            t(0),
            t(5),
        )
        .unwrap();
        let hashes: Vec<_> = out.iter().map(|i| i.payment.payment_hash.as_str()).collect();
        assert_eq!(hashes, ["a"]);
    }

    #[test]
    fn settled_duplicates_are_rejected() {
        let err = filter_payments(
            vec![info("a", PaymentStatus::Succeeded, 1), info("a", PaymentStatus::Succeeded, 2)],
            t(0),
            t(5),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatesNotSupported(hash) if hash == "a"));

        // a failed attempt sharing the hash is fine
        let out = filter_payments(
            vec![info("a", PaymentStatus::Failed, 1), info("a", PaymentStatus::Succeeded, 2)],
            t(0),
            t(5),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn invoices_must_be_settled_in_range() {
        let invoice = |state, h| Invoice {
            payment_hash: "h".into(),
            preimage: "p".into(),
            memo: String::new(),
            value_msat: 1,
            amt_paid_msat: 1,
            settle_date: t(h),
            state,
            is_keysend: false,
        };
        let out = filter_invoices(
            vec![
                invoice(InvoiceState::Settled, 1),
                invoice(InvoiceState::Open, 1),
                invoice(InvoiceState::Settled, 5),
            ],
            t(0),
            t(5),
        );
        assert_eq!(out.len(), 1);
    }

    /// Decodes every request to the same destination and records how many
    /// decodes were in flight at once.
    #[derive(Default)]
    struct Decoder {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        decoded: AtomicUsize,
    }

    #[async_trait]
    impl OffChainSource for Decoder {
        async fn node_pubkey(&self) -> Result<String> {
            Ok("02own".into())
        }
        async fn list_invoices(&self) -> Result<Vec<Invoice>> {
            Ok(Vec::new())
        }
        async fn list_payments(&self) -> Result<Vec<Payment>> {
            Ok(Vec::new())
        }
        async fn list_forwards(
            &self,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<Vec<ForwardingEvent>> {
            Ok(Vec::new())
        }
        async fn decode_payment_request(&self, payment_request: &str) -> Result<PayReq> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if payment_request == "bad" {
                return Err(LedgerError::from_source("cannot decode"));
            }
            self.decoded.fetch_add(1, Ordering::SeqCst);
            Ok(PayReq {
                destination: "02dest".into(),
                description: String::new(),
            })
        }
    }

    fn routeless(hash: &str, request: &str) -> Payment {
        Payment {
            payment_request: request.into(),
            ..payment(hash, PaymentStatus::Succeeded, Vec::new())
        }
    }

    #[tokio::test]
    async fn payment_requests_are_decoded_one_at_a_time() {
        let source = Decoder::default();
        let payments = (0..8).map(|i| routeless(&format!("h{i}"), "lnbc1")).collect();

        let infos = pre_process_payments(payments, &source).await.unwrap();

        assert_eq!(infos.len(), 8);
        assert_eq!(infos[3].payment.payment_hash, "h3");
        assert!(infos.iter().all(|i| i.destination.as_deref() == Some("02dest")));
        assert_eq!(source.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decoding_stops_at_the_first_failure() {
        let source = Decoder::default();
        let payments = vec![
            routeless("a", "lnbc1"),
            routeless("b", "bad"),
            routeless("c", "lnbc1"),
        ];

        let err = pre_process_payments(payments, &source).await.unwrap_err();

        assert!(matches!(err, LedgerError::Source(_)));
        assert_eq!(source.decoded.load(Ordering::SeqCst), 1);
    }
}
