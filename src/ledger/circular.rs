//! Detection of payments made to our own node.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{LedgerError, Result};
use crate::ledger::filter::PaymentInfo;

/// Payment hashes classified as paid-to-self or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircularPayments {
    paid_to_self: HashMap<String, bool>,
}

impl CircularPayments {
    /// Classify every payment whose destination is known.
    ///
    /// Payments sharing a hash must agree on whether they were paid to
    /// `own_pubkey`.
    pub fn detect(own_pubkey: &str, payments: &[PaymentInfo]) -> Result<Self> {
        let mut paid_to_self = HashMap::new();

        for info in payments {
            let Some(destination) = &info.destination else {
                continue;
            };
            let to_self = destination == own_pubkey;

            match paid_to_self.entry(info.payment.payment_hash.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(to_self);
                }
                Entry::Occupied(existing) if *existing.get() != to_self => {
                    return Err(LedgerError::DifferentDuplicates(existing.key().clone()));
                }
                Entry::Occupied(_) => {}
            }
        }

        Ok(Self { paid_to_self })
    }

    /// Whether `payment_hash` belongs to a payment we made to ourselves.
    pub fn is_circular(&self, payment_hash: &str) -> bool {
        self.paid_to_self.get(payment_hash).copied().unwrap_or(false)
    }

    /// Number of circular payment hashes.
    pub fn count(&self) -> usize {
        self.paid_to_self.values().filter(|to_self| **to_self).count()
    }
}
