//! Off-chain half of the report.

use crate::config::ReportConfig;
use crate::error::Result;
use crate::fiat::PriceLookup;
use crate::ledger::categories::CategoryMatcher;
use crate::ledger::circular::CircularPayments;
use crate::ledger::entries::{forward_entries, invoice_entry, payment_entries, payment_reference};
use crate::ledger::filter::{filter_invoices, filter_payments, in_range, pre_process_payments};
use crate::ledger::source::OffChainSource;
use crate::types::entry::LedgerEntry;

/// Convert invoices, payments and forwards within the report period into
/// ledger entries.
///
/// Payments are classified as circular before filtering so that every
/// attempt sharing a hash is checked for a consistent destination.
pub async fn off_chain_report(
    source: &dyn OffChainSource,
    config: &ReportConfig,
    categories: &CategoryMatcher,
    prices: &dyn PriceLookup,
) -> Result<Vec<LedgerEntry>> {
    let (own_pubkey, invoices, payments, forwards) = futures_util::try_join!(
        source.node_pubkey(),
        source.list_invoices(),
        source.list_payments(),
        source.list_forwards(config.start, config.end),
    )?;
    tracing::debug!(
        invoices = invoices.len(),
        payments = payments.len(),
        forwards = forwards.len(),
        "fetched off-chain data"
    );

    let payments = pre_process_payments(payments, source).await?;
    let circular = CircularPayments::detect(&own_pubkey, &payments)?;
    let payments = filter_payments(payments, config.start, config.end)?;
    let invoices = filter_invoices(invoices, config.start, config.end);
    let forwards: Vec<_> = forwards
        .into_iter()
        .filter(|fwd| in_range(fwd.timestamp, config.start, config.end))
        .collect();

    let capacity = invoices.len() + 2 * payments.len() + 2 * forwards.len();
    let mut entries = Vec::with_capacity(capacity);

    for invoice in &invoices {
        let category = categories.category(&invoice.memo, false, &invoice.preimage)?;
        let is_circular = circular.is_circular(&invoice.payment_hash);
        entries.push(invoice_entry(invoice, is_circular, category, prices)?);
    }

    for info in &payments {
        let label = info.description.as_deref().unwrap_or_default();
        let category = categories.category(label, false, &payment_reference(&info.payment))?;
        let is_circular = circular.is_circular(&info.payment.payment_hash);
        entries.extend(payment_entries(info, is_circular, category, prices)?);
    }

    for forward in &forwards {
        entries.extend(forward_entries(forward, None, prices)?);
    }

    tracing::info!(
        invoices = invoices.len(),
        payments = payments.len(),
        forwards = forwards.len(),
        circular = circular.count(),
        entries = entries.len(),
        "off-chain entries created"
    );
    Ok(entries)
}
