//! Unit and currency conversion.

use rust_decimal::Decimal;

use crate::constants::MSAT_PER_BTC;
use crate::error::{LedgerError, Result};
use crate::types::price::PricePoint;

/// Fiat value of `amount_msat` at `price` per whole bitcoin.
pub fn msat_to_fiat(price: Decimal, amount_msat: u64) -> Decimal {
    Decimal::from(amount_msat) * price / Decimal::from(MSAT_PER_BTC)
}

/// Re-denominate USD prices into `currency`, given the USD value of one
/// unit of that currency.
pub fn usd_to_currency(
    points: Vec<PricePoint>,
    usd_rate: Decimal,
    currency: &str,
) -> Result<Vec<PricePoint>> {
    if usd_rate <= Decimal::ZERO {
        return Err(LedgerError::UnknownCurrency(format!(
            "{currency} has non-positive USD rate {usd_rate}"
        )));
    }

    Ok(points
        .into_iter()
        .map(|p| PricePoint::new(p.timestamp, p.price / usd_rate, currency))
        .collect())
}
