//! Monetary arithmetic for a zero-decimal currency.
//!
//! Intermediate sums are kept as [`Decimal`] and rounded once per aggregate,
//! so rounding error does not compound over many small lines. Every amount
//! that is persisted or compared goes through [`round_amount`].

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount represented in the smallest currency unit.
pub type Amount = i64;

/// Raised when a value cannot be carried as a monetary amount.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is not a finite number")]
    NotFinite,
    #[error("amount is outside the supported range")]
    OutOfRange,
}

/// Convert a stored `f64` value to a [`Decimal`] for calculation.
pub fn to_decimal(value: f64) -> Result<Decimal, MoneyError> {
    if !value.is_finite() {
        return Err(MoneyError::NotFinite);
    }
    Decimal::from_f64(value).ok_or(MoneyError::OutOfRange)
}

/// Round a fractional amount to the nearest whole currency unit (half-up).
pub fn round_amount(value: Decimal) -> Result<Amount, MoneyError> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MoneyError::OutOfRange)
}

/// `percent` percent of `base`, unrounded.
pub fn percent_of(base: Decimal, percent: Decimal) -> Result<Decimal, MoneyError> {
    base.checked_mul(percent)
        .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(MoneyError::OutOfRange)
}

/// Sum `values`, failing instead of overflowing.
fn checked_sum<I>(values: I) -> Result<Decimal, MoneyError>
where
    I: IntoIterator<Item = Result<Decimal, MoneyError>>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value?).ok_or(MoneyError::OutOfRange)
    })
}

/// A line item joined with the pricing data required to total it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    /// Tax-exclusive unit price.
    pub unit_price: Decimal,
    /// Number of units ordered.
    pub quantity: i32,
    /// Tax rate expressed as a percentage (8 means 8%).
    pub tax_rate: Decimal,
}

impl PricedLine {
    /// Build a priced line from stored catalog values.
    pub fn new(unit_price: f64, quantity: i32, tax_rate: f64) -> Result<Self, MoneyError> {
        Ok(Self {
            unit_price: to_decimal(unit_price)?,
            quantity,
            tax_rate: to_decimal(tax_rate)?,
        })
    }

    /// Unrounded tax-exclusive amount of the line.
    pub fn net(&self) -> Result<Decimal, MoneyError> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(MoneyError::OutOfRange)
    }

    /// Unrounded tax amount of the line.
    pub fn tax(&self) -> Result<Decimal, MoneyError> {
        percent_of(self.net()?, self.tax_rate)
    }
}

/// Monetary totals derived from the current line items of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Tax-exclusive subtotal.
    pub subtotal: Amount,
    /// Tax charged on top of the subtotal.
    pub tax_amount: Amount,
    /// `subtotal + tax_amount`.
    pub total_amount: Amount,
}

impl OrderTotals {
    /// Compute the totals of a set of lines.
    ///
    /// Subtotal and tax are summed unrounded and rounded independently; the
    /// total is their sum. The result depends only on `lines`.
    pub fn from_lines(lines: &[PricedLine]) -> Result<Self, MoneyError> {
        let raw_subtotal = checked_sum(lines.iter().map(PricedLine::net))?;
        let raw_tax = checked_sum(lines.iter().map(PricedLine::tax))?;

        let subtotal = round_amount(raw_subtotal)?;
        let tax_amount = round_amount(raw_tax)?;

        Ok(Self {
            subtotal,
            tax_amount,
            total_amount: subtotal
                .checked_add(tax_amount)
                .ok_or(MoneyError::OutOfRange)?,
        })
    }
}

/// Rounded tax-exclusive subtotal of `lines`, used as the tip base.
pub fn base_subtotal(lines: &[PricedLine]) -> Result<Amount, MoneyError> {
    round_amount(checked_sum(lines.iter().map(PricedLine::net))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_price: f64, quantity: i32, tax_rate: f64) -> PricedLine {
        PricedLine::new(unit_price, quantity, tax_rate).expect("valid line")
    }

    #[test]
    fn round_amount_rounds_half_up() {
        assert_eq!(round_amount(Decimal::new(5, 1)), Ok(1));
        assert_eq!(round_amount(Decimal::new(25, 1)), Ok(3));
        assert_eq!(round_amount(Decimal::new(24, 1)), Ok(2));
        assert_eq!(round_amount(Decimal::new(1_999_949, 2)), Ok(19_999));
        assert_eq!(round_amount(Decimal::ZERO), Ok(0));
    }

    #[test]
    fn totals_for_two_units_at_eight_percent() {
        let totals = OrderTotals::from_lines(&[line(20_000.0, 2, 8.0)]).unwrap();

        assert_eq!(totals.subtotal, 40_000);
        assert_eq!(totals.tax_amount, 3_200);
        assert_eq!(totals.total_amount, 43_200);
    }

    #[test]
    fn totals_round_once_per_aggregate() {
        // Each line carries 0.4 of tax; rounding per line would yield zero.
        let lines = [
            line(5.0, 1, 8.0),
            line(5.0, 1, 8.0),
            line(5.0, 1, 8.0),
        ];

        let totals = OrderTotals::from_lines(&lines).unwrap();

        assert_eq!(totals.subtotal, 15);
        assert_eq!(totals.tax_amount, 1);
        assert_eq!(totals.total_amount, 16);
    }

    #[test]
    fn totals_with_fractional_base_price() {
        // A 10000 display price with 8% tax included.
        let lines = [line(9_259.259_259, 3, 8.0)];

        let totals = OrderTotals::from_lines(&lines).unwrap();

        assert_eq!(totals.subtotal, 27_778);
        assert_eq!(totals.tax_amount, 2_222);
        assert_eq!(totals.total_amount, totals.subtotal + totals.tax_amount);
    }

    #[test]
    fn totals_are_idempotent() {
        let lines = [
            line(12_500.0, 3, 8.0),
            line(3_333.33, 7, 19.0),
        ];

        assert_eq!(OrderTotals::from_lines(&lines), OrderTotals::from_lines(&lines));
    }

    #[test]
    fn empty_order_totals_are_zero() {
        assert_eq!(OrderTotals::from_lines(&[]), Ok(OrderTotals::default()));
        assert_eq!(base_subtotal(&[]), Ok(0));
    }

    #[test]
    fn base_subtotal_ignores_tax() {
        let lines = [line(20_000.0, 1, 8.0), line(0.6, 1, 8.0)];

        assert_eq!(base_subtotal(&lines), Ok(20_001));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(to_decimal(f64::NAN), Err(MoneyError::NotFinite));
        assert_eq!(
            PricedLine::new(f64::INFINITY, 1, 8.0),
            Err(MoneyError::NotFinite)
        );
    }

    #[test]
    fn unrepresentable_values_are_rejected() {
        assert_eq!(to_decimal(1e30), Err(MoneyError::OutOfRange));
        assert_eq!(
            round_amount(Decimal::from_i128_with_scale(i128::from(i64::MAX) + 1, 0)),
            Err(MoneyError::OutOfRange)
        );
    }

    #[test]
    fn totals_beyond_amount_range_fail() {
        let lines = [line(1e15, 2_000_000_000, 8.0)];

        assert_eq!(OrderTotals::from_lines(&lines), Err(MoneyError::OutOfRange));
        assert_eq!(base_subtotal(&lines), Err(MoneyError::OutOfRange));
    }

    #[test]
    fn total_overflow_fails() {
        // Each aggregate fits on its own, their sum does not.
        let lines = [line(9e18, 1, 100.0)];

        assert_eq!(OrderTotals::from_lines(&lines), Err(MoneyError::OutOfRange));
    }
}
