use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::payment::{Settlement, Tip, TipBase};
use crate::forms::{NOTES_MAX_LEN, empty_string_as_none, sanitize_inline_text, sanitize_notes};

const REFERENCE_MAX_LEN: u64 = 128;
/// Largest tip or cash amount a settlement accepts.
const AMOUNT_MAX: f64 = 1_000_000_000_000.0;

/// Result type returned by the payment form helpers.
pub type PaymentFormResult<T> = Result<T, PaymentFormError>;

/// Errors that can occur while processing a settlement payload.
#[derive(Debug, Error)]
pub enum PaymentFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("tip percentage must be between 0 and 100")]
    TipPercentageOutOfRange,
    #[error("tip amount must be a number between 0 and 1000000000000")]
    InvalidTipAmount,
}

/// Payload submitted to settle an order.
#[derive(Debug, Deserialize, Validate)]
pub struct SettleOrderForm {
    #[validate(range(min = 1))]
    pub payment_method_id: i32,
    #[serde(default)]
    pub tip: Tip,
    /// Cash handed over by the customer.
    #[validate(range(min = 0.0, max = AMOUNT_MAX))]
    pub received_amount: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = REFERENCE_MAX_LEN))]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = NOTES_MAX_LEN))]
    pub notes: Option<String>,
    pub expected_version: Option<i32>,
}

impl SettleOrderForm {
    /// Validates the payload and builds the settlement request for `order_id`.
    pub fn into_settlement(self, order_id: i32, tip_base: TipBase) -> PaymentFormResult<Settlement> {
        self.validate()?;

        match self.tip {
            Tip::Percentage(percentage) if !(0.0..=100.0).contains(&percentage) => {
                return Err(PaymentFormError::TipPercentageOutOfRange);
            }
            Tip::Fixed(amount) if !(0.0..=AMOUNT_MAX).contains(&amount) => {
                return Err(PaymentFormError::InvalidTipAmount);
            }
            _ => {}
        }

        let mut settlement = Settlement::new(order_id, self.payment_method_id)
            .with_tip(self.tip)
            .with_tip_base(tip_base);

        if let Some(received_amount) = self.received_amount {
            settlement = settlement.with_received_amount(received_amount);
        }
        if let Some(reference) = self
            .reference
            .map(|reference| sanitize_inline_text(&reference))
            .filter(|reference| !reference.is_empty())
        {
            settlement = settlement.with_reference(reference);
        }
        if let Some(notes) = sanitize_notes(self.notes) {
            settlement = settlement.with_notes(notes);
        }
        if let Some(version) = self.expected_version {
            settlement = settlement.with_expected_version(version);
        }

        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SettleOrderForm {
        serde_json::from_str(json).expect("payload should deserialize")
    }

    #[test]
    fn settle_form_builds_cash_settlement() {
        let form = parse(
            r#"{
                "payment_method_id": 1,
                "tip": {"kind": "percentage", "value": 10},
                "received_amount": 25000,
                "reference": " till 2 ",
                "expected_version": 6
            }"#,
        );

        let settlement = form
            .into_settlement(42, TipBase::Menu)
            .expect("expected conversion to succeed");

        assert_eq!(settlement.order_id, 42);
        assert_eq!(settlement.payment_method_id, 1);
        assert_eq!(settlement.tip, Tip::Percentage(10.0));
        assert_eq!(settlement.received_amount, Some(25000.0));
        assert_eq!(settlement.reference.as_deref(), Some("till 2"));
        assert_eq!(settlement.expected_version, Some(6));
        assert_eq!(settlement.tip_base, TipBase::Menu);
    }

    #[test]
    fn settle_form_defaults_to_no_tip() {
        let settlement = parse(r#"{"payment_method_id": 2}"#)
            .into_settlement(1, TipBase::Order)
            .expect("expected conversion to succeed");

        assert_eq!(settlement.tip, Tip::None);
        assert_eq!(settlement.received_amount, None);
        assert_eq!(settlement.tip_base, TipBase::Order);
    }

    #[test]
    fn settle_form_rejects_out_of_range_tip() {
        let form = parse(r#"{"payment_method_id": 2, "tip": {"kind": "percentage", "value": 150}}"#);

        assert!(matches!(
            form.into_settlement(1, TipBase::Menu),
            Err(PaymentFormError::TipPercentageOutOfRange)
        ));

        let form = parse(r#"{"payment_method_id": 2, "tip": {"kind": "fixed", "value": -5}}"#);

        assert!(matches!(
            form.into_settlement(1, TipBase::Menu),
            Err(PaymentFormError::InvalidTipAmount)
        ));
    }

    #[test]
    fn settle_form_rejects_negative_cash() {
        let form = parse(r#"{"payment_method_id": 2, "received_amount": -1}"#);

        assert!(matches!(
            form.into_settlement(1, TipBase::Menu),
            Err(PaymentFormError::Validation(_))
        ));
    }

    #[test]
    fn settle_form_rejects_oversized_amounts() {
        let form = parse(r#"{"payment_method_id": 2, "tip": {"kind": "fixed", "value": 1e20}}"#);

        assert!(matches!(
            form.into_settlement(1, TipBase::Menu),
            Err(PaymentFormError::InvalidTipAmount)
        ));

        let form = parse(r#"{"payment_method_id": 1, "received_amount": 1e20}"#);

        assert!(matches!(
            form.into_settlement(1, TipBase::Menu),
            Err(PaymentFormError::Validation(_))
        ));
    }
}
