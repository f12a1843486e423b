use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::money::{Amount, MoneyError, percent_of, round_amount, to_decimal};

/// Status of a recorded payment.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Settlement record of an order. Never mutated after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub payment_method_id: i32,
    /// Order total at settlement time, tip excluded.
    pub amount: Amount,
    pub tip_amount: Amount,
    /// Percentage the tip was derived from, when it was not a fixed amount.
    pub tip_percentage: Option<f64>,
    /// `amount + tip_amount`.
    pub total_paid: Amount,
    /// Cash handed over by the diner.
    pub received_amount: Option<Amount>,
    pub change_amount: Amount,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payment method offered at the till.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentMethod {
    pub id: i32,
    pub name: String,
    /// Cash methods accept a received amount and hand back change.
    pub is_cash: bool,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payload required to register a payment method.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub name: String,
    pub is_cash: bool,
}

impl NewPaymentMethod {
    pub fn new(name: impl Into<String>, is_cash: bool) -> Self {
        Self {
            name: name.into(),
            is_cash,
        }
    }
}

/// How the tip is specified at settlement.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tip {
    /// No tip.
    #[default]
    None,
    /// Percentage of the tax-exclusive subtotal.
    Percentage(f64),
    /// Fixed amount.
    Fixed(f64),
}

/// Source of the tax-exclusive subtotal a percentage tip is applied to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TipBase {
    /// Re-derived from the current menu base prices of the order's lines.
    #[default]
    Menu,
    /// The subtotal stored on the order.
    Order,
}

impl fmt::Display for TipBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::Order => f.write_str("order"),
        }
    }
}

impl FromStr for TipBase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "menu" => Ok(Self::Menu),
            "order" => Ok(Self::Order),
            other => Err(format!("unknown tip base: {other}")),
        }
    }
}

/// Request to settle an order.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub order_id: i32,
    pub payment_method_id: i32,
    pub tip: Tip,
    /// Cash handed over by the diner, cash methods only.
    pub received_amount: Option<f64>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub tip_base: TipBase,
    /// Reject the settlement when the order's version moved on.
    pub expected_version: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl Settlement {
    /// Build a settlement request without tip or received cash.
    pub fn new(order_id: i32, payment_method_id: i32) -> Self {
        Self {
            order_id,
            payment_method_id,
            tip: Tip::None,
            received_amount: None,
            reference: None,
            notes: None,
            tip_base: TipBase::default(),
            expected_version: None,
            updated_at: chrono::Local::now().naive_utc(),
        }
    }

    pub fn with_tip(mut self, tip: Tip) -> Self {
        self.tip = tip;
        self
    }

    pub fn with_received_amount(mut self, received_amount: f64) -> Self {
        self.received_amount = Some(received_amount);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_tip_base(mut self, tip_base: TipBase) -> Self {
        self.tip_base = tip_base;
        self
    }

    pub fn with_expected_version(mut self, version: i32) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Errors raised while pricing a settlement.
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("tip must be a finite non-negative value")]
    InvalidTip,
    #[error("received amount must be a finite non-negative value")]
    InvalidReceivedAmount,
    #[error("received amount {received} is less than the {due} due")]
    InsufficientCash { due: Amount, received: Amount },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Amounts computed for a settlement before anything is written.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct SettlementQuote {
    /// Order total, tip excluded.
    pub amount: Amount,
    pub tip_amount: Amount,
    pub tip_percentage: Option<f64>,
    /// `amount + tip_amount`.
    pub total_to_pay: Amount,
    pub received_amount: Option<Amount>,
    pub change_amount: Amount,
}

impl SettlementQuote {
    /// Price a settlement.
    ///
    /// `tip_base` is the rounded tax-exclusive subtotal a percentage tip is
    /// applied to. Received cash below the amount due is rejected.
    pub fn compute(
        order_total: Amount,
        tip_base: Amount,
        tip: Tip,
        received: Option<f64>,
    ) -> Result<Self, SettlementError> {
        let (tip_amount, tip_percentage) = match tip {
            Tip::None => (0, None),
            Tip::Percentage(percentage) => {
                if !percentage.is_finite() || percentage < 0.0 {
                    return Err(SettlementError::InvalidTip);
                }
                let tip = percent_of(Decimal::from(tip_base), to_decimal(percentage)?)?;
                (round_amount(tip)?, Some(percentage))
            }
            Tip::Fixed(amount) => {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(SettlementError::InvalidTip);
                }
                (round_amount(to_decimal(amount)?)?, None)
            }
        };

        let total_to_pay = order_total
            .checked_add(tip_amount)
            .ok_or(MoneyError::OutOfRange)?;

        let (received_amount, change_amount) = match received {
            None => (None, 0),
            Some(received) => {
                if !received.is_finite() || received < 0.0 {
                    return Err(SettlementError::InvalidReceivedAmount);
                }
                let received = round_amount(to_decimal(received)?)?;
                if received < total_to_pay {
                    return Err(SettlementError::InsufficientCash {
                        due: total_to_pay,
                        received,
                    });
                }
                (Some(received), received - total_to_pay)
            }
        };

        Ok(Self {
            amount: order_total,
            tip_amount,
            tip_percentage,
            total_to_pay,
            received_amount,
            change_amount,
        })
    }
}

/// Payment row derived from a settlement quote.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub order_id: i32,
    pub payment_method_id: i32,
    pub amount: Amount,
    pub tip_amount: Amount,
    pub tip_percentage: Option<f64>,
    pub total_paid: Amount,
    pub received_amount: Option<Amount>,
    pub change_amount: Amount,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl NewPayment {
    /// Build the payment row recording `quote` for `settlement`.
    pub fn from_quote(settlement: &Settlement, quote: &SettlementQuote) -> Self {
        Self {
            order_id: settlement.order_id,
            payment_method_id: settlement.payment_method_id,
            amount: quote.amount,
            tip_amount: quote.tip_amount,
            tip_percentage: quote.tip_percentage,
            total_paid: quote.total_to_pay,
            received_amount: quote.received_amount,
            change_amount: quote.change_amount,
            status: PaymentStatus::Completed,
            reference: settlement.reference.clone(),
            notes: settlement.notes.clone(),
            updated_at: settlement.updated_at,
        }
    }
}
