use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pricing view of a catalog menu item.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MenuItem {
    /// Unique identifier of the menu item.
    pub id: i32,
    /// Name printed on tickets and invoices.
    pub name: String,
    /// Display price, tax included.
    pub price: f64,
    /// Tax-exclusive base price, when the catalog carries one.
    pub base_price: Option<f64>,
    /// Tax rate as a percentage.
    pub tax_rate: f64,
    /// Service fee as a percentage. Not applied to order totals.
    pub fee_percent: f64,
    /// Whether the item can still be ordered.
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MenuItem {
    /// Tax-exclusive unit price, falling back to the display price when the
    /// catalog has no base price.
    pub fn unit_price(&self) -> f64 {
        self.base_price.unwrap_or(self.price)
    }
}

/// Payload required to insert a menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMenuItem {
    pub name: String,
    pub price: f64,
    pub base_price: Option<f64>,
    pub tax_rate: f64,
    pub fee_percent: f64,
}

impl NewMenuItem {
    /// Build a menu item payload with a display price and tax rate.
    pub fn new(name: impl Into<String>, price: f64, tax_rate: f64) -> Self {
        Self {
            name: name.into(),
            price,
            base_price: None,
            tax_rate,
            fee_percent: 0.0,
        }
    }

    /// Set the tax-exclusive base price.
    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = Some(base_price);
        self
    }
}
