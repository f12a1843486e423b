use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::money::Amount;
use crate::domain::order::Order;
use crate::domain::payment::{Payment, PaymentMethod};
use crate::domain::table::Table;

/// Line printed on an invoice.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceLine {
    pub menu_item_id: i32,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Fully computed invoice handed to the printing collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Invoice {
    pub order_id: i32,
    pub table_number: i32,
    pub items: Vec<InvoiceLine>,
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub tip_amount: Amount,
    pub grand_total: Amount,
    pub received_amount: Option<Amount>,
    pub change_amount: Amount,
    pub payment_method: String,
}

impl Invoice {
    /// Assemble the invoice of a settled order. `item_names` maps menu item
    /// ids to printable names; unknown ids print as `#<id>`.
    pub fn build(
        order: &Order,
        table: &Table,
        payment: &Payment,
        method: &PaymentMethod,
        item_names: &HashMap<i32, String>,
    ) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| InvoiceLine {
                menu_item_id: item.menu_item_id,
                name: item_names
                    .get(&item.menu_item_id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", item.menu_item_id)),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
            .collect();

        Self {
            order_id: order.id,
            table_number: table.number,
            items,
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            tip_amount: payment.tip_amount,
            grand_total: order.grand_total,
            received_amount: payment.received_amount,
            change_amount: payment.change_amount,
            payment_method: method.name.clone(),
        }
    }
}
