use std::fmt::Display;

pub use errors::{ServiceError, ServiceResult};

use crate::repository::errors::RepositoryError;

pub mod errors;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod tables;

/// Convert a repository failure, logging rejections at `warn` and faults at
/// `error`.
pub(crate) fn rejected(context: impl Display, err: RepositoryError) -> ServiceError {
    let err = ServiceError::from(err);
    match &err {
        ServiceError::Internal(_) => log::error!("{context}: {err}"),
        _ => log::warn!("{context}: {err}"),
    }
    err
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use tokio::sync::broadcast;

    use crate::change_feed::ChangeEvent;

    use crate::domain::order::{Order, OrderItem, OrderStatus};
    use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
    use crate::domain::table::Table;

    pub fn datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    pub fn sample_table(id: i32, status: bool) -> Table {
        Table {
            id,
            number: id * 10,
            capacity: 4,
            active: true,
            status,
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    pub fn sample_item(id: i32, order_id: i32, quantity: i32) -> OrderItem {
        OrderItem {
            id,
            order_id,
            menu_item_id: 100 + id,
            quantity,
            unit_price: 20000.0,
            subtotal: 20000.0 * f64::from(quantity),
            cooking_point_id: None,
            notes: None,
            sides: Vec::new(),
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    pub fn sample_order(id: i32, table_id: i32, status: OrderStatus) -> Order {
        Order {
            id,
            table_id,
            owner_id: 1,
            diners_count: 2,
            status,
            subtotal: 40000,
            tax_amount: 3200,
            total_amount: 43200,
            tip_amount: 0,
            grand_total: 43200,
            paid_amount: 0,
            change_amount: 0,
            notes: None,
            version: 1,
            items: vec![sample_item(1, id, 2)],
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    pub fn sample_method(id: i32, is_cash: bool) -> PaymentMethod {
        PaymentMethod {
            id,
            name: if is_cash { "Cash" } else { "Card" }.to_string(),
            is_cash,
            active: true,
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    pub fn sample_payment(id: i32, order: &Order, method_id: i32) -> Payment {
        Payment {
            id,
            order_id: order.id,
            payment_method_id: method_id,
            amount: order.total_amount,
            tip_amount: order.tip_amount,
            tip_percentage: None,
            total_paid: order.grand_total,
            received_amount: None,
            change_amount: 0,
            status: PaymentStatus::Completed,
            reference: None,
            notes: None,
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    /// Collect every event already published to `rx`.
    pub fn drain(rx: &mut broadcast::Receiver<ChangeEvent>) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}
