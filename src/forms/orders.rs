use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::order::{NewOrder, NewOrderItem, OrderStatus};
use crate::forms::{NOTES_MAX_LEN, empty_string_as_none, sanitize_notes};

/// Result type returned by the order form helpers.
pub type OrderFormResult<T> = Result<T, OrderFormError>;

/// Errors that can occur while processing order payloads.
#[derive(Debug, Error)]
pub enum OrderFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// A side id is not a valid identifier.
    #[error("invalid side id: {0}")]
    InvalidSide(i32),
    /// The same side was selected twice for one line.
    #[error("side {0} selected more than once")]
    DuplicateSide(i32),
}

/// One line of a cart.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItemForm {
    #[validate(range(min = 1))]
    pub menu_item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(range(min = 1))]
    pub cooking_point_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = NOTES_MAX_LEN))]
    pub notes: Option<String>,
    #[serde(default)]
    pub side_ids: Vec<i32>,
}

impl CartItemForm {
    /// Validates the line and converts it into a domain `NewOrderItem`.
    pub fn into_new_order_item(self) -> OrderFormResult<NewOrderItem> {
        self.validate()?;
        check_side_ids(&self.side_ids)?;

        let mut item = NewOrderItem::new(self.menu_item_id, self.quantity).with_sides(self.side_ids);
        if let Some(cooking_point_id) = self.cooking_point_id {
            item = item.with_cooking_point(cooking_point_id);
        }
        if let Some(notes) = sanitize_notes(self.notes) {
            item = item.with_notes(notes);
        }
        Ok(item)
    }
}

/// Reject non-positive and repeated side ids.
pub(crate) fn check_side_ids(side_ids: &[i32]) -> OrderFormResult<()> {
    for (index, &side_id) in side_ids.iter().enumerate() {
        if side_id < 1 {
            return Err(OrderFormError::InvalidSide(side_id));
        }
        if side_ids[..index].contains(&side_id) {
            return Err(OrderFormError::DuplicateSide(side_id));
        }
    }
    Ok(())
}

/// Payload submitted to open an order on a table.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderForm {
    #[validate(range(min = 1))]
    pub table_id: i32,
    #[validate(range(min = 1))]
    pub owner_id: i32,
    #[validate(range(min = 1))]
    pub diners_count: i32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = NOTES_MAX_LEN))]
    pub notes: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<CartItemForm>,
}

impl CreateOrderForm {
    /// Validates the payload and builds a `NewOrder` created in `status`.
    pub fn into_new_order(self, status: OrderStatus) -> OrderFormResult<NewOrder> {
        self.validate()?;

        let mut order =
            NewOrder::new(self.table_id, self.owner_id, self.diners_count).with_status(status);
        if let Some(notes) = sanitize_notes(self.notes) {
            order = order.with_notes(notes);
        }
        for item in self.items {
            order = order.with_item(item.into_new_order_item()?);
        }
        Ok(order)
    }
}

/// Payload moving an order along its lifecycle.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    pub status: OrderStatus,
    pub expected_version: Option<i32>,
}

/// Optimistic precondition carried by writes without other input.
#[derive(Debug, Default, Deserialize)]
pub struct VersionForm {
    pub expected_version: Option<i32>,
}

/// Payload moving an order to another table.
#[derive(Debug, Deserialize, Validate)]
pub struct TransferOrderForm {
    #[validate(range(min = 1))]
    pub table_id: i32,
    /// Move even when the destination already has an active order.
    #[serde(default)]
    pub confirm: bool,
    pub expected_version: Option<i32>,
}
