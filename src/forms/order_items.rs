use serde::Deserialize;
use validator::Validate;

use crate::domain::order::NewOrderItem;
use crate::forms::orders::{CartItemForm, OrderFormResult, check_side_ids};

/// Payload adding a line to an open order.
#[derive(Debug, Deserialize, Validate)]
pub struct AddOrderItemForm {
    #[serde(flatten)]
    #[validate(nested)]
    pub item: CartItemForm,
    pub expected_version: Option<i32>,
}

impl AddOrderItemForm {
    /// Validates the payload, returning the line and the version precondition.
    pub fn into_parts(self) -> OrderFormResult<(NewOrderItem, Option<i32>)> {
        self.validate()?;
        Ok((self.item.into_new_order_item()?, self.expected_version))
    }
}

/// Payload setting the quantity of a line. Zero removes the line.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityForm {
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub expected_version: Option<i32>,
}

/// Payload taking units off a line.
#[derive(Debug, Deserialize, Validate)]
pub struct RemoveQuantityForm {
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub expected_version: Option<i32>,
}

/// Payload replacing the sides of a line.
#[derive(Debug, Deserialize)]
pub struct ReplaceSidesForm {
    #[serde(default)]
    pub side_ids: Vec<i32>,
    pub expected_version: Option<i32>,
}

impl ReplaceSidesForm {
    /// Checks the side ids before they reach the repository.
    pub fn validate_sides(&self) -> OrderFormResult<()> {
        check_side_ids(&self.side_ids)
    }
}
