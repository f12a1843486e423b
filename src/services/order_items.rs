use validator::Validate;

use crate::change_feed::{ChangeEvent, ChangeFeed, ChangeKind, Entity};
use crate::domain::order::OrderItemOutcome;
use crate::forms::order_items::{
    AddOrderItemForm, RemoveQuantityForm, ReplaceSidesForm, UpdateQuantityForm,
};
use crate::repository::OrderItemWriter;
use crate::services::{ServiceError, ServiceResult, rejected};

fn publish_outcome(feed: &ChangeFeed, item_id: i32, kind: ChangeKind, outcome: &OrderItemOutcome) {
    let kind = if outcome.item.is_some() {
        kind
    } else {
        ChangeKind::Deleted
    };

    feed.publish_all([
        ChangeEvent {
            entity: Entity::OrderItems,
            id: item_id,
            kind,
        },
        ChangeEvent::updated(Entity::Orders, outcome.order.id),
    ]);
}

/// Adds a line priced from the catalog to an open order.
pub fn add_order_item<R>(
    repo: &R,
    feed: &ChangeFeed,
    order_id: i32,
    form: AddOrderItemForm,
) -> ServiceResult<OrderItemOutcome>
where
    R: OrderItemWriter + ?Sized,
{
    let (item, expected_version) = form
        .into_parts()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let outcome = repo
        .add_order_item(order_id, &item, expected_version)
        .map_err(|err| rejected(format_args!("Failed to add item to order {order_id}"), err))?;

    let item_id = outcome
        .item
        .as_ref()
        .map(|line| line.id)
        .ok_or_else(|| ServiceError::Internal(format!("order {order_id} lost its new line")))?;

    log::info!(
        "Order {order_id}: added {} x menu item {}, total now {}",
        item.quantity,
        item.menu_item_id,
        outcome.order.total_amount
    );

    publish_outcome(feed, item_id, ChangeKind::Inserted, &outcome);
    Ok(outcome)
}

/// Sets the quantity of a line. Zero removes the line with its sides.
pub fn update_order_item_quantity<R>(
    repo: &R,
    feed: &ChangeFeed,
    item_id: i32,
    form: UpdateQuantityForm,
) -> ServiceResult<OrderItemOutcome>
where
    R: OrderItemWriter + ?Sized,
{
    form.validate()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let outcome = repo
        .update_order_item_quantity(item_id, form.quantity, form.expected_version)
        .map_err(|err| rejected(format_args!("Failed to update line {item_id}"), err))?;

    log::info!(
        "Order {}: line {item_id} set to {}, total now {}",
        outcome.order.id,
        form.quantity,
        outcome.order.total_amount
    );

    publish_outcome(feed, item_id, ChangeKind::Updated, &outcome);
    Ok(outcome)
}

/// Takes units off a line, removing it once nothing is left.
pub fn remove_order_item_quantity<R>(
    repo: &R,
    feed: &ChangeFeed,
    item_id: i32,
    form: RemoveQuantityForm,
) -> ServiceResult<OrderItemOutcome>
where
    R: OrderItemWriter + ?Sized,
{
    form.validate()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let outcome = repo
        .remove_order_item_quantity(item_id, form.quantity, form.expected_version)
        .map_err(|err| rejected(format_args!("Failed to reduce line {item_id}"), err))?;

    log::info!(
        "Order {}: removed {} from line {item_id}, total now {}",
        outcome.order.id,
        form.quantity,
        outcome.order.total_amount
    );

    publish_outcome(feed, item_id, ChangeKind::Updated, &outcome);
    Ok(outcome)
}

/// Replaces the sides chosen for a line.
pub fn replace_order_item_sides<R>(
    repo: &R,
    feed: &ChangeFeed,
    item_id: i32,
    form: ReplaceSidesForm,
) -> ServiceResult<OrderItemOutcome>
where
    R: OrderItemWriter + ?Sized,
{
    form.validate_sides()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let outcome = repo
        .replace_order_item_sides(item_id, &form.side_ids, form.expected_version)
        .map_err(|err| rejected(format_args!("Failed to replace sides of line {item_id}"), err))?;

    publish_outcome(feed, item_id, ChangeKind::Updated, &outcome);
    Ok(outcome)
}
