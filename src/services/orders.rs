use serde::Deserialize;
use validator::Validate;

use crate::change_feed::{ChangeEvent, ChangeFeed, Entity};
use crate::domain::order::{Order, OrderListQuery, OrderStatus};
use crate::domain::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::forms::orders::{CreateOrderForm, TransferOrderForm, UpdateStatusForm, VersionForm};
use crate::repository::{OrderReader, OrderWriter};
use crate::services::{ServiceError, ServiceResult, rejected};

/// Query parameters accepted by the orders listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i32>,
    /// Only list orders that still occupy their table.
    #[serde(default)]
    pub active_only: bool,
    /// Page requested by the client (1-based).
    pub page: Option<usize>,
}

/// Lists orders, newest first, one page at a time.
pub fn list_orders<R>(repo: &R, query: OrdersQuery) -> ServiceResult<Paginated<Order>>
where
    R: OrderReader + ?Sized,
{
    let OrdersQuery {
        status,
        table_id,
        active_only,
        page,
    } = query;

    let page = page.unwrap_or(1).max(1);
    let mut list_query = OrderListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(status) = status {
        list_query = list_query.status(status);
    }

    if let Some(table_id) = table_id {
        list_query = list_query.table_id(table_id);
    }

    if active_only {
        list_query = list_query.active_only();
    }

    let (total, orders) = repo.list_orders(list_query).map_err(ServiceError::from)?;

    Ok(Paginated::new(orders, page, DEFAULT_ITEMS_PER_PAGE, total))
}

/// Loads an order with its lines and sides.
pub fn get_order<R>(repo: &R, order_id: i32) -> ServiceResult<Order>
where
    R: OrderReader + ?Sized,
{
    repo.get_order_by_id(order_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Opens an order on a free table with its initial cart.
pub fn create_order<R>(
    repo: &R,
    feed: &ChangeFeed,
    form: CreateOrderForm,
    initial_status: OrderStatus,
) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    let new_order = form
        .into_new_order(initial_status)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let table_id = new_order.table_id;
    let order = repo
        .create_order(&new_order)
        .map_err(|err| rejected(format_args!("Failed to open order on table {table_id}"), err))?;

    log::info!(
        "Order {} opened on table {} as {} with total {}",
        order.id,
        order.table_id,
        order.status,
        order.total_amount
    );

    feed.publish(ChangeEvent::inserted(Entity::Orders, order.id));
    feed.publish_all(
        order
            .items
            .iter()
            .map(|item| ChangeEvent::inserted(Entity::OrderItems, item.id)),
    );
    feed.publish(ChangeEvent::updated(Entity::Tables, order.table_id));

    Ok(order)
}

/// Moves an order along its lifecycle.
pub fn update_order_status<R>(
    repo: &R,
    feed: &ChangeFeed,
    order_id: i32,
    form: UpdateStatusForm,
) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    let UpdateStatusForm {
        status,
        expected_version,
    } = form;

    let order = repo
        .update_order_status(order_id, status, expected_version)
        .map_err(|err| rejected(format_args!("Order {order_id} cannot move to {status}"), err))?;

    log::info!("Order {order_id} is now {status}");

    feed.publish(ChangeEvent::updated(Entity::Orders, order.id));
    if status.is_terminal() {
        feed.publish(ChangeEvent::updated(Entity::Tables, order.table_id));
    }

    Ok(order)
}

/// Cancels an order and frees its table.
pub fn cancel_order<R>(
    repo: &R,
    feed: &ChangeFeed,
    order_id: i32,
    form: VersionForm,
) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    update_order_status(
        repo,
        feed,
        order_id,
        UpdateStatusForm {
            status: OrderStatus::Cancelled,
            expected_version: form.expected_version,
        },
    )
}

/// Seats an order at another table. An occupied destination needs `confirm`.
pub fn transfer_order<R>(
    repo: &R,
    feed: &ChangeFeed,
    order_id: i32,
    form: TransferOrderForm,
) -> ServiceResult<Order>
where
    R: OrderReader + OrderWriter + ?Sized,
{
    form.validate()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let source_table_id = get_order(repo, order_id)?.table_id;

    let order = repo
        .transfer_order(order_id, form.table_id, form.confirm, form.expected_version)
        .map_err(|err| {
            rejected(
                format_args!("Order {order_id} cannot move to table {}", form.table_id),
                err,
            )
        })?;

    log::info!(
        "Order {order_id} moved from table {source_table_id} to table {}",
        order.table_id
    );

    feed.publish_all([
        ChangeEvent::updated(Entity::Orders, order.id),
        ChangeEvent::updated(Entity::Tables, source_table_id),
        ChangeEvent::updated(Entity::Tables, order.table_id),
    ]);

    Ok(order)
}

/// Recomputes the totals of an open order from its current lines.
pub fn recalculate_order<R>(repo: &R, feed: &ChangeFeed, order_id: i32) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    let order = repo
        .recalculate_order(order_id)
        .map_err(|err| rejected(format_args!("Failed to recalculate order {order_id}"), err))?;

    feed.publish(ChangeEvent::updated(Entity::Orders, order.id));
    Ok(order)
}

/// Deletes an unpaid order together with its lines.
pub fn delete_order<R>(repo: &R, feed: &ChangeFeed, order_id: i32) -> ServiceResult<()>
where
    R: OrderReader + OrderWriter + ?Sized,
{
    let order = get_order(repo, order_id)?;

    repo.delete_order(order_id)
        .map_err(|err| rejected(format_args!("Failed to delete order {order_id}"), err))?;

    log::info!("Order {order_id} deleted from table {}", order.table_id);

    feed.publish(ChangeEvent::deleted(Entity::Orders, order.id));
    feed.publish_all(
        order
            .items
            .iter()
            .map(|item| ChangeEvent::deleted(Entity::OrderItems, item.id)),
    );
    feed.publish(ChangeEvent::updated(Entity::Tables, order.table_id));

    Ok(())
}
