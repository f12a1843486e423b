use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::menu_item::MenuItem as DomainMenuItem;
use crate::domain::order::{NewOrderItem as DomainNewOrderItem, OrderItemOutcome};
use crate::models::menu_item::MenuItem as DbMenuItem;
use crate::models::order::{
    NewOrderItem as DbNewOrderItem, NewOrderItemSide as DbNewOrderItemSide,
    OrderItem as DbOrderItem,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::order::{ensure_editable, load_order, load_order_row, recalculate};
use crate::repository::{DieselRepository, OrderItemWriter};

/// Insert a line priced from the catalog together with its sides. Returns
/// the id of the new line.
pub(crate) fn insert_line(
    conn: &mut SqliteConnection,
    order_id: i32,
    item: &DomainNewOrderItem,
) -> RepositoryResult<i32> {
    use crate::schema::{menu_items, order_items};

    if item.quantity <= 0 {
        return Err(RepositoryError::ValidationError(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }

    let menu_item: DomainMenuItem = menu_items::table
        .find(item.menu_item_id)
        .first::<DbMenuItem>(conn)?
        .into();
    if !menu_item.active {
        return Err(RepositoryError::ValidationError(format!(
            "menu item {} is no longer available",
            menu_item.name
        )));
    }

    let item_id = diesel::insert_into(order_items::table)
        .values(&DbNewOrderItem::from_domain(order_id, menu_item.unit_price(), item))
        .returning(order_items::id)
        .get_result::<i32>(conn)?;

    insert_sides(conn, item_id, &item.side_ids)?;

    log::debug!(
        "Order {order_id}: added {} x menu item {} at {}",
        item.quantity,
        menu_item.id,
        menu_item.unit_price()
    );
    Ok(item_id)
}

fn insert_sides(
    conn: &mut SqliteConnection,
    order_item_id: i32,
    side_ids: &[i32],
) -> RepositoryResult<()> {
    use crate::schema::order_item_sides;

    if side_ids.is_empty() {
        return Ok(());
    }

    diesel::insert_into(order_item_sides::table)
        .values(&DbNewOrderItemSide::for_item(order_item_id, side_ids))
        .execute(conn)?;
    Ok(())
}

fn delete_sides(conn: &mut SqliteConnection, order_item_id: i32) -> RepositoryResult<()> {
    use crate::schema::order_item_sides;

    diesel::delete(
        order_item_sides::table.filter(order_item_sides::order_item_id.eq(order_item_id)),
    )
    .execute(conn)?;
    Ok(())
}

/// Delete a line. Sides go first, they reference the line.
fn delete_line(conn: &mut SqliteConnection, order_item_id: i32) -> RepositoryResult<()> {
    use crate::schema::order_items;

    delete_sides(conn, order_item_id)?;
    diesel::delete(order_items::table.find(order_item_id)).execute(conn)?;
    Ok(())
}

fn set_quantity(
    conn: &mut SqliteConnection,
    item: &DbOrderItem,
    quantity: i32,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    use crate::schema::order_items;

    diesel::update(order_items::table.find(item.id))
        .set((
            order_items::quantity.eq(quantity),
            order_items::subtotal.eq(item.unit_price * f64::from(quantity)),
            order_items::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

/// Load a line and its order, refusing terminal orders and stale versions.
fn editable_line(
    conn: &mut SqliteConnection,
    item_id: i32,
    expected_version: Option<i32>,
) -> RepositoryResult<DbOrderItem> {
    use crate::schema::order_items;

    let item = order_items::table
        .find(item_id)
        .first::<DbOrderItem>(conn)?;
    let order = load_order_row(conn, item.order_id)?;
    ensure_editable(&order, expected_version)?;
    Ok(item)
}

/// Recalculate the order and describe the result of the mutation.
fn finish(
    conn: &mut SqliteConnection,
    order_id: i32,
    item_id: i32,
    now: NaiveDateTime,
) -> RepositoryResult<OrderItemOutcome> {
    recalculate(conn, order_id, now)?;
    let order = load_order(conn, order_id)?;
    let item = order.item(item_id).cloned();
    Ok(OrderItemOutcome { order, item })
}

impl OrderItemWriter for DieselRepository {
    fn add_order_item(
        &self,
        order_id: i32,
        item: &DomainNewOrderItem,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<OrderItemOutcome, RepositoryError, _>(|conn| {
            let order = load_order_row(conn, order_id)?;
            ensure_editable(&order, expected_version)?;

            let item_id = insert_line(conn, order_id, item)?;
            finish(conn, order_id, item_id, chrono::Local::now().naive_utc())
        })
    }

    fn update_order_item_quantity(
        &self,
        item_id: i32,
        quantity: i32,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<OrderItemOutcome, RepositoryError, _>(|conn| {
            if quantity < 0 {
                return Err(RepositoryError::ValidationError(format!(
                    "quantity cannot be negative, got {quantity}"
                )));
            }

            let item = editable_line(conn, item_id, expected_version)?;
            let now = chrono::Local::now().naive_utc();

            if quantity == 0 {
                delete_line(conn, item.id)?;
            } else {
                set_quantity(conn, &item, quantity, now)?;
            }

            finish(conn, item.order_id, item.id, now)
        })
    }

    fn remove_order_item_quantity(
        &self,
        item_id: i32,
        quantity: i32,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<OrderItemOutcome, RepositoryError, _>(|conn| {
            if quantity <= 0 {
                return Err(RepositoryError::ValidationError(format!(
                    "quantity to remove must be positive, got {quantity}"
                )));
            }

            let item = editable_line(conn, item_id, expected_version)?;
            let now = chrono::Local::now().naive_utc();
            let remaining = item.quantity - quantity;

            if remaining <= 0 {
                delete_line(conn, item.id)?;
            } else {
                set_quantity(conn, &item, remaining, now)?;
            }

            finish(conn, item.order_id, item.id, now)
        })
    }

    fn replace_order_item_sides(
        &self,
        item_id: i32,
        side_ids: &[i32],
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<OrderItemOutcome, RepositoryError, _>(|conn| {
            let item = editable_line(conn, item_id, expected_version)?;
            let now = chrono::Local::now().naive_utc();

            delete_sides(conn, item.id)?;
            insert_sides(conn, item.id, side_ids)?;

            finish(conn, item.order_id, item.id, now)
        })
    }
}
