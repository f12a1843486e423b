use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::money::{OrderTotals, PricedLine};
use crate::domain::order::{
    NewOrder as DomainNewOrder, Order as DomainOrder, OrderItem as DomainOrderItem,
    OrderListQuery, OrderStatus,
};
use crate::models::order::{
    NewOrder as DbNewOrder, Order as DbOrder, OrderItem as DbOrderItem,
    OrderItemSide as DbOrderItemSide, UpdateOrderTotals,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::order_item::insert_line;
use crate::repository::table::{has_active_order, load_table, occupy_table, release_table};
use crate::repository::{DieselRepository, OrderReader, OrderWriter};

pub(crate) fn load_order_row(
    conn: &mut SqliteConnection,
    order_id: i32,
) -> RepositoryResult<DbOrder> {
    use crate::schema::orders;

    orders::table
        .find(order_id)
        .first::<DbOrder>(conn)
        .map_err(RepositoryError::from)
}

pub(crate) fn order_status(order: &DbOrder) -> RepositoryResult<OrderStatus> {
    order
        .status
        .parse::<OrderStatus>()
        .map_err(|err| RepositoryError::InvalidData(err.to_string()))
}

pub(crate) fn check_version(order: &DbOrder, expected_version: Option<i32>) -> RepositoryResult<()> {
    match expected_version {
        Some(expected) if expected != order.version => Err(RepositoryError::Conflict(format!(
            "order {} is at version {}, expected {expected}",
            order.id, order.version
        ))),
        _ => Ok(()),
    }
}

/// Reject writes to terminal orders and to orders that moved past
/// `expected_version`.
pub(crate) fn ensure_editable(
    order: &DbOrder,
    expected_version: Option<i32>,
) -> RepositoryResult<OrderStatus> {
    let status = order_status(order)?;
    if status.is_terminal() {
        return Err(RepositoryError::ValidationError(format!(
            "order {} is {status} and can no longer change",
            order.id
        )));
    }
    check_version(order, expected_version)?;
    Ok(status)
}

/// Current lines of the order priced from the catalog: base price when the
/// menu item has one, display price otherwise.
pub(crate) fn priced_lines(
    conn: &mut SqliteConnection,
    order_id: i32,
) -> RepositoryResult<Vec<PricedLine>> {
    use crate::schema::{menu_items, order_items};

    let rows = order_items::table
        .inner_join(menu_items::table)
        .filter(order_items::order_id.eq(order_id))
        .select((
            order_items::quantity,
            menu_items::price,
            menu_items::base_price,
            menu_items::tax_rate,
        ))
        .load::<(i32, f64, Option<f64>, f64)>(conn)?;

    rows.into_iter()
        .map(|(quantity, price, base_price, tax_rate)| {
            PricedLine::new(base_price.unwrap_or(price), quantity, tax_rate)
                .map_err(RepositoryError::from)
        })
        .collect()
}

/// Recompute and persist the totals of `order_id` from its current lines.
pub(crate) fn recalculate(
    conn: &mut SqliteConnection,
    order_id: i32,
    now: NaiveDateTime,
) -> RepositoryResult<OrderTotals> {
    use crate::schema::orders;

    let totals = OrderTotals::from_lines(&priced_lines(conn, order_id)?)?;

    let updated = diesel::update(orders::table.find(order_id))
        .set((
            UpdateOrderTotals::new(totals, now),
            orders::version.eq(orders::version + 1),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(RepositoryError::NotFound);
    }

    log::debug!(
        "Order {order_id} totals: subtotal={} tax={} total={}",
        totals.subtotal,
        totals.tax_amount,
        totals.total_amount
    );
    Ok(totals)
}

/// Attach sides to item rows.
pub(crate) fn load_items(
    conn: &mut SqliteConnection,
    rows: Vec<DbOrderItem>,
) -> RepositoryResult<Vec<DomainOrderItem>> {
    use crate::schema::order_item_sides;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let item_ids: Vec<i32> = rows.iter().map(|item| item.id).collect();

    let mut sides_by_item: HashMap<i32, Vec<DbOrderItemSide>> = HashMap::new();
    let sides = order_item_sides::table
        .filter(order_item_sides::order_item_id.eq_any(&item_ids))
        .order(order_item_sides::id.asc())
        .load::<DbOrderItemSide>(conn)?;

    for side in sides {
        sides_by_item
            .entry(side.order_item_id)
            .or_default()
            .push(side);
    }

    Ok(rows
        .into_iter()
        .map(|item| {
            let sides = sides_by_item.remove(&item.id).unwrap_or_default();
            item.into_domain(sides)
        })
        .collect())
}

/// Attach lines and sides to order rows, preserving their order.
pub(crate) fn load_orders(
    conn: &mut SqliteConnection,
    rows: Vec<DbOrder>,
) -> RepositoryResult<Vec<DomainOrder>> {
    use crate::schema::order_items;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = rows.iter().map(|order| order.id).collect();

    let item_rows = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order(order_items::id.asc())
        .load::<DbOrderItem>(conn)?;

    let mut items_by_order: HashMap<i32, Vec<DomainOrderItem>> = HashMap::new();
    for item in load_items(conn, item_rows)? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    rows.into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            order.into_domain(items)
        })
        .collect()
}

pub(crate) fn load_order(
    conn: &mut SqliteConnection,
    order_id: i32,
) -> RepositoryResult<DomainOrder> {
    let row = load_order_row(conn, order_id)?;
    load_orders(conn, vec![row])?
        .pop()
        .ok_or(RepositoryError::NotFound)
}

impl OrderReader for DieselRepository {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<DomainOrder>> {
        let mut conn = self.conn()?;

        match load_order(&mut conn, id) {
            Ok(order) => Ok(Some(order)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<DomainOrder>)> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        let OrderListQuery {
            status,
            table_id,
            active_only,
            pagination,
        } = query;

        let window = match pagination {
            Some(pagination) => match (pagination.offset(), pagination.limit()) {
                (Some(offset), Some(limit)) => Some((offset, limit)),
                _ => {
                    return Err(RepositoryError::ValidationError(format!(
                        "page {} is out of range",
                        pagination.page
                    )));
                }
            },
            None => None,
        };

        let mut count_query = orders::table.into_boxed::<Sqlite>();

        if let Some(status) = status {
            count_query = count_query.filter(orders::status.eq(status.as_str()));
        }

        if let Some(table_id) = table_id {
            count_query = count_query.filter(orders::table_id.eq(table_id));
        }

        if active_only {
            count_query = count_query.filter(orders::status.eq_any(OrderStatus::active_strs()));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = orders::table.into_boxed::<Sqlite>();

        if let Some(status) = status {
            items = items.filter(orders::status.eq(status.as_str()));
        }

        if let Some(table_id) = table_id {
            items = items.filter(orders::table_id.eq(table_id));
        }

        if active_only {
            items = items.filter(orders::status.eq_any(OrderStatus::active_strs()));
        }

        items = items.order((orders::created_at.desc(), orders::id.desc()));

        if let Some((offset, limit)) = window {
            items = items.offset(offset).limit(limit);
        }

        let rows = items.load::<DbOrder>(&mut conn)?;
        let orders = load_orders(&mut conn, rows)?;

        Ok((total, orders))
    }

    fn get_order_item_by_id(&self, id: i32) -> RepositoryResult<Option<DomainOrderItem>> {
        use crate::schema::order_items;

        let mut conn = self.conn()?;
        let Some(row) = order_items::table
            .find(id)
            .first::<DbOrderItem>(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        Ok(load_items(&mut conn, vec![row])?.pop())
    }
}

impl OrderWriter for DieselRepository {
    fn create_order(&self, new_order: &DomainNewOrder) -> RepositoryResult<DomainOrder> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            if new_order.items.is_empty() {
                return Err(RepositoryError::ValidationError(
                    "an order needs at least one item".to_string(),
                ));
            }
            if new_order.diners_count < 1 {
                return Err(RepositoryError::ValidationError(format!(
                    "diners count must be at least 1, got {}",
                    new_order.diners_count
                )));
            }
            if new_order.status.is_terminal() {
                return Err(RepositoryError::ValidationError(format!(
                    "an order cannot be created as {}",
                    new_order.status
                )));
            }

            let table = load_table(conn, new_order.table_id)?;
            if !table.active {
                return Err(RepositoryError::ValidationError(format!(
                    "table {} is inactive",
                    table.number
                )));
            }
            if has_active_order(conn, table.id, None)? {
                return Err(RepositoryError::Conflict(format!(
                    "table {} already has an active order",
                    table.number
                )));
            }

            let created = diesel::insert_into(orders::table)
                .values(&DbNewOrder::from(new_order))
                .get_result::<DbOrder>(conn)?;

            for item in &new_order.items {
                insert_line(conn, created.id, item)?;
            }

            recalculate(conn, created.id, new_order.updated_at)?;
            occupy_table(conn, table.id, new_order.updated_at)?;

            load_order(conn, created.id)
        })
    }

    fn recalculate_order(&self, order_id: i32) -> RepositoryResult<DomainOrder> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let row = load_order_row(conn, order_id)?;
            ensure_editable(&row, None)?;

            recalculate(conn, order_id, chrono::Local::now().naive_utc())?;
            load_order(conn, order_id)
        })
    }

    fn update_order_status(
        &self,
        order_id: i32,
        status: OrderStatus,
        expected_version: Option<i32>,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let row = load_order_row(conn, order_id)?;
            let current = order_status(&row)?;
            check_version(&row, expected_version)?;

            if status == OrderStatus::Paid {
                return Err(RepositoryError::ValidationError(
                    "orders are closed as paid through settlement".to_string(),
                ));
            }
            if !current.can_transition_to(status) {
                return Err(RepositoryError::ValidationError(format!(
                    "order {order_id} cannot move from {current} to {status}"
                )));
            }

            let now = chrono::Local::now().naive_utc();
            diesel::update(orders::table.find(order_id))
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(now),
                    orders::version.eq(orders::version + 1),
                ))
                .execute(conn)?;

            if status.is_terminal() {
                release_table(conn, row.table_id, now)?;
            }

            load_order(conn, order_id)
        })
    }

    fn transfer_order(
        &self,
        order_id: i32,
        table_id: i32,
        confirm_occupied: bool,
        expected_version: Option<i32>,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let row = load_order_row(conn, order_id)?;
            ensure_editable(&row, expected_version)?;

            if row.table_id == table_id {
                return Err(RepositoryError::ValidationError(format!(
                    "order {order_id} is already seated at that table"
                )));
            }

            let destination = load_table(conn, table_id)?;
            if !destination.active {
                return Err(RepositoryError::ValidationError(format!(
                    "table {} is inactive",
                    destination.number
                )));
            }
            if !confirm_occupied && has_active_order(conn, destination.id, Some(order_id))? {
                return Err(RepositoryError::Conflict(format!(
                    "table {} is occupied by another order",
                    destination.number
                )));
            }

            let now = chrono::Local::now().naive_utc();
            diesel::update(orders::table.find(order_id))
                .set((
                    orders::table_id.eq(destination.id),
                    orders::updated_at.eq(now),
                    orders::version.eq(orders::version + 1),
                ))
                .execute(conn)?;

            release_table(conn, row.table_id, now)?;
            occupy_table(conn, destination.id, now)?;

            load_order(conn, order_id)
        })
    }

    fn delete_order(&self, order_id: i32) -> RepositoryResult<()> {
        use crate::schema::{order_item_sides, order_items, orders, payments};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<(), RepositoryError, _>(|conn| {
            let row = load_order_row(conn, order_id)?;
            let status = order_status(&row)?;

            let recorded = payments::table
                .filter(payments::order_id.eq(order_id))
                .count()
                .get_result::<i64>(conn)?;
            if recorded > 0 {
                return Err(RepositoryError::ConstraintViolation(format!(
                    "order {order_id} has {recorded} payment(s) recorded"
                )));
            }

            let item_ids = order_items::table
                .filter(order_items::order_id.eq(order_id))
                .select(order_items::id)
                .load::<i32>(conn)?;

            diesel::delete(
                order_item_sides::table.filter(order_item_sides::order_item_id.eq_any(&item_ids)),
            )
            .execute(conn)?;
            diesel::delete(order_items::table.filter(order_items::order_id.eq(order_id)))
                .execute(conn)?;
            diesel::delete(orders::table.find(order_id)).execute(conn)?;

            if status.is_active() {
                release_table(conn, row.table_id, chrono::Local::now().naive_utc())?;
            }

            Ok(())
        })
    }
}
