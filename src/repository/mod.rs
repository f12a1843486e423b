use crate::db::{DbConnection, DbPool};
use crate::domain::menu_item::{MenuItem, NewMenuItem};
use crate::domain::order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemOutcome, OrderListQuery, OrderStatus,
};
use crate::domain::payment::{NewPaymentMethod, Payment, PaymentMethod, Settlement};
use crate::domain::table::{NewTable, OccupancyCorrection, Table, TableListQuery};
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod table;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
///
/// Every composite write runs inside a single `BEGIN IMMEDIATE` transaction,
/// so an order change, the recalculation of its totals and the occupancy of
/// its table either all land or none do.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over restaurant tables.
pub trait TableReader {
    fn get_table_by_id(&self, id: i32) -> RepositoryResult<Option<Table>>;
    fn list_tables(&self, query: TableListQuery) -> RepositoryResult<Vec<Table>>;
}

/// Write operations over restaurant tables.
pub trait TableWriter {
    fn create_table(&self, new_table: &NewTable) -> RepositoryResult<Table>;
    /// Rewrite the occupancy flag of one table from its active orders.
    fn sync_occupancy(&self, table_id: i32) -> RepositoryResult<Table>;
    /// Rewrite every occupancy flag from the orders that reference the table.
    fn reconcile_occupancy(&self) -> RepositoryResult<Vec<OccupancyCorrection>>;
}

/// Catalog lookups required to price order lines.
pub trait MenuItemReader {
    fn get_menu_item_by_id(&self, id: i32) -> RepositoryResult<Option<MenuItem>>;
    fn list_menu_items_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<MenuItem>>;
}

/// Catalog writes used to seed menu items.
pub trait MenuItemWriter {
    fn create_menu_item(&self, new_item: &NewMenuItem) -> RepositoryResult<MenuItem>;
}

/// Read-only operations over orders and their lines.
pub trait OrderReader {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
    fn get_order_item_by_id(&self, id: i32) -> RepositoryResult<Option<OrderItem>>;
}

/// Order lifecycle writes. Each call is atomic.
pub trait OrderWriter {
    /// Insert the order with its cart, total it and occupy its table.
    fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
    /// Recompute the order's totals from its current lines.
    fn recalculate_order(&self, order_id: i32) -> RepositoryResult<Order>;
    /// Move the order to `status`, releasing the table on terminal statuses.
    fn update_order_status(
        &self,
        order_id: i32,
        status: OrderStatus,
        expected_version: Option<i32>,
    ) -> RepositoryResult<Order>;
    /// Seat the order at another table, moving occupancy along with it.
    fn transfer_order(
        &self,
        order_id: i32,
        table_id: i32,
        confirm_occupied: bool,
        expected_version: Option<i32>,
    ) -> RepositoryResult<Order>;
    /// Delete an unpaid order with its lines and release its table.
    fn delete_order(&self, order_id: i32) -> RepositoryResult<()>;
}

/// Line item writes. Each call recalculates the owning order atomically.
pub trait OrderItemWriter {
    fn add_order_item(
        &self,
        order_id: i32,
        item: &NewOrderItem,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome>;
    fn update_order_item_quantity(
        &self,
        item_id: i32,
        quantity: i32,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome>;
    fn remove_order_item_quantity(
        &self,
        item_id: i32,
        quantity: i32,
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome>;
    fn replace_order_item_sides(
        &self,
        item_id: i32,
        side_ids: &[i32],
        expected_version: Option<i32>,
    ) -> RepositoryResult<OrderItemOutcome>;
}

/// Read-only operations over payments and payment methods.
pub trait PaymentReader {
    fn get_payment_method_by_id(&self, id: i32) -> RepositoryResult<Option<PaymentMethod>>;
    fn list_payments_for_order(&self, order_id: i32) -> RepositoryResult<Vec<Payment>>;
}

/// Payment writes.
pub trait PaymentWriter {
    fn create_payment_method(&self, new_method: &NewPaymentMethod)
    -> RepositoryResult<PaymentMethod>;
    /// Record the payment, close the order and release its table.
    fn settle_order(&self, settlement: &Settlement) -> RepositoryResult<(Order, Payment)>;
}
