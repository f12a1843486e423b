use mockall::mock;

use super::{
    MenuItemReader, MenuItemWriter, OrderItemWriter, OrderReader, OrderWriter, PaymentReader,
    PaymentWriter, TableReader, TableWriter,
};
use crate::domain::{
    menu_item::{MenuItem, NewMenuItem},
    order::{NewOrder, NewOrderItem, Order, OrderItem, OrderItemOutcome, OrderListQuery, OrderStatus},
    payment::{NewPaymentMethod, Payment, PaymentMethod, Settlement},
    table::{NewTable, OccupancyCorrection, Table, TableListQuery},
};
use crate::repository::errors::RepositoryResult;

mock! {
    pub TableReader {}

    impl TableReader for TableReader {
        fn get_table_by_id(&self, id: i32) -> RepositoryResult<Option<Table>>;
        fn list_tables(&self, query: TableListQuery) -> RepositoryResult<Vec<Table>>;
    }
}

mock! {
    pub TableWriter {}

    impl TableWriter for TableWriter {
        fn create_table(&self, new_table: &NewTable) -> RepositoryResult<Table>;
        fn sync_occupancy(&self, table_id: i32) -> RepositoryResult<Table>;
        fn reconcile_occupancy(&self) -> RepositoryResult<Vec<OccupancyCorrection>>;
    }
}

mock! {
    pub MenuItemReader {}

    impl MenuItemReader for MenuItemReader {
        fn get_menu_item_by_id(&self, id: i32) -> RepositoryResult<Option<MenuItem>>;
        fn list_menu_items_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<MenuItem>>;
    }
}

mock! {
    pub MenuItemWriter {}

    impl MenuItemWriter for MenuItemWriter {
        fn create_menu_item(&self, new_item: &NewMenuItem) -> RepositoryResult<MenuItem>;
    }
}

mock! {
    pub OrderReader {}

    impl OrderReader for OrderReader {
        fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
        fn get_order_item_by_id(&self, id: i32) -> RepositoryResult<Option<OrderItem>>;
    }
}

mock! {
    pub OrderWriter {}

    impl OrderWriter for OrderWriter {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
        fn recalculate_order(&self, order_id: i32) -> RepositoryResult<Order>;
        fn update_order_status(&self, order_id: i32, status: OrderStatus, expected_version: Option<i32>) -> RepositoryResult<Order>;
        fn transfer_order(&self, order_id: i32, table_id: i32, confirm_occupied: bool, expected_version: Option<i32>) -> RepositoryResult<Order>;
        fn delete_order(&self, order_id: i32) -> RepositoryResult<()>;
    }
}

mock! {
    pub OrderItemWriter {}

    impl OrderItemWriter for OrderItemWriter {
        fn add_order_item(&self, order_id: i32, item: &NewOrderItem, expected_version: Option<i32>) -> RepositoryResult<OrderItemOutcome>;
        fn update_order_item_quantity(&self, item_id: i32, quantity: i32, expected_version: Option<i32>) -> RepositoryResult<OrderItemOutcome>;
        fn remove_order_item_quantity(&self, item_id: i32, quantity: i32, expected_version: Option<i32>) -> RepositoryResult<OrderItemOutcome>;
        fn replace_order_item_sides(&self, item_id: i32, side_ids: &[i32], expected_version: Option<i32>) -> RepositoryResult<OrderItemOutcome>;
    }
}

mock! {
    pub PaymentReader {}

    impl PaymentReader for PaymentReader {
        fn get_payment_method_by_id(&self, id: i32) -> RepositoryResult<Option<PaymentMethod>>;
        fn list_payments_for_order(&self, order_id: i32) -> RepositoryResult<Vec<Payment>>;
    }
}

mock! {
    pub PaymentWriter {}

    impl PaymentWriter for PaymentWriter {
        fn create_payment_method(&self, new_method: &NewPaymentMethod) -> RepositoryResult<PaymentMethod>;
        fn settle_order(&self, settlement: &Settlement) -> RepositoryResult<(Order, Payment)>;
    }
}
