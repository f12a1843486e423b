use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::money::OrderTotals;
use crate::domain::order::{
    NewOrder as DomainNewOrder, NewOrderItem as DomainNewOrderItem, Order as DomainOrder,
    OrderItem as DomainOrderItem, OrderItemSide as DomainOrderItemSide, OrderStatus,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i32,
    pub table_id: i32,
    pub owner_id: i32,
    pub diners_count: i32,
    pub status: String,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub tip_amount: i64,
    pub grand_total: i64,
    pub paid_amount: i64,
    pub change_amount: i64,
    pub notes: Option<String>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub cooking_point_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::order_item_sides)]
#[diesel(belongs_to(OrderItem, foreign_key = order_item_id))]
pub struct OrderItemSide {
    pub id: i32,
    pub order_item_id: i32,
    pub side_id: i32,
    pub quantity: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder<'a> {
    pub table_id: i32,
    pub owner_id: i32,
    pub diners_count: i32,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem<'a> {
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub cooking_point_id: Option<i32>,
    pub notes: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_item_sides)]
pub struct NewOrderItemSide {
    pub order_item_id: i32,
    pub side_id: i32,
    pub quantity: i32,
}

/// Totals written back by a recalculation. `grand_total` follows the total
/// until a tip is known.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrderTotals {
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub grand_total: i64,
    pub updated_at: NaiveDateTime,
}

/// Settlement fields written when an order is paid.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::orders)]
pub struct SettleOrder<'a> {
    pub tip_amount: i64,
    pub grand_total: i64,
    pub paid_amount: i64,
    pub change_amount: i64,
    pub status: &'a str,
    pub updated_at: NaiveDateTime,
}

impl Order {
    pub fn into_domain(self, items: Vec<DomainOrderItem>) -> RepositoryResult<DomainOrder> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|err| RepositoryError::InvalidData(err.to_string()))?;

        Ok(DomainOrder {
            id: self.id,
            table_id: self.table_id,
            owner_id: self.owner_id,
            diners_count: self.diners_count,
            status,
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            tip_amount: self.tip_amount,
            grand_total: self.grand_total,
            paid_amount: self.paid_amount,
            change_amount: self.change_amount,
            notes: self.notes,
            version: self.version,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderItem {
    pub fn into_domain(self, sides: Vec<OrderItemSide>) -> DomainOrderItem {
        DomainOrderItem {
            id: self.id,
            order_id: self.order_id,
            menu_item_id: self.menu_item_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: self.subtotal,
            cooking_point_id: self.cooking_point_id,
            notes: self.notes,
            sides: sides.into_iter().map(DomainOrderItemSide::from).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<OrderItemSide> for DomainOrderItemSide {
    fn from(value: OrderItemSide) -> Self {
        Self {
            id: value.id,
            order_item_id: value.order_item_id,
            side_id: value.side_id,
            quantity: value.quantity,
        }
    }
}

impl<'a> From<&'a DomainNewOrder> for NewOrder<'a> {
    fn from(value: &'a DomainNewOrder) -> Self {
        Self {
            table_id: value.table_id,
            owner_id: value.owner_id,
            diners_count: value.diners_count,
            status: value.status.as_str(),
            notes: value.notes.as_deref(),
            updated_at: value.updated_at,
        }
    }
}

impl<'a> NewOrderItem<'a> {
    /// Build the row for `value` priced at `unit_price`.
    pub fn from_domain(order_id: i32, unit_price: f64, value: &'a DomainNewOrderItem) -> Self {
        Self {
            order_id,
            menu_item_id: value.menu_item_id,
            quantity: value.quantity,
            unit_price,
            subtotal: unit_price * f64::from(value.quantity),
            cooking_point_id: value.cooking_point_id,
            notes: value.notes.as_deref(),
        }
    }
}

impl NewOrderItemSide {
    /// One side row per selected side, quantity 1.
    pub fn for_item(order_item_id: i32, side_ids: &[i32]) -> Vec<Self> {
        side_ids
            .iter()
            .map(|&side_id| Self {
                order_item_id,
                side_id,
                quantity: 1,
            })
            .collect()
    }
}

impl UpdateOrderTotals {
    pub fn new(totals: OrderTotals, updated_at: NaiveDateTime) -> Self {
        Self {
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            grand_total: totals.total_amount,
            updated_at,
        }
    }
}
