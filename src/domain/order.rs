use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Pagination;
use crate::domain::money::{Amount, OrderTotals};

/// Lifecycle states of an order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been opened but not yet sent to the kitchen.
    Pending,
    /// Kitchen is preparing the order.
    Preparing,
    /// Order is ready to be served.
    Ready,
    /// Order has been served to the table.
    Delivered,
    /// Order has been settled. Terminal.
    Paid,
    /// Order has been cancelled. Terminal.
    Cancelled,
}

/// Statuses in which an order keeps its table occupied.
pub const ACTIVE_STATUSES: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Delivered,
];

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Ready
    }
}

impl OrderStatus {
    /// Storage representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is permitted out of this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Whether an order in this status occupies its table.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    fn stage(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Preparing => 1,
            Self::Ready => 2,
            Self::Delivered => 3,
            Self::Paid | Self::Cancelled => 4,
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Service stages only move forward, terminal statuses are reachable from
    /// any active status and nothing leaves a terminal status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next.is_terminal() {
            return true;
        }
        next.stage() > self.stage()
    }

    /// Active statuses as storage strings, for query filters.
    pub fn active_strs() -> [&'static str; 4] {
        ACTIVE_STATUSES.map(OrderStatus::as_str)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name an order status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "delivered" => Ok(Self::Delivered),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

/// Domain representation of a dining session's tab.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    /// Unique identifier of the order.
    pub id: i32,
    /// Table the order is seated at.
    pub table_id: i32,
    /// Staff member owning the order.
    pub owner_id: i32,
    /// Number of diners at the table.
    pub diners_count: i32,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Tax-exclusive subtotal.
    pub subtotal: Amount,
    /// Tax charged on top of the subtotal.
    pub tax_amount: Amount,
    /// `subtotal + tax_amount`.
    pub total_amount: Amount,
    /// Tip recorded at settlement.
    pub tip_amount: Amount,
    /// `total_amount + tip_amount`.
    pub grand_total: Amount,
    /// Amount collected at settlement.
    pub paid_amount: Amount,
    /// Cash handed back at settlement.
    pub change_amount: Amount,
    /// Optional notes supplied by the server.
    pub notes: Option<String>,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i32,
    /// Current line items.
    pub items: Vec<OrderItem>,
    /// Timestamp for when the order record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the order record.
    pub updated_at: NaiveDateTime,
}

impl Order {
    /// Totals currently stored on the order.
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
        }
    }

    /// Find a line item by id.
    pub fn item(&self, item_id: i32) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

/// A menu item line within an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub menu_item_id: i32,
    pub quantity: i32,
    /// Tax-exclusive unit price captured when the line was added.
    pub unit_price: f64,
    /// `unit_price * quantity`, unrounded.
    pub subtotal: f64,
    pub cooking_point_id: Option<i32>,
    pub notes: Option<String>,
    pub sides: Vec<OrderItemSide>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Side dish chosen for an order item.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderItemSide {
    pub id: i32,
    pub order_item_id: i32,
    pub side_id: i32,
    pub quantity: i32,
}

/// Payload required to add a line to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    /// Menu item being ordered.
    pub menu_item_id: i32,
    /// Number of units, strictly positive.
    pub quantity: i32,
    /// Optional cooking point chosen by the diner.
    pub cooking_point_id: Option<i32>,
    /// Optional kitchen notes.
    pub notes: Option<String>,
    /// Side dishes attached to the line.
    pub side_ids: Vec<i32>,
}

impl NewOrderItem {
    /// Build a line payload for `quantity` units of a menu item.
    pub fn new(menu_item_id: i32, quantity: i32) -> Self {
        Self {
            menu_item_id,
            quantity,
            cooking_point_id: None,
            notes: None,
            side_ids: Vec::new(),
        }
    }

    /// Attach a cooking point to the line.
    pub fn with_cooking_point(mut self, cooking_point_id: i32) -> Self {
        self.cooking_point_id = Some(cooking_point_id);
        self
    }

    /// Attach kitchen notes to the line.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach side dishes to the line.
    pub fn with_sides(mut self, side_ids: Vec<i32>) -> Self {
        self.side_ids = side_ids;
        self
    }
}

/// Payload required to open a new order on a table.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Table the order is seated at.
    pub table_id: i32,
    /// Staff member owning the order.
    pub owner_id: i32,
    /// Number of diners at the table.
    pub diners_count: i32,
    /// Optional notes supplied by the server.
    pub notes: Option<String>,
    /// Status the order is created in.
    pub status: OrderStatus,
    /// Initial cart, must not be empty.
    pub items: Vec<NewOrderItem>,
    /// Timestamp captured when the order payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewOrder {
    /// Build a new order payload with the default initial status.
    pub fn new(table_id: i32, owner_id: i32, diners_count: i32) -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            table_id,
            owner_id,
            diners_count,
            notes: None,
            status: OrderStatus::default(),
            items: Vec::new(),
            updated_at: now,
        }
    }

    /// Attach server notes to the order payload.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Override the initial status for the new order.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Append a line to the initial cart.
    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }
}

/// Result of mutating a line item: the refreshed order and the line, if it
/// still exists.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemOutcome {
    pub order: Order,
    pub item: Option<OrderItem>,
}

/// Query definition used to list orders.
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    /// Optional status filter.
    pub status: Option<OrderStatus>,
    /// Optional table filter.
    pub table_id: Option<i32>,
    /// Restrict the results to orders that still occupy their table.
    pub active_only: bool,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl OrderListQuery {
    /// Construct a query that targets every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results by the provided status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter the results by table.
    pub fn table_id(mut self, table_id: i32) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// Only return orders in an active status.
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn backward_and_self_transitions_are_rejected() {
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Ready));
    }

    #[test]
    fn terminal_statuses_are_reachable_from_active_ones() {
        for status in ACTIVE_STATUSES {
            assert!(status.can_transition_to(OrderStatus::Paid));
            assert!(status.can_transition_to(OrderStatus::Cancelled));
        }
    }

    #[test]
    fn nothing_leaves_a_terminal_status() {
        for from in [OrderStatus::Paid, OrderStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in ACTIVE_STATUSES {
                assert!(!from.can_transition_to(to));
            }
            assert!(!from.can_transition_to(OrderStatus::Cancelled));
        }
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("served".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn new_order_defaults_to_ready() {
        let order = NewOrder::new(1, 2, 3).with_item(NewOrderItem::new(4, 1));

        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.items.len(), 1);
    }
}
