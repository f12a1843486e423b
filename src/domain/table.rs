use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Physical restaurant table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Table {
    /// Unique identifier of the table.
    pub id: i32,
    /// Number displayed to the staff.
    pub number: i32,
    /// Seating capacity.
    pub capacity: i32,
    /// Soft-delete flag; inactive tables cannot receive new orders.
    pub active: bool,
    /// Occupancy flag: `true` when available, `false` when occupied.
    pub status: bool,
    /// Timestamp for when the table record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the table record.
    pub updated_at: NaiveDateTime,
}

impl Table {
    /// Whether the table is currently free.
    pub fn is_available(&self) -> bool {
        self.status
    }
}

/// Payload required to register a table.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTable {
    pub number: i32,
    pub capacity: i32,
}

impl NewTable {
    pub fn new(number: i32, capacity: i32) -> Self {
        Self { number, capacity }
    }
}

/// Query definition used to list tables.
#[derive(Debug, Clone, Default)]
pub struct TableListQuery {
    /// Include soft-deleted tables.
    pub include_inactive: bool,
    /// Only return tables flagged as available.
    pub available_only: bool,
}

impl TableListQuery {
    /// Construct a query that targets active tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include soft-deleted tables in the results.
    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Restrict the results to available tables.
    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }
}

/// Occupancy flag rewritten by a reconciliation pass.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyCorrection {
    pub table_id: i32,
    pub number: i32,
    /// Flag value after the correction.
    pub status: bool,
}
