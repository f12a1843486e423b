use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::table::{NewTable as DomainNewTable, Table as DomainTable};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tables)]
pub struct Table {
    pub id: i32,
    pub number: i32,
    pub capacity: i32,
    pub active: bool,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tables)]
pub struct NewTable {
    pub number: i32,
    pub capacity: i32,
}

impl From<Table> for DomainTable {
    fn from(value: Table) -> Self {
        Self {
            id: value.id,
            number: value.number,
            capacity: value.capacity,
            active: value.active,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<&DomainNewTable> for NewTable {
    fn from(value: &DomainNewTable) -> Self {
        Self {
            number: value.number,
            capacity: value.capacity,
        }
    }
}
