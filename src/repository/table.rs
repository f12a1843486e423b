use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::order::OrderStatus;
use crate::domain::table::{
    NewTable as DomainNewTable, OccupancyCorrection, Table as DomainTable, TableListQuery,
};
use crate::models::table::{NewTable as DbNewTable, Table as DbTable};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TableReader, TableWriter};

/// Whether an order in an active status references `table_id`, ignoring
/// `excluding` when given.
pub(crate) fn has_active_order(
    conn: &mut SqliteConnection,
    table_id: i32,
    excluding: Option<i32>,
) -> RepositoryResult<bool> {
    use crate::schema::orders;

    let mut query = orders::table
        .filter(orders::table_id.eq(table_id))
        .filter(orders::status.eq_any(OrderStatus::active_strs()))
        .into_boxed::<Sqlite>();

    if let Some(order_id) = excluding {
        query = query.filter(orders::id.ne(order_id));
    }

    let active = query.count().get_result::<i64>(conn)?;
    Ok(active > 0)
}

pub(crate) fn load_table(conn: &mut SqliteConnection, table_id: i32) -> RepositoryResult<DbTable> {
    use crate::schema::tables;

    tables::table
        .find(table_id)
        .first::<DbTable>(conn)
        .map_err(RepositoryError::from)
}

fn write_status(
    conn: &mut SqliteConnection,
    table_id: i32,
    status: bool,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    use crate::schema::tables;

    let updated = diesel::update(tables::table.find(table_id))
        .set((tables::status.eq(status), tables::updated_at.eq(now)))
        .execute(conn)?;

    if updated == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Mark the table occupied.
pub(crate) fn occupy_table(
    conn: &mut SqliteConnection,
    table_id: i32,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    write_status(conn, table_id, false, now)
}

/// Mark the table available unless another active order still sits there.
/// Returns whether the table ended up available.
pub(crate) fn release_table(
    conn: &mut SqliteConnection,
    table_id: i32,
    now: NaiveDateTime,
) -> RepositoryResult<bool> {
    if has_active_order(conn, table_id, None)? {
        log::warn!("Table {table_id} kept occupied: another active order references it");
        return Ok(false);
    }
    write_status(conn, table_id, true, now)?;
    Ok(true)
}

/// Rewrite the occupancy flag of `table` from its active orders. Returns the
/// correction when the stored flag was wrong.
fn sync_table(
    conn: &mut SqliteConnection,
    table: &DbTable,
    now: NaiveDateTime,
) -> RepositoryResult<Option<OccupancyCorrection>> {
    let available = !has_active_order(conn, table.id, None)?;
    if available == table.status {
        return Ok(None);
    }

    write_status(conn, table.id, available, now)?;
    log::warn!(
        "Table {} occupancy corrected to {}",
        table.number,
        if available { "available" } else { "occupied" }
    );
    Ok(Some(OccupancyCorrection {
        table_id: table.id,
        number: table.number,
        status: available,
    }))
}

impl TableReader for DieselRepository {
    fn get_table_by_id(&self, id: i32) -> RepositoryResult<Option<DomainTable>> {
        use crate::schema::tables;

        let mut conn = self.conn()?;
        let table = tables::table
            .find(id)
            .first::<DbTable>(&mut conn)
            .optional()?;

        Ok(table.map(DomainTable::from))
    }

    fn list_tables(&self, query: TableListQuery) -> RepositoryResult<Vec<DomainTable>> {
        use crate::schema::tables;

        let mut conn = self.conn()?;

        let mut items = tables::table.into_boxed::<Sqlite>();

        if !query.include_inactive {
            items = items.filter(tables::active.eq(true));
        }

        if query.available_only {
            items = items.filter(tables::status.eq(true));
        }

        let rows = items
            .order(tables::number.asc())
            .load::<DbTable>(&mut conn)?;

        Ok(rows.into_iter().map(DomainTable::from).collect())
    }
}

impl TableWriter for DieselRepository {
    fn create_table(&self, new_table: &DomainNewTable) -> RepositoryResult<DomainTable> {
        use crate::schema::tables;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(tables::table)
            .values(&DbNewTable::from(new_table))
            .get_result::<DbTable>(&mut conn)?;

        Ok(created.into())
    }

    fn sync_occupancy(&self, table_id: i32) -> RepositoryResult<DomainTable> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let table = load_table(conn, table_id)?;
            sync_table(conn, &table, chrono::Local::now().naive_utc())?;
            Ok(load_table(conn, table_id)?.into())
        })
    }

    fn reconcile_occupancy(&self) -> RepositoryResult<Vec<OccupancyCorrection>> {
        use crate::schema::tables;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let now = chrono::Local::now().naive_utc();
            let rows = tables::table
                .order(tables::id.asc())
                .load::<DbTable>(conn)?;

            let mut corrections = Vec::new();
            for table in &rows {
                if let Some(correction) = sync_table(conn, table, now)? {
                    corrections.push(correction);
                }
            }

            Ok(corrections)
        })
    }
}
