use serde::Deserialize;

use crate::change_feed::{ChangeEvent, ChangeFeed, Entity};
use crate::domain::table::{OccupancyCorrection, Table, TableListQuery};
use crate::repository::{TableReader, TableWriter};
use crate::services::{ServiceError, ServiceResult, rejected};

/// Query parameters accepted by the tables listing.
#[derive(Debug, Default, Deserialize)]
pub struct TablesQuery {
    /// Whether soft-deleted tables should be included.
    #[serde(default)]
    pub include_inactive: bool,
    /// Only list tables that are currently free.
    #[serde(default)]
    pub available_only: bool,
}

/// Lists tables ordered by number.
pub fn list_tables<R>(repo: &R, query: TablesQuery) -> ServiceResult<Vec<Table>>
where
    R: TableReader + ?Sized,
{
    let mut list_query = TableListQuery::new();

    if query.include_inactive {
        list_query = list_query.include_inactive();
    }

    if query.available_only {
        list_query = list_query.available_only();
    }

    repo.list_tables(list_query).map_err(ServiceError::from)
}

pub fn get_table<R>(repo: &R, table_id: i32) -> ServiceResult<Table>
where
    R: TableReader + ?Sized,
{
    repo.get_table_by_id(table_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Rewrites the occupancy flag of one table from its active orders.
pub fn sync_table<R>(repo: &R, feed: &ChangeFeed, table_id: i32) -> ServiceResult<Table>
where
    R: TableWriter + ?Sized,
{
    let table = repo
        .sync_occupancy(table_id)
        .map_err(|err| rejected(format_args!("Failed to sync table {table_id}"), err))?;

    feed.publish(ChangeEvent::updated(Entity::Tables, table.id));
    Ok(table)
}

/// Rewrites every occupancy flag that disagrees with the active orders and
/// reports the tables that were corrected.
pub fn reconcile_tables<R>(repo: &R, feed: &ChangeFeed) -> ServiceResult<Vec<OccupancyCorrection>>
where
    R: TableWriter + ?Sized,
{
    let corrections = repo
        .reconcile_occupancy()
        .map_err(|err| rejected("Failed to reconcile table occupancy", err))?;

    if corrections.is_empty() {
        log::info!("Table occupancy is consistent");
    } else {
        log::info!("Corrected occupancy of {} table(s)", corrections.len());
    }

    feed.publish_all(
        corrections
            .iter()
            .map(|correction| ChangeEvent::updated(Entity::Tables, correction.table_id)),
    );

    Ok(corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::{MockTableReader, MockTableWriter};
    use crate::services::fixtures::{drain, sample_table};

    #[test]
    fn list_tables_applies_filters() {
        let mut repo = MockTableReader::new();
        repo.expect_list_tables()
            .withf(|query| query.available_only && !query.include_inactive)
            .returning(|_| Ok(vec![sample_table(1, true)]));

        let tables = list_tables(
            &repo,
            TablesQuery {
                include_inactive: false,
                available_only: true,
            },
        )
        .expect("expected tables");

        assert_eq!(tables.len(), 1);
        assert!(tables[0].is_available());
    }

    #[test]
    fn get_table_reports_missing_table() {
        let mut repo = MockTableReader::new();
        repo.expect_get_table_by_id().returning(|_| Ok(None));

        let result = get_table(&repo, 99);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn sync_table_publishes_table_update() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let mut repo = MockTableWriter::new();
        repo.expect_sync_occupancy()
            .withf(|table_id| *table_id == 3)
            .returning(|id| Ok(sample_table(id, true)));

        let table = sync_table(&repo, &feed, 3).expect("expected sync to succeed");

        assert!(table.status);
        assert_eq!(
            drain(&mut rx),
            vec![ChangeEvent::updated(Entity::Tables, 3)]
        );
    }

    #[test]
    fn reconcile_publishes_one_event_per_correction() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let mut repo = MockTableWriter::new();
        repo.expect_reconcile_occupancy().returning(|| {
            Ok(vec![
                OccupancyCorrection {
                    table_id: 2,
                    number: 20,
                    status: true,
                },
                OccupancyCorrection {
                    table_id: 5,
                    number: 50,
                    status: false,
                },
            ])
        });

        let corrections = reconcile_tables(&repo, &feed).expect("expected reconcile");

        assert_eq!(corrections.len(), 2);
        assert_eq!(
            drain(&mut rx),
            vec![
                ChangeEvent::updated(Entity::Tables, 2),
                ChangeEvent::updated(Entity::Tables, 5),
            ]
        );
    }

    #[test]
    fn reconcile_failure_publishes_nothing() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let mut repo = MockTableWriter::new();
        repo.expect_reconcile_occupancy()
            .returning(|| Err(RepositoryError::InvalidData("bad status".into())));

        let result = reconcile_tables(&repo, &feed);

        assert!(matches!(result, Err(ServiceError::Internal(_))));
        assert!(drain(&mut rx).is_empty());
    }
}
