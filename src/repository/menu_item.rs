use diesel::prelude::*;

use crate::domain::menu_item::{MenuItem as DomainMenuItem, NewMenuItem as DomainNewMenuItem};
use crate::models::menu_item::{MenuItem as DbMenuItem, NewMenuItem as DbNewMenuItem};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, MenuItemReader, MenuItemWriter};

impl MenuItemReader for DieselRepository {
    fn get_menu_item_by_id(&self, id: i32) -> RepositoryResult<Option<DomainMenuItem>> {
        use crate::schema::menu_items;

        let mut conn = self.conn()?;
        let item = menu_items::table
            .find(id)
            .first::<DbMenuItem>(&mut conn)
            .optional()?;

        Ok(item.map(DomainMenuItem::from))
    }

    fn list_menu_items_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<DomainMenuItem>> {
        use crate::schema::menu_items;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        let items = menu_items::table
            .filter(menu_items::id.eq_any(ids))
            .order(menu_items::id.asc())
            .load::<DbMenuItem>(&mut conn)?;

        Ok(items.into_iter().map(DomainMenuItem::from).collect())
    }
}

impl MenuItemWriter for DieselRepository {
    fn create_menu_item(&self, new_item: &DomainNewMenuItem) -> RepositoryResult<DomainMenuItem> {
        use crate::schema::menu_items;

        let mut conn = self.conn()?;
        let created = diesel::insert_into(menu_items::table)
            .values(&DbNewMenuItem::from(new_item))
            .get_result::<DbMenuItem>(&mut conn)?;

        Ok(created.into())
    }
}
