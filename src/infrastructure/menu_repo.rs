use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Menu, MenuId};
use crate::domain::ports::MenuRepository;
use crate::schema::menus;

use super::models::MenuRow;

/// Read-only view over the `menus` table, which is maintained elsewhere.
pub struct DieselMenuRepository {
    pool: DbPool,
}

impl DieselMenuRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<MenuRow> for Menu {
    fn from(row: MenuRow) -> Self {
        Menu {
            id: row.id,
            name: row.name,
            price: row.price,
            available: row.available,
        }
    }
}

impl MenuRepository for DieselMenuRepository {
    fn find_by_id(&self, id: MenuId) -> Result<Option<Menu>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = menus::table
            .filter(menus::id.eq(id))
            .select(MenuRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Menu::from))
    }
}
