use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::errors::DomainError;
use crate::domain::order::{page_offset, Menu, MenuId, Order, OrderId, OrderPage};
use crate::domain::ports::{MenuRepository, OrderRepository};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    mutex
        .lock()
        .map_err(|e| DomainError::Internal(format!("in-memory store poisoned: {}", e)))
}

/// Menu catalog kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMenuRepository {
    menus: Mutex<BTreeMap<MenuId, Menu>>,
}

impl InMemoryMenuRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a menu entry.
    pub fn insert(&self, menu: Menu) -> Result<(), DomainError> {
        lock(&self.menus)?.insert(menu.id, menu);
        Ok(())
    }
}

impl MenuRepository for InMemoryMenuRepository {
    fn find_by_id(&self, id: MenuId) -> Result<Option<Menu>, DomainError> {
        Ok(lock(&self.menus)?.get(&id).cloned())
    }
}

#[derive(Debug)]
struct OrderTable {
    next_id: OrderId,
    rows: BTreeMap<OrderId, Order>,
}

/// Order store kept in process memory. Ids are assigned sequentially from 1.
#[derive(Debug)]
pub struct InMemoryOrderRepository {
    table: Mutex<OrderTable>,
    writes: AtomicUsize,
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self {
            table: Mutex::new(OrderTable {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
            writes: AtomicUsize::new(0),
        }
    }
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored orders. A poisoned lock is logged and read through.
    pub fn len(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|poisoned| {
            log::warn!("in-memory order store poisoned; reading last state");
            PoisonError::into_inner(poisoned)
        });
        table.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, mut order: Order) -> Result<Order, DomainError> {
        let mut table = lock(&self.table)?;
        let id = match order.id() {
            Some(id) => {
                if !table.rows.contains_key(&id) {
                    return Err(DomainError::OrderNotFound(id));
                }
                id
            }
            None => {
                let id = table.next_id;
                table.next_id += 1;
                order.assign_id(id);
                id
            }
        };
        table.rows.insert(id, order.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(order)
    }

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(lock(&self.table)?.rows.get(&id).cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError> {
        let table = lock(&self.table)?;
        let total = table.rows.len() as i64;
        let Some(offset) = page_offset(page, limit).and_then(|o| usize::try_from(o).ok()) else {
            return Ok(OrderPage {
                items: Vec::new(),
                total,
            });
        };
        let limit = usize::try_from(limit).unwrap_or(0);

        let mut orders: Vec<&Order> = table.rows.values().collect();
        orders.sort_by(|a, b| {
            b.ordered_at()
                .cmp(&a.ordered_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        Ok(OrderPage {
            items: orders.into_iter().skip(offset).take(limit).cloned().collect(),
            total,
        })
    }

    fn delete(&self, id: OrderId) -> Result<bool, DomainError> {
        Ok(lock(&self.table)?.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::order::OrderStatus;

    fn americano() -> Menu {
        Menu {
            id: 1,
            name: "Americano".to_string(),
            price: 4000,
            available: true,
        }
    }

    fn new_order() -> Order {
        let mut order =
            Order::new("Kim", Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()).unwrap();
        order.add_item(&americano(), 2).unwrap();
        order
    }

    #[test]
    fn save_assigns_sequential_ids() {
        let repo = InMemoryOrderRepository::new();
        let first = repo.save(new_order()).unwrap();
        let second = repo.save(new_order()).unwrap();
        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));
        assert_eq!(repo.write_count(), 2);
    }

    #[test]
    fn save_updates_existing_order_in_place() {
        let repo = InMemoryOrderRepository::new();
        let mut order = repo.save(new_order()).unwrap();
        order.update_status(OrderStatus::Confirmed).unwrap();

        repo.save(order).unwrap();

        let stored = repo.find_by_id(1).unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Confirmed);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn save_of_deleted_order_fails() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.save(new_order()).unwrap();
        assert!(repo.delete(1).unwrap());

        assert_eq!(repo.save(order).unwrap_err(), DomainError::OrderNotFound(1));
        assert!(repo.is_empty());
    }

    #[test]
    fn list_pages_newest_first() {
        let repo = InMemoryOrderRepository::new();
        for _ in 0..5 {
            repo.save(new_order()).unwrap();
        }

        let first = repo.list(1, 3).unwrap();
        assert_eq!(first.total, 5);
        let ids: Vec<Option<OrderId>> = first.items.iter().map(Order::id).collect();
        assert_eq!(ids, [Some(5), Some(4), Some(3)]);

        let second = repo.list(2, 3).unwrap();
        assert_eq!(second.items.len(), 2);
    }

    #[test]
    fn list_far_past_the_end_is_empty() {
        let repo = InMemoryOrderRepository::new();
        repo.save(new_order()).unwrap();

        let page = repo.list(i64::MAX, 100).unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn poisoned_menu_store_reports_an_error() {
        let repo = std::sync::Arc::new(InMemoryMenuRepository::new());
        let holder = repo.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.menus.lock().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();

        assert!(matches!(repo.insert(americano()), Err(DomainError::Internal(_))));
        assert!(matches!(repo.find_by_id(1), Err(DomainError::Internal(_))));
    }

    #[test]
    fn menu_lookup() {
        let repo = InMemoryMenuRepository::new();
        repo.insert(americano()).unwrap();
        assert_eq!(repo.find_by_id(1).unwrap(), Some(americano()));
        assert_eq!(repo.find_by_id(2).unwrap(), None);
    }
}
