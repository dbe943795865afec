use std::sync::Arc;

use super::errors::DomainError;
use super::order::{Menu, MenuId, Order, OrderId, OrderPage};

/// Read-only access to the menu catalog.
pub trait MenuRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: MenuId) -> Result<Option<Menu>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order when it has no id yet, assigning one; otherwise
    /// updates the stored order in place.
    fn save(&self, order: Order) -> Result<Order, DomainError>;

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError>;

    /// Like `find_by_id`, but the order and all of its items are read as one
    /// consistent snapshot.
    fn find_by_id_with_items(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        self.find_by_id(id)
    }

    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError>;

    /// Removes the order together with its items. Returns `false` if nothing
    /// was stored under `id`.
    fn delete(&self, id: OrderId) -> Result<bool, DomainError>;
}

impl<T: MenuRepository + ?Sized> MenuRepository for Arc<T> {
    fn find_by_id(&self, id: MenuId) -> Result<Option<Menu>, DomainError> {
        (**self).find_by_id(id)
    }
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn save(&self, order: Order) -> Result<Order, DomainError> {
        (**self).save(order)
    }

    fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }

    fn find_by_id_with_items(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id_with_items(id)
    }

    fn list(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError> {
        (**self).list(page, limit)
    }

    fn delete(&self, id: OrderId) -> Result<bool, DomainError> {
        (**self).delete(id)
    }
}
