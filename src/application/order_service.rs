use std::sync::Arc;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::errors::DomainError;
use crate::domain::order::{MenuId, Order, OrderId, OrderPage, OrderStatus};
use crate::domain::ports::{MenuRepository, OrderRepository};

pub const MAX_PAGE_SIZE: i64 = 100;

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderItemInput {
    pub menu_id: MenuId,
    pub quantity: i32,
}

/// Service wired with trait objects, as used by the HTTP layer.
pub type DynOrderService =
    OrderService<Arc<dyn MenuRepository>, Arc<dyn OrderRepository>, Arc<dyn Clock>>;

pub struct OrderService<M, R, C = SystemClock> {
    menus: M,
    orders: R,
    clock: C,
}

impl<M: MenuRepository, R: OrderRepository> OrderService<M, R> {
    pub fn new(menus: M, orders: R) -> Self {
        Self::with_clock(menus, orders, SystemClock)
    }
}

impl<M: MenuRepository, R: OrderRepository, C: Clock> OrderService<M, R, C> {
    pub fn with_clock(menus: M, orders: R, clock: C) -> Self {
        Self {
            menus,
            orders,
            clock,
        }
    }

    /// Builds a pending order from `items` and stores it.
    ///
    /// Items are resolved in the order given and the first missing or
    /// unavailable menu aborts the whole request. The store is written exactly
    /// once, and only when every item was accepted.
    pub fn create_order(
        &self,
        customer_name: &str,
        items: &[OrderItemInput],
    ) -> Result<Order, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }

        let mut order = Order::new(customer_name, self.clock.now())?;
        for item in items {
            let menu = self
                .menus
                .find_by_id(item.menu_id)?
                .ok_or(DomainError::MenuNotFound(item.menu_id))?;
            if !menu.available {
                log::info!(
                    "rejecting order of {} item(s): menu {} unavailable",
                    items.len(),
                    menu.id
                );
                return Err(DomainError::MenuUnavailable(menu.name));
            }
            order.add_item(&menu, item.quantity)?;
        }

        let saved = self.orders.save(order)?;
        log::info!(
            "order {:?} created ({} items, total {})",
            saved.id(),
            saved.items().len(),
            saved.total_price()
        );
        Ok(saved)
    }

    pub fn change_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self
            .orders
            .find_by_id(id)?
            .ok_or(DomainError::OrderNotFound(id))?;

        let previous = order.status();
        order.update_status(status)?;

        let saved = self.orders.save(order)?;
        log::info!("order {} moved from {} to {}", id, previous, saved.status());
        Ok(saved)
    }

    pub fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.orders
            .find_by_id_with_items(id)?
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Newest orders first. `page` is 1-based; `limit` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn list_orders(&self, page: i64, limit: i64) -> Result<OrderPage, DomainError> {
        self.orders.list(page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        if !self.orders.delete(id)? {
            return Err(DomainError::OrderNotFound(id));
        }
        log::info!("order {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::order::Menu;
    use crate::infrastructure::memory::{InMemoryMenuRepository, InMemoryOrderRepository};

    type TestService =
        OrderService<Arc<InMemoryMenuRepository>, Arc<InMemoryOrderRepository>, FixedClock>;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn menu(id: MenuId, name: &str, price: i64, available: bool) -> Menu {
        Menu {
            id,
            name: name.to_string(),
            price,
            available,
        }
    }

    fn setup() -> (TestService, Arc<InMemoryMenuRepository>, Arc<InMemoryOrderRepository>) {
        let menus = Arc::new(InMemoryMenuRepository::new());
        menus.insert(menu(1, "Americano", 4000, true)).unwrap();
        menus.insert(menu(2, "Latte", 4500, true)).unwrap();
        menus.insert(menu(3, "Seasonal Ade", 5500, false)).unwrap();
        let orders = Arc::new(InMemoryOrderRepository::new());
        let service = OrderService::with_clock(menus.clone(), orders.clone(), FixedClock(at()));
        (service, menus, orders)
    }

    fn item(menu_id: MenuId, quantity: i32) -> OrderItemInput {
        OrderItemInput { menu_id, quantity }
    }

    #[test]
    fn create_single_item_order() {
        let (service, _, orders) = setup();

        let order = service.create_order("Kim", &[item(1, 2)]).unwrap();

        assert!(order.id().is_some());
        assert_eq!(order.customer_name(), "Kim");
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.total_price(), 8000);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.ordered_at(), at());
        assert_eq!(orders.write_count(), 1);
    }

    #[test]
    fn create_multi_item_order_sums_lines() {
        let (service, _, _) = setup();

        let order = service
            .create_order("Kim", &[item(1, 2), item(2, 1)])
            .unwrap();

        assert_eq!(order.total_price(), 12500);
        let menu_ids: Vec<MenuId> = order.items().iter().map(|i| i.menu_id()).collect();
        assert_eq!(menu_ids, [1, 2]);
    }

    #[test]
    fn missing_menu_aborts_without_writing() {
        let (service, _, orders) = setup();

        let err = service
            .create_order("Kim", &[item(1, 2), item(999, 1)])
            .unwrap_err();

        assert_eq!(err, DomainError::MenuNotFound(999));
        assert_eq!(orders.write_count(), 0);
        assert_eq!(orders.len(), 0);
    }

    #[test]
    fn unavailable_menu_aborts_without_writing() {
        let (service, _, orders) = setup();

        let err = service
            .create_order("Kim", &[item(1, 1), item(3, 1)])
            .unwrap_err();

        assert_eq!(err, DomainError::MenuUnavailable("Seasonal Ade".to_string()));
        assert_eq!(orders.write_count(), 0);
    }

    #[test]
    fn first_invalid_item_wins() {
        let (service, _, _) = setup();

        let err = service
            .create_order("Kim", &[item(3, 1), item(999, 1)])
            .unwrap_err();

        assert!(matches!(err, DomainError::MenuUnavailable(_)));
    }

    #[test]
    fn create_rejects_invalid_input() {
        let (service, _, orders) = setup();

        assert!(matches!(
            service.create_order("Kim", &[]),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.create_order(" ", &[item(1, 1)]),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.create_order(&"k".repeat(101), &[item(1, 1)]),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.create_order("Kim", &[item(1, 0)]),
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(orders.write_count(), 0);
    }

    #[test]
    fn retrieved_order_keeps_snapshot_after_menu_change() {
        let (service, menus, _) = setup();
        let created = service
            .create_order("Kim", &[item(1, 2), item(2, 1)])
            .unwrap();
        let id = created.id().unwrap();

        menus.insert(menu(1, "Americano", 9900, true)).unwrap();

        let loaded = service.get_order(id).unwrap();
        assert_eq!(loaded.items().len(), 2);
        assert_eq!(loaded.items()[0].menu_name(), "Americano");
        assert_eq!(loaded.items()[0].menu_price(), 4000);
        assert_eq!(loaded.items()[1].menu_name(), "Latte");
        assert_eq!(loaded.items()[1].menu_price(), 4500);
        assert_eq!(loaded.total_price(), created.total_price());
    }

    #[test]
    fn get_unknown_order_fails() {
        let (service, _, _) = setup();
        assert_eq!(service.get_order(42).unwrap_err(), DomainError::OrderNotFound(42));
    }

    #[test]
    fn status_walks_through_lifecycle() {
        let (service, _, orders) = setup();
        let id = service.create_order("Kim", &[item(1, 1)]).unwrap().id().unwrap();

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Completed,
        ] {
            let order = service.change_order_status(id, status).unwrap();
            assert_eq!(order.status(), status);
        }
        assert_eq!(orders.write_count(), 4);

        let err = service
            .change_order_status(id, OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));
        assert_eq!(orders.write_count(), 4);
    }

    #[test]
    fn illegal_transition_leaves_stored_order_untouched() {
        let (service, _, orders) = setup();
        let id = service.create_order("Kim", &[item(1, 1)]).unwrap().id().unwrap();

        let err = service
            .change_order_status(id, OrderStatus::Completed)
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::IllegalTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed,
            }
        );
        assert_eq!(service.get_order(id).unwrap().status(), OrderStatus::Pending);
        assert_eq!(orders.write_count(), 1);
    }

    #[test]
    fn change_status_of_unknown_order_fails() {
        let (service, _, orders) = setup();
        assert_eq!(
            service
                .change_order_status(7, OrderStatus::Confirmed)
                .unwrap_err(),
            DomainError::OrderNotFound(7)
        );
        assert_eq!(orders.write_count(), 0);
    }

    #[test]
    fn list_clamps_paging() {
        let (service, _, _) = setup();
        for _ in 0..3 {
            service.create_order("Kim", &[item(1, 1)]).unwrap();
        }

        let page = service.list_orders(0, 0).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);

        let page = service.list_orders(1, 1000).unwrap();
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn delete_removes_order() {
        let (service, _, orders) = setup();
        let id = service.create_order("Kim", &[item(1, 1)]).unwrap().id().unwrap();

        service.delete_order(id).unwrap();

        assert_eq!(orders.len(), 0);
        assert_eq!(service.delete_order(id).unwrap_err(), DomainError::OrderNotFound(id));
    }
}
