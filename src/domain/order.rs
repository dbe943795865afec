use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::errors::DomainError;

pub type OrderId = i64;
pub type MenuId = i64;

/// Longest customer name the `orders` table can hold, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// Lifecycle of an order. Only forward moves to the immediate successor are
/// legal; `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order status '{}'", s)))
    }
}

/// A menu entry as seen by the ordering workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub id: MenuId,
    pub name: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub available: bool,
}

/// One line of an order. Name and price are copied from the menu when the
/// line is created and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    menu_id: MenuId,
    menu_name: String,
    menu_price: i64,
    quantity: i32,
}

impl OrderItem {
    pub fn new(
        menu_id: MenuId,
        menu_name: impl Into<String>,
        menu_price: i64,
        quantity: i32,
    ) -> Result<Self, DomainError> {
        if quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }
        if menu_price < 0 {
            return Err(DomainError::InvalidInput(format!(
                "menu price must not be negative, got {}",
                menu_price
            )));
        }
        Ok(Self {
            menu_id,
            menu_name: menu_name.into(),
            menu_price,
            quantity,
        })
    }

    pub fn menu_id(&self) -> MenuId {
        self.menu_id
    }

    pub fn menu_name(&self) -> &str {
        &self.menu_name
    }

    pub fn menu_price(&self) -> i64 {
        self.menu_price
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn subtotal(&self) -> i64 {
        self.menu_price * i64::from(self.quantity)
    }
}

/// Order aggregate root.
///
/// `total_price` is derived from the items and recomputed whenever they change;
/// there is no way to set it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: Option<OrderId>,
    customer_name: String,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total_price: i64,
    ordered_at: DateTime<Utc>,
}

impl Order {
    /// Starts a new, unsaved order in `Pending` with no items.
    ///
    /// The name is stored as given; it only has to contain something other
    /// than whitespace and be at most `MAX_CUSTOMER_NAME_LEN` characters.
    pub fn new(customer_name: &str, ordered_at: DateTime<Utc>) -> Result<Self, DomainError> {
        if customer_name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "customer name must not be empty".to_string(),
            ));
        }
        if customer_name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(DomainError::InvalidInput(format!(
                "customer name must be at most {} characters",
                MAX_CUSTOMER_NAME_LEN
            )));
        }
        Ok(Self {
            id: None,
            customer_name: customer_name.to_string(),
            status: OrderStatus::Pending,
            items: Vec::new(),
            total_price: 0,
            ordered_at,
        })
    }

    /// Rebuilds a stored order. Used by repositories only.
    pub(crate) fn restore(
        id: OrderId,
        customer_name: String,
        status: OrderStatus,
        items: Vec<OrderItem>,
        ordered_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id: Some(id),
            customer_name,
            status,
            items,
            total_price: 0,
            ordered_at,
        };
        order.recalculate_total();
        order
    }

    pub(crate) fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }

    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    /// Appends a line for `menu`, snapshotting its current name and price.
    pub fn add_item(&mut self, menu: &Menu, quantity: i32) -> Result<(), DomainError> {
        let item = OrderItem::new(menu.id, menu.name.clone(), menu.price, quantity)?;
        self.items.push(item);
        self.recalculate_total();
        Ok(())
    }

    /// Moves the order to `next` if the current status allows it. On failure
    /// the order is left untouched.
    pub fn update_status(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn recalculate_total(&mut self) {
        self.total_price = self.items.iter().map(OrderItem::subtotal).sum();
    }
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: i64,
}

/// Row offset of a 1-based `page`, or `None` when it does not fit in an `i64`.
pub fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.max(1).saturating_sub(1).checked_mul(limit)
}
