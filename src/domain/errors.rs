use thiserror::Error;

use super::order::{MenuId, OrderId, OrderStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Menu not found: {0}")]
    MenuNotFound(MenuId),
    #[error("Menu is not available for ordering: {0}")]
    MenuUnavailable(String),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Cannot change order status from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
