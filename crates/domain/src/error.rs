//! Domain error types.

use common::{MenuItemId, OrderId};
use store::StoreError;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors that can occur during catalog, cart and order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The menu item does not exist.
    #[error("Menu item not found: {0}")]
    ItemNotFound(MenuItemId),

    /// The menu item exists but is sold out.
    #[error("Menu item is sold out: {0}")]
    ItemUnavailable(MenuItemId),

    /// The chosen quantity option does not exist on the item.
    #[error("Invalid quantity option {index} for item {item_id} ({available} available)")]
    InvalidQuantityIndex {
        item_id: MenuItemId,
        index: usize,
        available: usize,
    },

    /// The cart position does not exist, e.g. a stale button after a removal.
    #[error("Cart position {index} out of range (cart has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// There is nothing to confirm.
    #[error("Cart is empty")]
    EmptyCart,

    /// The customer has no public handle to correlate the order with.
    #[error("Customer has no public handle")]
    MissingHandle,

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not allowed from the current status.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A catalog entry failed validation.
    #[error("Invalid menu item: {0}")]
    InvalidMenuItem(String),

    /// The durable store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification used to decide how an error reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the user referred to does not exist. Never retried.
    NotFound,
    /// The user must change and resubmit the request.
    InvalidInput,
    /// A business rule refused the request (sold out).
    Unavailable,
    /// Infrastructure failure; the whole action may be retried.
    StoreFailure,
}

impl DomainError {
    /// Returns the error's classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::ItemNotFound(_) | DomainError::OrderNotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidQuantityIndex { .. }
            | DomainError::IndexOutOfRange { .. }
            | DomainError::EmptyCart
            | DomainError::MissingHandle
            | DomainError::InvalidTransition { .. }
            | DomainError::InvalidMenuItem(_) => ErrorKind::InvalidInput,
            DomainError::ItemUnavailable(_) => ErrorKind::Unavailable,
            DomainError::Store(_) => ErrorKind::StoreFailure,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert_eq!(
            DomainError::ItemNotFound(MenuItemId::from("x")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DomainError::IndexOutOfRange { index: 3, len: 1 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            DomainError::ItemUnavailable(MenuItemId::from("x")).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            DomainError::Store(StoreError::Unavailable("down".into())).kind(),
            ErrorKind::StoreFailure
        );
    }
}
