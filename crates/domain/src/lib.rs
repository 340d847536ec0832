//! Domain layer for the chat commerce bot.
//!
//! This crate provides:
//! - the catalog of menu items and its admin operations
//! - the per-customer cart engine, ending in order confirmation
//! - the admin-driven order lifecycle
//! - the notification boundary used to reach customers and the administrator

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod format;
pub mod lock;
pub mod notify;
pub mod order;
pub mod repositories;
pub mod value_objects;

pub use cart::{Cart, CartItem, CartService};
pub use catalog::{CatalogService, MediaRef, MenuItem, MenuItemUpdate, NewMenuItem, Quantity};
pub use common::{ChatId, MenuItemId, OrderId};
pub use customer::{Customer, CustomerDirectory};
pub use error::{DomainError, ErrorKind, Result};
pub use lock::KeyedLock;
pub use notify::{
    ActionButton, DEFAULT_NOTIFY_TIMEOUT, Notification, NotificationDispatcher, Notifier,
    NotifyError, RecordingNotifier, SentNotification,
};
pub use order::{Order, OrderLifecycleService, OrderStatus, TransitionPolicy};
pub use repositories::Repositories;
pub use value_objects::Money;
