//! Identifier types shared across the chat commerce crates.

mod types;

pub use types::{ChatId, MenuItemId, OrderId};
