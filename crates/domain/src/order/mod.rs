//! Submitted orders and their admin-driven lifecycle.
//!
//! An order is created once, by cart confirmation, and afterwards only its
//! status and `updatedAt` change.

mod service;
mod state;

pub use service::OrderLifecycleService;
pub use state::{OrderStatus, TransitionPolicy};

use chrono::{DateTime, Utc};
use common::{ChatId, OrderId};
use serde::{Deserialize, Serialize};
use store::{Collection, Document};

use crate::cart::{CartItem, total_of};
use crate::value_objects::Money;

/// An immutable order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    customer_name: String,
    customer_username: String,
    chat_id: ChatId,
    items: Vec<CartItem>,
    status: OrderStatus,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new pending order from cart lines.
    pub(crate) fn place(
        chat_id: ChatId,
        customer_name: impl Into<String>,
        customer_username: impl Into<String>,
        items: Vec<CartItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            customer_name: customer_name.into(),
            customer_username: customer_username.into(),
            chat_id,
            total_amount: total_of(&items),
            items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Gives a not-yet-stored order a fresh id.
    pub(crate) fn reissue_id(&mut self) {
        self.id = OrderId::generate();
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_username(&self) -> &str {
        &self.customer_username
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Total fixed at creation time.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}
