//! Admin-driven order status changes.

use common::{ChatId, OrderId};
use serde_json::Value;
use store::{CachedRepository, DocumentStore};

use crate::error::{DomainError, Result};
use crate::format;
use crate::lock::KeyedLock;
use crate::notify::NotificationDispatcher;
use crate::repositories::Repositories;

use super::{Order, OrderStatus, TransitionPolicy};

/// Service for moving orders through their lifecycle.
///
/// Every status change is persisted before the customer is notified, and
/// changes to the same order are serialized.
pub struct OrderLifecycleService<S> {
    orders: CachedRepository<S, Order>,
    dispatcher: NotificationDispatcher,
    policy: TransitionPolicy,
    locks: KeyedLock<OrderId>,
}

impl<S: DocumentStore + Clone> OrderLifecycleService<S> {
    pub fn new(
        repositories: &Repositories<S>,
        dispatcher: NotificationDispatcher,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            orders: repositories.orders.clone(),
            dispatcher,
            policy,
            locks: KeyedLock::new(),
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Sets a new status on an order and tells its customer.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self
            .orders
            .get(order_id.as_str())
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.clone()))?;

        let from = order.status();
        if !self.policy.allows(from, status) {
            return Err(DomainError::InvalidTransition {
                order_id: order_id.clone(),
                from,
                to: status,
            });
        }

        order.set_status(status);
        self.orders.put(&order).await?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(%from, customer = %order.chat_id(), "order status updated");

        self.dispatcher
            .notify_customer(order.chat_id(), format::status_notice(&order, status))
            .await;

        Ok(order)
    }

    pub async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id.as_str()).await?)
    }

    /// All orders placed by a customer, oldest first.
    pub async fn orders_for_customer(&self, chat_id: ChatId) -> Result<Vec<Order>> {
        let mut orders = self
            .orders
            .query("chatId", &Value::from(chat_id.as_i64()))
            .await?;
        orders.sort_by_key(Order::created_at);
        Ok(orders)
    }

    /// Deletes every order.
    #[tracing::instrument(skip(self))]
    pub async fn clear_orders(&self) -> Result<()> {
        self.orders.clear().await?;
        tracing::info!("all orders cleared");
        Ok(())
    }
}
