//! The cart engine.

use common::{ChatId, MenuItemId};
use store::{CachedRepository, DocumentStore, StoreError};

use crate::catalog::MenuItem;
use crate::error::{DomainError, Result};
use crate::format;
use crate::lock::KeyedLock;
use crate::notify::NotificationDispatcher;
use crate::order::{Order, TransitionPolicy};
use crate::repositories::Repositories;

use super::Cart;

/// Ids tried for one order before the conflict is reported.
const ORDER_ID_ATTEMPTS: usize = 3;

/// Service driving each customer's cart from first add to confirmation.
///
/// Every read-modify-write of a cart runs under that customer's lock, so
/// concurrent actions from one customer never lose an update.
pub struct CartService<S> {
    menu_items: CachedRepository<S, MenuItem>,
    carts: CachedRepository<S, Cart>,
    orders: CachedRepository<S, Order>,
    dispatcher: NotificationDispatcher,
    policy: TransitionPolicy,
    locks: KeyedLock<ChatId>,
}

impl<S: DocumentStore + Clone> CartService<S> {
    /// Creates a cart service.
    ///
    /// `policy` decides which status buttons the administrator is offered
    /// on a new order.
    pub fn new(
        repositories: &Repositories<S>,
        dispatcher: NotificationDispatcher,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            menu_items: repositories.menu_items.clone(),
            carts: repositories.carts.clone(),
            orders: repositories.orders.clone(),
            dispatcher,
            policy,
            locks: KeyedLock::new(),
        }
    }

    /// Discards any cart the customer has.
    #[tracing::instrument(skip(self))]
    pub async fn start_session(&self, chat_id: ChatId) -> Result<()> {
        let _guard = self.locks.acquire(&chat_id).await;
        self.carts.delete(&chat_id.to_string()).await?;
        record("start_session");
        Ok(())
    }

    /// Looks up an item the customer wants to buy. Nothing is changed.
    #[tracing::instrument(skip(self))]
    pub async fn select_item(&self, chat_id: ChatId, item_id: &MenuItemId) -> Result<MenuItem> {
        self.available_item(item_id).await
    }

    /// Adds one unit of a quantity option to the customer's cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        chat_id: ChatId,
        item_id: &MenuItemId,
        quantity_index: usize,
    ) -> Result<Cart> {
        let _guard = self.locks.acquire(&chat_id).await;

        // The item may have changed since it was shown, so check it again.
        let item = self.available_item(item_id).await?;
        let quantity = item.quantity(quantity_index)?.clone();

        let mut cart = self
            .carts
            .get(&chat_id.to_string())
            .await?
            .unwrap_or_else(|| Cart::new(chat_id));
        cart.add(item, quantity);
        self.carts.put(&cart).await?;

        record("add");
        tracing::debug!(lines = cart.len(), total = %cart.total(), "item added to cart");
        Ok(cart)
    }

    pub async fn view_cart(&self, chat_id: ChatId) -> Result<Option<Cart>> {
        Ok(self.carts.get(&chat_id.to_string()).await?)
    }

    /// Removes the line at `index`. Returns the remaining cart, or `None`
    /// if it became empty and was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&self, chat_id: ChatId, index: usize) -> Result<Option<Cart>> {
        let _guard = self.locks.acquire(&chat_id).await;

        let Some(mut cart) = self.carts.get(&chat_id.to_string()).await? else {
            return Err(DomainError::IndexOutOfRange { index, len: 0 });
        };
        cart.remove(index)?;

        record("remove");
        if cart.is_empty() {
            self.carts.delete(&chat_id.to_string()).await?;
            return Ok(None);
        }
        self.carts.put(&cart).await?;
        Ok(Some(cart))
    }

    /// Deletes the customer's cart, if any.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, chat_id: ChatId) -> Result<()> {
        let _guard = self.locks.acquire(&chat_id).await;
        self.carts.delete(&chat_id.to_string()).await?;
        record("clear");
        Ok(())
    }

    /// Turns the cart into a pending order.
    ///
    /// The order is persisted before the cart is deleted. If deleting the
    /// cart fails the order still stands. The customer and the administrator
    /// are then notified in the background.
    #[tracing::instrument(skip(self, customer_name))]
    pub async fn confirm_order(
        &self,
        chat_id: ChatId,
        customer_name: &str,
        handle: Option<&str>,
    ) -> Result<Order> {
        let _guard = self.locks.acquire(&chat_id).await;

        let cart = match self.carts.get(&chat_id.to_string()).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(DomainError::EmptyCart),
        };
        let handle = match handle.map(str::trim) {
            Some(handle) if !handle.is_empty() => handle,
            _ => return Err(DomainError::MissingHandle),
        };

        let mut order = Order::place(chat_id, customer_name, handle, cart.into_items());
        let mut attempt = 1;
        loop {
            match self.orders.insert(&order).await {
                Ok(()) => break,
                Err(StoreError::Conflict { .. }) if attempt < ORDER_ID_ATTEMPTS => {
                    tracing::warn!(order_id = %order.id(), "order id taken, generating another");
                    order.reissue_id();
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Err(e) = self.carts.delete(&chat_id.to_string()).await {
            tracing::warn!(order_id = %order.id(), error = %e, "order saved but cart was not cleared");
        }

        record("confirm");
        metrics::counter!("orders_confirmed_total").increment(1);
        metrics::histogram!("order_total_amount").record(order.total_amount().units() as f64);
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), "order confirmed");

        self.dispatcher
            .notify_customer(chat_id, format::order_acknowledgment(&order))
            .await;
        self.dispatcher
            .notify_admin(format::admin_alert(&order, self.policy))
            .await;

        Ok(order)
    }

    async fn available_item(&self, item_id: &MenuItemId) -> Result<MenuItem> {
        let item = self
            .menu_items
            .get(item_id.as_str())
            .await?
            .ok_or_else(|| DomainError::ItemNotFound(item_id.clone()))?;
        if !item.is_available {
            return Err(DomainError::ItemUnavailable(item_id.clone()));
        }
        Ok(item)
    }
}

fn record(operation: &'static str) {
    metrics::counter!("cart_operations_total", "operation" => operation).increment(1);
}
