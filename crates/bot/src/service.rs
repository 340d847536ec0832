//! Routes action events to the engines and turns outcomes into replies.

use std::time::Duration;

use common::ChatId;
use domain::format;
use domain::{
    ActionButton, CartService, CatalogService, CustomerDirectory, DomainError, ErrorKind,
    MenuItem, Notification, NotificationDispatcher, OrderLifecycleService, Repositories,
    TransitionPolicy,
};
use store::DocumentStore;

use crate::action::{Action, ActionEvent, Actor};
use crate::rate_limit::{DEFAULT_ACTIONS_PER_WINDOW, DEFAULT_WINDOW, RateLimiter};

/// A direct response to the actor.
pub type Reply = Notification;

pub const SLOW_DOWN: &str = "⚠️ Please slow down. Try again in a minute.";
pub const ADMIN_ONLY: &str = "⛔️ Sorry, this command is only available to administrators.";
pub const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again.";

/// Router settings.
#[derive(Debug, Clone, Copy)]
pub struct BotSettings {
    pub policy: TransitionPolicy,
    pub actions_per_window: u32,
    pub window: Duration,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            policy: TransitionPolicy::Strict,
            actions_per_window: DEFAULT_ACTIONS_PER_WINDOW,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Entry point for every inbound action.
///
/// Applies the rate limit and the admin check, runs the action, and maps
/// domain errors to user-visible replies.
pub struct BotService<S> {
    catalog: CatalogService<S>,
    carts: CartService<S>,
    orders: OrderLifecycleService<S>,
    customers: CustomerDirectory<S>,
    dispatcher: NotificationDispatcher,
    limiter: RateLimiter,
    policy: TransitionPolicy,
}

impl<S: DocumentStore + Clone> BotService<S> {
    pub fn new(
        repositories: &Repositories<S>,
        dispatcher: NotificationDispatcher,
        settings: BotSettings,
    ) -> Self {
        Self {
            catalog: CatalogService::new(repositories),
            carts: CartService::new(repositories, dispatcher.clone(), settings.policy),
            orders: OrderLifecycleService::new(repositories, dispatcher.clone(), settings.policy),
            customers: CustomerDirectory::new(repositories),
            limiter: RateLimiter::new(settings.actions_per_window, settings.window),
            policy: settings.policy,
            dispatcher,
        }
    }

    pub fn catalog(&self) -> &CatalogService<S> {
        &self.catalog
    }

    pub fn carts(&self) -> &CartService<S> {
        &self.carts
    }

    pub fn orders(&self) -> &OrderLifecycleService<S> {
        &self.orders
    }

    pub fn customers(&self) -> &CustomerDirectory<S> {
        &self.customers
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn is_admin(&self, actor: ChatId) -> bool {
        actor == self.dispatcher.admin_chat()
    }

    /// Handles one action event.
    ///
    /// Returns `None` when the actor has already been answered through the
    /// dispatcher, as with order confirmation.
    #[tracing::instrument(skip(self, event), fields(actor = %event.actor.id, action = event.action.name()))]
    pub async fn handle(&self, event: ActionEvent) -> Option<Reply> {
        let ActionEvent { actor, action } = event;

        if !self.limiter.check(actor.id).await {
            metrics::counter!("bot_rate_limited_total").increment(1);
            tracing::debug!("action rate limited");
            return Some(Reply::text(SLOW_DOWN));
        }

        let action = match action {
            Action::Callback { data } => match Action::from_callback(&data) {
                Ok(action) => action,
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring malformed callback");
                    return Some(Reply::text("❌ Invalid selection"));
                }
            },
            action => action,
        };

        if action.requires_admin() && !self.is_admin(actor.id) {
            tracing::warn!("admin action refused");
            return Some(Reply::text(ADMIN_ONLY));
        }

        metrics::counter!("bot_actions_total", "action" => action.name()).increment(1);
        match self.run(&actor, action).await {
            Ok(reply) => reply,
            Err(e) => Some(error_reply(&e)),
        }
    }

    async fn run(&self, actor: &Actor, action: Action) -> domain::Result<Option<Reply>> {
        let reply = match action {
            Action::Start => {
                self.carts.start_session(actor.id).await?;
                if let Err(e) = self.customers.remember(actor.to_customer()).await {
                    tracing::warn!(error = %e, "failed to record customer profile");
                }
                welcome()
            }
            Action::ViewMenu => self.menu(actor.id).await?,
            Action::SelectItem { item_id } => {
                let item = self.carts.select_item(actor.id, &item_id).await?;
                format::quantity_picker(&item)
            }
            Action::AddToCart {
                item_id,
                quantity_index,
            } => {
                let cart = self
                    .carts
                    .add_to_cart(actor.id, &item_id, quantity_index)
                    .await?;
                prefixed("✅ Added to cart!", format::cart(&cart))
            }
            Action::ViewCart => match self.carts.view_cart(actor.id).await? {
                Some(cart) => format::cart(&cart),
                None => empty_cart(),
            },
            Action::Remove { index } => match self.carts.remove_from_cart(actor.id, index).await? {
                Some(cart) => prefixed("✅ Item removed from cart", format::cart(&cart)),
                None => Reply::text("✅ Item removed. Your cart is now empty."),
            },
            Action::Clear => {
                self.carts.clear_cart(actor.id).await?;
                Reply::text("✅ Cart cleared. Use /menu to view available items.")
            }
            Action::Confirm => {
                self.carts
                    .confirm_order(actor.id, &actor.display_name(), actor.handle.as_deref())
                    .await?;
                return Ok(None);
            }
            Action::Cancel => {
                self.carts.clear_cart(actor.id).await?;
                Reply::text("❌ Order cancelled. Use /menu to start a new order.")
            }
            Action::Callback { .. } => Reply::text("❌ Invalid selection"),
            Action::AdminStatusUpdate { order_id, status } => {
                let order = self.orders.update_status(&order_id, status).await?;
                Notification {
                    text: format!("✅ Order {} status updated to: {}", order.id(), status),
                    buttons: format::status_buttons(&order, self.policy),
                }
            }
            Action::AdminToggleAvailability { item_id } => {
                let available = self.catalog.toggle_availability(&item_id).await?;
                let name = self
                    .catalog
                    .get_item(&item_id)
                    .await?
                    .map_or_else(|| item_id.to_string(), |item| item.name);
                Reply::text(format!("{name} is now {}", availability(available)))
            }
            Action::AdminDeleteItem { item_id } => {
                let item = self
                    .catalog
                    .get_item(&item_id)
                    .await?
                    .ok_or_else(|| DomainError::ItemNotFound(item_id.clone()))?;
                self.catalog.delete_item(&item_id).await?;
                Reply::text(format!("✅ Deleted: {}", item.name))
            }
            Action::AdminAddItem { item } => {
                let item = self.catalog.add_item(item).await?;
                admin_item_reply("✅ Item added!", &item)
            }
            Action::AdminUpdateItem { item_id, update } => {
                let item = self.catalog.update_item(&item_id, update).await?;
                admin_item_reply("✅ Item updated successfully!", &item)
            }
        };
        Ok(Some(reply))
    }

    async fn menu(&self, actor: ChatId) -> domain::Result<Reply> {
        let items = self.catalog.list_items().await?;
        if items.is_empty() {
            return Ok(Reply::text("📝 Menu is empty."));
        }

        let admin = self.is_admin(actor);
        let text = items
            .iter()
            .map(|item| {
                if admin {
                    format!("{}\nItem ID: {}", format::menu_item(item), item.id)
                } else {
                    format::menu_item(item)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut reply = Reply::text(text);
        for item in &items {
            reply = if admin {
                reply.with_row(vec![
                    ActionButton::new(
                        format!(
                            "{} {}",
                            if item.is_available {
                                "❌ Mark Unavailable"
                            } else {
                                "✅ Mark Available"
                            },
                            item.name
                        ),
                        format!("toggle_{}", item.id),
                    ),
                    ActionButton::new(format!("🗑️ Delete {}", item.name), format!("delete_{}", item.id)),
                ])
            } else if item.is_available {
                reply.with_row(vec![ActionButton::new(
                    format!("🛒 Add {} to Cart", item.name),
                    format!("add_{}", item.id),
                )])
            } else {
                reply
            };
        }
        Ok(reply)
    }
}

fn welcome() -> Reply {
    Reply::text("🔥 Welcome! 🛸\n\nBrowse the menu to start your order.")
        .with_row(vec![
            ActionButton::new("📋 View Menu", "view_menu"),
            ActionButton::new("🛒 View Cart", "view_cart"),
        ])
        .with_row(vec![
            ActionButton::new("✅ Confirm Order", "confirm_order"),
            ActionButton::new("❌ Cancel Order", "cancel_order"),
        ])
}

fn empty_cart() -> Reply {
    Reply::text("🛒 Your cart is empty. Use /menu to view available items.")
}

fn availability(available: bool) -> &'static str {
    if available { "✅ Available" } else { "❌ Sold Out" }
}

fn prefixed(headline: &str, mut reply: Reply) -> Reply {
    reply.text = format!("{headline}\n\n{}", reply.text);
    reply
}

fn admin_item_reply(headline: &str, item: &MenuItem) -> Reply {
    Reply::text(format!(
        "{headline}\n\n{}\nItem ID: {}",
        format::menu_item(item),
        item.id
    ))
}

/// Maps a domain error to what the actor is told.
pub fn error_reply(error: &DomainError) -> Reply {
    let text = match error {
        DomainError::ItemNotFound(_) => "❌ Item not found".to_string(),
        DomainError::ItemUnavailable(_) => "❌ Sorry, this item is currently sold out.".to_string(),
        DomainError::InvalidQuantityIndex { .. } => {
            "❌ Invalid quantity selection. Please try again.".to_string()
        }
        DomainError::IndexOutOfRange { .. } => "❌ Item not found in cart".to_string(),
        DomainError::EmptyCart => return empty_cart(),
        DomainError::MissingHandle => {
            "⚠️ You need to set up a public username before placing an order.".to_string()
        }
        DomainError::OrderNotFound(_) => "❌ Order not found".to_string(),
        DomainError::InvalidTransition { order_id, from, to } => {
            format!("❌ Order {order_id} is {from} and cannot be marked {to}")
        }
        DomainError::InvalidMenuItem(reason) => format!("❌ Invalid menu item: {reason}"),
        DomainError::Store(_) => GENERIC_FAILURE.to_string(),
    };

    if error.kind() == ErrorKind::StoreFailure {
        tracing::error!(error = %error, "action failed on the store");
    } else {
        tracing::debug!(error = %error, kind = ?error.kind(), "action refused");
    }
    Reply::text(text)
}
