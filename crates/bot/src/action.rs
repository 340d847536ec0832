//! Inbound action events.

use common::{ChatId, MenuItemId, OrderId};
use domain::{Customer, MenuItemUpdate, NewMenuItem, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::CallbackError;

/// The user behind an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Chat the action came from; replies and notifications go back here.
    pub id: ChatId,
    /// Public handle, without the leading `@`.
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Actor {
    pub fn new(id: ChatId) -> Self {
        Self {
            id,
            handle: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: Option<&str>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last.map(str::to_string);
        self
    }

    pub fn to_customer(&self) -> Customer {
        Customer {
            chat_id: self.id,
            username: self.handle.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Name shown on orders.
    pub fn display_name(&self) -> String {
        self.to_customer().display_name()
    }
}

/// An action together with who performed it.
///
/// On the wire the action's fields sit next to `actor`:
/// `{"actor": {"id": 42}, "action": "add-to-cart", "itemId": "…", "quantityIndex": 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub actor: Actor,
    #[serde(flatten)]
    pub action: Action,
}

impl ActionEvent {
    pub fn new(actor: Actor, action: Action) -> Self {
        Self { actor, action }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Action {
    Start,
    ViewMenu,
    SelectItem {
        item_id: MenuItemId,
    },
    AddToCart {
        item_id: MenuItemId,
        quantity_index: usize,
    },
    ViewCart,
    Remove {
        index: usize,
    },
    Clear,
    Confirm,
    Cancel,
    /// A button press carrying the raw payload of an [`domain::ActionButton`].
    Callback {
        data: String,
    },
    AdminStatusUpdate {
        order_id: OrderId,
        status: OrderStatus,
    },
    AdminToggleAvailability {
        item_id: MenuItemId,
    },
    AdminDeleteItem {
        item_id: MenuItemId,
    },
    AdminAddItem {
        item: NewMenuItem,
    },
    AdminUpdateItem {
        item_id: MenuItemId,
        update: MenuItemUpdate,
    },
}

impl Action {
    /// Parses a button payload.
    ///
    /// Recognized payloads: `add_<item>`, `quantity_<item>_<index>`,
    /// `remove_<index>`, `clear_cart`, `view_cart`, `view_menu`,
    /// `confirm_order`, `cancel_order`, `toggle_<item>`, `delete_<item>`
    /// and `<verb>_<order>` for the admin status verbs `accept`, `reject`,
    /// `intransit` and `delivered`.
    pub fn from_callback(data: &str) -> Result<Action, CallbackError> {
        match data {
            "clear_cart" => return Ok(Action::Clear),
            "view_cart" => return Ok(Action::ViewCart),
            "view_menu" => return Ok(Action::ViewMenu),
            "confirm_order" => return Ok(Action::Confirm),
            "cancel_order" => return Ok(Action::Cancel),
            _ => {}
        }

        let unrecognized = || CallbackError::Unrecognized(data.to_string());
        let (prefix, rest) = data.split_once('_').ok_or_else(unrecognized)?;
        if rest.is_empty() {
            return Err(unrecognized());
        }

        match prefix {
            "add" => Ok(Action::SelectItem {
                item_id: MenuItemId::from(rest),
            }),
            "quantity" => {
                let (item, index) = rest.rsplit_once('_').ok_or_else(unrecognized)?;
                if item.is_empty() {
                    return Err(unrecognized());
                }
                Ok(Action::AddToCart {
                    item_id: MenuItemId::from(item),
                    quantity_index: parse_index(data, index)?,
                })
            }
            "remove" => Ok(Action::Remove {
                index: parse_index(data, rest)?,
            }),
            "toggle" => Ok(Action::AdminToggleAvailability {
                item_id: MenuItemId::from(rest),
            }),
            "delete" => Ok(Action::AdminDeleteItem {
                item_id: MenuItemId::from(rest),
            }),
            verb => {
                let status = OrderStatus::from_callback_verb(verb).ok_or_else(unrecognized)?;
                Ok(Action::AdminStatusUpdate {
                    order_id: OrderId::from(rest),
                    status,
                })
            }
        }
    }

    /// Returns true for actions only the administrator may perform.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::AdminStatusUpdate { .. }
                | Action::AdminToggleAvailability { .. }
                | Action::AdminDeleteItem { .. }
                | Action::AdminAddItem { .. }
                | Action::AdminUpdateItem { .. }
        )
    }

    /// Wire name of the action, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::ViewMenu => "view-menu",
            Action::SelectItem { .. } => "select-item",
            Action::AddToCart { .. } => "add-to-cart",
            Action::ViewCart => "view-cart",
            Action::Remove { .. } => "remove",
            Action::Clear => "clear",
            Action::Confirm => "confirm",
            Action::Cancel => "cancel",
            Action::Callback { .. } => "callback",
            Action::AdminStatusUpdate { .. } => "admin-status-update",
            Action::AdminToggleAvailability { .. } => "admin-toggle-availability",
            Action::AdminDeleteItem { .. } => "admin-delete-item",
            Action::AdminAddItem { .. } => "admin-add-item",
            Action::AdminUpdateItem { .. } => "admin-update-item",
        }
    }
}

fn parse_index(data: &str, raw: &str) -> Result<usize, CallbackError> {
    raw.parse().map_err(|_| CallbackError::InvalidIndex {
        data: data.to_string(),
        index: raw.to_string(),
    })
}
