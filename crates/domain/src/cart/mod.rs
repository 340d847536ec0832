//! Per-customer shopping carts.

mod service;

pub use service::CartService;

use chrono::{DateTime, Utc};
use common::ChatId;
use serde::{Deserialize, Serialize};
use store::{Collection, Document};

use crate::catalog::{MenuItem, Quantity};
use crate::error::{DomainError, Result};
use crate::value_objects::Money;

/// A line in a cart or order.
///
/// The menu item is a snapshot taken when the line was added, so later
/// catalog edits never reprice it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub menu_item: MenuItem,
    pub selected_quantity: Quantity,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartItem {
    pub fn new(menu_item: MenuItem, selected_quantity: Quantity) -> Self {
        Self {
            menu_item,
            selected_quantity,
            quantity: 1,
        }
    }

    /// Price of the selected quantity times the count.
    pub fn subtotal(&self) -> Money {
        self.selected_quantity.price.multiply(self.quantity)
    }

    fn matches(&self, menu_item: &MenuItem, quantity: &Quantity) -> bool {
        self.menu_item.id == menu_item.id && self.selected_quantity.amount == quantity.amount
    }
}

/// Sum of every line's subtotal.
pub fn total_of(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::subtotal).sum()
}

/// A customer's open cart. Never persisted empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    chat_id: ChatId,
    items: Vec<CartItem>,
    last_updated: DateTime<Utc>,
}

impl Cart {
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            items: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Lines in insertion order; positions are the removal indexes.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Money {
        total_of(&self.items)
    }

    /// Adds one unit of `quantity`, merging with an existing line for the
    /// same item and amount.
    pub(crate) fn add(&mut self, menu_item: MenuItem, quantity: Quantity) {
        match self
            .items
            .iter_mut()
            .find(|line| line.matches(&menu_item, &quantity))
        {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.items.push(CartItem::new(menu_item, quantity)),
        }
        self.last_updated = Utc::now();
    }

    /// Removes the line at `index` and returns it.
    pub(crate) fn remove(&mut self, index: usize) -> Result<CartItem> {
        if index >= self.items.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.last_updated = Utc::now();
        Ok(self.items.remove(index))
    }

    pub(crate) fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

impl Document for Cart {
    const COLLECTION: Collection = Collection::Carts;

    fn document_id(&self) -> String {
        self.chat_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MenuItemId;

    fn item(id: &str, prices: &[(&str, u64)]) -> MenuItem {
        MenuItem {
            id: MenuItemId::from(id),
            name: id.to_uppercase(),
            description: None,
            image: None,
            video: None,
            quantities: prices
                .iter()
                .enumerate()
                .map(|(i, (amount, price))| {
                    Quantity::new(format!("Option {}", i + 1), *amount, Money::from_units(*price))
                })
                .collect(),
            is_available: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_same_item_and_amount() {
        let a = item("a", &[("1/8", 25)]);
        let mut cart = Cart::new(ChatId::new(1));

        cart.add(a.clone(), a.quantities[0].clone());
        cart.add(a.clone(), a.quantities[0].clone());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), Money::from_units(50));
    }

    #[test]
    fn test_different_amounts_are_separate_lines() {
        let a = item("a", &[("1/8", 25), ("1/4", 45)]);
        let mut cart = Cart::new(ChatId::new(1));

        cart.add(a.clone(), a.quantities[0].clone());
        cart.add(a.clone(), a.quantities[1].clone());

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[1].selected_quantity.amount, "1/4");
    }

    #[test]
    fn test_duplicate_amounts_merge_on_amount() {
        let a = item("a", &[("2g", 15), ("2g", 20)]);
        let mut cart = Cart::new(ChatId::new(1));

        cart.add(a.clone(), a.quantities[0].clone());
        cart.add(a.clone(), a.quantities[1].clone());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_remove_out_of_range_leaves_cart() {
        let a = item("a", &[("1/8", 25)]);
        let mut cart = Cart::new(ChatId::new(1));
        cart.add(a.clone(), a.quantities[0].clone());

        let result = cart.remove(1);
        assert!(matches!(
            result,
            Err(DomainError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(cart.len(), 1);

        let removed = cart.remove(0).unwrap();
        assert_eq!(removed.menu_item.id, a.id);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let a = item("a", &[("1/8", 25)]);
        let mut cart = Cart::new(ChatId::new(-100));
        cart.add(a.clone(), a.quantities[0].clone());

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["chatId"], -100);
        assert_eq!(json["items"][0]["selectedQuantity"]["amount"], "1/8");
        assert_eq!(json["items"][0]["menuItem"]["id"], "a");
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(cart.document_id(), "-100");
    }
}
