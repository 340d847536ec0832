//! One cached repository per entity type, sharing a single store.

use store::{CachedRepository, DocumentStore};

use crate::cart::Cart;
use crate::catalog::MenuItem;
use crate::customer::Customer;
use crate::order::Order;

/// The cache layer for every entity type.
///
/// Build one per process and clone it into each service so that every
/// service sees the same caches.
pub struct Repositories<S> {
    pub menu_items: CachedRepository<S, MenuItem>,
    pub carts: CachedRepository<S, Cart>,
    pub orders: CachedRepository<S, Order>,
    pub customers: CachedRepository<S, Customer>,
}

impl<S: Clone> Clone for Repositories<S> {
    fn clone(&self) -> Self {
        Self {
            menu_items: self.menu_items.clone(),
            carts: self.carts.clone(),
            orders: self.orders.clone(),
            customers: self.customers.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> Repositories<S> {
    /// Creates the repositories, each holding at most `capacity` entries.
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            menu_items: CachedRepository::new(store.clone(), capacity),
            carts: CachedRepository::new(store.clone(), capacity),
            orders: CachedRepository::new(store.clone(), capacity),
            customers: CachedRepository::new(store, capacity),
        }
    }
}
