//! Catalog administration.

use chrono::Utc;
use common::MenuItemId;
use store::{CachedRepository, DocumentStore};

use crate::error::{DomainError, Result};
use crate::lock::KeyedLock;
use crate::repositories::Repositories;

use super::{MenuItem, MenuItemUpdate, NewMenuItem, validate_listing};

/// Service for managing menu items.
pub struct CatalogService<S> {
    menu_items: CachedRepository<S, MenuItem>,
    locks: KeyedLock<MenuItemId>,
}

impl<S: DocumentStore + Clone> CatalogService<S> {
    /// Creates a catalog service over the shared repositories.
    pub fn new(repositories: &Repositories<S>) -> Self {
        Self {
            menu_items: repositories.menu_items.clone(),
            locks: KeyedLock::new(),
        }
    }

    /// Publishes a new, available menu item.
    #[tracing::instrument(skip(self, item), fields(name = %item.name))]
    pub async fn add_item(&self, item: NewMenuItem) -> Result<MenuItem> {
        validate_listing(&item.name, &item.quantities)?;

        let menu_item = MenuItem {
            id: MenuItemId::new(),
            name: item.name,
            description: item.description,
            image: item.image,
            video: item.video,
            quantities: item.quantities,
            is_available: true,
            updated_at: Utc::now(),
        };
        self.menu_items.put(&menu_item).await?;

        tracing::info!(item_id = %menu_item.id, "menu item added");
        Ok(menu_item)
    }

    /// Loads a menu item by ID.
    pub async fn get_item(&self, id: &MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.menu_items.get(id.as_str()).await?)
    }

    /// Lists every menu item, sorted by name.
    pub async fn list_items(&self) -> Result<Vec<MenuItem>> {
        let mut items = self.menu_items.list().await?;
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        Ok(items)
    }

    /// Applies a partial update to a menu item.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_item(&self, id: &MenuItemId, update: MenuItemUpdate) -> Result<MenuItem> {
        let _guard = self.locks.acquire(id).await;
        let mut item = self.require(id).await?;

        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(description) = update.description {
            item.description = Some(description);
        }
        if let Some(image) = update.image {
            item.image = Some(image);
        }
        if let Some(video) = update.video {
            item.video = Some(video);
        }
        if let Some(quantities) = update.quantities {
            item.quantities = quantities;
        }
        validate_listing(&item.name, &item.quantities)?;

        item.updated_at = Utc::now();
        self.menu_items.put(&item).await?;
        Ok(item)
    }

    /// Removes a menu item from the catalog.
    ///
    /// Carts and orders keep their own snapshot of the item.
    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, id: &MenuItemId) -> Result<()> {
        let _guard = self.locks.acquire(id).await;
        self.require(id).await?;
        self.menu_items.delete(id.as_str()).await?;
        tracing::info!(item_id = %id, "menu item deleted");
        Ok(())
    }

    /// Flips the sold-out flag and returns the new availability.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_availability(&self, id: &MenuItemId) -> Result<bool> {
        let _guard = self.locks.acquire(id).await;
        let mut item = self.require(id).await?;

        item.is_available = !item.is_available;
        item.updated_at = Utc::now();
        self.menu_items.put(&item).await?;

        tracing::info!(item_id = %id, available = item.is_available, "availability toggled");
        Ok(item.is_available)
    }

    async fn require(&self, id: &MenuItemId) -> Result<MenuItem> {
        self.menu_items
            .get(id.as_str())
            .await?
            .ok_or_else(|| DomainError::ItemNotFound(id.clone()))
    }
}
