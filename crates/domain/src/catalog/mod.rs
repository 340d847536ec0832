//! Catalog of menu items.

mod service;

pub use service::CatalogService;

use chrono::{DateTime, Utc};
use common::MenuItemId;
use serde::{Deserialize, Serialize};
use store::{Collection, Document};

use crate::error::{DomainError, Result};
use crate::value_objects::Money;

/// Opaque media handle issued by the chat transport.
///
/// Nothing outside the originating transport is assumed to be able to render
/// it; the bot hands it back to the transport when showing an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One purchasable size of a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    /// Display label.
    pub label: String,
    /// Free-text unit description, e.g. "1/8" or "2g".
    pub amount: String,
    /// Price in whole currency units.
    pub price: Money,
}

impl Quantity {
    pub fn new(label: impl Into<String>, amount: impl Into<String>, price: Money) -> Self {
        Self {
            label: label.into(),
            amount: amount.into(),
            price,
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaRef>,
    /// Ordered quantity options; never empty once published.
    pub quantities: Vec<Quantity>,
    pub is_available: bool,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Returns the quantity option at `index`.
    pub fn quantity(&self, index: usize) -> Result<&Quantity> {
        self.quantities
            .get(index)
            .ok_or_else(|| DomainError::InvalidQuantityIndex {
                item_id: self.id.clone(),
                index,
                available: self.quantities.len(),
            })
    }
}

impl Document for MenuItem {
    const COLLECTION: Collection = Collection::MenuItems;

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Fields for creating a menu item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<MediaRef>,
    pub video: Option<MediaRef>,
    pub quantities: Vec<Quantity>,
}

impl NewMenuItem {
    pub fn new(name: impl Into<String>, quantities: Vec<Quantity>) -> Self {
        Self {
            name: name.into(),
            quantities,
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn image(mut self, image: MediaRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn video(mut self, video: MediaRef) -> Self {
        self.video = Some(video);
        self
    }
}

/// A partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<MediaRef>,
    pub video: Option<MediaRef>,
    pub quantities: Option<Vec<Quantity>>,
}

pub(crate) fn validate_listing(name: &str, quantities: &[Quantity]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidMenuItem("name is required".to_string()));
    }
    if quantities.is_empty() {
        return Err(DomainError::InvalidMenuItem(
            "at least one quantity option is required".to_string(),
        ));
    }
    Ok(())
}
