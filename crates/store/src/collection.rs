use serde::{Deserialize, Serialize};

/// A named group of documents of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    MenuItems,
    Orders,
    Carts,
    Customers,
}

impl Collection {
    /// All collections, in a stable order.
    pub const ALL: [Collection; 4] = [
        Collection::MenuItems,
        Collection::Orders,
        Collection::Carts,
        Collection::Customers,
    ];

    /// Returns the storage name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::MenuItems => "menuItems",
            Collection::Orders => "orders",
            Collection::Carts => "carts",
            Collection::Customers => "customers",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_match_serde_names() {
        for collection in Collection::ALL {
            let json = serde_json::to_string(&collection).unwrap();
            assert_eq!(json, format!("\"{}\"", collection.as_str()));
        }
    }
}
