//! Customer profiles recorded when a chat session starts.

use common::ChatId;
use serde::{Deserialize, Serialize};
use store::{CachedRepository, Collection, Document, DocumentStore};

use crate::error::Result;
use crate::lock::KeyedLock;
use crate::repositories::Repositories;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub chat_id: ChatId,
    /// Public handle, if the customer has one.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Customer {
    /// First and last name joined by a space, skipping missing parts.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Document for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn document_id(&self) -> String {
        self.chat_id.to_string()
    }
}

pub struct CustomerDirectory<S> {
    customers: CachedRepository<S, Customer>,
    locks: KeyedLock<ChatId>,
}

impl<S: DocumentStore + Clone> CustomerDirectory<S> {
    pub fn new(repositories: &Repositories<S>) -> Self {
        Self {
            customers: repositories.customers.clone(),
            locks: KeyedLock::new(),
        }
    }

    /// Stores the profile unless an identical one is already recorded.
    #[tracing::instrument(skip(self, customer), fields(chat_id = %customer.chat_id))]
    pub async fn remember(&self, customer: Customer) -> Result<()> {
        let _guard = self.locks.acquire(&customer.chat_id).await;

        let existing = self.customers.get(&customer.chat_id.to_string()).await?;
        if existing.as_ref() == Some(&customer) {
            return Ok(());
        }
        self.customers.put(&customer).await?;
        tracing::debug!("customer profile saved");
        Ok(())
    }

    pub async fn get(&self, chat_id: ChatId) -> Result<Option<Customer>> {
        Ok(self.customers.get(&chat_id.to_string()).await?)
    }
}
