//! Document store adapter.
//!
//! Three collections (users, checklists, checklist items) behind a narrow
//! async interface. Every write touches exactly one document; callers that
//! perform several writes get no atomicity across them.
//!
//! The handle is built once by the composition root and passed around as
//! [`SharedStore`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{init_db, SqliteStore};

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    Checklist, ChecklistFields, ChecklistItem, ChecklistPatch, ItemFields, NewUser, User,
};

/// Shared handle to whichever backend the process was configured with.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Store collections, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Checklists,
    ChecklistItems,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Checklists => "checklists",
            Collection::ChecklistItems => "checklist_items",
        }
    }
}

/// Errors surfaced by a store backend.
#[derive(Debug)]
pub enum StoreError {
    /// The addressed document does not exist.
    NotFound(Collection, String),
    /// A write would violate a uniqueness constraint.
    Conflict(Collection, String),
    /// The backend could not be reached or failed mid-operation.
    Unavailable(String),
    /// A stored document could not be decoded.
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(collection, id) => {
                write!(f, "No document '{}' in {}", id, collection.name())
            }
            StoreError::Conflict(collection, key) => {
                write!(f, "Duplicate key '{}' in {}", key, collection.name())
            }
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {}", e),
            StoreError::Corrupt(e) => write!(f, "Corrupt document: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Users

    /// Inserts a user; fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    /// Idempotent.
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;

    // Checklists

    async fn create_checklist(
        &self,
        owner_id: &str,
        fields: ChecklistFields,
    ) -> Result<Checklist, StoreError>;
    async fn get_checklist(&self, id: &str) -> Result<Option<Checklist>, StoreError>;
    async fn list_checklists_by_owner(&self, owner_id: &str) -> Result<Vec<Checklist>, StoreError>;
    /// Applies the patch and restamps `updated_at`. `NotFound` if missing.
    async fn update_checklist(
        &self,
        id: &str,
        patch: &ChecklistPatch,
    ) -> Result<Checklist, StoreError>;
    /// Idempotent. Does not touch the checklist's items.
    async fn delete_checklist(&self, id: &str) -> Result<(), StoreError>;

    // Checklist items

    /// Ids of the items whose `checklist_id` equals `checklist_id`.
    async fn item_ids_by_checklist(&self, checklist_id: &str) -> Result<Vec<String>, StoreError>;
    /// Items of a checklist in creation order.
    async fn list_items_by_checklist(
        &self,
        checklist_id: &str,
    ) -> Result<Vec<ChecklistItem>, StoreError>;
    async fn get_item(&self, id: &str) -> Result<Option<ChecklistItem>, StoreError>;
    /// Inserts an item under a freshly minted id, stamping both timestamps.
    async fn create_item(&self, fields: &ItemFields) -> Result<ChecklistItem, StoreError>;
    /// Overwrites the item's fields, restamps `updated_at` and returns the
    /// stored record. `NotFound` if the item no longer exists.
    async fn update_item(
        &self,
        id: &str,
        fields: &ItemFields,
    ) -> Result<ChecklistItem, StoreError>;
    /// Idempotent.
    async fn delete_item(&self, id: &str) -> Result<(), StoreError>;
}

/// Mints a store-assigned document id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
