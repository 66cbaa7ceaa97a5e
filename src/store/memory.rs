//! In-process document store.
//!
//! Backs the test suites and `store: memory` deployments. Documents live in
//! hash maps behind a single async lock; each trait call takes the lock once,
//! which gives the same per-document atomicity as the SQLite backend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{new_id, Collection, DocumentStore, StoreError};
use crate::models::{
    Checklist, ChecklistFields, ChecklistItem, ChecklistPatch, ItemFields, NewUser, User,
};

/// A document plus its insertion sequence, used for stable listing order.
#[derive(Debug, Clone)]
struct Stored<T> {
    seq: u64,
    doc: T,
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<String, Stored<User>>,
    checklists: HashMap<String, Stored<Checklist>>,
    items: HashMap<String, Stored<ChecklistItem>>,
    next_seq: u64,
}

impl Collections {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

fn ordered<T: Clone>(mut docs: Vec<&Stored<T>>) -> Vec<T> {
    docs.sort_by_key(|stored| stored.seq);
    docs.into_iter().map(|stored| stored.doc.clone()).collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items across all checklists.
    pub async fn item_count(&self) -> usize {
        self.inner.read().await.items.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.doc.email == user.email) {
            return Err(StoreError::Conflict(Collection::Users, user.email));
        }

        let record = User {
            id: new_id(),
            email: user.email,
            name: user.name,
            phone: user.phone,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.users.insert(
            record.id.clone(),
            Stored {
                seq,
                doc: record.clone(),
            },
        );
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.doc.email == email)
            .map(|u| u.doc.clone()))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).map(|u| u.doc.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ordered(inner.users.values().collect()))
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.users.remove(id);
        Ok(())
    }

    async fn create_checklist(
        &self,
        owner_id: &str,
        fields: ChecklistFields,
    ) -> Result<Checklist, StoreError> {
        let now = Utc::now();
        let record = Checklist {
            id: new_id(),
            name: fields.name,
            category: fields.category,
            description: fields.description,
            limit_date: fields.limit_date,
            change_color_by_date: fields.change_color_by_date,
            show_motivational_msg: fields.show_motivational_msg,
            user_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        let seq = inner.next_seq();
        inner.checklists.insert(
            record.id.clone(),
            Stored {
                seq,
                doc: record.clone(),
            },
        );
        Ok(record)
    }

    async fn get_checklist(&self, id: &str) -> Result<Option<Checklist>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.checklists.get(id).map(|c| c.doc.clone()))
    }

    async fn list_checklists_by_owner(&self, owner_id: &str) -> Result<Vec<Checklist>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ordered(
            inner
                .checklists
                .values()
                .filter(|c| c.doc.user_id == owner_id)
                .collect(),
        ))
    }

    async fn update_checklist(
        &self,
        id: &str,
        patch: &ChecklistPatch,
    ) -> Result<Checklist, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .checklists
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(Collection::Checklists, id.to_string()))?;

        patch.apply_to(&mut stored.doc, Utc::now());
        Ok(stored.doc.clone())
    }

    async fn delete_checklist(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.checklists.remove(id);
        Ok(())
    }

    async fn item_ids_by_checklist(&self, checklist_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_items_by_checklist(checklist_id)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect())
    }

    async fn list_items_by_checklist(
        &self,
        checklist_id: &str,
    ) -> Result<Vec<ChecklistItem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ordered(
            inner
                .items
                .values()
                .filter(|i| i.doc.checklist_id == checklist_id)
                .collect(),
        ))
    }

    async fn get_item(&self, id: &str) -> Result<Option<ChecklistItem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.items.get(id).map(|i| i.doc.clone()))
    }

    async fn create_item(&self, fields: &ItemFields) -> Result<ChecklistItem, StoreError> {
        let now = Utc::now();
        let record = ChecklistItem {
            id: new_id(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            completed: fields.completed,
            checklist_id: fields.checklist_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        let seq = inner.next_seq();
        inner.items.insert(
            record.id.clone(),
            Stored {
                seq,
                doc: record.clone(),
            },
        );
        Ok(record)
    }

    async fn update_item(
        &self,
        id: &str,
        fields: &ItemFields,
    ) -> Result<ChecklistItem, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(Collection::ChecklistItems, id.to_string()))?;

        let item = &mut stored.doc;
        item.title = fields.title.clone();
        item.description = fields.description.clone();
        item.completed = fields.completed;
        item.checklist_id = fields.checklist_id.clone();
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.items.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Tester".to_string(),
            phone: None,
            password_hash: "hash".to_string(),
        }
    }

    fn fields(checklist_id: &str, title: &str) -> ItemFields {
        ItemFields {
            title: title.to_string(),
            description: None,
            completed: false,
            checklist_id: checklist_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let err = store
            .create_user(new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(Collection::Users, _)));
    }

    #[tokio::test]
    async fn test_items_listed_in_creation_order() {
        let store = MemoryStore::new();
        let first = store.create_item(&fields("c1", "first")).await.unwrap();
        let second = store.create_item(&fields("c1", "second")).await.unwrap();
        store.create_item(&fields("c2", "other")).await.unwrap();

        let ids = store.item_ids_by_checklist("c1").await.unwrap();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let store = MemoryStore::new();

        let err = store
            .update_item("ghost", &fields("c1", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Collection::ChecklistItems, _)));
    }

    #[tokio::test]
    async fn test_update_item_keeps_created_at() {
        let store = MemoryStore::new();
        let item = store.create_item(&fields("c1", "draft")).await.unwrap();

        let mut changed = fields("c1", "final");
        changed.completed = true;
        let updated = store.update_item(&item.id, &changed).await.unwrap();

        assert_eq!(updated.id, item.id);
        assert_eq!(updated.title, "final");
        assert!(updated.completed);
        assert_eq!(updated.created_at, item.created_at);
        assert!(updated.updated_at >= item.updated_at);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let item = store.create_item(&fields("c1", "x")).await.unwrap();

        store.delete_item(&item.id).await.unwrap();
        store.delete_item(&item.id).await.unwrap();
        store.delete_checklist("never-existed").await.unwrap();

        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_missing_checklist_is_not_found() {
        let store = MemoryStore::new();

        let err = store
            .update_checklist("ghost", &ChecklistPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Collection::Checklists, _)));
    }
}
