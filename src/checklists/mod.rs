//! Checklist operations on top of the document store.
//!
//! Every operation that addresses an existing checklist first checks that it
//! exists and belongs to the caller; nothing is written when either check
//! fails.

mod locks;
mod reconcile;

pub use locks::ChecklistLocks;
pub use reconcile::{reconcile_items, ReconcileResult};

use futures::future::try_join_all;

use crate::models::{Checklist, ChecklistFields, ChecklistPatch, ChecklistWithItems};
use crate::store::{DocumentStore, StoreError};

/// Errors from checklist operations.
#[derive(Debug)]
pub enum ChecklistError {
    /// No checklist with this id.
    NotFound(String),
    /// The checklist belongs to someone else.
    Forbidden,
    /// Rejected input.
    Invalid(String),
    /// The store failed; writes already made are not rolled back.
    Store(StoreError),
}

impl std::fmt::Display for ChecklistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecklistError::NotFound(id) => write!(f, "Checklist not found: {}", id),
            ChecklistError::Forbidden => write!(f, "Access denied"),
            ChecklistError::Invalid(msg) => write!(f, "Invalid checklist: {}", msg),
            ChecklistError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ChecklistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChecklistError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ChecklistError {
    fn from(e: StoreError) -> Self {
        ChecklistError::Store(e)
    }
}

/// Loads a checklist and verifies `owner_id` owns it.
pub async fn load_owned(
    store: &dyn DocumentStore,
    checklist_id: &str,
    owner_id: &str,
) -> Result<Checklist, ChecklistError> {
    let checklist = store
        .get_checklist(checklist_id)
        .await?
        .ok_or_else(|| ChecklistError::NotFound(checklist_id.to_string()))?;

    if checklist.user_id != owner_id {
        return Err(ChecklistError::Forbidden);
    }

    Ok(checklist)
}

async fn with_items(
    store: &dyn DocumentStore,
    checklist: Checklist,
) -> Result<ChecklistWithItems, ChecklistError> {
    let items = store.list_items_by_checklist(&checklist.id).await?;
    Ok(ChecklistWithItems { checklist, items })
}

pub async fn create_checklist(
    store: &dyn DocumentStore,
    owner_id: &str,
    mut fields: ChecklistFields,
) -> Result<ChecklistWithItems, ChecklistError> {
    fields.name = fields.name.trim().to_string();
    if fields.name.is_empty() {
        return Err(ChecklistError::Invalid("name must not be empty".to_string()));
    }

    let checklist = store.create_checklist(owner_id, fields).await?;
    tracing::debug!("Created checklist {} for {}", checklist.id, owner_id);

    Ok(ChecklistWithItems {
        checklist,
        items: Vec::new(),
    })
}

/// All checklists owned by `owner_id`, each joined with its items.
pub async fn list_checklists(
    store: &dyn DocumentStore,
    owner_id: &str,
) -> Result<Vec<ChecklistWithItems>, ChecklistError> {
    let checklists = store.list_checklists_by_owner(owner_id).await?;
    try_join_all(
        checklists
            .into_iter()
            .map(|checklist| with_items(store, checklist)),
    )
    .await
}

pub async fn get_checklist(
    store: &dyn DocumentStore,
    checklist_id: &str,
    owner_id: &str,
) -> Result<ChecklistWithItems, ChecklistError> {
    let checklist = load_owned(store, checklist_id, owner_id).await?;
    with_items(store, checklist).await
}

pub async fn update_checklist(
    store: &dyn DocumentStore,
    checklist_id: &str,
    owner_id: &str,
    patch: &ChecklistPatch,
) -> Result<Checklist, ChecklistError> {
    let mut patch = patch.clone();
    if let Some(name) = patch.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(ChecklistError::Invalid("name must not be empty".to_string()));
        }
    }

    load_owned(store, checklist_id, owner_id).await?;
    Ok(store.update_checklist(checklist_id, &patch).await?)
}

/// Deletes a checklist's items and then the checklist itself.
///
/// Returns the number of items removed.
pub async fn delete_checklist(
    store: &dyn DocumentStore,
    checklist_id: &str,
    owner_id: &str,
) -> Result<usize, ChecklistError> {
    load_owned(store, checklist_id, owner_id).await?;

    let item_ids = store.item_ids_by_checklist(checklist_id).await?;
    for id in &item_ids {
        store.delete_item(id).await?;
    }
    store.delete_checklist(checklist_id).await?;

    tracing::info!(
        "Deleted checklist {} with {} item(s)",
        checklist_id,
        item_ids.len()
    );
    Ok(item_ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemFields;
    use crate::store::MemoryStore;

    fn item(checklist_id: &str, title: &str) -> ItemFields {
        ItemFields {
            title: title.to_string(),
            description: None,
            completed: false,
            checklist_id: checklist_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let store = MemoryStore::new();

        let err = create_checklist(&store, "u1", ChecklistFields::named("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ChecklistError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_create_starts_empty() {
        let store = MemoryStore::new();

        let created = create_checklist(&store, "u1", ChecklistFields::named(" Home "))
            .await
            .unwrap();

        assert_eq!(created.checklist.name, "Home");
        assert_eq!(created.checklist.user_id, "u1");
        assert!(created.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_only_returns_own_checklists_with_items() {
        let store = MemoryStore::new();
        let mine = store
            .create_checklist("u1", ChecklistFields::named("Mine"))
            .await
            .unwrap();
        store
            .create_checklist("u2", ChecklistFields::named("Theirs"))
            .await
            .unwrap();
        store.create_item(&item(&mine.id, "a")).await.unwrap();
        store.create_item(&item(&mine.id, "b")).await.unwrap();

        let listed = list_checklists(&store, "u1").await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].checklist.name, "Mine");
        assert_eq!(listed[0].items.len(), 2);
    }

    #[tokio::test]
    async fn test_get_checks_ownership() {
        let store = MemoryStore::new();
        let checklist = store
            .create_checklist("u1", ChecklistFields::named("Private"))
            .await
            .unwrap();

        let err = get_checklist(&store, &checklist.id, "intruder")
            .await
            .unwrap_err();
        assert!(matches!(err, ChecklistError::Forbidden));

        let err = get_checklist(&store, "missing", "u1").await.unwrap_err();
        assert!(matches!(err, ChecklistError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_trims_name() {
        let store = MemoryStore::new();
        let checklist = store
            .create_checklist("u1", ChecklistFields::named("Mercado"))
            .await
            .unwrap();
        let patch = ChecklistPatch {
            name: Some("  Feira  ".to_string()),
            ..ChecklistPatch::default()
        };

        let updated = update_checklist(&store, &checklist.id, "u1", &patch)
            .await
            .unwrap();
        assert_eq!(updated.name, "Feira");

        let blank = ChecklistPatch {
            name: Some("   ".to_string()),
            ..ChecklistPatch::default()
        };
        assert!(matches!(
            update_checklist(&store, &checklist.id, "u1", &blank).await,
            Err(ChecklistError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_update_forbidden_leaves_checklist_untouched() {
        let store = MemoryStore::new();
        let checklist = store
            .create_checklist("u1", ChecklistFields::named("Original"))
            .await
            .unwrap();
        let patch = ChecklistPatch {
            name: Some("Hijacked".to_string()),
            ..ChecklistPatch::default()
        };

        let err = update_checklist(&store, &checklist.id, "u2", &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ChecklistError::Forbidden));

        let stored = store.get_checklist(&checklist.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Original");
    }

    #[tokio::test]
    async fn test_delete_removes_items_first() {
        let store = MemoryStore::new();
        let doomed = store
            .create_checklist("u1", ChecklistFields::named("Doomed"))
            .await
            .unwrap();
        let kept = store
            .create_checklist("u1", ChecklistFields::named("Kept"))
            .await
            .unwrap();
        store.create_item(&item(&doomed.id, "a")).await.unwrap();
        store.create_item(&item(&doomed.id, "b")).await.unwrap();
        store.create_item(&item(&kept.id, "c")).await.unwrap();

        let removed = delete_checklist(&store, &doomed.id, "u1").await.unwrap();

        assert_eq!(removed, 2);
        assert!(store.get_checklist(&doomed.id).await.unwrap().is_none());
        assert_eq!(store.item_count().await, 1);
    }
}
