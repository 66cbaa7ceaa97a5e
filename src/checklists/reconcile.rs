//! Bulk item reconciliation.
//!
//! Converges the items of one checklist to exactly the list the client sent:
//! specs naming an existing item of this checklist update it, every other
//! spec creates a new item, and existing items no spec kept are deleted.
//!
//! Specs are processed strictly in input order with one store write each.
//! Updates are unconditional writes and always count as updates, even when
//! nothing changed. The sequence is not transactional: if a write fails,
//! processing stops and the writes already made stay applied.

use std::collections::HashSet;

use super::{load_owned, ChecklistError};
use crate::models::{ChecklistItem, ItemSpec};
use crate::store::DocumentStore;

/// Outcome of a reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileResult {
    /// One record per input spec, in input order.
    pub items: Vec<ChecklistItem>,
    pub created_count: usize,
    pub updated_count: usize,
    pub deleted_count: usize,
}

/// Makes the items of `checklist_id` match `specs`.
///
/// Fails with `NotFound` or `Forbidden` before any write when the checklist
/// is missing or not owned by `owner_id`. A spec id that is not among this
/// checklist's current items (stale, or belonging to another checklist) is
/// treated as a create and the supplied id is discarded.
pub async fn reconcile_items(
    store: &dyn DocumentStore,
    checklist_id: &str,
    owner_id: &str,
    specs: &[ItemSpec],
) -> Result<ReconcileResult, ChecklistError> {
    load_owned(store, checklist_id, owner_id).await?;

    let existing_ids = store.item_ids_by_checklist(checklist_id).await?;
    let existing: HashSet<&str> = existing_ids.iter().map(String::as_str).collect();

    let mut kept_ids: HashSet<String> = HashSet::with_capacity(specs.len());
    let mut items = Vec::with_capacity(specs.len());
    let mut created_count = 0;
    let mut updated_count = 0;

    for spec in specs {
        let fields = spec.fields_for(checklist_id);

        let item = match spec.requested_id().filter(|id| existing.contains(id)) {
            Some(id) => {
                updated_count += 1;
                store.update_item(id, &fields).await?
            }
            None => {
                created_count += 1;
                store.create_item(&fields).await?
            }
        };

        kept_ids.insert(item.id.clone());
        items.push(item);
    }

    let mut deleted_count = 0;
    for id in existing_ids.iter().filter(|id| !kept_ids.contains(*id)) {
        store.delete_item(id).await?;
        deleted_count += 1;
    }

    tracing::info!(
        "Reconciled checklist {}: {} created, {} updated, {} deleted",
        checklist_id,
        created_count,
        updated_count,
        deleted_count
    );

    Ok(ReconcileResult {
        items,
        created_count,
        updated_count,
        deleted_count,
    })
}
