use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single task entry belonging to one checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub checklist_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields written on every item create or update. Timestamps are
/// stamped by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub checklist_id: String,
}

/// One entry of the target list handed to item reconciliation.
///
/// A present, non-empty `id` asks for an update of that item; anything else
/// asks for a new item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl ItemSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The client-supplied id, treating `""` the same as absent.
    pub fn requested_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn fields_for(&self, checklist_id: &str) -> ItemFields {
        ItemFields {
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            checklist_id: checklist_id.to_string(),
        }
    }
}

/// Body of `PUT /checklists/{id}/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemsRequest {
    pub items: Vec<ItemSpec>,
}

/// Response of `PUT /checklists/{id}/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemsResponse {
    pub message: String,
    pub items: Vec<ChecklistItem>,
    pub created_count: usize,
    pub updated_count: usize,
    pub deleted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_id_ignores_empty_and_null() {
        let null: ItemSpec = serde_json::from_str(r#"{"id": null, "title": "a"}"#).unwrap();
        let empty: ItemSpec = serde_json::from_str(r#"{"id": "", "title": "b"}"#).unwrap();
        let absent: ItemSpec = serde_json::from_str(r#"{"title": "c"}"#).unwrap();
        let given: ItemSpec = serde_json::from_str(r#"{"id": "x1", "title": "d"}"#).unwrap();

        assert_eq!(null.requested_id(), None);
        assert_eq!(empty.requested_id(), None);
        assert_eq!(absent.requested_id(), None);
        assert_eq!(given.requested_id(), Some("x1"));
    }

    #[test]
    fn test_spec_defaults() {
        let spec: ItemSpec = serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();

        assert!(!spec.completed);
        assert!(spec.description.is_none());
    }

    #[test]
    fn test_fields_for_binds_checklist() {
        let spec = ItemSpec::new("Pack bags")
            .with_description("the blue one")
            .completed(true);
        let fields = spec.fields_for("c9");

        assert_eq!(fields.checklist_id, "c9");
        assert_eq!(fields.title, "Pack bags");
        assert_eq!(fields.description.as_deref(), Some("the blue one"));
        assert!(fields.completed);
    }
}
