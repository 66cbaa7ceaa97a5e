use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checklist_item::ChecklistItem;
use super::timestamp;

/// A named collection of items owned by one user.
///
/// Items are not embedded; they live in their own collection keyed by
/// `checklist_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub limit_date: Option<DateTime<Utc>>,
    pub change_color_by_date: bool,
    pub show_motivational_msg: bool,
    /// Owner
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable checklist fields, also the body of `POST /checklists`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChecklistFields {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub limit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub change_color_by_date: bool,
    #[serde(default)]
    pub show_motivational_msg: bool,
}

impl ChecklistFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update, the body of `PUT /checklists/{id}`.
///
/// Absent and `null` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChecklistPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub limit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub change_color_by_date: Option<bool>,
    #[serde(default)]
    pub show_motivational_msg: Option<bool>,
}

impl ChecklistPatch {
    /// Applies the supplied fields to `checklist` and restamps `updated_at`.
    pub fn apply_to(&self, checklist: &mut Checklist, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            checklist.name = name.clone();
        }
        if let Some(category) = &self.category {
            checklist.category = Some(category.clone());
        }
        if let Some(description) = &self.description {
            checklist.description = Some(description.clone());
        }
        if let Some(limit_date) = self.limit_date {
            checklist.limit_date = Some(limit_date);
        }
        if let Some(flag) = self.change_color_by_date {
            checklist.change_color_by_date = flag;
        }
        if let Some(flag) = self.show_motivational_msg {
            checklist.show_motivational_msg = flag;
        }
        checklist.updated_at = now;
    }
}

/// A checklist joined with its items, as returned by the read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistWithItems {
    #[serde(flatten)]
    pub checklist: Checklist,
    pub items: Vec<ChecklistItem>,
}
