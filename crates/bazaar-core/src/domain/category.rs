//! Category entity.

use crate::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Fields for a category that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    /// Creates a category draft with just a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Partial update for a category. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Category {
    /// Builds a persisted category from a draft and its assigned id.
    #[must_use]
    pub fn from_new(id: CategoryId, new: NewCategory) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
        }
    }

    /// Merges a partial update into this category.
    pub fn apply(&mut self, changes: CategoryChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
    }
}
