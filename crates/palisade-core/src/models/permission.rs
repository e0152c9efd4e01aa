//! Permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::{FilterField, Matching};

/// A named capability scoped to one company. Permission names are stored
/// trimmed and upper-cased, and are unique within their company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Write payload for permission creation.
#[derive(Debug, Clone)]
pub struct PermissionDraft {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Full-replace update payload; the owning company never changes.
#[derive(Debug, Clone)]
pub struct PermissionChange {
    pub name: String,
    pub description: Option<String>,
}

/// Filter keys accepted by permission list queries.
pub const FILTERS: &[FilterField] = &[FilterField {
    key: "name",
    column: "name",
    matching: Matching::Contains,
}];
