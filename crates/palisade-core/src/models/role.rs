//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::permission::Permission;
use crate::query::{FilterField, Matching};

/// A named bundle of permissions scoped to one company. A role always
/// references at least one permission of the same company. Soft-deleted
/// roles stay deleted; there is no restore path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_admin: bool,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Write payload for role creation. The permission set is persisted
/// together with the role row in one transaction.
#[derive(Debug, Clone)]
pub struct RoleDraft {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_admin: bool,
    pub permission_ids: Vec<Uuid>,
}

/// Full-replace update payload: scalar fields and the complete new
/// permission set.
#[derive(Debug, Clone)]
pub struct RoleChange {
    pub name: String,
    pub description: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_admin: bool,
    pub permission_ids: Vec<Uuid>,
}

/// Filter keys accepted by role list queries.
pub const FILTERS: &[FilterField] = &[FilterField {
    key: "name",
    column: "name",
    matching: Matching::Contains,
}];
