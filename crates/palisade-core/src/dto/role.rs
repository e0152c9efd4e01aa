//! Role DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::permission::PermissionDto;
use crate::dto::{max_len, required};
use crate::error::PalisadeResult;
use crate::models::role::Role;

/// Inbound payload for role create and full-replace update.
///
/// An empty `permission_ids` list passes validation here; the role
/// service rejects it with its own error so the transport layer can
/// distinguish "malformed" from "a role needs permissions".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleDto {
    pub name: String,
    pub company_id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    pub permission_ids: Vec<Uuid>,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl CreateRoleDto {
    pub fn validate(&self) -> PalisadeResult<()> {
        required(&self.name, "name")?;
        max_len(&self.name, 255, "name")?;
        if let Some(description) = &self.description {
            max_len(description, 4000, "description")?;
        }
        Ok(())
    }
}

/// Outbound role representation, permissions included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDto {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_admin: bool,
    pub permissions: Vec<PermissionDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            company_id: role.company_id,
            name: role.name,
            description: role.description,
            can_edit: role.can_edit,
            can_delete: role.can_delete,
            is_admin: role.is_admin,
            permissions: role
                .permissions
                .into_iter()
                .map(PermissionDto::from)
                .collect(),
            created_at: role.created_at,
            updated_at: role.updated_at,
            deleted_at: role.deleted_at,
        }
    }
}
