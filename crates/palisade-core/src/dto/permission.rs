//! Permission DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::{max_len, required};
use crate::error::PalisadeResult;
use crate::models::permission::Permission;

/// Inbound payload for permission create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionDto {
    pub name: String,
    pub company_id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreatePermissionDto {
    pub fn validate(&self) -> PalisadeResult<()> {
        required(&self.name, "name")?;
        max_len(&self.name, 255, "name")?;
        if let Some(description) = &self.description {
            max_len(description, 4000, "description")?;
        }
        Ok(())
    }
}

/// Outbound permission representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionDto {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Permission> for PermissionDto {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id,
            company_id: permission.company_id,
            name: permission.name,
            description: permission.description,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}
