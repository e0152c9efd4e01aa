//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::company::Company;
use crate::models::role::Role;
use crate::query::{FilterField, Matching};

/// A user account scoped to one company. The credential is stored as an
/// Argon2id hash and never leaves the core; outward DTOs have no
/// credential field. Soft-deleted users stay deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,
    pub full_name: String,
    /// Unique among non-deleted users of the same company.
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    /// Owning company, eagerly loaded on every read path.
    pub company: Company,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Write payload for user creation. `password_hash` is already hashed;
/// the role set is persisted with the user row in one transaction.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: Uuid,
    pub company_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub role_ids: Vec<Uuid>,
}

/// Partial update payload. `None` leaves a field untouched;
/// `role_ids: Some(..)` replaces the full role set.
#[derive(Debug, Clone, Default)]
pub struct UserChange {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub enabled: Option<bool>,
    pub role_ids: Option<Vec<Uuid>>,
}

/// Filter keys accepted by user list queries.
pub const FILTERS: &[FilterField] = &[
    FilterField {
        key: "name",
        column: "full_name",
        matching: Matching::Contains,
    },
    FilterField {
        key: "email",
        column: "email",
        matching: Matching::Exact,
    },
    FilterField {
        key: "enabled",
        column: "enabled",
        matching: Matching::Flag,
    },
];
