//! Company domain model.
//!
//! A company is the tenant boundary: every user, role and permission
//! belongs to exactly one company. Companies are soft-deleted and can be
//! restored while the deployment allows it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::{FilterField, Matching};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// Registered legal name, as opposed to the trading name in `name`.
    pub legal_name: String,
    pub description: Option<String>,
    /// Government tax identifier; unique among non-deleted companies.
    pub tax_id: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub address: Option<CompanyAddress>,
    pub contacts: Vec<CompanyContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One-to-one address child, replaced wholesale on company update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAddress {
    pub id: Uuid,
    pub company_id: Uuid,
    pub street: String,
    pub street_number: Option<String>,
    pub street_complement: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// One-to-many contact child, replaced wholesale on company update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyContact {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

/// Write payload for company create and full-replace update. Identifiers
/// are assigned by the caller; timestamps are set by the database.
#[derive(Debug, Clone)]
pub struct CompanyDraft {
    pub id: Uuid,
    pub name: String,
    pub legal_name: String,
    pub description: Option<String>,
    pub tax_id: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub address: Option<CompanyAddressDraft>,
    pub contacts: Vec<CompanyContactDraft>,
}

#[derive(Debug, Clone)]
pub struct CompanyAddressDraft {
    pub id: Uuid,
    pub street: String,
    pub street_number: Option<String>,
    pub street_complement: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct CompanyContactDraft {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

/// Filter keys accepted by company list queries.
pub const FILTERS: &[FilterField] = &[
    FilterField {
        key: "name",
        column: "name",
        matching: Matching::Contains,
    },
    FilterField {
        key: "legal_name",
        column: "legal_name",
        matching: Matching::Contains,
    },
    FilterField {
        key: "tax_id",
        column: "tax_id",
        matching: Matching::Exact,
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
