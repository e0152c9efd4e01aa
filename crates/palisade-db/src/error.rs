//! Database-specific error types and conversions.
//!
//! Persistence failures are classified here before they cross the crate
//! boundary: unique-index violations become `Conflict`, the in-transaction
//! referential guards become `ReferencedNotFound`, and anything
//! unrecognized is logged with full context and surfaced as `internal`.

use palisade_core::error::PalisadeError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("unique index violation: {detail}")]
    UniqueViolation { detail: String },

    #[error("referenced {entity} missing at commit time")]
    ReferenceGuard { entity: &'static str },

    #[error("malformed row: {0}")]
    Corrupt(String),
}

/// Classify a raw SurrealDB error by the failure it reports.
///
/// Unique-index violations read "index `…` already contains …"; the
/// transaction guards in the repositories `THROW` fixed marker strings.
pub(crate) fn classify(err: surrealdb::Error) -> DbError {
    let msg = err.to_string();
    if msg.contains("already contains") {
        DbError::UniqueViolation { detail: msg }
    } else if msg.contains("permissions unresolved") {
        DbError::ReferenceGuard {
            entity: "permissions",
        }
    } else if msg.contains("roles unresolved") {
        DbError::ReferenceGuard { entity: "roles" }
    } else {
        DbError::Surreal(err)
    }
}

/// Like [`classify`], but additionally maps the repositories' own
/// `THROW "<entity> not found"` guards to a typed not-found carrying the
/// id the caller was working with.
pub(crate) fn classify_for(
    err: surrealdb::Error,
    entity: &'static str,
    id: &str,
) -> DbError {
    if err.to_string().contains("not found") {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    } else {
        classify(err)
    }
}

impl From<DbError> for PalisadeError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PalisadeError::NotFound { entity, id },
            DbError::UniqueViolation { detail } => PalisadeError::Conflict { detail },
            DbError::ReferenceGuard { entity } => PalisadeError::ReferencedNotFound { entity },
            other => {
                tracing::error!(error = %other, "unclassified persistence error");
                PalisadeError::Internal {
                    detail: other.to_string(),
                }
            }
        }
    }
}
