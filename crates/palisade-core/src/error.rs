//! Error types for the Palisade system.
//!
//! Every predictable business failure is a variant of [`PalisadeError`],
//! a closed sum type. Each variant carries a stable machine-readable code
//! and an HTTP status so the transport layer can map errors exhaustively
//! without inspecting message strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PalisadeError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("company not found")]
    CompanyNotFound,

    #[error("name already in use: {name}")]
    NameInUse { name: String },

    #[error("email already in use: {email}")]
    EmailInUse { email: String },

    #[error("tax id already in use: {tax_id}")]
    TaxIdInUse { tax_id: String },

    #[error("a role must reference at least one permission")]
    MustHavePermissions,

    #[error("one or more referenced {entity} do not exist in this company")]
    ReferencedNotFound { entity: &'static str },

    #[error("validation failed for `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("conflicting write: {detail}")]
    Conflict { detail: String },

    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl PalisadeError {
    /// Stable machine-readable code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::CompanyNotFound => "company_not_found",
            Self::NameInUse { .. } => "name_in_use",
            Self::EmailInUse { .. } => "email_in_use",
            Self::TaxIdInUse { .. } => "tax_id_in_use",
            Self::MustHavePermissions => "must_have_permissions",
            Self::ReferencedNotFound { .. } => "referenced_not_found",
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// HTTP status the transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::CompanyNotFound => 404,
            Self::NameInUse { .. }
            | Self::EmailInUse { .. }
            | Self::TaxIdInUse { .. }
            | Self::Conflict { .. } => 409,
            Self::MustHavePermissions | Self::ReferencedNotFound { .. } => 422,
            Self::Validation { .. } => 400,
            Self::Internal { .. } => 500,
        }
    }
}

pub type PalisadeResult<T> = Result<T, PalisadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_are_stable() {
        let err = PalisadeError::TaxIdInUse {
            tax_id: "123".into(),
        };
        assert_eq!(err.code(), "tax_id_in_use");
        assert_eq!(err.http_status(), 409);

        let err = PalisadeError::Validation {
            field: "name",
            message: "is required".into(),
        };
        assert_eq!(err.code(), "validation_error");
        assert_eq!(err.http_status(), 400);

        let err = PalisadeError::ReferencedNotFound {
            entity: "permissions",
        };
        assert_eq!(err.http_status(), 422);
    }
}
