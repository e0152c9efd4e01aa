//! User DTOs.
//!
//! The outbound [`UserDto`] has no credential field of any kind: the
//! write-only property of user credentials is enforced by the type, not
//! by scrubbing a value at serialization time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::company::CompanyDto;
use crate::dto::role::RoleDto;
use crate::dto::{email_format, max_len, min_len, required};
use crate::error::{PalisadeError, PalisadeResult};
use crate::models::user::User;

/// Inbound payload for user creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_id: Uuid,
    pub role_ids: Vec<Uuid>,
    #[serde(default)]
    pub enabled: bool,
}

impl CreateUserDto {
    pub fn validate(&self) -> PalisadeResult<()> {
        required(&self.name, "name")?;
        min_len(&self.name, 2, "name")?;
        max_len(&self.name, 255, "name")?;
        required(&self.email, "email")?;
        email_format(&self.email, "email")?;
        max_len(&self.email, 150, "email")?;
        min_len(&self.password, 8, "password")?;
        if self.role_ids.is_empty() {
            return Err(PalisadeError::Validation {
                field: "role_ids",
                message: "at least one role is required".into(),
            });
        }
        Ok(())
    }
}

/// Inbound payload for partial user update. Absent fields are left
/// untouched; a present `password` is re-hashed independently of the
/// other changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub role_ids: Option<Vec<Uuid>>,
}

impl UpdateUserDto {
    pub fn validate(&self) -> PalisadeResult<()> {
        if let Some(name) = &self.name {
            required(name, "name")?;
            min_len(name, 2, "name")?;
            max_len(name, 255, "name")?;
        }
        if let Some(email) = &self.email {
            required(email, "email")?;
            email_format(email, "email")?;
            max_len(email, 150, "email")?;
        }
        if let Some(password) = &self.password {
            min_len(password, 8, "password")?;
        }
        if let Some(role_ids) = &self.role_ids {
            if role_ids.is_empty() {
                return Err(PalisadeError::Validation {
                    field: "role_ids",
                    message: "at least one role is required".into(),
                });
            }
        }
        Ok(())
    }
}

/// Outbound user representation: company and roles included, credential
/// absent by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub company: CompanyDto,
    pub roles: Vec<RoleDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            company_id: user.company_id,
            name: user.full_name,
            email: user.email,
            enabled: user.enabled,
            company: CompanyDto::from(user.company),
            roles: user.roles.into_iter().map(RoleDto::from).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_roles_and_password_length() {
        let dto = CreateUserDto {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "secret123".into(),
            company_id: Uuid::nil(),
            role_ids: vec![],
            enabled: true,
        };
        assert!(dto.validate().is_err());

        let dto = CreateUserDto {
            role_ids: vec![Uuid::nil()],
            password: "short".into(),
            ..dto
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn update_validates_only_present_fields() {
        let dto = UpdateUserDto::default();
        assert!(dto.validate().is_ok());

        let dto = UpdateUserDto {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn user_dto_wire_shape_has_no_credential_field() {
        use crate::models::company::Company;
        use crate::models::user::User;
        use chrono::Utc;

        let company = Company {
            id: Uuid::nil(),
            name: "Acme".into(),
            legal_name: "Acme Ltd".into(),
            description: None,
            tax_id: "123".into(),
            email: None,
            enabled: true,
            address: None,
            contacts: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let user = User {
            id: Uuid::nil(),
            company_id: Uuid::nil(),
            full_name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$salt$hash".into(),
            enabled: true,
            company,
            roles: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };

        let value = serde_json::to_value(UserDto::from(user)).unwrap();
        let object = value.as_object().unwrap();
        for forbidden in ["password", "password_hash", "credential"] {
            assert!(!object.contains_key(forbidden), "{forbidden} must not serialize");
        }
    }
}
