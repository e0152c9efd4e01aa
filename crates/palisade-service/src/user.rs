//! User directory service.

use palisade_core::dto::user::{CreateUserDto, UpdateUserDto, UserDto};
use palisade_core::error::{PalisadeError, PalisadeResult};
use palisade_core::id::IdGenerator;
use palisade_core::models::user::{UserChange, UserDraft};
use palisade_core::query::{PageRequest, Paginated};
use palisade_core::repository::{CompanyRepository, FilterMap, RoleRepository, UserRepository};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::password;

pub struct UserService<U, C, R>
where
    U: UserRepository,
    C: CompanyRepository,
    R: RoleRepository,
{
    repo: U,
    companies: C,
    roles: R,
    ids: IdGenerator,
    config: ServiceConfig,
}

impl<U, C, R> UserService<U, C, R>
where
    U: UserRepository,
    C: CompanyRepository,
    R: RoleRepository,
{
    pub fn new(repo: U, companies: C, roles: R, ids: IdGenerator, config: ServiceConfig) -> Self {
        Self {
            repo,
            companies,
            roles,
            ids,
            config,
        }
    }

    pub async fn create(&self, dto: CreateUserDto) -> PalisadeResult<UserDto> {
        dto.validate()?;

        // 1. The owning company must exist and be active.
        if !self.companies.exists(dto.company_id).await? {
            return Err(PalisadeError::CompanyNotFound);
        }

        // 2. The email must be free within the company.
        if self
            .repo
            .email_exists(dto.company_id, &dto.email, None)
            .await?
        {
            return Err(PalisadeError::EmailInUse { email: dto.email });
        }

        // 3. Hash the credential; the plaintext goes no further.
        let password_hash = password::hash_password(&dto.password, self.config.pepper.as_deref())?;

        // 4. Every referenced role must resolve within the company.
        let resolved = self
            .roles
            .get_by_ids(&dto.role_ids, Some(dto.company_id))
            .await?;
        if resolved.len() != dto.role_ids.len() {
            return Err(PalisadeError::ReferencedNotFound { entity: "roles" });
        }

        // 5. User row and role assignments are one atomic unit.
        let draft = UserDraft {
            id: self.ids.new_id(),
            company_id: dto.company_id,
            full_name: dto.name,
            email: dto.email,
            password_hash,
            enabled: dto.enabled,
            role_ids: resolved.iter().map(|r| r.id).collect(),
        };
        let user = self
            .repo
            .create(&draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create user"))?;

        // 6. UserDto carries no credential field, so nothing needs to be
        //    scrubbed here.
        Ok(UserDto::from(user))
    }

    pub async fn update(&self, dto: UpdateUserDto, id: Uuid) -> PalisadeResult<UserDto> {
        dto.validate()?;

        let existing = self.repo.get_by_id(id).await?;

        // An email change re-triggers the uniqueness check, ignoring the
        // user's own row.
        if let Some(email) = &dto.email {
            if email != &existing.email
                && self
                    .repo
                    .email_exists(existing.company_id, email, Some(id))
                    .await?
            {
                return Err(PalisadeError::EmailInUse {
                    email: email.clone(),
                });
            }
        }

        // A credential change is re-hashed independently of the other
        // fields.
        let password_hash = match &dto.password {
            Some(password) => Some(password::hash_password(
                password,
                self.config.pepper.as_deref(),
            )?),
            None => None,
        };

        let role_ids = match &dto.role_ids {
            Some(role_ids) => {
                let resolved = self
                    .roles
                    .get_by_ids(role_ids, Some(existing.company_id))
                    .await?;
                if resolved.len() != role_ids.len() {
                    return Err(PalisadeError::ReferencedNotFound { entity: "roles" });
                }
                Some(resolved.iter().map(|r| r.id).collect())
            }
            None => None,
        };

        let change = UserChange {
            full_name: dto.name,
            email: dto.email,
            password_hash,
            enabled: dto.enabled,
            role_ids,
        };
        let user = self
            .repo
            .update(id, &change)
            .await
            .inspect_err(|e| tracing::error!(error = %e, user_id = %id, "failed to update user"))?;

        Ok(UserDto::from(user))
    }

    pub async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        self.repo.delete(id).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> PalisadeResult<UserDto> {
        let user = self.repo.get_by_id(id).await?;
        Ok(UserDto::from(user))
    }

    pub async fn find_by_email(&self, company_id: Uuid, email: &str) -> PalisadeResult<UserDto> {
        let user = self.repo.get_by_email(company_id, email).await?;
        Ok(UserDto::from(user))
    }

    pub async fn find_all(
        &self,
        filters: &FilterMap,
        page: i64,
        page_size: i64,
        company_id: Uuid,
    ) -> PalisadeResult<Paginated<UserDto>> {
        if !self.companies.exists(company_id).await? {
            return Err(PalisadeError::CompanyNotFound);
        }

        let page = PageRequest::new(page, page_size, self.config.default_page_size);
        let users = self.repo.list(filters, page, company_id).await?;
        Ok(users.map(UserDto::from))
    }

    /// Assign additional roles to an existing user. The targets must
    /// all resolve within the user's own company.
    pub async fn associate_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> PalisadeResult<UserDto> {
        let user = self.repo.get_by_id(user_id).await?;

        let resolved = self.roles.get_by_ids(role_ids, Some(user.company_id)).await?;
        if resolved.len() != role_ids.len() {
            return Err(PalisadeError::ReferencedNotFound { entity: "roles" });
        }

        self.repo.associate_roles(user_id, role_ids).await?;

        let user = self.repo.get_by_id(user_id).await?;
        Ok(UserDto::from(user))
    }
}
