//! Role graph service.
//!
//! Role writes are where the referential rules concentrate: a role must
//! name at least one permission, and every named permission must belong
//! to the role's own company. Both are checked here before the
//! repository persists the role and its grants atomically.

use palisade_core::dto::role::{CreateRoleDto, RoleDto};
use palisade_core::error::{PalisadeError, PalisadeResult};
use palisade_core::id::IdGenerator;
use palisade_core::models::role::{RoleChange, RoleDraft};
use palisade_core::query::{PageRequest, Paginated};
use palisade_core::repository::{
    CompanyRepository, FilterMap, PermissionRepository, RoleRepository,
};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::normalize_name;

pub struct RoleService<R, P, C>
where
    R: RoleRepository,
    P: PermissionRepository,
    C: CompanyRepository,
{
    repo: R,
    permissions: P,
    companies: C,
    ids: IdGenerator,
    config: ServiceConfig,
}

impl<R, P, C> RoleService<R, P, C>
where
    R: RoleRepository,
    P: PermissionRepository,
    C: CompanyRepository,
{
    pub fn new(
        repo: R,
        permissions: P,
        companies: C,
        ids: IdGenerator,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            permissions,
            companies,
            ids,
            config,
        }
    }

    pub async fn create(&self, dto: CreateRoleDto) -> PalisadeResult<RoleDto> {
        dto.validate()?;
        let name = normalize_name(&dto.name);

        // 1. The owning company must exist and be active.
        if !self.companies.exists(dto.company_id).await? {
            return Err(PalisadeError::CompanyNotFound);
        }

        // 2. The canonical name must be free within the company.
        if self.repo.name_exists(dto.company_id, &name, None).await? {
            return Err(PalisadeError::NameInUse { name });
        }

        // 3. A role without permissions is meaningless.
        if dto.permission_ids.is_empty() {
            return Err(PalisadeError::MustHavePermissions);
        }

        // 4. Every referenced permission must resolve within the
        //    company; dangling, foreign or duplicated ids show up as a
        //    shortfall.
        let resolved = self
            .permissions
            .get_by_ids(&dto.permission_ids, Some(dto.company_id))
            .await?;
        if resolved.len() != dto.permission_ids.len() {
            return Err(PalisadeError::ReferencedNotFound {
                entity: "permissions",
            });
        }

        // 5. Role row and grants are one atomic unit.
        let draft = RoleDraft {
            id: self.ids.new_id(),
            company_id: dto.company_id,
            name,
            description: dto.description,
            can_edit: dto.can_edit,
            can_delete: dto.can_delete,
            is_admin: dto.is_admin,
            permission_ids: resolved.iter().map(|p| p.id).collect(),
        };
        let role = self
            .repo
            .create(&draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create role"))?;

        Ok(RoleDto::from(role))
    }

    pub async fn update(&self, dto: CreateRoleDto, id: Uuid) -> PalisadeResult<RoleDto> {
        dto.validate()?;

        let existing = self.repo.get_by_id(id).await?;

        // Same rules as create, against the existing row's company and
        // ignoring the row's own name.
        if !self.companies.exists(existing.company_id).await? {
            return Err(PalisadeError::CompanyNotFound);
        }

        let name = normalize_name(&dto.name);
        if name != existing.name
            && self
                .repo
                .name_exists(existing.company_id, &name, Some(id))
                .await?
        {
            return Err(PalisadeError::NameInUse { name });
        }

        if dto.permission_ids.is_empty() {
            return Err(PalisadeError::MustHavePermissions);
        }

        let resolved = self
            .permissions
            .get_by_ids(&dto.permission_ids, Some(existing.company_id))
            .await?;
        if resolved.len() != dto.permission_ids.len() {
            return Err(PalisadeError::ReferencedNotFound {
                entity: "permissions",
            });
        }

        // Full replace of both the scalar fields and the grant set.
        let change = RoleChange {
            name,
            description: dto.description,
            can_edit: dto.can_edit,
            can_delete: dto.can_delete,
            is_admin: dto.is_admin,
            permission_ids: resolved.iter().map(|p| p.id).collect(),
        };
        let role = self
            .repo
            .update(id, &change)
            .await
            .inspect_err(|e| tracing::error!(error = %e, role_id = %id, "failed to update role"))?;

        Ok(RoleDto::from(role))
    }

    pub async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        self.repo.delete(id).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> PalisadeResult<RoleDto> {
        let role = self.repo.get_by_id(id).await?;
        Ok(RoleDto::from(role))
    }

    pub async fn find_all_by_ids(&self, ids: &[Uuid]) -> PalisadeResult<Vec<RoleDto>> {
        let roles = self.repo.get_by_ids(ids, None).await?;
        Ok(roles.into_iter().map(RoleDto::from).collect())
    }

    pub async fn find_all(
        &self,
        filters: &FilterMap,
        page: i64,
        page_size: i64,
        company_id: Uuid,
    ) -> PalisadeResult<Paginated<RoleDto>> {
        let page = PageRequest::new(page, page_size, self.config.default_page_size);
        let roles = self.repo.list(filters, page, company_id).await?;
        Ok(roles.map(RoleDto::from))
    }

    /// Grant additional permissions to an existing role. The targets
    /// must all resolve within the role's own company.
    pub async fn associate_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> PalisadeResult<RoleDto> {
        let role = self.repo.get_by_id(role_id).await?;

        let resolved = self
            .permissions
            .get_by_ids(permission_ids, Some(role.company_id))
            .await?;
        if resolved.len() != permission_ids.len() {
            return Err(PalisadeError::ReferencedNotFound {
                entity: "permissions",
            });
        }

        self.repo
            .associate_permissions(role_id, permission_ids)
            .await?;

        let role = self.repo.get_by_id(role_id).await?;
        Ok(RoleDto::from(role))
    }
}
