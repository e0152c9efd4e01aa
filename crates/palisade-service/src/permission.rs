//! Permission catalog service.

use palisade_core::dto::permission::{CreatePermissionDto, PermissionDto};
use palisade_core::error::{PalisadeError, PalisadeResult};
use palisade_core::id::IdGenerator;
use palisade_core::models::permission::{PermissionChange, PermissionDraft};
use palisade_core::query::{PageRequest, Paginated};
use palisade_core::repository::{CompanyRepository, FilterMap, PermissionRepository};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::normalize_name;

pub struct PermissionService<P: PermissionRepository, C: CompanyRepository> {
    repo: P,
    companies: C,
    ids: IdGenerator,
    config: ServiceConfig,
}

impl<P: PermissionRepository, C: CompanyRepository> PermissionService<P, C> {
    pub fn new(repo: P, companies: C, ids: IdGenerator, config: ServiceConfig) -> Self {
        Self {
            repo,
            companies,
            ids,
            config,
        }
    }

    pub async fn create(&self, dto: CreatePermissionDto) -> PalisadeResult<PermissionDto> {
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

        let draft = PermissionDraft {
            id: self.ids.new_id(),
            company_id: dto.company_id,
            name,
            description: dto.description,
        };
        let permission = self
            .repo
            .create(&draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create permission"))?;

        Ok(PermissionDto::from(permission))
    }

    pub async fn update(&self, dto: CreatePermissionDto, id: Uuid) -> PalisadeResult<PermissionDto> {
        dto.validate()?;

        let existing = self.repo.get_by_id(id).await?;

        // Re-check uniqueness only when the canonical name changed,
        // ignoring the row being updated.
        let name = normalize_name(&dto.name);
        if name != existing.name
            && self
                .repo
                .name_exists(existing.company_id, &name, Some(id))
                .await?
        {
            return Err(PalisadeError::NameInUse { name });
        }

        let change = PermissionChange {
            name,
            description: dto.description,
        };
        let permission = self
            .repo
            .update(id, &change)
            .await
            .inspect_err(|e| tracing::error!(error = %e, permission_id = %id, "failed to update permission"))?;

        Ok(PermissionDto::from(permission))
    }

    pub async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        self.repo.delete(id).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> PalisadeResult<PermissionDto> {
        let permission = self.repo.get_by_id(id).await?;
        Ok(PermissionDto::from(permission))
    }

    /// Resolve a set of permission IDs, optionally asserting that all
    /// of them belong to one company. Callers treat a result smaller
    /// than the request as a referential failure.
    pub async fn find_by_ids(
        &self,
        ids: &[Uuid],
        company_id: Option<Uuid>,
    ) -> PalisadeResult<Vec<PermissionDto>> {
        let permissions = self.repo.get_by_ids(ids, company_id).await?;
        Ok(permissions.into_iter().map(PermissionDto::from).collect())
    }

    pub async fn find_all(
        &self,
        filters: &FilterMap,
        page: i64,
        page_size: i64,
        company_id: Uuid,
    ) -> PalisadeResult<Paginated<PermissionDto>> {
        let page = PageRequest::new(page, page_size, self.config.default_page_size);
        let permissions = self.repo.list(filters, page, company_id).await?;
        Ok(permissions.map(PermissionDto::from))
    }
}
