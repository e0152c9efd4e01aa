//! Company (tenant) directory service.

use palisade_core::dto::company::{CompanyDto, CreateCompanyDto};
use palisade_core::error::{PalisadeError, PalisadeResult};
use palisade_core::id::IdGenerator;
use palisade_core::models::company::{
    CompanyAddressDraft, CompanyContactDraft, CompanyDraft,
};
use palisade_core::query::{PageRequest, Paginated};
use palisade_core::repository::{CompanyRepository, FilterMap};
use uuid::Uuid;

use crate::config::ServiceConfig;

/// Orchestrates company onboarding, mutation and lookup.
///
/// Generic over the repository implementation so the rules have no
/// dependency on the database crate.
pub struct CompanyService<R: CompanyRepository> {
    repo: R,
    ids: IdGenerator,
    config: ServiceConfig,
}

impl<R: CompanyRepository> CompanyService<R> {
    pub fn new(repo: R, ids: IdGenerator, config: ServiceConfig) -> Self {
        Self { repo, ids, config }
    }

    pub async fn create(&self, dto: CreateCompanyDto) -> PalisadeResult<CompanyDto> {
        dto.validate()?;

        // 1. The tax id must be free among non-deleted companies;
        //    soft-deleted companies do not block reuse.
        match self.repo.get_by_tax_id(&dto.tax_id, false).await {
            Ok(_) => {
                return Err(PalisadeError::TaxIdInUse {
                    tax_id: dto.tax_id.clone(),
                });
            }
            Err(PalisadeError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // 2. Persist company and children as one unit.
        let draft = self.draft_from(dto, self.ids.new_id());
        let company = self
            .repo
            .create(&draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to create company"))?;

        Ok(CompanyDto::from(company))
    }

    pub async fn update(&self, dto: CreateCompanyDto, id: Uuid) -> PalisadeResult<CompanyDto> {
        dto.validate()?;

        // 1. The company must exist and be active.
        self.repo.get_by_id(id, false).await?;

        // 2. Re-check tax id uniqueness, ignoring the company's own row.
        match self.repo.get_by_tax_id(&dto.tax_id, false).await {
            Ok(other) if other.id != id => {
                return Err(PalisadeError::TaxIdInUse {
                    tax_id: dto.tax_id.clone(),
                });
            }
            Ok(_) | Err(PalisadeError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // 3. Full-row replace; children are rebuilt from the payload and
        //    created_at is preserved by the repository.
        let draft = self.draft_from(dto, id);
        let company = self
            .repo
            .update(&draft)
            .await
            .inspect_err(|e| tracing::error!(error = %e, company_id = %id, "failed to update company"))?;

        Ok(CompanyDto::from(company))
    }

    pub async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        self.repo.delete(id).await
    }

    /// Clear a company's soft-delete marker. Available only while the
    /// deployment permits it.
    pub async fn restore(&self, id: Uuid) -> PalisadeResult<()> {
        if !self.config.allow_restore {
            return Err(PalisadeError::Validation {
                field: "id",
                message: "restore is disabled in this environment".into(),
            });
        }
        self.repo.restore(id).await
    }

    pub async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> PalisadeResult<CompanyDto> {
        let company = self.repo.get_by_id(id, include_deleted).await?;
        Ok(CompanyDto::from(company))
    }

    pub async fn find_by_tax_id(
        &self,
        tax_id: &str,
        include_deleted: bool,
    ) -> PalisadeResult<CompanyDto> {
        let company = self.repo.get_by_tax_id(tax_id, include_deleted).await?;
        Ok(CompanyDto::from(company))
    }

    pub async fn find_all(
        &self,
        filters: &FilterMap,
        page: i64,
        page_size: i64,
    ) -> PalisadeResult<Paginated<CompanyDto>> {
        let page = PageRequest::new(page, page_size, self.config.default_page_size);
        let companies = self.repo.list(filters, page).await?;
        Ok(companies.map(CompanyDto::from))
    }

    fn draft_from(&self, dto: CreateCompanyDto, id: Uuid) -> CompanyDraft {
        CompanyDraft {
            id,
            name: dto.name,
            legal_name: dto.legal_name,
            description: dto.description,
            tax_id: dto.tax_id,
            email: dto.email,
            enabled: dto.enabled,
            address: Some(CompanyAddressDraft {
                id: self.ids.new_id(),
                street: dto.address.street,
                street_number: dto.address.street_number,
                street_complement: dto.address.street_complement,
                city: dto.address.city,
                state: dto.address.state,
                postal_code: dto.address.postal_code,
                country: dto.address.country,
            }),
            contacts: dto
                .contacts
                .into_iter()
                .map(|contact| CompanyContactDraft {
                    id: self.ids.new_id(),
                    name: contact.name,
                    email: contact.email,
                    phone: contact.phone,
                    tax_id: contact.tax_id,
                })
                .collect(),
        }
    }
}
