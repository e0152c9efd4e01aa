//! SurrealDB implementation of [`CompanyRepository`].
//!
//! Company writes touch up to three tables (the row itself, its address,
//! its contacts) and therefore always run as a single transaction.
//! Children are replaced wholesale on update: the old rows are hard
//! deleted and the payload's rows inserted, so no stale child can
//! outlive an update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use palisade_core::error::PalisadeResult;
use palisade_core::models::company::{
    Company, CompanyAddress, CompanyContact, CompanyDraft, FILTERS,
};
use palisade_core::query::{PageInfo, PageRequest, Paginated};
use palisade_core::repository::{CompanyRepository, FilterMap};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify, classify_for};
use crate::repository::{CountRow, IdRow, bind_filters, filter_conditions, parse_id};

#[derive(Debug, SurrealValue)]
struct CompanyRow {
    record_id: String,
    name: String,
    legal_name: String,
    description: Option<String>,
    tax_id: String,
    email: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct AddressRow {
    record_id: String,
    company_id: String,
    street: String,
    street_number: Option<String>,
    street_complement: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

#[derive(Debug, SurrealValue)]
struct ContactRow {
    record_id: String,
    company_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    tax_id: Option<String>,
}

impl CompanyRow {
    fn into_company(
        self,
        address: Option<AddressRow>,
        contacts: Vec<ContactRow>,
    ) -> Result<Company, DbError> {
        Ok(Company {
            id: parse_id(&self.record_id, "company")?,
            name: self.name,
            legal_name: self.legal_name,
            description: self.description,
            tax_id: self.tax_id,
            email: self.email,
            enabled: self.enabled,
            address: address.map(AddressRow::try_into_address).transpose()?,
            contacts: contacts
                .into_iter()
                .map(ContactRow::try_into_contact)
                .collect::<Result<Vec<_>, DbError>>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

impl AddressRow {
    fn try_into_address(self) -> Result<CompanyAddress, DbError> {
        Ok(CompanyAddress {
            id: parse_id(&self.record_id, "address")?,
            company_id: parse_id(&self.company_id, "company")?,
            street: self.street,
            street_number: self.street_number,
            street_complement: self.street_complement,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
        })
    }
}

impl ContactRow {
    fn try_into_contact(self) -> Result<CompanyContact, DbError> {
        Ok(CompanyContact {
            id: parse_id(&self.record_id, "contact")?,
            company_id: parse_id(&self.company_id, "company")?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            tax_id: self.tax_id,
        })
    }
}

/// SurrealDB implementation of the Company repository.
#[derive(Clone)]
pub struct SurrealCompanyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCompanyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Statements that write the address and contact children; shared by
    /// create and update. Child values bind under `address_*` and
    /// `contact_{i}_*`.
    fn child_statements(draft: &CompanyDraft) -> Vec<String> {
        let mut statements = Vec::new();
        if draft.address.is_some() {
            statements.push(
                "CREATE type::record('company_address', $address_id) SET \
                 company_id = $id, street = $street, \
                 street_number = $street_number, \
                 street_complement = $street_complement, \
                 city = $city, state = $state, \
                 postal_code = $postal_code, country = $country"
                    .to_string(),
            );
        }
        for i in 0..draft.contacts.len() {
            statements.push(format!(
                "CREATE type::record('company_contact', $contact_{i}_id) SET \
                 company_id = $id, name = $contact_{i}_name, \
                 email = $contact_{i}_email, phone = $contact_{i}_phone, \
                 tax_id = $contact_{i}_tax_id"
            ));
        }
        statements
    }

    /// Load address and contacts for one company row.
    async fn hydrate(&self, row: CompanyRow) -> Result<Company, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM company_address \
                 WHERE company_id = $id; \
                 SELECT meta::id(id) AS record_id, * FROM company_contact \
                 WHERE company_id = $id ORDER BY id;",
            )
            .bind(("id", row.record_id.clone()))
            .await
            .map_err(classify)?;

        let addresses: Vec<AddressRow> = result.take(0).map_err(classify)?;
        let contacts: Vec<ContactRow> = result.take(1).map_err(classify)?;
        row.into_company(addresses.into_iter().next(), contacts)
    }
}

impl<C: Connection> CompanyRepository for SurrealCompanyRepository<C> {
    async fn create(&self, draft: &CompanyDraft) -> PalisadeResult<Company> {
        let id_str = draft.id.to_string();

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "CREATE type::record('company', $id) SET \
             name = $name, legal_name = $legal_name, \
             description = $description, tax_id = $tax_id, \
             email = $email, enabled = $enabled"
                .to_string(),
        ];
        statements.extend(Self::child_statements(draft));
        statements.push("COMMIT TRANSACTION".to_string());

        let mut builder = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str))
            .bind(("name", draft.name.clone()))
            .bind(("legal_name", draft.legal_name.clone()))
            .bind(("description", draft.description.clone()))
            .bind(("tax_id", draft.tax_id.clone()))
            .bind(("email", draft.email.clone()))
            .bind(("enabled", draft.enabled));
        builder = bind_children(builder, draft);

        let result = builder.await.map_err(classify)?;
        result.check().map_err(classify)?;

        self.get_by_id(draft.id, false).await
    }

    async fn get_by_id(&self, id: Uuid, include_deleted: bool) -> PalisadeResult<Company> {
        let id_str = id.to_string();
        let scope = if include_deleted {
            ""
        } else {
            " WHERE deleted_at IS NONE"
        };

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('company', $id){scope}"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "company",
            id: id_str,
        })?;

        Ok(self.hydrate(row).await?)
    }

    async fn get_by_tax_id(&self, tax_id: &str, include_deleted: bool) -> PalisadeResult<Company> {
        let scope = if include_deleted {
            ""
        } else {
            " AND deleted_at IS NONE"
        };

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM company \
                 WHERE tax_id = $tax_id{scope}"
            ))
            .bind(("tax_id", tax_id.to_string()))
            .await
            .map_err(classify)?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company",
            id: format!("tax_id={tax_id}"),
        })?;

        Ok(self.hydrate(row).await?)
    }

    async fn exists(&self, id: Uuid) -> PalisadeResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM company \
                 WHERE id = type::record('company', $id) \
                 AND deleted_at IS NONE GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(classify)?;

        let rows: Vec<CountRow> = result.take(0).map_err(classify)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update(&self, draft: &CompanyDraft) -> PalisadeResult<Company> {
        let id_str = draft.id.to_string();

        // created_at is deliberately not in the SET list; the original
        // creation timestamp survives every update.
        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "LET $existing = (SELECT id FROM type::record('company', $id) \
             WHERE deleted_at IS NONE)"
                .to_string(),
            "IF array::len($existing) = 0 { THROW \"company not found\" }".to_string(),
            "UPDATE type::record('company', $id) SET \
             name = $name, legal_name = $legal_name, \
             description = $description, tax_id = $tax_id, \
             email = $email, enabled = $enabled, \
             updated_at = time::now()"
                .to_string(),
            "DELETE company_address WHERE company_id = $id".to_string(),
            "DELETE company_contact WHERE company_id = $id".to_string(),
        ];
        statements.extend(Self::child_statements(draft));
        statements.push("COMMIT TRANSACTION".to_string());

        let mut builder = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str.clone()))
            .bind(("name", draft.name.clone()))
            .bind(("legal_name", draft.legal_name.clone()))
            .bind(("description", draft.description.clone()))
            .bind(("tax_id", draft.tax_id.clone()))
            .bind(("email", draft.email.clone()))
            .bind(("enabled", draft.enabled));
        builder = bind_children(builder, draft);

        let result = builder
            .await
            .map_err(|e| classify_for(e, "company", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "company", &id_str))?;

        self.get_by_id(draft.id, false).await
    }

    async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('company', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at IS NONE \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let touched: Vec<IdRow> = result.take(0).map_err(classify)?;
        if touched.is_empty() {
            return Err(DbError::NotFound {
                entity: "company",
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> PalisadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('company', $id) SET \
                 deleted_at = NONE, updated_at = time::now() \
                 WHERE deleted_at IS NOT NONE \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let touched: Vec<IdRow> = result.take(0).map_err(classify)?;
        if touched.is_empty() {
            return Err(DbError::NotFound {
                entity: "company",
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
    ) -> PalisadeResult<Paginated<Company>> {
        let clauses = palisade_core::query::resolve_filters(filters, FILTERS);
        let mut conditions = vec!["deleted_at IS NONE".to_string()];
        conditions.extend(filter_conditions(&clauses));
        let where_sql = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM company \
             WHERE {where_sql} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM company \
             WHERE {where_sql} \
             ORDER BY created_at ASC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("limit", page.limit()))
            .bind(("offset", page.offset()));
        builder = bind_filters(builder, clauses);

        let mut result = builder.await.map_err(classify)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(classify)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<CompanyRow> = result.take(1).map_err(classify)?;

        // Batch-load children for the whole page.
        let ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM company_address \
                 WHERE company_id IN $ids; \
                 SELECT meta::id(id) AS record_id, * FROM company_contact \
                 WHERE company_id IN $ids ORDER BY id;",
            )
            .bind(("ids", ids))
            .await
            .map_err(classify)?;

        let addresses: Vec<AddressRow> = result.take(0).map_err(classify)?;
        let contacts: Vec<ContactRow> = result.take(1).map_err(classify)?;

        let mut address_by_company: HashMap<String, AddressRow> = addresses
            .into_iter()
            .map(|a| (a.company_id.clone(), a))
            .collect();
        let mut contacts_by_company: HashMap<String, Vec<ContactRow>> = HashMap::new();
        for contact in contacts {
            contacts_by_company
                .entry(contact.company_id.clone())
                .or_default()
                .push(contact);
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let address = address_by_company.remove(&row.record_id);
                let contacts = contacts_by_company.remove(&row.record_id).unwrap_or_default();
                row.into_company(address, contacts)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(Paginated {
            items,
            page_info: PageInfo::new(page, total),
        })
    }
}

fn bind_children<'a, C: Connection>(
    mut builder: surrealdb::method::Query<'a, C>,
    draft: &CompanyDraft,
) -> surrealdb::method::Query<'a, C> {
    if let Some(address) = &draft.address {
        builder = builder
            .bind(("address_id", address.id.to_string()))
            .bind(("street", address.street.clone()))
            .bind(("street_number", address.street_number.clone()))
            .bind(("street_complement", address.street_complement.clone()))
            .bind(("city", address.city.clone()))
            .bind(("state", address.state.clone()))
            .bind(("postal_code", address.postal_code.clone()))
            .bind(("country", address.country.clone()));
    }
    for (i, contact) in draft.contacts.iter().enumerate() {
        builder = builder
            .bind((format!("contact_{i}_id"), contact.id.to_string()))
            .bind((format!("contact_{i}_name"), contact.name.clone()))
            .bind((format!("contact_{i}_email"), contact.email.clone()))
            .bind((format!("contact_{i}_phone"), contact.phone.clone()))
            .bind((format!("contact_{i}_tax_id"), contact.tax_id.clone()));
    }
    builder
}

