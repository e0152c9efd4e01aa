//! SurrealDB implementation of [`PermissionRepository`].
//!
//! Permissions are the only entity without a soft-delete state: delete
//! removes the row for good, together with any `grants` edges pointing
//! at it.

use chrono::{DateTime, Utc};
use palisade_core::error::PalisadeResult;
use palisade_core::models::permission::{
    FILTERS, Permission, PermissionChange, PermissionDraft,
};
use palisade_core::query::{PageInfo, PageRequest, Paginated};
use palisade_core::repository::{FilterMap, PermissionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify, classify_for};
use crate::repository::{CountRow, IdRow, bind_filters, filter_conditions, parse_id, record_refs};

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    record_id: String,
    company_id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        Ok(Permission {
            id: parse_id(&self.record_id, "permission")?,
            company_id: parse_id(&self.company_id, "company")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, draft: &PermissionDraft) -> PalisadeResult<Permission> {
        let id_str = draft.id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('permission', $id) SET \
                 company_id = $company_id, name = $name, \
                 description = $description",
            )
            .bind(("id", id_str))
            .bind(("company_id", draft.company_id.to_string()))
            .bind(("name", draft.name.clone()))
            .bind(("description", draft.description.clone()))
            .await
            .map_err(classify)?;
        result.check().map_err(classify)?;

        self.get_by_id(draft.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PalisadeResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('permission', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "permission",
            id: id_str,
        })?;

        Ok(row.try_into_permission()?)
    }

    async fn name_exists(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> PalisadeResult<bool> {
        let exclusion = if exclude.is_some() {
            " AND id != type::record('permission', $exclude)"
        } else {
            ""
        };

        let mut builder = self
            .db
            .query(format!(
                "SELECT count() AS total FROM permission \
                 WHERE company_id = $company_id AND name = $name{exclusion} \
                 GROUP ALL"
            ))
            .bind(("company_id", company_id.to_string()))
            .bind(("name", name.to_string()));
        if let Some(exclude) = exclude {
            builder = builder.bind(("exclude", exclude.to_string()));
        }

        let mut result = builder.await.map_err(classify)?;
        let rows: Vec<CountRow> = result.take(0).map_err(classify)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn get_by_ids(
        &self,
        ids: &[Uuid],
        company_id: Option<Uuid>,
    ) -> PalisadeResult<Vec<Permission>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let refs = record_refs("permission", &id_strs);
        let scope = if company_id.is_some() {
            " AND company_id = $company_id"
        } else {
            ""
        };

        let mut builder = self.db.query(format!(
            "SELECT meta::id(id) AS record_id, * FROM permission \
             WHERE id IN [{refs}]{scope} \
             ORDER BY name ASC"
        ));
        if let Some(company_id) = company_id {
            builder = builder.bind(("company_id", company_id.to_string()));
        }

        let mut result = builder.await.map_err(classify)?;
        let rows: Vec<PermissionRow> = result.take(0).map_err(classify)?;

        Ok(rows
            .into_iter()
            .map(PermissionRow::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn update(&self, id: Uuid, change: &PermissionChange) -> PalisadeResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('permission', $id) SET \
                 name = $name, description = $description, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", change.name.clone()))
            .bind(("description", change.description.clone()))
            .await
            .map_err(classify)?;

        let touched: Vec<IdRow> = result.take(0).map_err(classify)?;
        if touched.is_empty() {
            return Err(DbError::NotFound {
                entity: "permission",
                id: id_str,
            }
            .into());
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        let id_str = id.to_string();

        // Guard first: DELETE reports nothing back, and the grants
        // cleanup must not run for a permission that never existed.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             LET $found = (SELECT id FROM type::record('permission', $id));\n\
             IF array::len($found) = 0 {{ THROW \"permission not found\" }};\n\
             DELETE grants WHERE out = permission:`{id_str}`;\n\
             DELETE type::record('permission', $id);\n\
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .await
            .map_err(|e| classify_for(e, "permission", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "permission", &id_str))?;

        Ok(())
    }

    async fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
        company_id: Uuid,
    ) -> PalisadeResult<Paginated<Permission>> {
        let clauses = palisade_core::query::resolve_filters(filters, FILTERS);
        let mut conditions = vec!["company_id = $company_id".to_string()];
        conditions.extend(filter_conditions(&clauses));
        let where_sql = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM permission \
             WHERE {where_sql} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM permission \
             WHERE {where_sql} \
             ORDER BY created_at ASC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("company_id", company_id.to_string()))
            .bind(("limit", page.limit()))
            .bind(("offset", page.offset()));
        builder = bind_filters(builder, clauses);

        let mut result = builder.await.map_err(classify)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(classify)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<PermissionRow> = result.take(1).map_err(classify)?;

        let items = rows
            .into_iter()
            .map(PermissionRow::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(Paginated {
            items,
            page_info: PageInfo::new(page, total),
        })
    }
}
