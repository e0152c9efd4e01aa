//! SurrealDB implementation of [`RoleRepository`].
//!
//! A role and its `grants` edges are written as one transaction. Every
//! write re-checks inside the transaction that each granted permission
//! exists in the role's own company; a shortfall throws and cancels the
//! whole write, so a role row can never outlive a failed association.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use palisade_core::error::PalisadeResult;
use palisade_core::models::permission::Permission;
use palisade_core::models::role::{FILTERS, Role, RoleChange, RoleDraft};
use palisade_core::query::{PageInfo, PageRequest, Paginated};
use palisade_core::repository::{FilterMap, PermissionRepository, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify, classify_for};
use crate::repository::{
    CountRow, EdgeRow, IdRow, SurrealPermissionRepository, bind_filters, dedup_ids,
    filter_conditions, parse_id, record_refs,
};

#[derive(Debug, SurrealValue)]
struct RoleRow {
    record_id: String,
    company_id: String,
    name: String,
    description: Option<String>,
    can_edit: bool,
    can_delete: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl RoleRow {
    fn into_role(self, permissions: Vec<Permission>) -> Result<Role, DbError> {
        Ok(Role {
            id: parse_id(&self.record_id, "role")?,
            company_id: parse_id(&self.company_id, "company")?,
            name: self.name,
            description: self.description,
            can_edit: self.can_edit,
            can_delete: self.can_delete,
            is_admin: self.is_admin,
            permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
    permissions: SurrealPermissionRepository<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        let permissions = SurrealPermissionRepository::new(db.clone());
        Self { db, permissions }
    }

    /// `RELATE` statements for one grant edge per permission, plus the
    /// commit-time guard that every target exists in `$company_id`'s
    /// scope (or the company resolved into `$existing` for updates).
    fn grant_statements(role_id: &str, permission_ids: &[String], company_expr: &str) -> Vec<String> {
        let mut statements: Vec<String> = permission_ids
            .iter()
            .map(|pid| format!("RELATE role:`{role_id}` -> grants -> permission:`{pid}`"))
            .collect();
        let refs = record_refs("permission", permission_ids);
        let expected = permission_ids.len();
        statements.push(format!(
            "LET $targets = (SELECT VALUE id FROM permission \
             WHERE id IN [{refs}] AND company_id = {company_expr})"
        ));
        statements.push(format!(
            "IF array::len($targets) != {expected} {{ THROW \"permissions unresolved\" }}"
        ));
        statements
    }

    /// Load permissions for a set of role ids, grouped by role.
    async fn load_permissions_map(
        &self,
        role_ids: &[String],
    ) -> PalisadeResult<HashMap<String, Vec<Permission>>> {
        let mut map: HashMap<String, Vec<Permission>> = HashMap::new();
        if role_ids.is_empty() {
            return Ok(map);
        }

        let refs = record_refs("role", role_ids);
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(in) AS src, meta::id(out) AS dst \
                 FROM grants WHERE in IN [{refs}]"
            ))
            .await
            .map_err(classify)?;
        let edges: Vec<EdgeRow> = result.take(0).map_err(classify)?;

        let mut permission_ids: Vec<Uuid> = Vec::new();
        for edge in &edges {
            let id = parse_id(&edge.dst, "permission")?;
            if !permission_ids.contains(&id) {
                permission_ids.push(id);
            }
        }

        let permissions = self.permissions.get_by_ids(&permission_ids, None).await?;
        let by_id: HashMap<String, Permission> = permissions
            .into_iter()
            .map(|p| (p.id.to_string(), p))
            .collect();

        for edge in edges {
            if let Some(permission) = by_id.get(&edge.dst) {
                map.entry(edge.src).or_default().push(permission.clone());
            }
        }
        Ok(map)
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, draft: &RoleDraft) -> PalisadeResult<Role> {
        let id_str = draft.id.to_string();
        let permission_ids = dedup_ids(&draft.permission_ids);

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "CREATE type::record('role', $id) SET \
             company_id = $company_id, name = $name, \
             description = $description, can_edit = $can_edit, \
             can_delete = $can_delete, is_admin = $is_admin"
                .to_string(),
        ];
        statements.extend(Self::grant_statements(
            &id_str,
            &permission_ids,
            "$company_id",
        ));
        statements.push("COMMIT TRANSACTION".to_string());

        let result = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str))
            .bind(("company_id", draft.company_id.to_string()))
            .bind(("name", draft.name.clone()))
            .bind(("description", draft.description.clone()))
            .bind(("can_edit", draft.can_edit))
            .bind(("can_delete", draft.can_delete))
            .bind(("is_admin", draft.is_admin))
            .await
            .map_err(classify)?;
        result.check().map_err(classify)?;

        self.get_by_id(draft.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PalisadeResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('role', $id) \
                 WHERE deleted_at IS NONE; \
                 SELECT VALUE meta::id(out) FROM grants \
                 WHERE in = type::record('role', $id);",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "role",
            id: id_str,
        })?;

        let permission_id_strs: Vec<String> = result.take(1).map_err(classify)?;
        let permission_ids = permission_id_strs
            .iter()
            .map(|s| parse_id(s, "permission"))
            .collect::<Result<Vec<_>, DbError>>()?;
        let permissions = self.permissions.get_by_ids(&permission_ids, None).await?;

        Ok(row.into_role(permissions)?)
    }

    async fn name_exists(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> PalisadeResult<bool> {
        let exclusion = if exclude.is_some() {
            " AND id != type::record('role', $exclude)"
        } else {
            ""
        };

        let mut builder = self
            .db
            .query(format!(
                "SELECT count() AS total FROM role \
                 WHERE company_id = $company_id AND name = $name \
                 AND deleted_at IS NONE{exclusion} GROUP ALL"
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

    async fn get_by_ids(&self, ids: &[Uuid], company_id: Option<Uuid>) -> PalisadeResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs = dedup_ids(ids);
        let refs = record_refs("role", &id_strs);
        let scope = if company_id.is_some() {
            " AND company_id = $company_id"
        } else {
            ""
        };

        let mut builder = self.db.query(format!(
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE id IN [{refs}] AND deleted_at IS NONE{scope} \
             ORDER BY created_at ASC"
        ));
        if let Some(company_id) = company_id {
            builder = builder.bind(("company_id", company_id.to_string()));
        }

        let mut result = builder.await.map_err(classify)?;
        let rows: Vec<RoleRow> = result.take(0).map_err(classify)?;

        let found_ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut permissions_by_role = self.load_permissions_map(&found_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let permissions = permissions_by_role.remove(&row.record_id).unwrap_or_default();
                row.into_role(permissions)
            })
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn update(&self, id: Uuid, change: &RoleChange) -> PalisadeResult<Role> {
        let id_str = id.to_string();
        let permission_ids = dedup_ids(&change.permission_ids);

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "LET $existing = (SELECT id, company_id FROM type::record('role', $id) \
             WHERE deleted_at IS NONE)"
                .to_string(),
            "IF array::len($existing) = 0 { THROW \"role not found\" }".to_string(),
            "UPDATE type::record('role', $id) SET \
             name = $name, description = $description, \
             can_edit = $can_edit, can_delete = $can_delete, \
             is_admin = $is_admin, updated_at = time::now()"
                .to_string(),
            "DELETE grants WHERE in = type::record('role', $id)".to_string(),
        ];
        statements.extend(Self::grant_statements(
            &id_str,
            &permission_ids,
            "$existing[0].company_id",
        ));
        statements.push("COMMIT TRANSACTION".to_string());

        let result = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str.clone()))
            .bind(("name", change.name.clone()))
            .bind(("description", change.description.clone()))
            .bind(("can_edit", change.can_edit))
            .bind(("can_delete", change.can_delete))
            .bind(("is_admin", change.is_admin))
            .await
            .map_err(|e| classify_for(e, "role", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "role", &id_str))?;

        self.get_by_id(id).await
    }

    async fn associate_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> PalisadeResult<()> {
        let id_str = role_id.to_string();
        let permission_ids = dedup_ids(permission_ids);
        let refs = record_refs("permission", &permission_ids);

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "LET $existing = (SELECT id, company_id FROM type::record('role', $id) \
             WHERE deleted_at IS NONE)"
                .to_string(),
            "IF array::len($existing) = 0 { THROW \"role not found\" }".to_string(),
            // Re-granting an already granted permission must not
            // duplicate the edge.
            format!(
                "DELETE grants WHERE in = type::record('role', $id) \
                 AND out IN [{refs}]"
            ),
        ];
        statements.extend(Self::grant_statements(
            &id_str,
            &permission_ids,
            "$existing[0].company_id",
        ));
        statements.push("COMMIT TRANSACTION".to_string());

        let result = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str.clone()))
            .await
            .map_err(|e| classify_for(e, "role", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "role", &id_str))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('role', $id) SET \
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
                entity: "role",
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
        company_id: Uuid,
    ) -> PalisadeResult<Paginated<Role>> {
        let clauses = palisade_core::query::resolve_filters(filters, FILTERS);
        let mut conditions = vec![
            "company_id = $company_id".to_string(),
            "deleted_at IS NONE".to_string(),
        ];
        conditions.extend(filter_conditions(&clauses));
        let where_sql = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM role \
             WHERE {where_sql} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM role \
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
        let rows: Vec<RoleRow> = result.take(1).map_err(classify)?;

        let ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut permissions_by_role = self.load_permissions_map(&ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let permissions = permissions_by_role.remove(&row.record_id).unwrap_or_default();
                row.into_role(permissions)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(Paginated {
            items,
            page_info: PageInfo::new(page, total),
        })
    }
}
