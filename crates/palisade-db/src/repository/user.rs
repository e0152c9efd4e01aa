//! SurrealDB implementation of [`UserRepository`].
//!
//! A user and its `has_role` edges are written as one transaction with
//! a commit-time guard that every role exists, is not deleted, and
//! belongs to the user's company. Read paths hydrate the owning company
//! (including its children) and the user's roles with their permissions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use palisade_core::error::PalisadeResult;
use palisade_core::models::company::Company;
use palisade_core::models::role::Role;
use palisade_core::models::user::{FILTERS, User, UserChange, UserDraft};
use palisade_core::query::{PageInfo, PageRequest, Paginated};
use palisade_core::repository::{CompanyRepository, FilterMap, RoleRepository, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify, classify_for};
use crate::repository::{
    CountRow, EdgeRow, IdRow, SurrealCompanyRepository, SurrealRoleRepository, bind_filters,
    dedup_ids, filter_conditions, parse_id, record_refs,
};

#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    company_id: String,
    full_name: String,
    email: String,
    password_hash: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self, company: Company, roles: Vec<Role>) -> Result<User, DbError> {
        Ok(User {
            id: parse_id(&self.record_id, "user")?,
            company_id: parse_id(&self.company_id, "company")?,
            full_name: self.full_name,
            email: self.email,
            password_hash: self.password_hash,
            enabled: self.enabled,
            company,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    companies: SurrealCompanyRepository<C>,
    roles: SurrealRoleRepository<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        let companies = SurrealCompanyRepository::new(db.clone());
        let roles = SurrealRoleRepository::new(db.clone());
        Self {
            db,
            companies,
            roles,
        }
    }

    /// `RELATE` statements for one role edge per role, plus the
    /// commit-time guard that every target is a live role of the
    /// company referenced by `company_expr`.
    fn role_statements(user_id: &str, role_ids: &[String], company_expr: &str) -> Vec<String> {
        let mut statements: Vec<String> = role_ids
            .iter()
            .map(|rid| format!("RELATE user:`{user_id}` -> has_role -> role:`{rid}`"))
            .collect();
        let refs = record_refs("role", role_ids);
        let expected = role_ids.len();
        statements.push(format!(
            "LET $targets = (SELECT VALUE id FROM role \
             WHERE id IN [{refs}] AND company_id = {company_expr} \
             AND deleted_at IS NONE)"
        ));
        statements.push(format!(
            "IF array::len($targets) != {expected} {{ THROW \"roles unresolved\" }}"
        ));
        statements
    }

    /// Hydrate a user row with its company (deleted companies included,
    /// so users of a soft-deleted tenant still read back) and roles.
    async fn hydrate(&self, row: UserRow) -> PalisadeResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(out) FROM has_role \
                 WHERE in = type::record('user', $id)",
            )
            .bind(("id", row.record_id.clone()))
            .await
            .map_err(classify)?;
        let role_id_strs: Vec<String> = result.take(0).map_err(classify)?;
        let role_ids = role_id_strs
            .iter()
            .map(|s| parse_id(s, "role"))
            .collect::<Result<Vec<_>, DbError>>()?;

        let company_id = parse_id(&row.company_id, "company")?;
        let company = self.companies.get_by_id(company_id, true).await?;
        let roles = self.roles.get_by_ids(&role_ids, None).await?;

        Ok(row.into_user(company, roles)?)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, draft: &UserDraft) -> PalisadeResult<User> {
        let id_str = draft.id.to_string();
        let role_ids = dedup_ids(&draft.role_ids);

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "CREATE type::record('user', $id) SET \
             company_id = $company_id, full_name = $full_name, \
             email = $email, password_hash = $password_hash, \
             enabled = $enabled"
                .to_string(),
        ];
        statements.extend(Self::role_statements(&id_str, &role_ids, "$company_id"));
        statements.push("COMMIT TRANSACTION".to_string());

        let result = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str))
            .bind(("company_id", draft.company_id.to_string()))
            .bind(("full_name", draft.full_name.clone()))
            .bind(("email", draft.email.clone()))
            .bind(("password_hash", draft.password_hash.clone()))
            .bind(("enabled", draft.enabled))
            .await
            .map_err(classify)?;
        result.check().map_err(classify)?;

        self.get_by_id(draft.id).await
    }

    async fn get_by_id(&self, id: Uuid) -> PalisadeResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user', $id) \
                 WHERE deleted_at IS NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(classify)?;

        let rows: Vec<UserRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: id_str,
        })?;

        self.hydrate(row).await
    }

    async fn get_by_email(&self, company_id: Uuid, email: &str) -> PalisadeResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE company_id = $company_id AND email = $email \
                 AND deleted_at IS NONE",
            )
            .bind(("company_id", company_id.to_string()))
            .bind(("email", email.to_string()))
            .await
            .map_err(classify)?;

        let rows: Vec<UserRow> = result.take(0).map_err(classify)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user",
            id: format!("email={email}"),
        })?;

        self.hydrate(row).await
    }

    async fn email_exists(
        &self,
        company_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> PalisadeResult<bool> {
        let exclusion = if exclude.is_some() {
            " AND id != type::record('user', $exclude)"
        } else {
            ""
        };

        let mut builder = self
            .db
            .query(format!(
                "SELECT count() AS total FROM user \
                 WHERE company_id = $company_id AND email = $email \
                 AND deleted_at IS NONE{exclusion} GROUP ALL"
            ))
            .bind(("company_id", company_id.to_string()))
            .bind(("email", email.to_string()));
        if let Some(exclude) = exclude {
            builder = builder.bind(("exclude", exclude.to_string()));
        }

        let mut result = builder.await.map_err(classify)?;
        let rows: Vec<CountRow> = result.take(0).map_err(classify)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update(&self, id: Uuid, change: &UserChange) -> PalisadeResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if change.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if change.email.is_some() {
            sets.push("email = $email");
        }
        if change.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if change.enabled.is_some() {
            sets.push("enabled = $enabled");
        }
        sets.push("updated_at = time::now()");

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "LET $existing = (SELECT id, company_id FROM type::record('user', $id) \
             WHERE deleted_at IS NONE)"
                .to_string(),
            "IF array::len($existing) = 0 { THROW \"user not found\" }".to_string(),
            format!("UPDATE type::record('user', $id) SET {}", sets.join(", ")),
        ];
        if let Some(role_ids) = &change.role_ids {
            let role_ids = dedup_ids(role_ids);
            statements.push("DELETE has_role WHERE in = type::record('user', $id)".to_string());
            statements.extend(Self::role_statements(
                &id_str,
                &role_ids,
                "$existing[0].company_id",
            ));
        }
        statements.push("COMMIT TRANSACTION".to_string());

        let mut builder = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str.clone()));
        if let Some(full_name) = &change.full_name {
            builder = builder.bind(("full_name", full_name.clone()));
        }
        if let Some(email) = &change.email {
            builder = builder.bind(("email", email.clone()));
        }
        if let Some(password_hash) = &change.password_hash {
            builder = builder.bind(("password_hash", password_hash.clone()));
        }
        if let Some(enabled) = change.enabled {
            builder = builder.bind(("enabled", enabled));
        }

        let result = builder
            .await
            .map_err(|e| classify_for(e, "user", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "user", &id_str))?;

        self.get_by_id(id).await
    }

    async fn associate_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> PalisadeResult<()> {
        let id_str = user_id.to_string();
        let role_ids = dedup_ids(role_ids);
        let refs = record_refs("role", &role_ids);

        let mut statements = vec![
            "BEGIN TRANSACTION".to_string(),
            "LET $existing = (SELECT id, company_id FROM type::record('user', $id) \
             WHERE deleted_at IS NONE)"
                .to_string(),
            "IF array::len($existing) = 0 { THROW \"user not found\" }".to_string(),
            // Re-assigning an already assigned role must not duplicate
            // the edge.
            format!(
                "DELETE has_role WHERE in = type::record('user', $id) \
                 AND out IN [{refs}]"
            ),
        ];
        statements.extend(Self::role_statements(
            &id_str,
            &role_ids,
            "$existing[0].company_id",
        ));
        statements.push("COMMIT TRANSACTION".to_string());

        let result = self
            .db
            .query(statements.join(";\n") + ";")
            .bind(("id", id_str.clone()))
            .await
            .map_err(|e| classify_for(e, "user", &id_str))?;
        result
            .check()
            .map_err(|e| classify_for(e, "user", &id_str))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PalisadeResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
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
                entity: "user",
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
    ) -> PalisadeResult<Paginated<User>> {
        let clauses = palisade_core::query::resolve_filters(filters, FILTERS);
        let mut conditions = vec![
            "company_id = $company_id".to_string(),
            "deleted_at IS NONE".to_string(),
        ];
        conditions.extend(filter_conditions(&clauses));
        let where_sql = conditions.join(" AND ");

        let query = format!(
            "SELECT count() AS total FROM user \
             WHERE {where_sql} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM user \
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
        let rows: Vec<UserRow> = result.take(1).map_err(classify)?;

        if rows.is_empty() {
            return Ok(Paginated {
                items: Vec::new(),
                page_info: PageInfo::new(page, total),
            });
        }

        // One company fetch and one edge sweep serve the whole page.
        let company = self.companies.get_by_id(company_id, true).await?;

        let user_ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let refs = record_refs("user", &user_ids);
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(in) AS src, meta::id(out) AS dst \
                 FROM has_role WHERE in IN [{refs}]"
            ))
            .await
            .map_err(classify)?;
        let edges: Vec<EdgeRow> = result.take(0).map_err(classify)?;

        let mut role_ids: Vec<Uuid> = Vec::new();
        for edge in &edges {
            let id = parse_id(&edge.dst, "role")?;
            if !role_ids.contains(&id) {
                role_ids.push(id);
            }
        }
        let roles = self.roles.get_by_ids(&role_ids, None).await?;
        let roles_by_id: HashMap<String, Role> =
            roles.into_iter().map(|r| (r.id.to_string(), r)).collect();

        let mut roles_by_user: HashMap<String, Vec<Role>> = HashMap::new();
        for edge in edges {
            if let Some(role) = roles_by_id.get(&edge.dst) {
                roles_by_user.entry(edge.src).or_default().push(role.clone());
            }
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let roles = roles_by_user.remove(&row.record_id).unwrap_or_default();
                row.into_user(company.clone(), roles)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(Paginated {
            items,
            page_info: PageInfo::new(page, total),
        })
    }
}
