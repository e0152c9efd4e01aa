//! SurrealDB repository implementations.

mod company;
mod permission;
mod role;
mod user;

pub use company::SurrealCompanyRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use user::SurrealUserRepository;

use palisade_core::query::FilterClause;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// Row struct for statements that only need to report which records
/// they touched.
#[derive(Debug, SurrealValue)]
pub(crate) struct IdRow {
    pub(crate) record_id: String,
}

/// Row struct for graph-edge queries projected to plain id strings.
#[derive(Debug, SurrealValue)]
pub(crate) struct EdgeRow {
    pub(crate) src: String,
    pub(crate) dst: String,
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

/// Stringify an id set, dropping duplicates while keeping order, so a
/// repeated id cannot produce a duplicate graph edge.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let s = id.to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

/// Render a literal record-id list (`table:`id`, …`) for use inside a
/// query. RELATE and `IN` need literal record-id syntax; the embedded
/// values are UUIDs we produced ourselves, so this is safe.
pub(crate) fn record_refs(table: &str, ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("{table}:`{id}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Translate resolved filter clauses into WHERE fragments. The clause at
/// index `i` binds its value as `$f{i}`; column names come from the
/// static whitelists, never from the caller.
pub(crate) fn filter_conditions(clauses: &[FilterClause]) -> Vec<String> {
    clauses
        .iter()
        .enumerate()
        .map(|(i, clause)| match clause {
            FilterClause::Contains { column, .. } => format!(
                "string::contains(string::lowercase({column}), string::lowercase($f{i}))"
            ),
            FilterClause::Exact { column, .. } => format!("{column} = $f{i}"),
            FilterClause::Flag { column, .. } => format!("{column} = $f{i}"),
        })
        .collect()
}

/// Bind the values for clauses produced by [`filter_conditions`] under
/// their `$f{i}` parameter names.
pub(crate) fn bind_filters<'a, C: Connection>(
    mut builder: surrealdb::method::Query<'a, C>,
    clauses: Vec<FilterClause>,
) -> surrealdb::method::Query<'a, C> {
    for (i, clause) in clauses.into_iter().enumerate() {
        builder = match clause {
            FilterClause::Contains { value, .. } | FilterClause::Exact { value, .. } => {
                builder.bind((format!("f{i}"), value))
            }
            FilterClause::Flag { value, .. } => builder.bind((format!("f{i}"), value)),
        };
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::query::FilterClause;

    #[test]
    fn record_refs_renders_literal_ids() {
        let refs = record_refs("role", &["a".to_string(), "b".to_string()]);
        assert_eq!(refs, "role:`a`, role:`b`");
    }

    #[test]
    fn filter_conditions_number_their_params() {
        let clauses = vec![
            FilterClause::Contains {
                column: "name",
                value: "acme".into(),
            },
            FilterClause::Flag {
                column: "enabled",
                value: true,
            },
        ];
        let conditions = filter_conditions(&clauses);
        assert!(conditions[0].contains("$f0"));
        assert_eq!(conditions[1], "enabled = $f1");
    }
}
