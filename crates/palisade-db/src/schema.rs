//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity. UUIDs
//! are stored as strings. Soft-deletable tables carry an
//! `option<datetime>` `deleted_at` column, and their unique indexes
//! include that column so uniqueness is only enforced among live rows
//! (SurrealDB indexes `NONE` as a value, so two live duplicates still
//! collide).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Companies (the tenant boundary)
-- =======================================================================
DEFINE TABLE company SCHEMAFULL;
DEFINE FIELD name ON TABLE company TYPE string;
DEFINE FIELD legal_name ON TABLE company TYPE string;
DEFINE FIELD description ON TABLE company TYPE option<string>;
DEFINE FIELD tax_id ON TABLE company TYPE string;
DEFINE FIELD email ON TABLE company TYPE option<string>;
DEFINE FIELD enabled ON TABLE company TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE company TYPE option<datetime>;
DEFINE INDEX idx_company_tax_id ON TABLE company \
    COLUMNS tax_id, deleted_at UNIQUE;

-- =======================================================================
-- Company address (one per company, replaced wholesale on update)
-- =======================================================================
DEFINE TABLE company_address SCHEMAFULL;
DEFINE FIELD company_id ON TABLE company_address TYPE string;
DEFINE FIELD street ON TABLE company_address TYPE string;
DEFINE FIELD street_number ON TABLE company_address TYPE option<string>;
DEFINE FIELD street_complement ON TABLE company_address \
    TYPE option<string>;
DEFINE FIELD city ON TABLE company_address TYPE string;
DEFINE FIELD state ON TABLE company_address TYPE string;
DEFINE FIELD postal_code ON TABLE company_address TYPE string;
DEFINE FIELD country ON TABLE company_address TYPE string;
DEFINE INDEX idx_company_address_company ON TABLE company_address \
    COLUMNS company_id UNIQUE;

-- =======================================================================
-- Company contacts (one or more per company, replaced wholesale)
-- =======================================================================
DEFINE TABLE company_contact SCHEMAFULL;
DEFINE FIELD company_id ON TABLE company_contact TYPE string;
DEFINE FIELD name ON TABLE company_contact TYPE string;
DEFINE FIELD email ON TABLE company_contact TYPE option<string>;
DEFINE FIELD phone ON TABLE company_contact TYPE option<string>;
DEFINE FIELD tax_id ON TABLE company_contact TYPE option<string>;
DEFINE INDEX idx_company_contact_company ON TABLE company_contact \
    COLUMNS company_id;

-- =======================================================================
-- Permissions (company scope, hard-deleted)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD company_id ON TABLE permission TYPE string;
DEFINE FIELD name ON TABLE permission TYPE string;
DEFINE FIELD description ON TABLE permission TYPE option<string>;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_company_name ON TABLE permission \
    COLUMNS company_id, name UNIQUE;

-- =======================================================================
-- Roles (company scope, soft-deleted)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD company_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE option<string>;
DEFINE FIELD can_edit ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD can_delete ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD is_admin ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE role TYPE option<datetime>;
DEFINE INDEX idx_role_company_name ON TABLE role \
    COLUMNS company_id, name, deleted_at UNIQUE;

-- =======================================================================
-- Users (company scope, soft-deleted)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD company_id ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD enabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE user TYPE option<datetime>;
DEFINE INDEX idx_user_company_email ON TABLE user \
    COLUMNS company_id, email, deleted_at UNIQUE;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- Role -> Permission grants
DEFINE TABLE grants TYPE RELATION SCHEMAFULL;

-- User -> Role assignment
DEFINE TABLE has_role TYPE RELATION SCHEMAFULL;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn soft_deletable_unique_indexes_include_deleted_at() {
        for index in ["idx_company_tax_id", "idx_role_company_name", "idx_user_company_email"] {
            let line = SCHEMA_V1
                .split("DEFINE INDEX")
                .find(|chunk| chunk.contains(index))
                .unwrap_or_else(|| panic!("{index} not defined"));
            assert!(line.contains("deleted_at"), "{index} must scope to live rows");
        }
    }
}
