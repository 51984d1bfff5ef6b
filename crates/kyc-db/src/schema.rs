//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Record IDs are derived from
//! the natural keys of the Tag Store: `(org)` for organizations and
//! `(org, user)` for tag records.

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations, record id = org name
-- =======================================================================
DEFINE TABLE kyc_org SCHEMAFULL;
DEFINE FIELD name ON TABLE kyc_org TYPE string;
DEFINE FIELD description ON TABLE kyc_org TYPE string;
DEFINE FIELD admin ON TABLE kyc_org TYPE string;
DEFINE FIELD supported_tags ON TABLE kyc_org TYPE array<string>;
DEFINE FIELD approved ON TABLE kyc_org TYPE bool DEFAULT false;
DEFINE FIELD seq ON TABLE kyc_org TYPE int;
DEFINE FIELD created_at ON TABLE kyc_org TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE kyc_org TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_kyc_org_name ON TABLE kyc_org COLUMNS name UNIQUE;
DEFINE INDEX idx_kyc_org_seq ON TABLE kyc_org COLUMNS seq UNIQUE;

-- =======================================================================
-- User tag records, record id = <org>/<account>
-- =======================================================================
DEFINE TABLE kyc_user_tags SCHEMAFULL;
DEFINE FIELD org_name ON TABLE kyc_user_tags TYPE string;
DEFINE FIELD account ON TABLE kyc_user_tags TYPE string;
DEFINE FIELD tags ON TABLE kyc_user_tags TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD updated_at ON TABLE kyc_user_tags TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_kyc_user_tags_key ON TABLE kyc_user_tags \
    COLUMNS org_name, account UNIQUE;

-- =======================================================================
-- Service-wide settings, single record kyc_service:admin
-- =======================================================================
DEFINE TABLE kyc_service SCHEMAFULL;
DEFINE FIELD address ON TABLE kyc_service TYPE string;
DEFINE FIELD updated_at ON TABLE kyc_service TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Mutation event log (append-only)
-- =======================================================================
DEFINE TABLE kyc_event SCHEMAFULL;
DEFINE FIELD topic ON TABLE kyc_event TYPE string;
DEFINE FIELD payload ON TABLE kyc_event TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD seq ON TABLE kyc_event TYPE int;
DEFINE FIELD created_at ON TABLE kyc_event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_kyc_event_seq ON TABLE kyc_event COLUMNS seq UNIQUE;
";

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the highest one recorded.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = applied_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > current);

    for migration in pending {
        apply(db, migration).await?;
    }

    Ok(())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

/// Run one migration's DDL, then record it. A failed DDL run leaves no
/// record, so the next start retries it.
async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying kyc schema migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!("v{} {}: {e}", migration.version, migration.name))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("recording v{}: {e}", migration.version)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_every_table() {
        for table in ["kyc_org", "kyc_user_tags", "kyc_service", "kyc_event"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
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
}
