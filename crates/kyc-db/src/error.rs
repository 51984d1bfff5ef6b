//! Database-specific error types and conversions.

use kyc_core::error::KycError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Kyc org {0} not found")]
    OrgNotFound(String),

    #[error("Kyc org {0} already exists")]
    OrgAlreadyExists(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl From<DbError> for KycError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::OrgNotFound(name) => KycError::OrgNotFound(name),
            DbError::OrgAlreadyExists(name) => KycError::OrgAlreadyExists(name),
            other => KycError::Database(other.to_string()),
        }
    }
}
