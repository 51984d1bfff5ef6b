//! SurrealDB repository implementations.

mod event;
mod organization;
mod service_admin;
mod user_tags;

pub use event::SurrealEventRepository;
pub use organization::SurrealOrganizationRepository;
pub use service_admin::SurrealServiceAdminRepository;
pub use user_tags::SurrealUserTagRepository;

use surrealdb_types::SurrealValue;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn invalid(field: &str, err: impl std::fmt::Display) -> DbError {
    DbError::InvalidRecord(format!("{field}: {err}"))
}
