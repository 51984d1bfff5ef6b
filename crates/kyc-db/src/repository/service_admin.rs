//! SurrealDB implementation of [`ServiceAdminRepository`].

use kyc_core::error::KycResult;
use kyc_core::models::names::Address;
use kyc_core::repository::ServiceAdminRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::invalid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AdminRow {
    address: String,
}

/// Stores the single service admin as `kyc_service:admin`.
#[derive(Clone)]
pub struct SurrealServiceAdminRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceAdminRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceAdminRepository for SurrealServiceAdminRepository<C> {
    async fn get(&self) -> KycResult<Option<Address>> {
        let mut result = self
            .db
            .query("SELECT address FROM type::record('kyc_service', 'admin')")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdminRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(
                row.address.parse().map_err(|e| invalid("address", e))?,
            )),
            None => Ok(None),
        }
    }

    async fn set(&self, admin: &Address) -> KycResult<()> {
        self.db
            .query(
                "UPSERT type::record('kyc_service', 'admin') SET \
                 address = $address, updated_at = time::now()",
            )
            .bind(("address", admin.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
