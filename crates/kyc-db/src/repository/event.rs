//! SurrealDB implementation of [`EventRepository`].

use chrono::{DateTime, Utc};
use kyc_core::error::KycResult;
use kyc_core::models::event::{KycEvent, NewKycEvent};
use kyc_core::repository::{EventRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, invalid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct EventRow {
    topic: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn try_into_event(self, id: Uuid) -> Result<KycEvent, DbError> {
        Ok(KycEvent {
            id,
            topic: self.topic.parse().map_err(|e| invalid("topic", e))?,
            payload: self.payload,
            created_at: self.created_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EventRowWithId {
    record_id: String,
    topic: String,
    payload: serde_json::Value,
    #[allow(dead_code)]
    seq: u64,
    created_at: DateTime<Utc>,
}

impl EventRowWithId {
    fn try_into_event(self) -> Result<KycEvent, DbError> {
        Ok(KycEvent {
            id: Uuid::parse_str(&self.record_id).map_err(|e| invalid("id", e))?,
            topic: self.topic.parse().map_err(|e| invalid("topic", e))?,
            payload: self.payload,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the event log.
#[derive(Clone)]
pub struct SurrealEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn count(&self) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM kyc_event GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> EventRepository for SurrealEventRepository<C> {
    async fn append(&self, event: NewKycEvent) -> KycResult<KycEvent> {
        let id = Uuid::new_v4();
        let seq = self.count().await?;

        let result = self
            .db
            .query(
                "CREATE type::record('kyc_event', $id) SET \
                 topic = $topic, payload = $payload, seq = $seq",
            )
            .bind(("id", id.to_string()))
            .bind(("topic", event.topic.as_str().to_owned()))
            .bind(("payload", event.payload))
            .bind(("seq", seq))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Query(format!("event {id} was not created")))?;

        Ok(row.try_into_event(id)?)
    }

    async fn list(&self, pagination: Pagination) -> KycResult<PaginatedResult<KycEvent>> {
        let total = self.count().await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM kyc_event \
                 ORDER BY seq ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
