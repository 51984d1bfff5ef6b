//! SurrealDB implementation of [`UserTagRepository`].

use chrono::{DateTime, Utc};
use kyc_core::error::KycResult;
use kyc_core::models::names::{Address, OrgName, TagName};
use kyc_core::models::user_tags::{UserTagRecord, UserTags};
use kyc_core::repository::UserTagRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::invalid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserTagRow {
    org_name: String,
    account: String,
    tags: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl UserTagRow {
    fn try_into_record(self) -> Result<UserTagRecord, DbError> {
        Ok(UserTagRecord {
            org_name: self.org_name.parse().map_err(|e| invalid("org_name", e))?,
            user: self.account.parse().map_err(|e| invalid("account", e))?,
            tags: serde_json::from_value(self.tags).map_err(|e| invalid("tags", e))?,
            updated_at: self.updated_at,
        })
    }
}

/// Record id for the `(org, user)` key. Org names never contain `/`.
fn record_key(org_name: &OrgName, user: &Address) -> String {
    format!("{org_name}/{user}")
}

/// SurrealDB implementation of the user tag repository.
#[derive(Clone)]
pub struct SurrealUserTagRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserTagRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserTagRepository for SurrealUserTagRepository<C> {
    async fn put(
        &self,
        org_name: &OrgName,
        user: &Address,
        tags: UserTags,
    ) -> KycResult<UserTagRecord> {
        let tags = serde_json::to_value(&tags).map_err(|e| invalid("tags", e))?;

        // SET on the whole object replaces the previous tag set.
        let result = self
            .db
            .query(
                "UPSERT type::record('kyc_user_tags', $key) SET \
                 org_name = $org_name, account = $account, tags = $tags, \
                 updated_at = time::now()",
            )
            .bind(("key", record_key(org_name, user)))
            .bind(("org_name", org_name.to_string()))
            .bind(("account", user.to_string()))
            .bind(("tags", tags))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserTagRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            DbError::Query(format!(
                "upsert returned no record for {}",
                record_key(org_name, user)
            ))
        })?;

        Ok(row.try_into_record()?)
    }

    async fn get(&self, org_name: &OrgName, user: &Address) -> KycResult<Option<UserTagRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('kyc_user_tags', $key)")
            .bind(("key", record_key(org_name, user)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserTagRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn get_tag(
        &self,
        org_name: &OrgName,
        user: &Address,
        tag: &TagName,
    ) -> KycResult<Option<Vec<String>>> {
        let record = self.get(org_name, user).await?;
        Ok(record.and_then(|r| r.tags.get(tag.as_str()).map(<[String]>::to_vec)))
    }
}
