//! SurrealDB implementation of [`OrganizationRepository`].

use chrono::{DateTime, Utc};
use kyc_core::error::KycResult;
use kyc_core::models::names::{OrgName, TagName};
use kyc_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use kyc_core::repository::OrganizationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::{CountRow, invalid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    name: String,
    description: String,
    admin: String,
    supported_tags: Vec<String>,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        let supported_tags = self
            .supported_tags
            .into_iter()
            .map(|tag| tag.parse::<TagName>().map_err(|e| invalid("supported_tags", e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Organization {
            name: self.name.parse().map_err(|e| invalid("name", e))?,
            description: self.description,
            admin: self.admin.parse().map_err(|e| invalid("admin", e))?,
            supported_tags,
            approved: self.approved,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Projection used for listing names in registration order.
#[derive(Debug, SurrealValue)]
struct NameRow {
    name: String,
    #[allow(dead_code)]
    seq: u64,
}

fn tag_strings(tags: Vec<TagName>) -> Vec<String> {
    tags.into_iter().map(String::from).collect()
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn next_seq(&self) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM kyc_org GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> KycResult<Organization> {
        if self.exists(&input.name).await? {
            return Err(DbError::OrgAlreadyExists(input.name.to_string()).into());
        }

        let seq = self.next_seq().await?;
        let name = input.name.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('kyc_org', $name) SET \
                 name = $name, description = $description, admin = $admin, \
                 supported_tags = $supported_tags, approved = $approved, seq = $seq",
            )
            .bind(("name", name.clone()))
            .bind(("description", input.description))
            .bind(("admin", String::from(input.admin)))
            .bind(("supported_tags", tag_strings(input.supported_tags)))
            .bind(("approved", input.approved))
            .bind(("seq", seq))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::OrgNotFound(name))?;

        Ok(row.try_into_organization()?)
    }

    async fn get(&self, name: &OrgName) -> KycResult<Organization> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('kyc_org', $name)")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::OrgNotFound(name.to_string()))?;

        Ok(row.try_into_organization()?)
    }

    async fn exists(&self, name: &OrgName) -> KycResult<bool> {
        let mut result = self
            .db
            .query("SELECT name, seq FROM type::record('kyc_org', $name)")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NameRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn list_names(&self) -> KycResult<Vec<OrgName>> {
        let mut result = self
            .db
            .query("SELECT name, seq FROM kyc_org ORDER BY seq ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NameRow> = result.take(0).map_err(DbError::from)?;
        let names = rows
            .into_iter()
            .map(|row| row.name.parse::<OrgName>().map_err(|e| invalid("name", e)))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(names)
    }

    async fn update(&self, name: &OrgName, input: UpdateOrganization) -> KycResult<Organization> {
        let mut sets = Vec::new();
        if input.admin.is_some() {
            sets.push("admin = $admin");
        }
        if input.supported_tags.is_some() {
            sets.push("supported_tags = $supported_tags");
        }
        if input.approved.is_some() {
            sets.push("approved = $approved");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('kyc_org', $name) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("name", name.to_string()));

        if let Some(admin) = input.admin {
            builder = builder.bind(("admin", String::from(admin)));
        }
        if let Some(tags) = input.supported_tags {
            builder = builder.bind(("supported_tags", tag_strings(tags)));
        }
        if let Some(approved) = input.approved {
            builder = builder.bind(("approved", approved));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::OrgNotFound(name.to_string()))?;

        Ok(row.try_into_organization()?)
    }
}
