//! Repository trait definitions: the Tag Store contract.
//!
//! All repository operations are async. Implementations must make each
//! single call atomic; composing calls into a larger atomic unit is the
//! directory service's job.

use crate::error::KycResult;
use crate::models::{
    event::{KycEvent, NewKycEvent},
    names::{Address, OrgName, TagName},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    user_tags::{UserTagRecord, UserTags},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organizations: key space `(org)`
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    /// Fails with `OrgAlreadyExists` if the name is taken.
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = KycResult<Organization>> + Send;
    /// Fails with `OrgNotFound`.
    fn get(&self, name: &OrgName) -> impl Future<Output = KycResult<Organization>> + Send;
    fn exists(&self, name: &OrgName) -> impl Future<Output = KycResult<bool>> + Send;
    /// Organization names in registration order.
    fn list_names(&self) -> impl Future<Output = KycResult<Vec<OrgName>>> + Send;
    /// Fails with `OrgNotFound`.
    fn update(
        &self,
        name: &OrgName,
        input: UpdateOrganization,
    ) -> impl Future<Output = KycResult<Organization>> + Send;
}

// ---------------------------------------------------------------------------
// User tags: key space `(org, user)` and `(org, user, tag)`
// ---------------------------------------------------------------------------

pub trait UserTagRepository: Send + Sync {
    /// Replace the whole tag set of `user` under `org_name`.
    fn put(
        &self,
        org_name: &OrgName,
        user: &Address,
        tags: UserTags,
    ) -> impl Future<Output = KycResult<UserTagRecord>> + Send;
    fn get(
        &self,
        org_name: &OrgName,
        user: &Address,
    ) -> impl Future<Output = KycResult<Option<UserTagRecord>>> + Send;
    /// Values stored under one tag, regardless of the current schema.
    fn get_tag(
        &self,
        org_name: &OrgName,
        user: &Address,
        tag: &TagName,
    ) -> impl Future<Output = KycResult<Option<Vec<String>>>> + Send;
}

// ---------------------------------------------------------------------------
// Service-wide state
// ---------------------------------------------------------------------------

pub trait ServiceAdminRepository: Send + Sync {
    fn get(&self) -> impl Future<Output = KycResult<Option<Address>>> + Send;
    fn set(&self, admin: &Address) -> impl Future<Output = KycResult<()>> + Send;
}

pub trait EventRepository: Send + Sync {
    fn append(&self, event: NewKycEvent) -> impl Future<Output = KycResult<KycEvent>> + Send;
    /// Events oldest first.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = KycResult<PaginatedResult<KycEvent>>> + Send;
}
