//! Organization directory service: registration, approval, schema and
//! tag assignment, plus expression evaluation over the Tag Store.

use kyc_core::error::{KycError, KycResult};
use kyc_core::expression::{self, TagSnapshot};
use kyc_core::models::event::{
    ChangeOrgAdminEvent, ChangeOrgApprovedEvent, ChangeServiceAdminEvent, EventTopic, KycEvent,
    NewKycEvent, RegisterOrgEvent, UpdateSupportedTagsEvent, UpdateUserTagsEvent,
};
use kyc_core::models::genesis::Genesis;
use kyc_core::models::names::{Address, OrgName, TagName};
use kyc_core::models::organization::{
    Organization, RegisterOrg, UpdateOrganization, validate_admin, validate_supported_tags,
};
use kyc_core::models::user_tags::UserTags;
use kyc_core::repository::{
    EventRepository, OrganizationRepository, PaginatedResult, Pagination, ServiceAdminRepository,
    UserTagRepository,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DirectoryConfig;

/// The KYC organization directory.
///
/// Generic over repository implementations so that the directory has
/// no dependency on the database crate. Every mutation runs its checks
/// and writes under one write guard; reads share the read guard, so a
/// read never observes a half-applied mutation.
pub struct KycService<O, U, A, E>
where
    O: OrganizationRepository,
    U: UserTagRepository,
    A: ServiceAdminRepository,
    E: EventRepository,
{
    org_repo: O,
    user_tag_repo: U,
    admin_repo: A,
    event_repo: E,
    config: DirectoryConfig,
    lock: RwLock<()>,
}

impl<O, U, A, E> KycService<O, U, A, E>
where
    O: OrganizationRepository,
    U: UserTagRepository,
    A: ServiceAdminRepository,
    E: EventRepository,
{
    pub fn new(
        org_repo: O,
        user_tag_repo: U,
        admin_repo: A,
        event_repo: E,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            org_repo,
            user_tag_repo,
            admin_repo,
            event_repo,
            config,
            lock: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // Bootstrap
    // -------------------------------------------------------------------

    /// Register the genesis organization (pre-approved) and set the
    /// initial service admin.
    ///
    /// Fails with `AlreadyInitialized` once a service admin exists.
    pub async fn init_genesis(&self, genesis: Genesis) -> KycResult<Organization> {
        genesis.validate()?;

        let _guard = self.lock.write().await;

        if self.admin_repo.get().await?.is_some() {
            warn!(org = %genesis.org_name, "genesis rejected: registry already initialized");
            return Err(KycError::AlreadyInitialized);
        }

        let org = self.org_repo.create(genesis.organization()).await?;
        self.admin_repo.set(&genesis.service_admin).await?;

        info!(
            org = %org.name,
            service_admin = %genesis.service_admin,
            "kyc registry initialized from genesis"
        );

        self.record(
            EventTopic::RegisterOrg,
            &RegisterOrgEvent {
                name: org.name.clone(),
                supported_tags: org.supported_tags.clone(),
            },
        )
        .await;
        self.record(
            EventTopic::ChangeServiceAdmin,
            &ChangeServiceAdminEvent {
                new_admin: genesis.service_admin,
            },
        )
        .await;

        Ok(org)
    }

    /// Apply the configured genesis, if any. Returns `true` when it was
    /// applied and `false` when there is none or the registry is
    /// already initialized.
    pub async fn bootstrap(&self) -> KycResult<bool> {
        let Some(genesis) = self.config.genesis.clone() else {
            return Ok(false);
        };

        match self.init_genesis(genesis).await {
            Ok(_) => Ok(true),
            Err(KycError::AlreadyInitialized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------
    // Organizations
    // -------------------------------------------------------------------

    /// Register a new, unapproved organization. Only the service admin
    /// may register; the payload is validated after the caller check.
    pub async fn register_org(
        &self,
        caller: &Address,
        input: RegisterOrg,
    ) -> KycResult<Organization> {
        let _guard = self.lock.write().await;
        self.require_service_admin(caller).await?;
        input.validate()?;

        let org = self.org_repo.create(input.into()).await?;

        info!(org = %org.name, admin = %org.admin, "kyc org registered");
        self.record(
            EventTopic::RegisterOrg,
            &RegisterOrgEvent {
                name: org.name.clone(),
                supported_tags: org.supported_tags.clone(),
            },
        )
        .await;

        Ok(org)
    }

    pub async fn get_org_info(&self, name: &OrgName) -> KycResult<Organization> {
        let _guard = self.lock.read().await;
        self.org_repo.get(name).await
    }

    /// Organization names in registration order.
    pub async fn get_orgs(&self) -> KycResult<Vec<OrgName>> {
        let _guard = self.lock.read().await;
        self.org_repo.list_names().await
    }

    pub async fn get_org_supported_tags(&self, name: &OrgName) -> KycResult<Vec<TagName>> {
        let _guard = self.lock.read().await;
        Ok(self.org_repo.get(name).await?.supported_tags)
    }

    pub async fn change_org_approved(
        &self,
        name: &OrgName,
        approved: bool,
        caller: &Address,
    ) -> KycResult<()> {
        let _guard = self.lock.write().await;
        self.require_service_admin(caller).await?;

        self.org_repo
            .update(
                name,
                UpdateOrganization {
                    approved: Some(approved),
                    ..Default::default()
                },
            )
            .await?;

        info!(org = %name, approved, "kyc org approval changed");
        self.record(
            EventTopic::ChangeOrgApproved,
            &ChangeOrgApprovedEvent {
                org_name: name.clone(),
                approved,
            },
        )
        .await;

        Ok(())
    }

    /// Replace the supported-tag schema. Stored user tags are left as
    /// they are; values under a removed tag stop matching.
    pub async fn update_supported_tags(
        &self,
        name: &OrgName,
        supported_tags: Vec<TagName>,
        caller: &Address,
    ) -> KycResult<()> {
        let _guard = self.lock.write().await;
        let org = self.org_repo.get(name).await?;
        Self::require_org_admin(&org, caller)?;
        validate_supported_tags(&supported_tags)?;

        self.org_repo
            .update(
                name,
                UpdateOrganization {
                    supported_tags: Some(supported_tags.clone()),
                    ..Default::default()
                },
            )
            .await?;

        info!(org = %name, tags = supported_tags.len(), "kyc org supported tags updated");
        self.record(
            EventTopic::UpdateSupportedTags,
            &UpdateSupportedTagsEvent {
                org_name: name.clone(),
                supported_tags,
            },
        )
        .await;

        Ok(())
    }

    pub async fn change_org_admin(
        &self,
        name: &OrgName,
        new_admin: &Address,
        caller: &Address,
    ) -> KycResult<()> {
        let _guard = self.lock.write().await;
        let org = self.org_repo.get(name).await?;
        Self::require_org_admin(&org, caller)?;
        validate_admin(new_admin)?;

        self.org_repo
            .update(
                name,
                UpdateOrganization {
                    admin: Some(new_admin.clone()),
                    ..Default::default()
                },
            )
            .await?;

        info!(org = %name, new_admin = %new_admin, "kyc org admin changed");
        self.record(
            EventTopic::ChangeOrgAdmin,
            &ChangeOrgAdminEvent {
                name: name.clone(),
                new_admin: new_admin.clone(),
            },
        )
        .await;

        Ok(())
    }

    // -------------------------------------------------------------------
    // User tags
    // -------------------------------------------------------------------

    /// Replace the whole tag set of `user` under `name`.
    ///
    /// Checked in order: the org exists, it is approved, the caller is
    /// its admin, the values are well formed, and every tag is in the
    /// org's current schema. Nothing is written unless all pass.
    pub async fn update_user_tags(
        &self,
        name: &OrgName,
        user: &Address,
        tags: UserTags,
        caller: &Address,
    ) -> KycResult<()> {
        let _guard = self.lock.write().await;
        let org = self.org_repo.get(name).await?;

        if !org.approved {
            warn!(org = %name, "user tag update rejected: org not approved");
            return Err(KycError::OrgNotApproved(name.to_string()));
        }
        Self::require_org_admin(&org, caller)?;

        tags.validate()?;
        if let Some(tag) = tags.tag_names().find(|tag| !org.supports(tag.as_str())) {
            warn!(org = %name, tag = %tag, "user tag update rejected: unsupported tag");
            return Err(KycError::UnsupportedTag {
                org: name.to_string(),
                tag: tag.to_string(),
            });
        }

        let record = self.user_tag_repo.put(name, user, tags).await?;

        info!(org = %name, user = %user, tags = record.tags.len(), "user tags updated");
        self.record(
            EventTopic::UpdateUserTags,
            &UpdateUserTagsEvent {
                org_name: record.org_name,
                user: record.user,
                tags: record.tags,
            },
        )
        .await;

        Ok(())
    }

    /// Tags stored for `user` under `name`; empty when the user has no
    /// record.
    pub async fn get_user_tags(&self, name: &OrgName, user: &Address) -> KycResult<UserTags> {
        let _guard = self.lock.read().await;

        if !self.org_repo.exists(name).await? {
            return Err(KycError::OrgNotFound(name.to_string()));
        }

        Ok(self
            .user_tag_repo
            .get(name, user)
            .await?
            .map(|record| record.tags)
            .unwrap_or_default())
    }

    // -------------------------------------------------------------------
    // Service admin
    // -------------------------------------------------------------------

    /// The current service admin; `None` until genesis has run.
    pub async fn get_service_admin(&self) -> KycResult<Option<Address>> {
        let _guard = self.lock.read().await;
        self.admin_repo.get().await
    }

    pub async fn change_service_admin(
        &self,
        new_admin: &Address,
        caller: &Address,
    ) -> KycResult<()> {
        let _guard = self.lock.write().await;
        self.require_service_admin(caller).await?;
        validate_admin(new_admin)?;

        self.admin_repo.set(new_admin).await?;

        info!(new_admin = %new_admin, "kyc service admin changed");
        self.record(
            EventTopic::ChangeServiceAdmin,
            &ChangeServiceAdminEvent {
                new_admin: new_admin.clone(),
            },
        )
        .await;

        Ok(())
    }

    // -------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------

    /// The event log, oldest first.
    pub async fn list_events(
        &self,
        pagination: Pagination,
    ) -> KycResult<PaginatedResult<KycEvent>> {
        let _guard = self.lock.read().await;
        self.event_repo.list(pagination).await
    }

    // -------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------

    /// Parse `expression` and evaluate it for `user`.
    ///
    /// Only malformed input is an error. Unknown organizations, tags or
    /// users make the assertions that reference them false.
    pub async fn eval_user_tag_expression(
        &self,
        user: &Address,
        expression: &str,
    ) -> KycResult<bool> {
        if expression.len() > self.config.max_expression_len {
            return Err(KycError::validation(format!(
                "expression exceeds {} bytes",
                self.config.max_expression_len
            )));
        }

        let expr = expression::parse(expression)?;
        let snapshot = self.load_snapshot(user, &expr).await?;
        let result = expression::evaluate(&expr, &snapshot);

        debug!(user = %user, expression = %expr, result, "tag expression evaluated");
        Ok(result)
    }

    /// Load every organization the expression names, and the user's
    /// tags under the approved ones, in one read-guarded pass.
    async fn load_snapshot(
        &self,
        user: &Address,
        expr: &expression::Expr,
    ) -> KycResult<TagSnapshot> {
        let _guard = self.lock.read().await;
        let mut snapshot = TagSnapshot::new();

        for raw in expr.org_names() {
            // An identifier that is not a valid org name cannot be registered.
            let Ok(name) = raw.parse::<OrgName>() else {
                continue;
            };

            let org = match self.org_repo.get(&name).await {
                Ok(org) => org,
                Err(KycError::OrgNotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            if org.approved {
                if let Some(record) = self.user_tag_repo.get(&name, user).await? {
                    snapshot.insert_user_tags(name, record.tags);
                }
            }
            snapshot.insert_org(org);
        }

        Ok(snapshot)
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    async fn require_service_admin(&self, caller: &Address) -> KycResult<()> {
        match self.admin_repo.get().await? {
            Some(admin) if &admin == caller => Ok(()),
            Some(_) => {
                warn!(caller = %caller, "rejected: caller is not the service admin");
                Err(KycError::permission_denied("caller is not the service admin"))
            }
            None => {
                warn!(caller = %caller, "rejected: service admin is not initialized");
                Err(KycError::permission_denied("service admin is not initialized"))
            }
        }
    }

    fn require_org_admin(org: &Organization, caller: &Address) -> KycResult<()> {
        if &org.admin == caller {
            return Ok(());
        }
        warn!(org = %org.name, caller = %caller, "rejected: caller is not the org admin");
        Err(KycError::permission_denied(format!(
            "caller is not the admin of kyc org {}",
            org.name
        )))
    }

    /// Append an event for an applied mutation. A failed append is
    /// logged and does not undo the mutation.
    async fn record<T: Serialize + Sync>(&self, topic: EventTopic, payload: &T) {
        let event = match NewKycEvent::new(topic, payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(topic = %topic, error = %e, "failed to encode kyc event");
                return;
            }
        };

        if let Err(e) = self.event_repo.append(event).await {
            warn!(topic = %topic, error = %e, "failed to append kyc event");
        }
    }
}
