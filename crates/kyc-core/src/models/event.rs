//! Append-only log of directory mutations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KycError, KycResult};
use crate::models::names::{Address, OrgName, TagName};
use crate::models::user_tags::UserTags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    RegisterOrg,
    ChangeOrgApproved,
    ChangeOrgAdmin,
    UpdateSupportedTags,
    UpdateUserTags,
    ChangeServiceAdmin,
}

impl EventTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisterOrg => "register_org",
            Self::ChangeOrgApproved => "change_org_approved",
            Self::ChangeOrgAdmin => "change_org_admin",
            Self::UpdateSupportedTags => "update_supported_tags",
            Self::UpdateUserTags => "update_user_tags",
            Self::ChangeServiceAdmin => "change_service_admin",
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventTopic {
    type Err = KycError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register_org" => Ok(Self::RegisterOrg),
            "change_org_approved" => Ok(Self::ChangeOrgApproved),
            "change_org_admin" => Ok(Self::ChangeOrgAdmin),
            "update_supported_tags" => Ok(Self::UpdateSupportedTags),
            "update_user_tags" => Ok(Self::UpdateUserTags),
            "change_service_admin" => Ok(Self::ChangeServiceAdmin),
            other => Err(KycError::Internal(format!("unknown event topic: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycEvent {
    pub id: Uuid,
    pub topic: EventTopic,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields required to append an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKycEvent {
    pub topic: EventTopic,
    pub payload: serde_json::Value,
}

impl NewKycEvent {
    pub fn new<T: Serialize>(topic: EventTopic, payload: &T) -> KycResult<Self> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| KycError::Internal(format!("event serialization failed: {e}")))?;
        Ok(Self { topic, payload })
    }
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOrgEvent {
    pub name: OrgName,
    pub supported_tags: Vec<TagName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrgApprovedEvent {
    pub org_name: OrgName,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrgAdminEvent {
    pub name: OrgName,
    pub new_admin: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSupportedTagsEvent {
    pub org_name: OrgName,
    pub supported_tags: Vec<TagName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserTagsEvent {
    pub org_name: OrgName,
    pub user: Address,
    pub tags: UserTags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeServiceAdminEvent {
    pub new_admin: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_round_trip_through_strings() {
        for topic in [
            EventTopic::RegisterOrg,
            EventTopic::ChangeOrgApproved,
            EventTopic::ChangeOrgAdmin,
            EventTopic::UpdateSupportedTags,
            EventTopic::UpdateUserTags,
            EventTopic::ChangeServiceAdmin,
        ] {
            assert_eq!(topic.as_str().parse::<EventTopic>().unwrap(), topic);
        }
    }

    #[test]
    fn payload_is_captured_as_json() {
        let event = NewKycEvent::new(
            EventTopic::ChangeOrgApproved,
            &ChangeOrgApprovedEvent {
                org_name: "acme".parse().unwrap(),
                approved: true,
            },
        )
        .unwrap();

        assert_eq!(event.payload["org_name"], "acme");
        assert_eq!(event.payload["approved"], true);
    }
}
