//! Organization domain model.
//!
//! An organization is a named tenant that asserts identity tags about
//! users. It only becomes effective once the service admin approves it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KycError, KycResult};
use crate::models::names::{Address, OrgName, TagName};

/// Maximum byte length of an organization description.
pub const MAX_DESCRIPTION_LEN: usize = 256;
/// Maximum number of tags in an organization schema.
pub const MAX_SUPPORTED_TAGS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: OrgName,
    pub description: String,
    /// Account allowed to change the tag schema and user assignments.
    pub admin: Address,
    /// Tag schema, in the order the admin submitted it.
    pub supported_tags: Vec<TagName>,
    /// Assertions about an unapproved organization always evaluate to false.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn supports(&self, tag: &str) -> bool {
        self.supported_tags.iter().any(|t| t.as_str() == tag)
    }
}

/// Fields required to store a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: OrgName,
    pub description: String,
    pub admin: Address,
    pub supported_tags: Vec<TagName>,
    pub approved: bool,
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub admin: Option<Address>,
    pub supported_tags: Option<Vec<TagName>>,
    pub approved: Option<bool>,
}

/// Registration request submitted to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOrg {
    pub name: OrgName,
    pub description: String,
    pub admin: Address,
    pub supported_tags: Vec<TagName>,
}

impl RegisterOrg {
    pub fn validate(&self) -> KycResult<()> {
        validate_description(&self.description)?;
        validate_admin(&self.admin)?;
        validate_supported_tags(&self.supported_tags)
    }
}

impl From<RegisterOrg> for CreateOrganization {
    fn from(value: RegisterOrg) -> Self {
        Self {
            name: value.name,
            description: value.description,
            admin: value.admin,
            supported_tags: value.supported_tags,
            approved: false,
        }
    }
}

pub fn validate_description(description: &str) -> KycResult<()> {
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(KycError::validation(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} bytes"
        )));
    }
    Ok(())
}

pub fn validate_admin(admin: &Address) -> KycResult<()> {
    if admin.is_zero() {
        return Err(KycError::validation("admin must not be the zero address"));
    }
    Ok(())
}

/// Schema must be a set: duplicates are rejected rather than collapsed.
pub fn validate_supported_tags(tags: &[TagName]) -> KycResult<()> {
    if tags.len() > MAX_SUPPORTED_TAGS {
        return Err(KycError::validation(format!(
            "at most {MAX_SUPPORTED_TAGS} supported tags allowed"
        )));
    }

    let mut seen = HashSet::with_capacity(tags.len());
    for tag in tags {
        if !seen.insert(tag.as_str()) {
            return Err(KycError::validation(format!("duplicate supported tag {tag}")));
        }
    }
    Ok(())
}
