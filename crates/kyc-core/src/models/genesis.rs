//! Bootstrap payload applied once to an empty registry.

use serde::{Deserialize, Serialize};

use crate::error::KycResult;
use crate::models::names::{Address, OrgName, TagName};
use crate::models::organization::{
    CreateOrganization, validate_admin, validate_description, validate_supported_tags,
};

/// Initial state: one pre-approved organization and the service admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub org_name: OrgName,
    pub org_description: String,
    pub org_admin: Address,
    pub supported_tags: Vec<TagName>,
    pub service_admin: Address,
}

impl Genesis {
    pub fn validate(&self) -> KycResult<()> {
        validate_description(&self.org_description)?;
        validate_admin(&self.org_admin)?;
        validate_admin(&self.service_admin)?;
        validate_supported_tags(&self.supported_tags)
    }

    /// The genesis organization skips the approval step.
    pub fn organization(&self) -> CreateOrganization {
        CreateOrganization {
            name: self.org_name.clone(),
            description: self.org_description.clone(),
            admin: self.org_admin.clone(),
            supported_tags: self.supported_tags.clone(),
            approved: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_json_round_trips_through_validation() {
        let json = r#"{
            "org_name": "Da_Lisi",
            "org_description": "temple ?",
            "org_admin": "0x755cdba6ae4f479f7164792b318b2a06c759833b",
            "supported_tags": ["title", "speci", "skills"],
            "service_admin": "0x755cdba6ae4f479f7164792b318b2a06c759833b"
        }"#;

        let genesis: Genesis = serde_json::from_str(json).unwrap();
        assert!(genesis.validate().is_ok());
        assert!(genesis.organization().approved);
        assert_eq!(genesis.supported_tags.len(), 3);
    }

    #[test]
    fn genesis_rejects_invalid_tag_names() {
        let json = r#"{
            "org_name": "Da_Lisi",
            "org_description": "",
            "org_admin": "0x755cdba6ae4f479f7164792b318b2a06c759833b",
            "supported_tags": ["not valid"],
            "service_admin": "0x755cdba6ae4f479f7164792b318b2a06c759833b"
        }"#;

        assert!(serde_json::from_str::<Genesis>(json).is_err());
    }
}
