//! Per-user tag assignments made by an organization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KycError, KycResult};
use crate::models::names::{Address, OrgName, TagName};

/// Maximum byte length of a single tag value.
pub const MAX_TAG_VALUE_LEN: usize = 64;
/// Maximum number of values stored under one tag.
pub const MAX_VALUES_PER_TAG: usize = 16;

/// Ordered mapping from tag name to the values asserted under it.
///
/// Duplicate values are kept as submitted; reads treat the list as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserTags(BTreeMap<TagName, Vec<String>>);

impl UserTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: TagName, values: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(tag, values)
    }

    pub fn get(&self, tag: &str) -> Option<&[String]> {
        self.0.get(tag).map(Vec::as_slice)
    }

    pub fn contains_value(&self, tag: &str, value: &str) -> bool {
        self.get(tag)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &TagName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagName, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks value shape only; schema membership is checked by the
    /// directory against the organization at call time.
    pub fn validate(&self) -> KycResult<()> {
        for (tag, values) in &self.0 {
            if values.len() > MAX_VALUES_PER_TAG {
                return Err(KycError::validation(format!(
                    "tag {tag} holds more than {MAX_VALUES_PER_TAG} values"
                )));
            }
            for value in values {
                if value.len() > MAX_TAG_VALUE_LEN {
                    return Err(KycError::validation(format!(
                        "value under tag {tag} exceeds {MAX_TAG_VALUE_LEN} bytes"
                    )));
                }
                if value.contains('`') {
                    return Err(KycError::validation(format!(
                        "value under tag {tag} must not contain a backtick"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<(TagName, Vec<String>)> for UserTags {
    fn from_iter<I: IntoIterator<Item = (TagName, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UserTags {
    type Item = (TagName, Vec<String>);
    type IntoIter = std::collections::btree_map::IntoIter<TagName, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Stored tag record, keyed by `(org_name, user)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTagRecord {
    pub org_name: OrgName,
    pub user: Address,
    pub tags: UserTags,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(entries: &[(&str, &[&str])]) -> UserTags {
        entries
            .iter()
            .map(|(tag, values)| {
                (
                    tag.parse().unwrap(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn membership_is_exact_string_equality() {
        let t = tags(&[("kyc1", &["passed", "passed"])]);
        assert!(t.contains_value("kyc1", "passed"));
        assert!(!t.contains_value("kyc1", "Passed"));
        assert!(!t.contains_value("kyc2", "passed"));
    }

    #[test]
    fn backtick_values_are_rejected() {
        assert!(tags(&[("kyc1", &["a`b"])]).validate().is_err());
        assert!(tags(&[("kyc1", &["ok"])]).validate().is_ok());
    }

    #[test]
    fn too_many_values_are_rejected() {
        let many: Vec<&str> = vec!["v"; MAX_VALUES_PER_TAG + 1];
        assert!(tags(&[("kyc1", &many)]).validate().is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let t = tags(&[("level", &["L1"])]);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"level":["L1"]}"#);
    }
}
