//! Directory configuration.

use kyc_core::error::{KycError, KycResult};
use kyc_core::models::genesis::Genesis;

/// Configuration for the directory service.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Longest expression accepted by `eval_user_tag_expression`, in
    /// bytes (default: 4096).
    pub max_expression_len: usize,
    /// Bootstrap state applied to an empty registry.
    pub genesis: Option<Genesis>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_expression_len: 4096,
            genesis: None,
        }
    }
}

impl DirectoryConfig {
    /// Defaults overridden by `KYC_MAX_EXPRESSION_LEN` and a JSON
    /// genesis document in `KYC_GENESIS`.
    pub fn from_env() -> KycResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KycResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("KYC_MAX_EXPRESSION_LEN") {
            config.max_expression_len = raw.trim().parse().map_err(|_| {
                KycError::validation(format!("KYC_MAX_EXPRESSION_LEN is not a number: {raw}"))
            })?;
        }

        if let Some(raw) = lookup("KYC_GENESIS") {
            let genesis: Genesis = serde_json::from_str(&raw)
                .map_err(|e| KycError::validation(format!("KYC_GENESIS: {e}")))?;
            genesis.validate()?;
            config.genesis = Some(genesis);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = r#"{
        "org_name": "huobi",
        "org_description": "genesis kyc org",
        "org_admin": "0x755cdba6ae4f479f7164792b318b2a06c759833b",
        "supported_tags": ["kyc1", "kyc2"],
        "service_admin": "0xcff1002107105460941f797828f468667aa1a2db"
    }"#;

    #[test]
    fn defaults_without_environment() {
        let config = DirectoryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.max_expression_len, 4096);
        assert!(config.genesis.is_none());
    }

    #[test]
    fn genesis_is_read_from_json() {
        let config = DirectoryConfig::from_lookup(|key| match key {
            "KYC_GENESIS" => Some(GENESIS.into()),
            "KYC_MAX_EXPRESSION_LEN" => Some("512".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.max_expression_len, 512);
        let genesis = config.genesis.unwrap();
        assert_eq!(genesis.org_name.as_str(), "huobi");
        assert_eq!(genesis.supported_tags.len(), 2);
    }

    #[test]
    fn malformed_genesis_is_rejected() {
        let err = DirectoryConfig::from_lookup(|key| {
            (key == "KYC_GENESIS").then(|| r#"{"org_name": "9bad"}"#.to_string())
        })
        .unwrap_err();
        assert!(matches!(err, KycError::Validation { .. }));
    }

    #[test]
    fn zero_service_admin_in_genesis_is_rejected() {
        let zero = GENESIS.replace(
            "0xcff1002107105460941f797828f468667aa1a2db",
            "0x0000000000000000000000000000000000000000",
        );
        let err = DirectoryConfig::from_lookup(|key| (key == "KYC_GENESIS").then(|| zero.clone()))
            .unwrap_err();
        assert!(matches!(err, KycError::Validation { .. }));
    }
}
