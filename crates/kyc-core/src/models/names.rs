//! Validated identifiers: organization names, tag names and account
//! addresses.
//!
//! All three are parsed once at the directory boundary and carried as
//! newtypes afterwards, so nothing downstream re-checks them.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KycError;

/// Maximum byte length of an organization or tag name.
pub const MAX_NAME_LEN: usize = 32;

fn validate_identifier(kind: &str, raw: &str) -> Result<(), KycError> {
    if raw.is_empty() {
        return Err(KycError::validation(format!("{kind} must not be empty")));
    }
    if raw.len() > MAX_NAME_LEN {
        return Err(KycError::validation(format!(
            "{kind} {raw} exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    if raw.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(KycError::validation(format!(
            "{kind} {raw} must not start with a digit"
        )));
    }
    if let Some(c) = raw.chars().find(|c| !is_identifier_char(*c)) {
        return Err(KycError::validation(format!(
            "{kind} {raw} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// Characters allowed in organization and tag names.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl FromStr for $name {
            type Err = KycError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                validate_identifier($kind, s)?;
                Ok(Self(s.to_owned()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = KycError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate_identifier($kind, &value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Unique, case-sensitive organization identifier (e.g. `acme`).
    OrgName,
    "org name"
);

identifier!(
    /// Name of a tag category an organization may assert (e.g. `kyc_level`).
    TagName,
    "tag name"
);

/// Account identifier: `0x` followed by 40 hex digits, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

const ADDRESS_HEX_LEN: usize = 40;

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The all-zero address; never a valid admin.
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }
}

impl FromStr for Address {
    type Err = KycError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| KycError::validation(format!("address {s} must start with 0x")))?;

        if hex.len() != ADDRESS_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KycError::validation(format!(
                "address {s} must hold {ADDRESS_HEX_LEN} hex digits"
            )));
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = KycError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_names_accept_identifiers() {
        let name: OrgName = "Da_Lisi".parse().unwrap();
        assert_eq!(name.as_str(), "Da_Lisi");
        assert!("acme2".parse::<OrgName>().is_ok());
    }

    #[test]
    fn org_names_reject_bad_input() {
        assert!("".parse::<OrgName>().is_err());
        assert!("2fast".parse::<OrgName>().is_err());
        assert!("with space".parse::<OrgName>().is_err());
        assert!("dot.ted".parse::<OrgName>().is_err());
        assert!("x".repeat(MAX_NAME_LEN + 1).parse::<OrgName>().is_err());
    }

    #[test]
    fn names_are_case_sensitive() {
        let lower: TagName = "kyc".parse().unwrap();
        let upper: TagName = "KYC".parse().unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn addresses_normalise_to_lowercase() {
        let addr: Address = "0xCFF1002107105460941F797828F468667AA1A2DB".parse().unwrap();
        assert_eq!(addr.as_str(), "0xcff1002107105460941f797828f468667aa1a2db");
        assert!(!addr.is_zero());
    }

    #[test]
    fn addresses_reject_malformed_input() {
        assert!("cff1002107105460941f797828f468667aa1a2db".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz00000000000000000000000000000000000000".parse::<Address>().is_err());
    }

    #[test]
    fn zero_address_is_detected() {
        let zero: Address = format!("0x{}", "0".repeat(40)).parse().unwrap();
        assert!(zero.is_zero());
    }

    #[test]
    fn names_deserialize_with_validation() {
        let ok: OrgName = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(ok.as_str(), "acme");
        assert!(serde_json::from_str::<OrgName>("\"no-dash\"").is_err());
    }
}
