//! Error types for the KYC registry.

use thiserror::Error;

use crate::expression::ParseError;

/// Sentinel reported to the service-dispatch layer for a successful call.
pub const SUCCESS_CODE: u64 = 0;

#[derive(Debug, Error)]
pub enum KycError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Expression error: {0}")]
    Parse(#[from] ParseError),

    #[error("Kyc org {0} not found")]
    OrgNotFound(String),

    #[error("Kyc org {0} already exists")]
    OrgAlreadyExists(String),

    #[error("Kyc service already initialized")]
    AlreadyInitialized,

    #[error("Kyc org {0} not approved")]
    OrgNotApproved(String),

    #[error("Non authorized: {reason}")]
    PermissionDenied { reason: String },

    #[error("Tag {tag} is not supported by kyc org {org}")]
    UnsupportedTag { org: String, tag: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KycError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Stable sentinel code observed at the service boundary.
    pub fn code(&self) -> u64 {
        match self {
            Self::Validation { .. } => 0x65,
            Self::Parse(_) => 0x66,
            Self::OrgNotFound(_) => 0x67,
            Self::OrgAlreadyExists(_) => 0x68,
            Self::AlreadyInitialized => 0x69,
            Self::Database(_) | Self::Internal(_) => 0x6a,
            Self::OrgNotApproved(_) => 0x6c,
            Self::PermissionDenied { .. } => 0x6d,
            Self::UnsupportedTag { .. } => 0x6e,
        }
    }
}

pub type KycResult<T> = Result<T, KycError>;
