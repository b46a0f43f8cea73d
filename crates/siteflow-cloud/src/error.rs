//! Cloud provider error types

use std::fmt;
use thiserror::Error;

/// Kind of provider resource an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Bucket,
    Object,
    Distribution,
    HostedZone,
    DnsRecord,
    Certificate,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Bucket => write!(f, "bucket"),
            ResourceKind::Object => write!(f, "object"),
            ResourceKind::Distribution => write!(f, "distribution"),
            ResourceKind::HostedZone => write!(f, "hosted zone"),
            ResourceKind::DnsRecord => write!(f, "DNS record"),
            ResourceKind::Certificate => write!(f, "certificate"),
        }
    }
}

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Access to {kind} {id} is forbidden{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Forbidden {
        kind: ResourceKind,
        id: String,
        message: Option<String>,
    },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: ResourceKind, id: String },

    #[error("Distribution {0} must be disabled before it can be deleted")]
    DistributionNotDisabled(String),

    #[error("Transfer Acceleration is not configured on bucket {0}")]
    AccelerationNotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Timeout: {operation} was not ready after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        CloudError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this is a not-found for the given resource kind
    pub fn is_not_found(&self, expected: ResourceKind) -> bool {
        matches!(self, CloudError::NotFound { kind, .. } if *kind == expected)
    }

    /// Errors a freshly created resource reports until the provider converges
    pub fn is_not_yet_consistent(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_message_formatting() {
        let bare = CloudError::Forbidden {
            kind: ResourceKind::Bucket,
            id: "site".to_string(),
            message: None,
        };
        assert_eq!(bare.to_string(), "Access to bucket site is forbidden");

        let detailed = CloudError::Forbidden {
            kind: ResourceKind::Bucket,
            id: "site".to_string(),
            message: Some("Access Denied".to_string()),
        };
        assert_eq!(
            detailed.to_string(),
            "Access to bucket site is forbidden: Access Denied"
        );
    }

    #[test]
    fn test_not_found_classification() {
        let err = CloudError::not_found(ResourceKind::Distribution, "E123");
        assert!(err.is_not_found(ResourceKind::Distribution));
        assert!(!err.is_not_found(ResourceKind::Bucket));
        assert!(err.is_not_yet_consistent());
        assert!(!CloudError::ApiError("boom".into()).is_not_yet_consistent());
    }
}
