//! AWS SDK error classification
//!
//! Every SDK failure passes through [`classify`], which maps service error
//! codes and HTTP statuses onto [`CloudError`] so the reconciler can branch
//! on them without knowing the SDK.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use siteflow_cloud::{CloudError, ResourceKind};
use thiserror::Error;

/// Errors raised while setting up the AWS clients
#[derive(Error, Debug)]
pub enum AwsError {
    #[error("No AWS region configured. Set AWS_REGION or `region` in site.yml")]
    MissingRegion,
}

pub type Result<T> = std::result::Result<T, AwsError>;

/// Service error code, message and HTTP status of an SDK failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub status: Option<u16>,
    pub display: String,
}

impl ErrorDetails {
    pub(crate) fn from_sdk<E>(err: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        Self {
            code: err.code().map(str::to_string),
            message: err.message().map(str::to_string),
            status: err.raw_response().map(|r| r.status().as_u16()),
            display: DisplayErrorContext(err).to_string(),
        }
    }
}

pub(crate) fn classify<E>(err: SdkError<E>, kind: ResourceKind, id: &str) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let details = ErrorDetails::from_sdk(&err);
    tracing::debug!("AWS error on {} {}: {}", kind, id, details.display);
    classify_details(details, kind, id)
}

pub(crate) fn classify_details(details: ErrorDetails, kind: ResourceKind, id: &str) -> CloudError {
    let code = details.code.as_deref().unwrap_or_default();
    let message = details.message.clone().unwrap_or_default();

    match code {
        "NoSuchBucket" => CloudError::not_found(ResourceKind::Bucket, id),
        "NoSuchKey" => CloudError::not_found(ResourceKind::Object, id),
        "NoSuchDistribution" => CloudError::not_found(ResourceKind::Distribution, id),
        "NoSuchHostedZone" => CloudError::not_found(ResourceKind::HostedZone, id),
        "ResourceNotFoundException" => CloudError::not_found(ResourceKind::Certificate, id),
        "DistributionNotDisabled" => CloudError::DistributionNotDisabled(id.to_string()),
        "BucketAlreadyOwnedByYou" => CloudError::AlreadyExists {
            kind: ResourceKind::Bucket,
            id: id.to_string(),
        },
        "BucketAlreadyExists" => CloudError::Forbidden {
            kind: ResourceKind::Bucket,
            id: id.to_string(),
            message: Some(message),
        },
        "InvalidChangeBatch" if message.contains("not found") => {
            CloudError::not_found(ResourceKind::DnsRecord, id)
        }
        "InvalidRequest" if message.contains("Transfer Acceleration is not configured") => {
            CloudError::AccelerationNotConfigured(id.to_string())
        }
        _ => match details.status {
            // HEAD responses carry no error body, only the status
            Some(404) => CloudError::not_found(kind, id),
            Some(403) => CloudError::Forbidden {
                kind,
                id: id.to_string(),
                message: details.message,
            },
            _ if code.is_empty() => CloudError::ApiError(details.display),
            _ => CloudError::ApiError(format!("{code}: {}", details.display)),
        },
    }
}

/// Required request field missing while building an SDK shape
pub(crate) fn build_error(err: impl std::fmt::Display) -> CloudError {
    CloudError::InvalidConfig(format!("invalid AWS request: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(code: Option<&str>, message: Option<&str>, status: Option<u16>) -> ErrorDetails {
        ErrorDetails {
            code: code.map(str::to_string),
            message: message.map(str::to_string),
            status,
            display: "service error".to_string(),
        }
    }

    #[test]
    fn test_head_bucket_statuses() {
        let err = classify_details(details(None, None, Some(404)), ResourceKind::Bucket, "site");
        assert!(err.is_not_found(ResourceKind::Bucket));

        let err = classify_details(details(None, None, Some(403)), ResourceKind::Bucket, "site");
        assert!(matches!(err, CloudError::Forbidden { message: None, .. }));
    }

    #[test]
    fn test_service_codes() {
        let err = classify_details(
            details(Some("NoSuchDistribution"), None, Some(404)),
            ResourceKind::Distribution,
            "E1",
        );
        assert!(err.is_not_found(ResourceKind::Distribution));

        let err = classify_details(
            details(Some("DistributionNotDisabled"), None, Some(409)),
            ResourceKind::Distribution,
            "E1",
        );
        assert!(matches!(err, CloudError::DistributionNotDisabled(_)));

        let err = classify_details(
            details(Some("BucketAlreadyOwnedByYou"), None, Some(409)),
            ResourceKind::Bucket,
            "site",
        );
        assert!(matches!(err, CloudError::AlreadyExists { .. }));
    }

    #[test]
    fn test_message_dependent_codes() {
        let err = classify_details(
            details(
                Some("InvalidChangeBatch"),
                Some("Tried to delete resource record set [name='www.example.com.', type='A'] but it was not found"),
                Some(400),
            ),
            ResourceKind::DnsRecord,
            "www.example.com",
        );
        assert!(err.is_not_found(ResourceKind::DnsRecord));

        let err = classify_details(
            details(
                Some("InvalidRequest"),
                Some("S3 Transfer Acceleration is not configured on this bucket"),
                Some(400),
            ),
            ResourceKind::Object,
            "site",
        );
        assert!(matches!(err, CloudError::AccelerationNotConfigured(_)));

        let err = classify_details(
            details(Some("InvalidChangeBatch"), Some("bad value"), Some(400)),
            ResourceKind::DnsRecord,
            "www.example.com",
        );
        assert!(matches!(err, CloudError::ApiError(_)));
    }
}
