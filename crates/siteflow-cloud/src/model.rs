//! Provider-neutral resource descriptions
//!
//! These types describe what the reconciler asks of a provider. Provider
//! crates translate them into their SDK's request shapes.

use serde::{Deserialize, Serialize};

/// Hosted zone id of the CloudFront edge, used as the alias target zone
/// for every distribution alias record.
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// A single CORS rule for a storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRule {
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age_seconds: i32,
}

/// Static website hosting configuration for a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    pub index_document: String,
    pub error_document: String,
}

/// An object to be written into a bucket
#[derive(Debug, Clone)]
pub struct UploadObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// How the CDN talks to an origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Storage bucket REST endpoint
    Bucket,
    /// Any other HTTP(S) endpoint. `port` replaces the scheme's default port.
    Custom { https_only: bool, port: Option<u16> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginSpec {
    pub id: String,
    pub domain_name: String,
    pub origin_path: String,
    pub kind: OriginKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBehaviorSpec {
    /// `None` for the default behaviour
    pub path_pattern: Option<String>,
    pub target_origin_id: String,
    pub min_ttl: i64,
    pub default_ttl: i64,
    pub max_ttl: i64,
    pub allowed_methods: Vec<String>,
    pub forward_query_string: bool,
    pub compress: bool,
}

/// Complete desired configuration of a CDN distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub comment: String,
    pub enabled: bool,
    pub default_root_object: String,
    pub price_class: String,
    pub origins: Vec<OriginSpec>,
    pub default_behavior: CacheBehaviorSpec,
    pub behaviors: Vec<CacheBehaviorSpec>,
    pub aliases: Vec<String>,
    /// Certificate attached to the aliases. `None` means the provider's
    /// default certificate.
    pub certificate_arn: Option<String>,
}

impl DistributionSpec {
    /// Remove the custom domain: no aliases, default certificate
    pub fn without_domain(mut self) -> Self {
        self.aliases.clear();
        self.certificate_arn = None;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Identity of a distribution as returned by create/update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInfo {
    pub id: String,
    pub arn: String,
    pub domain_name: String,
}

impl DistributionInfo {
    pub fn url(&self) -> String {
        format!("https://{}", self.domain_name)
    }
}

/// Current provider-side view of a distribution, including the concurrency
/// token every mutating call must present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSnapshot {
    pub info: DistributionInfo,
    pub etag: String,
    pub caller_reference: String,
    pub aliases: Vec<String>,
    pub enabled: bool,
    /// The last configuration change has reached every edge location
    pub deployed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    A,
    Cname,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Cname => write!(f, "CNAME"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordTarget {
    /// Alias to another provider resource (e.g. a CDN edge hostname)
    Alias {
        dns_name: String,
        hosted_zone_id: String,
    },
    /// Plain record value
    Value { value: String, ttl: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    pub record_type: RecordType,
    pub target: RecordTarget,
}

impl DnsRecord {
    /// Alias A record pointing `name` at a CloudFront distribution
    pub fn cdn_alias(name: impl Into<String>, distribution_domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::A,
            target: RecordTarget::Alias {
                dns_name: distribution_domain.into(),
                hosted_zone_id: CLOUDFRONT_HOSTED_ZONE_ID.to_string(),
            },
        }
    }

    pub fn cname(name: impl Into<String>, value: impl Into<String>, ttl: i64) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::Cname,
            target: RecordTarget::Value {
                value: value.into(),
                ttl,
            },
        }
    }
}

/// Lifecycle status of a managed certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    PendingValidation,
    Issued,
    ValidationTimedOut,
    Inactive,
    Expired,
    Revoked,
    Failed,
    Other(String),
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateStatus::PendingValidation => write!(f, "PENDING_VALIDATION"),
            CertificateStatus::Issued => write!(f, "ISSUED"),
            CertificateStatus::ValidationTimedOut => write!(f, "VALIDATION_TIMED_OUT"),
            CertificateStatus::Inactive => write!(f, "INACTIVE"),
            CertificateStatus::Expired => write!(f, "EXPIRED"),
            CertificateStatus::Revoked => write!(f, "REVOKED"),
            CertificateStatus::Failed => write!(f, "FAILED"),
            CertificateStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// DNS record the certificate authority wants to see before issuing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDetail {
    pub arn: String,
    pub domain_name: String,
    pub status: CertificateStatus,
    pub validation_record: Option<ValidationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdn_alias_targets_cloudfront_zone() {
        let record = DnsRecord::cdn_alias("www.example.com", "d111.cloudfront.net");
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(
            record.target,
            RecordTarget::Alias {
                dns_name: "d111.cloudfront.net".to_string(),
                hosted_zone_id: "Z2FDTNDATAQYW2".to_string(),
            }
        );
    }

    #[test]
    fn test_distribution_url() {
        let info = DistributionInfo {
            id: "E1".to_string(),
            arn: "arn:aws:cloudfront::123:distribution/E1".to_string(),
            domain_name: "d111.cloudfront.net".to_string(),
        };
        assert_eq!(info.url(), "https://d111.cloudfront.net");
    }
}
