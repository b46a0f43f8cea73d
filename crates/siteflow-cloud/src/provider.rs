//! Cloud provider trait definitions
//!
//! The reconciler only ever talks to these traits. Each one mirrors a single
//! provider control-plane API; implementations map provider failures onto
//! [`CloudError`](crate::CloudError) variants so callers can branch on them.

use crate::error::Result;
use crate::model::{
    CertificateDetail, CorsRule, DistributionInfo, DistributionSnapshot, DistributionSpec,
    DnsRecord, UploadObject, WebsiteConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Object storage (buckets and objects)
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Metadata-only existence probe
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    async fn put_bucket_accelerate(&self, bucket: &str, enabled: bool) -> Result<()>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &serde_json::Value) -> Result<()>;

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<()>;

    async fn put_bucket_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()>;

    async fn put_object(&self, bucket: &str, object: UploadObject) -> Result<()>;

    /// All object keys in the bucket
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

/// Content delivery network distributions
#[async_trait]
pub trait Cdn: Send + Sync {
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<DistributionInfo>;

    /// Fetch the current configuration token of a distribution
    async fn get_distribution(&self, id: &str) -> Result<DistributionSnapshot>;

    async fn update_distribution(
        &self,
        current: &DistributionSnapshot,
        spec: &DistributionSpec,
    ) -> Result<DistributionInfo>;

    async fn delete_distribution(&self, current: &DistributionSnapshot) -> Result<()>;

    async fn create_invalidation(&self, id: &str, paths: &[String]) -> Result<()>;
}

/// DNS hosted zones and records
#[async_trait]
pub trait Dns: Send + Sync {
    /// Id of the hosted zone serving exactly `domain`, if the account has one
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<String>>;

    async fn upsert_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()>;

    async fn delete_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()>;
}

/// Certificate authority issuing TLS certificates for custom domains
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// ARN of an existing certificate whose primary domain equals `domain`
    async fn find_certificate(&self, domain: &str) -> Result<Option<String>>;

    /// Request a DNS-validated certificate, returning its ARN
    async fn request_certificate(
        &self,
        domain: &str,
        subject_alternative_names: &[String],
    ) -> Result<String>;

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail>;
}

/// Provider handles used by a single deploy or remove invocation
#[derive(Clone)]
pub struct Clients {
    /// Storage client for bucket-level operations
    pub storage: Arc<dyn ObjectStorage>,
    /// Storage client routed through the acceleration endpoint; object
    /// operations only
    pub accelerated: Arc<dyn ObjectStorage>,
    pub cdn: Arc<dyn Cdn>,
    pub dns: Arc<dyn Dns>,
    pub certificates: Arc<dyn CertificateAuthority>,
}

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,

    /// Initial delay between attempts
    pub initial_delay: Duration,

    /// Maximum delay between attempts
    pub max_delay: Duration,

    /// Backoff multiplier (1.0 keeps the delay fixed)
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Fixed delay between attempts
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay to sleep after the given zero-based attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2), 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_does_not_grow() {
        let retry = RetryConfig::fixed(Duration::from_millis(2000), 5);
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(2000));
        assert_eq!(retry.delay_for_attempt(4), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10000),
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(retry.delay_for_attempt(4), Duration::from_millis(10000));
    }

    #[test]
    fn test_default_is_two_second_fixed() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 60);
        assert_eq!(retry.delay_for_attempt(10), Duration::from_secs(2));
    }
}
