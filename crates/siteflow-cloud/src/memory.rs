//! In-memory provider
//!
//! Implements every provider trait against process-local maps. It records
//! each call it receives, can lag behind creations the way real control planes
//! do, and can be told that a bucket name belongs to someone else. Used by
//! tests and, seeded from the recorded state, by `siteflow deploy --dry-run`.

use crate::error::{CloudError, ResourceKind, Result};
use crate::model::{
    CacheBehaviorSpec, CertificateDetail, CertificateStatus, CorsRule, DistributionInfo,
    DistributionSnapshot, DistributionSpec, DnsRecord, OriginKind, OriginSpec, RecordTarget,
    RecordType, UploadObject, ValidationRecord, WebsiteConfig,
};
use crate::provider::{CertificateAuthority, Cdn, Clients, Dns, ObjectStorage};
use crate::state::{StateStore, WebsiteState};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

const ACCOUNT_ID: &str = "000000000000";

/// Stored object body and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Bucket as held by [`MemoryCloud`]
#[derive(Debug, Clone, Default)]
pub struct MemoryBucket {
    pub region: String,
    pub objects: BTreeMap<String, StoredObject>,
    pub policy: Option<serde_json::Value>,
    pub cors: Vec<CorsRule>,
    pub website: Option<WebsiteConfig>,
    pub accelerated: bool,
    pending_heads: u32,
}

#[derive(Debug, Clone)]
struct MemoryDistribution {
    info: DistributionInfo,
    spec: DistributionSpec,
    caller_reference: String,
    version: u32,
    /// `get_distribution` calls left before the last change is deployed
    pending_gets: u32,
}

impl MemoryDistribution {
    fn etag(&self) -> String {
        format!("{}-v{}", self.info.id, self.version)
    }
}

#[derive(Debug, Clone)]
struct MemoryZone {
    name: String,
    records: BTreeMap<(String, String), DnsRecord>,
}

#[derive(Debug, Clone)]
struct MemoryCertificate {
    domain: String,
    subject_alternative_names: Vec<String>,
    status: CertificateStatus,
    validation_record: ValidationRecord,
    record_lag: u32,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: BTreeMap<String, MemoryBucket>,
    taken_buckets: HashMap<String, Option<String>>,
    consistency_lag: u32,
    deployment_lag: u32,
    distributions: BTreeMap<String, MemoryDistribution>,
    zones: BTreeMap<String, MemoryZone>,
    certificates: BTreeMap<String, MemoryCertificate>,
    invalidations: Vec<(String, Vec<String>)>,
    next_id: u32,
    calls: Vec<String>,
}

impl Inner {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn bucket_mut(&mut self, bucket: &str) -> Result<&mut MemoryBucket> {
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Bucket, bucket))
    }

    fn distribution_mut(&mut self, id: &str) -> Result<&mut MemoryDistribution> {
        self.distributions
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Distribution, id))
    }

    fn has_record(&self, name: &str, value: &str) -> bool {
        self.zones.values().any(|zone| {
            zone.records.values().any(|r| {
                r.name == name
                    && matches!(&r.target, RecordTarget::Value { value: v, .. } if v == value)
            })
        })
    }
}

/// Process-local cloud
#[derive(Debug, Clone, Default)]
pub struct MemoryCloud {
    inner: Arc<Mutex<Inner>>,
    accelerated: bool,
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn service(&self) -> &'static str {
        if self.accelerated { "s3-accelerate" } else { "s3" }
    }

    fn record(&self, inner: &mut Inner, call: String) {
        tracing::debug!("memory cloud: {}", call);
        inner.calls.push(call);
    }

    /// Handle sharing this cloud but routed through the acceleration endpoint
    pub fn accelerated(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            accelerated: true,
        }
    }

    /// Provider bundle backed by this cloud
    pub fn clients(&self) -> Clients {
        Clients {
            storage: Arc::new(self.clone()),
            accelerated: Arc::new(self.accelerated()),
            cdn: Arc::new(self.clone()),
            dns: Arc::new(self.clone()),
            certificates: Arc::new(self.clone()),
        }
    }

    /// Newly created buckets and certificates answer "not yet there" for
    /// `lag` probes before they become visible
    pub fn with_consistency_lag(self, lag: u32) -> Self {
        self.lock().consistency_lag = lag;
        self
    }

    /// Created or updated distributions report "in progress" for the next
    /// `lag` reads. Deleting through an in-progress snapshot fails.
    pub fn with_deployment_lag(self, lag: u32) -> Self {
        self.lock().deployment_lag = lag;
        self
    }

    /// Mark a bucket name as owned by another account
    pub fn with_taken_bucket(self, name: &str, message: Option<&str>) -> Self {
        self.lock()
            .taken_buckets
            .insert(name.to_string(), message.map(str::to_string));
        self
    }

    /// Register a hosted zone and return its id
    pub fn add_hosted_zone(&self, domain: &str) -> String {
        let mut inner = self.lock();
        let id = format!("Z{:04}", inner.next_id());
        inner.zones.insert(
            id.clone(),
            MemoryZone {
                name: domain.trim_end_matches('.').to_string(),
                records: BTreeMap::new(),
            },
        );
        id
    }

    /// Register an existing certificate and return its ARN
    pub fn add_certificate(&self, domain: &str, status: CertificateStatus) -> String {
        let mut inner = self.lock();
        let n = inner.next_id();
        let arn = certificate_arn(n);
        inner.certificates.insert(
            arn.clone(),
            MemoryCertificate {
                domain: domain.to_string(),
                subject_alternative_names: vec![domain.to_string()],
                status,
                validation_record: validation_record(n, domain),
                record_lag: 0,
            },
        );
        arn
    }

    /// Load the resources recorded in `state`, as they would exist after the
    /// deploy that wrote it. Nothing is recorded as a call.
    pub fn seed_from_state(&self, state: &WebsiteState) {
        let mut inner = self.lock();

        if let Some(bucket) = &state.bucket_name {
            inner.buckets.insert(
                bucket.clone(),
                MemoryBucket {
                    region: state.region.clone().unwrap_or_default(),
                    accelerated: !bucket.contains('.'),
                    ..Default::default()
                },
            );
        }

        let live_aliases = match (&state.domain, &state.naked_domain) {
            (Some(domain), Some(naked)) if state.certificate_valid => {
                let mut aliases = vec![domain.clone()];
                if *domain == format!("www.{naked}") {
                    aliases.push(naked.clone());
                }
                aliases
            }
            _ => Vec::new(),
        };

        let mut distribution_domain = None;
        if let Some(id) = &state.distribution_id {
            let domain_name = state
                .distribution_url
                .as_deref()
                .map(|url| url.trim_start_matches("https://").to_string())
                .unwrap_or_else(|| format!("{}.cloudfront.net", id.to_lowercase()));
            let info = DistributionInfo {
                id: id.clone(),
                arn: state
                    .distribution_arn
                    .clone()
                    .unwrap_or_else(|| format!("arn:aws:cloudfront::{ACCOUNT_ID}:distribution/{id}")),
                domain_name: domain_name.clone(),
            };
            inner.distributions.insert(
                id.clone(),
                MemoryDistribution {
                    info,
                    spec: recorded_distribution_spec(state, &live_aliases),
                    caller_reference: format!("ref-{id}"),
                    version: 1,
                    pending_gets: 0,
                },
            );
            distribution_domain = Some(domain_name);
        }

        if let (Some(zone_id), Some(naked)) = (&state.domain_hosted_zone_id, &state.naked_domain) {
            let records = match &distribution_domain {
                Some(target) => live_aliases
                    .iter()
                    .map(|name| {
                        let record = DnsRecord::cdn_alias(name, target);
                        ((record.name.clone(), record.record_type.to_string()), record)
                    })
                    .collect(),
                None => BTreeMap::new(),
            };
            inner.zones.insert(
                zone_id.clone(),
                MemoryZone {
                    name: naked.clone(),
                    records,
                },
            );
        }

        if let (Some(arn), Some(naked)) = (&state.certificate_arn, &state.naked_domain) {
            let n = inner.next_id();
            inner.certificates.insert(
                arn.clone(),
                MemoryCertificate {
                    domain: naked.clone(),
                    subject_alternative_names: vec![naked.clone(), format!("*.{naked}")],
                    status: if state.certificate_valid {
                        CertificateStatus::Issued
                    } else {
                        CertificateStatus::PendingValidation
                    },
                    validation_record: validation_record(n, naked),
                    record_lag: 0,
                },
            );
        }
    }

    /// Every call received so far, e.g. `s3:head_bucket site`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn bucket(&self, name: &str) -> Option<MemoryBucket> {
        self.lock().buckets.get(name).cloned()
    }

    pub fn distribution(&self, id: &str) -> Option<DistributionSpec> {
        self.lock().distributions.get(id).map(|d| d.spec.clone())
    }

    pub fn distribution_count(&self) -> usize {
        self.lock().distributions.len()
    }

    /// Drop a distribution behind the caller's back
    pub fn forget_distribution(&self, id: &str) {
        self.lock().distributions.remove(id);
    }

    pub fn records(&self, zone_id: &str) -> Vec<DnsRecord> {
        self.lock()
            .zones
            .get(zone_id)
            .map(|z| z.records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn invalidations(&self) -> Vec<(String, Vec<String>)> {
        self.lock().invalidations.clone()
    }

    /// Subject alternative names of every certificate, keyed by ARN
    pub fn certificate_names(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .certificates
            .iter()
            .map(|(arn, c)| (arn.clone(), c.subject_alternative_names.clone()))
            .collect()
    }
}

/// Bucket-only distribution carrying the recorded aliases
fn recorded_distribution_spec(state: &WebsiteState, aliases: &[String]) -> DistributionSpec {
    let bucket = state.bucket_name.clone().unwrap_or_default();
    let origin_id = format!("S3-{bucket}");
    DistributionSpec {
        comment: format!("siteflow website {bucket}"),
        enabled: true,
        default_root_object: "index.html".to_string(),
        price_class: "PriceClass_All".to_string(),
        origins: vec![OriginSpec {
            id: origin_id.clone(),
            domain_name: format!("{bucket}.s3.amazonaws.com"),
            origin_path: String::new(),
            kind: OriginKind::Bucket,
        }],
        default_behavior: CacheBehaviorSpec {
            path_pattern: None,
            target_origin_id: origin_id,
            min_ttl: 0,
            default_ttl: 0,
            max_ttl: 31_536_000,
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
            forward_query_string: false,
            compress: true,
        },
        behaviors: Vec::new(),
        aliases: aliases.to_vec(),
        certificate_arn: if aliases.is_empty() {
            None
        } else {
            state.certificate_arn.clone()
        },
    }
}

fn certificate_arn(n: u32) -> String {
    format!("arn:aws:acm:us-east-1:{ACCOUNT_ID}:certificate/{n:08}")
}

fn validation_record(n: u32, domain: &str) -> ValidationRecord {
    ValidationRecord {
        name: format!("_v{n:04}.{domain}."),
        record_type: RecordType::Cname,
        value: format!("_v{n:04}.acm-validations.aws."),
    }
}

#[async_trait]
impl ObjectStorage for MemoryCloud {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:head_bucket {}", self.service(), bucket));

        if let Some(message) = inner.taken_buckets.get(bucket) {
            return Err(CloudError::Forbidden {
                kind: ResourceKind::Bucket,
                id: bucket.to_string(),
                message: message.clone(),
            });
        }

        let found = inner.bucket_mut(bucket)?;
        if found.pending_heads > 0 {
            found.pending_heads -= 1;
            return Err(CloudError::not_found(ResourceKind::Bucket, bucket));
        }
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("{}:create_bucket {} {}", self.service(), bucket, region),
        );

        if inner.buckets.contains_key(bucket) {
            return Err(CloudError::AlreadyExists {
                kind: ResourceKind::Bucket,
                id: bucket.to_string(),
            });
        }
        let pending_heads = inner.consistency_lag;
        inner.buckets.insert(
            bucket.to_string(),
            MemoryBucket {
                region: region.to_string(),
                pending_heads,
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn put_bucket_accelerate(&self, bucket: &str, enabled: bool) -> Result<()> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("{}:put_bucket_accelerate {} {}", self.service(), bucket, enabled),
        );
        inner.bucket_mut(bucket)?.accelerated = enabled;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &serde_json::Value) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:put_bucket_policy {}", self.service(), bucket));
        inner.bucket_mut(bucket)?.policy = Some(policy.clone());
        Ok(())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:put_bucket_cors {}", self.service(), bucket));
        inner.bucket_mut(bucket)?.cors = rules.to_vec();
        Ok(())
    }

    async fn put_bucket_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:put_bucket_website {}", self.service(), bucket));
        inner.bucket_mut(bucket)?.website = Some(website.clone());
        Ok(())
    }

    async fn put_object(&self, bucket: &str, object: UploadObject) -> Result<()> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("{}:put_object {}/{}", self.service(), bucket, object.key),
        );
        let accelerated = self.accelerated;
        let found = inner.bucket_mut(bucket)?;
        if accelerated && !found.accelerated {
            return Err(CloudError::AccelerationNotConfigured(bucket.to_string()));
        }
        found.objects.insert(
            object.key,
            StoredObject {
                body: object.body,
                content_type: object.content_type,
            },
        );
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:list_objects {}", self.service(), bucket));
        Ok(inner.bucket_mut(bucket)?.objects.keys().cloned().collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("{}:delete_object {}/{}", self.service(), bucket, key),
        );
        inner.bucket_mut(bucket)?.objects.remove(key);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("{}:delete_bucket {}", self.service(), bucket));
        if !inner.bucket_mut(bucket)?.objects.is_empty() {
            return Err(CloudError::ApiError(format!(
                "BucketNotEmpty: bucket {bucket} still holds objects"
            )));
        }
        inner.buckets.remove(bucket);
        Ok(())
    }
}

#[async_trait]
impl Cdn for MemoryCloud {
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<DistributionInfo> {
        let mut inner = self.lock();
        self.record(&mut inner, "cloudfront:create_distribution".to_string());

        let mut n = inner.next_id();
        // seeded distributions keep their recorded ids
        while inner.distributions.contains_key(&format!("E{n:04}")) {
            n = inner.next_id();
        }
        let id = format!("E{n:04}");
        let pending_gets = inner.deployment_lag;
        let info = DistributionInfo {
            arn: format!("arn:aws:cloudfront::{ACCOUNT_ID}:distribution/{id}"),
            domain_name: format!("d{n:04}.cloudfront.net"),
            id: id.clone(),
        };
        inner.distributions.insert(
            id.clone(),
            MemoryDistribution {
                info: info.clone(),
                spec: spec.clone(),
                caller_reference: format!("ref-{n}"),
                version: 1,
                pending_gets,
            },
        );
        Ok(info)
    }

    async fn get_distribution(&self, id: &str) -> Result<DistributionSnapshot> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("cloudfront:get_distribution {id}"));
        let found = inner.distribution_mut(id)?;
        let snapshot = DistributionSnapshot {
            info: found.info.clone(),
            etag: found.etag(),
            caller_reference: found.caller_reference.clone(),
            aliases: found.spec.aliases.clone(),
            enabled: found.spec.enabled,
            deployed: found.pending_gets == 0,
        };
        found.pending_gets = found.pending_gets.saturating_sub(1);
        Ok(snapshot)
    }

    async fn update_distribution(
        &self,
        current: &DistributionSnapshot,
        spec: &DistributionSpec,
    ) -> Result<DistributionInfo> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("cloudfront:update_distribution {}", current.info.id),
        );
        let deployment_lag = inner.deployment_lag;
        let found = inner.distribution_mut(&current.info.id)?;
        if found.etag() != current.etag {
            return Err(CloudError::ApiError(format!(
                "PreconditionFailed: stale etag {} for {}",
                current.etag, current.info.id
            )));
        }
        found.spec = spec.clone();
        found.version += 1;
        found.pending_gets = deployment_lag;
        Ok(found.info.clone())
    }

    async fn delete_distribution(&self, current: &DistributionSnapshot) -> Result<()> {
        let mut inner = self.lock();
        self.record(
            &mut inner,
            format!("cloudfront:delete_distribution {}", current.info.id),
        );
        let found = inner.distribution_mut(&current.info.id)?;
        // CloudFront refuses while the disabling change is still in progress
        if found.spec.enabled || !current.deployed {
            return Err(CloudError::DistributionNotDisabled(current.info.id.clone()));
        }
        inner.distributions.remove(&current.info.id);
        Ok(())
    }

    async fn create_invalidation(&self, id: &str, paths: &[String]) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("cloudfront:create_invalidation {id}"));
        inner.distribution_mut(id)?;
        inner.invalidations.push((id.to_string(), paths.to_vec()));
        Ok(())
    }
}

#[async_trait]
impl Dns for MemoryCloud {
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<String>> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("route53:find_hosted_zone {domain}"));
        let wanted = domain.trim_end_matches('.');
        Ok(inner
            .zones
            .iter()
            .find(|(_, zone)| zone.name == wanted)
            .map(|(id, _)| id.clone()))
    }

    async fn upsert_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("route53:upsert_records {zone_id}"));
        let zone = inner
            .zones
            .get_mut(zone_id)
            .ok_or_else(|| CloudError::not_found(ResourceKind::HostedZone, zone_id))?;
        for record in records {
            zone.records.insert(
                (record.name.clone(), record.record_type.to_string()),
                record.clone(),
            );
        }
        Ok(())
    }

    async fn delete_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("route53:delete_records {zone_id}"));
        let zone = inner
            .zones
            .get_mut(zone_id)
            .ok_or_else(|| CloudError::not_found(ResourceKind::HostedZone, zone_id))?;
        // a change batch is atomic: validate every record before deleting any
        for record in records {
            let key = (record.name.clone(), record.record_type.to_string());
            if !zone.records.contains_key(&key) {
                return Err(CloudError::not_found(ResourceKind::DnsRecord, &record.name));
            }
        }
        for record in records {
            zone.records
                .remove(&(record.name.clone(), record.record_type.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateAuthority for MemoryCloud {
    async fn find_certificate(&self, domain: &str) -> Result<Option<String>> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("acm:find_certificate {domain}"));
        Ok(inner
            .certificates
            .iter()
            .find(|(_, c)| c.domain == domain)
            .map(|(arn, _)| arn.clone()))
    }

    async fn request_certificate(
        &self,
        domain: &str,
        subject_alternative_names: &[String],
    ) -> Result<String> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("acm:request_certificate {domain}"));
        let n = inner.next_id();
        let arn = certificate_arn(n);
        let record_lag = inner.consistency_lag;
        inner.certificates.insert(
            arn.clone(),
            MemoryCertificate {
                domain: domain.to_string(),
                subject_alternative_names: subject_alternative_names.to_vec(),
                status: CertificateStatus::PendingValidation,
                validation_record: validation_record(n, domain),
                record_lag,
            },
        );
        Ok(arn)
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail> {
        let mut inner = self.lock();
        self.record(&mut inner, format!("acm:describe_certificate {arn}"));
        let cert = inner
            .certificates
            .get(arn)
            .cloned()
            .ok_or_else(|| CloudError::not_found(ResourceKind::Certificate, arn))?;

        let mut status = cert.status.clone();
        let mut validation_record = Some(cert.validation_record.clone());

        if status == CertificateStatus::PendingValidation {
            if cert.record_lag > 0 {
                validation_record = None;
                if let Some(c) = inner.certificates.get_mut(arn) {
                    c.record_lag -= 1;
                }
            } else if inner.has_record(&cert.validation_record.name, &cert.validation_record.value)
            {
                status = CertificateStatus::Issued;
                if let Some(c) = inner.certificates.get_mut(arn) {
                    c.status = CertificateStatus::Issued;
                }
            }
        }

        Ok(CertificateDetail {
            arn: arn.to_string(),
            domain_name: cert.domain,
            status,
            validation_record,
        })
    }
}

/// [`StateStore`] keeping the record in memory and counting flushes
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<Mutex<(WebsiteState, usize)>>,
}

impl MemoryStateStore {
    pub fn new(state: WebsiteState) -> Self {
        Self {
            inner: Arc::new(Mutex::new((state, 0))),
        }
    }

    /// Last saved state
    pub fn state(&self) -> WebsiteState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0.clone()
    }

    /// Number of saves so far
    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<WebsiteState> {
        Ok(self.state())
    }

    async fn save(&self, state: &WebsiteState) -> Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.0 = state.clone();
        guard.1 += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_visible_after_lag() {
        let cloud = MemoryCloud::new().with_consistency_lag(2);
        cloud.create_bucket("site", "us-east-1").await.unwrap();

        assert!(cloud.head_bucket("site").await.is_err());
        assert!(cloud.head_bucket("site").await.is_err());
        assert!(cloud.head_bucket("site").await.is_ok());
    }

    #[tokio::test]
    async fn test_accelerated_put_requires_acceleration() {
        let cloud = MemoryCloud::new();
        cloud.create_bucket("site", "us-east-1").await.unwrap();
        let object = UploadObject {
            key: "index.html".to_string(),
            body: b"<h1>hi</h1>".to_vec(),
            content_type: "text/html".to_string(),
        };

        let err = cloud
            .accelerated()
            .put_object("site", object.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::AccelerationNotConfigured(_)));

        cloud.put_bucket_accelerate("site", true).await.unwrap();
        cloud.accelerated().put_object("site", object).await.unwrap();
        assert!(cloud.bucket("site").unwrap().objects.contains_key("index.html"));
    }

    #[tokio::test]
    async fn test_certificate_issues_once_validation_record_exists() {
        let cloud = MemoryCloud::new();
        let zone = cloud.add_hosted_zone("example.com");
        let arn = cloud
            .request_certificate("example.com", &["example.com".to_string()])
            .await
            .unwrap();

        let pending = cloud.describe_certificate(&arn).await.unwrap();
        assert_eq!(pending.status, CertificateStatus::PendingValidation);
        let record = pending.validation_record.unwrap();

        cloud
            .upsert_records(&zone, &[DnsRecord::cname(&record.name, &record.value, 300)])
            .await
            .unwrap();

        let issued = cloud.describe_certificate(&arn).await.unwrap();
        assert_eq!(issued.status, CertificateStatus::Issued);
    }

    #[tokio::test]
    async fn test_seed_from_state() {
        let cloud = MemoryCloud::new();
        let state = WebsiteState {
            bucket_name: Some("my-site".to_string()),
            region: Some("eu-west-1".to_string()),
            distribution_id: Some("E0001".to_string()),
            distribution_url: Some("https://d0001.cloudfront.net".to_string()),
            domain: Some("www.example.com".to_string()),
            naked_domain: Some("example.com".to_string()),
            domain_hosted_zone_id: Some("ZSEED".to_string()),
            certificate_arn: Some("arn:aws:acm:us-east-1:1:certificate/seed".to_string()),
            certificate_valid: true,
            configured: true,
            ..Default::default()
        };
        cloud.seed_from_state(&state);
        assert!(cloud.calls().is_empty());

        let bucket = cloud.bucket("my-site").unwrap();
        assert_eq!(bucket.region, "eu-west-1");
        assert!(bucket.accelerated);
        cloud.head_bucket("my-site").await.unwrap();

        let snapshot = cloud.get_distribution("E0001").await.unwrap();
        assert_eq!(snapshot.info.domain_name, "d0001.cloudfront.net");
        assert_eq!(snapshot.aliases, vec!["www.example.com", "example.com"]);
        assert!(snapshot.enabled);

        assert_eq!(
            cloud.find_hosted_zone("example.com").await.unwrap().as_deref(),
            Some("ZSEED")
        );
        assert_eq!(cloud.records("ZSEED").len(), 2);
        let detail = cloud
            .describe_certificate("arn:aws:acm:us-east-1:1:certificate/seed")
            .await
            .unwrap();
        assert_eq!(detail.status, CertificateStatus::Issued);

        // new distributions never reuse a seeded id
        let created = cloud
            .create_distribution(&cloud.distribution("E0001").unwrap())
            .await
            .unwrap();
        assert_ne!(created.id, "E0001");
        assert_eq!(cloud.distribution_count(), 2);
    }

    #[tokio::test]
    async fn test_disabled_distribution_waits_for_deployment() {
        let cloud = MemoryCloud::new().with_deployment_lag(1);
        let mut spec = recorded_distribution_spec(&WebsiteState::new(), &[]);
        let info = cloud.create_distribution(&spec).await.unwrap();

        let snapshot = cloud.get_distribution(&info.id).await.unwrap();
        assert!(!snapshot.deployed);
        spec.enabled = false;
        cloud.update_distribution(&snapshot, &spec).await.unwrap();

        let in_progress = cloud.get_distribution(&info.id).await.unwrap();
        assert!(!in_progress.enabled);
        assert!(!in_progress.deployed);
        assert!(matches!(
            cloud.delete_distribution(&in_progress).await,
            Err(CloudError::DistributionNotDisabled(_))
        ));

        let deployed = cloud.get_distribution(&info.id).await.unwrap();
        assert!(deployed.deployed);
        cloud.delete_distribution(&deployed).await.unwrap();
        assert_eq!(cloud.distribution_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_state_store_counts_saves() {
        let store = MemoryStateStore::default();
        let state = WebsiteState {
            bucket_name: Some("site".to_string()),
            ..Default::default()
        };
        store.save(&state).await.unwrap();
        store.save(&state).await.unwrap();
        assert_eq!(store.saves(), 2);
        assert_eq!(store.load().await.unwrap(), state);
    }
}
