//! CloudFront implementation of [`Cdn`]

use crate::error::{build_error, classify};
use async_trait::async_trait;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::types::{
    Aliases, AllowedMethods, CacheBehavior, CacheBehaviors, CachedMethods, CookiePreference,
    CustomOriginConfig, DefaultCacheBehavior, Distribution, DistributionConfig, ForwardedValues,
    InvalidationBatch, ItemSelection, Method, MinimumProtocolVersion, Origin,
    OriginProtocolPolicy, Origins, Paths, PriceClass, S3OriginConfig, SslSupportMethod,
    TrustedSigners, ViewerCertificate, ViewerProtocolPolicy,
};
use siteflow_cloud::{
    CacheBehaviorSpec, Cdn, CloudError, DistributionInfo, DistributionSnapshot, DistributionSpec,
    OriginKind, OriginSpec, ResourceKind, Result,
};

const MINIMUM_TLS_VERSION: &str = "TLSv1.2_2021";

#[derive(Debug, Clone)]
pub struct CloudFrontCdn {
    client: Client,
}

impl CloudFrontCdn {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Distribution status once a change has reached every edge location
const DEPLOYED_STATUS: &str = "Deployed";

fn quantity(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

fn methods(names: &[String]) -> Vec<Method> {
    names.iter().map(|m| Method::from(m.as_str())).collect()
}

fn build_origin(origin: &OriginSpec) -> Result<Origin> {
    let builder = Origin::builder()
        .id(&origin.id)
        .domain_name(&origin.domain_name)
        .origin_path(&origin.origin_path);

    let builder = match origin.kind {
        OriginKind::Bucket => builder.s3_origin_config(
            S3OriginConfig::builder()
                .origin_access_identity("")
                .build(),
        ),
        OriginKind::Custom { https_only, port } => builder.custom_origin_config(
            CustomOriginConfig::builder()
                .http_port(port.filter(|_| !https_only).map_or(80, i32::from))
                .https_port(port.filter(|_| https_only).map_or(443, i32::from))
                .origin_protocol_policy(if https_only {
                    OriginProtocolPolicy::HttpsOnly
                } else {
                    OriginProtocolPolicy::HttpOnly
                })
                .build()
                .map_err(build_error)?,
        ),
    };

    builder.build().map_err(build_error)
}

fn forwarded_values(behavior: &CacheBehaviorSpec) -> Result<ForwardedValues> {
    ForwardedValues::builder()
        .query_string(behavior.forward_query_string)
        .cookies(
            CookiePreference::builder()
                .forward(ItemSelection::None)
                .build()
                .map_err(build_error)?,
        )
        .build()
        .map_err(build_error)
}

fn allowed_methods(behavior: &CacheBehaviorSpec) -> Result<AllowedMethods> {
    let read = ["GET".to_string(), "HEAD".to_string()];
    AllowedMethods::builder()
        .quantity(quantity(behavior.allowed_methods.len()))
        .set_items(Some(methods(&behavior.allowed_methods)))
        .cached_methods(
            CachedMethods::builder()
                .quantity(quantity(read.len()))
                .set_items(Some(methods(&read)))
                .build()
                .map_err(build_error)?,
        )
        .build()
        .map_err(build_error)
}

fn trusted_signers() -> Result<TrustedSigners> {
    TrustedSigners::builder()
        .enabled(false)
        .quantity(0)
        .build()
        .map_err(build_error)
}

fn default_cache_behavior(behavior: &CacheBehaviorSpec) -> Result<DefaultCacheBehavior> {
    DefaultCacheBehavior::builder()
        .target_origin_id(&behavior.target_origin_id)
        .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
        .allowed_methods(allowed_methods(behavior)?)
        .forwarded_values(forwarded_values(behavior)?)
        .trusted_signers(trusted_signers()?)
        .min_ttl(behavior.min_ttl)
        .default_ttl(behavior.default_ttl)
        .max_ttl(behavior.max_ttl)
        .compress(behavior.compress)
        .build()
        .map_err(build_error)
}

fn cache_behavior(behavior: &CacheBehaviorSpec) -> Result<CacheBehavior> {
    let path_pattern = behavior.path_pattern.as_deref().ok_or_else(|| {
        CloudError::InvalidConfig("cache behaviour without a path pattern".to_string())
    })?;
    CacheBehavior::builder()
        .path_pattern(path_pattern)
        .target_origin_id(&behavior.target_origin_id)
        .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
        .allowed_methods(allowed_methods(behavior)?)
        .forwarded_values(forwarded_values(behavior)?)
        .trusted_signers(trusted_signers()?)
        .min_ttl(behavior.min_ttl)
        .default_ttl(behavior.default_ttl)
        .max_ttl(behavior.max_ttl)
        .compress(behavior.compress)
        .build()
        .map_err(build_error)
}

fn viewer_certificate(certificate_arn: Option<&str>) -> ViewerCertificate {
    match certificate_arn {
        Some(arn) => ViewerCertificate::builder()
            .acm_certificate_arn(arn)
            .ssl_support_method(SslSupportMethod::SniOnly)
            .minimum_protocol_version(MinimumProtocolVersion::from(MINIMUM_TLS_VERSION))
            .build(),
        None => ViewerCertificate::builder()
            .cloud_front_default_certificate(true)
            .build(),
    }
}

/// Translate the desired spec into a CloudFront distribution config
pub(crate) fn distribution_config(
    spec: &DistributionSpec,
    caller_reference: &str,
) -> Result<DistributionConfig> {
    let origins = spec
        .origins
        .iter()
        .map(build_origin)
        .collect::<Result<Vec<_>>>()?;
    let behaviors = spec
        .behaviors
        .iter()
        .map(cache_behavior)
        .collect::<Result<Vec<_>>>()?;

    let mut cache_behaviors = CacheBehaviors::builder().quantity(quantity(behaviors.len()));
    if !behaviors.is_empty() {
        cache_behaviors = cache_behaviors.set_items(Some(behaviors));
    }

    let mut aliases = Aliases::builder().quantity(quantity(spec.aliases.len()));
    if !spec.aliases.is_empty() {
        aliases = aliases.set_items(Some(spec.aliases.clone()));
    }

    DistributionConfig::builder()
        .caller_reference(caller_reference)
        .comment(&spec.comment)
        .enabled(spec.enabled)
        .default_root_object(&spec.default_root_object)
        .price_class(PriceClass::from(spec.price_class.as_str()))
        .origins(
            Origins::builder()
                .quantity(quantity(origins.len()))
                .set_items(Some(origins))
                .build()
                .map_err(build_error)?,
        )
        .default_cache_behavior(default_cache_behavior(&spec.default_behavior)?)
        .cache_behaviors(cache_behaviors.build().map_err(build_error)?)
        .aliases(aliases.build().map_err(build_error)?)
        .viewer_certificate(viewer_certificate(spec.certificate_arn.as_deref()))
        .build()
        .map_err(build_error)
}

fn distribution_info(distribution: &Distribution) -> DistributionInfo {
    DistributionInfo {
        id: distribution.id().to_string(),
        arn: distribution.arn().to_string(),
        domain_name: distribution.domain_name().to_string(),
    }
}

fn missing(id: &str, what: &str) -> CloudError {
    CloudError::ApiError(format!("CloudFront returned no {what} for distribution {id}"))
}

#[async_trait]
impl Cdn for CloudFrontCdn {
    async fn create_distribution(&self, spec: &DistributionSpec) -> Result<DistributionInfo> {
        let caller_reference = uuid::Uuid::new_v4().to_string();
        tracing::debug!("cloudfront create_distribution {}", caller_reference);

        let response = self
            .client
            .create_distribution()
            .distribution_config(distribution_config(spec, &caller_reference)?)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Distribution, &caller_reference))?;

        response
            .distribution()
            .map(distribution_info)
            .ok_or_else(|| missing(&caller_reference, "distribution"))
    }

    async fn get_distribution(&self, id: &str) -> Result<DistributionSnapshot> {
        tracing::debug!("cloudfront get_distribution {}", id);
        let response = self
            .client
            .get_distribution()
            .id(id)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Distribution, id))?;

        let distribution = response
            .distribution()
            .ok_or_else(|| missing(id, "distribution"))?;
        let config = distribution
            .distribution_config()
            .ok_or_else(|| missing(id, "configuration"))?;
        let etag = response.e_tag().ok_or_else(|| missing(id, "ETag"))?;

        Ok(DistributionSnapshot {
            info: distribution_info(distribution),
            etag: etag.to_string(),
            caller_reference: config.caller_reference().to_string(),
            aliases: config
                .aliases()
                .map(|aliases| aliases.items().to_vec())
                .unwrap_or_default(),
            enabled: config.enabled(),
            deployed: distribution.status() == DEPLOYED_STATUS,
        })
    }

    async fn update_distribution(
        &self,
        current: &DistributionSnapshot,
        spec: &DistributionSpec,
    ) -> Result<DistributionInfo> {
        let id = &current.info.id;
        tracing::debug!("cloudfront update_distribution {}", id);

        let response = self
            .client
            .update_distribution()
            .id(id)
            .if_match(&current.etag)
            .distribution_config(distribution_config(spec, &current.caller_reference)?)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Distribution, id))?;

        Ok(response
            .distribution()
            .map(distribution_info)
            .unwrap_or_else(|| current.info.clone()))
    }

    async fn delete_distribution(&self, current: &DistributionSnapshot) -> Result<()> {
        let id = &current.info.id;
        tracing::debug!("cloudfront delete_distribution {}", id);
        self.client
            .delete_distribution()
            .id(id)
            .if_match(&current.etag)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Distribution, id))?;
        Ok(())
    }

    async fn create_invalidation(&self, id: &str, paths: &[String]) -> Result<()> {
        tracing::debug!("cloudfront create_invalidation {} {:?}", id, paths);
        let batch = InvalidationBatch::builder()
            .caller_reference(uuid::Uuid::new_v4().to_string())
            .paths(
                Paths::builder()
                    .quantity(quantity(paths.len()))
                    .set_items(Some(paths.to_vec()))
                    .build()
                    .map_err(build_error)?,
            )
            .build()
            .map_err(build_error)?;

        self.client
            .create_invalidation()
            .distribution_id(id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Distribution, id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behavior(path_pattern: Option<&str>) -> CacheBehaviorSpec {
        CacheBehaviorSpec {
            path_pattern: path_pattern.map(str::to_string),
            target_origin_id: "S3-site".to_string(),
            min_ttl: 0,
            default_ttl: 0,
            max_ttl: 31_536_000,
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
            forward_query_string: false,
            compress: true,
        }
    }

    fn spec() -> DistributionSpec {
        DistributionSpec {
            comment: "siteflow website site".to_string(),
            enabled: true,
            default_root_object: "index.html".to_string(),
            price_class: "PriceClass_All".to_string(),
            origins: vec![OriginSpec {
                id: "S3-site".to_string(),
                domain_name: "site.s3.amazonaws.com".to_string(),
                origin_path: String::new(),
                kind: OriginKind::Bucket,
            }],
            default_behavior: behavior(None),
            behaviors: vec![behavior(Some("/api/*"))],
            aliases: vec!["www.example.com".to_string()],
            certificate_arn: Some("arn:aws:acm:us-east-1:1:certificate/x".to_string()),
        }
    }

    #[test]
    fn test_distribution_config_shape() {
        let config = distribution_config(&spec(), "ref-1").unwrap();
        assert_eq!(config.caller_reference(), "ref-1");
        assert_eq!(config.origins().map(|o| o.quantity()), Some(1));
        assert_eq!(config.cache_behaviors().map(|b| b.quantity()), Some(1));
        assert_eq!(
            config.aliases().map(|a| a.items().to_vec()),
            Some(vec!["www.example.com".to_string()])
        );
        let certificate = config.viewer_certificate().unwrap();
        assert_eq!(certificate.ssl_support_method(), Some(&SslSupportMethod::SniOnly));
    }

    #[test]
    fn test_default_certificate_without_domain() {
        let config = distribution_config(&spec().without_domain(), "ref-1").unwrap();
        assert_eq!(config.aliases().map(|a| a.quantity()), Some(0));
        assert_eq!(
            config
                .viewer_certificate()
                .and_then(|c| c.cloud_front_default_certificate()),
            Some(true)
        );
    }

    #[test]
    fn test_custom_origin_ports() {
        let origin = |https_only, port| OriginSpec {
            id: "api".to_string(),
            domain_name: "api.example.com".to_string(),
            origin_path: String::new(),
            kind: OriginKind::Custom { https_only, port },
        };

        let default = build_origin(&origin(true, None)).unwrap();
        let config = default.custom_origin_config().unwrap();
        assert_eq!((config.http_port(), config.https_port()), (80, 443));

        let https = build_origin(&origin(true, Some(8443))).unwrap();
        let config = https.custom_origin_config().unwrap();
        assert_eq!((config.http_port(), config.https_port()), (80, 8443));
        assert_eq!(config.origin_protocol_policy(), &OriginProtocolPolicy::HttpsOnly);

        let http = build_origin(&origin(false, Some(8080))).unwrap();
        let config = http.custom_origin_config().unwrap();
        assert_eq!((config.http_port(), config.https_port()), (8080, 443));
    }

    #[test]
    fn test_behavior_requires_pattern() {
        let mut spec = spec();
        spec.behaviors = vec![behavior(None)];
        assert!(distribution_config(&spec, "ref-1").is_err());
    }
}
