//! CDN distribution in front of the website bucket

use crate::certificate::CertificateOutcome;
use crate::config::{DesiredConfig, OriginConfig};
use crate::error::Result;
use crate::reporter::Reporter;
use siteflow_cloud::{
    CacheBehaviorSpec, Cdn, CloudError, DistributionInfo, DistributionSpec, OriginKind, OriginSpec,
    ResourceKind,
};

/// Paths invalidated after every configuration update
pub const INVALIDATION_PATHS: [&str; 3] = ["/", "/index.html", "/*"];

const MAX_TTL: i64 = 31_536_000;
const READ_METHODS: [&str; 2] = ["GET", "HEAD"];
const ALL_METHODS: [&str; 7] = ["GET", "HEAD", "OPTIONS", "PUT", "POST", "PATCH", "DELETE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionChange {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledDistribution {
    pub info: DistributionInfo,
    pub change: DistributionChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The distribution is disabled, or being disabled, and deletion has to
    /// be retried once that change is deployed
    Pending,
}

fn bucket_origin_id(bucket: &str) -> String {
    format!("S3-{bucket}")
}

fn bucket_origin(bucket: &str) -> OriginSpec {
    OriginSpec {
        id: bucket_origin_id(bucket),
        domain_name: format!("{bucket}.s3.amazonaws.com"),
        origin_path: String::new(),
        kind: OriginKind::Bucket,
    }
}

fn default_behavior(bucket: &str, ttl: i64) -> CacheBehaviorSpec {
    CacheBehaviorSpec {
        path_pattern: None,
        target_origin_id: bucket_origin_id(bucket),
        min_ttl: 0,
        default_ttl: ttl,
        max_ttl: MAX_TTL.max(ttl),
        allowed_methods: READ_METHODS.map(String::from).to_vec(),
        forward_query_string: false,
        compress: true,
    }
}

/// Split an origin URL into (id, origin spec)
fn custom_origin(origin: &OriginConfig, taken: &[OriginSpec]) -> OriginSpec {
    let (scheme, rest) = origin.url.split_once("://").unwrap_or(("https", origin.url.as_str()));
    let (authority, path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, path.trim_end_matches('/')),
        None => (rest, ""),
    };
    // the port was validated when the origin was resolved
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()),
        None => (authority, None),
    };

    let mut id = host.to_string();
    let mut n = 1;
    while taken.iter().any(|o| o.id == id) {
        n += 1;
        id = format!("{host}-{n}");
    }

    OriginSpec {
        id,
        domain_name: host.to_string(),
        origin_path: if path.is_empty() {
            String::new()
        } else {
            format!("/{path}")
        },
        kind: OriginKind::Custom {
            https_only: scheme.eq_ignore_ascii_case("https"),
            port,
        },
    }
}

/// Desired distribution for the website.
///
/// The custom domain and its certificate are only attached when the
/// certificate is usable.
pub fn build_distribution_spec(
    config: &DesiredConfig,
    certificate: Option<&CertificateOutcome>,
) -> DistributionSpec {
    let bucket = &config.bucket_name;
    let mut origins = vec![bucket_origin(bucket)];
    let mut behaviors = Vec::new();

    for origin in &config.cdn.origins {
        let spec = custom_origin(origin, &origins);
        for (pattern, ttl) in &origin.path_patterns {
            behaviors.push(CacheBehaviorSpec {
                path_pattern: Some(pattern.clone()),
                target_origin_id: spec.id.clone(),
                min_ttl: 0,
                default_ttl: *ttl,
                max_ttl: MAX_TTL.max(*ttl),
                allowed_methods: ALL_METHODS.map(String::from).to_vec(),
                forward_query_string: true,
                compress: true,
            });
        }
        origins.push(spec);
    }

    let (aliases, certificate_arn) = match (&config.domain, certificate) {
        (Some(domain), Some(certificate)) if certificate.usable => {
            (domain.aliases(), Some(certificate.arn.clone()))
        }
        _ => (Vec::new(), None),
    };

    DistributionSpec {
        comment: format!("siteflow website {bucket}"),
        enabled: true,
        default_root_object: config.index_document.clone(),
        price_class: config.cdn.price_class.clone(),
        origins,
        default_behavior: default_behavior(bucket, config.cdn.ttl),
        behaviors,
        aliases,
        certificate_arn,
    }
}

/// Minimal distribution used while tearing a website down
pub fn teardown_spec(bucket: &str) -> DistributionSpec {
    DistributionSpec {
        comment: format!("siteflow website {bucket}"),
        enabled: true,
        default_root_object: crate::config::DEFAULT_DOCUMENT.to_string(),
        price_class: crate::config::DEFAULT_PRICE_CLASS.to_string(),
        origins: vec![bucket_origin(bucket)],
        default_behavior: default_behavior(bucket, 0),
        behaviors: Vec::new(),
        aliases: Vec::new(),
        certificate_arn: None,
    }
}

/// Create the distribution, or update the recorded one to `spec`.
///
/// A recorded distribution that no longer exists is created anew. Updates
/// are followed by a cache invalidation of the site root.
pub async fn reconcile_distribution(
    cdn: &dyn Cdn,
    distribution_id: Option<&str>,
    spec: &DistributionSpec,
    reporter: &dyn Reporter,
) -> Result<ReconciledDistribution> {
    if let Some(id) = distribution_id {
        match update_distribution(cdn, id, spec, reporter).await {
            Ok(info) => {
                return Ok(ReconciledDistribution {
                    info,
                    change: DistributionChange::Updated,
                });
            }
            Err(e) if e.is_not_found(ResourceKind::Distribution) => {
                tracing::warn!("Distribution {} no longer exists, creating a new one", id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    reporter.debug("Creating distribution");
    let info = cdn.create_distribution(spec).await?;
    reporter.debug(&format!("Distribution {} created", info.id));
    Ok(ReconciledDistribution {
        info,
        change: DistributionChange::Created,
    })
}

async fn update_distribution(
    cdn: &dyn Cdn,
    id: &str,
    spec: &DistributionSpec,
    reporter: &dyn Reporter,
) -> std::result::Result<DistributionInfo, CloudError> {
    reporter.debug(&format!("Updating distribution {id}"));
    let snapshot = cdn.get_distribution(id).await?;
    let info = cdn.update_distribution(&snapshot, spec).await?;

    let paths: Vec<String> = INVALIDATION_PATHS.map(String::from).to_vec();
    reporter.debug(&format!("Invalidating cached paths on {id}"));
    cdn.create_invalidation(id, &paths).await?;
    Ok(info)
}

/// Remove aliases and custom certificate from the distribution
pub async fn detach_domain(
    cdn: &dyn Cdn,
    id: &str,
    bucket: &str,
    reporter: &dyn Reporter,
) -> Result<()> {
    let snapshot = match cdn.get_distribution(id).await {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_not_found(ResourceKind::Distribution) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if snapshot.aliases.is_empty() {
        return Ok(());
    }

    reporter.debug(&format!("Detaching domain from distribution {id}"));
    cdn.update_distribution(&snapshot, &teardown_spec(bucket).without_domain())
        .await?;
    Ok(())
}

/// Delete the distribution, disabling it first when the provider requires it
pub async fn delete_distribution(
    cdn: &dyn Cdn,
    id: &str,
    bucket: &str,
    reporter: &dyn Reporter,
) -> Result<DeleteOutcome> {
    let snapshot = match cdn.get_distribution(id).await {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_not_found(ResourceKind::Distribution) => return Ok(DeleteOutcome::Deleted),
        Err(e) => return Err(e.into()),
    };

    // another update would restart the deployment being waited on
    if !snapshot.enabled && !snapshot.deployed {
        reporter.status(&format!(
            "Distribution {id} is still being disabled. Run remove again once it is deployed \
             to delete it."
        ));
        return Ok(DeleteOutcome::Pending);
    }

    reporter.debug(&format!("Deleting distribution {id}"));
    match cdn.delete_distribution(&snapshot).await {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(e) if e.is_not_found(ResourceKind::Distribution) => Ok(DeleteOutcome::Deleted),
        Err(CloudError::DistributionNotDisabled(_)) => {
            if snapshot.enabled {
                reporter.debug(&format!("Disabling distribution {id} before deletion"));
                cdn.update_distribution(&snapshot, &teardown_spec(bucket).disabled())
                    .await?;
            }
            reporter.status(&format!(
                "Distribution {id} is being disabled. Run remove again once it is deployed \
                 to delete it."
            ));
            Ok(DeleteOutcome::Pending)
        }
        Err(e) => Err(e.into()),
    }
}
