//! Resolved deploy configuration
//!
//! [`DesiredConfig`] is built from the user inputs and the previously
//! persisted state. Resolution never talks to a provider, so every guard
//! here fails before anything is created or changed.

use crate::domain::{DomainName, normalize_domain};
use crate::error::{Result, SiteError};
use crate::inputs::{Inputs, OriginInput};
use siteflow_cloud::{RetryConfig, WebsiteState};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_DOCUMENT: &str = "index.html";
pub const DEFAULT_PRICE_CLASS: &str = "PriceClass_All";
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 32;

/// Extra CDN origin with its per-path cache TTLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginConfig {
    pub url: String,
    pub path_patterns: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnConfig {
    pub origins: Vec<OriginConfig>,
    pub ttl: i64,
    pub price_class: String,
}

#[derive(Debug, Clone)]
pub struct DesiredConfig {
    pub bucket_name: String,
    pub region: String,
    pub src: PathBuf,
    /// Directory whose contents get uploaded
    pub upload_dir: PathBuf,
    pub hook: Option<String>,
    pub env: BTreeMap<String, String>,
    pub domain: Option<DomainName>,
    pub index_document: String,
    pub error_document: String,
    pub policy: Option<serde_json::Value>,
    pub cdn: CdnConfig,
    pub upload_concurrency: usize,
    pub retry: RetryConfig,
}

impl DesiredConfig {
    pub fn resolve(inputs: &Inputs, state: &WebsiteState) -> Result<Self> {
        let src = inputs.src.clone().ok_or(SiteError::MissingSource)?;
        let upload_dir = match &inputs.dist {
            Some(dist) => src.join(dist),
            None => src.clone(),
        };

        let bucket_name = resolve_immutable(
            "bucket name",
            state.bucket_name.as_deref(),
            inputs.bucket_name.as_deref(),
        )?
        .unwrap_or_else(generate_bucket_name);
        validate_bucket_name(&bucket_name)?;

        let region = resolve_immutable(
            "region",
            state.region.as_deref(),
            inputs.region.as_deref(),
        )?
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let domain = inputs.domain.as_deref().map(normalize_domain).transpose()?;
        if let Some(previous) = state.domain.as_deref() {
            let requested = domain.as_ref().map(|d| d.domain.as_str());
            if requested != Some(previous) {
                return Err(SiteError::ImmutableFieldChanged {
                    field: "domain",
                    previous: previous.to_string(),
                    requested: requested.unwrap_or("(none)").to_string(),
                });
            }
        }

        if let Some(policy) = &inputs.policy
            && !policy.is_object()
        {
            return Err(SiteError::InvalidInput(
                "policy must be a mapping of policy fields".to_string(),
            ));
        }

        let origins = inputs
            .cdn
            .origins
            .iter()
            .map(resolve_origin)
            .collect::<Result<Vec<_>>>()?;

        let mut retry = RetryConfig::default();
        if let Some(max_attempts) = inputs.retry.max_attempts {
            retry.max_attempts = max_attempts.max(1);
        }
        if let Some(delay_ms) = inputs.retry.delay_ms {
            retry = RetryConfig::fixed(Duration::from_millis(delay_ms), retry.max_attempts);
        }

        Ok(Self {
            bucket_name,
            region,
            src,
            upload_dir,
            hook: inputs.hook.clone().filter(|h| !h.trim().is_empty()),
            env: inputs.env.clone(),
            domain,
            index_document: inputs
                .index_document
                .clone()
                .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string()),
            error_document: inputs
                .error_document
                .clone()
                .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string()),
            policy: inputs.policy.clone(),
            cdn: CdnConfig {
                origins,
                ttl: inputs.cdn.ttl.unwrap_or(0),
                price_class: inputs
                    .cdn
                    .price_class
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PRICE_CLASS.to_string()),
            },
            upload_concurrency: inputs
                .upload_concurrency
                .unwrap_or(DEFAULT_UPLOAD_CONCURRENCY)
                .max(1),
            retry,
        })
    }

    /// Website endpoint of the bucket itself
    pub fn bucket_url(&self) -> String {
        bucket_website_url(&self.bucket_name, &self.region)
    }

    /// Transfer acceleration cannot be used with dotted bucket names
    pub fn acceleration_supported(&self) -> bool {
        !self.bucket_name.contains('.')
    }
}

pub fn bucket_website_url(bucket: &str, region: &str) -> String {
    format!("http://{bucket}.s3-website-{region}.amazonaws.com")
}

/// A recorded value wins; a requested value may only repeat it
fn resolve_immutable(
    field: &'static str,
    previous: Option<&str>,
    requested: Option<&str>,
) -> Result<Option<String>> {
    match (previous, requested) {
        (Some(previous), Some(requested)) if previous != requested => {
            Err(SiteError::ImmutableFieldChanged {
                field,
                previous: previous.to_string(),
                requested: requested.to_string(),
            })
        }
        (Some(value), _) | (None, Some(value)) => Ok(Some(value.to_string())),
        (None, None) => Ok(None),
    }
}

fn generate_bucket_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("website-{}", &id[..12])
}

fn validate_bucket_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let valid_edges = name
        .chars()
        .next()
        .zip(name.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if (3..=63).contains(&name.len()) && valid_chars && valid_edges && !name.contains("..") {
        Ok(())
    } else {
        Err(SiteError::InvalidInput(format!(
            "\"{name}\" is not a valid bucket name (3-63 lowercase letters, digits, '.' or '-')"
        )))
    }
}

fn resolve_origin(origin: &OriginInput) -> Result<OriginConfig> {
    let url = origin.url().trim().to_string();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(SiteError::InvalidInput(format!(
            "CDN origin \"{url}\" must be an http(s) URL"
        )));
    }
    let authority = url
        .split_once("://")
        .map_or(url.as_str(), |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default();
    if authority.is_empty() {
        return Err(SiteError::InvalidInput(format!(
            "CDN origin \"{url}\" has no host"
        )));
    }
    if let Some((_, port)) = authority.rsplit_once(':')
        && !port.parse::<u16>().is_ok_and(|port| port > 0)
    {
        return Err(SiteError::InvalidInput(format!(
            "CDN origin \"{url}\" has an invalid port \"{port}\""
        )));
    }
    let path_patterns = match origin {
        OriginInput::Url(_) => BTreeMap::new(),
        OriginInput::Detailed { path_patterns, .. } => path_patterns
            .iter()
            .map(|(pattern, settings)| (pattern.clone(), settings.ttl.unwrap_or(0)))
            .collect(),
    };
    Ok(OriginConfig { url, path_patterns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(yaml: &str) -> Inputs {
        Inputs::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = DesiredConfig::resolve(&inputs("src: ./site"), &WebsiteState::new()).unwrap();
        assert!(config.bucket_name.starts_with("website-"));
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.upload_dir, PathBuf::from("./site"));
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.error_document, "index.html");
        assert_eq!(config.cdn.ttl, 0);
        assert_eq!(config.cdn.price_class, "PriceClass_All");
        assert_eq!(config.upload_concurrency, 32);
        assert_eq!(config.retry.max_attempts, 60);
        assert!(config.domain.is_none());
    }

    #[test]
    fn test_missing_src() {
        let err = DesiredConfig::resolve(&inputs("hook: make"), &WebsiteState::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unable to deploy website. Missing inputs.src.");
    }

    #[test]
    fn test_dist_is_relative_to_src() {
        let config = DesiredConfig::resolve(
            &inputs("src: ./site\ndist: build"),
            &WebsiteState::new(),
        )
        .unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("./site/build"));
    }

    #[test]
    fn test_bucket_name_from_state_is_kept() {
        let state = WebsiteState {
            bucket_name: Some("my-site".to_string()),
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };
        let config = DesiredConfig::resolve(&inputs("src: ./site"), &state).unwrap();
        assert_eq!(config.bucket_name, "my-site");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(
            config.bucket_url(),
            "http://my-site.s3-website-eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_bucket_name_change_rejected() {
        let state = WebsiteState {
            bucket_name: Some("my-site".to_string()),
            ..Default::default()
        };
        let err = DesiredConfig::resolve(&inputs("src: .\nbucket_name: other-site"), &state)
            .unwrap_err();
        assert!(matches!(
            err,
            SiteError::ImmutableFieldChanged { field: "bucket name", .. }
        ));
    }

    #[test]
    fn test_domain_removal_rejected() {
        let state = WebsiteState {
            domain: Some("www.example.com".to_string()),
            ..Default::default()
        };
        let err = DesiredConfig::resolve(&inputs("src: ."), &state).unwrap_err();
        assert!(matches!(
            err,
            SiteError::ImmutableFieldChanged { field: "domain", .. }
        ));

        // the same domain written in its naked form is not a change
        let config = DesiredConfig::resolve(&inputs("src: .\ndomain: example.com"), &state).unwrap();
        assert_eq!(config.domain.unwrap().domain, "www.example.com");
    }

    #[test]
    fn test_invalid_bucket_name() {
        let err = DesiredConfig::resolve(&inputs("src: .\nbucket_name: My_Site"), &WebsiteState::new())
            .unwrap_err();
        assert!(matches!(err, SiteError::InvalidInput(_)));
    }

    #[test]
    fn test_dotted_bucket_disables_acceleration() {
        let config = DesiredConfig::resolve(
            &inputs("src: .\nbucket_name: www.example.com"),
            &WebsiteState::new(),
        )
        .unwrap();
        assert!(!config.acceleration_supported());
    }

    #[test]
    fn test_origins_and_retry() {
        let config = DesiredConfig::resolve(
            &inputs(
                r#"
src: .
cdn:
  ttl: 30
  origins:
    - url: https://api.example.com
      path_patterns:
        /api/*:
          ttl: 5
retry:
  max_attempts: 3
  delay_ms: 10
"#,
            ),
            &WebsiteState::new(),
        )
        .unwrap();
        assert_eq!(config.cdn.origins[0].path_patterns["/api/*"], 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay_for_attempt(0), Duration::from_millis(10));
    }

    #[test]
    fn test_origin_port_must_be_valid() {
        let config = DesiredConfig::resolve(
            &inputs("src: .\ncdn:\n  origins:\n    - https://api.example.com:8443/v1"),
            &WebsiteState::new(),
        )
        .unwrap();
        assert_eq!(config.cdn.origins[0].url, "https://api.example.com:8443/v1");

        for url in ["https://api.example.com:99999", "http://api.example.com:abc", "https://"] {
            let err = DesiredConfig::resolve(
                &inputs(&format!("src: .\ncdn:\n  origins:\n    - {url}")),
                &WebsiteState::new(),
            )
            .unwrap_err();
            assert!(matches!(err, SiteError::InvalidInput(_)), "{url}");
        }
    }

    #[test]
    fn test_origin_must_be_url() {
        let err = DesiredConfig::resolve(
            &inputs("src: .\ncdn:\n  origins:\n    - api.example.com"),
            &WebsiteState::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SiteError::InvalidInput(_)));
    }
}
