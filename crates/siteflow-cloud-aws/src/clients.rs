//! Building the provider bundle from an AWS SDK config

use crate::acm::AcmCertificates;
use crate::cloudfront::CloudFrontCdn;
use crate::error::{AwsError, Result};
use crate::route53::Route53Dns;
use crate::s3::S3Storage;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use siteflow_cloud::Clients;
use std::sync::Arc;

/// ACM certificates used by CloudFront must live here
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// AWS connection settings for a single invocation
#[derive(Debug, Clone, Default)]
pub struct AwsClients {
    region: String,
    profile: Option<String>,
}

impl AwsClients {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
        }
    }

    /// Named profile from the shared AWS config files
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Load the SDK config and build every client the reconciler needs
    pub async fn connect(&self) -> Result<Clients> {
        if self.region.trim().is_empty() {
            return Err(AwsError::MissingRegion);
        }

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        tracing::debug!(
            "AWS clients for region {} (profile: {})",
            self.region,
            self.profile.as_deref().unwrap_or("default")
        );

        let storage = aws_sdk_s3::Client::new(&sdk_config);
        let accelerated = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .accelerate(true)
                .build(),
        );
        let certificates = aws_sdk_acm::Client::from_conf(
            aws_sdk_acm::config::Builder::from(&sdk_config)
                .region(Region::new(CERTIFICATE_REGION))
                .build(),
        );

        Ok(Clients {
            storage: Arc::new(S3Storage::new(storage)),
            accelerated: Arc::new(S3Storage::new(accelerated)),
            cdn: Arc::new(CloudFrontCdn::new(aws_sdk_cloudfront::Client::new(
                &sdk_config,
            ))),
            dns: Arc::new(Route53Dns::new(aws_sdk_route53::Client::new(&sdk_config))),
            certificates: Arc::new(AcmCertificates::new(certificates)),
        })
    }
}
