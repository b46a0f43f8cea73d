//! Website deploy and remove
//!
//! Both operations are sequences of provider steps. The state record is
//! saved after every step that changed something in the cloud, so an
//! interrupted run resumes where it stopped.

use crate::bucket::{clear_bucket, delete_bucket, ensure_bucket};
use crate::certificate::{CertificateOutcome, ensure_certificate};
use crate::config::DesiredConfig;
use crate::distribution::{
    DeleteOutcome, build_distribution_spec, delete_distribution, detach_domain,
    reconcile_distribution,
};
use crate::dns::{configure_dns_for_domain, find_hosted_zone, remove_dns_records};
use crate::env_bundle::write_env_bundle;
use crate::error::{Result, SiteError};
use crate::hook::run_build_hook;
use crate::hosting::configure_bucket_for_hosting;
use crate::inputs::Inputs;
use crate::reporter::Reporter;
use crate::upload::upload_dir;
use serde::{Deserialize, Serialize};
use siteflow_cloud::{Clients, CloudError, StateStore, WebsiteState};
use std::sync::Arc;

/// Result of a deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    /// Public URL: the custom domain once it is live, else the distribution
    pub url: String,
    pub bucket_url: String,
    pub distribution_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub bucket: String,
}

/// Result of a remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutputs {
    /// Anything was recorded (and therefore torn down)
    pub removed: bool,
    /// Distribution still being disabled; a later remove deletes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_distribution: Option<String>,
}

pub struct Website {
    clients: Clients,
    store: Arc<dyn StateStore>,
    reporter: Arc<dyn Reporter>,
    state: WebsiteState,
}

impl Website {
    pub fn new(
        clients: Clients,
        store: Arc<dyn StateStore>,
        reporter: Arc<dyn Reporter>,
        state: WebsiteState,
    ) -> Self {
        Self {
            clients,
            store,
            reporter,
            state,
        }
    }

    /// Build a website from the state currently held by `store`
    pub async fn load(
        clients: Clients,
        store: Arc<dyn StateStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let state = store.load().await?;
        Ok(Self::new(clients, store, reporter, state))
    }

    pub fn state(&self) -> &WebsiteState {
        &self.state
    }

    async fn persist(&self) -> Result<()> {
        self.store.save(&self.state).await?;
        Ok(())
    }

    pub async fn deploy(&mut self, inputs: &Inputs) -> Result<Outputs> {
        let config = DesiredConfig::resolve(inputs, &self.state)?;
        let reporter = Arc::clone(&self.reporter);
        let clients = self.clients.clone();

        if !config.src.is_dir() {
            return Err(SiteError::SourceNotFound(config.src.clone()));
        }
        write_env_bundle(&config.src, &config.env).await?;
        if let Some(hook) = &config.hook {
            reporter.status("Building Website");
            run_build_hook(hook, &config.src, &config.env).await?;
        }

        reporter.status("Deploying Bucket");
        let accelerated = config.acceleration_supported();
        ensure_bucket(
            clients.storage.as_ref(),
            &config.bucket_name,
            &config.region,
            accelerated,
            &config.retry,
            reporter.as_ref(),
        )
        .await?;
        self.state.bucket_name = Some(config.bucket_name.clone());
        self.state.region = Some(config.region.clone());
        self.state.bucket_url = Some(config.bucket_url());
        self.persist().await?;

        reporter.status("Uploading Website");
        let (_, uploaded) = tokio::try_join!(
            configure_bucket_for_hosting(
                clients.storage.as_ref(),
                &config.bucket_name,
                &config.index_document,
                &config.error_document,
                config.policy.as_ref(),
                &config.retry,
            ),
            upload_dir(
                &clients,
                &config.bucket_name,
                &config.upload_dir,
                config.upload_concurrency,
                accelerated,
                reporter.as_ref(),
            ),
        )?;
        reporter.debug(&format!("{uploaded} files uploaded"));
        self.state.configured = true;
        self.persist().await?;

        let mut certificate: Option<CertificateOutcome> = None;
        let mut hosted_zone_id: Option<String> = None;
        if let Some(domain) = &config.domain {
            reporter.status("Configuring Domain");
            hosted_zone_id =
                find_hosted_zone(clients.dns.as_ref(), &domain.naked_domain, reporter.as_ref())
                    .await?;
            let outcome = ensure_certificate(
                &clients,
                &domain.naked_domain,
                hosted_zone_id.as_deref(),
                &config.retry,
                reporter.as_ref(),
            )
            .await?;

            self.state.domain = Some(domain.domain.clone());
            self.state.naked_domain = Some(domain.naked_domain.clone());
            self.state.domain_hosted_zone_id = hosted_zone_id.clone();
            self.state.certificate_arn = Some(outcome.arn.clone());
            self.state.certificate_valid = outcome.usable;
            self.state.certificate_status = Some(outcome.status.to_string());
            self.persist().await?;
            certificate = Some(outcome);
        }

        reporter.status("Deploying Distribution");
        let spec = build_distribution_spec(&config, certificate.as_ref());
        let distribution = reconcile_distribution(
            clients.cdn.as_ref(),
            self.state.distribution_id.as_deref(),
            &spec,
            reporter.as_ref(),
        )
        .await?;
        let distribution_url = distribution.info.url();
        self.state.distribution_id = Some(distribution.info.id.clone());
        self.state.distribution_arn = Some(distribution.info.arn.clone());
        self.state.distribution_url = Some(distribution_url.clone());
        self.persist().await?;

        let live_domain = match (&config.domain, &certificate) {
            (Some(domain), Some(outcome)) if outcome.usable => {
                configure_dns_for_domain(
                    clients.dns.as_ref(),
                    hosted_zone_id.as_deref(),
                    domain,
                    &distribution.info.domain_name,
                    reporter.as_ref(),
                )
                .await?;
                Some(domain.domain.clone())
            }
            _ => None,
        };

        let url = match &live_domain {
            Some(domain) => format!("https://{domain}"),
            None => distribution_url.clone(),
        };
        self.state.url = Some(url.clone());
        self.persist().await?;

        reporter.status(&format!("Website deployed at {url}"));
        Ok(Outputs {
            url,
            bucket_url: config.bucket_url(),
            distribution_url,
            domain: live_domain,
            bucket: config.bucket_name,
        })
    }

    pub async fn remove(&mut self) -> Result<RemoveOutputs> {
        if self.state.is_empty() {
            self.reporter.debug("Nothing recorded for this website, nothing to remove");
            return Ok(RemoveOutputs::default());
        }

        let reporter = Arc::clone(&self.reporter);
        let clients = self.clients.clone();
        let bucket = self.state.bucket_name.clone();
        reporter.status("Removing Website");

        if let (Some(id), Some(bucket)) = (self.state.distribution_id.clone(), &bucket)
            && self.state.domain.is_some()
        {
            detach_domain(clients.cdn.as_ref(), &id, bucket, reporter.as_ref()).await?;
        }

        if let (Some(zone), Some(domain), Some(naked), Some(url)) = (
            &self.state.domain_hosted_zone_id,
            &self.state.domain,
            &self.state.naked_domain,
            &self.state.distribution_url,
        ) {
            reporter.status("Removing Domain");
            let distribution_domain = url.trim_start_matches("https://");
            remove_dns_records(
                clients.dns.as_ref(),
                zone,
                domain,
                naked,
                distribution_domain,
                reporter.as_ref(),
            )
            .await?;
        }
        self.state.domain = None;
        self.state.naked_domain = None;
        self.state.domain_hosted_zone_id = None;
        self.state.certificate_arn = None;
        self.state.certificate_valid = false;
        self.state.certificate_status = None;
        self.persist().await?;

        let mut pending_distribution = None;
        if let Some(id) = self.state.distribution_id.clone() {
            reporter.status("Removing Distribution");
            let origin_bucket = bucket.as_deref().unwrap_or_default();
            match delete_distribution(clients.cdn.as_ref(), &id, origin_bucket, reporter.as_ref())
                .await?
            {
                DeleteOutcome::Deleted => {
                    self.state.distribution_id = None;
                    self.state.distribution_arn = None;
                    self.state.distribution_url = None;
                }
                DeleteOutcome::Pending => pending_distribution = Some(id),
            }
            self.persist().await?;
        }

        if let Some(bucket) = &bucket {
            reporter.status("Removing Bucket");
            match clear_bucket(clients.accelerated.as_ref(), bucket, reporter.as_ref()).await {
                Err(SiteError::Cloud(CloudError::AccelerationNotConfigured(_))) => {
                    clear_bucket(clients.storage.as_ref(), bucket, reporter.as_ref()).await?
                }
                other => other?,
            }
            delete_bucket(clients.storage.as_ref(), bucket, reporter.as_ref()).await?;
        }

        self.state = match &pending_distribution {
            // the disabled distribution still needs deleting, and its origin name
            Some(_) => WebsiteState {
                bucket_name: self.state.bucket_name.clone(),
                region: self.state.region.clone(),
                distribution_id: self.state.distribution_id.clone(),
                distribution_arn: self.state.distribution_arn.clone(),
                distribution_url: self.state.distribution_url.clone(),
                ..WebsiteState::new()
            },
            None => WebsiteState::new(),
        };
        self.persist().await?;

        Ok(RemoveOutputs {
            removed: true,
            pending_distribution,
        })
    }
}
