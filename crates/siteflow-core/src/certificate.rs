//! TLS certificate lookup, request and DNS validation

use crate::error::{Result, SiteError};
use crate::reporter::Reporter;
use siteflow_cloud::{
    CertificateAuthority, CertificateDetail, CertificateStatus, Clients, CloudError, DnsRecord,
    ResourceKind, RetryConfig, ValidationRecord, poll_until,
};

const VALIDATION_RECORD_TTL: i64 = 300;

/// Result of making sure a certificate exists for the naked domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateOutcome {
    pub arn: String,
    pub status: CertificateStatus,
    pub validation_record: Option<ValidationRecord>,
    /// Can be attached to the distribution during this run
    pub usable: bool,
}

/// Find or request the certificate covering `naked_domain` and every
/// subdomain of it.
///
/// A pending certificate gets its validation record written into
/// `hosted_zone_id` when one is known; it only becomes usable on a later
/// deploy.
pub async fn ensure_certificate(
    clients: &Clients,
    naked_domain: &str,
    hosted_zone_id: Option<&str>,
    retry: &RetryConfig,
    reporter: &dyn Reporter,
) -> Result<CertificateOutcome> {
    let certificates = clients.certificates.as_ref();

    reporter.debug(&format!("Checking if a certificate for {naked_domain} exists"));
    let arn = match certificates.find_certificate(naked_domain).await? {
        Some(arn) => {
            reporter.debug(&format!("Using existing certificate {arn}"));
            arn
        }
        None => {
            reporter.debug(&format!("Requesting a certificate for {naked_domain}"));
            let names = vec![naked_domain.to_string(), format!("*.{naked_domain}")];
            certificates.request_certificate(naked_domain, &names).await?
        }
    };

    let detail = describe_when_ready(certificates, &arn, retry).await?;

    match detail.status {
        CertificateStatus::Issued => {
            reporter.debug(&format!("Certificate {arn} is issued"));
            Ok(CertificateOutcome {
                arn,
                status: detail.status,
                validation_record: detail.validation_record,
                usable: true,
            })
        }
        CertificateStatus::PendingValidation => {
            if let Some(record) = &detail.validation_record {
                match hosted_zone_id {
                    Some(zone_id) => {
                        reporter.debug(&format!(
                            "Writing validation record {} into hosted zone {}",
                            record.name, zone_id
                        ));
                        clients
                            .dns
                            .upsert_records(
                                zone_id,
                                &[DnsRecord::cname(
                                    &record.name,
                                    &record.value,
                                    VALIDATION_RECORD_TTL,
                                )],
                            )
                            .await?;
                        reporter.status(&format!(
                            "Certificate for {naked_domain} is pending validation. \
                             The domain will be attached on a later deploy."
                        ));
                    }
                    None => {
                        reporter.status(&format!(
                            "Certificate for {naked_domain} is pending validation. Add this \
                             {} record to your DNS provider: {} -> {}",
                            record.record_type, record.name, record.value
                        ));
                    }
                }
            }
            Ok(CertificateOutcome {
                arn,
                status: detail.status,
                validation_record: detail.validation_record,
                usable: false,
            })
        }
        CertificateStatus::ValidationTimedOut => {
            tracing::warn!("Certificate {} validation timed out", arn);
            reporter.status(&format!(
                "Certificate validation for {naked_domain} timed out. Delete certificate {arn} \
                 and deploy again to request a new one."
            ));
            Ok(CertificateOutcome {
                arn,
                status: detail.status,
                validation_record: detail.validation_record,
                usable: false,
            })
        }
        status => Err(SiteError::CertificateFailed {
            arn,
            status: status.to_string(),
        }),
    }
}

/// Describe the certificate until it is visible and, when pending, carries
/// its validation record
async fn describe_when_ready(
    certificates: &dyn CertificateAuthority,
    arn: &str,
    retry: &RetryConfig,
) -> Result<CertificateDetail> {
    let detail = poll_until(
        &format!("certificate {arn}"),
        retry,
        move || async move {
            match certificates.describe_certificate(arn).await {
                Ok(detail) => Ok(Some(detail)),
                Err(e) if e.is_not_found(ResourceKind::Certificate) => Ok(None),
                Err(e) => Err(e),
            }
        },
        |detail| {
            detail.as_ref().is_some_and(|d| {
                d.status != CertificateStatus::PendingValidation || d.validation_record.is_some()
            })
        },
    )
    .await?;

    detail.ok_or_else(|| CloudError::not_found(ResourceKind::Certificate, arn).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::TracingReporter;
    use siteflow_cloud::MemoryCloud;
    use std::time::Duration;

    fn retry() -> RetryConfig {
        RetryConfig::fixed(Duration::ZERO, 5)
    }

    #[tokio::test]
    async fn test_requests_single_certificate_with_wildcard() {
        let cloud = MemoryCloud::new();
        let zone = cloud.add_hosted_zone("example.com");

        let outcome = ensure_certificate(
            &cloud.clients(),
            "example.com",
            Some(zone.as_str()),
            &retry(),
            &TracingReporter,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, CertificateStatus::PendingValidation);
        assert!(!outcome.usable);
        let names = cloud.certificate_names();
        assert_eq!(names.len(), 1);
        assert_eq!(
            names.values().next().unwrap(),
            &vec!["example.com".to_string(), "*.example.com".to_string()]
        );

        // validation record landed in the zone
        let record = outcome.validation_record.unwrap();
        assert!(cloud.records(&zone).iter().any(|r| r.name == record.name));
    }

    #[tokio::test]
    async fn test_second_run_finds_issued_certificate() {
        let cloud = MemoryCloud::new();
        let zone = cloud.add_hosted_zone("example.com");
        let clients = cloud.clients();

        let first = ensure_certificate(&clients, "example.com", Some(zone.as_str()), &retry(), &TracingReporter)
            .await
            .unwrap();
        let second = ensure_certificate(&clients, "example.com", Some(zone.as_str()), &retry(), &TracingReporter)
            .await
            .unwrap();

        assert_eq!(first.arn, second.arn);
        assert!(second.usable);
        assert_eq!(cloud.certificate_names().len(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_validation_record() {
        let cloud = MemoryCloud::new().with_consistency_lag(2);

        let outcome = ensure_certificate(&cloud.clients(), "example.com", None, &retry(), &TracingReporter)
            .await
            .unwrap();

        assert!(outcome.validation_record.is_some());
        let describes = cloud
            .calls()
            .iter()
            .filter(|c| c.starts_with("acm:describe_certificate"))
            .count();
        assert_eq!(describes, 3);
    }

    #[tokio::test]
    async fn test_timed_out_is_unusable() {
        let cloud = MemoryCloud::new();
        cloud.add_certificate("example.com", CertificateStatus::ValidationTimedOut);

        let outcome = ensure_certificate(&cloud.clients(), "example.com", None, &retry(), &TracingReporter)
            .await
            .unwrap();
        assert!(!outcome.usable);
        assert!(!cloud.calls().iter().any(|c| c.starts_with("acm:request")));
    }

    #[tokio::test]
    async fn test_revoked_is_fatal() {
        let cloud = MemoryCloud::new();
        cloud.add_certificate("example.com", CertificateStatus::Revoked);

        let err = ensure_certificate(&cloud.clients(), "example.com", None, &retry(), &TracingReporter)
            .await
            .unwrap_err();
        assert!(matches!(err, SiteError::CertificateFailed { ref status, .. } if status == "REVOKED"));
    }

    #[tokio::test]
    async fn test_record_never_appears_times_out() {
        let cloud = MemoryCloud::new().with_consistency_lag(10);
        let err = ensure_certificate(
            &cloud.clients(),
            "example.com",
            None,
            &RetryConfig::fixed(Duration::ZERO, 2),
            &TracingReporter,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SiteError::Cloud(CloudError::Timeout { .. })));
    }
}
