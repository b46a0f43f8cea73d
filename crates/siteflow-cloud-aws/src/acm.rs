//! ACM implementation of [`CertificateAuthority`]
//!
//! CloudFront only accepts certificates from us-east-1, so the client handed
//! to [`AcmCertificates`] must be pinned to that region.

use crate::error::classify;
use async_trait::async_trait;
use aws_sdk_acm::Client;
use aws_sdk_acm::types::ValidationMethod;
use siteflow_cloud::{
    CertificateAuthority, CertificateDetail, CertificateStatus, CloudError, RecordType,
    ResourceKind, Result, ValidationRecord,
};

#[derive(Debug, Clone)]
pub struct AcmCertificates {
    client: Client,
}

impl AcmCertificates {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

pub(crate) fn certificate_status(status: &str) -> CertificateStatus {
    match status {
        "PENDING_VALIDATION" => CertificateStatus::PendingValidation,
        "ISSUED" => CertificateStatus::Issued,
        "VALIDATION_TIMED_OUT" => CertificateStatus::ValidationTimedOut,
        "INACTIVE" => CertificateStatus::Inactive,
        "EXPIRED" => CertificateStatus::Expired,
        "REVOKED" => CertificateStatus::Revoked,
        "FAILED" => CertificateStatus::Failed,
        other => CertificateStatus::Other(other.to_string()),
    }
}

#[async_trait]
impl CertificateAuthority for AcmCertificates {
    async fn find_certificate(&self, domain: &str) -> Result<Option<String>> {
        tracing::debug!("acm list_certificates for {}", domain);
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_certificates()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| classify(e, ResourceKind::Certificate, domain))?;

            let found = response
                .certificate_summary_list()
                .iter()
                .find(|summary| summary.domain_name() == Some(domain))
                .and_then(|summary| summary.certificate_arn().map(str::to_string));
            if found.is_some() {
                return Ok(found);
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
    }

    async fn request_certificate(
        &self,
        domain: &str,
        subject_alternative_names: &[String],
    ) -> Result<String> {
        tracing::debug!(
            "acm request_certificate {} {:?}",
            domain,
            subject_alternative_names
        );
        let response = self
            .client
            .request_certificate()
            .domain_name(domain)
            .validation_method(ValidationMethod::Dns)
            .set_subject_alternative_names(Some(subject_alternative_names.to_vec()))
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Certificate, domain))?;

        response
            .certificate_arn()
            .map(str::to_string)
            .ok_or_else(|| CloudError::ApiError(format!("ACM returned no ARN for {domain}")))
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail> {
        tracing::debug!("acm describe_certificate {}", arn);
        let response = self
            .client
            .describe_certificate()
            .certificate_arn(arn)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Certificate, arn))?;

        let certificate = response
            .certificate()
            .ok_or_else(|| CloudError::not_found(ResourceKind::Certificate, arn))?;

        // the validation record appears a few seconds after the request
        let validation_record = certificate
            .domain_validation_options()
            .iter()
            .find_map(|option| option.resource_record())
            .map(|record| ValidationRecord {
                name: record.name().to_string(),
                record_type: RecordType::Cname,
                value: record.value().to_string(),
            });

        Ok(CertificateDetail {
            arn: arn.to_string(),
            domain_name: certificate.domain_name().unwrap_or_default().to_string(),
            status: certificate
                .status()
                .map(|status| certificate_status(status.as_str()))
                .unwrap_or_else(|| CertificateStatus::Other("UNKNOWN".to_string())),
            validation_record,
        })
    }
}
