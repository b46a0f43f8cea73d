//! Alias records pointing the custom domain at the distribution

use crate::domain::DomainName;
use crate::error::Result;
use crate::reporter::Reporter;
use siteflow_cloud::{CloudError, Dns, DnsRecord, ResourceKind};

/// Alias A records for `domain`, plus the naked domain when it was promoted
pub fn alias_records(domain: &DomainName, distribution_domain: &str) -> Vec<DnsRecord> {
    domain
        .aliases()
        .into_iter()
        .map(|name| DnsRecord::cdn_alias(name, distribution_domain))
        .collect()
}

/// Hosted zone of the naked domain, if the account has one
pub async fn find_hosted_zone(
    dns: &dyn Dns,
    naked_domain: &str,
    reporter: &dyn Reporter,
) -> Result<Option<String>> {
    let zone = dns.find_hosted_zone(naked_domain).await?;
    match &zone {
        Some(id) => reporter.debug(&format!("Found hosted zone {id} for {naked_domain}")),
        None => reporter.debug(&format!("No hosted zone for {naked_domain} in this account")),
    }
    Ok(zone)
}

/// Upsert the alias records. Without a hosted zone nothing is written.
pub async fn configure_dns_for_domain(
    dns: &dyn Dns,
    hosted_zone_id: Option<&str>,
    domain: &DomainName,
    distribution_domain: &str,
    reporter: &dyn Reporter,
) -> Result<bool> {
    let Some(zone_id) = hosted_zone_id else {
        reporter.status(&format!(
            "Domain {} is not managed by this account. Point it at {} with your DNS provider.",
            domain.naked_domain, distribution_domain
        ));
        return Ok(false);
    };

    let records = alias_records(domain, distribution_domain);
    reporter.debug(&format!(
        "Writing {} alias records into hosted zone {}",
        records.len(),
        zone_id
    ));
    dns.upsert_records(zone_id, &records).await?;
    Ok(true)
}

/// Delete the alias records written for `domain`.
///
/// The naked domain record is only present when the domain was promoted,
/// so each record is deleted on its own and missing ones are skipped.
pub async fn remove_dns_records(
    dns: &dyn Dns,
    hosted_zone_id: &str,
    domain: &str,
    naked_domain: &str,
    distribution_domain: &str,
    reporter: &dyn Reporter,
) -> Result<()> {
    let mut names = vec![domain.to_string()];
    if domain == format!("www.{naked_domain}") {
        names.push(naked_domain.to_string());
    }

    for name in names {
        let record = DnsRecord::cdn_alias(&name, distribution_domain);
        match dns.delete_records(hosted_zone_id, &[record]).await {
            Ok(()) => reporter.debug(&format!("Deleted alias record {name}")),
            Err(e)
                if e.is_not_found(ResourceKind::DnsRecord)
                    || e.is_not_found(ResourceKind::HostedZone) =>
            {
                tracing::debug!("Alias record {} already absent", name);
            }
            Err(CloudError::ApiError(message)) => {
                tracing::warn!("Could not delete alias record {}: {}", name, message);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
