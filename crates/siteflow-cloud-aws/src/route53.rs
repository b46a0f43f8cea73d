//! Route53 implementation of [`Dns`]

use crate::error::{build_error, classify};
use async_trait::async_trait;
use aws_sdk_route53::Client;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use siteflow_cloud::{Dns, DnsRecord, RecordTarget, RecordType, ResourceKind, Result};

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

#[derive(Debug, Clone)]
pub struct Route53Dns {
    client: Client,
}

impl Route53Dns {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn change_records(
        &self,
        zone_id: &str,
        action: ChangeAction,
        records: &[DnsRecord],
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let changes = records
            .iter()
            .map(|record| {
                Change::builder()
                    .action(action.clone())
                    .resource_record_set(record_set(record)?)
                    .build()
                    .map_err(build_error)
            })
            .collect::<Result<Vec<_>>>()?;
        let batch = ChangeBatch::builder()
            .set_changes(Some(changes))
            .build()
            .map_err(build_error)?;

        let names = records
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        tracing::debug!("route53 change_resource_record_sets {:?} {}", action, names);

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::DnsRecord, &names))?;
        Ok(())
    }
}

/// Zone ids come back as `/hostedzone/Z123`; change requests want `Z123`
pub(crate) fn strip_zone_prefix(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id)
}

fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

fn record_type(record_type: RecordType) -> RrType {
    match record_type {
        RecordType::A => RrType::A,
        RecordType::Cname => RrType::Cname,
    }
}

pub(crate) fn record_set(record: &DnsRecord) -> Result<ResourceRecordSet> {
    let builder = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(record_type(record.record_type));

    let builder = match &record.target {
        RecordTarget::Alias {
            dns_name,
            hosted_zone_id,
        } => builder.alias_target(
            AliasTarget::builder()
                .dns_name(dns_name)
                .hosted_zone_id(hosted_zone_id)
                .evaluate_target_health(false)
                .build()
                .map_err(build_error)?,
        ),
        RecordTarget::Value { value, ttl } => builder.ttl(*ttl).resource_records(
            ResourceRecord::builder()
                .value(value)
                .build()
                .map_err(build_error)?,
        ),
    };

    builder.build().map_err(build_error)
}

#[async_trait]
impl Dns for Route53Dns {
    async fn find_hosted_zone(&self, domain: &str) -> Result<Option<String>> {
        let wanted = fqdn(domain);
        tracing::debug!("route53 list_hosted_zones_by_name {}", wanted);

        let response = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(&wanted)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::HostedZone, domain))?;

        // results start at the requested name but continue past it
        Ok(response
            .hosted_zones()
            .iter()
            .find(|zone| zone.name() == wanted)
            .map(|zone| strip_zone_prefix(zone.id()).to_string()))
    }

    async fn upsert_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()> {
        self.change_records(zone_id, ChangeAction::Upsert, records)
            .await
    }

    async fn delete_records(&self, zone_id: &str, records: &[DnsRecord]) -> Result<()> {
        self.change_records(zone_id, ChangeAction::Delete, records)
            .await
    }
}
