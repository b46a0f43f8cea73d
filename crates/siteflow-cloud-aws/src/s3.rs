//! S3 implementation of [`ObjectStorage`]

use crate::error::{build_error, classify};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    AccelerateConfiguration, BucketAccelerateStatus, BucketLocationConstraint,
    CorsConfiguration, CorsRule as S3CorsRule, CreateBucketConfiguration, ErrorDocument,
    IndexDocument, WebsiteConfiguration,
};
use siteflow_cloud::{CorsRule, ObjectStorage, ResourceKind, Result, UploadObject, WebsiteConfig};

/// Region in which buckets must be created without a location constraint
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        tracing::debug!("s3 head_bucket {}", bucket);
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        tracing::debug!("s3 create_bucket {} in {}", bucket, region);
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn put_bucket_accelerate(&self, bucket: &str, enabled: bool) -> Result<()> {
        tracing::debug!("s3 put_bucket_accelerate_configuration {} {}", bucket, enabled);
        let status = if enabled {
            BucketAccelerateStatus::Enabled
        } else {
            BucketAccelerateStatus::Suspended
        };
        self.client
            .put_bucket_accelerate_configuration()
            .bucket(bucket)
            .accelerate_configuration(AccelerateConfiguration::builder().status(status).build())
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &serde_json::Value) -> Result<()> {
        // new buckets block public policies until the block is lifted
        tracing::debug!("s3 delete_public_access_block {}", bucket);
        self.client
            .delete_public_access_block()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;

        tracing::debug!("s3 put_bucket_policy {}", bucket);
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(serde_json::to_string(policy)?)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn put_bucket_cors(&self, bucket: &str, rules: &[CorsRule]) -> Result<()> {
        tracing::debug!("s3 put_bucket_cors {}", bucket);
        let rules = rules
            .iter()
            .map(|rule| {
                S3CorsRule::builder()
                    .set_allowed_methods(Some(rule.allowed_methods.clone()))
                    .set_allowed_origins(Some(rule.allowed_origins.clone()))
                    .set_allowed_headers(Some(rule.allowed_headers.clone()))
                    .max_age_seconds(rule.max_age_seconds)
                    .build()
                    .map_err(build_error)
            })
            .collect::<Result<Vec<_>>>()?;
        let configuration = CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(build_error)?;

        self.client
            .put_bucket_cors()
            .bucket(bucket)
            .cors_configuration(configuration)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn put_bucket_website(&self, bucket: &str, website: &WebsiteConfig) -> Result<()> {
        tracing::debug!("s3 put_bucket_website {}", bucket);
        let configuration = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(&website.index_document)
                    .build()
                    .map_err(build_error)?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(&website.error_document)
                    .build()
                    .map_err(build_error)?,
            )
            .build();

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(configuration)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, object: UploadObject) -> Result<()> {
        tracing::debug!("s3 put_object {}/{}", bucket, object.key);
        let id = format!("{}/{}", bucket, object.key);
        self.client
            .put_object()
            .bucket(bucket)
            .key(object.key)
            .content_type(object.content_type)
            .body(ByteStream::from(object.body))
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Object, &id))?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        tracing::debug!("s3 list_objects_v2 {}", bucket);
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::debug!("s3 delete_object {}/{}", bucket, key);
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        tracing::debug!("s3 delete_bucket {}", bucket);
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, ResourceKind::Bucket, bucket))?;
        Ok(())
    }
}
