//! Website bucket probe, creation and teardown

use crate::error::{Result, SiteError};
use crate::reporter::Reporter;
use futures_util::{StreamExt, TryStreamExt, stream};
use siteflow_cloud::{CloudError, ObjectStorage, ResourceKind, RetryConfig, await_ready};

const DELETE_CONCURRENCY: usize = 32;

/// Make sure `bucket` exists and is owned by the caller.
///
/// An existing bucket is left untouched. A new one is created, polled until
/// it is visible, and switched to transfer acceleration when `accelerate`.
pub async fn ensure_bucket(
    storage: &dyn ObjectStorage,
    bucket: &str,
    region: &str,
    accelerate: bool,
    retry: &RetryConfig,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.debug(&format!("Checking if bucket {bucket} exists"));

    match storage.head_bucket(bucket).await {
        Ok(()) => {
            reporter.debug(&format!("Bucket {bucket} already exists"));
            return Ok(());
        }
        Err(e) if e.is_not_found(ResourceKind::Bucket) => {}
        Err(CloudError::Forbidden { message: None, .. }) => {
            return Err(SiteError::AmbiguousBucketOwnership(bucket.to_string()));
        }
        Err(CloudError::Forbidden {
            message: Some(_), ..
        }) => {
            return Err(SiteError::BucketNameTaken(bucket.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    reporter.debug(&format!("Bucket {bucket} does not exist. Creating it in {region}"));
    match storage.create_bucket(bucket, region).await {
        Ok(()) => {}
        // created by a previous, interrupted run
        Err(CloudError::AlreadyExists { .. }) => {}
        // lost the race for a free name
        Err(CloudError::Forbidden { .. }) => {
            return Err(SiteError::BucketNameTaken(bucket.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    await_ready(
        &format!("bucket {bucket}"),
        retry,
        move || storage.head_bucket(bucket),
        CloudError::is_not_yet_consistent,
    )
    .await?;
    reporter.debug(&format!("Bucket {bucket} created"));

    if accelerate {
        reporter.debug(&format!("Enabling transfer acceleration on {bucket}"));
        await_ready(
            &format!("acceleration of bucket {bucket}"),
            retry,
            move || storage.put_bucket_accelerate(bucket, true),
            |e| e.is_not_found(ResourceKind::Bucket),
        )
        .await?;
    } else {
        tracing::debug!(
            "Skipping transfer acceleration for {}: dotted bucket names are not supported",
            bucket
        );
    }

    Ok(())
}

/// Delete every object in the bucket; a missing bucket counts as cleared
pub async fn clear_bucket(
    storage: &dyn ObjectStorage,
    bucket: &str,
    reporter: &dyn Reporter,
) -> Result<()> {
    let keys = match storage.list_objects(bucket).await {
        Ok(keys) => keys,
        Err(e) if e.is_not_found(ResourceKind::Bucket) => {
            reporter.debug(&format!("Bucket {bucket} not found while clearing it"));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    reporter.debug(&format!("Deleting {} objects from {bucket}", keys.len()));
    stream::iter(keys)
        .map(|key| async move {
            match storage.delete_object(bucket, &key).await {
                Err(e) if e.is_not_found(ResourceKind::Bucket) => Ok(()),
                other => other,
            }
        })
        .buffer_unordered(DELETE_CONCURRENCY)
        .try_collect::<Vec<()>>()
        .await?;

    Ok(())
}

/// Delete the (empty) bucket; a missing bucket counts as deleted
pub async fn delete_bucket(
    storage: &dyn ObjectStorage,
    bucket: &str,
    reporter: &dyn Reporter,
) -> Result<()> {
    reporter.debug(&format!("Deleting bucket {bucket}"));
    match storage.delete_bucket(bucket).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found(ResourceKind::Bucket) => {
            reporter.debug(&format!("Bucket {bucket} was already deleted"));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
