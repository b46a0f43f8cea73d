//! Static website hosting configuration of a bucket

use crate::error::Result;
use crate::policy::effective_policy;
use siteflow_cloud::{CorsRule, ObjectStorage, ResourceKind, RetryConfig, WebsiteConfig, await_ready};

/// CORS rules every website bucket gets: signed writes from AWS consoles and
/// tools, anonymous reads from anywhere
pub fn cors_rules() -> Vec<CorsRule> {
    vec![
        CorsRule {
            allowed_methods: ["PUT", "POST", "DELETE", "HEAD"]
                .map(String::from)
                .to_vec(),
            allowed_origins: vec!["https://*.amazonaws.com".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age_seconds: 0,
        },
        CorsRule {
            allowed_methods: vec!["GET".to_string()],
            allowed_origins: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age_seconds: 0,
        },
    ]
}

/// Apply policy, CORS and website settings, in that order.
///
/// A just-created bucket may not be visible yet; the whole sequence is then
/// retried from the top.
pub async fn configure_bucket_for_hosting(
    storage: &dyn ObjectStorage,
    bucket: &str,
    index_document: &str,
    error_document: &str,
    policy_override: Option<&serde_json::Value>,
    retry: &RetryConfig,
) -> Result<()> {
    let policy = effective_policy(bucket, policy_override);
    let cors = cors_rules();
    let website = WebsiteConfig {
        index_document: index_document.to_string(),
        error_document: error_document.to_string(),
    };

    let (policy, cors, website) = (&policy, &cors, &website);
    await_ready(
        &format!("hosting configuration of bucket {bucket}"),
        retry,
        move || async move {
            storage.put_bucket_policy(bucket, policy).await?;
            storage.put_bucket_cors(bucket, cors).await?;
            storage.put_bucket_website(bucket, website).await
        },
        |e| e.is_not_found(ResourceKind::Bucket),
    )
    .await?;

    tracing::debug!("Bucket {} configured for website hosting", bucket);
    Ok(())
}
