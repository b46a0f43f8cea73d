use siteflow_cloud::CloudError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Unable to deploy website. Missing inputs.src.")]
    MissingSource,

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error(
        "Changing the {field} of a deployed website is not supported \
         (deployed: \"{previous}\", requested: \"{requested}\")"
    )]
    ImmutableFieldChanged {
        field: &'static str,
        previous: String,
        requested: String,
    },

    #[error("Bucket name \"{0}\" is already taken.")]
    BucketNameTaken(String),

    #[error("Forbidden: Invalid credentials or this AWS S3 bucket name may already be taken")]
    AmbiguousBucketOwnership(String),

    #[error("Failed building website via \"{hook}\" due to the following error: \"{stderr}\"")]
    BuildHookFailed { hook: String, stderr: String },

    #[error("Certificate {arn} is in unexpected state {status}")]
    CertificateFailed { arn: String, status: String },

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SiteError {
    /// Message with remediation hints for terminal output
    pub fn user_message(&self) -> String {
        match self {
            SiteError::ImmutableFieldChanged { field, .. } => {
                format!(
                    "{}\n\
                     \n\
                     To change the {}, remove the website first:\n\
                       siteflow remove\n\
                     then deploy again with the new value.",
                    self, field
                )
            }
            SiteError::BucketNameTaken(_) => {
                format!(
                    "{}\n\
                     \n\
                     Bucket names are global across all accounts. \
                     Pick another bucket_name in site.yml.",
                    self
                )
            }
            SiteError::Cloud(CloudError::Timeout { .. }) => {
                format!(
                    "{}\n\
                     \n\
                     The provider did not converge in time. Deploying again resumes \
                     from the last recorded step; raise retry.max_attempts to wait longer.",
                    self
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hook_message_embeds_stderr() {
        let err = SiteError::BuildHookFailed {
            hook: "npm run build".to_string(),
            stderr: "missing script: build".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed building website via \"npm run build\" due to the following error: \"missing script: build\""
        );
    }

    #[test]
    fn test_immutable_field_hint() {
        let err = SiteError::ImmutableFieldChanged {
            field: "bucket name",
            previous: "a".to_string(),
            requested: "b".to_string(),
        };
        assert!(err.user_message().contains("siteflow remove"));
    }
}
