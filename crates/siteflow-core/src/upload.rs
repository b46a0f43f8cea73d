//! Directory upload into the website bucket

use crate::error::{Result, SiteError};
use crate::reporter::Reporter;
use futures_util::{StreamExt, TryStreamExt, stream};
use siteflow_cloud::{CloudError, Clients, UploadObject};
use std::path::{Path, PathBuf};

/// A file scheduled for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the upload root
    pub key: String,
}

/// Every regular file below `dir`, keyed by its relative path
pub fn collect_files(dir: &Path) -> Result<Vec<UploadFile>> {
    if !dir.is_dir() {
        return Err(SiteError::SourceNotFound(dir.to_path_buf()));
    }

    let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| SiteError::InvalidInput(format!("invalid upload directory: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SiteError::Io(e.into_error()))?;
        if !path.is_file() {
            continue;
        }
        let relative = path
            .strip_prefix(dir)
            .map_err(|e| SiteError::InvalidInput(e.to_string()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(UploadFile { path, key });
    }
    files.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(files)
}

pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Upload the contents of `dir` with at most `concurrency` requests in
/// flight. Returns the number of uploaded objects.
pub async fn upload_dir(
    clients: &Clients,
    bucket: &str,
    dir: &Path,
    concurrency: usize,
    accelerated: bool,
    reporter: &dyn Reporter,
) -> Result<usize> {
    let files = collect_files(dir)?;
    let count = files.len();
    reporter.debug(&format!(
        "Uploading {} files from {} to bucket {}",
        count,
        dir.display(),
        bucket
    ));

    stream::iter(files)
        .map(|file| upload_file(clients, bucket, file, accelerated))
        .buffer_unordered(concurrency.max(1))
        .try_collect::<Vec<()>>()
        .await?;

    reporter.debug(&format!("Uploaded {count} files to bucket {bucket}"));
    Ok(count)
}

async fn upload_file(
    clients: &Clients,
    bucket: &str,
    file: UploadFile,
    accelerated: bool,
) -> Result<()> {
    let body = tokio::fs::read(&file.path).await?;
    let object = UploadObject {
        content_type: content_type_for(&file.path),
        key: file.key,
        body,
    };

    if accelerated {
        match clients.accelerated.put_object(bucket, object.clone()).await {
            Ok(()) => return Ok(()),
            Err(CloudError::AccelerationNotConfigured(_)) => {
                tracing::debug!(
                    "Acceleration not ready for {}, uploading {} through the regular endpoint",
                    bucket,
                    object.key
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    clients.storage.put_object(bucket, object).await?;
    Ok(())
}
