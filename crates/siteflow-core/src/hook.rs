//! Build hook execution

use crate::error::{Result, SiteError};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Run `hook` through `sh -c` in `cwd`, with `env` layered over the
/// inherited process environment.
pub async fn run_build_hook(hook: &str, cwd: &Path, env: &BTreeMap<String, String>) -> Result<()> {
    if !cwd.is_dir() {
        return Err(SiteError::SourceNotFound(cwd.to_path_buf()));
    }

    tracing::info!("Running build hook: {}", hook);
    let output = Command::new("sh")
        .arg("-c")
        .arg(hook)
        .current_dir(cwd)
        .envs(env)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.stdout.is_empty() {
        tracing::debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
    }

    if !output.status.success() {
        return Err(SiteError::BuildHookFailed {
            hook: hook.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hook_runs_in_cwd_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let env = BTreeMap::from([("GREETING".to_string(), "hello".to_string())]);

        run_build_hook("mkdir build && echo $GREETING > build/out.txt", dir.path(), &env)
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("build/out.txt")).unwrap();
        assert_eq!(content.trim(), "hello");
    }

    #[tokio::test]
    async fn test_failing_hook_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_build_hook("echo boom >&2; exit 3", dir.path(), &BTreeMap::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed building website via \"echo boom >&2; exit 3\" due to the following error: \"boom\""
        );
    }

    #[tokio::test]
    async fn test_missing_cwd() {
        let err = run_build_hook("true", Path::new("/no/such/dir"), &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SiteError::SourceNotFound(_)));
    }
}
