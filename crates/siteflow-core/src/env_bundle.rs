//! `env.js` generation
//!
//! Exposes the configured environment to the browser as `window.env`.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_BUNDLE_FILE: &str = "env.js";

pub fn render_env_bundle(env: &BTreeMap<String, String>) -> Result<String> {
    let mut script = String::from("window.env = {};\n");
    for (key, value) in env {
        script.push_str(&format!(
            "window.env.{} = {};\n",
            key,
            serde_json::to_string(value)?
        ));
    }
    Ok(script)
}

/// Write `env.js` into `root`. Nothing is written for an empty `env`.
pub async fn write_env_bundle(root: &Path, env: &BTreeMap<String, String>) -> Result<Option<PathBuf>> {
    if env.is_empty() {
        return Ok(None);
    }

    let path = root.join(ENV_BUNDLE_FILE);
    tokio::fs::write(&path, render_env_bundle(env)?).await?;
    tracing::debug!("Wrote {} variables to {}", env.len(), path.display());
    Ok(Some(path))
}
