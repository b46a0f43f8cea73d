//! User-supplied website inputs (`site.yml`)

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Declarative inputs of one website instance
///
/// ```yaml
/// src: ./site
/// hook: npm run build
/// dist: build
/// domain: example.com
/// env:
///   API_URL: https://api.example.com
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Inputs {
    /// Source directory; the build hook runs here and `env.js` is written here
    pub src: Option<PathBuf>,
    /// Directory uploaded after the hook, relative to `src`
    pub dist: Option<PathBuf>,
    /// Build command run in `src`
    pub hook: Option<String>,
    /// Variables bundled into `env.js` and passed to the hook
    pub env: BTreeMap<String, String>,
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub domain: Option<String>,
    pub index_document: Option<String>,
    pub error_document: Option<String>,
    /// Deep-merged over the default public-read bucket policy
    pub policy: Option<serde_json::Value>,
    pub cdn: CdnInputs,
    /// Maximum number of concurrent object uploads
    pub upload_concurrency: Option<usize>,
    pub retry: RetryInputs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdnInputs {
    /// Extra origins placed behind the distribution next to the bucket
    pub origins: Vec<OriginInput>,
    /// Default cache behaviour TTL in seconds
    pub ttl: Option<i64>,
    pub price_class: Option<String>,
}

/// Either a bare origin URL or a URL with per-path cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginInput {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        path_patterns: BTreeMap<String, PathPatternInput>,
    },
}

impl OriginInput {
    pub fn url(&self) -> &str {
        match self {
            OriginInput::Url(url) => url,
            OriginInput::Detailed { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathPatternInput {
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryInputs {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
}

impl Inputs {
    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read inputs from a file; relative `src` paths resolve against the
    /// file's directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut inputs = Self::from_yaml(&content)?;

        if let (Some(src), Some(base)) = (&inputs.src, path.parent())
            && src.is_relative()
        {
            inputs.src = Some(base.join(src));
        }

        tracing::debug!("Loaded inputs from {}", path.display());
        Ok(inputs)
    }
}
