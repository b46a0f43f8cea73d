//! siteflow website reconciler
//!
//! Converges a static website (bucket, CDN distribution, optional custom
//! domain) toward the inputs in `site.yml`, and tears it down again.
//!
//! ```text
//! deploy: inputs ─▶ DesiredConfig ─▶ env.js + hook ─▶ bucket
//!         ─▶ (hosting ∥ upload) ─▶ certificate ─▶ distribution ─▶ DNS
//! remove: detach domain ─▶ DNS ─▶ distribution ─▶ objects ─▶ bucket
//! ```

pub mod bucket;
pub mod certificate;
pub mod config;
pub mod distribution;
pub mod dns;
pub mod domain;
pub mod env_bundle;
pub mod error;
pub mod hook;
pub mod hosting;
pub mod inputs;
pub mod policy;
pub mod reporter;
pub mod upload;
pub mod website;

pub use certificate::CertificateOutcome;
pub use config::{CdnConfig, DesiredConfig, OriginConfig};
pub use distribution::{DeleteOutcome, DistributionChange, ReconciledDistribution};
pub use domain::{DomainName, normalize_domain};
pub use error::{Result, SiteError};
pub use inputs::{CdnInputs, Inputs, OriginInput, PathPatternInput, RetryInputs};
pub use reporter::{Reporter, TracingReporter};
pub use website::{Outputs, RemoveOutputs, Website};
