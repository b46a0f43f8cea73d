//! siteflow cloud infrastructure
//!
//! This crate provides the provider abstraction the website reconciler is
//! written against: one trait per control-plane API, the resource model the
//! traits exchange, a retry-poll helper for eventually consistent operations,
//! and the persisted per-instance state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  siteflow CLI                    │
//! │              (siteflow deploy/remove)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 siteflow-core                    │
//! │      bucket · hosting · certificate · cdn · dns  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                siteflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  ObjectStorage · Cdn · Dns · Certificate │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Retry-Poll  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │      aws      │ │    memory     │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod model;
pub mod provider;
pub mod retry;
pub mod state;

// Re-exports
pub use error::{CloudError, ResourceKind, Result};
pub use memory::{MemoryCloud, MemoryStateStore};
pub use model::{
    CLOUDFRONT_HOSTED_ZONE_ID, CacheBehaviorSpec, CertificateDetail, CertificateStatus, CorsRule,
    DistributionInfo, DistributionSnapshot, DistributionSpec, DnsRecord, OriginKind, OriginSpec,
    RecordTarget, RecordType, UploadObject, ValidationRecord, WebsiteConfig,
};
pub use provider::{CertificateAuthority, Cdn, Clients, Dns, ObjectStorage, RetryConfig};
pub use retry::{await_ready, poll_until};
pub use state::{GlobalState, InstanceStore, StateLock, StateManager, StateStore, WebsiteState};
