//! AWS provider for siteflow
//!
//! Implements the [`siteflow_cloud`] provider traits on the official AWS SDK:
//!
//! - [`S3Storage`]: buckets, website hosting, objects
//! - [`CloudFrontCdn`]: distributions and invalidations
//! - [`Route53Dns`]: hosted zone lookup and record changes
//! - [`AcmCertificates`]: DNS-validated certificates (us-east-1)
//!
//! [`AwsClients`] loads the shared SDK config and bundles all of them into
//! a [`siteflow_cloud::Clients`].

pub mod acm;
pub mod clients;
pub mod cloudfront;
pub mod error;
pub mod route53;
pub mod s3;

pub use acm::AcmCertificates;
pub use clients::{AwsClients, CERTIFICATE_REGION};
pub use cloudfront::CloudFrontCdn;
pub use error::{AwsError, Result};
pub use route53::Route53Dns;
pub use s3::S3Storage;
