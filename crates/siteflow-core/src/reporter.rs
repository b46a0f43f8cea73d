//! Lifecycle hooks through which deploy/remove report progress to the host

/// Progress sink supplied by the host
///
/// `status` carries short phase names ("Deploying Bucket"), `debug` the
/// detailed narrative of each provider step.
pub trait Reporter: Send + Sync {
    fn status(&self, message: &str);

    fn debug(&self, message: &str);
}

/// Reporter forwarding everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn status(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}
