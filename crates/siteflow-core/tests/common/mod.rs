use siteflow_cloud::{MemoryCloud, MemoryStateStore, WebsiteState};
use siteflow_core::{Inputs, Reporter, Website};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Reporter keeping every status line for assertions
#[derive(Default)]
pub struct RecordingReporter {
    statuses: Mutex<Vec<String>>,
}

impl RecordingReporter {
    #[allow(dead_code)]
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn debug(&self, _message: &str) {}
}

pub struct TestSite {
    pub root: TempDir,
    pub cloud: MemoryCloud,
    pub store: MemoryStateStore,
    pub reporter: Arc<RecordingReporter>,
}

impl TestSite {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("site")).unwrap();
        fs::write(root.path().join("site/index.html"), "<h1>siteflow</h1>").unwrap();
        Self {
            root,
            cloud: MemoryCloud::new(),
            store: MemoryStateStore::default(),
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    #[allow(dead_code)]
    pub fn with_state(state: WebsiteState) -> Self {
        let site = Self::new();
        Self {
            store: MemoryStateStore::new(state),
            ..site
        }
    }

    pub fn src(&self) -> PathBuf {
        self.root.path().join("site")
    }

    #[allow(dead_code)]
    pub fn write_file(&self, relative: impl AsRef<Path>, content: &str) {
        let path = self.src().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Inputs pointing at the test source directory, with fast retries
    pub fn inputs(&self, extra: &str) -> Inputs {
        let yaml = format!(
            "src: {}\nretry:\n  max_attempts: 5\n  delay_ms: 0\n{}",
            self.src().display(),
            extra
        );
        Inputs::from_yaml(&yaml).unwrap()
    }

    pub async fn website(&self) -> Website {
        Website::load(
            self.cloud.clients(),
            Arc::new(self.store.clone()),
            self.reporter.clone(),
        )
        .await
        .unwrap()
    }
}
