#![allow(deprecated)] // Command::cargo_bin is deprecated in newer assert_cmd releases

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    /// Project with a one-page site under `public/`
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let public = root.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("index.html"), "<h1>hello</h1>").unwrap();
        Self { root }
    }

    pub fn write_site_yml(&self, content: &str) {
        fs::write(self.root.path().join("site.yml"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, content: &str) {
        let dir = self.root.path().join(".siteflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("state.json"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn state_path(&self) -> PathBuf {
        self.root.path().join(".siteflow").join("state.json")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// `siteflow` running inside the project, isolated from the caller's
    /// environment and global config
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("siteflow").unwrap();
        cmd.current_dir(self.path())
            .env_remove("SITEFLOW_CONFIG")
            .env_remove("SITEFLOW_INSTANCE")
            .env_remove("RUST_LOG")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"));
        cmd
    }
}
