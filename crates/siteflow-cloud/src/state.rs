//! State management for deployed websites
//!
//! Manages the `.siteflow/state.json` file which records, per instance, every
//! provider resource a deploy has created so far. The record is flushed after
//! each step, so an interrupted deploy resumes where it stopped.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".siteflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Persisted record of one deployed website instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteState {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub bucket_url: Option<String>,
    pub url: Option<String>,
    pub distribution_id: Option<String>,
    pub distribution_arn: Option<String>,
    pub distribution_url: Option<String>,
    pub domain: Option<String>,
    pub naked_domain: Option<String>,
    pub domain_hosted_zone_id: Option<String>,
    pub certificate_arn: Option<String>,
    pub certificate_valid: bool,
    /// Last status reported for the certificate, e.g. `PENDING_VALIDATION`
    pub certificate_status: Option<String>,
    /// Hosting policy/CORS/website configuration has been applied
    pub configured: bool,
}

impl WebsiteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing was ever recorded for this instance
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Durable storage for one instance's [`WebsiteState`]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<WebsiteState>;

    async fn save(&self, state: &WebsiteState) -> Result<()>;
}

/// Global state containing every instance deployed from a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Website state indexed by instance name
    pub instances: HashMap<String, WebsiteState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            instances: HashMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update an instance; an empty state removes the entry
    pub fn set_instance(&mut self, name: impl Into<String>, state: WebsiteState) {
        let name = name.into();
        if state.is_empty() {
            self.instances.remove(&name);
        } else {
            self.instances.insert(name, state);
        }
        self.updated_at = Utc::now();
    }

    /// Get an instance by name
    pub fn get_instance(&self, name: &str) -> Option<&WebsiteState> {
        self.instances.get(name)
    }
}

/// State manager for reading/writing state files
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Get the state directory path
    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    /// Get the state file path
    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    /// Get the backup file path
    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    /// Get the lock file path
    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    /// Ensure the state directory exists
    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} instances", state.instances.len());
        Ok(state)
    }

    /// Save the state
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} instances", state.instances.len());
        Ok(())
    }

    /// Store bound to a single instance of this project
    pub fn instance(&self, name: impl Into<String>) -> InstanceStore {
        InstanceStore {
            manager: self.clone(),
            instance: name.into(),
        }
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered abandoned
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// [`StateStore`] persisting one instance inside the project state file
#[derive(Debug, Clone)]
pub struct InstanceStore {
    manager: StateManager,
    instance: String,
}

impl InstanceStore {
    pub fn instance(&self) -> &str {
        &self.instance
    }
}

#[async_trait]
impl StateStore for InstanceStore {
    async fn load(&self) -> Result<WebsiteState> {
        let global = self.manager.load().await?;
        Ok(global
            .get_instance(&self.instance)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, state: &WebsiteState) -> Result<()> {
        let mut global = self.manager.load().await?;
        global.set_instance(self.instance.clone(), state.clone());
        self.manager.save(&global).await
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
