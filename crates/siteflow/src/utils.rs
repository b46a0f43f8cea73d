use colored::Colorize;
use siteflow_cloud::{Clients, MemoryCloud, WebsiteState};
use siteflow_cloud_aws::AwsClients;
use siteflow_config::ConfigError;
use siteflow_core::{Outputs, SiteError};
use std::path::PathBuf;

pub const DEFAULT_INSTANCE: &str = "default";

/// Project location: the directory holding `.siteflow/state.json` and,
/// when one was found, the site file
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub site_file: Option<PathBuf>,
}

impl Project {
    pub fn require_site_file(&self) -> anyhow::Result<&PathBuf> {
        self.site_file
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{}", ConfigError::SiteFileNotFound))
    }
}

pub fn locate_project(config: Option<PathBuf>) -> anyhow::Result<Project> {
    let site_file = match config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Site file not found: {}", path.display());
            }
            Some(path)
        }
        None => match siteflow_config::find_site_file() {
            Ok(path) => Some(path),
            Err(ConfigError::SiteFileNotFound) => None,
            Err(e) => return Err(e.into()),
        },
    };

    let root = match &site_file {
        Some(path) => siteflow_config::project_root(path),
        None => std::env::current_dir()?,
    };
    tracing::debug!("Project root: {}", root.display());

    Ok(Project { root, site_file })
}

pub fn determine_instance_name(instance: Option<String>) -> String {
    instance
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INSTANCE.to_string())
}

/// Reconciler errors carry remediation hints for the terminal
pub fn site_error(err: SiteError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

/// Provider bundle for a run: AWS, or for dry runs an in-memory cloud
/// holding the resources recorded in `state`
pub async fn connect(
    region: &str,
    profile: Option<String>,
    dry_run: bool,
    state: &WebsiteState,
) -> anyhow::Result<(Clients, Option<MemoryCloud>)> {
    if dry_run {
        let cloud = MemoryCloud::new();
        cloud.seed_from_state(state);
        return Ok((cloud.clients(), Some(cloud)));
    }

    tracing::debug!("Connecting to AWS ({})", region);
    let clients = AwsClients::new(region)
        .with_profile(profile)
        .connect()
        .await?;
    Ok((clients, None))
}

pub fn print_planned_calls(cloud: &MemoryCloud) {
    let calls = cloud.calls();
    println!();
    println!(
        "{}",
        format!("Dry run: {} provider calls", calls.len()).yellow().bold()
    );
    for call in &calls {
        println!("  • {}", call);
    }
}

pub fn print_outputs(outputs: &Outputs) {
    println!();
    println!("{}", "✓ Website deployed".green().bold());
    println!("  URL:          {}", outputs.url.cyan());
    println!("  Bucket:       {}", outputs.bucket);
    println!("  Bucket URL:   {}", outputs.bucket_url);
    println!("  Distribution: {}", outputs.distribution_url);
    if let Some(domain) = &outputs.domain {
        println!("  Domain:       {}", domain.cyan());
    }
}
