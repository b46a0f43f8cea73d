use crate::reporter::ConsoleReporter;
use crate::utils::{self, Project};
use colored::Colorize;
use siteflow_cloud::{MemoryStateStore, StateManager, StateStore};
use siteflow_core::config::DEFAULT_REGION;
use siteflow_core::{Inputs, Reporter, TracingReporter, Website};
use std::sync::Arc;

pub async fn handle(
    project: &Project,
    instance: &str,
    profile: Option<String>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let site_file = project.require_site_file()?;
    if !json {
        println!("{}", "Deploying website...".blue().bold());
        println!("Site file: {}", site_file.display().to_string().cyan());
        println!("Instance: {}", instance.cyan());
    }

    let inputs = Inputs::load(site_file).map_err(utils::site_error)?;
    let manager = StateManager::new(&project.root);

    // dry runs read the recorded state but never write it back
    let lock = if dry_run {
        None
    } else {
        Some(manager.acquire_lock().await?)
    };
    let instance_store = manager.instance(instance);
    let state = instance_store.load().await?;
    let store: Arc<dyn StateStore> = if dry_run {
        Arc::new(MemoryStateStore::new(state.clone()))
    } else {
        Arc::new(instance_store)
    };

    let region = state
        .region
        .clone()
        .or_else(|| inputs.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let (clients, memory) = utils::connect(&region, profile, dry_run, &state).await?;

    // JSON output must stay the only thing on stdout
    let reporter: Arc<dyn Reporter> = if json {
        Arc::new(TracingReporter)
    } else {
        Arc::new(ConsoleReporter)
    };
    let mut website = Website::new(clients, store, reporter, state);
    let result = website.deploy(&inputs).await;

    if let Some(lock) = lock {
        lock.release().await?;
    }
    let outputs = result.map_err(utils::site_error)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }
    if let Some(cloud) = &memory {
        utils::print_planned_calls(cloud);
    }
    utils::print_outputs(&outputs);
    Ok(())
}
