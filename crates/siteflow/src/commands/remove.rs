use crate::reporter::ConsoleReporter;
use crate::utils::{self, Project};
use colored::Colorize;
use siteflow_cloud::{MemoryStateStore, StateManager, StateStore};
use siteflow_core::Website;
use siteflow_core::config::DEFAULT_REGION;
use std::sync::Arc;

pub async fn handle(
    project: &Project,
    instance: &str,
    profile: Option<String>,
    dry_run: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let manager = StateManager::new(&project.root);
    let instance_store = manager.instance(instance);
    let state = instance_store.load().await?;

    if state.is_empty() {
        println!(
            "{}",
            format!("Nothing to remove: instance '{}' has no recorded resources", instance)
                .dimmed()
        );
        return Ok(());
    }

    println!("{}", "Removing website...".blue().bold());
    println!("Instance: {}", instance.cyan());
    if let Some(bucket) = &state.bucket_name {
        println!("  • bucket {}", bucket.cyan());
    }
    if let Some(id) = &state.distribution_id {
        println!("  • distribution {}", id.cyan());
    }
    if let Some(domain) = &state.domain {
        println!("  • DNS records for {}", domain.cyan());
    }

    if !yes && !dry_run {
        println!();
        println!(
            "{}",
            "Warning: every object in the bucket will be deleted.".yellow()
        );
        println!("Run again with --yes to proceed");
        return Ok(());
    }

    let lock = if dry_run {
        None
    } else {
        Some(manager.acquire_lock().await?)
    };
    let store: Arc<dyn StateStore> = if dry_run {
        Arc::new(MemoryStateStore::new(state.clone()))
    } else {
        Arc::new(instance_store)
    };

    let region = state
        .region
        .clone()
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let (clients, memory) = utils::connect(&region, profile, dry_run, &state).await?;

    let mut website = Website::new(clients, store, Arc::new(ConsoleReporter), state);
    let result = website.remove().await;

    if let Some(lock) = lock {
        lock.release().await?;
    }
    let outputs = result.map_err(utils::site_error)?;

    if let Some(cloud) = &memory {
        utils::print_planned_calls(cloud);
    }

    println!();
    match outputs.pending_distribution {
        Some(id) => {
            println!("{}", "✓ Website removed".green().bold());
            println!(
                "{}",
                format!(
                    "ℹ Distribution {} is being disabled. Run `siteflow remove` again later to delete it.",
                    id
                )
                .yellow()
            );
        }
        None => println!("{}", "✓ Website removed".green().bold()),
    }
    Ok(())
}
