use crate::utils::Project;
use colored::{ColoredString, Colorize};
use siteflow_cloud::{StateManager, WebsiteState};

pub async fn handle(project: &Project, instance: Option<String>, json: bool) -> anyhow::Result<()> {
    let manager = StateManager::new(&project.root);
    let global = manager.load().await?;

    let mut instances: Vec<(&String, &WebsiteState)> = match &instance {
        Some(name) => global
            .instances
            .get_key_value(name)
            .into_iter()
            .collect(),
        None => global.instances.iter().collect(),
    };
    instances.sort_by(|a, b| a.0.cmp(b.0));

    if json {
        let map: std::collections::BTreeMap<_, _> = instances.into_iter().collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if instances.is_empty() {
        match instance {
            Some(name) => println!("{}", format!("Instance '{}' is not deployed", name).dimmed()),
            None => println!("{}", "No deployed instances".dimmed()),
        }
        return Ok(());
    }

    for (name, state) in instances {
        print_instance(name, state);
    }
    Ok(())
}

fn print_instance(name: &str, state: &WebsiteState) {
    println!("{}", name.bold());
    let field = |label: &str, value: &Option<String>| {
        if let Some(value) = value {
            println!("  {:<14}{}", label, value);
        }
    };

    match &state.url {
        Some(url) => println!("  {:<14}{}", "URL", url.cyan()),
        None => println!("  {:<14}{}", "URL", "(not deployed yet)".dimmed()),
    }
    field("Bucket", &state.bucket_name);
    field("Region", &state.region);
    field("Bucket URL", &state.bucket_url);
    field("Distribution", &state.distribution_id);
    field("CDN URL", &state.distribution_url);
    field("Domain", &state.domain);

    if state.certificate_arn.is_some() {
        println!("  {:<14}{}", "Certificate", certificate_label(state));
    }
}

fn certificate_label(state: &WebsiteState) -> ColoredString {
    match state.certificate_status.as_deref() {
        Some("ISSUED") => "issued".green(),
        Some("PENDING_VALIDATION") => "pending validation".yellow(),
        Some("VALIDATION_TIMED_OUT") => {
            "validation timed out (delete the certificate and deploy again)".red()
        }
        Some(other) => other.to_lowercase().replace('_', " ").red(),
        // state written before the status was recorded
        None if state.certificate_valid => "issued".green(),
        None => "pending validation".yellow(),
    }
}
