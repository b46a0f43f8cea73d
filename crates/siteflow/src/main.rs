mod commands;
mod reporter;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "siteflow")]
#[command(about = "Static websites on S3 and CloudFront, from a single site.yml", long_about = None)]
struct Cli {
    /// Print every provider step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the website: bucket, upload, CDN and custom domain
    Deploy {
        /// Instance name (default: "default")
        instance: Option<String>,
        /// Instance name (-i/--instance flag, SITEFLOW_INSTANCE)
        #[arg(
            short = 'i',
            long = "instance",
            env = "SITEFLOW_INSTANCE",
            conflicts_with = "instance",
            hide = true
        )]
        instance_flag: Option<String>,
        /// Site file (default: site.yml discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// AWS profile from the shared config files
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,
        /// Run against an in-memory cloud and print the provider calls
        #[arg(long)]
        dry_run: bool,
        /// Print the outputs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the website and every resource it created
    Remove {
        /// Instance name (default: "default")
        instance: Option<String>,
        /// Instance name (-i/--instance flag, SITEFLOW_INSTANCE)
        #[arg(
            short = 'i',
            long = "instance",
            env = "SITEFLOW_INSTANCE",
            conflicts_with = "instance",
            hide = true
        )]
        instance_flag: Option<String>,
        /// Site file used to locate the project
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// AWS profile from the shared config files
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,
        /// Run against an in-memory cloud and print the provider calls
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the recorded state of one or all instances
    Status {
        /// Instance name (all instances when omitted)
        instance: Option<String>,
        /// Instance name (-i/--instance flag, SITEFLOW_INSTANCE)
        #[arg(
            short = 'i',
            long = "instance",
            env = "SITEFLOW_INSTANCE",
            conflicts_with = "instance",
            hide = true
        )]
        instance_flag: Option<String>,
        /// Site file used to locate the project
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Version => {
            println!("siteflow {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Deploy {
            instance,
            instance_flag,
            config,
            profile,
            dry_run,
            json,
        } => {
            let project = utils::locate_project(config)?;
            let instance = utils::determine_instance_name(instance.or(instance_flag));
            commands::deploy::handle(&project, &instance, profile, dry_run, json).await?;
        }
        Commands::Remove {
            instance,
            instance_flag,
            config,
            profile,
            dry_run,
            yes,
        } => {
            let project = utils::locate_project(config)?;
            let instance = utils::determine_instance_name(instance.or(instance_flag));
            commands::remove::handle(&project, &instance, profile, dry_run, yes).await?;
        }
        Commands::Status {
            instance,
            instance_flag,
            config,
            json,
        } => {
            let project = utils::locate_project(config)?;
            commands::status::handle(&project, instance.or(instance_flag), json).await?;
        }
    }

    Ok(())
}
