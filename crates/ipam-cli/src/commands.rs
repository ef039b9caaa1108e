use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use ipam_core::SpaceStats;
use ipam_server::{IpamConfig, IpamServer};
use ipam_store::load_space;
use tracing::Level;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args, cli.verbose).await,
        Command::Check(args) => cmd_check(args, cli.verbose, cli.format).await,
        Command::InitConfig(_) => cmd_init_config(cli.format),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // Already installed when several commands run in one process (tests).
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<IpamConfig> {
    match path {
        Some(path) => IpamConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(IpamConfig::default()),
    }
}

async fn cmd_serve(args: ServeArgs, verbose: bool) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    init_tracing(verbose || config.debug);

    let server = IpamServer::new(config).await?;
    server.serve().await?;
    Ok(())
}

/// Build a throwaway address space from the configured store.
async fn check(config: &IpamConfig) -> anyhow::Result<SpaceStats> {
    let store = config.open_store().await?;
    let space = load_space(store.as_ref(), config.policy).await?;
    Ok(space.stats())
}

async fn cmd_check(args: CheckArgs, verbose: bool, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(verbose || config.debug);

    match check(&config).await {
        Ok(stats) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Text => {
                    println!("{} Store loads cleanly", "✓".green().bold());
                    println!("  Prefixes: {}", stats.prefixes.to_string().bold());
                    println!("  Subnets:  {}", stats.subnets.to_string().bold());
                    println!("  Hosts:    {}", stats.hosts.to_string().bold());
                }
            }
            Ok(())
        }
        Err(e) => {
            if format == OutputFormat::Text {
                println!("{} Store rejected: {}", "✗".red().bold(), format!("{e:#}").red());
            }
            Err(e)
        }
    }
}

fn cmd_init_config(format: OutputFormat) -> anyhow::Result<()> {
    let config = IpamConfig::default();
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
