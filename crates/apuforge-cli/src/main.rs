//! apuforge CLI - derive, validate and operate a local llama.cpp stack

mod cli;
mod commands;
mod context;
mod error;
mod output;
mod utils;

use apuforge_kernel::{ConfigurationError, OverridesError, Registries};
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use error::EnvironmentError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.globals.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        report(&e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command_async(cli))
}

async fn run_command_async(cli: Cli) -> anyhow::Result<()> {
    let globals = cli.globals;

    match cli.command {
        Commands::Generate { check } => {
            commands::generate::run(&context::active(&globals)?, check)?;
        }

        Commands::Show { json } => {
            commands::generate::show(&context::active(&globals)?, json)?;
        }

        Commands::Validate => {
            commands::generate::validate(&context::active(&globals)?);
        }

        Commands::Render { artifact, service } => {
            commands::render::run(&context::active(&globals)?, artifact, service)?;
        }

        Commands::List { what, kind } => {
            commands::list::run(Registries::shared(), what, kind)?;
        }

        Commands::Doctor { json, strict } => {
            commands::doctor::run(&globals, strict, json)?;
        }

        Commands::Build {
            backend,
            arch,
            dry_run,
        } => {
            commands::build::run(&context::active(&globals)?, backend, arch, dry_run)?;
        }

        Commands::Serve {
            kind,
            model,
            ctx,
            model_file,
            flags,
            dry_run,
        } => {
            let opts = commands::serve::ServeOptions {
                model,
                ctx,
                model_file,
                flags,
                dry_run,
            };
            let active = commands::serve::apply(context::overrides(&globals)?, kind, &opts, context::resolve)?;
            commands::serve::run(&active, kind, &opts)?;
        }

        Commands::Firewall { action, dry_run } => {
            commands::firewall::run(&context::active(&globals)?, action, dry_run)?;
        }

        Commands::Bench {
            url,
            max_tokens,
            mode,
        } => {
            commands::bench::run(&context::active(&globals)?, url, max_tokens, mode).await?;
        }
    }

    Ok(())
}

fn report(e: &anyhow::Error) {
    eprintln!("{} {e}", "✗".red());
    let hint = if let Some(err) = e.downcast_ref::<ConfigurationError>() {
        Some(err.hint())
    } else if let Some(err) = e.downcast_ref::<EnvironmentError>() {
        Some(err.hint())
    } else if e.downcast_ref::<OverridesError>().is_some() {
        Some("check the overrides file and APUFORGE__* environment variables".to_string())
    } else {
        None
    };
    if let Some(hint) = hint {
        eprintln!("  {} {hint}", "hint:".yellow());
    }
}
