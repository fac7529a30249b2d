// src/bin/tiller.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tiller::{
    CancellationToken,
    cli::Cli,
    core::{
        engine::Engine, environment::EnvironmentCollection, grammars::Grammar, script_loader,
    },
    errors::ShellError,
};

/// Entry point: set up logging and cancellation, run the engine, and map the
/// outcome to an exit code.
#[tokio::main]
async fn main() {
    env_logger::init();

    // Ctrl+C raises the cooperative cancellation flag; the run loop observes
    // it between commands and handlers may poll it mid-flight.
    let cancellation_token: CancellationToken = Arc::new(AtomicBool::new(false));
    {
        let token = Arc::clone(&cancellation_token);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::debug!("interrupt received, raising cancellation flag");
                token.store(true, Ordering::SeqCst);
            }
        });
    }

    if let Err(e) = run_cli(Cli::parse(), cancellation_token).await {
        if let Some(ShellError::Interrupted) = e.downcast_ref::<ShellError>() {
            // Standard exit code for interruption, without noise.
            std::process::exit(130);
        }
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli, cancellation_token: CancellationToken) -> Result<()> {
    let mut builder = Engine::builder()
        .grammar(Grammar::from_name(&cli.grammar)?)
        .cancellation(cancellation_token);

    if !cli.env.is_empty() {
        builder = builder.environments(EnvironmentCollection::new(cli.env.clone())?);
    }
    if let Some(limit) = cli.limit {
        builder = builder.loop_limit(limit);
    }
    if let Some(path) = &cli.scripts {
        let (source, aliases) = script_loader::load_file(path)?;
        builder = builder.source(Box::new(source));
        for (from, to) in aliases {
            builder = builder.alias(from, to);
        }
    }

    let mut engine = builder.build()?;
    if cli.args.is_empty() {
        engine.run_interactive().await?;
    } else {
        // The process's own arguments become the initial headless queue.
        engine.run_with_args(cli.args).await?;
    }
    Ok(())
}
