// ABOUTME: Entry point for the devstack CLI application.
// ABOUTME: Parses arguments and dispatches to environment operations.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use devstack::config::{self, EnvConfig};
use devstack::environment::Environment;
use devstack::error::Result;
use devstack::output::{Output, OutputMode};
use devstack::process::CliRunner;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    output.start_timer();

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let cwd = env::current_dir().expect("failed to get current directory");

    if let Commands::Init { stack, force } = &cli.command {
        config::init_config(&cwd, stack.as_deref(), *force)?;
        output.success("Configuration written");
        return Ok(());
    }

    let config = EnvConfig::discover(&cwd)?;
    let environment = Environment::new(&config, Vec::new(), CliRunner::shared())?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Resolve => {
            output.progress("Resolving container files...");
            environment.resolve().await?;
            output.success("Containers resolved");
        }
        Commands::Up => {
            output.progress(&format!("Starting environment '{}'...", config.stack));
            environment.up().await?;
            output.success("Environment up");
        }
        Commands::Down => {
            output.progress(&format!("Stopping environment '{}'...", config.stack));
            environment.down().await?;
            output.success("Environment down");
        }
        Commands::Restart => {
            output.progress(&format!("Restarting environment '{}'...", config.stack));
            environment.restart().await?;
            output.success("Environment restarted");
        }
        Commands::Destroy => {
            environment.down().await?;
            environment.destroy().await?;
            output.success("Environment destroyed");
        }
        Commands::Check => {
            output.progress("Checking environment health...");
            let statuses = environment.check(true).await?;
            for status in &statuses {
                output.progress(&status.to_string());
            }
            output.success("Environment healthy");
        }
        Commands::Reload => {
            output.progress("Reloading containers...");
            environment.reload().await?;
            output.success("Containers reloaded");
        }
        Commands::Dev => {
            output.progress("Watching for file changes (press Ctrl+C to stop)...");
            environment.dev().await?;
        }
    }

    Ok(())
}
