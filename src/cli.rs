// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "devstack")]
#[command(about = "Local multi-container development environment manager")]
#[command(version)]
pub struct Cli {
    /// Verbose diagnostic logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new devstack.yml configuration file
    Init {
        /// Stack name to write into the template
        #[arg(short, long)]
        stack: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Prepare host-side container files without starting anything
    Resolve,

    /// Bring the environment up
    Up,

    /// Tear the environment down
    Down,

    /// Tear down, then bring up again
    Restart,

    /// Tear down and remove all environment host state
    Destroy,

    /// Run health checks against the running environment
    Check,

    /// Reload container configuration
    Reload,

    /// Watch host files and reload affected containers continuously
    Dev,
}
