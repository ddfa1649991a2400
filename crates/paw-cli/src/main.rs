//! paw: single-session CLI coding agent
//!
//! Runs one prompt through an agent loop with filesystem and shell tools,
//! then compacts the session into a persistent memory log.

mod agent;
mod attachments;
mod config;
mod memory;
mod session;
mod tools;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "paw")]
#[command(about = "Single-session CLI coding agent", version)]
struct Cli {
    /// The task for the agent, e.g. `paw fix the failing test`
    #[arg(required = true, trailing_var_arg = true)]
    prompt: Vec<String>,

    /// Approve all tool calls without asking
    #[arg(long)]
    auto: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let prompt = cli.prompt.join(" ");
    let config = Config::from_env()?;

    session::run(&prompt, config, cli.auto).await
}
