//! SiteWatch CLI - Command-line interface
//!
//! Surveys construction sites over historical satellite imagery and exposes
//! the tile service plumbing for inspection.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{fetch, locator, nodes, stalls, survey};
use error::CliError;

#[derive(Parser)]
#[command(name = "sitewatch")]
#[command(version, about = "Construction progress from historical satellite imagery", long_about = None)]
struct Cli {
    /// Config file (default: ~/.sitewatch/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite and classify every area for every configured year
    Survey(survey::SurveyArgs),
    /// List the nodes of one bulk metadata packet
    Nodes(nodes::NodesArgs),
    /// Fetch one node's imagery as JPEG
    Fetch(fetch::FetchArgs),
    /// Compute the stall report from a results CSV
    Stalls(stalls::StallsArgs),
    /// Show the version components of a locator
    Locator(locator::LocatorArgs),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Survey(args) => survey::run(cli.config.as_deref(), args),
        Commands::Nodes(args) => nodes::run(cli.config.as_deref(), args),
        Commands::Fetch(args) => fetch::run(cli.config.as_deref(), args),
        Commands::Stalls(args) => stalls::run(cli.config.as_deref(), args),
        Commands::Locator(args) => locator::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
