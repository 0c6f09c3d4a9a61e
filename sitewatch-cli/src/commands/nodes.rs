//! Nodes command - list one bulk metadata packet.

use std::path::Path;

use clap::Args;
use console::style;
use sitewatch::provider::{HttpClient, TileService};

use super::common::{connect, load_config, start_logging};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct NodesArgs {
    /// Octant path of the packet (empty for the root)
    #[arg(default_value = "")]
    path: String,

    /// Packet epoch (default: the planet's root epoch)
    #[arg(long)]
    epoch: Option<u64>,

    /// Only list nodes carrying their own imagery epoch
    #[arg(long)]
    imagery_only: bool,
}

/// Run the nodes command.
pub fn run(config_path: Option<&Path>, args: NodesArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let _logging = start_logging(&config)?;
    let service = connect(&config)?;

    let epoch = match args.epoch {
        Some(epoch) => epoch,
        None => root_epoch(&service)?,
    };

    let bulk = service.fetch_bulk_metadata(&args.path, epoch)?;
    if bulk.is_empty() {
        println!("No node container in packet '{}' at epoch {}", args.path, epoch);
        return Ok(());
    }

    println!(
        "{} '{}' epoch {}: {} nodes ({} dropped)",
        style("Packet").bold(),
        args.path,
        epoch,
        bulk.nodes.len(),
        bulk.dropped
    );
    if let Some(imagery_epoch) = bulk.defaults.imagery_epoch {
        println!("  default imagery epoch: {}", imagery_epoch);
    }
    if let Some(timestamp) = bulk.defaults.timestamp {
        println!("  default timestamp:     {}", timestamp);
    }
    println!();

    let nodes: Vec<_> = if args.imagery_only {
        bulk.imagery_nodes().collect()
    } else {
        bulk.nodes.iter().collect()
    };
    for node in nodes {
        let address = node.tile_address(&bulk.defaults, node.epoch().unwrap_or(epoch));
        println!("{}", node);
        println!("  {}", style(service.locator().node_data(&address)).dim());
    }
    Ok(())
}

fn root_epoch<C: HttpClient>(service: &TileService<C>) -> Result<u64, CliError> {
    service.fetch_planetoid()?.root_epoch.ok_or_else(|| {
        CliError::Usage("planetoid metadata has no root epoch; pass --epoch".to_string())
    })
}
