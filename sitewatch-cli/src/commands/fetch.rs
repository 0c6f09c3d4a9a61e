//! Fetch command - download one node's imagery.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use sitewatch::imagery::extract_jpeg;
use sitewatch::locator::{extract_versions, DatasetVersion, TileAddress};

use super::common::{connect, load_config, start_logging};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Octant path of the node
    path: String,

    /// Output JPEG file
    #[arg(long, short)]
    output: PathBuf,

    /// Request the dataset configured for this year
    #[arg(long, conflicts_with_all = ["dataset", "epoch"])]
    year: Option<u32>,

    /// Request the dataset named by a locator or pb= fragment
    #[arg(long, conflicts_with = "epoch")]
    dataset: Option<String>,

    /// Request the node at this epoch without pinning a dataset
    #[arg(long)]
    epoch: Option<u64>,
}

/// Run the fetch command.
pub fn run(config_path: Option<&Path>, args: FetchArgs) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let _logging = start_logging(&config)?;

    let address = if let Some(year) = args.year {
        TileAddress::at_version(args.path.clone(), config.dataset_for(year)?)
    } else if let Some(locator) = &args.dataset {
        TileAddress::at_version(args.path.clone(), parse_dataset(locator)?)
    } else if let Some(epoch) = args.epoch {
        TileAddress::new(args.path.clone(), epoch)
    } else {
        return Err(CliError::Usage(
            "one of --year, --dataset or --epoch is required".to_string(),
        ));
    };

    let service = connect(&config)?;
    println!("Fetching {}", service.locator().node_data(&address));

    let payload = service.fetch_node_data(&address)?;
    let jpeg = extract_jpeg(&payload)?;
    fs::write(&args.output, jpeg).map_err(|error| CliError::FileWrite {
        path: args.output.clone(),
        error,
    })?;

    println!("Wrote {} bytes to {}", jpeg.len(), args.output.display());
    Ok(())
}

fn parse_dataset(locator: &str) -> Result<DatasetVersion, CliError> {
    extract_versions(locator).to_dataset().ok_or_else(|| {
        CliError::Usage(format!(
            "locator lacks an epoch, version or timestamp: {}",
            locator
        ))
    })
}
