//! Locator command - show what a locator pins.

use clap::Args;
use console::style;
use sitewatch::locator::{extract_path, extract_versions};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct LocatorArgs {
    /// Full URL or pb= fragment
    locator: String,
}

/// Run the locator command.
pub fn run(args: LocatorArgs) -> Result<(), CliError> {
    let triple = extract_versions(&args.locator);

    println!("path:      {}", show(extract_path(&args.locator)));
    println!("epoch:     {}", show(triple.epoch));
    println!("version:   {}", show(triple.version));
    println!("timestamp: {}", show(triple.timestamp));

    if triple.complete().is_none() {
        println!();
        println!(
            "{}",
            style("incomplete: this locator cannot pin a dataset").yellow()
        );
    }
    Ok(())
}

fn show<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show() {
        assert_eq!(show(Some(990u64)), "990");
        assert_eq!(show::<u64>(None), "-");
    }
}
