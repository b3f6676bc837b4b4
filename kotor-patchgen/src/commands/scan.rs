//! `scan`: reference index statistics for a folder

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use tslpatch_compiler::{OriginId, ReferenceScanner};

use crate::utils::{add_table_row, create_spinner, create_table};

#[derive(Args)]
pub struct ScanArgs {
    /// Folder of extracted resources
    pub dir: PathBuf,

    /// Origin id recorded for the indexed sites
    #[arg(long, default_value = "")]
    pub origin: String,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ScanArgs) -> Result<()> {
    let origin = OriginId::new(args.origin);
    let mut scanner = ReferenceScanner::new();

    let spinner = (!args.json).then(|| create_spinner(&format!("Scanning {}", args.dir.display())));
    let result = scanner.scan_directory(&origin, &args.dir);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result.with_context(|| format!("Failed to scan {}", args.dir.display()))?;

    let stats = scanner.stats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} {} ({origin})", style("Scanned").green().bold(), style(args.dir.display()).cyan());
    let mut table = create_table(&["Resources", "Failed", "Literals", "Sites"]);
    add_table_row(
        &mut table,
        &[
            stats.resources.to_string(),
            stats.failures.to_string(),
            stats.keys.to_string(),
            stats.sites.to_string(),
        ],
    );
    table.printstd();
    Ok(())
}
