//! `info`: decode one resource and summarize it

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

use kotor_gff::GffValue;
use tslpatch_compiler::{DecodedResource, OriginId, ReferenceScanner};

use crate::utils::{add_table_row, create_table, format_bytes};

#[derive(Args)]
pub struct InfoArgs {
    /// Resource file (2DA, GFF family, TLK or SSF)
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResourceInfo {
    file: String,
    kind: String,
    size: u64,
    properties: Vec<(String, String)>,
    reference_sites: usize,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to open file: {}", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let decoded = DecodedResource::decode(&name, &bytes)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    let mut scanner = ReferenceScanner::new();
    let reference_sites = scanner.scan_decoded(&OriginId::default(), &name, &decoded);

    let info = ResourceInfo {
        kind: format!("{:?}", decoded.kind()),
        size: bytes.len() as u64,
        properties: properties(&decoded),
        reference_sites,
        file: name,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} ({}, {})",
        style(&info.file).cyan().bold(),
        info.kind,
        format_bytes(info.size)
    );
    let mut table = create_table(&["Property", "Value"]);
    for (key, value) in &info.properties {
        add_table_row(&mut table, &[key.clone(), value.clone()]);
    }
    add_table_row(&mut table, &["Reference sites".to_string(), info.reference_sites.to_string()]);
    table.printstd();
    Ok(())
}

fn properties(decoded: &DecodedResource) -> Vec<(String, String)> {
    let prop = |k: &str, v: String| (k.to_string(), v);
    match decoded {
        DecodedResource::TwoDA(table) => vec![
            prop("Rows", table.row_count().to_string()),
            prop("Columns", table.column_count().to_string()),
            prop("Headers", table.headers().join(", ")),
        ],
        DecodedResource::Gff(gff) => {
            let mut leaves = 0;
            let mut loc_strings = 0;
            gff.root.walk(&mut |_, value| {
                leaves += 1;
                if matches!(value, GffValue::ExoLocString(_)) {
                    loc_strings += 1;
                }
            });
            vec![
                prop("Content type", gff.content_type()),
                prop("Top-level fields", gff.root.len().to_string()),
                prop("Leaf fields", leaves.to_string()),
                prop("Localized strings", loc_strings.to_string()),
            ]
        }
        DecodedResource::Tlk(table) => vec![
            prop("Language", table.language().to_string()),
            prop("Entries", table.len().to_string()),
        ],
        DecodedResource::Ssf(set) => {
            let assigned: Vec<String> = set
                .assigned()
                .map(|(slot, strref)| format!("{}={strref}", slot.script_name()))
                .collect();
            vec![
                prop("Assigned slots", assigned.len().to_string()),
                prop("Slots", assigned.join(", ")),
            ]
        }
    }
}
