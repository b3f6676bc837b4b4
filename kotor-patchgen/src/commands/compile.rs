//! `compile`: manifest to `changes.ini`

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use tslpatch_compiler::{
    DiskFileSystem, FinalizeSummary, IncrementalWriter, ReferenceScanner, Variant, WriteStatus,
};

use crate::manifest::Manifest;
use crate::utils::{add_table_row, create_progress_bar, create_table, format_count};

#[derive(Args)]
pub struct CompileArgs {
    /// Path to the YAML manifest
    pub manifest: PathBuf,

    /// Template folder, overriding the manifest
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Writes between script flushes, overriding the manifest
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: CompileArgs, quiet: bool) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;

    let mut scanner = ReferenceScanner::new();
    for root in &manifest.scan {
        let dir = manifest.resolve(&root.path);
        let sites = scanner
            .scan_directory(&root.origin, &dir)
            .with_context(|| format!("Failed to scan {}", dir.display()))?;
        log::info!("Indexed {sites} reference site(s) in {}", dir.display());
    }
    let failures = scanner.stats().failures;
    if failures > 0 {
        log::warn!("{} could not be indexed", format_count(failures, "resource"));
    }

    let config = manifest.writer_config(args.output.as_deref(), args.batch_size);
    let mut writer = IncrementalWriter::with_scanner(DiskFileSystem, config, scanner);

    let entries = manifest.entries();
    let skipped_entries = manifest.file_count() - entries.len();
    let pb = create_progress_bar(entries.len() as u64, "Compiling", quiet || args.json);
    let mut skipped = 0;
    for entry in entries {
        let filename = entry.modification.filename().to_string();
        pb.set_message(filename.clone());
        let outcome = writer
            .write(manifest.request(entry))
            .with_context(|| format!("Failed to write {filename}"))?;
        if outcome.status == WriteStatus::Skipped {
            skipped += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    for install in &manifest.install {
        let path = manifest.resolve(&install.path);
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            anyhow::bail!("Invalid install file name: {}", path.display());
        };
        if !writer.add_install_file(&install.destination, name, &bytes)? {
            log::warn!("{name} is already listed for {}", install.destination);
        }
    }

    let summary = writer
        .finalize()
        .context("Failed to write the patch script")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !quiet {
        print_summary(&summary, skipped + skipped_entries);
    }
    Ok(())
}

fn print_summary(summary: &FinalizeSummary, skipped: usize) {
    println!(
        "{} {}",
        style("Wrote").green().bold(),
        style(summary.script.display()).cyan()
    );

    let mut table = create_table(&["List", "Files"]);
    for variant in Variant::ALL {
        let count = summary.files.get(&variant).copied().unwrap_or(0);
        add_table_row(&mut table, &[variant.list_section().to_string(), count.to_string()]);
    }
    add_table_row(&mut table, &["InstallList".to_string(), summary.install_files.to_string()]);
    table.printstd();

    println!(
        "{}, {} and {}",
        format_count(summary.appends, "appended string"),
        format_count(summary.string_tokens as usize, "StrRef token"),
        format_count(summary.row_tokens as usize, "2DAMEMORY token"),
    );
    println!(
        "Linked {}; {} stale, {} unverifiable, {} unresolved",
        format_count(summary.links.resolved + summary.rewrites.rewrites(), "reference"),
        summary.links.stale,
        summary.links.unverifiable,
        summary.unresolved
    );
    if skipped > 0 {
        println!("{}", style(format!("Skipped {}", format_count(skipped, "file"))).yellow());
    }
}
