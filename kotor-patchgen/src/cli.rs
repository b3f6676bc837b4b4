//! Root CLI structure for kotor-patchgen

use clap::{Parser, Subcommand};

use crate::commands::compile::CompileArgs;
use crate::commands::info::InfoArgs;
use crate::commands::scan::ScanArgs;

#[derive(Parser)]
#[command(name = "kotor-patchgen")]
#[command(about = "Compile KotOR resource edits into TSLPatcher patch scripts", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a manifest of file edits into changes.ini and its templates
    Compile(CompileArgs),

    /// Index the strref and row references of a folder of resources
    Scan(ScanArgs),

    /// Decode a single resource and print a summary
    Info(InfoArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// Default log filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, true) => "error",
            (0, false) => "warn",
            (1, _) => "info",
            (2, _) => "debug",
            _ => "trace",
        }
    }
}
