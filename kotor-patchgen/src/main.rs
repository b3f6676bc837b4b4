//! Main entry point for the kotor-patchgen CLI

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use kotor_patchgen::cli::{Cli, Commands};
use kotor_patchgen::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still takes precedence over -v/--quiet
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter())).init();

    match cli.command {
        Commands::Compile(args) => commands::compile::execute(args, cli.quiet),
        Commands::Scan(args) => commands::scan::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
