//! Formulary CLI - formula-driven derived columns and flag rules.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `formulary=debug`.
const LOG_ENV: &str = "FORMULARY_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Columns { file, sheet, json } => {
            commands::columns::run(file, sheet, json, cli.verbose)
        }

        Commands::Process {
            file,
            sheet,
            crop,
            derive,
            flag,
            output,
        } => commands::process::run(
            commands::process::ProcessArgs {
                file,
                sheet,
                crop,
                derive,
                flag,
                output,
            },
            cli.verbose,
        ),

        Commands::Suggest {
            file,
            query,
            llm,
            model,
            json,
        } => commands::suggest::run(file, query, llm, model, json, cli.verbose),

        Commands::Shell { file, llm, model } => commands::shell::run(file, llm, model, cli.verbose),

        Commands::Serve {
            file,
            port,
            llm,
            model,
        } => commands::serve::run(file, port, llm, model, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
