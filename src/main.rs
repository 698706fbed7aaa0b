mod categorizer;
mod cli;
mod engine;
mod error;
mod exporter;
mod fmt;
mod importer;
mod matcher;
mod models;
mod quantity;
mod reports;
mod rules;
mod settings;

use clap::Parser;

use cli::{Cli, Commands, RulesCommands};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => cli::run::run(args),
        Commands::Categorize {
            descriptions,
            rules,
        } => cli::categorize::run(&descriptions, &rules),
        Commands::Rules { command } => match command {
            RulesCommands::List { rules } => cli::rules::list(&rules),
            RulesCommands::Export { output } => cli::rules::export(output.as_deref()),
        },
        Commands::Init { force } => cli::init::run(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
