pub mod categorize;
pub mod init;
pub mod report;
pub mod rules;
pub mod run;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::error::Result;
use crate::rules::RuleSet;
use crate::settings::{shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "rekap",
    version,
    about = "Categorize a transaction spreadsheet and export monthly summaries."
)]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize a spreadsheet, print the summaries and write the workbook.
    Run(RunArgs),
    /// Categorize descriptions given on the command line.
    Categorize {
        /// Transaction descriptions
        #[arg(required = true)]
        descriptions: Vec<String>,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Inspect or export categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Write a default settings file to ~/.config/rekap/settings.json.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Show the effective rule set.
    List {
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Write the built-in rule set as JSON.
    Export {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to an XLSX/XLS/ODS/CSV file
    pub file: PathBuf,
    /// Worksheet to read (default: the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,
    /// Output workbook (default: <input>-categorized.xlsx)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub rules: RuleArgs,
    /// Skip quantity extraction and the quantity sheets
    #[arg(long)]
    pub no_quantity: bool,
    /// Remove rows without a parsable date instead of grouping them as UNKNOWN
    #[arg(long)]
    pub drop_undated: bool,
    /// Print the summaries only; do not write a workbook
    #[arg(long)]
    pub no_export: bool,
}

#[derive(Args, Default)]
pub struct RuleArgs {
    /// JSON rule set replacing the built-in categories
    #[arg(long = "rules", value_name = "PATH")]
    pub rules_file: Option<PathBuf>,
    /// Replace or add a category's keywords (repeatable)
    #[arg(long = "rule", value_name = "NAME=KW1,KW2")]
    pub overrides: Vec<String>,
    /// Similarity threshold, 0-100
    #[arg(long)]
    pub threshold: Option<f64>,
}

/// Build the effective rule set: built-in defaults or a rules file, then the
/// settings threshold, keyword overrides and finally the threshold flag.
pub(crate) fn load_rules(args: &RuleArgs, settings: &Settings) -> Result<RuleSet> {
    let file = args
        .rules_file
        .clone()
        .or_else(|| settings.rules_file.as_deref().map(shellexpand_path));
    let mut rules = match file {
        Some(path) => {
            log::info!("loading rules from {}", path.display());
            RuleSet::load(&path)?
        }
        None => RuleSet::default(),
    };
    if let Some(t) = settings.threshold {
        rules.set_threshold(t)?;
    }
    rules.apply_overrides(&args.overrides)?;
    if let Some(t) = args.threshold {
        rules.set_threshold(t)?;
    }
    rules.validate()?;
    Ok(rules)
}
