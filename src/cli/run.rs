use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::report::{format_pivot, format_quantity, format_summary};
use crate::cli::{load_rules, RunArgs};
use crate::engine::{self, EngineConfig, UndatedPolicy};
use crate::error::Result;
use crate::exporter;
use crate::importer;
use crate::settings::load_settings;

/// `report.xlsx` -> `report-categorized.xlsx`, next to the input.
pub(crate) fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "rekap".to_string());
    input.with_file_name(format!("{stem}-categorized.xlsx"))
}

pub fn run(args: RunArgs) -> Result<()> {
    let settings = load_settings();
    let config = EngineConfig {
        rules: load_rules(&args.rules, &settings)?,
        track_quantity: settings.track_quantity && !args.no_quantity,
        undated: if args.drop_undated {
            UndatedPolicy::Drop
        } else {
            settings.undated
        },
    };

    let table = importer::read_file(&args.file, args.sheet.as_deref())?;
    println!("Read {} rows from {}", table.rows.len(), args.file.display());

    let result = engine::run(table, &config)?;
    if result.undated > 0 {
        println!(
            "{}",
            format!("{} row(s) without a valid date grouped as UNKNOWN", result.undated).yellow()
        );
    }
    if result.dropped > 0 {
        println!(
            "{}",
            format!("{} row(s) without a valid date dropped", result.dropped).yellow()
        );
    }

    let agg = &result.aggregates;
    println!("\n{}\n{}", "SUMMARY".bold(), format_summary(&agg.monthly_total));
    println!("\n{}\n{}", "CATEGORY PIVOT".bold(), format_pivot(&agg.category_pivot));
    if let (Some(category), Some(summary)) = (&result.quantity_category, &agg.quantity_summary) {
        println!(
            "\n{}\n{}",
            "QUANTITY SUMMARY".bold(),
            format_quantity(summary, category, &result.fallback)
        );
    }

    if args.no_export {
        return Ok(());
    }
    let output = args.output.unwrap_or_else(|| default_output(&args.file));
    let bytes = exporter::export(&result)?;
    std::fs::write(&output, bytes)?;
    println!("\n{} {}", "Wrote".green(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/data/laporan jan.xlsx")),
            PathBuf::from("/data/laporan jan-categorized.xlsx")
        );
        assert_eq!(
            default_output(Path::new("kas.csv")),
            PathBuf::from("kas-categorized.xlsx")
        );
    }
}
