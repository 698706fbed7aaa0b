use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{load_rules, RuleArgs};
use crate::error::Result;
use crate::rules::RuleSet;
use crate::settings::load_settings;

pub(crate) fn rules_table(rules: &RuleSet) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Keywords", "Preempts", "Threshold"]);
    for rule in &rules.categories {
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(rule.keywords.join(", ")),
            Cell::new(if rule.preempt { "yes" } else { "" }),
            Cell::new(rules.threshold_for(rule)),
        ]);
    }
    table.add_row(vec![
        Cell::new(rules.fallback.as_str().dimmed()),
        Cell::new("(no match or ambiguous)".dimmed()),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

pub fn list(args: &RuleArgs) -> Result<()> {
    let rules = load_rules(args, &load_settings())?;
    println!("Rules\n{}", rules_table(&rules));
    match &rules.quantity {
        Some(q) => println!(
            "Quantity: {} rows mentioning '{}' with units [{}]",
            q.category,
            q.trigger,
            q.units.join(", ")
        ),
        None => println!("Quantity: not tracked"),
    }
    Ok(())
}

pub fn export(output: Option<&Path>) -> Result<()> {
    let json = RuleSet::default().to_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            println!("Wrote built-in rules to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_table_lists_every_category() {
        let out = rules_table(&RuleSet::default()).to_string();
        for name in ["BERAS", "GALON", "MINI TRAINING", "JUMSIH", "SYUKURAN", "LAINNYA"] {
            assert!(out.contains(name), "missing {name}");
        }
        assert!(out.contains("isi ulang"));
    }

    #[test]
    fn test_export_writes_loadable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        export(Some(&path)).unwrap();
        assert_eq!(RuleSet::load(&path).unwrap(), RuleSet::default());
    }
}
