use comfy_table::{Cell, Table};

use crate::categorizer::categorize;
use crate::cli::{load_rules, RuleArgs};
use crate::error::Result;
use crate::quantity::QuantityExtractor;
use crate::rules::RuleSet;
use crate::settings::load_settings;

/// Label and quantity for each description, in input order.
pub(crate) fn classify(
    descriptions: &[String],
    rules: &RuleSet,
    track_quantity: bool,
) -> Result<Vec<(String, u64)>> {
    let extractor = rules
        .quantity
        .as_ref()
        .filter(|_| track_quantity)
        .map(QuantityExtractor::new)
        .transpose()?;
    Ok(descriptions
        .iter()
        .map(|d| {
            let qty = extractor.as_ref().map_or(0, |e| e.extract(d));
            (categorize(d, rules), qty)
        })
        .collect())
}

pub fn run(descriptions: &[String], args: &RuleArgs) -> Result<()> {
    let settings = load_settings();
    let rules = load_rules(args, &settings)?;
    let results = classify(descriptions, &rules, settings.track_quantity)?;

    let mut table = Table::new();
    table.set_header(vec!["Description", "Category", "Quantity"]);
    for (desc, (category, qty)) in descriptions.iter().zip(results) {
        table.add_row(vec![Cell::new(desc), Cell::new(category), Cell::new(qty)]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify() {
        let out = classify(
            &descs(&["AQUA GALON 19L", "BERAS 5KG PREMIUM", "KOPI GULA TEH"]),
            &RuleSet::default(),
            true,
        )
        .unwrap();
        assert_eq!(
            out,
            vec![
                ("GALON".to_string(), 0),
                ("BERAS".to_string(), 5),
                ("LAINNYA".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_classify_without_quantity() {
        let out = classify(&descs(&["beras 10 kg"]), &RuleSet::default(), false).unwrap();
        assert_eq!(out, vec![("BERAS".to_string(), 0)]);
    }
}
