use regex::Regex;

use crate::error::{RekapError, Result};
use crate::rules::QuantityRule;

/// Reads kilogram amounts out of descriptions that mention the trigger word.
#[derive(Debug, Clone)]
pub struct QuantityExtractor {
    trigger: String,
    pattern: Regex,
}

impl QuantityExtractor {
    pub fn new(rule: &QuantityRule) -> Result<Self> {
        let trigger = rule.trigger.trim().to_lowercase();
        let mut units: Vec<String> = rule
            .units
            .iter()
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        if trigger.is_empty() || units.is_empty() {
            return Err(RekapError::InvalidRule(
                "quantity rule needs a trigger and at least one unit".into(),
            ));
        }
        // Longest unit first so "kilogram" is not cut short at "kilo".
        units.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = units
            .iter()
            .map(|u| regex::escape(u))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"(?i)(\d+)\s*(?:{}\s*)?(?:{})\b",
            regex::escape(&trigger),
            alternation
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| RekapError::InvalidRule(format!("quantity pattern: {e}")))?;
        Ok(Self { trigger, pattern })
    }

    /// Sum of every quantity mention, or 0 when the trigger word is absent.
    pub fn extract(&self, description: &str) -> u64 {
        if !description.to_lowercase().contains(&self.trigger) {
            return 0;
        }
        self.pattern
            .captures_iter(description)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
            .fold(0u64, |acc, n| acc.saturating_add(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> QuantityExtractor {
        QuantityExtractor::new(&QuantityRule::default()).unwrap()
    }

    #[test]
    fn test_single_quantity() {
        assert_eq!(extractor().extract("BERAS 5KG PREMIUM"), 5);
        assert_eq!(extractor().extract("beras 25 kg"), 25);
    }

    #[test]
    fn test_sums_all_mentions() {
        assert_eq!(extractor().extract("beras 5kg dan 3kg"), 8);
        assert_eq!(extractor().extract("Beras 10 kilo, beras 2 kilogram"), 12);
    }

    #[test]
    fn test_keyword_between_number_and_unit() {
        assert_eq!(extractor().extract("5 beras kg"), 5);
        assert_eq!(extractor().extract("10beraskg"), 10);
    }

    #[test]
    fn test_requires_trigger_word() {
        assert_eq!(extractor().extract("gula 5kg"), 0);
        assert_eq!(extractor().extract(""), 0);
    }

    #[test]
    fn test_no_unit_no_quantity() {
        assert_eq!(extractor().extract("beras premium 5 karung"), 0);
        assert_eq!(extractor().extract("beras 5kgs"), 0);
    }

    #[test]
    fn test_overflowing_number_is_skipped() {
        let e = extractor();
        assert_eq!(e.extract("beras 99999999999999999999999kg dan 2kg"), 2);
    }

    #[test]
    fn test_custom_units() {
        let rule = QuantityRule {
            category: "GALON".into(),
            trigger: "galon".into(),
            units: vec!["liter".into(), "l".into()],
        };
        let e = QuantityExtractor::new(&rule).unwrap();
        assert_eq!(e.extract("AQUA GALON 19L"), 19);
        assert_eq!(e.extract("galon 19 liter + 5 l"), 24);
    }

    #[test]
    fn test_empty_units_rejected() {
        let rule = QuantityRule {
            units: vec![],
            ..QuantityRule::default()
        };
        assert!(QuantityExtractor::new(&rule).is_err());
    }
}
