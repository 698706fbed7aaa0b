use crate::matcher::matches;
use crate::rules::RuleSet;

/// Assign exactly one category label to a description.
///
/// Preempting rules are tried first, in rule-set order, and the first match
/// wins. Every other rule then votes; a single vote decides the label, while
/// no votes or several votes send the row to the fallback category.
pub fn categorize(description: &str, rules: &RuleSet) -> String {
    let text = description.to_lowercase();

    let preempted = rules
        .categories
        .iter()
        .filter(|r| r.preempt)
        .find(|r| matches(&text, &r.keywords, rules.threshold_for(r)));
    if let Some(rule) = preempted {
        return rule.name.clone();
    }

    let matched: Vec<&str> = rules
        .categories
        .iter()
        .filter(|r| !r.preempt && !r.name.eq_ignore_ascii_case(&rules.fallback))
        .filter(|r| matches(&text, &r.keywords, rules.threshold_for(r)))
        .map(|r| r.name.as_str())
        .collect();

    match matched.as_slice() {
        [only] => only.to_string(),
        [] => rules.fallback.clone(),
        many => {
            log::debug!("ambiguous description {description:?} matched {many:?}");
            rules.fallback.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CategoryRule;

    #[test]
    fn test_single_match() {
        let rules = RuleSet::default();
        assert_eq!(categorize("AQUA GALON 19L", &rules), "GALON");
        assert_eq!(categorize("Nasi tumpeng syukuran", &rules), "SYUKURAN");
    }

    #[test]
    fn test_preempting_category_wins_over_others() {
        let rules = RuleSet::default();
        assert_eq!(categorize("BERAS 5KG PREMIUM", &rules), "BERAS");
        assert_eq!(categorize("beras dan aqua galon untuk jumat bersih", &rules), "BERAS");
    }

    #[test]
    fn test_ambiguous_goes_to_fallback() {
        let rules = RuleSet::default();
        assert_eq!(categorize("Training mini dan jumat bersih", &rules), "LAINNYA");
        assert_eq!(categorize("aqua untuk syukuran", &rules), "LAINNYA");
    }

    #[test]
    fn test_mini_training_needs_both_words() {
        let rules = RuleSet::default();
        assert_eq!(categorize("Biaya training K3 karyawan", &rules), "LAINNYA");
        assert_eq!(categorize("Snack mini training", &rules), "MINI TRAINING");
        assert_eq!(categorize("konsumsi training mini", &rules), "MINI TRAINING");
    }

    #[test]
    fn test_single_character_description() {
        assert_eq!(categorize("a", &RuleSet::default()), "LAINNYA");
    }

    #[test]
    fn test_no_match_goes_to_fallback() {
        let rules = RuleSet::default();
        assert_eq!(categorize("KOPI GULA TEH", &rules), "LAINNYA");
        assert_eq!(categorize("", &rules), "LAINNYA");
    }

    #[test]
    fn test_case_insensitive() {
        let rules = RuleSet::default();
        assert_eq!(categorize("Isi Ulang", &rules), "GALON");
        assert_eq!(categorize("JUMSIH bulanan", &rules), "JUMSIH");
    }

    #[test]
    fn test_custom_keywords_honored() {
        let mut rules = RuleSet::default();
        rules.apply_override("GALON", vec!["le minerale".into()]);
        rules.apply_override("ATK", vec!["kertas".into(), "pulpen".into()]);
        assert_eq!(categorize("LE MINERALE 19L", &rules), "GALON");
        assert_eq!(categorize("aqua 19l", &rules), "LAINNYA");
        assert_eq!(categorize("kertas A4", &rules), "ATK");
    }

    #[test]
    fn test_empty_keyword_set_never_matches() {
        let mut rules = RuleSet::default();
        rules.apply_override("GALON", Vec::new());
        assert_eq!(categorize("aqua galon", &rules), "LAINNYA");
    }

    #[test]
    fn test_fallback_rule_in_set_is_skipped() {
        let mut rules = RuleSet::default();
        rules.categories.push(CategoryRule::new("LAINNYA", &["kopi"]));
        // Would be a second vote if the fallback rule were evaluated.
        assert_eq!(categorize("kopi aqua", &rules), "GALON");
    }

    #[test]
    fn test_per_rule_threshold() {
        let mut rules = RuleSet {
            categories: vec![CategoryRule::new("SYUKURAN", &["syukuran"])],
            quantity: None,
            ..RuleSet::default()
        };
        assert_eq!(categorize("sykuran", &rules), "SYUKURAN");
        rules.categories[0].threshold = Some(100.0);
        assert_eq!(categorize("sykuran", &rules), "LAINNYA");
    }

    #[test]
    fn test_preemption_order_follows_rule_set() {
        let mut first = CategoryRule::new("A", &["x"]);
        first.preempt = true;
        let mut second = CategoryRule::new("B", &["x"]);
        second.preempt = true;
        let rules = RuleSet {
            categories: vec![first, second],
            quantity: None,
            ..RuleSet::default()
        };
        assert_eq!(categorize("x", &rules), "A");
    }
}
