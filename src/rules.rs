use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RekapError, Result};
use crate::matcher::DEFAULT_THRESHOLD;

pub const FALLBACK_CATEGORY: &str = "LAINNYA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// A preempting rule wins outright whenever it matches, skipping the
    /// ambiguity check against the other rules.
    #[serde(default)]
    pub preempt: bool,
    /// Per-rule similarity threshold; the rule set default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            preempt: false,
            threshold: None,
        }
    }

    fn preempting(mut self) -> Self {
        self.preempt = true;
        self
    }
}

/// Which category carries a weight in its descriptions, and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityRule {
    pub category: String,
    pub trigger: String,
    pub units: Vec<String>,
}

impl Default for QuantityRule {
    fn default() -> Self {
        Self {
            category: "BERAS".to_string(),
            trigger: "beras".to_string(),
            units: vec!["kilogram".to_string(), "kilo".to_string(), "kg".to_string()],
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_fallback() -> String {
    FALLBACK_CATEGORY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub quantity: Option<QuantityRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            threshold: DEFAULT_THRESHOLD,
            categories: vec![
                CategoryRule::new("BERAS", &["beras"]).preempting(),
                CategoryRule::new("GALON", &["aqua", "galon", "isi ulang"]),
                CategoryRule::new("MINI TRAINING", &["mini training", "training mini"]),
                CategoryRule::new("JUMSIH", &["jumsih", "jumat bersih", "jum'at", "bersih"]),
                CategoryRule::new("SYUKURAN", &["syukuran", "tasyakuran", "tumpeng"]),
            ],
            quantity: Some(QuantityRule::default()),
        }
    }
}

impl RuleSet {
    pub fn from_json(content: &str) -> Result<Self> {
        let rules: RuleSet = serde_json::from_str(content)
            .map_err(|e| RekapError::Config(format!("malformed rule set: {e}")))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RekapError::Config(format!("cannot read rules file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        check_threshold(self.threshold)?;
        for rule in &self.categories {
            if rule.name.trim().is_empty() {
                return Err(RekapError::InvalidRule("category name is empty".into()));
            }
            if let Some(t) = rule.threshold {
                check_threshold(t)?;
            }
        }
        if let Some(q) = &self.quantity {
            if q.trigger.trim().is_empty() {
                return Err(RekapError::InvalidRule("quantity trigger is empty".into()));
            }
            if q.units.iter().all(|u| u.trim().is_empty()) {
                return Err(RekapError::InvalidRule("quantity unit list is empty".into()));
            }
        }
        Ok(())
    }

    pub fn threshold_for(&self, rule: &CategoryRule) -> f64 {
        rule.threshold.unwrap_or(self.threshold)
    }

    #[allow(dead_code)]
    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.categories
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Replace the keywords of an existing category, or append a new custom
    /// category. Returns false when the override targets the fallback label,
    /// which never carries keywords.
    pub fn apply_override(&mut self, name: &str, keywords: Vec<String>) -> bool {
        if name.eq_ignore_ascii_case(&self.fallback) {
            log::warn!("ignoring keywords for fallback category {}", self.fallback);
            return false;
        }
        match self
            .categories
            .iter_mut()
            .find(|r| r.name.eq_ignore_ascii_case(name))
        {
            Some(rule) => rule.keywords = keywords,
            None => self.categories.push(CategoryRule {
                name: name.to_uppercase(),
                keywords,
                preempt: false,
                threshold: None,
            }),
        }
        true
    }

    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<()> {
        for raw in overrides {
            let (name, keywords) = parse_override(raw)?;
            self.apply_override(&name, keywords);
        }
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        check_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(RekapError::InvalidRule(format!(
            "threshold {threshold} is outside 0-100"
        )));
    }
    Ok(())
}

/// Parse `NAME=kw1,kw2` into a category name and its keyword list.
pub fn parse_override(raw: &str) -> Result<(String, Vec<String>)> {
    let (name, list) = raw
        .split_once('=')
        .ok_or_else(|| RekapError::InvalidRule(format!("expected NAME=kw1,kw2, got '{raw}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(RekapError::InvalidRule(format!("missing category name in '{raw}'")));
    }
    let keywords = list
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    Ok((name.to_string(), keywords))
}
