use serde::{Deserialize, Serialize};

use crate::categorizer::categorize;
use crate::error::Result;
use crate::models::{ColumnHeaders, InputTable, Period, TransactionRow};
use crate::quantity::QuantityExtractor;
use crate::reports::{aggregate, Aggregates};
use crate::rules::RuleSet;

/// What happens to rows whose date could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPolicy {
    /// Keep the row and group it under `Period::Unknown`.
    #[default]
    Keep,
    /// Remove the row before categorization and aggregation.
    Drop,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rules: RuleSet,
    pub track_quantity: bool,
    pub undated: UndatedPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            track_quantity: true,
            undated: UndatedPolicy::Keep,
        }
    }
}

/// Enriched rows plus every derived table for one input.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub headers: ColumnHeaders,
    pub rows: Vec<TransactionRow>,
    pub fallback: String,
    /// Set when quantity tracking was on for this run.
    pub quantity_category: Option<String>,
    pub aggregates: Aggregates,
    /// Rows kept with an unknown period.
    pub undated: usize,
    /// Rows removed under `UndatedPolicy::Drop`.
    pub dropped: usize,
}

/// Categorize, extract quantities, sort by date and aggregate.
pub fn run(table: InputTable, config: &EngineConfig) -> Result<RunResult> {
    let rules = &config.rules;
    rules.validate()?;

    let quantity_rule = rules.quantity.as_ref().filter(|_| config.track_quantity);
    let extractor = quantity_rule.map(QuantityExtractor::new).transpose()?;

    let total = table.rows.len();
    let mut dropped = 0usize;
    let mut rows = Vec::with_capacity(total);
    for parsed in table.rows {
        if parsed.date.is_none() && config.undated == UndatedPolicy::Drop {
            dropped += 1;
            continue;
        }
        let category = categorize(&parsed.description, rules);
        let quantity = extractor
            .as_ref()
            .map_or(0, |e| e.extract(&parsed.description));
        log::debug!("{:?} -> {category} (qty {quantity})", parsed.description);
        rows.push(TransactionRow {
            period: Period::from_date(parsed.date),
            voucher: parsed.voucher,
            date: parsed.date,
            raw_date: parsed.raw_date,
            description: parsed.description,
            debit: parsed.debit,
            extra: parsed.extra,
            category,
            quantity,
        });
    }

    // Stable: rows sharing a date keep their source order; undated rows last.
    rows.sort_by_key(|r| (r.date.is_none(), r.date));

    let undated = rows.iter().filter(|r| r.date.is_none()).count();
    if undated > 0 {
        log::warn!("{undated} row(s) have no parsable date and are grouped as {}", Period::Unknown);
    }
    if dropped > 0 {
        log::warn!("dropped {dropped} row(s) without a parsable date");
    }

    let quantity_category = quantity_rule.map(|q| q.category.clone());
    let aggregates = aggregate(&rows, &rules.fallback, quantity_category.as_deref());
    log::info!(
        "categorized {} of {total} rows into {} categories over {} periods",
        rows.len(),
        aggregates.category_pivot.categories.len(),
        aggregates.monthly_total.len()
    );

    Ok(RunResult {
        headers: table.headers,
        rows,
        fallback: rules.fallback.clone(),
        quantity_category,
        aggregates,
        undated,
        dropped,
    })
}
