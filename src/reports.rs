use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Period, TransactionRow};

// ---------------------------------------------------------------------------
// Monthly total
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub period: Period,
    pub total: f64,
}

pub fn monthly_total(rows: &[TransactionRow]) -> Vec<MonthTotal> {
    let mut totals: BTreeMap<Period, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.period).or_default() += row.debit;
    }
    totals
        .into_iter()
        .map(|(period, total)| MonthTotal { period, total })
        .collect()
}

// ---------------------------------------------------------------------------
// Category pivot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub period: Period,
    /// One value per entry of `CategoryPivot::categories`, same order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryPivot {
    pub categories: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl CategoryPivot {
    #[allow(dead_code)]
    pub fn value(&self, period: Period, category: &str) -> Option<f64> {
        let col = self.categories.iter().position(|c| c == category)?;
        let row = self.rows.iter().find(|r| r.period == period)?;
        row.values.get(col).copied()
    }
}

/// Debit totals per (period, category), with a zero for every category that
/// has no rows in a period.
pub fn category_pivot(rows: &[TransactionRow]) -> CategoryPivot {
    let categories: Vec<String> = rows
        .iter()
        .map(|r| r.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut grid: BTreeMap<Period, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let values = grid
            .entry(row.period)
            .or_insert_with(|| vec![0.0; categories.len()]);
        if let Ok(col) = categories.binary_search(&row.category) {
            values[col] += row.debit;
        }
    }

    CategoryPivot {
        categories,
        rows: grid
            .into_iter()
            .map(|(period, values)| PivotRow { period, values })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Quantity summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QuantityMonth {
    pub period: Period,
    /// Quantity on rows labeled with the quantity-bearing category.
    pub category_qty: u64,
    /// Quantity found on fallback rows, i.e. likely categorizer misses.
    pub fallback_qty: u64,
    pub total_qty: u64,
}

pub fn quantity_summary(
    rows: &[TransactionRow],
    category: &str,
    fallback: &str,
) -> Vec<QuantityMonth> {
    let mut months: BTreeMap<Period, QuantityMonth> = BTreeMap::new();
    for row in rows {
        let month = months.entry(row.period).or_insert_with(|| QuantityMonth {
            period: row.period,
            category_qty: 0,
            fallback_qty: 0,
            total_qty: 0,
        });
        if row.category == category {
            month.category_qty = month.category_qty.saturating_add(row.quantity);
        } else if row.category == fallback && row.quantity > 0 {
            month.fallback_qty = month.fallback_qty.saturating_add(row.quantity);
        }
        month.total_qty = month.total_qty.saturating_add(row.quantity);
    }
    months.into_values().collect()
}

// ---------------------------------------------------------------------------
// Per-category subsets
// ---------------------------------------------------------------------------

/// A named selection of rows, stored as indices into the enriched row set.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSubset {
    pub name: String,
    pub rows: Vec<usize>,
}

pub fn diagnostic_subset_name(fallback: &str, category: &str) -> String {
    format!("{fallback} ({category})")
}

/// One subset per label in order of first appearance. With a quantity
/// category, a final subset lists fallback rows that still carry a quantity.
pub fn category_subsets(
    rows: &[TransactionRow],
    fallback: &str,
    quantity_category: Option<&str>,
) -> Vec<RowSubset> {
    let mut subsets: Vec<RowSubset> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match subsets.iter_mut().find(|s| s.name == row.category) {
            Some(subset) => subset.rows.push(idx),
            None => subsets.push(RowSubset {
                name: row.category.clone(),
                rows: vec![idx],
            }),
        }
    }

    if let Some(category) = quantity_category {
        subsets.push(RowSubset {
            name: diagnostic_subset_name(fallback, category),
            rows: rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.category == fallback && r.quantity > 0)
                .map(|(idx, _)| idx)
                .collect(),
        });
    }
    subsets
}

// ---------------------------------------------------------------------------
// All derived tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub monthly_total: Vec<MonthTotal>,
    pub category_pivot: CategoryPivot,
    pub quantity_summary: Option<Vec<QuantityMonth>>,
    pub subsets: Vec<RowSubset>,
}

/// Recompute every derived table from enriched, date-sorted rows.
pub fn aggregate(
    rows: &[TransactionRow],
    fallback: &str,
    quantity_category: Option<&str>,
) -> Aggregates {
    Aggregates {
        monthly_total: monthly_total(rows),
        category_pivot: category_pivot(rows),
        quantity_summary: quantity_category.map(|c| quantity_summary(rows, c, fallback)),
        subsets: category_subsets(rows, fallback, quantity_category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(date: Option<(i32, u32, u32)>, category: &str, debit: f64, quantity: u64) -> TransactionRow {
        let date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        TransactionRow {
            voucher: None,
            date,
            raw_date: String::new(),
            description: String::new(),
            debit,
            extra: Vec::new(),
            category: category.to_string(),
            quantity,
            period: Period::from_date(date),
        }
    }

    fn jan() -> Period {
        Period::Month { year: 2024, month: 1 }
    }

    fn feb() -> Period {
        Period::Month { year: 2024, month: 2 }
    }

    fn sample() -> Vec<TransactionRow> {
        vec![
            row(Some((2024, 1, 15)), "GALON", 50000.0, 0),
            row(Some((2024, 1, 20)), "BERAS", 120000.0, 5),
            row(Some((2024, 2, 1)), "LAINNYA", 15000.0, 0),
            row(Some((2024, 2, 3)), "LAINNYA", 80000.0, 3),
            row(Some((2024, 2, 9)), "BERAS", 60000.0, 2),
        ]
    }

    #[test]
    fn test_monthly_total() {
        let totals = monthly_total(&sample());
        assert_eq!(
            totals,
            vec![
                MonthTotal { period: jan(), total: 170000.0 },
                MonthTotal { period: feb(), total: 155000.0 },
            ]
        );
    }

    #[test]
    fn test_monthly_total_orders_chronologically_with_unknown_last() {
        let rows = vec![
            row(None, "GALON", 1.0, 0),
            row(Some((2024, 3, 1)), "GALON", 2.0, 0),
            row(Some((2023, 12, 31)), "GALON", 4.0, 0),
        ];
        let periods: Vec<Period> = monthly_total(&rows).iter().map(|m| m.period).collect();
        assert_eq!(
            periods,
            vec![
                Period::Month { year: 2023, month: 12 },
                Period::Month { year: 2024, month: 3 },
                Period::Unknown,
            ]
        );
    }

    #[test]
    fn test_category_pivot_fills_zeros() {
        let pivot = category_pivot(&sample());
        assert_eq!(pivot.categories, vec!["BERAS", "GALON", "LAINNYA"]);
        assert_eq!(pivot.rows.len(), 2);
        for r in &pivot.rows {
            assert_eq!(r.values.len(), pivot.categories.len());
        }
        assert_eq!(pivot.value(jan(), "GALON"), Some(50000.0));
        assert_eq!(pivot.value(jan(), "LAINNYA"), Some(0.0));
        assert_eq!(pivot.value(feb(), "GALON"), Some(0.0));
        assert_eq!(pivot.value(feb(), "LAINNYA"), Some(95000.0));
        assert_eq!(pivot.value(feb(), "SYUKURAN"), None);
    }

    #[test]
    fn test_category_pivot_empty() {
        let pivot = category_pivot(&[]);
        assert!(pivot.categories.is_empty());
        assert!(pivot.rows.is_empty());
    }

    #[test]
    fn test_quantity_summary() {
        let summary = quantity_summary(&sample(), "BERAS", "LAINNYA");
        assert_eq!(summary.len(), 2);
        assert_eq!(
            summary[0],
            QuantityMonth { period: jan(), category_qty: 5, fallback_qty: 0, total_qty: 5 }
        );
        assert_eq!(
            summary[1],
            QuantityMonth { period: feb(), category_qty: 2, fallback_qty: 3, total_qty: 5 }
        );
    }

    #[test]
    fn test_quantity_total_includes_other_categories() {
        let rows = vec![row(Some((2024, 1, 2)), "GALON", 1.0, 4)];
        let summary = quantity_summary(&rows, "BERAS", "LAINNYA");
        assert_eq!(summary[0].category_qty, 0);
        assert_eq!(summary[0].fallback_qty, 0);
        assert_eq!(summary[0].total_qty, 4);
    }

    #[test]
    fn test_category_subsets_in_first_appearance_order() {
        let subsets = category_subsets(&sample(), "LAINNYA", Some("BERAS"));
        let names: Vec<&str> = subsets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["GALON", "BERAS", "LAINNYA", "LAINNYA (BERAS)"]);
        assert_eq!(subsets[1].rows, vec![1, 4]);
        assert_eq!(subsets[2].rows, vec![2, 3]);
        assert_eq!(subsets[3].rows, vec![3]);
    }

    #[test]
    fn test_category_subsets_without_quantity_tracking() {
        let subsets = category_subsets(&sample(), "LAINNYA", None);
        assert_eq!(subsets.len(), 3);
    }

    #[test]
    fn test_aggregate() {
        let agg = aggregate(&sample(), "LAINNYA", None);
        assert_eq!(agg.monthly_total.len(), 2);
        assert!(agg.quantity_summary.is_none());
        let agg = aggregate(&sample(), "LAINNYA", Some("BERAS"));
        assert_eq!(agg.quantity_summary.unwrap().len(), 2);
    }
}
