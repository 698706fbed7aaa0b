use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::fmt::rupiah;
use crate::reports::{CategoryPivot, MonthTotal, QuantityMonth};

fn amount(val: f64) -> Cell {
    Cell::new(rupiah(val)).set_alignment(CellAlignment::Right)
}

fn count(val: u64) -> Cell {
    Cell::new(val).set_alignment(CellAlignment::Right)
}

pub fn format_summary(totals: &[MonthTotal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Debit"]);
    for m in totals {
        table.add_row(vec![Cell::new(m.period), amount(m.total)]);
    }
    let grand: f64 = totals.iter().map(|m| m.total).sum();
    table.add_row(vec![Cell::new("TOTAL".bold()), amount(grand)]);
    table
}

pub fn format_pivot(pivot: &CategoryPivot) -> Table {
    let mut table = Table::new();
    let mut header = vec![Cell::new("Month")];
    header.extend(pivot.categories.iter().map(Cell::new));
    table.set_header(header);
    for row in &pivot.rows {
        let mut cells = vec![Cell::new(row.period)];
        cells.extend(row.values.iter().map(|v| amount(*v)));
        table.add_row(cells);
    }
    let mut totals = vec![Cell::new("TOTAL".bold())];
    for col in 0..pivot.categories.len() {
        totals.push(amount(pivot.rows.iter().map(|r| r.values[col]).sum()));
    }
    table.add_row(totals);
    table
}

pub fn format_quantity(summary: &[QuantityMonth], category: &str, fallback: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Month".to_string(),
        format!("{category} (kg)"),
        format!("{fallback} (kg)"),
        "Total (kg)".to_string(),
    ]);
    for m in summary {
        let missed = if m.fallback_qty > 0 {
            Cell::new(m.fallback_qty.to_string().yellow()).set_alignment(CellAlignment::Right)
        } else {
            count(0)
        };
        table.add_row(vec![
            Cell::new(m.period),
            count(m.category_qty),
            missed,
            count(m.total_qty),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use crate::reports::PivotRow;

    fn jan() -> Period {
        Period::Month { year: 2024, month: 1 }
    }

    #[test]
    fn test_format_summary() {
        let totals = vec![
            MonthTotal { period: jan(), total: 170000.0 },
            MonthTotal { period: Period::Unknown, total: 6000.0 },
        ];
        let out = format_summary(&totals).to_string();
        assert!(out.contains("January, 2024"));
        assert!(out.contains("Rp170.000"));
        assert!(out.contains("UNKNOWN"));
        assert!(out.contains("Rp176.000"));
    }

    #[test]
    fn test_format_pivot_totals_per_category() {
        let pivot = CategoryPivot {
            categories: vec!["BERAS".into(), "GALON".into()],
            rows: vec![
                PivotRow { period: jan(), values: vec![120000.0, 50000.0] },
                PivotRow { period: Period::Month { year: 2024, month: 2 }, values: vec![60000.0, 0.0] },
            ],
        };
        let out = format_pivot(&pivot).to_string();
        assert!(out.contains("BERAS"));
        assert!(out.contains("February, 2024"));
        assert!(out.contains("Rp180.000"));
        assert!(out.contains("Rp0"));
    }

    #[test]
    fn test_format_quantity() {
        let summary = vec![QuantityMonth {
            period: jan(),
            category_qty: 5,
            fallback_qty: 3,
            total_qty: 8,
        }];
        let out = format_quantity(&summary, "BERAS", "LAINNYA").to_string();
        assert!(out.contains("BERAS (kg)"));
        assert!(out.contains("LAINNYA (kg)"));
        assert!(out.contains('8'));
    }
}
