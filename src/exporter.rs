use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::engine::RunResult;
use crate::error::Result;
use crate::models::{CellValue, TransactionRow};

/// Excel refuses sheet names longer than this.
pub const MAX_SHEET_NAME: usize = 31;

pub const SUMMARY_SHEET: &str = "SUMMARY";
pub const PIVOT_SHEET: &str = "CATEGORY PIVOT";
pub const QUANTITY_SHEET: &str = "QUANTITY SUMMARY";
pub const ORIGINAL_SHEET: &str = "ORIGINAL DATA";

pub const PERIOD_HEADER: &str = "MONTH-YEAR";
pub const CATEGORY_HEADER: &str = "CATEGORY";
pub const QUANTITY_HEADER: &str = "QUANTITY (KG)";

/// Make `raw` acceptable as an Excel sheet name and unique among `taken`
/// (case-insensitive). Forbidden characters become `_`; long names are cut.
pub fn sheet_name(raw: &str, taken: &mut Vec<String>) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "SHEET" } else { cleaned };

    let mut name: String = base.chars().take(MAX_SHEET_NAME).collect();
    let mut n = 2;
    while taken.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
        let suffix = format!("~{n}");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        name = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    taken.push(name.clone());
    name
}

/// Column headers of the enriched row layout, in export order.
pub fn enriched_headers(result: &RunResult) -> Vec<String> {
    let h = &result.headers;
    let mut headers = Vec::new();
    if let Some(v) = &h.voucher {
        headers.push(v.clone());
    }
    headers.push(h.date.clone());
    headers.push(h.description.clone());
    headers.push(h.debit.clone());
    headers.extend(h.extra.iter().cloned());
    headers.push(CATEGORY_HEADER.to_string());
    if result.quantity_category.is_some() {
        headers.push(QUANTITY_HEADER.to_string());
    }
    headers.push(PERIOD_HEADER.to_string());
    headers
}

struct Formats {
    header: Format,
    money: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            money: Format::new().set_num_format("#,##0"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
        }
    }
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    Ok(ExcelDateTime::from_ymd(
        date.year() as u16,
        date.month() as u8,
        date.day() as u8,
    )?)
}

fn write_header(ws: &mut Worksheet, headers: &[String], fmt: &Formats) -> Result<()> {
    for (col, h) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, h, &fmt.header)?;
    }
    Ok(())
}

fn write_rows<'a>(
    ws: &mut Worksheet,
    result: &RunResult,
    rows: impl Iterator<Item = &'a TransactionRow>,
    fmt: &Formats,
) -> Result<()> {
    write_header(ws, &enriched_headers(result), fmt)?;
    for (i, row) in rows.enumerate() {
        let r = i as u32 + 1;
        let mut col: u16 = 0;
        if result.headers.voucher.is_some() {
            if let Some(v) = &row.voucher {
                ws.write_string(r, col, v)?;
            }
            col += 1;
        }
        // Dates Excel cannot store fall back to the source text.
        match row.date.and_then(|d| excel_date(d).ok()) {
            Some(stamp) => {
                ws.write_datetime_with_format(r, col, &stamp, &fmt.date)?;
            }
            None if !row.raw_date.is_empty() => {
                ws.write_string(r, col, &row.raw_date)?;
            }
            None => {}
        }
        col += 1;
        ws.write_string(r, col, &row.description)?;
        col += 1;
        ws.write_number_with_format(r, col, row.debit, &fmt.money)?;
        col += 1;
        for value in &row.extra {
            match value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    ws.write_string(r, col, s)?;
                }
                CellValue::Number(n) => {
                    ws.write_number(r, col, *n)?;
                }
                CellValue::Bool(b) => {
                    ws.write_boolean(r, col, *b)?;
                }
            }
            col += 1;
        }
        ws.write_string(r, col, &row.category)?;
        col += 1;
        if result.quantity_category.is_some() {
            ws.write_number(r, col, row.quantity as f64)?;
            col += 1;
        }
        ws.write_string(r, col, row.period.to_string())?;
    }
    ws.autofit();
    Ok(())
}

fn write_summary(ws: &mut Worksheet, result: &RunResult, fmt: &Formats) -> Result<()> {
    write_header(ws, &[PERIOD_HEADER.to_string(), "DEBIT".to_string()], fmt)?;
    for (i, m) in result.aggregates.monthly_total.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write_string(r, 0, m.period.to_string())?;
        ws.write_number_with_format(r, 1, m.total, &fmt.money)?;
    }
    ws.autofit();
    Ok(())
}

fn write_pivot(ws: &mut Worksheet, result: &RunResult, fmt: &Formats) -> Result<()> {
    let pivot = &result.aggregates.category_pivot;
    let mut headers = vec![PERIOD_HEADER.to_string()];
    headers.extend(pivot.categories.iter().cloned());
    write_header(ws, &headers, fmt)?;
    for (i, row) in pivot.rows.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write_string(r, 0, row.period.to_string())?;
        for (c, value) in row.values.iter().enumerate() {
            ws.write_number_with_format(r, c as u16 + 1, *value, &fmt.money)?;
        }
    }
    ws.autofit();
    Ok(())
}

fn write_quantity(ws: &mut Worksheet, result: &RunResult, category: &str, fmt: &Formats) -> Result<()> {
    let Some(summary) = &result.aggregates.quantity_summary else {
        return Ok(());
    };
    let headers = [
        PERIOD_HEADER.to_string(),
        format!("{category} (KG)"),
        format!("{} (KG)", result.fallback),
        "TOTAL (KG)".to_string(),
    ];
    write_header(ws, &headers, fmt)?;
    for (i, m) in summary.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write_string(r, 0, m.period.to_string())?;
        ws.write_number(r, 1, m.category_qty as f64)?;
        ws.write_number(r, 2, m.fallback_qty as f64)?;
        ws.write_number(r, 3, m.total_qty as f64)?;
    }
    ws.autofit();
    Ok(())
}

/// Serialize every table of a run into one `.xlsx` workbook.
pub fn export(result: &RunResult) -> Result<Vec<u8>> {
    let fmt = Formats::new();
    let mut workbook = Workbook::new();
    let mut taken = Vec::new();

    let ws = workbook.add_worksheet();
    ws.set_name(sheet_name(SUMMARY_SHEET, &mut taken))?;
    write_summary(ws, result, &fmt)?;

    let ws = workbook.add_worksheet();
    ws.set_name(sheet_name(PIVOT_SHEET, &mut taken))?;
    write_pivot(ws, result, &fmt)?;

    if let Some(category) = &result.quantity_category {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet_name(QUANTITY_SHEET, &mut taken))?;
        write_quantity(ws, result, category, &fmt)?;
    }

    // Reserve the full-dataset name so a category cannot claim it first.
    let original = sheet_name(ORIGINAL_SHEET, &mut taken);
    for subset in &result.aggregates.subsets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet_name(&subset.name, &mut taken))?;
        write_rows(ws, result, subset.rows.iter().map(|&i| &result.rows[i]), &fmt)?;
    }

    let ws = workbook.add_worksheet();
    ws.set_name(original)?;
    write_rows(ws, result, result.rows.iter(), &fmt)?;

    log::info!("exported {} sheets", taken.len());
    Ok(workbook.save_to_buffer()?)
}
