use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Month grouping key. `Unknown` collects rows whose date could not be parsed
/// and sorts after every real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Month { year: i32, month: u32 },
    Unknown,
}

impl Period {
    pub fn from_date(date: Option<NaiveDate>) -> Self {
        match date {
            Some(d) => Period::Month {
                year: d.year(),
                month: d.month(),
            },
            None => Period::Unknown,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => {
                match NaiveDate::from_ymd_opt(*year, *month, 1) {
                    Some(d) => write!(f, "{}", d.format("%B, %Y")),
                    None => write!(f, "{year:04}-{month:02}"),
                }
            }
            Period::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A source cell carried through untouched for columns the engine does not read.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Header text of the columns the importer mapped, as it appeared in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeaders {
    pub voucher: Option<String>,
    pub date: String,
    pub description: String,
    pub debit: String,
    pub extra: Vec<String>,
}

impl Default for ColumnHeaders {
    fn default() -> Self {
        Self {
            voucher: Some("VOUCHER".to_string()),
            date: "TRANS. DATE".to_string(),
            description: "DESCRIPTION".to_string(),
            debit: "DEBIT".to_string(),
            extra: Vec::new(),
        }
    }
}

/// Intermediate representation from a CSV/XLSX parser before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub voucher: Option<String>,
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub description: String,
    pub debit: f64,
    pub extra: Vec<CellValue>,
}

impl ParsedRow {
    #[allow(dead_code)]
    pub fn new(date: Option<NaiveDate>, description: &str, debit: f64) -> Self {
        Self {
            voucher: None,
            raw_date: date.map(|d| d.to_string()).unwrap_or_default(),
            date,
            description: description.to_string(),
            debit,
            extra: Vec::new(),
        }
    }
}

/// Everything the importer read from one sheet.
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    pub headers: ColumnHeaders,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub voucher: Option<String>,
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub description: String,
    pub debit: f64,
    pub extra: Vec<CellValue>,
    pub category: String,
    pub quantity: u64,
    pub period: Period,
}
