use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{RekapError, Result};
use crate::models::{CellValue, ColumnHeaders, InputTable, ParsedRow};

/// How many leading rows are searched for the header row.
const HEADER_SCAN_ROWS: usize = 20;

const DATE_HEADERS: &[&str] = &["TRANSDATE", "TRANSACTIONDATE", "DATE", "TANGGAL", "TGL"];
const DESCRIPTION_HEADERS: &[&str] = &["DESCRIPTION", "KETERANGAN", "URAIAN", "DESC"];
const DEBIT_HEADERS: &[&str] = &["DEBIT", "DEBET", "AMOUNT", "JUMLAH"];
const VOUCHER_HEADERS: &[&str] = &["VOUCHER", "NOVOUCHER", "VOUCHERNO", "REF", "REFERENCE"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d %B %Y", "%d %b %Y",
];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a currency string. Handles `Rp`/`IDR`/`$` prefixes, parenthesized
/// negatives and both `1.250.000,50` and `1,250,000.50` grouping styles.
/// Anything unparsable is 0.
pub fn parse_amount(raw: &str) -> f64 {
    let mut s: String = raw
        .replace("Rp", "")
        .replace("RP", "")
        .replace("IDR", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"' && *c != '$')
        .collect();

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.to_string();
    }

    let normalized = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if is_grouped(&s, '.') => s.replace('.', ""),
        (None, Some(_)) if is_grouped(&s, ',') => s.replace(',', ""),
        (None, Some(_)) => s.replace(',', "."),
        _ => s,
    };

    let value = normalized.parse::<f64>().unwrap_or(0.0);
    if negative {
        -value
    } else {
        value
    }
}

/// True for strings like `120.000` or `-1,250,000`: groups of exactly three
/// digits after the first separator.
fn is_grouped(s: &str, sep: char) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.split(sep);
    let head = parts.next().unwrap_or("");
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut groups = 0;
    for part in parts {
        if part.len() != 3 || !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        groups += 1;
    }
    groups > 0
}

/// Years a spreadsheet date cell can hold.
const EXCEL_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

fn in_excel_range(date: NaiveDate) -> Option<NaiveDate> {
    EXCEL_YEARS.contains(&date.year()).then_some(date)
}

/// Parse a textual date. Slash and dash dates are read day-first. Dates
/// outside the spreadsheet year range (e.g. `15/01/24` read as year 24)
/// count as unparsable.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return in_excel_range(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return in_excel_range(dt.date());
        }
    }
    // ISO timestamps with fractional seconds or offsets
    raw.get(..10)
        .filter(|_| raw.len() > 10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .and_then(in_excel_range)
}

/// Convert an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
        .and_then(in_excel_range)
}

fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
                Some(d) => Cell::Date(d),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_date_text(s) {
                Some(d) => Cell::Date(d),
                None => Cell::from_text(s),
            },
            other => Cell::from_text(&other.to_string()),
        }
    }

    fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(n) => excel_serial_to_date(*n),
            Cell::Text(s) => parse_date_text(s),
            _ => None,
        }
    }

    fn amount(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => {
                let v = parse_amount(s);
                (v != 0.0 || s.chars().any(|c| c.is_ascii_digit())).then_some(v)
            }
            Cell::Empty => Some(0.0),
            _ => None,
        }
    }

    fn into_value(self) -> CellValue {
        match self {
            Cell::Empty => CellValue::Empty,
            Cell::Text(s) => CellValue::Text(s),
            Cell::Number(n) => CellValue::Number(n),
            Cell::Bool(b) => CellValue::Bool(b),
            Cell::Date(d) => CellValue::Text(d.format("%Y-%m-%d").to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Input formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Spreadsheet,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            "csv" => Ok(Self::Csv),
            _ => Err(RekapError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read the transaction table from a spreadsheet or CSV file.
pub fn read_file(path: &Path, sheet: Option<&str>) -> Result<InputTable> {
    match InputFormat::from_path(path)? {
        InputFormat::Spreadsheet => {
            let workbook = calamine::open_workbook_auto(path)?;
            read_workbook(workbook, sheet)
        }
        InputFormat::Csv => {
            let file = std::fs::File::open(path)?;
            read_csv(std::io::BufReader::new(file))
        }
    }
}

/// Read the transaction table from an in-memory workbook (e.g. an upload).
#[allow(dead_code)]
pub fn read_spreadsheet_bytes(bytes: Vec<u8>, sheet: Option<&str>) -> Result<InputTable> {
    let workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    read_workbook(workbook, sheet)
}

fn read_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>, sheet: Option<&str>) -> Result<InputTable> {
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| RekapError::UnknownSheet(wanted.to_string()))?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| RekapError::EmptySheet("(workbook has no sheets)".to_string()))?,
    };
    let range = workbook.worksheet_range(&name)?;
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(Cell::from_data).collect())
        .collect();
    parse_grid(grid, &name)
}

pub fn read_csv<R: Read>(reader: R) -> Result<InputTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(
            record
                .iter()
                .map(|f| Cell::from_text(f.trim_start_matches('\u{feff}')))
                .collect(),
        );
    }
    parse_grid(grid, "csv")
}

// ---------------------------------------------------------------------------
// Header detection and row parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ColumnMap {
    voucher: Option<usize>,
    date: Option<usize>,
    description: Option<usize>,
    debit: Option<usize>,
}

impl ColumnMap {
    fn detect(row: &[Cell]) -> Self {
        let mut map = ColumnMap::default();
        for (i, cell) in row.iter().enumerate() {
            let key = normalize_header(&cell.text());
            let slot = if DATE_HEADERS.contains(&key.as_str()) {
                &mut map.date
            } else if DESCRIPTION_HEADERS.contains(&key.as_str()) {
                &mut map.description
            } else if DEBIT_HEADERS.contains(&key.as_str()) {
                &mut map.debit
            } else if VOUCHER_HEADERS.contains(&key.as_str()) {
                &mut map.voucher
            } else {
                continue;
            };
            // First matching column wins.
            slot.get_or_insert(i);
        }
        map
    }

    fn found(&self) -> usize {
        [self.date, self.description, self.debit]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("TRANS. DATE".to_string());
        }
        if self.description.is_none() {
            missing.push("DESCRIPTION".to_string());
        }
        if self.debit.is_none() {
            missing.push("DEBIT".to_string());
        }
        missing
    }

    fn is_mapped(&self, idx: usize) -> bool {
        [self.voucher, self.date, self.description, self.debit].contains(&Some(idx))
    }
}

fn parse_grid(grid: Vec<Vec<Cell>>, sheet: &str) -> Result<InputTable> {
    if grid.iter().all(|row| row.iter().all(Cell::is_empty)) {
        return Err(RekapError::EmptySheet(sheet.to_string()));
    }

    let mut best = ColumnMap::default();
    let mut header_idx = None;
    for (idx, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let map = ColumnMap::detect(row);
        if map.found() == 3 {
            best = map;
            header_idx = Some(idx);
            break;
        }
        if map.found() > best.found() {
            best = map;
        }
    }
    let Some(header_idx) = header_idx else {
        return Err(RekapError::MissingColumns(best.missing()));
    };
    let map = best;
    let (Some(date_col), Some(desc_col), Some(debit_col)) = (map.date, map.description, map.debit)
    else {
        return Err(RekapError::MissingColumns(map.missing()));
    };

    let header_row = &grid[header_idx];
    let extra_cols: Vec<usize> = header_row
        .iter()
        .enumerate()
        .filter(|(i, cell)| !map.is_mapped(*i) && !cell.is_empty())
        .map(|(i, _)| i)
        .collect();
    let header_text = |idx: usize| header_row.get(idx).map(Cell::text).unwrap_or_default();
    let headers = ColumnHeaders {
        voucher: map.voucher.map(header_text),
        date: header_text(date_col),
        description: header_text(desc_col),
        debit: header_text(debit_col),
        extra: extra_cols.iter().map(|&i| header_text(i)).collect(),
    };

    let mut rows = Vec::new();
    for (offset, row) in grid.into_iter().skip(header_idx + 1).enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let line = header_idx + offset + 2;
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);

        let date_cell = cell(date_col);
        let date = date_cell.date();
        if date.is_none() {
            log::warn!("row {line}: unparsable date {:?}", date_cell.text());
        }

        let debit_cell = cell(debit_col);
        let debit = debit_cell.amount().unwrap_or_else(|| {
            log::warn!("row {line}: unparsable debit {:?}, using 0", debit_cell.text());
            0.0
        });

        let voucher = map
            .voucher
            .map(|idx| cell(idx).text())
            .filter(|v| !v.is_empty());

        rows.push(ParsedRow {
            voucher,
            date,
            raw_date: date_cell.text(),
            description: cell(desc_col).text(),
            debit,
            extra: extra_cols.iter().map(|&i| cell(i).into_value()).collect(),
        });
    }

    log::info!("read {} rows from sheet {sheet}", rows.len());
    Ok(InputTable { headers, rows })
}
