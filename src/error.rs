use thiserror::Error;

#[derive(Error, Debug)]
pub enum RekapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XLSX export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Input validation failed: missing column(s) {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Input validation failed: sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RekapError>;
