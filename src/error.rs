use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetlensError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "excel")]
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SheetlensError>;
