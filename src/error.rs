use crate::types::{Column, Mode};
use thiserror::Error;

/// Structural failures while turning raw input into a table.
///
/// Any of these aborts the import; no partial table is produced and the
/// previously loaded table stays untouched.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{mode} analysis needs at least {required} columns, input has {actual}")]
    InsufficientColumns {
        mode: Mode,
        required: usize,
        actual: usize,
    },

    #[error("could not parse the pasted data as tab- or comma-delimited text")]
    UnrecognizedFormat,

    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("no data to import")]
    EmptyInput,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
}

/// Read operations asked for something the current table cannot answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown analysis mode `{0}` (expected yoy, target or map)")]
    UnknownMode(String),

    #[error("unknown chart kind `{0}` (expected bar, line, scatter or pie)")]
    UnknownChart(String),

    #[error("column `{column}` is not part of {mode} analysis")]
    ColumnNotInMode { column: Column, mode: Mode },

    #[error("{what} is not available for {mode} analysis")]
    NotAvailable { what: &'static str, mode: Mode },

    #[error("no data loaded")]
    NoData,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Query(#[from] QueryError),
}
