//! Sales analysis over small imported tables.
//!
//! Raw rows (a delimited file, a spreadsheet, pasted text, or already-tabular
//! values) are mapped to a fixed per-mode schema by column position, coerced
//! to numbers, and enriched with the mode's derived metric. The resulting [`Table`] feeds summary
//! statistics, top-N rankings, distribution buckets, chart series and the
//! map view.
pub mod config;
pub mod error;
pub mod loader;
pub mod map;
pub mod output;
pub mod reports;
pub mod session;
pub mod types;
pub mod util;

pub use error::{ExportError, ParseError, QueryError};
pub use loader::{
    coerce_and_derive_metrics, import_file, import_rows, import_text, parse_table, read_workbook,
    Delimiter, ImportReport,
};
pub use reports::{bin_distribution, chart_series, comparison_rows, summarize, top_n};
pub use session::Session;
pub use types::{ChartData, ChartKind, Column, Mode, RawTable, RawValue, Record, SummaryStats, Table};
