use crate::error::ParseError;
use crate::types::{Mode, RawTable, RawValue, Record, Table};
use crate::util::{coerce_f64, coerce_label};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    pub(crate) fn byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => f.write_str("tab"),
            Delimiter::Comma => f.write_str("comma"),
        }
    }
}

/// How a file is read, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Delimited(Delimiter),
    Workbook,
    /// Unknown extension: sniffed like pasted text.
    Text,
}

impl FileKind {
    fn for_path(path: &Path) -> FileKind {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" | "tab" => FileKind::Delimited(Delimiter::Tab),
            "csv" => FileKind::Delimited(Delimiter::Comma),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => FileKind::Workbook,
            _ => FileKind::Text,
        }
    }
}

/// Delimiters tried, in order, on pasted text. The first attempt that yields
/// a well-formed table wins.
pub const PASTE_ATTEMPTS: [Delimiter; 2] = [Delimiter::Tab, Delimiter::Comma];

/// Outcome of one import, the only feedback about dropped rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub dropped_rows: usize,
    /// Delimiter that parsed the input; `None` for already-tabular rows.
    pub delimiter: Option<Delimiter>,
}

/// Assign columns by position. The first row is the header and is discarded.
///
/// The header row fixes the input width. Extra trailing columns are cut off;
/// short data rows are padded with empty cells so they fail coercion later.
pub fn parse_table(raw_rows: Vec<Vec<RawValue>>, mode: Mode) -> Result<RawTable, ParseError> {
    let mut rows = raw_rows.into_iter();
    let header_row = rows.next().unwrap_or_default();
    let required = mode.required_columns();
    let actual = header_row.len();
    if actual < required {
        return Err(ParseError::InsufficientColumns {
            mode,
            required,
            actual,
        });
    }

    let header = header_row
        .into_iter()
        .take(required)
        .map(|cell| match cell {
            RawValue::Empty => String::new(),
            RawValue::Text(s) => s,
            RawValue::Number(v) => v.to_string(),
        })
        .collect();
    let rows = rows
        .map(|mut row| {
            row.resize(required, RawValue::Empty);
            row
        })
        .collect();
    Ok(RawTable { mode, header, rows })
}

/// Parse pasted text, trying each of [`PASTE_ATTEMPTS`] in turn.
pub fn parse_pasted(text: &str, mode: Mode) -> Result<(RawTable, Delimiter), ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    for delimiter in PASTE_ATTEMPTS {
        match parse_delimited(text, delimiter, mode) {
            Ok(raw) => return Ok((raw, delimiter)),
            Err(e) => debug!(%delimiter, error = %e, "delimited parse attempt failed"),
        }
    }
    warn!(%mode, "pasted data matched no delimiter");
    Err(ParseError::UnrecognizedFormat)
}

/// Parse text with one fixed delimiter.
///
/// Whitespace-only lines are skipped. A data row wider than the header is a
/// structural failure.
pub fn parse_delimited(text: &str, delimiter: Delimiter, mode: Mode) -> Result<RawTable, ParseError> {
    let body = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows: Vec<Vec<RawValue>> = Vec::new();
    let mut width: Option<usize> = None;
    for result in rdr.records() {
        let record = result?;
        let row: Vec<RawValue> = record.iter().map(RawValue::from).collect();
        match width {
            None => width = Some(row.len()),
            Some(w) if row.len() > w => {
                return Err(ParseError::RaggedRow {
                    line: rows.len() + 1,
                    expected: w,
                    found: row.len(),
                });
            }
            Some(_) => {}
        }
        rows.push(row);
    }
    parse_table(rows, mode)
}

/// Coerce numeric columns, drop rows with any undefined required field, and
/// compute the mode's derived column.
///
/// Zero denominators are kept: the derived value is simply non-finite.
pub fn coerce_and_derive_metrics(raw: &RawTable) -> Table {
    let mode = raw.mode;
    let derived = mode.schema().derived.as_ref();
    let records = raw
        .rows
        .iter()
        .filter_map(|row| {
            let (label, numeric) = row.split_first()?;
            let customer = coerce_label(label)?;
            let mut values = numeric.iter().map(coerce_f64).collect::<Option<Vec<f64>>>()?;
            if let Some(d) = derived {
                let v = (d.compute)(&values);
                values.push(v);
            }
            Some(Record::new(customer, mode, values))
        })
        .collect();
    Table::new(mode, records)
}

fn finish(raw: RawTable, delimiter: Option<Delimiter>) -> (Table, ImportReport) {
    let table = coerce_and_derive_metrics(&raw);
    let total_rows = raw.rows.len();
    let report = ImportReport {
        total_rows,
        accepted_rows: table.len(),
        dropped_rows: total_rows - table.len(),
        delimiter,
    };
    info!(
        mode = %raw.mode,
        total = report.total_rows,
        accepted = report.accepted_rows,
        dropped = report.dropped_rows,
        "imported table"
    );
    (table, report)
}

/// Import rows that are already tabular, header row first.
pub fn import_rows(raw_rows: Vec<Vec<RawValue>>, mode: Mode) -> Result<(Table, ImportReport), ParseError> {
    let raw = parse_table(raw_rows, mode)?;
    Ok(finish(raw, None))
}

/// Import a block of pasted text.
pub fn import_text(text: &str, mode: Mode) -> Result<(Table, ImportReport), ParseError> {
    let (raw, delimiter) = parse_pasted(text, mode)?;
    Ok(finish(raw, Some(delimiter)))
}

/// Spreadsheet cell as a raw value. Numbers stay numbers; error cells are
/// empty so the row is dropped.
fn workbook_cell(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::Int(i) => RawValue::from(*i),
        Data::Float(f) => RawValue::Number(*f),
        Data::String(s) => RawValue::from(s.as_str()),
        other => RawValue::from(other.to_string()),
    }
}

/// Rows of the first worksheet, header row first.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<RawValue>>, ParseError> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(ParseError::EmptyInput),
    };
    if range.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    debug!(path = %path.display(), rows = range.height(), "read first worksheet");
    Ok(range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect())
}

/// Import a file. `.csv` and `.tsv` files use their delimiter, spreadsheets
/// (`.xlsx`, `.xls`, `.ods`) are read from their first worksheet, and
/// anything else is treated like pasted text.
pub fn import_file<P: AsRef<Path>>(path: P, mode: Mode) -> Result<(Table, ImportReport), ParseError> {
    let path = path.as_ref();
    match FileKind::for_path(path) {
        FileKind::Workbook => import_rows(read_workbook(path)?, mode),
        FileKind::Delimited(delimiter) => {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                return Err(ParseError::EmptyInput);
            }
            let raw = parse_delimited(&text, delimiter, mode)?;
            Ok(finish(raw, Some(delimiter)))
        }
        FileKind::Text => import_text(&std::fs::read_to_string(path)?, mode),
    }
}
