use crate::error::ExportError;
use crate::loader::Delimiter;
use crate::map::MapView;
use crate::types::{ChartData, SummaryStats, Table};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Summary as written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryDocument<'a> {
    pub mode: &'static str,
    pub generated_at: DateTime<Utc>,
    pub accepted_rows: usize,
    pub stats: &'a SummaryStats,
}

impl<'a> SummaryDocument<'a> {
    pub fn new(table: &Table, stats: &'a SummaryStats) -> Self {
        SummaryDocument {
            mode: table.mode().tag(),
            generated_at: Utc::now(),
            accepted_rows: table.len(),
            stats,
        }
    }
}

/// Write the table as delimited text: a header row, then every row with its
/// derived column. Importing the file again with the same mode reproduces it.
pub fn write_table_delimited<W: Write>(
    table: &Table,
    writer: W,
    delimiter: Delimiter,
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .from_writer(writer);
    wtr.write_record(table.mode().columns().iter().map(|c| c.label()))?;
    for r in table.records() {
        let mut record = vec![r.customer.clone()];
        record.extend(table.mode().value_columns().map(|c| {
            r.get(c).map(|v| v.to_string()).unwrap_or_default()
        }));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export the table to `path`; `.tsv` files are tab-delimited, anything else
/// uses commas.
pub fn export_table(path: &Path, table: &Table) -> Result<(), ExportError> {
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Delimiter::Tab,
        _ => Delimiter::Comma,
    };
    let file = std::fs::File::create(path)?;
    write_table_delimited(table, file, delimiter)
}

pub fn write_chart_csv(path: &Path, chart: &ChartData) -> Result<(), ExportError> {
    match chart {
        ChartData::Bar { points, .. } | ChartData::Line { points, .. } => write_csv(path, points),
        ChartData::Scatter { points, .. } => write_csv(path, points),
        ChartData::Pie { buckets, .. } => write_csv(path, buckets),
    }
}

pub fn write_geojson(path: &Path, view: &MapView) -> Result<(), ExportError> {
    write_json(path, &view.to_geojson())
}

/// Render up to `max_rows` rows of the table in the mode's column layout.
pub fn render_table(table: &Table, max_rows: usize) -> String {
    if table.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.mode().columns().iter().map(|c| c.label().to_string()));
    for r in table.records().iter().take(max_rows) {
        builder.push_record(r.display_cells());
    }
    let mut rendered = builder.build().with(Style::markdown()).to_string();
    if table.len() > max_rows {
        rendered.push_str(&format!("\n({} more rows)", table.len() - max_rows));
    }
    rendered
}

pub fn render_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    tabled::Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_rows(rows, max_rows));
}

pub fn preview_chart(chart: &ChartData, max_rows: usize) {
    println!("{}", chart.title());
    match chart {
        ChartData::Bar { points, .. } | ChartData::Line { points, .. } => {
            preview_table_rows(points, max_rows)
        }
        ChartData::Scatter {
            points,
            diagonal_max,
            ..
        } => {
            preview_table_rows(points, max_rows);
            println!("(reference line from 0 to {})\n", crate::util::format_number(*diagonal_max, 0));
        }
        ChartData::Pie { buckets, .. } => preview_table_rows(buckets, max_rows),
    }
}
