use crate::error::{ParseError, QueryError};
use crate::loader::{self, ImportReport};
use crate::map::{self, MapView};
use crate::reports;
use crate::types::{ChartData, ChartKind, ComparisonRow, Mode, SummaryStats, Table};
use std::path::Path;
use tracing::info;

/// One analysis session: the selected mode, the loaded table and the
/// display settings that drive the read operations.
///
/// The table is only ever replaced as a whole. A failed import leaves the
/// previous table in place.
#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    table: Option<Table>,
    top_n_input: String,
    chart: ChartKind,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Mode::default())
    }
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Session {
            mode,
            table: None,
            top_n_input: reports::DEFAULT_TOP_N.to_string(),
            chart: ChartKind::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switching to another mode discards the loaded table.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode && self.table.take().is_some() {
            info!(from = %self.mode, to = %mode, "mode changed, table discarded");
        }
        self.mode = mode;
    }

    pub fn table(&self) -> Result<&Table, QueryError> {
        self.table.as_ref().ok_or(QueryError::NoData)
    }

    pub fn import_text(&mut self, text: &str) -> Result<ImportReport, ParseError> {
        let (table, report) = loader::import_text(text, self.mode)?;
        self.table = Some(table);
        Ok(report)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<ImportReport, ParseError> {
        let (table, report) = loader::import_file(path, self.mode)?;
        self.table = Some(table);
        Ok(report)
    }

    /// Raw "top N" text as typed; parsed leniently on use.
    pub fn set_top_n(&mut self, input: &str) {
        self.top_n_input = input.trim().to_string();
    }

    pub fn top_n(&self) -> usize {
        reports::parse_top_n(&self.top_n_input)
    }

    pub fn set_chart(&mut self, chart: ChartKind) {
        self.chart = chart;
    }

    pub fn chart(&self) -> ChartKind {
        self.chart
    }

    pub fn summary(&self) -> Result<SummaryStats, QueryError> {
        Ok(reports::summarize(self.table()?))
    }

    pub fn comparison(&self) -> Result<Vec<ComparisonRow>, QueryError> {
        reports::comparison_rows(self.table()?, self.top_n())
    }

    pub fn chart_data(&self) -> Result<ChartData, QueryError> {
        reports::chart_series(self.table()?, self.chart)
    }

    pub fn map(&self) -> Result<MapView, QueryError> {
        map::map_view(self.table()?)
    }
}
