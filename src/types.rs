use crate::error::QueryError;
use crate::util::{format_count, format_number, format_percent};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Every column any analysis mode can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Customer,
    CurrentSales,
    PreviousSales,
    Target,
    Sales,
    Latitude,
    Longitude,
    Growth,
    Achievement,
}

impl Column {
    pub fn label(self) -> &'static str {
        match self {
            Column::Customer => "Customer",
            Column::CurrentSales => "Current Sales",
            Column::PreviousSales => "Previous Sales",
            Column::Target => "Target",
            Column::Sales => "Sales",
            Column::Latitude => "Latitude",
            Column::Longitude => "Longitude",
            Column::Growth => "Growth",
            Column::Achievement => "Achievement",
        }
    }

    /// Render a value of this column for display.
    pub fn format(self, value: f64) -> String {
        match self {
            Column::Growth | Column::Achievement => format_percent(value),
            Column::Latitude | Column::Longitude => format!("{:.4}", value),
            _ => format_number(value, 0),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A column computed row-wise from the numeric input columns.
pub struct Derived {
    pub column: Column,
    /// Receives the numeric inputs in schema order.
    pub compute: fn(&[f64]) -> f64,
}

/// One distribution bucket covering `(previous upper, upper]`.
pub struct Bucket {
    pub label: &'static str,
    pub upper: f64,
}

/// Everything that varies between analysis modes.
pub struct Schema {
    pub tag: &'static str,
    pub title: &'static str,
    /// Numeric input columns, in input order after the Customer column.
    pub inputs: &'static [Column],
    pub derived: Option<Derived>,
    /// Buckets for the derived column; empty when the mode has no distribution.
    pub buckets: &'static [Bucket],
    /// Column plotted against Current Sales in comparison and scatter views.
    pub compared: Option<Column>,
}

fn growth(inputs: &[f64]) -> f64 {
    (inputs[0] - inputs[1]) / inputs[1] * 100.0
}

fn achievement(inputs: &[f64]) -> f64 {
    inputs[0] / inputs[1] * 100.0
}

static YEAR_OVER_YEAR: Schema = Schema {
    tag: "yoy",
    title: "Year over Year",
    inputs: &[Column::CurrentSales, Column::PreviousSales],
    derived: Some(Derived {
        column: Column::Growth,
        compute: growth,
    }),
    buckets: &[
        Bucket { label: "High Decline (<-10%)", upper: -10.0 },
        Bucket { label: "Slight Decline (-10-0%)", upper: 0.0 },
        Bucket { label: "Slight Growth (0-10%)", upper: 10.0 },
        Bucket { label: "High Growth (>10%)", upper: f64::INFINITY },
    ],
    compared: Some(Column::PreviousSales),
};

static TARGET_ACHIEVEMENT: Schema = Schema {
    tag: "target",
    title: "Sales vs Target",
    inputs: &[Column::CurrentSales, Column::Target],
    derived: Some(Derived {
        column: Column::Achievement,
        compute: achievement,
    }),
    buckets: &[
        Bucket { label: "Below 80%", upper: 80.0 },
        Bucket { label: "80-90%", upper: 90.0 },
        Bucket { label: "90-100%", upper: 100.0 },
        Bucket { label: "100-110%", upper: 110.0 },
        Bucket { label: "Above 110%", upper: f64::INFINITY },
    ],
    compared: Some(Column::Target),
};

static GEOGRAPHIC: Schema = Schema {
    tag: "map",
    title: "Map",
    inputs: &[Column::Sales, Column::Latitude, Column::Longitude],
    derived: None,
    buckets: &[],
    compared: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    YearOverYear,
    TargetAchievement,
    Geographic,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::YearOverYear, Mode::TargetAchievement, Mode::Geographic];

    pub fn schema(self) -> &'static Schema {
        match self {
            Mode::YearOverYear => &YEAR_OVER_YEAR,
            Mode::TargetAchievement => &TARGET_ACHIEVEMENT,
            Mode::Geographic => &GEOGRAPHIC,
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, QueryError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "yoy" | "year-over-year" => Ok(Mode::YearOverYear),
            "target" | "target-achievement" => Ok(Mode::TargetAchievement),
            "map" | "geographic" => Ok(Mode::Geographic),
            _ => Err(QueryError::UnknownMode(tag.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        self.schema().tag
    }

    /// Number of leading input columns the mode reads, Customer included.
    pub fn required_columns(self) -> usize {
        1 + self.schema().inputs.len()
    }

    pub fn derived_column(self) -> Option<Column> {
        self.schema().derived.as_ref().map(|d| d.column)
    }

    /// Numeric columns stored on each record: inputs, then the derived column.
    pub fn value_columns(self) -> impl Iterator<Item = Column> {
        self.schema()
            .inputs
            .iter()
            .copied()
            .chain(self.derived_column())
    }

    /// All columns of a processed table, in display order.
    pub fn columns(self) -> Vec<Column> {
        std::iter::once(Column::Customer)
            .chain(self.value_columns())
            .collect()
    }

    pub fn has_column(self, column: Column) -> bool {
        column == Column::Customer || self.value_columns().any(|c| c == column)
    }

    /// Help line shown next to the import controls.
    pub fn column_hint(self) -> String {
        let names: Vec<String> = std::iter::once(Column::Customer)
            .chain(self.schema().inputs.iter().copied())
            .enumerate()
            .map(|(i, c)| format!("{}={}", ordinal(i + 1), c.label()))
            .collect();
        format!("Column order: {}", names.join(", "))
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().title)
    }
}

impl FromStr for Mode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::from_tag(s)
    }
}

/// A raw cell as handed over by a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s)
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

/// Input rows with columns assigned by position, trimmed to the mode's width.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub mode: Mode,
    /// Header text as found in the input; informational only.
    pub header: Vec<String>,
    /// Each row holds exactly `mode.required_columns()` cells.
    pub rows: Vec<Vec<RawValue>>,
}

/// One customer's processed row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub customer: String,
    mode: Mode,
    values: Vec<f64>,
}

impl Record {
    /// `values` must follow `mode.value_columns()`.
    pub(crate) fn new(customer: String, mode: Mode, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), mode.value_columns().count());
        Record {
            customer,
            mode,
            values,
        }
    }

    pub fn get(&self, column: Column) -> Option<f64> {
        self.mode
            .value_columns()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Display cells for every column of the mode, Customer first.
    pub fn display_cells(&self) -> Vec<String> {
        std::iter::once(self.customer.clone())
            .chain(
                self.mode
                    .value_columns()
                    .zip(&self.values)
                    .map(|(c, v)| c.format(*v)),
            )
            .collect()
    }
}

/// A processed table. Built once per import and never edited afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    mode: Mode,
    records: Vec<Record>,
}

impl Table {
    pub(crate) fn new(mode: Mode, records: Vec<Record>) -> Self {
        Table { mode, records }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All values of a numeric column, in row order.
    pub fn column(&self, column: Column) -> Result<Vec<f64>, QueryError> {
        if column == Column::Customer || !self.mode.has_column(column) {
            return Err(QueryError::ColumnNotInMode {
                column,
                mode: self.mode,
            });
        }
        Ok(self
            .records
            .iter()
            .filter_map(|r| r.get(column))
            .collect())
    }

    /// Same mode, a subset of rows.
    pub(crate) fn with_records(&self, records: Vec<Record>) -> Table {
        Table::new(self.mode, records)
    }
}

/// A summary statistic value, tagged with how it should be presented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(usize),
    Amount(f64),
    Percent(f64),
}

impl StatValue {
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Count(n) => n as f64,
            StatValue::Amount(v) | StatValue::Percent(v) => v,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => f.write_str(&format_count(*n)),
            StatValue::Amount(v) => f.write_str(&format_number(*v, 0)),
            StatValue::Percent(v) => f.write_str(&format_percent(*v)),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Count(n) => serializer.serialize_u64(*n as u64),
            // serde_json writes non-finite floats as null
            StatValue::Amount(v) | StatValue::Percent(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Ordered statistic name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    entries: Vec<(&'static str, StatValue)>,
}

impl SummaryStats {
    pub(crate) fn push(&mut self, name: &'static str, value: StatValue) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<StatValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, StatValue)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_rows(&self) -> Vec<SummaryRow> {
        self.iter()
            .map(|(name, value)| SummaryRow {
                statistic: name.to_string(),
                value: value.to_string(),
            })
            .collect()
    }
}

impl Serialize for SummaryStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryRow {
    #[serde(rename = "Statistic")]
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct BucketRow {
    #[serde(rename = "Bucket")]
    #[tabled(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "Customers")]
    #[tabled(rename = "Customers")]
    pub customers: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share", display_with = "display_percent")]
    pub share: f64,
}

/// Top-N row for the grouped current-vs-compared bar chart.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ComparisonRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current", display_with = "display_amount")]
    pub current: f64,
    #[serde(rename = "Compared")]
    #[tabled(rename = "Compared", display_with = "display_amount")]
    pub compared: f64,
}

/// One bar or line point: position on the x axis, customer, metric value.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SeriesPoint {
    #[serde(rename = "Position")]
    #[tabled(rename = "Position")]
    pub position: usize,
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value", display_with = "display_percent")]
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ScatterPoint {
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "X")]
    #[tabled(rename = "X", display_with = "display_amount")]
    pub x: f64,
    #[serde(rename = "Y")]
    #[tabled(rename = "Y", display_with = "display_amount")]
    pub y: f64,
}

fn display_percent(v: &f64) -> String {
    format_percent(*v)
}

fn display_amount(v: &f64) -> String {
    format_number(*v, 0)
}

/// Data handed to the plotting side for one chart kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar { column: Column, points: Vec<SeriesPoint> },
    Line { column: Column, points: Vec<SeriesPoint> },
    Scatter {
        x: Column,
        y: Column,
        points: Vec<ScatterPoint>,
        /// Reference diagonal from (0, 0) to (max, max).
        diagonal_max: f64,
    },
    Pie { column: Column, buckets: Vec<BucketRow> },
}

impl ChartData {
    pub fn title(&self) -> String {
        match self {
            ChartData::Bar { column, .. } => format!("Customer {} Distribution", column),
            ChartData::Line { column, .. } => format!("{} Trend", column),
            ChartData::Scatter { x, y, .. } => format!("{} vs {}", y, x),
            ChartData::Pie { column, .. } => format!("Distribution of Customer {}", column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
    Pie,
}

impl ChartKind {
    pub fn from_tag(tag: &str) -> Result<Self, QueryError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "scatter" => Ok(ChartKind::Scatter),
            "pie" => Ok(ChartKind::Pie),
            _ => Err(QueryError::UnknownChart(tag.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
        }
    }
}

impl FromStr for ChartKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::from_tag(s)
    }
}
