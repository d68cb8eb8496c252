use crate::types::{ChartKind, Mode};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sales-report")]
#[command(about = "Year-over-year, target and geographic sales analysis")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, default_value = "yoy", help = "Analysis type: yoy, target or map")]
    pub mode: Mode,
    #[arg(
        long,
        default_value = "10",
        allow_hyphen_values = true,
        help = "Number of customers in the top-N comparison"
    )]
    pub top_n: String,
    #[arg(long, short, default_value = "bar", help = "Chart kind: bar, line, scatter or pie")]
    pub chart: ChartKind,
    #[arg(long, short, help = "CSV, TSV or spreadsheet (xlsx, xls, ods) file to import at start-up")]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = ".", help = "Directory for exported files")]
    pub out_dir: PathBuf,
    #[arg(long, requires = "file", help = "Import --file, print the analysis, write exports and exit")]
    pub batch: bool,
}

/// Log to stderr so events never mix with report output. `RUST_LOG`
/// overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sales_report=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
