// Entry point and interactive menu.
//
// The menu mirrors the four views of the tool:
// - data import (mode selection, file import, pasted data, preview),
// - analysis (summary statistics and the top-N comparison),
// - visualization (series for the selected chart kind),
// - map (GeoJSON export for the geographic mode).
use clap::Parser;
use sales_report::config::{init_tracing, Cli};
use sales_report::error::{ExportError, QueryError};
use sales_report::loader::ImportReport;
use sales_report::output::{self, SummaryDocument};
use sales_report::types::{ChartKind, Mode};
use sales_report::util::format_count;
use sales_report::Session;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const PREVIEW_ROWS: usize = 20;

/// Read a single line of input after printing `prompt`.
///
/// `None` means stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Read pasted rows until an empty line or end of input.
fn read_pasted_block() -> String {
    println!("Paste data (finish with an empty line):");
    let stdin = io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn report_import(session: &Session, report: &ImportReport) {
    println!(
        "Imported {} records successfully!",
        format_count(report.accepted_rows)
    );
    if report.dropped_rows > 0 {
        println!(
            "Note: {} rows skipped due to missing or non-numeric values.",
            format_count(report.dropped_rows)
        );
    }
    println!();
    if let Ok(table) = session.table() {
        println!("{}\n", output::render_table(table, PREVIEW_ROWS));
    }
}

fn handle_select_mode(session: &mut Session) {
    println!("Select Analysis Type:");
    for (i, mode) in Mode::ALL.iter().enumerate() {
        println!("[{}] {} Analysis", i + 1, mode);
    }
    let choice = read_line("Enter choice: ").unwrap_or_default();
    let mode = match choice.as_str() {
        "1" => Mode::YearOverYear,
        "2" => Mode::TargetAchievement,
        "3" => Mode::Geographic,
        other => match Mode::from_tag(other) {
            Ok(m) => m,
            Err(e) => {
                println!("{}\n", e);
                return;
            }
        },
    };
    session.set_mode(mode);
    println!("{}\n", mode.column_hint());
}

fn handle_import_file(session: &mut Session) {
    println!("{}", session.mode().column_hint());
    let Some(path) = read_line("Enter file path: ") else {
        return;
    };
    match session.import_file(Path::new(&path)) {
        Ok(report) => report_import(session, &report),
        Err(e) => eprintln!("Error importing file: {}\n", e),
    }
}

fn handle_paste(session: &mut Session) {
    println!("{}", session.mode().column_hint());
    let text = read_pasted_block();
    match session.import_text(&text) {
        Ok(report) => report_import(session, &report),
        Err(e) => eprintln!("Error processing pasted data: {}\n", e),
    }
}

fn print_analysis(session: &Session) -> Result<(), QueryError> {
    let table = session.table()?;
    if table.mode() == Mode::Geographic {
        println!("No summary statistics for map analysis.\n");
        return Ok(());
    }
    println!("Summary Statistics\n");
    output::preview_table_rows(&session.summary()?.to_rows(), usize::MAX);

    let rows = session.comparison()?;
    let compared = table
        .mode()
        .schema()
        .compared
        .map(|c| c.label())
        .unwrap_or_default();
    println!("Top {} Customers - Current Sales vs {}\n", session.top_n(), compared);
    output::preview_table_rows(&rows, usize::MAX);
    Ok(())
}

fn handle_analysis(session: &mut Session) {
    let prompt = format!("Show Top N [{}]: ", session.top_n());
    if let Some(input) = read_line(&prompt) {
        if !input.is_empty() {
            session.set_top_n(&input);
        }
    }
    if let Err(e) = print_analysis(session) {
        eprintln!("Error updating analysis: {}\n", e);
    }
}

fn print_visualization(session: &Session) -> Result<(), QueryError> {
    let chart = session.chart_data()?;
    output::preview_chart(&chart, PREVIEW_ROWS);
    Ok(())
}

fn handle_visualization(session: &mut Session) {
    let prompt = format!("Chart Type (bar/line/scatter/pie) [{}]: ", session.chart().tag());
    if let Some(input) = read_line(&prompt) {
        if !input.is_empty() {
            match ChartKind::from_tag(&input) {
                Ok(kind) => session.set_chart(kind),
                Err(e) => {
                    println!("{}\n", e);
                    return;
                }
            }
        }
    }
    if let Err(e) = print_visualization(session) {
        eprintln!("Error updating visualization: {}\n", e);
    }
}

fn write_map(session: &Session, out_dir: &Path) -> Result<PathBuf, ExportError> {
    let view = session.map()?;
    let path = out_dir.join("sales_map.geojson");
    output::write_geojson(&path, &view)?;
    println!(
        "Map centered on {:.4}, {:.4} with {} markers.",
        view.center_latitude,
        view.center_longitude,
        format_count(view.markers.len())
    );
    Ok(path)
}

fn handle_map(session: &Session, out_dir: &Path) {
    match write_map(session, out_dir) {
        Ok(path) => println!("(Map exported to {})\n", path.display()),
        Err(e) => eprintln!("Error generating map: {}\n", e),
    }
}

/// Write every artifact the current mode supports and return their paths.
fn write_exports(session: &Session, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let table = session.table()?;
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let path = out_dir.join("sales_table.csv");
    output::export_table(&path, table)?;
    written.push(path);

    if table.mode() == Mode::Geographic {
        written.push(write_map(session, out_dir)?);
        return Ok(written);
    }

    let stats = session.summary()?;
    let path = out_dir.join("summary.json");
    output::write_json(&path, &SummaryDocument::new(table, &stats))?;
    written.push(path);

    let path = out_dir.join("top_customers.csv");
    output::write_csv(&path, &session.comparison()?)?;
    written.push(path);

    let path = out_dir.join(format!("chart_{}.csv", session.chart().tag()));
    output::write_chart_csv(&path, &session.chart_data()?)?;
    written.push(path);

    Ok(written)
}

fn handle_export(session: &Session, out_dir: &Path) {
    match write_exports(session, out_dir) {
        Ok(paths) => {
            for p in paths {
                println!("(Exported {})", p.display());
            }
            println!();
        }
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn run_batch(session: &mut Session, file: &Path, out_dir: &Path) -> ExitCode {
    match session.import_file(file) {
        Ok(report) => report_import(session, &report),
        Err(e) => {
            eprintln!("Error importing file: {}", e);
            return ExitCode::from(2);
        }
    }
    if session.mode() != Mode::Geographic {
        if let Err(e) = print_analysis(session).and_then(|_| print_visualization(session)) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }
    match write_exports(session, out_dir) {
        Ok(paths) => {
            for p in paths {
                println!("(Exported {})", p.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Write error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let mut session = Session::new(cli.mode);
    session.set_top_n(&cli.top_n);
    session.set_chart(cli.chart);

    if cli.batch {
        if let Some(file) = cli.file.as_deref() {
            return run_batch(&mut session, file, &cli.out_dir);
        }
    }

    if let Some(file) = cli.file.as_deref() {
        match session.import_file(file) {
            Ok(report) => report_import(&session, &report),
            Err(e) => eprintln!("Error importing file: {}\n", e),
        }
    }

    loop {
        println!("Sales Analysis Tool ({} Analysis)", session.mode());
        println!("[1] Select analysis type");
        println!("[2] Import file");
        println!("[3] Paste data");
        println!("[4] Update analysis");
        println!("[5] Update visualization");
        println!("[6] Generate map");
        println!("[7] Export results");
        println!("[0] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_select_mode(&mut session),
            "2" => handle_import_file(&mut session),
            "3" => handle_paste(&mut session),
            "4" => handle_analysis(&mut session),
            "5" => handle_visualization(&mut session),
            "6" => handle_map(&session, &cli.out_dir),
            "7" => handle_export(&session, &cli.out_dir),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-7.\n"),
        }
    }
    ExitCode::SUCCESS
}
