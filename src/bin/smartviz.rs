use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use smartviz::analysis::summary::DESCRIBE_STATS;
use smartviz::chart::render::DOWNLOAD_FILE_NAME;
use smartviz::pipeline::PageState;
use smartviz::{AppConfig, ChartKind, ChartRequest, Session, Table};

/// Explore a CSV or Excel file: preview, statistics, a chart and quick insights
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset to load (.csv or .xlsx)
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Chart kind: scatter, line, histogram, box, heatmap or count
    #[arg(long = "chart", value_name = "KIND")]
    chart: Option<ChartKind>,
    /// X-axis column for scatter and line charts
    #[arg(long = "x", value_name = "COLUMN")]
    x: Option<String>,
    /// Y-axis column for scatter and line charts
    #[arg(long = "y", value_name = "COLUMN")]
    y: Option<String>,
    /// Column for histogram, box and count charts
    #[arg(long = "column", value_name = "COLUMN")]
    column: Option<String>,
    /// Where to write the chart PNG
    #[arg(long = "out", value_name = "PATH", default_value = DOWNLOAD_FILE_NAME)]
    out: PathBuf,
    /// Path to a config file (overrides $SMARTVIZ_CONFIG and ./.smartviz/config.toml)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of rows in the data preview
    #[arg(long = "preview-rows", value_name = "N")]
    preview_rows: Option<usize>,
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// List the chart kinds this dataset supports and the columns each offers, then exit
    #[arg(long = "list-charts")]
    list_charts: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;

    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn) => Some(tracing::Level::WARN),
        Some(LogLevel::Info) => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => None,
    };
    smartviz::logging::init_with(None, level)?;

    let config = match AppConfig::from_path(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config, using defaults: {e}");
            eprintln!("warning: {e}; using the default theme");
            AppConfig::default()
        }
    };
    let mut session = Session::new(&config);
    if let Some(rows) = args.preview_rows {
        session.set_preview_rows(rows);
    }

    let table = session
        .load_path(&args.file)
        .wrap_err_with(|| format!("Could not load {}", args.file.display()))?;
    println!("Loaded {} ({})", table.name(), table.format());

    if args.list_charts {
        print_chart_menu(&table);
        return Ok(());
    }

    let request = ChartRequest {
        kind: args.chart,
        x: args.x.clone(),
        y: args.y.clone(),
        column: args.column.clone(),
    };
    let page = session.render_request(&table, &request);
    print_page(&page);

    match &page.chart {
        Ok(panel) => {
            let download = panel.download()?;
            fs::write(&args.out, &download.bytes)
                .wrap_err_with(|| format!("Could not write {}", args.out.display()))?;
            info!("Wrote {} bytes to {}", download.bytes.len(), args.out.display());
            println!(
                "\nSaved {} ({}, {} bytes) to {}",
                download.file_name,
                download.mime,
                download.bytes.len(),
                args.out.display()
            );
        }
        Err(e) => println!("\nVisualization unavailable: {e}"),
    }
    Ok(())
}

fn print_chart_menu(table: &Table) {
    println!("\nAvailable charts:");
    for kind in ChartKind::ALL {
        if !kind.is_available(table) {
            println!("  {:<10} (not available for this dataset)", kind.key());
            continue;
        }
        println!("  {:<10} {}", kind.key(), kind);
        for role in kind.roles() {
            let options = ChartKind::column_options(table, role);
            println!("      {role}: {}", options.join(", "));
        }
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "NaN".to_string(),
    }
}

fn print_page(page: &PageState) {
    println!("\n== Data Preview ==");
    match &page.preview {
        Ok(df) => println!("{df}"),
        Err(e) => println!("unavailable: {e}"),
    }

    println!("\n== Data Overview ==");
    match &page.overview {
        Ok(o) => {
            println!("Rows: {}", o.rows);
            println!("Columns: {}", o.columns);
            println!("Missing Values: {}", o.missing_values);
        }
        Err(e) => println!("unavailable: {e}"),
    }

    println!("\n== Data Types & Missing Values ==");
    match &page.column_info {
        Ok(info) => {
            println!("{:<24} {:<16} {:>8}", "column", "dtype", "missing");
            for c in info {
                println!("{:<24} {:<16} {:>8}", c.name, c.dtype, c.missing);
            }
        }
        Err(e) => println!("unavailable: {e}"),
    }

    println!("\n== Descriptive Statistics ==");
    match &page.describe {
        Ok(rows) if rows.is_empty() => println!("No numeric columns"),
        Ok(rows) => {
            print!("{:<8}", "");
            for row in rows {
                print!(" {:>14}", row.column);
            }
            println!();
            for (i, stat) in DESCRIBE_STATS.iter().enumerate() {
                print!("{stat:<8}");
                for row in rows {
                    print!(" {:>14}", fmt_stat(row.values()[i]));
                }
                println!();
            }
        }
        Err(e) => println!("unavailable: {e}"),
    }

    println!("\n== Quick Insights ==");
    match &page.insights {
        Ok(Some(report)) if !report.is_empty() => {
            println!("Top Correlated Features:");
            for p in &report.pairs {
                println!("  {:<20} {:<20} {:.4}", p.left, p.right, p.strength);
            }
        }
        Ok(Some(_)) => println!("No defined correlations between numeric columns"),
        Ok(None) => {}
        Err(e) => println!("unavailable: {e}"),
    }
}
