//! Injurylens CLI - Summarize injury spreadsheets exported as JSON rows
//!
//! # Commands
//!
//! ```bash
//! injurylens summarize rows.json                          # Overall injuries chart (JSON)
//! injurylens summarize rows.json --mode injuries-by-location --year 2023
//! injurylens summarize rows.json --select Cut --format csv  # Drill-down table
//! injurylens options rows.json                            # Selectable locations and years
//! injurylens modes                                        # Available charts
//! ```
//!
//! Configuration is read from the JSON file named by `INJURYLENS_CONFIG`
//! (a `.env` file is honoured) or from `--config`.

use clap::{Parser, Subcommand, ValueEnum};
use injurylens::logs::LOG_BROADCASTER;
use injurylens::{
    rows_to_csv, AggregationResult, Chart, EngineConfig, FilterSet, JsonRowParser, Session,
    SortOrder, VisualizationMode,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "injurylens")]
#[command(about = "Aggregate workplace injury records into dashboard charts", long_about = None)]
struct Cli {
    /// Engine config file (overrides INJURYLENS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not echo log lines to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a chart (and optional drill-down) for a JSON row dump
    Summarize {
        /// Input JSON file (array of row objects)
        input: PathBuf,

        /// Chart to compute
        #[arg(short, long, default_value = "overall-injuries")]
        mode: VisualizationMode,

        /// Keep only these locations (repeatable; "all" lifts the filter)
        #[arg(short, long)]
        location: Vec<String>,

        /// Keep only these years of loss (repeatable)
        #[arg(short, long)]
        year: Vec<i32>,

        /// Row order
        #[arg(short, long, default_value = "default")]
        sort: SortOrder,

        /// Group to drill into
        #[arg(long)]
        select: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the locations and years a filter can select
    Options {
        /// Input JSON file (array of row objects)
        input: PathBuf,
    },

    /// List the available charts
    Modes,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match cli.command {
        Commands::Summarize {
            input,
            mode,
            location,
            year,
            sort,
            select,
            format,
            output,
        } => {
            let filters = FilterSet::new().with_locations(location).with_years(year);
            cmd_summarize(
                cli.config.as_deref(),
                &input,
                mode,
                filters,
                sort,
                select.as_deref(),
                format,
                output.as_deref(),
            )
            .await
        }

        Commands::Options { input } => cmd_options(cli.config.as_deref(), &input).await,

        Commands::Modes => cmd_modes(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => EngineConfig::from_file(p)?,
        None => EngineConfig::from_env()?,
    };
    Ok(config)
}

async fn load_session(config: Option<&Path>, input: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let parser = JsonRowParser::new(&config);
    let mut session = Session::new(config);

    eprintln!("📄 Loading: {}", input.display());
    let bytes = parser.read_file(input).await?;
    session.load_with(&parser, bytes).await?;
    Ok(session)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_summarize(
    config: Option<&Path>,
    input: &Path,
    mode: VisualizationMode,
    filters: FilterSet,
    sort: SortOrder,
    select: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(config, input).await?;

    session.set_visualization_mode(mode);
    session.set_filters(filters);
    session.set_sort(sort);
    if let Some(key) = select {
        session.select_item(key)?;
    }

    let view = session.view();
    match &view.chart {
        Chart::Empty(empty) => eprintln!(
            "📊 {}: no data ({} filtered records)",
            empty.title, empty.filtered_records
        ),
        Chart::Ready(chart) => eprintln!(
            "📊 {}: {} rows from {} filtered records",
            chart.title,
            chart.rows().len(),
            chart.filtered_records
        ),
    }

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(view)?,
        OutputFormat::Csv => {
            let table = match (&view.detail, &view.chart) {
                (Some(detail), _) => detail.breakdown.clone(),
                (None, Chart::Ready(chart)) => chart.result.clone(),
                (None, Chart::Empty(_)) => AggregationResult::empty(mode.spec()),
            };
            rows_to_csv(&table)?
        }
    };
    write_output(&content, output).await?;

    Ok(())
}

async fn cmd_options(config: Option<&Path>, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(config, input).await?;
    let options = session.filter_options();

    eprintln!(
        "🔎 {} locations, {} years, {} undated records",
        options.locations.len(),
        options.years.len(),
        options.undated
    );
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

fn cmd_modes() -> Result<(), Box<dyn std::error::Error>> {
    for mode in VisualizationMode::ALL {
        let axis = mode.axis_labels();
        println!("  📈 {} ({})", mode.title(), mode);
        println!("     X: {}  Y: {}", axis.x, axis.y);
        println!("     Drill-down by: {}", mode.drill_down_field().display_name());
    }
    Ok(())
}

async fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            tokio::fs::write(p, content).await?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
