//! crosspanel CLI binary.
//!
//! Builds monthly research panels, ETF time series and factor tables from a
//! directory of CSV extracts.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crosspanel::output::{TableFormat, daily_factor_frame, etf_frame, write_frame};
use crosspanel::panel::LinkPolicy;
use crosspanel::{CsvSource, Pipeline, PipelineConfig, Strategy, Variant};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crosspanel")]
#[command(about = "Monthly firm-level research panels with rolling betas", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for per-security steps (default: one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Directory holding the CSV extracts
    #[arg(long, short)]
    input: PathBuf,

    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// First sample date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last sample date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LinkMode {
    /// Fail on observations covered by several links
    Strict,
    /// Skip such observations
    Skip,
}

impl From<LinkMode> for LinkPolicy {
    fn from(mode: LinkMode) -> Self {
        match mode {
            LinkMode::Strict => Self::Strict,
            LinkMode::Skip => Self::Skip,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the monthly panel
    Build {
        #[command(flatten)]
        input: InputArgs,

        /// Panel file (.parquet or .csv)
        #[arg(long, short)]
        output: PathBuf,

        /// Strategy of a compact panel (Value, Quality, AssetGrowth or any name)
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Panel variant (compact or full)
        #[arg(long)]
        variant: Option<Variant>,

        /// Extra signal fields, comma separated
        #[arg(long, value_delimiter = ',')]
        signals: Vec<String>,

        /// Handling of ambiguous links
        #[arg(long, value_enum)]
        links: Option<LinkMode>,
    },

    /// Write the monthly or daily factor table with a month column
    Factors {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (.parquet or .csv)
        #[arg(long, short)]
        output: PathBuf,

        /// Use the daily factor file
        #[arg(long)]
        daily: bool,
    },

    /// Build the daily ETF time series
    Etf {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (.parquet or .csv)
        #[arg(long, short)]
        output: PathBuf,

        /// ETF tickers, comma separated
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// JSON configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match cli.command {
        Commands::Build {
            input,
            output,
            strategy,
            variant,
            signals,
            links,
        } => {
            let mut config = load_config(&input)?;
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if let Some(variant) = variant {
                config.variant = variant;
            }
            if !signals.is_empty() {
                config.signals = signals;
            }
            if let Some(links) = links {
                config.link_policy = links.into();
            }
            build_panel(config, &input.input, &output)?;
        }
        Commands::Factors {
            input,
            output,
            daily,
        } => {
            let pipeline = Pipeline::new(load_config(&input)?)?;
            let factors = pipeline.run_factors(&CsvSource::new(&input.input), daily)?;
            let mut df = daily_factor_frame(&factors)?;
            write_frame(&mut df, &output, TableFormat::from_path(&output)?)?;
            println!("Wrote {} factor rows to {}", df.height(), output.display());
        }
        Commands::Etf {
            input,
            output,
            tickers,
        } => {
            let mut config = load_config(&input)?;
            if !tickers.is_empty() {
                config.etf.tickers = tickers;
            }
            let pipeline = Pipeline::new(config)?;
            let rows = pipeline.run_etf(&CsvSource::new(&input.input))?;
            let mut df = etf_frame(&rows)?;
            write_frame(&mut df, &output, TableFormat::from_path(&output)?)?;
            println!("Wrote {} ETF rows to {}", df.height(), output.display());
        }
        Commands::Config { config } => {
            let config = match config {
                Some(path) => PipelineConfig::from_file(&path)?,
                None => PipelineConfig::default(),
            };
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(input: &InputArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &input.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(start) = input.start {
        config.sample_start = start;
    }
    if let Some(end) = input.end {
        config.sample_end = end;
    }
    Ok(config)
}

fn build_panel(
    config: PipelineConfig,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(config)?;
    let source = CsvSource::new(input);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {elapsed} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline.run_with_progress(&source, &mut |step| pb.set_message(step.to_string()));
    let result = match result {
        Ok(result) => {
            pb.finish_with_message(format!("Built {} rows", result.panel.len()));
            result
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let files = result.write(output, &pipeline.layout())?;
    info!(panel = %files.panel.display(), "wrote panel");

    println!();
    print!("{}", result.summary);
    println!();
    println!("Panel:   {}", files.panel.display());
    println!("Factors: {}", files.factors.display());
    println!("Summary: {}", files.summary.display());
    Ok(())
}
