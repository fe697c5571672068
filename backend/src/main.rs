//! TB dashboard CLI - shape WHO tuberculosis datasets into chart-ready JSON
//!
//! # Main Commands
//!
//! ```bash
//! tbdash serve                              # Start HTTP server (port 3000)
//! tbdash coverage --country Peru --top 5    # Coverage trend + ranking
//! tbdash compare                            # RR-TB share vs incidence rate
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! tbdash parse data/visual3.csv             # Just parse CSV to JSON records
//! tbdash countries                          # Coverage country list
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tbdash::{
    format_delimiter, parse_csv_file_auto, start_server, BurdenRequest, CoinfectionRequest, CoverageRequest,
    Dashboard, DashboardConfig, ReductionRequest, ResistanceRequest,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tbdash")]
#[command(about = "Shape global tuberculosis datasets for the analytics dashboard", long_about = None)]
struct Cli {
    /// Dataset directory (overrides TBDASH_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every panel command
#[derive(clap::Args)]
struct PanelArgs {
    /// Dataset file (default: configured file in the data directory)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON records
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Treatment coverage trend and top-N ranking
    Coverage {
        /// Country to plot (default: first alphabetically)
        #[arg(short, long)]
        country: Option<String>,

        /// Ranking year (default: latest)
        #[arg(short, long)]
        year: Option<i32>,

        /// Bars in the ranking (default: TBDASH_TOP_N)
        #[arg(short, long)]
        top: Option<usize>,

        #[command(flatten)]
        args: PanelArgs,
    },

    /// Incidence / mortality trend
    Burden {
        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        measure: Option<String>,

        #[arg(long)]
        level: Option<String>,

        #[command(flatten)]
        args: PanelArgs,
    },

    /// Percentage reduction between two years, per country
    Reduction {
        /// Baseline year (default: earliest)
        #[arg(long)]
        baseline: Option<i32>,

        /// Target year (default: latest)
        #[arg(long)]
        target: Option<i32>,

        #[command(flatten)]
        args: PanelArgs,
    },

    /// RR-TB region x year heatmap
    Resistance {
        /// Regions to keep, repeatable (default: all)
        #[arg(long = "region")]
        regions: Vec<String>,

        #[arg(long)]
        from: Option<i32>,

        #[arg(long)]
        to: Option<i32>,

        #[command(flatten)]
        args: PanelArgs,
    },

    /// HIV co-infection, Developed vs matched Developing countries
    Coinfection {
        /// Single year (default: all years)
        #[arg(short, long)]
        year: Option<i32>,

        #[command(flatten)]
        args: PanelArgs,
    },

    /// RR-TB share joined with the burden rate per region and year
    Compare {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List countries of the coverage dataset
    Countries {
        #[command(flatten)]
        args: PanelArgs,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: TBDASH_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult {
    let mut config = DashboardConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Coverage { country, year, top, args } => {
            override_input(&mut config.files.coverage, &args)?;
            let panel = Dashboard::new(config).coverage(&CoverageRequest { country, year, top })?;
            emit(&panel, args.output.as_deref())
        }

        Commands::Burden { region, measure, level, args } => {
            override_input(&mut config.files.burden, &args)?;
            let panel = Dashboard::new(config).burden(&BurdenRequest { region, measure, level })?;
            emit(&panel, args.output.as_deref())
        }

        Commands::Reduction { baseline, target, args } => {
            override_input(&mut config.files.reduction, &args)?;
            let panel = Dashboard::new(config).reduction(&ReductionRequest { baseline, target })?;
            emit(&panel, args.output.as_deref())
        }

        Commands::Resistance { regions, from, to, args } => {
            override_input(&mut config.files.resistance, &args)?;
            let request = ResistanceRequest {
                regions: if regions.is_empty() { None } else { Some(regions) },
                from,
                to,
            };
            let panel = Dashboard::new(config).resistance(&request)?;
            emit(&panel, args.output.as_deref())
        }

        Commands::Coinfection { year, args } => {
            override_input(&mut config.files.coinfection, &args)?;
            let panel = Dashboard::new(config).coinfection(&CoinfectionRequest { year })?;
            emit(&panel, args.output.as_deref())
        }

        Commands::Compare { output } => {
            let panel = Dashboard::new(config).comparison();
            emit(&panel, output.as_deref())
        }

        Commands::Countries { args } => {
            override_input(&mut config.files.coverage, &args)?;
            let countries = Dashboard::new(config).countries()?;
            emit(&countries, args.output.as_deref())
        }

        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            start_server(Dashboard::new(config), port).await?;
            Ok(())
        }
    }
}

/// Point one dataset at `--input`, relative to the working directory.
fn override_input(file: &mut PathBuf, args: &PanelArgs) -> CliResult {
    if let Some(input) = &args.input {
        *file = if input.is_absolute() {
            input.clone()
        } else {
            env::current_dir()?.join(input)
        };
    }
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> CliResult {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers().join(", "));
    eprintln!("✅ Parsed {} records", result.table.len());

    emit(&result.table, output)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> CliResult {
    let json = serde_json::to_string_pretty(value)?;
    write_output(&json, output)
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
