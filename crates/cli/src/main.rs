// gridrecon CLI - reconcile irregular stacked-header reports

mod exit_codes;
mod recon;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gridrecon_recon::TolerancePolicy;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gridrecon")]
#[command(about = "Reconcile stacked-header financial reports across versions")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - suppress the stderr summary and warnings
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two or more report versions (the first is the baseline)
    #[command(after_help = "\
Examples:
  gridrecon compare rates_v1.csv rates_v2.csv
  gridrecon compare v1.xlsx v2.xlsx --sheet Rates --tolerance 0.5
  gridrecon compare a.csv b.csv --name baseline --name candidate --json
  gridrecon compare --config q3.recon.toml --html q3.html")]
    Compare {
        /// Report files; may be omitted when the config lists sources
        files: Vec<PathBuf>,

        /// TOML config (.recon.toml); flags override its settings
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Source name, once per file, in file order (default: file stem)
        #[arg(long = "name", value_name = "NAME")]
        names: Vec<String>,

        /// Worksheet to read from spreadsheet files (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Numeric tolerance threshold
        #[arg(long, env = "GRIDRECON_TOLERANCE")]
        tolerance: Option<f64>,

        /// Tolerance policy (absolute, relative, truncate)
        #[arg(long, env = "GRIDRECON_POLICY")]
        policy: Option<TolerancePolicy>,

        /// Keep the last occurrence of a duplicate key instead of the first
        #[arg(long)]
        keep_last: bool,

        /// Exit 3 when any source contains duplicate keys
        #[arg(long)]
        strict_duplicates: bool,

        /// Print the JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write an HTML report to a file
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Show the inferred layout and record stream of one report
    #[command(after_help = "\
Examples:
  gridrecon extract rates_v1.csv
  gridrecon extract rates.xlsx --sheet Rates --section-row 0 --json")]
    Extract {
        /// Report file
        file: PathBuf,

        /// Worksheet to read from spreadsheet files (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Print layout and records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  gridrecon validate q3.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

/// Layout overrides shared by `compare` and `extract`.
#[derive(Args, Debug, Default)]
pub struct LayoutArgs {
    /// Row holding section labels (0-indexed, as in the config file)
    #[arg(long)]
    section_row: Option<usize>,

    /// Number of header rows above the data
    #[arg(long)]
    header_rows: Option<usize>,

    /// Blank columns that separate two sections
    #[arg(long)]
    min_blank_sep: Option<usize>,

    /// Rows scanned when detecting the header
    #[arg(long)]
    max_header_scan: Option<usize>,

    /// Treat MM/YY-MM/YY header tokens as plain text
    #[arg(long)]
    no_date_window: bool,

    /// Do not collect columns outside any section under "Standalone"
    #[arg(long)]
    no_standalone: bool,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  gridrecon-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  gridrecon-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG refines the flag-derived level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Compare {
            files,
            config,
            names,
            sheet,
            layout,
            tolerance,
            policy,
            keep_last,
            strict_duplicates,
            json,
            output,
            html,
        } => recon::cmd_compare(recon::CompareOptions {
            files,
            config,
            names,
            sheet,
            layout,
            tolerance,
            policy,
            keep_last,
            strict_duplicates,
            json,
            output,
            html,
            quiet: cli.quiet,
        }),
        Commands::Extract {
            file,
            sheet,
            layout,
            json,
        } => recon::cmd_extract(file, sheet, layout, json),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
