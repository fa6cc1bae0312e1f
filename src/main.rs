//! wpscraper CLI - check WordPress versions and plugins for given domains

use clap::{ArgAction, CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use wpscraper::{ScanConfig, Target, criteria::DEFAULT_CRITERIA_FILE};

/// Check WordPress versions and plugins for given domains.
#[derive(Parser, Debug)]
#[command(name = "wpscraper")]
#[command(version, about, long_about = None)]
struct Args {
    /// Save output to a CSV file (appended to if it exists)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Input file with one domain per line
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Single domain to check
    #[arg(short = 'd', long = "domain")]
    domain: Option<String>,

    /// Plugin criteria file (`slug; min - max` per line)
    #[arg(short = 'c', long = "criteria", default_value = DEFAULT_CRITERIA_FILE)]
    criteria: PathBuf,

    /// Seconds to wait between domains of a list
    #[arg(long = "delay", default_value_t = 1)]
    delay: u64,

    /// Do not print the banner
    #[arg(long = "no-banner")]
    no_banner: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn has_work(&self) -> bool {
        self.output.is_some() || self.file.is_some() || self.domain.is_some()
    }

    fn into_config(self) -> ScanConfig {
        // A single domain wins over a list when both are given
        let target = match (self.domain, self.file) {
            (Some(domain), _) => Some(Target::Domain(domain)),
            (None, Some(file)) => Some(Target::DomainList(file)),
            (None, None) => None,
        };

        ScanConfig {
            criteria_path: self.criteria,
            output: self.output,
            target,
            delay: Duration::from_secs(self.delay),
            banner: !self.no_banner,
            ..ScanConfig::default()
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wpscraper={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if !args.has_work() {
        // Nothing to scan and nowhere to write: show help and exit cleanly
        if let Err(e) = Args::command().print_help() {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        println!();
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);
    let config = args.into_config();

    match wpscraper::run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
