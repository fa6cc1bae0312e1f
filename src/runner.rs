//! Scan orchestration over one domain or a domain list

use crate::criteria::{Criteria, DEFAULT_CRITERIA_FILE};
use crate::error::{Error, Result};
use crate::output::{CsvSink, Reporter, print_banner};
use crate::scanner::Scanner;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Allowed URL schemes
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Pause between consecutive domains of a list
const DEFAULT_DELAY_SECS: u64 = 1;

/// What to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single domain, with or without scheme
    Domain(String),
    /// File with one domain per line
    DomainList(PathBuf),
}

/// Run configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Criteria file with vulnerable plugin ranges
    pub criteria_path: PathBuf,
    /// CSV file results are appended to
    pub output: Option<PathBuf>,
    /// Domains to scan; nothing is scanned when unset
    pub target: Option<Target>,
    /// Pause between consecutive domains
    pub delay: Duration,
    /// Homepage request timeout
    pub root_timeout: Duration,
    /// Plugin directory and readme request timeout
    pub plugin_timeout: Duration,
    /// Print the banner before scanning
    pub banner: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            criteria_path: PathBuf::from(DEFAULT_CRITERIA_FILE),
            output: None,
            target: None,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            root_timeout: Duration::from_secs(10),
            plugin_timeout: Duration::from_secs(5),
            banner: true,
        }
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Domains probed
    pub scanned: usize,
    /// Domains skipped because they did not form a valid URL
    pub skipped: usize,
    /// Domains with at least one plugin in range
    pub matched: usize,
    /// Rows appended to the CSV file
    pub rows_written: usize,
}

/// Turn a domain into a probe origin
///
/// Bare domains get `https://`. Input that already carries a scheme is kept
/// as is, but only http and https are accepted.
pub fn normalize_target(domain: &str) -> Result<Url> {
    let domain = domain.trim();
    let with_scheme = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| Error::InvalidUrl(format!("'{}': {}", domain, e)))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::InvalidUrl(format!(
            "scheme '{}' not allowed (use http or https)",
            url.scheme()
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidUrl("missing host".to_string()));
    }

    Ok(url)
}

/// Read a domain list, skipping blank lines
pub fn read_domain_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::DomainList {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Run a scan, reporting to stdout
pub async fn run(config: &ScanConfig) -> Result<RunSummary> {
    run_with(config, std::io::stdout()).await
}

/// Run a scan, reporting to the given writer
///
/// Only startup steps can fail: loading criteria, opening the CSV file and
/// reading the domain list. Per-domain problems are reported and skipped,
/// and a failed report line is logged rather than ending the run.
pub async fn run_with<W: Write>(config: &ScanConfig, mut writer: W) -> Result<RunSummary> {
    if config.banner {
        print_banner(&mut writer)?;
    }

    let criteria = Criteria::load(&config.criteria_path)?;
    let mut sink = config.output.as_ref().map(CsvSink::open).transpose()?;

    let domains = match &config.target {
        Some(Target::Domain(domain)) => vec![domain.clone()],
        Some(Target::DomainList(path)) => read_domain_list(path)?,
        None => {
            warn!("no domain or domain list given, nothing to scan");
            Vec::new()
        }
    };

    let scanner = Scanner::builder()
        .root_timeout(config.root_timeout)
        .plugin_timeout(config.plugin_timeout)
        .build()?;

    let mut reporter = Reporter::new(writer);
    let mut summary = RunSummary::default();

    for (idx, domain) in domains.iter().enumerate() {
        if idx > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        scan_domain(
            &scanner,
            &criteria,
            domain,
            &mut reporter,
            sink.as_mut(),
            &mut summary,
        )
        .await;
    }

    if let Some(sink) = sink {
        debug!(path = %sink.path().display(), rows = sink.rows(), "closing CSV output");
        sink.close()?;
    }

    info!(
        scanned = summary.scanned,
        matched = summary.matched,
        skipped = summary.skipped,
        "scan finished"
    );
    Ok(summary)
}

async fn scan_domain<W: Write>(
    scanner: &Scanner,
    criteria: &Criteria,
    domain: &str,
    reporter: &mut Reporter<W>,
    sink: Option<&mut CsvSink>,
    summary: &mut RunSummary,
) {
    let origin = match normalize_target(domain) {
        Ok(origin) => origin,
        Err(e) => {
            summary.skipped += 1;
            report(reporter.invalid_target(domain, &e));
            return;
        }
    };
    let url = origin.as_str().trim_end_matches('/');

    report(reporter.checking(url));
    let result = scanner.scan(&origin, criteria).await;
    summary.scanned += 1;

    if let Some(error) = &result.root_error {
        report(reporter.probe_failed(&result.url, error));
    }

    if !result.has_matches() {
        debug!(url = %result.url, wordpress = ?result.wordpress_version, "no plugins in range");
        return;
    }

    summary.matched += 1;
    if let Some(sink) = sink {
        match sink.write(&result) {
            Ok(()) => summary.rows_written += 1,
            Err(e) => warn!(url = %result.url, path = %sink.path().display(), "failed to write CSV row: {}", e),
        }
    }
    report(reporter.matches(&result));
}

/// Log a failed console write; the scan carries on
fn report(outcome: Result<()>) {
    if let Err(e) = outcome {
        warn!("failed to write report line: {}", e);
    }
}
