//! Console reporting and CSV output for scan results

use crate::error::{Error, Result};
use crate::scanner::{ProbeError, ScanResult};
use colored::Colorize;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const BANNER: &str = r#"
__      ___ __  ___  ___ _ __ __ _ _ __   ___ _ __
\ \ /\ / / '_ \/ __|/ __| '__/ _` | '_ \ / _ \ '__|
 \ V  V /| |_) \__ \ (__| | | (_| | |_) |  __/ |
  \_/\_/ | .__/|___/\___|_|  \__,_| .__/ \___|_|
         | |                      | |
         |_|                      |_|"#;

/// CSV header columns
const CSV_HEADER: [&str; 3] = ["url", "wordpress_version", "plugins"];

/// `[+]` line prefix
fn prefix() -> String {
    format!(
        "{}{}{}",
        "[".bright_black().bold(),
        "+".bright_blue(),
        "]".bright_black().bold()
    )
}

/// `[!]` line prefix
fn prefix_err() -> String {
    format!(
        "{}{}{}",
        "[".bright_black().bold(),
        "!".bright_red(),
        "]".bright_black().bold()
    )
}

/// Print the banner
pub fn print_banner<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", BANNER.cyan()).map_err(Error::OutputFailed)?;
    writeln!(writer, "{}", "Made by Dovydas".magenta()).map_err(Error::OutputFailed)?;
    writeln!(writer).map_err(Error::OutputFailed)
}

/// Console reporter for scan progress and matches
#[derive(Debug)]
pub struct Reporter<W: Write> {
    writer: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the reporter, returning the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn checking(&mut self, url: &str) -> Result<()> {
        writeln!(self.writer, "{} Checking {}", prefix(), url).map_err(Error::OutputFailed)
    }

    /// Report a homepage failure
    pub fn probe_failed(&mut self, url: &str, error: &ProbeError) -> Result<()> {
        let line = match error {
            ProbeError::Http(status) => format!("HTTP error accessing {} (status {})", url, status),
            ProbeError::Request(_) => format!("Request error accessing {}", url),
            ProbeError::Unexpected(msg) => format!("Unexpected error for {}: {}", url, msg),
        };
        writeln!(self.writer, "{} {}", prefix_err(), line).map_err(Error::OutputFailed)
    }

    pub fn invalid_target(&mut self, target: &str, error: &Error) -> Result<()> {
        writeln!(self.writer, "{} Skipping '{}': {}", prefix_err(), target, error)
            .map_err(Error::OutputFailed)
    }

    /// Report the WordPress version and matched plugins of a result
    pub fn matches(&mut self, result: &ScanResult) -> Result<()> {
        let version_line = match &result.wordpress_version {
            Some(version) => writeln!(
                self.writer,
                "{} WordPress version for {}: {}",
                prefix(),
                result.url,
                version
            ),
            None => writeln!(
                self.writer,
                "{} Couldn't find the wordpress version.",
                prefix_err()
            ),
        };
        version_line.map_err(Error::OutputFailed)?;

        writeln!(
            self.writer,
            "{} Plugins for {}: {}",
            prefix(),
            result.url,
            result.plugins_summary()
        )
        .map_err(Error::OutputFailed)
    }
}

/// One CSV row
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    wordpress_version: &'a str,
    plugins: String,
}

/// Append-only CSV file holding one row per site with matched plugins
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    /// Open `path` in append mode, writing the header if the file is empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(Error::OutputFailed)?;
        let is_empty = file.metadata().map_err(Error::OutputFailed)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(CSV_HEADER)?;
            writer.flush().map_err(Error::OutputFailed)?;
            debug!(path = %path.display(), "wrote CSV header");
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    /// Append a row for a scan result
    ///
    /// An undetected WordPress version is written as an empty field.
    pub fn write(&mut self, result: &ScanResult) -> Result<()> {
        self.writer.serialize(CsvRow {
            url: &result.url,
            wordpress_version: result.wordpress_version.as_deref().unwrap_or(""),
            plugins: result.plugins_summary(),
        })?;
        self.writer.flush().map_err(Error::OutputFailed)?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written through this sink
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file
    pub fn close(mut self) -> Result<()> {
        self.writer.flush().map_err(Error::OutputFailed)
    }
}
