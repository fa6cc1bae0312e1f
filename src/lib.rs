//! wpscraper - WordPress plugin vulnerability scanner
//!
//! Detects the WordPress version of a site and probes a list of plugins,
//! reporting those whose declared version falls in a vulnerable range.
//!
//! # Example
//!
//! ```no_run
//! use wpscraper::{Criteria, Scanner, runner::normalize_target};
//!
//! #[tokio::main]
//! async fn main() -> wpscraper::Result<()> {
//!     let criteria = Criteria::parse("akismet; 4.0 - 4.2")?;
//!     let scanner = Scanner::new()?;
//!     let origin = normalize_target("example.com")?;
//!     let result = scanner.scan(&origin, &criteria).await;
//!     println!("WordPress: {}", result.wordpress_version_or_unknown());
//!     println!("Plugins: {}", result.plugins_summary());
//!     Ok(())
//! }
//! ```

pub mod criteria;
pub mod error;
pub mod output;
pub mod runner;
pub mod scanner;
pub mod version;

pub use criteria::Criteria;
pub use error::{Error, Result};
pub use output::{CsvSink, Reporter};
pub use runner::{RunSummary, ScanConfig, Target, run};
pub use scanner::{ProbeError, ScanResult, Scanner, ScannerBuilder};
pub use version::{UNKNOWN_VERSION, VersionRange, in_range};
