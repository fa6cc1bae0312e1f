//! WordPress site prober
//!
//! Detects the WordPress version from the homepage generator tag and probes
//! each configured plugin for its `readme.txt` stable tag.

use crate::criteria::Criteria;
use crate::error::{Error, Result};
use crate::version::{self, UNKNOWN_VERSION};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// User agent for requests (standard Chrome on Windows)
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";
const REFERER_VALUE: &str = "https://google.com";

/// Homepage request timeout in seconds
const ROOT_TIMEOUT_SECS: u64 = 10;

/// Plugin directory and readme request timeout in seconds
const PLUGIN_TIMEOUT_SECS: u64 = 5;

const PLUGINS_PATH: &str = "wp-content/plugins";
const README_FILE: &str = "readme.txt";
const STABLE_TAG_MARKER: &str = "Stable tag:";

/// Why the homepage could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Server answered with a non-success status
    #[error("HTTP error (status {0})")]
    Http(u16),

    /// Transport failure: DNS, connect, timeout, reset
    #[error("request error: {0}")]
    Request(String),

    /// Anything else reqwest reports
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ProbeError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode() {
            Self::Request(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http(status.as_u16())
        } else {
            Self::Unexpected(e.to_string())
        }
    }
}

/// Result of probing one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Probed origin
    pub url: String,
    /// WordPress version from the generator tag
    pub wordpress_version: Option<String>,
    /// Plugins whose declared version fell inside the configured range
    pub plugins: BTreeMap<String, String>,
    /// Homepage failure, if any
    pub root_error: Option<ProbeError>,
}

impl ScanResult {
    fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            wordpress_version: None,
            plugins: BTreeMap::new(),
            root_error: None,
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.plugins.is_empty()
    }

    /// WordPress version, or the `unknown` sentinel
    pub fn wordpress_version_or_unknown(&self) -> &str {
        self.wordpress_version.as_deref().unwrap_or(UNKNOWN_VERSION)
    }

    /// Matched plugins as `slug=version` pairs joined with `"; "`
    pub fn plugins_summary(&self) -> String {
        self.plugins
            .iter()
            .map(|(slug, version)| format!("{}={}", slug, version))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// WordPress site prober
#[derive(Debug, Clone)]
pub struct Scanner {
    client: Client,
    root_timeout: Duration,
    plugin_timeout: Duration,
}

/// Builder for configuring a Scanner with options
#[derive(Debug)]
pub struct ScannerBuilder {
    root_timeout: Duration,
    plugin_timeout: Duration,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self {
            root_timeout: Duration::from_secs(ROOT_TIMEOUT_SECS),
            plugin_timeout: Duration::from_secs(PLUGIN_TIMEOUT_SECS),
        }
    }
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for the homepage request
    pub fn root_timeout(mut self, timeout: Duration) -> Self {
        self.root_timeout = timeout;
        self
    }

    /// Timeout for each plugin directory and readme request
    pub fn plugin_timeout(mut self, timeout: Duration) -> Self {
        self.plugin_timeout = timeout;
        self
    }

    /// Build the Scanner with the configured options
    pub fn build(self) -> Result<Scanner> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Scanner {
            client,
            root_timeout: self.root_timeout,
            plugin_timeout: self.plugin_timeout,
        })
    }
}

impl Scanner {
    /// Create a scanner with the default timeouts
    pub fn new() -> Result<Self> {
        ScannerBuilder::new().build()
    }

    /// Create a builder for configuring scanner options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use wpscraper::Scanner;
    ///
    /// let scanner = Scanner::builder()
    ///     .plugin_timeout(Duration::from_secs(3))
    ///     .build()?;
    /// # Ok::<(), wpscraper::Error>(())
    /// ```
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    /// Probe a site for its WordPress version and vulnerable plugins
    ///
    /// Never fails. A homepage failure of any kind is recorded in
    /// [`ScanResult::root_error`] and leaves the result empty; plugin
    /// problems skip only that plugin.
    pub async fn scan(&self, origin: &Url, criteria: &Criteria) -> ScanResult {
        let base = origin.as_str().trim_end_matches('/');
        let mut result = ScanResult::empty(base);

        match self.fetch_root(origin).await {
            Ok(html) => {
                result.wordpress_version = detect_version_from_meta(&html);
                debug!(url = base, version = ?result.wordpress_version, "homepage fetched");
            }
            Err(e) => {
                info!(url = base, "homepage probe failed: {}", e);
                result.root_error = Some(e);
                return result;
            }
        }

        for (slug, range) in criteria {
            let Some(declared) = self.probe_plugin(base, slug).await else {
                continue;
            };

            if version::matches(slug, &declared, range) {
                info!(url = base, plugin = %slug, version = %declared, "plugin version in range");
                result.plugins.insert(slug.clone(), declared);
            } else {
                debug!(url = base, plugin = %slug, version = %declared, range = %range, "plugin version out of range");
            }
        }

        result
    }

    /// Fetch the homepage and return its HTML
    async fn fetch_root(&self, origin: &Url) -> std::result::Result<String, ProbeError> {
        let response = self
            .client
            .get(origin.as_str())
            .timeout(self.root_timeout)
            .send()
            .await
            .map_err(ProbeError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ProbeError::Http(response.status().as_u16()));
        }

        response.text().await.map_err(ProbeError::from_reqwest)
    }

    /// Declared version of a plugin, or None if the plugin was not detected
    async fn probe_plugin(&self, base: &str, slug: &str) -> Option<String> {
        let plugin_url = format!("{}/{}/{}/", base, PLUGINS_PATH, slug);
        if !self.plugin_present(&plugin_url).await? {
            return None;
        }

        let readme_url = format!("{}{}", plugin_url, README_FILE);
        let response = self.get(&readme_url).await?;
        if response.status() != StatusCode::OK {
            debug!(url = %readme_url, status = response.status().as_u16(), "readme unavailable");
            return None;
        }

        match response.text().await {
            Ok(text) => Some(extract_stable_tag(&text)),
            Err(e) => {
                debug!(url = %readme_url, "failed to read readme: {}", e);
                None
            }
        }
    }

    /// Whether a GET returns exactly 200; None on transport failure
    async fn plugin_present(&self, url: &str) -> Option<bool> {
        let response = self.get(url).await?;
        let found = response.status() == StatusCode::OK;
        debug!(url, status = response.status().as_u16(), found, "plugin directory probed");
        Some(found)
    }

    async fn get(&self, url: &str) -> Option<reqwest::Response> {
        match self
            .client
            .get(url)
            .timeout(self.plugin_timeout)
            .send()
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(url, "plugin request failed: {}", e);
                None
            }
        }
    }
}

/// Detect version from the meta generator tag
///
/// Takes the last whitespace-separated token of the first generator whose
/// content mentions WordPress.
pub fn detect_version_from_meta(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta[name='generator']").ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .find(|content| content.contains("WordPress"))
        .and_then(|content| content.split_whitespace().last())
        .map(str::to_string)
}

/// Extract the `Stable tag:` value from a readme, or the `unknown` sentinel
pub fn extract_stable_tag(readme: &str) -> String {
    readme
        .lines()
        .find(|line| line.contains(STABLE_TAG_MARKER))
        .and_then(|line| line.split(':').nth(1))
        .map(|tag| tag.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
