//! Version range matching
//!
//! Versions are dot-separated non-negative integers. Operands of differing
//! depth are right-padded with zeros before comparison, so `1.2` and `1.2.0`
//! are equal.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use tracing::debug;

/// Placeholder for a version that could not be determined
pub const UNKNOWN_VERSION: &str = "unknown";

/// Closed version range `[min, max]` as written in the criteria file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: String,
    pub max: String,
}

impl VersionRange {
    /// Create a range from its two bounds
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Range covering exactly one version
    pub fn exact(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            min: version.clone(),
            max: version,
        }
    }

    /// Check whether `version` falls inside this range
    pub fn contains(&self, version: &str) -> Result<bool> {
        in_range(version, &self.min, &self.max)
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} - {}", self.min, self.max)
        }
    }
}

/// Returns whether the sentinel for "no version" was given
pub fn is_unknown(version: &str) -> bool {
    version.trim().eq_ignore_ascii_case(UNKNOWN_VERSION)
}

fn parse_version(version: &str) -> Result<Vec<u64>> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidVersionFormat(version.to_string()));
    }

    trimmed
        .split('.')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| Error::InvalidVersionFormat(version.to_string()))
        })
        .collect()
}

/// Compare two zero-padded component lists
fn compare_padded(a: &[u64], b: &[u64], len: usize) -> Ordering {
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Check whether `version` lies in the closed range `[min, max]`
///
/// The `unknown` sentinel is never in range. Any operand with a non-integer
/// component yields [`Error::InvalidVersionFormat`].
pub fn in_range(version: &str, min: &str, max: &str) -> Result<bool> {
    if is_unknown(version) {
        return Ok(false);
    }

    let version_parts = parse_version(version)?;
    let min_parts = parse_version(min)?;
    let max_parts = parse_version(max)?;

    let len = version_parts
        .len()
        .max(min_parts.len())
        .max(max_parts.len());

    Ok(compare_padded(&min_parts, &version_parts, len) != Ordering::Greater
        && compare_padded(&version_parts, &max_parts, len) != Ordering::Greater)
}

/// Like [`VersionRange::contains`], but malformed versions count as no match
pub fn matches(slug: &str, version: &str, range: &VersionRange) -> bool {
    match range.contains(version) {
        Ok(matched) => matched,
        Err(e) => {
            debug!(plugin = slug, range = %range, "treating plugin as undetected: {}", e);
            false
        }
    }
}
