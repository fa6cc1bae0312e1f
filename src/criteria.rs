//! Plugin criteria loading
//!
//! The criteria file lists one plugin per line together with the version
//! range considered vulnerable:
//!
//! ```text
//! # slug; min[ - max]
//! akismet; 4.0 - 4.2
//! contact-form-7; 5.3.1
//! ```

use crate::error::{Error, Result};
use crate::version::VersionRange;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Default criteria file name, looked up in the working directory
pub const DEFAULT_CRITERIA_FILE: &str = "plugins.txt";

/// Loaded set of plugin slugs and their vulnerable version ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    plugins: BTreeMap<String, VersionRange>,
}

impl Criteria {
    /// Load criteria from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::CriteriaNotFound(path.to_path_buf()),
            _ => Error::CriteriaRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let criteria = Self::parse(&content)?;
        info!(path = %path.display(), plugins = criteria.len(), "loaded plugin criteria");
        Ok(criteria)
    }

    /// Parse criteria from text
    pub fn parse(content: &str) -> Result<Self> {
        let mut plugins = BTreeMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (slug, range) = parse_line(line).ok_or_else(|| Error::MalformedCriteria {
                line: idx + 1,
                content: line.to_string(),
            })?;

            if let Some(previous) = plugins.insert(slug.to_string(), range) {
                debug!(plugin = slug, replaced = %previous, "duplicate criteria entry");
            }
        }

        Ok(Self { plugins })
    }

    /// Range configured for a plugin slug
    pub fn get(&self, slug: &str) -> Option<&VersionRange> {
        self.plugins.get(slug)
    }

    /// Iterate over slugs and ranges, ordered by slug
    pub fn iter(&self) -> btree_map::Iter<'_, String, VersionRange> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl FromIterator<(String, VersionRange)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (String, VersionRange)>>(iter: I) -> Self {
        Self {
            plugins: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = (&'a String, &'a VersionRange);
    type IntoIter = btree_map::Iter<'a, String, VersionRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Split `slug; min[ - max]` into its parts
fn parse_line(line: &str) -> Option<(&str, VersionRange)> {
    let (slug, range) = line.split_once(';')?;
    if range.contains(';') {
        return None;
    }

    let slug = slug.trim();
    let range = range.trim();
    if slug.is_empty() || range.is_empty() {
        return None;
    }

    let range = match range.split_once('-') {
        Some((min, max)) => VersionRange::new(min.trim(), max.trim()),
        None => VersionRange::exact(range),
    };

    Some((slug, range))
}
