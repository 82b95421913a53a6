//! Legacy slug → canonical slug remapping.

use std::collections::BTreeMap;

/// A pluggable slug remapping table, loaded from `[redirects.*]` config.
#[derive(Debug, Clone, Default)]
pub struct SlugRedirects {
    map: BTreeMap<String, String>,
}

impl SlugRedirects {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }

    /// Canonical slug for `slug`, if `slug` is a legacy alias of something else.
    pub fn resolve(&self, slug: &str) -> Option<&str> {
        self.map
            .get(slug)
            .map(String::as_str)
            .filter(|canonical| *canonical != slug)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl From<BTreeMap<String, String>> for SlugRedirects {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::new(map)
    }
}
