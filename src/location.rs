//! Normalized navigation location
//!
//! A [`Location`] always has a pathname starting with `/`, a search that is empty or starts
//! with `?`, and a hash that is empty or starts with `#`. Every constructor normalizes, so two
//! locations that point at the same place compare equal.

use crate::query::{ParsedQuery, QueryStringOptions};
use std::fmt;

/// The `(pathname, search, hash)` triple of a navigation position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Path, always starting with `/`
    pub pathname: String,
    /// Query part including `?`, or empty
    pub search: String,
    /// Fragment including `#`, or empty
    pub hash: String,
}

impl Location {
    /// Create a location, normalizing every part
    pub fn new(
        pathname: impl Into<String>,
        search: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            pathname: normalize_pathname(pathname.into()),
            search: normalize_prefixed(search.into(), '?'),
            hash: normalize_prefixed(hash.into(), '#'),
        }
    }

    /// Split a `path?query#hash` string
    ///
    /// # Example
    ///
    /// ```
    /// use url_state_sync::Location;
    ///
    /// let location = Location::from_url("/search?q=rust#results");
    /// assert_eq!(location.pathname, "/search");
    /// assert_eq!(location.search, "?q=rust");
    /// assert_eq!(location.hash, "#results");
    /// ```
    pub fn from_url(url: &str) -> Self {
        let (rest, hash) = match url.find('#') {
            Some(index) => url.split_at(index),
            None => (url, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };
        Self::new(pathname, search, hash)
    }

    /// A copy of this location with another pathname
    pub fn with_pathname(&self, pathname: impl Into<String>) -> Self {
        Self::new(pathname, self.search.clone(), self.hash.clone())
    }

    /// A copy of this location with another search
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self::new(self.pathname.clone(), search, self.hash.clone())
    }

    /// Parse the search part
    pub fn query(&self, options: &QueryStringOptions) -> ParsedQuery {
        ParsedQuery::parse(&self.search, options)
    }

    /// `pathname` followed by `search`, the part reverse routes are compared against
    pub fn path_and_search(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }

    /// Full path as written to history
    pub fn to_path(&self) -> String {
        build_path(self)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/", "", "")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&build_path(self))
    }
}

/// Concatenate pathname, search and hash
///
/// Search is skipped when empty or just `?`, hash when empty or just `#`; a missing leading
/// `?` or `#` is added.
pub fn build_path(location: &Location) -> String {
    let mut path = if location.pathname.is_empty() {
        "/".to_string()
    } else {
        location.pathname.clone()
    };

    let search = location.search.as_str();
    if !search.is_empty() && search != "?" {
        if !search.starts_with('?') {
            path.push('?');
        }
        path.push_str(search);
    }

    let hash = location.hash.as_str();
    if !hash.is_empty() && hash != "#" {
        if !hash.starts_with('#') {
            path.push('#');
        }
        path.push_str(hash);
    }

    path
}

fn normalize_pathname(pathname: String) -> String {
    if pathname.starts_with('/') {
        pathname
    } else {
        format!("/{}", pathname)
    }
}

fn normalize_prefixed(part: String, prefix: char) -> String {
    if part.is_empty() || part.chars().eq(std::iter::once(prefix)) {
        String::new()
    } else if part.starts_with(prefix) {
        part
    } else {
        format!("{}{}", prefix, part)
    }
}
