//! Engine configuration
//!
//! Routes, query bindings and reverse routes are declared in "routes space". When the app is
//! not served from the root the window pathname differs, and the two path transforms translate
//! between the spaces.

use crate::query::QueryStringOptions;
use std::fmt;
use std::rc::Rc;

/// A pathname translation
pub type PathTransform = Rc<dyn Fn(&str) -> String>;

/// Configuration for a [`SyncEngine`](crate::SyncEngine)
///
/// # Example
///
/// ```
/// use url_state_sync::{ArrayFormat, QueryStringOptions, SyncConfig};
///
/// let config = SyncConfig::new()
///     .base_path("/app")
///     .query_string_options(QueryStringOptions::new().array_format(ArrayFormat::Bracket));
///
/// assert_eq!(config.to_window("/pages/first"), "/app/pages/first");
/// assert_eq!(config.to_routes("/app/pages/first"), "/pages/first");
/// ```
#[derive(Clone)]
pub struct SyncConfig {
    path_from_routes_to_window: PathTransform,
    path_from_window_to_routes: PathTransform,
    query_string_options: QueryStringOptions,
}

impl SyncConfig {
    /// Identity transforms and default query string options
    pub fn new() -> Self {
        Self {
            path_from_routes_to_window: Rc::new(str::to_string),
            path_from_window_to_routes: Rc::new(str::to_string),
            query_string_options: QueryStringOptions::default(),
        }
    }

    /// Transform applied to a routes pathname before it is written to history
    pub fn path_from_routes_to_window<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.path_from_routes_to_window = Rc::new(transform);
        self
    }

    /// Transform applied to an observed pathname before routes see it
    pub fn path_from_window_to_routes<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.path_from_window_to_routes = Rc::new(transform);
        self
    }

    /// Serve the app under `prefix`, installing both transforms
    ///
    /// Window pathnames outside the prefix reach routes unchanged. Pathnames are decoded before
    /// the prefix is stripped, so give it unescaped (`/my app`, not `/my%20app`).
    pub fn base_path(self, prefix: &str) -> Self {
        let prefix = normalize_prefix(prefix);
        if prefix.is_empty() {
            return self;
        }

        let outgoing = prefix.clone();
        self.path_from_routes_to_window(move |path| {
            if path == "/" {
                outgoing.clone()
            } else {
                format!("{}{}", outgoing, path)
            }
        })
        .path_from_window_to_routes(move |path| match path.strip_prefix(prefix.as_str()) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => path.to_string(),
        })
    }

    /// Options passed to every query parse and stringify
    pub fn query_string_options(mut self, options: QueryStringOptions) -> Self {
        self.query_string_options = options;
        self
    }

    /// Translate a routes pathname to a window pathname
    pub fn to_window(&self, path: &str) -> String {
        (self.path_from_routes_to_window)(path)
    }

    /// Translate a window pathname to a routes pathname
    pub fn to_routes(&self, path: &str) -> String {
        (self.path_from_window_to_routes)(path)
    }

    /// Query string options in use
    pub fn query_options(&self) -> &QueryStringOptions {
        &self.query_string_options
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("query_string_options", &self.query_string_options)
            .finish_non_exhaustive()
    }
}

/// `app/` → `/app`; `/` and empty stay empty
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
