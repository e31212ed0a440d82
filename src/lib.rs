//! # url-state-sync
//!
//! Keeps a browser-style location (pathname, search, hash) and an application store in a
//! two-way binding that never feeds back on itself:
//!
//! - **Routes** - a location dispatches the actions of the first matching route template
//! - **Reverse routes** - an action navigates to the path it maps to
//! - **Query sync** - state values are mirrored into query keys, and changed query keys dispatch
//!   actions, with per-key push/replace semantics
//! - **Loop suppression** - actions dispatched while applying a location never write back
//!
//! # Quick Start
//!
//! ```
//! use url_state_sync::*;
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct State {
//!     page: Option<String>,
//! }
//!
//! #[derive(Debug)]
//! enum Action {
//!     Open(String),
//! }
//!
//! let store = ReducerStore::new(State::default(), |state: &mut State, action| match action {
//!     Action::Open(page) => state.page = Some(page),
//! });
//! let mut engine = SyncEngine::new(store, MemoryHistory::new("/pages/intro"));
//!
//! engine
//!     .mount(
//!         ScreenSync::new("pages")
//!             .routes(RouteMap::new().route("/pages/:page", |params| {
//!                 params.get_owned("page").map(Action::Open)
//!             }))
//!             .reverse(ReverseRouteMap::new().map(|action: &Action| match action {
//!                 Action::Open(page) => Some(format!("/pages/{}", page)),
//!             })),
//!     )
//!     .unwrap();
//!
//! // The location the engine started on was applied when the screen mounted
//! assert_eq!(engine.state().page.as_deref(), Some("intro"));
//!
//! // Dispatching an action with a reverse route navigates
//! engine.dispatch(Action::Open("guide".into())).unwrap();
//! assert_eq!(engine.history().current_path(), "/pages/guide");
//! ```
//!
//! # Route Templates
//!
//! `/pages/:page`, `/url(/:opt1)(/:opt2)`, `/files/*` - see [`matcher`].
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for route resolution

#![doc(html_root_url = "https://docs.rs/url-state-sync/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Location model
pub mod history;
pub mod location;
pub mod query;

// Matching
pub mod matcher;
pub mod params;
pub mod route;

// Synchronization
pub mod config;
pub mod context;
pub mod engine;
pub mod query_sync;
pub mod screen;
pub mod store;

// Error handling
pub mod error;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, CachedResolution, ResolveCache};
pub use config::{PathTransform, SyncConfig};
pub use context::SyncContext;
pub use engine::{Dispatched, HistoryWrite, LocationApplied, SyncEngine};
pub use error::{PatternError, SyncError};
pub use history::{
    HistoryEntry, HistoryEvent, HistorySink, HistoryState, LocationSource, MemoryHistory,
    NoopHistory,
};
pub use location::{build_path, Location};
pub use matcher::{RoutePattern, Segment, WILDCARD_PARAM};
pub use params::RouteParams;
pub use query::{ArrayFormat, ParsedQuery, QueryStringOptions, QueryValue};
pub use query_sync::{
    DerivedQuery, QueryActionBinding, QueryActionTable, QueryBinding, QueryBindingTable,
    QuerySync,
};
pub use route::{
    ReverseRouteMap, ReverseRoutes, RouteEntry, RouteHandler, RouteMap, RouteMatch, RouteTable,
};
pub use screen::ScreenSync;
pub use store::{ReducerStore, Store};

use std::fmt;

/// Handle returned by every registration
///
/// Pass it to [`SyncEngine::unregister`] to remove everything the registration contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub(crate) u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a navigation writes to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Add a new entry
    Push,
    /// Overwrite the current entry
    Replace,
}

/// How a location was reached.
///
/// Reported with every applied location; [`NavigationDirection::Pop`] covers back and forward
/// traversal alike, as a browser does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    /// Navigating to a new entry
    Push,
    /// Replacing the current entry
    Replace,
    /// Traversing history (back/forward)
    Pop,
    /// Replaying the current location for a freshly mounted screen
    Initial,
}

impl From<NavigationMode> for NavigationDirection {
    fn from(mode: NavigationMode) -> Self {
        match mode {
            NavigationMode::Push => NavigationDirection::Push,
            NavigationMode::Replace => NavigationDirection::Replace,
        }
    }
}

/// Kind of committed store transition reported to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionSignal {
    /// An ordinary transition; writes back only if the state or page changed
    #[default]
    Committed,
    /// Write the query back even if nothing changed
    ForceQuerySync,
}
