//! Screen registration record
//!
//! A [`ScreenSync`] gathers everything one screen contributes to URL synchronization so it can
//! be mounted, and later unmounted, in one step.

use crate::query_sync::QuerySync;
use crate::route::{ReverseRouteMap, RouteMap};
use std::fmt;

/// Routes, reverse routes and query bindings of one screen
///
/// # Example
///
/// ```
/// use url_state_sync::{QuerySync, ReverseRouteMap, RouteMap, ScreenSync};
///
/// #[derive(Clone, PartialEq)]
/// struct State {
///     page: String,
///     sort: String,
/// }
///
/// enum Action {
///     OpenPage(String),
/// }
///
/// let screen: ScreenSync<State, Action> = ScreenSync::new("pages")
///     .routes(RouteMap::new().route("/pages/:page", |params| {
///         params.get_owned("page").map(Action::OpenPage)
///     }))
///     .reverse(ReverseRouteMap::new().map(|action: &Action| match action {
///         Action::OpenPage(page) => Some(format!("/pages/{}", page)),
///     }))
///     .query(QuerySync::new("sort", "/pages/:page").value(
///         |state: &State| state.sort.clone(),
///         "name".to_string(),
///         String::clone,
///     ));
///
/// assert_eq!(screen.name(), "pages");
/// ```
pub struct ScreenSync<S, A> {
    pub(crate) name: String,
    pub(crate) routes: RouteMap<A>,
    pub(crate) reverse: ReverseRouteMap<A>,
    pub(crate) query: Vec<QuerySync<S, A>>,
}

impl<S, A> ScreenSync<S, A> {
    /// Create an empty record; the name only shows up in logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: RouteMap::new(),
            reverse: ReverseRouteMap::new(),
            query: Vec::new(),
        }
    }

    /// Set the screen's routes
    pub fn routes(mut self, routes: RouteMap<A>) -> Self {
        self.routes = routes;
        self
    }

    /// Set the screen's reverse routes
    pub fn reverse(mut self, reverse: ReverseRouteMap<A>) -> Self {
        self.reverse = reverse;
        self
    }

    /// Add a query binding
    pub fn query(mut self, sync: QuerySync<S, A>) -> Self {
        self.query.push(sync);
        self
    }

    /// Screen name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S, A> fmt::Debug for ScreenSync<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenSync")
            .field("name", &self.name)
            .field("routes", &self.routes)
            .field("reverse", &self.reverse)
            .field("query", &self.query)
            .finish()
    }
}
