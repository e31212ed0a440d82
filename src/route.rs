//! Route table and reverse routes
//!
//! A [`RouteTable`] maps pathnames to actions: entries are tried in registration order and the
//! first pattern that matches wins. Nothing is reported when no entry matches.
//!
//! [`ReverseRoutes`] go the other way: each mapping looks at a dispatched action and may
//! return the path that action should navigate to.

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, CachedResolution, ResolveCache};
use crate::error::PatternError;
use crate::matcher::RoutePattern;
use crate::{trace_log, RegistrationId, RouteParams};
use std::fmt;

/// Handler producing the actions for a matched route
pub type RouteHandler<A> = Box<dyn Fn(&RouteParams) -> Vec<A>>;

/// Mapping from an action to the path it navigates to
pub type ReverseMapping<A> = Box<dyn Fn(&A) -> Option<String>>;

// ============================================================================
// RouteMap / ReverseRouteMap
// ============================================================================

/// Ordered `template → handler` mapping, as declared by one screen
///
/// # Example
///
/// ```
/// use url_state_sync::RouteMap;
///
/// enum Action {
///     First,
///     Page(String),
/// }
///
/// let routes: RouteMap<Action> = RouteMap::new()
///     .route("/pages/first", |_| Some(Action::First))
///     .route("/pages/:page", |params| params.get_owned("page").map(Action::Page));
///
/// assert_eq!(routes.len(), 2);
/// ```
pub struct RouteMap<A> {
    routes: Vec<(String, RouteHandler<A>)>,
}

impl<A> RouteMap<A> {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route
    ///
    /// The handler may return any iterable of actions: `Option<A>`, `Vec<A>`, `[A; N]`...
    pub fn route<F, I>(mut self, template: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RouteParams) -> I + 'static,
        I: IntoIterator<Item = A>,
    {
        self.routes.push((
            template.into(),
            Box::new(move |params| handler(params).into_iter().collect()),
        ));
        self
    }

    /// Number of routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if no route was declared
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, RouteHandler<A>)> {
        self.routes
    }
}

impl<A> Default for RouteMap<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for RouteMap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|(template, _)| template))
            .finish()
    }
}

/// Ordered list of action → path mappings, as declared by one screen
///
/// A mapping returning `None` means the action does not navigate for that payload.
pub struct ReverseRouteMap<A> {
    mappings: Vec<ReverseMapping<A>>,
}

impl<A> ReverseRouteMap<A> {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    /// Add a mapping
    pub fn map<F>(mut self, mapping: F) -> Self
    where
        F: Fn(&A) -> Option<String> + 'static,
    {
        self.mappings.push(Box::new(mapping));
        self
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check if no mapping was declared
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub(crate) fn into_mappings(self) -> Vec<ReverseMapping<A>> {
        self.mappings
    }
}

impl<A> Default for ReverseRouteMap<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ReverseRouteMap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseRouteMap")
            .field("mappings", &self.mappings.len())
            .finish()
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// A registered route
pub struct RouteEntry<A> {
    /// Compiled template
    pub pattern: RoutePattern,
    /// Action producer
    pub handler: RouteHandler<A>,
    /// Registration that contributed this entry
    pub owner: RegistrationId,
}

impl<A> fmt::Debug for RouteEntry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern.template())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a pathname
#[derive(Debug)]
pub struct RouteMatch<'a, A> {
    /// The entry that matched
    pub entry: &'a RouteEntry<A>,
    /// Extracted parameters
    pub params: RouteParams,
}

impl<A> RouteMatch<'_, A> {
    /// Run the entry's handler with the extracted parameters
    pub fn actions(&self) -> Vec<A> {
        (self.entry.handler)(&self.params)
    }

    /// Template of the entry that matched
    pub fn template(&self) -> &str {
        self.entry.pattern.template()
    }
}

/// Ordered collection of routes from every mounted screen
pub struct RouteTable<A> {
    entries: Vec<RouteEntry<A>>,
    #[cfg(feature = "cache")]
    cache: ResolveCache,
}

impl<A> RouteTable<A> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            #[cfg(feature = "cache")]
            cache: ResolveCache::new(),
        }
    }

    /// Register a route at the end of the table
    ///
    /// Templates are not checked for uniqueness; register more specific templates first.
    pub fn register(
        &mut self,
        owner: RegistrationId,
        template: &str,
        handler: RouteHandler<A>,
    ) -> Result<(), PatternError> {
        let pattern = RoutePattern::compile(template)?;
        self.push(RouteEntry {
            pattern,
            handler,
            owner,
        });
        Ok(())
    }

    pub(crate) fn push(&mut self, entry: RouteEntry<A>) {
        trace_log!("Registering route '{}'", entry.pattern.template());
        self.entries.push(entry);
        self.invalidate();
    }

    /// Remove every entry a registration contributed, returning how many were removed
    pub fn remove_owner(&mut self, owner: RegistrationId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != owner);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.invalidate();
        }
        removed
    }

    /// Resolve a pathname to the first matching entry
    pub fn resolve(&mut self, pathname: &str) -> Option<RouteMatch<'_, A>> {
        let (index, params) = self.lookup(pathname)?;
        self.entries.get(index).map(|entry| RouteMatch { entry, params })
    }

    #[cfg(feature = "cache")]
    fn lookup(&mut self, pathname: &str) -> Option<(usize, RouteParams)> {
        if let Some(cached) = self.cache.get(pathname) {
            return cached.map(|CachedResolution { index, params }| (index, params));
        }

        let found = self.find(pathname, None);
        self.cache.insert(
            pathname.to_string(),
            found.as_ref().map(|(index, params)| CachedResolution {
                index: *index,
                params: params.clone(),
            }),
        );
        found
    }

    #[cfg(not(feature = "cache"))]
    fn lookup(&mut self, pathname: &str) -> Option<(usize, RouteParams)> {
        self.find(pathname, None)
    }

    /// Resolve a pathname among the entries of one registration only
    pub fn resolve_owned(
        &self,
        owner: RegistrationId,
        pathname: &str,
    ) -> Option<RouteMatch<'_, A>> {
        let (index, params) = self.find(pathname, Some(owner))?;
        self.entries.get(index).map(|entry| RouteMatch { entry, params })
    }

    fn find(&self, pathname: &str, owner: Option<RegistrationId>) -> Option<(usize, RouteParams)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| owner.map_or(true, |owner| entry.owner == owner))
            .find_map(|(index, entry)| entry.pattern.matches(pathname).map(|params| (index, params)))
    }

    /// Check whether a registration contributed any route
    pub fn has_owner(&self, owner: RegistrationId) -> bool {
        self.entries.iter().any(|entry| entry.owner == owner)
    }

    /// Registered entries in resolution order
    pub fn entries(&self) -> &[RouteEntry<A>] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolution cache statistics
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    fn invalidate(&mut self) {
        #[cfg(feature = "cache")]
        self.cache.clear();
    }
}

impl<A> Default for RouteTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for RouteTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ReverseRoutes
// ============================================================================

/// Every reverse mapping from every mounted screen
pub struct ReverseRoutes<A> {
    mappings: Vec<(RegistrationId, ReverseMapping<A>)>,
}

impl<A> ReverseRoutes<A> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    /// Add a mapping
    pub fn register(&mut self, owner: RegistrationId, mapping: ReverseMapping<A>) {
        self.mappings.push((owner, mapping));
    }

    /// Remove every mapping a registration contributed
    pub fn remove_owner(&mut self, owner: RegistrationId) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|(id, _)| *id != owner);
        before - self.mappings.len()
    }

    /// Paths the action maps to, in registration order
    pub fn paths_for(&self, action: &A) -> Vec<String> {
        self.mappings
            .iter()
            .filter_map(|(_, mapping)| mapping(action))
            .collect()
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check if there are no mappings
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<A> Default for ReverseRoutes<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ReverseRoutes<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseRoutes")
            .field("mappings", &self.mappings.len())
            .finish()
    }
}
