//! Synchronization engine
//!
//! [`SyncEngine`] sits between a [`Store`] and a history and keeps the two in step:
//!
//! - a location change (navigation, back/forward, screen mount) resolves routes and query
//!   bindings into actions, dispatched under the reentrancy flag
//! - a committed state change derives the query from the bound values and writes it back with
//!   `push_state` or `replace_state`
//! - an action with a reverse route navigates to the mapped path
//!
//! Dispatches made while a location is being applied never write back, which is what keeps the
//! two directions from feeding each other.

#[cfg(feature = "cache")]
use crate::cache::CacheStats;
use crate::config::SyncConfig;
use crate::context::SyncContext;
use crate::error::{PatternError, SyncError};
use crate::history::{HistorySink, HistoryState, LocationSource};
use crate::location::Location;
use crate::matcher::RoutePattern;
use crate::query::decode;
use crate::query_sync::{QueryActionTable, QueryBindingTable, QuerySync};
use crate::route::{ReverseRouteMap, ReverseRoutes, RouteEntry, RouteMap, RouteTable};
use crate::screen::ScreenSync;
use crate::store::Store;
use crate::{
    debug_log, error_log, trace_log, warn_log, NavigationDirection, NavigationMode,
    RegistrationId, TransitionSignal,
};

/// A history write performed by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWrite {
    /// `push_state` or `replace_state`
    pub mode: NavigationMode,
    /// Full path written
    pub url: String,
}

/// What applying a location did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationApplied {
    /// Applied location, pathname in routes space
    pub location: Location,
    /// How the location was reached
    pub direction: NavigationDirection,
    /// Template of the matched route
    pub route: Option<String>,
    /// Actions dispatched by the matched route
    pub actions: usize,
    /// Actions dispatched for changed query keys
    pub query_actions: usize,
    /// Write-back that followed, if any
    pub write: Option<HistoryWrite>,
}

/// What a user dispatch did besides updating the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Query write-back caused by the state change
    pub write: Option<HistoryWrite>,
    /// Navigations caused by reverse routes
    pub navigations: Vec<LocationApplied>,
}

/// Two-way binding between a store and a history
///
/// # Example
///
/// ```
/// use url_state_sync::{MemoryHistory, QuerySync, ReducerStore, ScreenSync, SyncEngine};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct State {
///     page: u32,
/// }
///
/// enum Action {
///     SetPage(u32),
/// }
///
/// let store = ReducerStore::new(State { page: 1 }, |state: &mut State, action| match action {
///     Action::SetPage(page) => state.page = page,
/// });
/// let mut engine = SyncEngine::new(store, MemoryHistory::new("/list"));
///
/// engine
///     .mount(ScreenSync::new("list").query(
///         QuerySync::new("page", "/list")
///             .value_display(|state: &State| state.page, 1)
///             .action_with(
///                 |value| value.first().and_then(|v| v.parse::<u32>().ok()),
///                 |page| Some(Action::SetPage(page)),
///             )
///             .reset(|| Some(Action::SetPage(1)))
///             .push(true),
///     ))
///     .unwrap();
///
/// engine.dispatch(Action::SetPage(3)).unwrap();
/// assert_eq!(engine.history().current_path(), "/list?page=3");
///
/// engine.history_mut().back();
/// engine.pop_state().unwrap();
/// assert_eq!(engine.state().page, 1);
/// ```
pub struct SyncEngine<S: Store, H> {
    store: S,
    history: H,
    config: SyncConfig,
    routes: RouteTable<S::Action>,
    reverse: ReverseRoutes<S::Action>,
    query_values: QueryBindingTable<S::State>,
    query_actions: QueryActionTable<S::Action>,
    context: SyncContext,
    registrations: Vec<(RegistrationId, String)>,
    next_id: u64,
}

impl<S, H> SyncEngine<S, H>
where
    S: Store,
    H: HistorySink + LocationSource,
{
    /// Create an engine with the default configuration
    pub fn new(store: S, history: H) -> Self {
        Self::with_config(store, history, SyncConfig::default())
    }

    /// Create an engine
    ///
    /// The current location is taken as already synchronized.
    pub fn with_config(store: S, history: H, config: SyncConfig) -> Self {
        let location = history.location();
        let routes_pathname = config.to_routes(&decode(&location.pathname));
        let context = SyncContext::new(location.with_pathname(routes_pathname));

        Self {
            store,
            history,
            config,
            routes: RouteTable::new(),
            reverse: ReverseRoutes::new(),
            query_values: QueryBindingTable::new(),
            query_actions: QueryActionTable::new(),
            context,
            registrations: Vec::new(),
            next_id: 1,
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register routes without applying the current location
    pub fn register_routes(
        &mut self,
        routes: RouteMap<S::Action>,
    ) -> Result<RegistrationId, PatternError> {
        self.install(ScreenSync::new("routes").routes(routes))
    }

    /// Register reverse routes
    pub fn register_reverse_routes(
        &mut self,
        reverse: ReverseRouteMap<S::Action>,
    ) -> Result<RegistrationId, PatternError> {
        self.install(ScreenSync::new("reverse routes").reverse(reverse))
    }

    /// Register one query binding without applying the current location
    pub fn register_query_sync(
        &mut self,
        sync: QuerySync<S::State, S::Action>,
    ) -> Result<RegistrationId, PatternError> {
        self.install(ScreenSync::new("query sync").query(sync))
    }

    /// Register a screen and apply the current location to it
    ///
    /// Only the screen's own routes and query actions see the replayed location, tagged
    /// [`NavigationDirection::Initial`]. If the replay fails the registration is rolled back.
    pub fn mount(
        &mut self,
        screen: ScreenSync<S::State, S::Action>,
    ) -> Result<RegistrationId, SyncError> {
        let id = self.install(screen)?;

        if self.routes.has_owner(id) || self.query_actions.has_owner(id) {
            let location = self.history.location();
            if let Err(error) = self.apply_location(location, NavigationDirection::Initial, Some(id))
            {
                self.unregister(id);
                return Err(error);
            }
        }

        Ok(id)
    }

    /// Remove everything a registration contributed
    ///
    /// Returns `false` for an unknown handle.
    pub fn unregister(&mut self, id: RegistrationId) -> bool {
        let Some(position) = self.registrations.iter().position(|(known, _)| *known == id) else {
            warn_log!("Ignoring unregister of unknown registration {:?}", id);
            return false;
        };
        let (_, name) = self.registrations.remove(position);

        let removed = self.routes.remove_owner(id)
            + self.reverse.remove_owner(id)
            + self.query_values.remove_owner(id)
            + self.query_actions.remove_owner(id);
        debug_log!("Unregistered '{}' ({} entries)", name, removed);
        true
    }

    /// Compile everything first so a bad template leaves the tables untouched
    fn install(
        &mut self,
        screen: ScreenSync<S::State, S::Action>,
    ) -> Result<RegistrationId, PatternError> {
        let id = RegistrationId(self.next_id);
        let ScreenSync {
            name,
            routes,
            reverse,
            query,
        } = screen;

        let mut entries = Vec::with_capacity(routes.len());
        for (template, handler) in routes.into_entries() {
            entries.push(RouteEntry {
                pattern: RoutePattern::compile(&template)?,
                handler,
                owner: id,
            });
        }

        let bindings = query
            .into_iter()
            .map(|sync| sync.into_bindings(id))
            .collect::<Result<Vec<_>, _>>()?;

        self.next_id += 1;
        debug_log!(
            "Registering '{}' as {:?}: {} routes, {} reverse routes, {} query bindings",
            name,
            id,
            entries.len(),
            reverse.len(),
            bindings.len()
        );

        for entry in entries {
            self.routes.push(entry);
        }
        for mapping in reverse.into_mappings() {
            self.reverse.register(id, mapping);
        }
        for (value, action) in bindings {
            if let Some(value) = value {
                self.query_values.register(value);
            }
            if let Some(action) = action {
                self.query_actions.register(action);
            }
        }
        self.registrations.push((id, name));

        Ok(id)
    }

    // ------------------------------------------------------------------------
    // State → location
    // ------------------------------------------------------------------------

    /// Dispatch a user action
    ///
    /// The store commits, the query is written back if the state change calls for it, and then
    /// every reverse route the action maps to is navigated to.
    pub fn dispatch(&mut self, action: S::Action) -> Result<Dispatched, SyncError> {
        let paths = self.reverse.paths_for(&action);
        let previous = self.store.state().clone();

        self.store.dispatch(action).map_err(SyncError::dispatch)?;
        let write = self.observe_transition(&previous, TransitionSignal::Committed);

        let mut navigations = Vec::new();
        for path in paths {
            let window_path = self.config.to_window(&path);
            if window_path == self.history.location().path_and_search() {
                trace_log!("Reverse route '{}' already current", window_path);
                continue;
            }
            navigations.push(self.navigate(&window_path, NavigationMode::Push)?);
        }

        Ok(Dispatched { write, navigations })
    }

    /// Write the query back unconditionally, as long as a binding is active
    pub fn sync_query(&mut self) -> Option<HistoryWrite> {
        self.write_back(false, true)
    }

    /// Report a transition committed outside [`dispatch`](Self::dispatch)
    ///
    /// `previous` is the state before the transition; the current state is read from the store.
    pub fn observe_transition(
        &mut self,
        previous: &S::State,
        signal: TransitionSignal,
    ) -> Option<HistoryWrite> {
        let state_changed = previous != self.store.state();
        self.write_back(state_changed, signal == TransitionSignal::ForceQuerySync)
    }

    fn write_back(&mut self, state_changed: bool, forced: bool) -> Option<HistoryWrite> {
        if self.context.is_applying() {
            trace_log!("Skipping write-back while applying a location");
            return None;
        }

        let location = self.history.location();
        let routes_pathname = self.config.to_routes(&decode(&location.pathname));
        let page_changed = routes_pathname != self.context.last_location().pathname;

        if !(state_changed || page_changed || forced) {
            return None;
        }
        self.context
            .set_last_location(location.with_pathname(routes_pathname.clone()));

        let options = self.config.query_options();
        let current = location.query(options);
        let derived = self
            .query_values
            .derive_query(self.store.state(), &current, &routes_pathname)?;

        // the window pathname is kept as written
        let next = location.with_search(derived.query.to_search(options));
        self.context.set_last_query(derived.query);

        if next == location {
            trace_log!("Location '{}' already up to date", location);
            return None;
        }

        let mode = if derived.should_push && !page_changed {
            NavigationMode::Push
        } else {
            NavigationMode::Replace
        };
        let url = next.to_path();
        self.write_history(mode, &url);
        Some(HistoryWrite { mode, url })
    }

    fn write_history(&mut self, mode: NavigationMode, url: &str) {
        debug_log!("History {:?} '{}'", mode, url);
        let meta = HistoryState::new();
        match mode {
            NavigationMode::Push => self.history.push_state(&meta, "", url),
            NavigationMode::Replace => self.history.replace_state(&meta, "", url),
        }
    }

    // ------------------------------------------------------------------------
    // Location → state
    // ------------------------------------------------------------------------

    /// Write `path` to history and apply it
    ///
    /// Landing on another page replaces the query with that page's bound values right away, so
    /// with active bindings a page change can be followed by one `replace_state` write.
    pub fn navigate(
        &mut self,
        path: &str,
        mode: NavigationMode,
    ) -> Result<LocationApplied, SyncError> {
        let location = Location::from_url(path);
        self.write_history(mode, &location.to_path());
        self.apply_location(location, mode.into(), None)
    }

    /// [`navigate`](Self::navigate) with a new history entry
    pub fn push(&mut self, path: &str) -> Result<LocationApplied, SyncError> {
        self.navigate(path, NavigationMode::Push)
    }

    /// [`navigate`](Self::navigate) overwriting the current history entry
    pub fn replace(&mut self, path: &str) -> Result<LocationApplied, SyncError> {
        self.navigate(path, NavigationMode::Replace)
    }

    /// Apply the history's current location after a back/forward traversal
    pub fn pop_state(&mut self) -> Result<LocationApplied, SyncError> {
        let location = self.history.location();
        self.apply_location(location, NavigationDirection::Pop, None)
    }

    fn apply_location(
        &mut self,
        location: Location,
        direction: NavigationDirection,
        scope: Option<RegistrationId>,
    ) -> Result<LocationApplied, SyncError> {
        let routes_pathname = self.config.to_routes(&decode(&location.pathname));
        let page_changed = routes_pathname != self.context.last_location().pathname;
        debug_log!(
            "Applying location '{}' ({:?}, page changed: {})",
            location,
            direction,
            page_changed
        );

        let matched = match scope {
            Some(owner) => self.routes.resolve_owned(owner, &routes_pathname),
            None => self.routes.resolve(&routes_pathname),
        }
        .map(|found| (found.template().to_string(), found.actions()));

        let (route, actions) = match matched {
            Some((template, actions)) => {
                trace_log!("'{}' matched route '{}'", routes_pathname, template);
                (Some(template), actions)
            }
            None => (None, Vec::new()),
        };
        let route_actions = actions.len();
        self.apply_actions(actions)?;

        // Query actions only fire while staying on the same page.
        let mut query_actions = 0;
        if !page_changed {
            let query = location.query(self.config.query_options());
            let actions = self.query_actions.derive_actions(
                &routes_pathname,
                &query,
                self.context.last_query(),
                scope,
            );
            query_actions = actions.len();
            self.apply_actions(actions)?;
        }

        let write = self.write_back(false, query_actions > 0);

        Ok(LocationApplied {
            location: location.with_pathname(routes_pathname),
            direction,
            route,
            actions: route_actions,
            query_actions,
            write,
        })
    }

    fn apply_actions(&mut self, actions: Vec<S::Action>) -> Result<(), SyncError> {
        if actions.is_empty() {
            return Ok(());
        }

        let _applying = self.context.applying();
        for action in actions {
            if let Err(error) = self.store.dispatch(action) {
                error_log!("Dispatch failed while applying a location: {}", error);
                return Err(SyncError::dispatch(error));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The store, for changes reported later with
    /// [`observe_transition`](Self::observe_transition)
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Current committed state
    pub fn state(&self) -> &S::State {
        self.store.state()
    }

    /// The history
    pub fn history(&self) -> &H {
        &self.history
    }

    /// The history, e.g. to traverse it before calling [`pop_state`](Self::pop_state)
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Engine configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Last synchronized snapshots
    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    /// Route table
    pub fn routes(&self) -> &RouteTable<S::Action> {
        &self.routes
    }

    /// Live registrations, in registration order
    pub fn registrations(&self) -> impl Iterator<Item = (RegistrationId, &str)> {
        self.registrations
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
    }

    /// Route resolution cache statistics
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> &CacheStats {
        self.routes.cache_stats()
    }

    /// Take the store and history back
    pub fn into_parts(self) -> (S, H) {
        (self.store, self.history)
    }
}

impl<S, H> std::fmt::Debug for SyncEngine<S, H>
where
    S: Store + std::fmt::Debug,
    H: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("store", &self.store)
            .field("history", &self.history)
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("reverse", &self.reverse.len())
            .field("query_values", &self.query_values.len())
            .field("query_actions", &self.query_actions.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
