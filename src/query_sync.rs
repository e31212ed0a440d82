//! Query string synchronization
//!
//! A [`QuerySync`] binds one query key on the pathnames matched by a template. It can carry a
//! value side (state → query, collected in a [`QueryBindingTable`]), an action side
//! (query → actions, collected in a [`QueryActionTable`]), or both.
//!
//! Values equal to their default are never written: the key is removed instead. Actions only
//! fire for keys whose value changed since the last synchronized query.

use crate::error::PatternError;
use crate::matcher::RoutePattern;
use crate::query::{ParsedQuery, QueryValue};
use crate::{trace_log, RegistrationId};
use std::fmt;

/// Reads a binding's serialized value from state; `None` when the value equals its default
pub type ValueReader<S> = Box<dyn Fn(&S) -> Option<String>>;

/// Produces actions for a present query value
pub type QueryDispatch<A> = Box<dyn Fn(&QueryValue) -> Vec<A>>;

/// Produces actions for a key that disappeared
pub type QueryReset<A> = Box<dyn Fn() -> Vec<A>>;

// ============================================================================
// QuerySync builder
// ============================================================================

/// Declaration of one synchronized query key
///
/// # Example
///
/// ```
/// use url_state_sync::QuerySync;
///
/// #[derive(Clone, PartialEq)]
/// struct State {
///     page: u32,
/// }
///
/// enum Action {
///     SetPage(u32),
/// }
///
/// let sync: QuerySync<State, Action> = QuerySync::new("page", "/list")
///     .value_display(|state: &State| state.page, 1)
///     .action_with(
///         |value| value.first().and_then(|v| v.parse::<u32>().ok()),
///         |page| Some(Action::SetPage(page)),
///     )
///     .reset(|| Some(Action::SetPage(1)))
///     .push(true);
///
/// assert_eq!(sync.key(), "page");
/// ```
pub struct QuerySync<S, A> {
    key: String,
    template: String,
    read: Option<ValueReader<S>>,
    push: bool,
    dispatch: Option<QueryDispatch<A>>,
    reset: Option<QueryReset<A>>,
}

impl<S, A> QuerySync<S, A> {
    /// Bind `key` on pathnames matching `template`
    pub fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
            read: None,
            push: false,
            dispatch: None,
            reset: None,
        }
    }

    /// Write a state value into the query
    ///
    /// The selected value is compared with `default`; when equal the key is removed, otherwise
    /// it is written as `serialize(value)`.
    pub fn value<T, Sel, Ser>(mut self, selector: Sel, default: T, serialize: Ser) -> Self
    where
        T: PartialEq + 'static,
        Sel: Fn(&S) -> T + 'static,
        Ser: Fn(&T) -> String + 'static,
    {
        self.read = Some(Box::new(move |state| {
            let value = selector(state);
            (value != default).then(|| serialize(&value))
        }));
        self
    }

    /// [`value`](Self::value) serializing with `Display`
    pub fn value_display<T, Sel>(self, selector: Sel, default: T) -> Self
    where
        T: PartialEq + fmt::Display + 'static,
        Sel: Fn(&S) -> T + 'static,
    {
        self.value(selector, default, T::to_string)
    }

    /// Write changes with `push_state` instead of `replace_state`
    pub fn push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    /// Dispatch actions when the key's value changes
    pub fn action<F, I>(mut self, action: F) -> Self
    where
        F: Fn(&QueryValue) -> I + 'static,
        I: IntoIterator<Item = A>,
    {
        self.dispatch = Some(Box::new(move |value| action(value).into_iter().collect()));
        self
    }

    /// [`action`](Self::action) with a separate deserialization step
    ///
    /// A value that does not deserialize dispatches nothing.
    pub fn action_with<T, D, F, I>(self, deserialize: D, action: F) -> Self
    where
        D: Fn(&QueryValue) -> Option<T> + 'static,
        F: Fn(T) -> I + 'static,
        I: IntoIterator<Item = A>,
    {
        self.action(move |value| {
            deserialize(value)
                .map(|args| action(args).into_iter().collect())
                .unwrap_or_else(Vec::new)
        })
    }

    /// Dispatch actions when the key disappears
    ///
    /// Without a reset the action itself runs with [`QueryValue::Null`].
    pub fn reset<F, I>(mut self, reset: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = A>,
    {
        self.reset = Some(Box::new(move || reset().into_iter().collect()));
        self
    }

    /// The bound key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The template scoping this binding
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Split into table entries, compiling the template once
    pub(crate) fn into_bindings(
        self,
        owner: RegistrationId,
    ) -> Result<(Option<QueryBinding<S>>, Option<QueryActionBinding<A>>), PatternError> {
        let pattern = RoutePattern::compile(&self.template)?;

        let value = self.read.map(|read| QueryBinding {
            key: self.key.clone(),
            pattern: pattern.clone(),
            read,
            push: self.push,
            owner,
        });

        let action = self.dispatch.map(|dispatch| QueryActionBinding {
            key: self.key,
            pattern,
            dispatch,
            reset: self.reset,
            owner,
        });

        Ok((value, action))
    }
}

impl<S, A> fmt::Debug for QuerySync<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySync")
            .field("key", &self.key)
            .field("template", &self.template)
            .field("value", &self.read.is_some())
            .field("push", &self.push)
            .field("action", &self.dispatch.is_some())
            .field("reset", &self.reset.is_some())
            .finish()
    }
}

// ============================================================================
// State → query
// ============================================================================

/// A state value bound to a query key
pub struct QueryBinding<S> {
    /// Query key
    pub key: String,
    /// Pathnames on which the binding is active
    pub pattern: RoutePattern,
    read: ValueReader<S>,
    /// Whether a change should add a history entry
    pub push: bool,
    /// Registration that contributed this binding
    pub owner: RegistrationId,
}

impl<S> QueryBinding<S> {
    /// Serialized value, `None` when it equals the default
    pub fn read(&self, state: &S) -> Option<String> {
        (self.read)(state)
    }
}

impl<S> fmt::Debug for QueryBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBinding")
            .field("key", &self.key)
            .field("pattern", &self.pattern.template())
            .field("push", &self.push)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Result of [`QueryBindingTable::derive_query`]
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuery {
    /// The current query with every binding's value merged in
    pub query: ParsedQuery,
    /// Whether any changed binding asked for a push
    pub should_push: bool,
    /// Whether any key changed at all
    pub changed: bool,
}

/// Every value binding from every mounted screen
pub struct QueryBindingTable<S> {
    bindings: Vec<QueryBinding<S>>,
}

impl<S> QueryBindingTable<S> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding
    pub fn register(&mut self, binding: QueryBinding<S>) {
        trace_log!(
            "Registering query binding '{}' on '{}'",
            binding.key,
            binding.pattern.template()
        );
        self.bindings.push(binding);
    }

    /// Remove every binding a registration contributed
    pub fn remove_owner(&mut self, owner: RegistrationId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.owner != owner);
        before - self.bindings.len()
    }

    /// Bindings whose pattern matches the pathname, in registration order
    pub fn active_for<'a>(&'a self, pathname: &'a str) -> impl Iterator<Item = &'a QueryBinding<S>> {
        self.bindings
            .iter()
            .filter(move |binding| binding.pattern.is_match(pathname))
    }

    /// Merge the bound values into `current`
    ///
    /// Returns `None` when no binding is active for the pathname. Keys no active binding owns
    /// are left untouched; when two active bindings share a key the later one wins.
    pub fn derive_query(
        &self,
        state: &S,
        current: &ParsedQuery,
        pathname: &str,
    ) -> Option<DerivedQuery> {
        let mut values: Vec<(&str, Option<String>, bool)> = Vec::new();
        for binding in self.active_for(pathname) {
            let value = binding.read(state);
            match values.iter_mut().find(|(key, _, _)| *key == binding.key) {
                Some(slot) => *slot = (binding.key.as_str(), value, binding.push),
                None => values.push((binding.key.as_str(), value, binding.push)),
            }
        }

        if values.is_empty() {
            return None;
        }

        let mut derived = DerivedQuery {
            query: current.clone(),
            should_push: false,
            changed: false,
        };

        for (key, value, push) in values {
            let value = value.map(QueryValue::Single);
            if current.get(key) != value.as_ref() {
                trace_log!("Query key '{}' changed to {:?}", key, value);
                derived.changed = true;
                derived.should_push |= push;
                derived.query.set(key, value);
            }
        }

        Some(derived)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<S> Default for QueryBindingTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for QueryBindingTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}

// ============================================================================
// Query → actions
// ============================================================================

/// A query key bound to actions
pub struct QueryActionBinding<A> {
    /// Query key
    pub key: String,
    /// Pathnames on which the binding is active
    pub pattern: RoutePattern,
    dispatch: QueryDispatch<A>,
    reset: Option<QueryReset<A>>,
    /// Registration that contributed this binding
    pub owner: RegistrationId,
}

impl<A> QueryActionBinding<A> {
    /// Actions for a value change; `None` means the key disappeared
    pub fn actions(&self, value: Option<&QueryValue>) -> Vec<A> {
        match (value, &self.reset) {
            (Some(value), _) => (self.dispatch)(value),
            (None, Some(reset)) => reset(),
            (None, None) => (self.dispatch)(&QueryValue::Null),
        }
    }
}

impl<A> fmt::Debug for QueryActionBinding<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryActionBinding")
            .field("key", &self.key)
            .field("pattern", &self.pattern.template())
            .field("reset", &self.reset.is_some())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Every query action binding from every mounted screen
pub struct QueryActionTable<A> {
    bindings: Vec<QueryActionBinding<A>>,
}

impl<A> QueryActionTable<A> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding
    pub fn register(&mut self, binding: QueryActionBinding<A>) {
        trace_log!(
            "Registering query action '{}' on '{}'",
            binding.key,
            binding.pattern.template()
        );
        self.bindings.push(binding);
    }

    /// Remove every binding a registration contributed
    pub fn remove_owner(&mut self, owner: RegistrationId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.owner != owner);
        before - self.bindings.len()
    }

    /// Check whether a registration contributed any binding
    pub fn has_owner(&self, owner: RegistrationId) -> bool {
        self.bindings.iter().any(|binding| binding.owner == owner)
    }

    /// Bindings whose pattern matches the pathname, in registration order
    pub fn active_for<'a>(
        &'a self,
        pathname: &'a str,
    ) -> impl Iterator<Item = &'a QueryActionBinding<A>> {
        self.bindings
            .iter()
            .filter(move |binding| binding.pattern.is_match(pathname))
    }

    /// Actions for every active key whose value differs between `query` and `last_query`
    ///
    /// `scope` restricts the candidates to one registration.
    pub fn derive_actions(
        &self,
        pathname: &str,
        query: &ParsedQuery,
        last_query: &ParsedQuery,
        scope: Option<RegistrationId>,
    ) -> Vec<A> {
        self.active_for(pathname)
            .filter(|binding| scope.map_or(true, |owner| binding.owner == owner))
            .filter(|binding| query.get(&binding.key) != last_query.get(&binding.key))
            .flat_map(|binding| {
                trace_log!("Query key '{}' changed, dispatching", binding.key);
                binding.actions(query.get(&binding.key))
            })
            .collect()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<A> Default for QueryActionTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for QueryActionTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}
