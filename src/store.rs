//! Store collaborator
//!
//! The engine only needs to dispatch actions and read the committed state. It compares the
//! state before and after each dispatch with `PartialEq`, so state types must be comparable by
//! value.

use std::convert::Infallible;
use std::error::Error;
use std::fmt;

/// An application state container
pub trait Store {
    /// Committed state
    type State: Clone + PartialEq;
    /// Commands the store understands
    type Action;
    /// Dispatch failure
    type Error: Error + 'static;

    /// Apply an action and commit the resulting state
    fn dispatch(&mut self, action: Self::Action) -> Result<(), Self::Error>;

    /// Current committed state
    fn state(&self) -> &Self::State;
}

/// A store driven by a reducer closure
///
/// # Example
///
/// ```
/// use url_state_sync::{ReducerStore, Store};
///
/// let mut store = ReducerStore::new(0_i32, |count: &mut i32, delta: i32| *count += delta);
/// store.dispatch(5).unwrap();
/// assert_eq!(*store.state(), 5);
/// ```
pub struct ReducerStore<S, A> {
    state: S,
    reducer: Box<dyn FnMut(&mut S, A)>,
    dispatched: usize,
}

impl<S, A> ReducerStore<S, A> {
    /// Create a store from an initial state and a reducer
    pub fn new<F>(initial: S, reducer: F) -> Self
    where
        F: FnMut(&mut S, A) + 'static,
    {
        Self {
            state: initial,
            reducer: Box::new(reducer),
            dispatched: 0,
        }
    }

    /// Number of actions dispatched so far
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}

impl<S, A> Store for ReducerStore<S, A>
where
    S: Clone + PartialEq,
{
    type State = S;
    type Action = A;
    type Error = Infallible;

    fn dispatch(&mut self, action: A) -> Result<(), Infallible> {
        (self.reducer)(&mut self.state, action);
        self.dispatched += 1;
        Ok(())
    }

    fn state(&self) -> &S {
        &self.state
    }
}

impl<S: fmt::Debug, A> fmt::Debug for ReducerStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerStore")
            .field("state", &self.state)
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}
