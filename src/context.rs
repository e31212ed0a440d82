//! Per-engine synchronization context
//!
//! Holds the last location and query the engine synchronized, and the reentrancy flag that
//! marks dispatches caused by a location change. Each engine owns exactly one context.

use crate::location::Location;
use crate::query::ParsedQuery;
use crate::trace_log;
use std::cell::Cell;

/// Snapshots shared by the read and write halves of the engine
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    /// Last observed location, pathname in routes space
    last_location: Location,
    /// Last query written back (or found already in place)
    last_query: ParsedQuery,
    /// Set while dispatching actions derived from a location change
    applying: Cell<bool>,
}

impl SyncContext {
    /// Create a context seeded with the current location and an empty query
    pub fn new(location: Location) -> Self {
        Self {
            last_location: location,
            last_query: ParsedQuery::new(),
            applying: Cell::new(false),
        }
    }

    /// Last observed location
    pub fn last_location(&self) -> &Location {
        &self.last_location
    }

    /// Last synchronized query
    pub fn last_query(&self) -> &ParsedQuery {
        &self.last_query
    }

    pub(crate) fn set_last_location(&mut self, location: Location) {
        self.last_location = location;
    }

    pub(crate) fn set_last_query(&mut self, query: ParsedQuery) {
        self.last_query = query;
    }

    /// Whether actions derived from a location are being dispatched right now
    pub fn is_applying(&self) -> bool {
        self.applying.get()
    }

    /// Raise the reentrancy flag until the returned guard is dropped
    pub(crate) fn applying(&self) -> ApplyingLocation<'_> {
        ApplyingLocation::enter(&self.applying)
    }
}

/// Keeps the reentrancy flag raised for its lifetime
///
/// Dropping restores the previous value, so the flag is cleared on early return, on error and
/// on unwind alike.
#[derive(Debug)]
pub(crate) struct ApplyingLocation<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ApplyingLocation<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        trace_log!("Entering location apply (nested: {})", previous);
        Self { flag, previous }
    }
}

impl Drop for ApplyingLocation<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context() {
        let context = SyncContext::new(Location::from_url("/start?x=1"));
        assert_eq!(context.last_location().pathname, "/start");
        assert!(context.last_query().is_empty());
        assert!(!context.is_applying());
    }

    #[test]
    fn test_guard_raises_and_clears_flag() {
        let context = SyncContext::default();
        {
            let _guard = context.applying();
            assert!(context.is_applying());
            {
                let _nested = context.applying();
                assert!(context.is_applying());
            }
            assert!(context.is_applying());
        }
        assert!(!context.is_applying());
    }

    #[test]
    fn test_flag_cleared_on_error_path() {
        fn failing(context: &SyncContext) -> Result<(), &'static str> {
            let _guard = context.applying();
            let outcome: Result<(), &'static str> = Err("handler failed");
            outcome?;
            Ok(())
        }

        let context = SyncContext::default();
        assert!(failing(&context).is_err());
        assert!(!context.is_applying());
    }

    #[test]
    fn test_flag_cleared_on_unwind() {
        let context = SyncContext::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = context.applying();
            panic!("handler panicked");
        }));
        assert!(result.is_err());
        assert!(!context.is_applying());
    }
}
