//! Integration tests for url-state-sync
//!
//! These tests drive a complete engine (store, history, screens) through navigation, state
//! changes and history traversal.

use std::fmt;
use url_state_sync::*;

// ============================================================================
// Fixtures
// ============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
struct AppState {
    log: Vec<String>,
    current: Option<String>,
    opts: (Option<String>, Option<String>),
    page: u32,
    search: String,
    tags: Vec<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            current: None,
            opts: (None, None),
            page: 1,
            search: String::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    First,
    Second,
    Page(String),
    List,
    SetOpts(Option<String>, Option<String>),
    SetOpt1(Option<String>),
    SetOpt2(Option<String>),
    SetPage(u32),
    SetSearch(String),
    SetTags(Vec<String>),
    Fail,
}

#[derive(Debug)]
struct Fault;

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("reducer fault")
    }
}

impl std::error::Error for Fault {}

#[derive(Debug, Default)]
struct AppStore {
    state: AppState,
}

impl Store for AppStore {
    type State = AppState;
    type Action = Action;
    type Error = Fault;

    fn dispatch(&mut self, action: Action) -> Result<(), Fault> {
        let state = &mut self.state;
        state.log.push(format!("{:?}", action));
        match action {
            Action::Fail => return Err(Fault),
            Action::Page(page) => state.current = Some(page),
            Action::SetOpts(opt1, opt2) => state.opts = (opt1, opt2),
            Action::SetOpt1(opt1) => state.opts.0 = opt1,
            Action::SetOpt2(opt2) => state.opts.1 = opt2,
            Action::SetPage(page) => state.page = page,
            Action::SetSearch(search) => state.search = search,
            Action::SetTags(tags) => state.tags = tags,
            Action::First | Action::Second | Action::List => {}
        }
        Ok(())
    }

    fn state(&self) -> &AppState {
        &self.state
    }
}

/// Memory history that remembers every write
#[derive(Debug)]
struct RecordingHistory {
    inner: MemoryHistory,
    writes: Vec<(NavigationMode, String)>,
}

impl RecordingHistory {
    fn new(url: &str) -> Self {
        Self {
            inner: MemoryHistory::new(url),
            writes: Vec::new(),
        }
    }
}

impl HistorySink for RecordingHistory {
    fn push_state(&mut self, meta: &HistoryState, title: &str, url: &str) {
        self.writes.push((NavigationMode::Push, url.to_string()));
        self.inner.push_state(meta, title, url);
    }

    fn replace_state(&mut self, meta: &HistoryState, title: &str, url: &str) {
        self.writes.push((NavigationMode::Replace, url.to_string()));
        self.inner.replace_state(meta, title, url);
    }
}

impl LocationSource for RecordingHistory {
    fn location(&self) -> Location {
        self.inner.location()
    }
}

type Engine = SyncEngine<AppStore, RecordingHistory>;

fn engine(url: &str) -> Engine {
    engine_with(url, SyncConfig::default())
}

fn engine_with(url: &str, config: SyncConfig) -> Engine {
    init_logging();
    SyncEngine::with_config(AppStore::default(), RecordingHistory::new(url), config)
}

fn writes(engine: &Engine) -> Vec<(NavigationMode, &str)> {
    engine
        .history()
        .writes
        .iter()
        .map(|(mode, url)| (*mode, url.as_str()))
        .collect()
}

fn pages_screen() -> ScreenSync<AppState, Action> {
    ScreenSync::new("pages")
        .routes(
            RouteMap::new()
                .route("/pages/first", |_| Some(Action::First))
                .route("/pages/second", |_| Some(Action::Second))
                .route("/pages/:page", |params| {
                    params.get_owned("page").map(Action::Page)
                })
                .route("/pages", |_| Some(Action::List)),
        )
        .reverse(ReverseRouteMap::new().map(|action: &Action| match action {
            Action::Page(page) => Some(format!("/pages/{}", page)),
            Action::First => Some("/pages/first".to_string()),
            _ => None,
        }))
}

fn page_sync(template: &str, push: bool) -> QuerySync<AppState, Action> {
    QuerySync::new("page", template)
        .value_display(|state: &AppState| state.page, 1)
        .action_with(
            |value| value.first().and_then(|v| v.parse::<u32>().ok()),
            |page| Some(Action::SetPage(page)),
        )
        .reset(|| Some(Action::SetPage(1)))
        .push(push)
}

fn list_page(push: bool) -> QuerySync<AppState, Action> {
    page_sync("/list(/*)", push)
}

fn list_search() -> QuerySync<AppState, Action> {
    QuerySync::new("q", "/list(/*)")
        .value(|state: &AppState| state.search.clone(), String::new(), String::clone)
        .push(true)
}

fn list_screen(push: bool) -> ScreenSync<AppState, Action> {
    ScreenSync::new("list").query(list_page(push)).query(list_search())
}

// ============================================================================
// Route Tests
// ============================================================================

#[test]
fn test_most_specific_route_registered_first_wins() {
    let mut engine = engine("/");
    engine.mount(pages_screen()).unwrap();
    assert!(engine.state().log.is_empty());

    let applied = engine.push("/pages/custom").unwrap();
    assert_eq!(applied.route.as_deref(), Some("/pages/:page"));
    assert_eq!(engine.state().log, vec![r#"Page("custom")"#]);

    engine.push("/pages/first").unwrap();
    engine.push("/pages/second").unwrap();
    engine.push("/pages").unwrap();
    assert_eq!(
        engine.state().log,
        vec![r#"Page("custom")"#, "First", "Second", "List"]
    );
}

#[test]
fn test_optional_segments() {
    let mut engine = engine("/");
    engine
        .register_routes(RouteMap::new().route("/url(/:opt1)(/:opt2)", |params| {
            Some(Action::SetOpts(
                params.get_owned("opt1"),
                params.get_owned("opt2"),
            ))
        }))
        .unwrap();

    engine.push("/url/a/b").unwrap();
    assert_eq!(
        engine.state().opts,
        (Some("a".to_string()), Some("b".to_string()))
    );

    engine.push("/url/a").unwrap();
    assert_eq!(engine.state().opts, (Some("a".to_string()), None));

    engine.replace("/url").unwrap();
    assert_eq!(engine.state().opts, (None, None));

    assert_eq!(engine.history().inner.len(), 3);
    assert_eq!(engine.history().inner.current_path(), "/url");
}

const OPTS_TEMPLATE: &str = "/url(/:opt1)(/:opt2)";

fn opts_screen() -> ScreenSync<AppState, Action> {
    let pattern = RoutePattern::compile(OPTS_TEMPLATE).unwrap();

    ScreenSync::new("opts")
        .routes(RouteMap::new().route(OPTS_TEMPLATE, |params| {
            Some(Action::SetOpts(
                params.get_owned("opt1"),
                params.get_owned("opt2"),
            ))
        }))
        .reverse(ReverseRouteMap::new().map(move |action: &Action| {
            let Action::SetOpts(opt1, opt2) = action else {
                return None;
            };
            let mut params = RouteParams::new();
            for (name, value) in [("opt1", opt1), ("opt2", opt2)] {
                if let Some(value) = value {
                    params.insert(name, value.as_str());
                }
            }
            pattern.render(&params).ok()
        }))
}

#[test]
fn test_optional_segments_written_from_state() {
    let mut engine = engine("/");
    engine.mount(opts_screen()).unwrap();

    engine
        .dispatch(Action::SetOpts(Some("a".to_string()), Some("b".to_string())))
        .unwrap();
    assert_eq!(engine.history().inner.current_path(), "/url/a/b");

    engine
        .dispatch(Action::SetOpts(Some("a".to_string()), None))
        .unwrap();
    assert_eq!(engine.history().inner.current_path(), "/url/a");
    assert_eq!(engine.state().opts, (Some("a".to_string()), None));

    assert_eq!(
        writes(&engine),
        vec![
            (NavigationMode::Push, "/url/a/b"),
            (NavigationMode::Push, "/url/a"),
        ]
    );
}

fn opt_sync(key: &'static str) -> QuerySync<AppState, Action> {
    QuerySync::new(key, OPTS_TEMPLATE)
        .value(
            move |state: &AppState| match key {
                "opt1" => state.opts.0.clone(),
                _ => state.opts.1.clone(),
            },
            None,
            |value: &Option<String>| value.clone().unwrap_or_default(),
        )
        .action(move |value: &QueryValue| {
            let value = value.first().map(str::to_string);
            Some(match key {
                "opt1" => Action::SetOpt1(value),
                _ => Action::SetOpt2(value),
            })
        })
}

#[test]
fn test_removed_keys_clear_state_without_declared_reset() {
    let mut engine = engine("/url?opt1=a&opt2=b");
    engine
        .mount(
            ScreenSync::new("opts")
                .query(opt_sync("opt1"))
                .query(opt_sync("opt2")),
        )
        .unwrap();
    assert_eq!(
        engine.state().opts,
        (Some("a".to_string()), Some("b".to_string()))
    );

    let applied = engine.replace("/url").unwrap();
    assert_eq!(applied.query_actions, 2);
    assert_eq!(engine.state().opts, (None, None));
    assert_eq!(engine.history().inner.current_path(), "/url");

    // nothing stale is written back on the next change
    engine.dispatch(Action::SetPage(2)).unwrap();
    assert_eq!(engine.history().inner.current_path(), "/url");
    assert_eq!(writes(&engine), vec![(NavigationMode::Replace, "/url")]);
}

#[test]
fn test_mount_replays_only_the_new_screen() {
    let mut engine = engine("/pages/intro");
    engine.mount(pages_screen()).unwrap();
    assert_eq!(engine.state().log, vec![r#"Page("intro")"#]);

    engine
        .mount(
            ScreenSync::new("catch-all")
                .routes(RouteMap::new().route("/pages/*", |_| Some(Action::List))),
        )
        .unwrap();
    assert_eq!(engine.state().log, vec![r#"Page("intro")"#, "List"]);

    // Nothing location-driven, nothing replayed
    engine
        .mount(ScreenSync::new("values").query(list_search()))
        .unwrap();
    assert_eq!(engine.state().log.len(), 2);
    assert!(writes(&engine).is_empty());
}

// ============================================================================
// Reverse Route Tests
// ============================================================================

#[test]
fn test_reverse_route_navigates() {
    let mut engine = engine("/pages/intro");
    engine.mount(pages_screen()).unwrap();

    let dispatched = engine.dispatch(Action::Page("guide".into())).unwrap();
    assert_eq!(dispatched.navigations.len(), 1);
    assert_eq!(dispatched.navigations[0].route.as_deref(), Some("/pages/:page"));
    assert_eq!(writes(&engine), vec![(NavigationMode::Push, "/pages/guide")]);

    // Already there
    let dispatched = engine.dispatch(Action::Page("guide".into())).unwrap();
    assert!(dispatched.navigations.is_empty());

    // Mapping opts out
    let dispatched = engine.dispatch(Action::List).unwrap();
    assert!(dispatched.navigations.is_empty());
    assert_eq!(engine.history().inner.len(), 2);
}

#[test]
fn test_route_actions_do_not_consult_reverse_routes() {
    let mut engine = engine("/");
    engine.mount(pages_screen()).unwrap();

    // `/pages/custom` dispatches Page("custom") under the flag; its reverse route is skipped
    engine.push("/pages/custom").unwrap();
    assert_eq!(writes(&engine), vec![(NavigationMode::Push, "/pages/custom")]);
}

#[test]
fn test_base_path() {
    let mut engine = engine_with("/app/pages/intro", SyncConfig::new().base_path("/app"));
    engine.mount(pages_screen()).unwrap();
    assert_eq!(engine.state().current.as_deref(), Some("intro"));

    engine.dispatch(Action::First).unwrap();
    assert_eq!(engine.history().inner.current_path(), "/app/pages/first");
    assert_eq!(engine.state().log, vec![r#"Page("intro")"#, "First", "First"]);
}

#[test]
fn test_base_path_with_escaped_characters() {
    let mut engine = engine_with("/my%20app/list", SyncConfig::new().base_path("/my app"));
    engine.mount(list_screen(true)).unwrap();
    assert!(writes(&engine).is_empty());

    engine.dispatch(Action::SetPage(3)).unwrap();
    assert_eq!(
        writes(&engine),
        vec![(NavigationMode::Push, "/my%20app/list?page=3")]
    );
}

// ============================================================================
// Query Sync Tests
// ============================================================================

#[test]
fn test_default_value_leaves_key_absent() {
    let mut engine = engine("/list");
    engine.mount(list_screen(false)).unwrap();

    engine.dispatch(Action::SetPage(1)).unwrap();
    assert!(writes(&engine).is_empty());

    let dispatched = engine.dispatch(Action::SetPage(4)).unwrap();
    assert_eq!(
        dispatched.write,
        Some(HistoryWrite {
            mode: NavigationMode::Replace,
            url: "/list?page=4".to_string(),
        })
    );

    engine.dispatch(Action::SetPage(1)).unwrap();
    assert_eq!(engine.history().inner.current_path(), "/list");
    assert_eq!(engine.history().inner.len(), 1);
}

#[test]
fn test_unbound_keys_are_preserved() {
    let mut engine = engine("/list?utm=mail#top");
    engine.mount(list_screen(false)).unwrap();

    engine.dispatch(Action::SetPage(2)).unwrap();
    assert_eq!(engine.history().inner.current_path(), "/list?page=2&utm=mail#top");
}

#[test]
fn test_pathname_change_replaces_instead_of_pushing() {
    let mut engine = engine("/list");
    engine.mount(list_screen(false)).unwrap();

    engine.dispatch(Action::SetSearch("rust".into())).unwrap();
    let applied = engine.push("/list/archive").unwrap();
    // the new page's bound values follow the navigation as a replace
    assert_eq!(
        applied.write.map(|write| write.mode),
        Some(NavigationMode::Replace)
    );

    assert_eq!(
        writes(&engine),
        vec![
            (NavigationMode::Push, "/list?q=rust"),
            (NavigationMode::Push, "/list/archive"),
            (NavigationMode::Replace, "/list/archive?q=rust"),
        ]
    );
}

#[test]
fn test_repeated_pop_state_writes_at_most_once() {
    let mut engine = engine("/list?z=1&page=3");
    engine.mount(list_screen(true)).unwrap();
    assert_eq!(engine.state().page, 3);

    for _ in 0..5 {
        let applied = engine.pop_state().unwrap();
        assert_eq!(applied.query_actions, 0);
        assert_eq!(applied.direction, NavigationDirection::Pop);
    }

    // Only the normalizing write from mount, keys now sorted
    assert_eq!(writes(&engine), vec![(NavigationMode::Replace, "/list?page=3&z=1")]);
    assert!(engine.sync_query().is_none());
}

#[test]
fn test_back_and_forward_apply_query_actions() {
    let mut engine = engine("/list");
    engine.mount(list_screen(true)).unwrap();

    engine.dispatch(Action::SetPage(2)).unwrap();
    engine.dispatch(Action::SetPage(3)).unwrap();
    assert_eq!(engine.history().inner.len(), 3);

    engine.history_mut().inner.back();
    let applied = engine.pop_state().unwrap();
    assert_eq!(applied.query_actions, 1);
    assert!(applied.write.is_none());
    assert_eq!(engine.state().page, 2);

    engine.history_mut().inner.back();
    engine.pop_state().unwrap();
    assert_eq!(engine.state().page, 1);

    engine.history_mut().inner.forward();
    engine.pop_state().unwrap();
    assert_eq!(engine.state().page, 2);

    // Traversal never wrote anything
    assert_eq!(writes(&engine).len(), 2);
}

#[test]
fn test_pathname_and_query_change_together_skip_query_actions() {
    let mut engine = engine("/list");
    engine.mount(list_screen(true)).unwrap();

    let applied = engine.push("/list/archive?page=5").unwrap();
    assert_eq!(applied.query_actions, 0);
    assert_eq!(engine.state().page, 1);

    // Same page now, so the query change is picked up
    let applied = engine.push("/list/archive?page=5").unwrap();
    assert_eq!(applied.query_actions, 1);
    assert_eq!(engine.state().page, 5);
}

#[test]
fn test_array_query_values() {
    let options = QueryStringOptions::new().array_format(ArrayFormat::Bracket);
    let mut engine = engine_with(
        "/search?tags[]=a&tags[]=b",
        SyncConfig::new().query_string_options(options),
    );

    engine
        .mount(ScreenSync::new("search").query(
            QuerySync::new("tags", "/search").action(|value: &QueryValue| {
                Some(Action::SetTags(
                    value.to_vec().into_iter().map(String::from).collect(),
                ))
            }),
        ))
        .unwrap();

    assert_eq!(engine.state().tags, vec!["a", "b"]);
}

#[test]
fn test_observe_transition_committed_elsewhere() {
    let mut engine = engine("/list");
    engine.mount(list_screen(false)).unwrap();

    let previous = engine.state().clone();
    assert!(engine
        .observe_transition(&previous, TransitionSignal::Committed)
        .is_none());

    engine.store_mut().dispatch(Action::SetPage(9)).unwrap();
    let write = engine.observe_transition(&previous, TransitionSignal::Committed);
    assert_eq!(write.map(|w| w.url), Some("/list?page=9".to_string()));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_faulty_route_handler_leaves_engine_usable() {
    let mut engine = engine("/");
    engine
        .register_routes(RouteMap::new().route("/boom", |_| Some(Action::Fail)))
        .unwrap();
    engine
        .register_query_sync(page_sync("/boom", false))
        .unwrap();

    let error = engine.push("/boom").unwrap_err();
    assert!(error.is_dispatch());
    assert_eq!(error.to_string(), "Dispatch failed: reducer fault");
    assert!(!engine.context().is_applying());

    engine.dispatch(Action::SetPage(2)).unwrap();
    assert_eq!(
        writes(&engine),
        vec![
            (NavigationMode::Push, "/boom"),
            (NavigationMode::Replace, "/boom?page=2"),
        ]
    );
}

#[test]
fn test_faulty_user_dispatch_is_returned() {
    let mut engine = engine("/list");
    engine.mount(list_screen(false)).unwrap();

    assert!(engine.dispatch(Action::Fail).unwrap_err().is_dispatch());
    assert!(writes(&engine).is_empty());
}

#[test]
fn test_bad_template_is_reported() {
    let mut engine = engine("/");
    let error = engine
        .register_routes(RouteMap::new().route("/a/:", |_| Some(Action::List)))
        .unwrap_err();
    assert!(matches!(error, PatternError::EmptyParamName { .. }));
    assert_eq!(engine.registrations().count(), 0);
}

// ============================================================================
// Registration Tests
// ============================================================================

#[test]
fn test_unregister_stops_synchronization() {
    let mut engine = engine("/list");
    let id = engine.mount(list_screen(true)).unwrap();
    assert!(engine.unregister(id));

    engine.dispatch(Action::SetPage(5)).unwrap();
    assert!(writes(&engine).is_empty());

    engine.push("/list?page=7").unwrap();
    assert_eq!(engine.state().page, 5);
}

// ============================================================================
// Collaborator Tests
// ============================================================================

#[test]
fn test_headless_with_reducer_store() {
    init_logging();
    let store = ReducerStore::new(AppState::default(), |state: &mut AppState, action| {
        if let Action::SetPage(page) = action {
            state.page = page;
        }
    });
    let mut engine = SyncEngine::new(store, NoopHistory::new("/list"));
    engine.mount(ScreenSync::new("list").query(list_page(false))).unwrap();

    let dispatched = engine.dispatch(Action::SetPage(2)).unwrap();
    assert!(dispatched.write.is_some());
    assert_eq!(engine.history().location().to_path(), "/list");
    assert_eq!(engine.store().dispatched(), 1);
}

#[cfg(feature = "cache")]
#[test]
fn test_route_resolution_is_cached() {
    let mut engine = engine("/");
    engine.mount(pages_screen()).unwrap();

    engine.push("/pages/custom").unwrap();
    engine.push("/pages/custom").unwrap();
    assert!(engine.cache_stats().hits >= 1);
}
