//! Router context integration for GPUI
//!
//! The router lives in the app as the [`GlobalRouter`] global. Navigation
//! goes through the static [`Navigator`] API, which parses route
//! information, commits the resulting [`MatchList`] and records the host
//! history entry.
//!
//! Navigations settle synchronously unless a redirect callback is
//! asynchronous. Pending redirects are driven on the foreground executor and
//! commit whenever they finish, so the navigation that completes last wins.
//!
//! # Example
//!
//! ```ignore
//! use gpui_shell_router::{init_router, Navigator, Route};
//!
//! init_router(cx, |router| {
//!     router
//!         .route(Route::new("/", |_cx, _state| gpui::div()))
//!         .route(Route::new("/users/:id", |_cx, _state| gpui::div()).name("user"))
//! });
//!
//! Navigator::go(cx, "/users/42");
//! let result = Navigator::push(cx, "/users/7");
//! ```

use crate::codec::ExtraCodec;
use crate::configuration::{RouteConfiguration, RouteConfigurationBuilder};
use crate::error::{ConfigurationError, RouterError};
use crate::history::{History, DEFAULT_MAX_SIZE};
use crate::match_list::{Completer, Extra, MatchFrame, MatchList, PopResult, ShellFrame, ShellKind};
use crate::params::{QueryParams, RouteParams};
use crate::parser::{NavigatingType, RouteInformation, RouteInformationParser};
use crate::redirect::{Resolution, RouteRedirect};
use crate::route::{NavigatorKey, RouteBase, StatefulShellRoute};
use crate::state::RouteState;
use crate::{debug_log, info_log, warn_log};
use gpui::{AnyElement, App, BorrowAppContext, Global};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// GlobalRouter
// ============================================================================

/// What a committed navigation does to the host history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// New history entry
    Push,
    /// Overwrite the current entry
    Replace,
    /// Leave history alone (back/forward already moved it)
    Keep,
    /// Keep the current list when the new one is equal, then overwrite the entry
    Restore,
}

/// Router state stored as a GPUI global
pub struct GlobalRouter {
    parser: RouteInformationParser,
    current: MatchList,
    history: History,
    /// Last committed list per stateful shell branch navigator
    branches: HashMap<NavigatorKey, MatchList>,
}

impl GlobalRouter {
    pub fn new(configuration: Arc<RouteConfiguration>, initial_location: &str, max_history: usize) -> Self {
        let current = configuration.find_match(initial_location, None);
        Self {
            parser: RouteInformationParser::new(configuration),
            current,
            history: History::with_max_size(RouteInformation::new(initial_location), max_history),
            branches: HashMap::new(),
        }
    }

    pub fn parser(&self) -> &RouteInformationParser {
        &self.parser
    }

    pub fn configuration(&self) -> &Arc<RouteConfiguration> {
        self.parser.configuration()
    }

    /// Committed list
    pub fn current_match(&self) -> &MatchList {
        &self.current
    }

    /// Location shown to the user
    pub fn current_location(&self) -> String {
        self.parser.reported_location(&self.current)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Make `list` the current list
    pub fn commit(&mut self, list: MatchList, mode: Commit) {
        self.current = match mode {
            Commit::Restore => self.current.restore(list),
            _ => list,
        };
        debug_log!("Committed '{}' ({:?})", self.current.location(), mode);
        self.remember_branches();

        let entry = self.parser.restore_route_information(&self.current);
        match mode {
            Commit::Push => {
                self.history.push(entry);
            }
            Commit::Replace | Commit::Restore => {
                self.history.replace(entry);
            }
            Commit::Keep => {}
        }
    }

    /// Last committed list of a stateful shell branch
    pub fn branch_stack(&self, key: &NavigatorKey) -> Option<&MatchList> {
        self.branches.get(key)
    }

    fn remember_branches(&mut self) {
        for frame in self.current.frames() {
            if let MatchFrame::Shell(ShellFrame {
                shell: ShellKind::Stateful { route, branch },
                ..
            }) = frame
            {
                if let Some(branch) = route.branches().get(*branch) {
                    self.branches
                        .insert(branch.key().clone(), self.current.clone());
                }
            }
        }
    }

    /// Swap in a new route tree
    ///
    /// The current list still refers to the old tree until the next
    /// navigation; [`Navigator::reload`] re-resolves it.
    pub fn set_configuration(&mut self, configuration: Arc<RouteConfiguration>) {
        info_log!("Replacing route configuration");
        self.parser = RouteInformationParser::new(configuration);
        self.branches.clear();
    }
}

impl Global for GlobalRouter {}

/// Trait for accessing the global router from context
pub trait UseRouter {
    /// Get reference to global router
    fn router(&self) -> &GlobalRouter;

    /// Update global router
    fn update_router<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut GlobalRouter, &mut App) -> R;
}

impl UseRouter for App {
    fn router(&self) -> &GlobalRouter {
        self.global::<GlobalRouter>()
    }

    fn update_router<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut GlobalRouter, &mut App) -> R,
    {
        self.update_global(f)
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Router options for [`init_router`]
pub struct RouterBuilder {
    configuration: RouteConfigurationBuilder,
    initial_location: String,
    max_history: usize,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            configuration: RouteConfiguration::builder(),
            initial_location: "/".to_string(),
            max_history: DEFAULT_MAX_SIZE,
        }
    }

    pub fn route(mut self, route: impl Into<RouteBase>) -> Self {
        self.configuration = self.configuration.route(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteBase>) -> Self {
        self.configuration = self.configuration.routes(routes);
        self
    }

    /// Top-level redirect
    pub fn redirect(mut self, redirect: impl RouteRedirect) -> Self {
        self.configuration = self.configuration.redirect(redirect);
        self
    }

    pub fn redirect_limit(mut self, limit: usize) -> Self {
        self.configuration = self.configuration.redirect_limit(limit);
        self
    }

    pub fn extra_codec(mut self, codec: impl ExtraCodec) -> Self {
        self.configuration = self.configuration.extra_codec(codec);
        self
    }

    pub fn on_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&App, &MatchList, &RouteConfiguration) -> MatchList + Send + Sync + 'static,
    {
        self.configuration = self.configuration.on_exception(handler);
        self
    }

    pub fn root_navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.configuration = self.configuration.root_navigator_key(key);
        self
    }

    pub fn url_reflects_imperative_apis(mut self, enabled: bool) -> Self {
        self.configuration = self.configuration.url_reflects_imperative_apis(enabled);
        self
    }

    #[cfg(feature = "cache")]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.configuration = self.configuration.cache_capacity(capacity);
        self
    }

    /// Location resolved at startup (default `/`)
    pub fn initial_location(mut self, location: impl Into<String>) -> Self {
        self.initial_location = location.into();
        self
    }

    /// Maximum number of history entries (default 1000, 0 = unlimited)
    pub fn max_history(mut self, size: usize) -> Self {
        self.max_history = size;
        self
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize the global router
///
/// # Panics
///
/// Panics when the route tree is invalid. Use [`try_init_router`] to handle
/// the error instead.
pub fn init_router<F>(cx: &mut App, configure: F)
where
    F: FnOnce(RouterBuilder) -> RouterBuilder,
{
    if let Err(error) = try_init_router(cx, configure) {
        panic!("invalid route configuration: {error}");
    }
}

/// Initialize the global router, returning configuration errors
pub fn try_init_router<F>(cx: &mut App, configure: F) -> Result<(), ConfigurationError>
where
    F: FnOnce(RouterBuilder) -> RouterBuilder,
{
    let builder = configure(RouterBuilder::new());
    let configuration = Arc::new(builder.configuration.build()?);
    let initial = RouteInformation::new(builder.initial_location.clone());

    cx.set_global(GlobalRouter::new(
        configuration,
        &builder.initial_location,
        builder.max_history,
    ));
    navigate(cx, initial, Commit::Replace);
    Ok(())
}

// ============================================================================
// Navigation driver
// ============================================================================

fn navigate(cx: &mut App, information: RouteInformation, mode: Commit) {
    let parser = cx.global::<GlobalRouter>().parser.clone();
    match parser.parse(cx, information) {
        Resolution::Ready(list) => commit(cx, list, mode),
        Resolution::Pending(pending) => {
            debug_log!("Waiting on redirect for '{}'", pending.location());
            cx.spawn(async move |cx| {
                let mut pending = pending;
                loop {
                    let continuation = pending.wait().await;
                    match cx.update(|cx| continuation.resume(cx)) {
                        Ok(Resolution::Ready(list)) => {
                            if cx.update(|cx| commit(cx, list, mode)).is_err() {
                                debug_log!("App released before navigation committed");
                            }
                            return;
                        }
                        Ok(Resolution::Pending(next)) => pending = next,
                        Err(_) => {
                            debug_log!("App released while a redirect was pending");
                            return;
                        }
                    }
                }
            })
            .detach();
        }
    }
}

fn commit(cx: &mut App, list: MatchList, mode: Commit) {
    cx.update_global::<GlobalRouter, _>(|router, _| router.commit(list, mode));
}

fn imperative(
    cx: &mut App,
    kind: NavigatingType,
    location: String,
    extra: Option<Extra>,
    mode: Commit,
) -> PopResult {
    let (completer, result) = Completer::new();
    let base = cx.global::<GlobalRouter>().current.clone();
    navigate(
        cx,
        RouteInformation::navigation(location, kind, base, extra, Some(completer)),
        mode,
    );
    result
}

fn go_inner(cx: &mut App, location: String, extra: Option<Extra>) {
    let base = cx.global::<GlobalRouter>().current.clone();
    navigate(
        cx,
        RouteInformation::navigation(location, NavigatingType::Go, base, extra, None),
        Commit::Push,
    );
}

fn pop_inner(cx: &mut App, result: Option<Extra>) {
    cx.update_global::<GlobalRouter, _>(|router, _| {
        if !router.current.can_pop() {
            warn_log!("There is nothing to pop at '{}'", router.current.location());
            return;
        }
        let list = router.current.pop(result);
        router.commit(list, Commit::Replace);
    });
}

fn build_page(cx: &mut App, list: &MatchList) -> Option<AnyElement> {
    let index = list
        .frames()
        .iter()
        .rposition(|frame| matches!(frame, MatchFrame::Route(_)))?;
    let frame = list.frames().get(index)?.as_route()?;
    let state = RouteState::for_frame(list, frame);

    let mut element = frame.route.build(cx, &state)?;
    for wrapper in list.frames()[..index].iter().rev() {
        if let MatchFrame::Shell(shell) = wrapper {
            element = match &shell.shell {
                ShellKind::Shell(route) => route.build(cx, &state, element),
                ShellKind::Stateful { route, branch } => route.build(cx, &state, *branch, element),
            };
        }
    }
    Some(element)
}

// ============================================================================
// Navigator
// ============================================================================

/// Static navigation API over the global router
pub struct Navigator;

impl Navigator {
    /// Replace the whole stack with `location`
    pub fn go(cx: &mut App, location: impl Into<String>) {
        go_inner(cx, location.into(), None);
    }

    pub fn go_with_extra(cx: &mut App, location: impl Into<String>, extra: Extra) {
        go_inner(cx, location.into(), Some(extra));
    }

    /// [`go`](Self::go) to a named route
    pub fn go_named(
        cx: &mut App,
        name: &str,
        params: &RouteParams,
        query: &QueryParams,
    ) -> Result<(), RouterError> {
        let location = Self::named_location(cx, name, params, query)?;
        go_inner(cx, location, None);
        Ok(())
    }

    /// Switch a stateful shell to the branch at `index`
    ///
    /// Brings back the stack the branch had when it was left, pushed pages
    /// included. A branch never visited opens at its initial location.
    pub fn go_branch(
        cx: &mut App,
        shell: &StatefulShellRoute,
        index: usize,
    ) -> Result<(), RouterError> {
        let branch = shell
            .branches()
            .get(index)
            .ok_or(RouterError::UnknownBranch { index })?;
        let router = cx.global::<GlobalRouter>();

        if let Some(saved) = router.branches.get(branch.key()).cloned() {
            debug_log!("Restoring branch '{}' at '{}'", branch.key(), saved.location());
            commit(cx, saved, Commit::Push);
            return Ok(());
        }

        let location = router
            .configuration()
            .effective_initial_location(branch)
            .map(str::to_string)
            .ok_or(RouterError::UnknownBranch { index })?;
        go_inner(cx, location, None);
        Ok(())
    }

    /// Push `location` on top of the stack
    ///
    /// The returned future resolves with the value the page is popped with,
    /// or `None` when it is discarded without a pop.
    pub fn push(cx: &mut App, location: impl Into<String>) -> PopResult {
        imperative(cx, NavigatingType::Push, location.into(), None, Commit::Push)
    }

    pub fn push_with_extra(cx: &mut App, location: impl Into<String>, extra: Extra) -> PopResult {
        imperative(cx, NavigatingType::Push, location.into(), Some(extra), Commit::Push)
    }

    /// [`push`](Self::push) a named route
    pub fn push_named(
        cx: &mut App,
        name: &str,
        params: &RouteParams,
        query: &QueryParams,
    ) -> Result<PopResult, RouterError> {
        let location = Self::named_location(cx, name, params, query)?;
        Ok(imperative(cx, NavigatingType::Push, location, None, Commit::Push))
    }

    /// Remove the top page and push `location` with a fresh page key
    pub fn push_replacement(cx: &mut App, location: impl Into<String>) -> PopResult {
        imperative(
            cx,
            NavigatingType::PushReplacement,
            location.into(),
            None,
            Commit::Replace,
        )
    }

    /// Replace the top page with `location`, keeping its page key
    pub fn replace(cx: &mut App, location: impl Into<String>) -> PopResult {
        imperative(cx, NavigatingType::Replace, location.into(), None, Commit::Replace)
    }

    /// Remove the top page
    pub fn pop(cx: &mut App) {
        pop_inner(cx, None);
    }

    /// Remove the top page, resolving its [`PopResult`] with `result`
    pub fn pop_with_result(cx: &mut App, result: Extra) {
        pop_inner(cx, Some(result));
    }

    /// Check if the stack has a page to pop
    pub fn can_pop(cx: &App) -> bool {
        cx.global::<GlobalRouter>().current.can_pop()
    }

    /// Step back in the host history
    pub fn back(cx: &mut App) {
        let entry = cx.update_global::<GlobalRouter, _>(|router, _| {
            router.history.back().map(|_| router.history.current().clone())
        });
        match entry {
            Some(entry) => navigate(cx, entry, Commit::Keep),
            None => {
                debug_log!("Already at the oldest history entry");
            }
        }
    }

    /// Step forward in the host history
    pub fn forward(cx: &mut App) {
        let entry = cx.update_global::<GlobalRouter, _>(|router, _| {
            router.history.forward().map(|_| router.history.current().clone())
        });
        match entry {
            Some(entry) => navigate(cx, entry, Commit::Keep),
            None => {
                debug_log!("Already at the newest history entry");
            }
        }
    }

    pub fn can_go_back(cx: &App) -> bool {
        cx.global::<GlobalRouter>().history.can_go_back()
    }

    pub fn can_go_forward(cx: &App) -> bool {
        cx.global::<GlobalRouter>().history.can_go_forward()
    }

    /// Apply route information reported by the host
    ///
    /// The current list is kept when the information resolves to the same
    /// location.
    pub fn restore(cx: &mut App, information: RouteInformation) {
        navigate(cx, information, Commit::Restore);
    }

    /// Re-resolve the current history entry, e.g. after
    /// [`GlobalRouter::set_configuration`]
    pub fn reload(cx: &mut App) {
        let entry = cx.global::<GlobalRouter>().history.current().clone();
        navigate(cx, entry, Commit::Replace);
    }

    /// Replace the route tree and re-resolve the current entry
    pub fn set_configuration(cx: &mut App, configuration: RouteConfiguration) {
        cx.update_global::<GlobalRouter, _>(|router, _| {
            router.set_configuration(Arc::new(configuration));
        });
        Self::reload(cx);
    }

    /// Location shown to the user
    pub fn current_location(cx: &App) -> String {
        cx.global::<GlobalRouter>().current_location()
    }

    /// Committed list
    pub fn current_match(cx: &App) -> MatchList {
        cx.global::<GlobalRouter>().current.clone()
    }

    /// Location of a named route
    pub fn named_location(
        cx: &App,
        name: &str,
        params: &RouteParams,
        query: &QueryParams,
    ) -> Result<String, RouterError> {
        cx.global::<GlobalRouter>()
            .configuration()
            .named_location(name, params, query)
    }

    /// Build the top page, wrapped in the shells it sits in
    ///
    /// An imperative top frame is built from its own list.
    pub fn build_current_page(cx: &mut App) -> Option<AnyElement> {
        let current = cx.global::<GlobalRouter>().current.clone();
        match current.last() {
            Some(MatchFrame::Imperative(frame)) => build_page(cx, &frame.matches),
            _ => build_page(cx, &current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{redirect_fn, redirect_to, Redirect};
    use crate::route::{Route, ShellRoute, StatefulShellBranch};
    use futures::channel::oneshot;
    use gpui::{div, ParentElement, TestAppContext};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(path: &str) -> Route {
        Route::new(path.to_string(), |_, _| div())
    }

    fn init(cx: &mut TestAppContext) {
        cx.update(|cx| {
            init_router(cx, |router| {
                router
                    .route(page("/"))
                    .route(page("/users").child(page(":id").name("user")))
                    .route(page("/settings"))
                    .route(Route::redirect_only("/old", redirect_to("/settings")))
            });
        });
    }

    fn location(cx: &mut TestAppContext) -> String {
        cx.read(Navigator::current_location)
    }

    #[gpui::test]
    fn test_go_and_redirect(cx: &mut TestAppContext) {
        init(cx);
        assert_eq!(location(cx), "/");

        cx.update(|cx| Navigator::go(cx, "/users/42"));
        assert_eq!(location(cx), "/users/42");
        assert_eq!(
            cx.read(Navigator::current_match).path_params().get("id"),
            Some("42")
        );

        cx.update(|cx| Navigator::go(cx, "/old"));
        assert_eq!(location(cx), "/settings");
    }

    #[gpui::test]
    fn test_initial_location(cx: &mut TestAppContext) {
        cx.update(|cx| {
            init_router(cx, |router| {
                router
                    .route(page("/"))
                    .route(page("/start"))
                    .initial_location("/start")
            });
        });
        assert_eq!(location(cx), "/start");
        assert_eq!(cx.read(|cx| cx.router().history().len()), 1);
    }

    #[gpui::test]
    fn test_try_init_router_rejects_duplicate_names(cx: &mut TestAppContext) {
        let result = cx.update(|cx| {
            try_init_router(cx, |router| {
                router.route(page("/x").name("a")).route(page("/y").name("a"))
            })
        });
        assert!(matches!(result, Err(ConfigurationError::DuplicateRouteName { .. })));
    }

    #[gpui::test]
    fn test_try_init_router_rejects_self_redirect(cx: &mut TestAppContext) {
        let result = cx.update(|cx| {
            try_init_router(cx, |router| {
                router
                    .route(page("/"))
                    .route(Route::redirect_only("/login", redirect_to("/login")))
            })
        });
        assert!(matches!(result, Err(ConfigurationError::SelfRedirect { .. })));
        assert!(!cx.read(|cx| cx.has_global::<GlobalRouter>()));
    }

    #[gpui::test]
    fn test_push_and_pop_with_result(cx: &mut TestAppContext) {
        init(cx);
        let result = cx.update(|cx| Navigator::push(cx, "/settings"));
        assert!(cx.read(Navigator::can_pop));
        assert_eq!(location(cx), "/");

        cx.update(|cx| Navigator::pop_with_result(cx, Extra::new("saved")));
        assert!(!cx.read(Navigator::can_pop));

        let value = pollster::block_on(result);
        assert_eq!(value.and_then(|v| v.downcast_ref::<&str>().copied()), Some("saved"));
    }

    #[gpui::test]
    fn test_pop_declarative_frame(cx: &mut TestAppContext) {
        init(cx);
        cx.update(|cx| Navigator::go(cx, "/users/7?tab=posts"));
        assert!(cx.read(Navigator::can_pop));

        cx.update(|cx| Navigator::pop(cx));
        assert_eq!(location(cx), "/users?tab=posts");
        assert!(cx.read(Navigator::current_match).path_params().is_empty());
    }

    #[gpui::test]
    fn test_replace_and_push_replacement(cx: &mut TestAppContext) {
        init(cx);
        let first = cx.update(|cx| Navigator::push(cx, "/settings"));
        let key = cx
            .read(Navigator::current_match)
            .last()
            .unwrap()
            .page_key()
            .clone();

        cx.update(|cx| Navigator::replace(cx, "/users/1"));
        let list = cx.read(Navigator::current_match);
        assert_eq!(list.last().unwrap().page_key(), &key);
        assert_eq!(list.frames().len(), 2);

        cx.update(|cx| Navigator::push_replacement(cx, "/users/2"));
        let list = cx.read(Navigator::current_match);
        assert_ne!(list.last().unwrap().page_key(), &key);
        assert_eq!(list.frames().len(), 2);

        assert!(pollster::block_on(first).is_none());
    }

    #[gpui::test]
    fn test_back_and_forward_restore_stack(cx: &mut TestAppContext) {
        init(cx);
        cx.update(|cx| Navigator::go(cx, "/users/1"));
        let _ = cx.update(|cx| Navigator::push(cx, "/settings"));
        let pushed = cx.read(Navigator::current_match);
        cx.update(|cx| Navigator::go(cx, "/"));

        assert!(cx.read(Navigator::can_go_back));
        cx.update(|cx| Navigator::back(cx));
        let restored = cx.read(Navigator::current_match);
        assert_eq!(restored, pushed);
        assert_eq!(restored.page_keys(), pushed.page_keys());

        cx.update(|cx| Navigator::back(cx));
        assert_eq!(location(cx), "/users/1");
        assert!(cx
            .read(Navigator::current_match)
            .imperative_frames()
            .next()
            .is_none());

        cx.update(|cx| Navigator::forward(cx));
        cx.update(|cx| Navigator::forward(cx));
        assert_eq!(location(cx), "/");
        assert!(!cx.read(Navigator::can_go_forward));
    }

    #[gpui::test]
    fn test_named_navigation(cx: &mut TestAppContext) {
        init(cx);
        let params: RouteParams = [("id", "a b")].into_iter().collect();
        let query: QueryParams = [("tab", "1")].into_iter().collect();

        cx.update(|cx| Navigator::go_named(cx, "user", &params, &query))
            .unwrap();
        assert_eq!(location(cx), "/users/a%20b?tab=1");

        let error = cx.update(|cx| Navigator::push_named(cx, "nope", &params, &query));
        assert!(matches!(error, Err(RouterError::UnknownRouteName { .. })));
    }

    #[gpui::test]
    fn test_restore_same_location_keeps_stack(cx: &mut TestAppContext) {
        init(cx);
        let _ = cx.update(|cx| Navigator::push(cx, "/settings"));
        let before = cx.read(Navigator::current_match);

        cx.update(|cx| Navigator::restore(cx, RouteInformation::new("/")));
        assert_eq!(cx.read(Navigator::current_match).page_keys(), before.page_keys());

        cx.update(|cx| Navigator::restore(cx, RouteInformation::new("/settings")));
        assert!(!cx.read(Navigator::can_pop));
    }

    #[gpui::test]
    fn test_pending_redirect_commits_when_done(cx: &mut TestAppContext) {
        let (sender, receiver) = oneshot::channel::<Option<String>>();
        let receiver = Arc::new(Mutex::new(Some(receiver)));
        cx.update(|cx| {
            init_router(cx, |router| {
                router
                    .route(page("/"))
                    .route(page("/login"))
                    .route(page("/fast"))
                    .route(page("/private"))
                    .redirect(redirect_fn(move |_, state| {
                        if state.matched_location() != "/private" {
                            return Redirect::none();
                        }
                        match receiver.lock().take() {
                            Some(receiver) => {
                                Redirect::pending(async move { receiver.await.ok().flatten() })
                            }
                            None => Redirect::none(),
                        }
                    }))
            });
        });

        cx.update(|cx| Navigator::go(cx, "/private"));
        cx.run_until_parked();
        assert_eq!(location(cx), "/");

        // a later navigation that settles first is overtaken by the slow one
        cx.update(|cx| Navigator::go(cx, "/fast"));
        assert_eq!(location(cx), "/fast");

        sender.send(Some("/login".to_string())).unwrap();
        cx.run_until_parked();
        assert_eq!(location(cx), "/login");
    }

    #[gpui::test]
    fn test_set_configuration_reloads(cx: &mut TestAppContext) {
        init(cx);
        cx.update(|cx| Navigator::go(cx, "/settings"));

        let config = RouteConfiguration::builder()
            .route(page("/"))
            .route(page("/settings").name("settings"))
            .build()
            .unwrap();
        cx.update(|cx| Navigator::set_configuration(cx, config));

        assert_eq!(location(cx), "/settings");
        let list = cx.read(Navigator::current_match);
        assert_eq!(list.last_route_frame().unwrap().route.route_name(), Some("settings"));
    }

    #[gpui::test]
    fn test_build_current_page_wraps_shells(cx: &mut TestAppContext) {
        let pages = Arc::new(AtomicUsize::new(0));
        let shells = Arc::new(AtomicUsize::new(0));
        let (page_count, shell_count) = (Arc::clone(&pages), Arc::clone(&shells));

        cx.update(|cx| {
            init_router(cx, |router| {
                router.route(page("/")).route(
                    ShellRoute::new(vec![Route::new("/inbox", move |_, _| {
                        page_count.fetch_add(1, Ordering::SeqCst);
                        div()
                    })
                    .into()])
                    .builder(move |_, _, child| {
                        shell_count.fetch_add(1, Ordering::SeqCst);
                        div().child(child)
                    }),
                )
            });
        });

        cx.update(|cx| Navigator::go(cx, "/inbox"));
        let built = cx.update(|cx| Navigator::build_current_page(cx).is_some());
        assert!(built);
        assert_eq!(pages.load(Ordering::SeqCst), 1);
        assert_eq!(shells.load(Ordering::SeqCst), 1);
    }

    #[gpui::test]
    fn test_pop_with_nothing_to_pop(cx: &mut TestAppContext) {
        init(cx);
        cx.update(|cx| Navigator::pop(cx));
        assert_eq!(location(cx), "/");
        assert_eq!(cx.read(|cx| cx.router().history().len()), 1);
    }

    #[gpui::test]
    fn test_replace_only_page_keeps_history_resolvable(cx: &mut TestAppContext) {
        cx.update(|cx| {
            init_router(cx, |router| {
                router
                    .route(page("/home"))
                    .route(page("/settings"))
                    .initial_location("/home")
            });
        });

        let _ = cx.update(|cx| Navigator::replace(cx, "/settings"));
        assert_eq!(location(cx), "/settings");
        assert!(!cx.read(Navigator::can_pop));

        cx.update(|cx| Navigator::go(cx, "/home"));
        cx.update(|cx| Navigator::back(cx));
        let list = cx.read(Navigator::current_match);
        assert_eq!(location(cx), "/settings");
        assert!(!list.is_error());
        assert_eq!(list.frames().len(), 1);
    }

    #[gpui::test]
    fn test_go_branch_restores_branch_stack(cx: &mut TestAppContext) {
        cx.update(|cx| {
            init_router(cx, |router| {
                router
                    .route(StatefulShellRoute::new(vec![
                        StatefulShellBranch::new(vec![page("/feed").child(page("detail")).into()])
                            .navigator_key("feed"),
                        StatefulShellBranch::new(vec![page("/profile").into()])
                            .navigator_key("profile"),
                    ]))
                    .initial_location("/feed")
            });
        });
        let shell = cx.read(|cx| match &cx.router().configuration().routes()[0] {
            RouteBase::StatefulShell(shell) => Arc::clone(shell),
            _ => panic!("expected stateful shell"),
        });

        let _ = cx.update(|cx| Navigator::push(cx, "/feed/detail"));
        assert_eq!(cx.read(Navigator::current_match).imperative_frames().count(), 1);

        cx.update(|cx| Navigator::go_branch(cx, &shell, 1)).unwrap();
        assert_eq!(location(cx), "/profile");
        assert_eq!(cx.read(Navigator::current_match).imperative_frames().count(), 0);

        cx.update(|cx| Navigator::go_branch(cx, &shell, 0)).unwrap();
        let list = cx.read(Navigator::current_match);
        assert_eq!(location(cx), "/feed");
        let pushed = list.imperative_frames().next().unwrap();
        assert_eq!(pushed.matches.location(), "/feed/detail");

        assert!(cx.read(|cx| cx.router().branch_stack(&NavigatorKey::new("profile")).is_some()));
        assert_eq!(
            cx.update(|cx| Navigator::go_branch(cx, &shell, 2)),
            Err(RouterError::UnknownBranch { index: 2 })
        );
    }
}
