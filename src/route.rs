//! Route tree definitions
//!
//! A route tree is built from three kinds of nodes, all wrapped in
//! [`RouteBase`]:
//!
//! - [`Route`] consumes a path prefix and may build a page
//! - [`ShellRoute`] wraps its children in a nested navigator without
//!   consuming any path
//! - [`StatefulShellRoute`] holds parallel [`StatefulShellBranch`]es, each with
//!   its own navigator and stack
//!
//! Nodes are immutable once part of a configuration. Replacing the tree means
//! building a new [`RouteConfiguration`](crate::RouteConfiguration).

use crate::error::ConfigurationError;
use crate::matcher::PathPattern;
use crate::redirect::{BoxedRedirect, RouteRedirect};
use crate::state::RouteState;
use gpui::{AnyElement, App, IntoElement};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Page builder for a leaf route
pub type PageBuilder = Arc<dyn Fn(&mut App, &RouteState) -> AnyElement + Send + Sync>;

/// Builder for a shell route; receives the nested navigator's content
pub type ShellBuilder =
    Arc<dyn Fn(&mut App, &RouteState, AnyElement) -> AnyElement + Send + Sync>;

/// Builder for a stateful shell route; receives the active branch index and
/// the branch navigator's content
pub type StatefulShellBuilder =
    Arc<dyn Fn(&mut App, &RouteState, usize, AnyElement) -> AnyElement + Send + Sync>;

// ============================================================================
// NavigatorKey
// ============================================================================

/// Identity of a navigator (the root one or one introduced by a shell)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigatorKey(Arc<str>);

static NEXT_NAVIGATOR: AtomicUsize = AtomicUsize::new(0);

impl NavigatorKey {
    /// Create a key with an explicit identity
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Default root navigator key
    pub fn root() -> Self {
        Self::new("root")
    }

    /// Mint a key that is unique within this process
    pub fn unique() -> Self {
        let id = NEXT_NAVIGATOR.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("navigator-{id}"))
    }

    /// Key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NavigatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NavigatorKey({})", self.0)
    }
}

impl fmt::Display for NavigatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NavigatorKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

// ============================================================================
// RouteBase
// ============================================================================

/// Node of the route tree
#[derive(Clone)]
pub enum RouteBase {
    /// Leaf route with a path template
    Route(Arc<Route>),
    /// Shell with one nested navigator
    Shell(Arc<ShellRoute>),
    /// Shell with parallel branch navigators
    StatefulShell(Arc<StatefulShellRoute>),
}

impl RouteBase {
    /// Direct children of this node
    ///
    /// For a stateful shell these are the routes of every branch, in
    /// branch order.
    pub fn routes(&self) -> Vec<&RouteBase> {
        match self {
            RouteBase::Route(route) => route.routes.iter().collect(),
            RouteBase::Shell(shell) => shell.routes.iter().collect(),
            RouteBase::StatefulShell(shell) => shell
                .branches
                .iter()
                .flat_map(|branch| branch.routes.iter())
                .collect(),
        }
    }

    /// Navigator this node is placed in, when set explicitly
    pub fn parent_navigator_key(&self) -> Option<&NavigatorKey> {
        match self {
            RouteBase::Route(route) => route.parent_navigator_key.as_ref(),
            RouteBase::Shell(shell) => shell.parent_navigator_key.as_ref(),
            RouteBase::StatefulShell(shell) => shell.parent_navigator_key.as_ref(),
        }
    }

    /// The leaf route, if this node is one
    pub fn as_route(&self) -> Option<&Arc<Route>> {
        match self {
            RouteBase::Route(route) => Some(route),
            _ => None,
        }
    }
}

impl fmt::Debug for RouteBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteBase::Route(route) => route.fmt(f),
            RouteBase::Shell(shell) => shell.fmt(f),
            RouteBase::StatefulShell(shell) => shell.fmt(f),
        }
    }
}

impl From<Route> for RouteBase {
    fn from(route: Route) -> Self {
        RouteBase::Route(Arc::new(route))
    }
}

impl From<ShellRoute> for RouteBase {
    fn from(shell: ShellRoute) -> Self {
        RouteBase::Shell(Arc::new(shell))
    }
}

impl From<StatefulShellRoute> for RouteBase {
    fn from(shell: StatefulShellRoute) -> Self {
        RouteBase::StatefulShell(Arc::new(shell))
    }
}

// ============================================================================
// Route
// ============================================================================

/// Leaf route
///
/// Top-level routes (and routes directly under a top-level shell) use
/// absolute templates like `/family/:fid`. Nested routes are relative,
/// like `person/:pid`.
///
/// # Example
///
/// ```ignore
/// use gpui_shell_router::{redirect_to, Route};
/// use gpui::*;
///
/// Route::new("/family/:fid", |_cx, state| {
///     div().child(format!("Family {}", state.param("fid").unwrap_or("?")))
/// })
/// .name("family")
/// .child(Route::new("person/:pid", |_cx, _state| div()));
///
/// Route::redirect_only("/", redirect_to("/family/f1"));
/// ```
pub struct Route {
    path: String,
    pattern: PathPattern,
    name: Option<String>,
    builder: Option<PageBuilder>,
    redirect: Option<BoxedRedirect>,
    parent_navigator_key: Option<NavigatorKey>,
    routes: Vec<RouteBase>,
}

impl Route {
    /// Create a route without a page builder or redirect
    ///
    /// Add one with [`Route::builder`] or [`Route::redirect`] before the route
    /// is used in a configuration.
    ///
    /// # Panics
    ///
    /// Panics if the path template is malformed. Use [`Route::try_at`] to
    /// handle the error.
    pub fn at(path: impl Into<String>) -> Self {
        match Self::try_at(path) {
            Ok(route) => route,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a route without content, returning malformed templates as errors
    pub fn try_at(path: impl Into<String>) -> Result<Self, ConfigurationError> {
        let path = path.into();
        let pattern = PathPattern::parse(&path)?;
        Ok(Self {
            path,
            pattern,
            name: None,
            builder: None,
            redirect: None,
            parent_navigator_key: None,
            routes: Vec::new(),
        })
    }

    /// Create a route with a page builder
    ///
    /// # Panics
    ///
    /// Panics if the path template is malformed. Use [`Route::try_new`] to
    /// handle the error.
    pub fn new<F, E>(path: impl Into<String>, builder: F) -> Self
    where
        E: IntoElement,
        F: Fn(&mut App, &RouteState) -> E + Send + Sync + 'static,
    {
        Self::at(path).builder(builder)
    }

    /// Create a route with a page builder, returning malformed templates as errors
    pub fn try_new<F, E>(path: impl Into<String>, builder: F) -> Result<Self, ConfigurationError>
    where
        E: IntoElement,
        F: Fn(&mut App, &RouteState) -> E + Send + Sync + 'static,
    {
        Ok(Self::try_at(path)?.builder(builder))
    }

    /// Create a route whose only job is to redirect
    ///
    /// # Panics
    ///
    /// Panics if the path template is malformed.
    pub fn redirect_only(path: impl Into<String>, redirect: impl RouteRedirect) -> Self {
        Self::at(path).redirect(redirect)
    }

    /// Set the page builder
    pub fn builder<F, E>(mut self, builder: F) -> Self
    where
        E: IntoElement,
        F: Fn(&mut App, &RouteState) -> E + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(move |cx, state| {
            builder(cx, state).into_any_element()
        }));
        self
    }

    /// Set the route-level redirect
    pub fn redirect(mut self, redirect: impl RouteRedirect) -> Self {
        self.redirect = Some(Arc::new(redirect));
        self
    }

    /// Set route name
    ///
    /// Names are unique across the whole tree.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Place this route's page in an ancestor navigator
    pub fn parent_navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.parent_navigator_key = Some(key.into());
        self
    }

    /// Replace child routes
    pub fn children(mut self, routes: Vec<RouteBase>) -> Self {
        self.routes = routes;
        self
    }

    /// Add a single child route
    pub fn child(mut self, route: impl Into<RouteBase>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// Path template as written
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Compiled path template
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Route name
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Route-level redirect
    pub fn redirect_handler(&self) -> Option<&BoxedRedirect> {
        self.redirect.as_ref()
    }

    /// Explicit parent navigator
    pub fn parent_navigator(&self) -> Option<&NavigatorKey> {
        self.parent_navigator_key.as_ref()
    }

    /// Child routes
    pub fn routes(&self) -> &[RouteBase] {
        &self.routes
    }

    /// Check if the route redirects but has no page of its own
    pub fn is_redirect_only(&self) -> bool {
        self.builder.is_none() && self.redirect.is_some()
    }

    /// Check if the route can produce a page
    pub fn has_builder(&self) -> bool {
        self.builder.is_some()
    }

    /// Build the page for this route
    pub fn build(&self, cx: &mut App, state: &RouteState) -> Option<AnyElement> {
        self.builder.as_ref().map(|builder| builder(cx, state))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("redirect", &self.redirect.as_ref().map(|r| r.name()))
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ShellRoute
// ============================================================================

/// Route that displays its children inside a nested navigator
pub struct ShellRoute {
    navigator_key: NavigatorKey,
    parent_navigator_key: Option<NavigatorKey>,
    builder: Option<ShellBuilder>,
    routes: Vec<RouteBase>,
}

impl ShellRoute {
    /// Create a shell around `routes` with a freshly minted navigator key
    pub fn new(routes: Vec<RouteBase>) -> Self {
        Self {
            navigator_key: NavigatorKey::unique(),
            parent_navigator_key: None,
            builder: None,
            routes,
        }
    }

    /// Set the nested navigator's key
    pub fn navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.navigator_key = key.into();
        self
    }

    /// Place the shell in an ancestor navigator
    pub fn parent_navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.parent_navigator_key = Some(key.into());
        self
    }

    /// Set the shell builder
    pub fn builder<F, E>(mut self, builder: F) -> Self
    where
        E: IntoElement,
        F: Fn(&mut App, &RouteState, AnyElement) -> E + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(move |cx, state, child| {
            builder(cx, state, child).into_any_element()
        }));
        self
    }

    /// Key of the nested navigator
    pub fn key(&self) -> &NavigatorKey {
        &self.navigator_key
    }

    /// Child routes
    pub fn routes(&self) -> &[RouteBase] {
        &self.routes
    }

    /// Wrap the nested navigator's content; without a builder the content is
    /// returned unchanged
    pub fn build(&self, cx: &mut App, state: &RouteState, child: AnyElement) -> AnyElement {
        match &self.builder {
            Some(builder) => builder(cx, state, child),
            None => child,
        }
    }
}

impl fmt::Debug for ShellRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellRoute")
            .field("navigator_key", &self.navigator_key)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// StatefulShellRoute
// ============================================================================

/// One branch of a [`StatefulShellRoute`]
pub struct StatefulShellBranch {
    navigator_key: NavigatorKey,
    initial_location: Option<String>,
    routes: Vec<RouteBase>,
}

impl StatefulShellBranch {
    /// Create a branch with a freshly minted navigator key
    pub fn new(routes: Vec<RouteBase>) -> Self {
        Self {
            navigator_key: NavigatorKey::unique(),
            initial_location: None,
            routes,
        }
    }

    /// Set the branch navigator's key
    pub fn navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.navigator_key = key.into();
        self
    }

    /// Location shown when the branch is first opened
    ///
    /// Must resolve to a route of this branch. Defaults to the first route
    /// of the branch.
    pub fn initial_location(mut self, location: impl Into<String>) -> Self {
        self.initial_location = Some(location.into());
        self
    }

    /// Key of the branch navigator
    pub fn key(&self) -> &NavigatorKey {
        &self.navigator_key
    }

    /// Explicit initial location
    pub fn explicit_initial_location(&self) -> Option<&str> {
        self.initial_location.as_deref()
    }

    /// Routes of this branch
    pub fn routes(&self) -> &[RouteBase] {
        &self.routes
    }
}

impl fmt::Debug for StatefulShellBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulShellBranch")
            .field("navigator_key", &self.navigator_key)
            .field("initial_location", &self.initial_location)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Shell whose branches keep independent navigation stacks
pub struct StatefulShellRoute {
    branches: Vec<StatefulShellBranch>,
    parent_navigator_key: Option<NavigatorKey>,
    builder: Option<StatefulShellBuilder>,
}

impl StatefulShellRoute {
    /// Create a stateful shell from its branches
    pub fn new(branches: Vec<StatefulShellBranch>) -> Self {
        Self {
            branches,
            parent_navigator_key: None,
            builder: None,
        }
    }

    /// Place the shell in an ancestor navigator
    pub fn parent_navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.parent_navigator_key = Some(key.into());
        self
    }

    /// Set the shell builder
    pub fn builder<F, E>(mut self, builder: F) -> Self
    where
        E: IntoElement,
        F: Fn(&mut App, &RouteState, usize, AnyElement) -> E + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(move |cx, state, branch, child| {
            builder(cx, state, branch, child).into_any_element()
        }));
        self
    }

    /// Branches in declaration order
    pub fn branches(&self) -> &[StatefulShellBranch] {
        &self.branches
    }

    /// Identity used as the page key of this shell
    pub fn shell_key(&self) -> String {
        let keys: Vec<&str> = self.branches.iter().map(|b| b.key().as_str()).collect();
        format!("stateful:{}", keys.join("|"))
    }

    /// Wrap the active branch's content; without a builder the content is
    /// returned unchanged
    pub fn build(
        &self,
        cx: &mut App,
        state: &RouteState,
        branch: usize,
        child: AnyElement,
    ) -> AnyElement {
        match &self.builder {
            Some(builder) => builder(cx, state, branch, child),
            None => child,
        }
    }
}

impl fmt::Debug for StatefulShellRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulShellRoute")
            .field("branches", &self.branches)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::redirect_to;
    use gpui::div;

    #[test]
    fn test_route_builder_methods() {
        let route = Route::new("/family/:fid", |_, _| div())
            .name("family")
            .child(Route::new("person/:pid", |_, _| div()));

        assert_eq!(route.path(), "/family/:fid");
        assert_eq!(route.route_name(), Some("family"));
        assert_eq!(route.routes().len(), 1);
        assert!(route.has_builder());
        assert!(!route.is_redirect_only());
    }

    #[test]
    fn test_redirect_only_route() {
        let route = Route::redirect_only("/", redirect_to("/home"));
        assert!(route.is_redirect_only());
        assert!(route.redirect_handler().is_some());
    }

    #[test]
    fn test_try_new_rejects_malformed_template() {
        let result = Route::try_new("/users/:", |_, _| div());
        assert!(matches!(result, Err(ConfigurationError::InvalidPath { .. })));
    }

    #[test]
    #[should_panic(expected = "invalid route path")]
    fn test_new_panics_on_malformed_template() {
        let _ = Route::new("a//b", |_, _| div());
    }

    #[test]
    fn test_navigator_keys() {
        assert_eq!(NavigatorKey::root().as_str(), "root");
        assert_ne!(NavigatorKey::unique(), NavigatorKey::unique());

        let shell = ShellRoute::new(vec![]).navigator_key("tabs");
        assert_eq!(shell.key().as_str(), "tabs");
    }

    #[test]
    fn test_route_base_children() {
        let shell: RouteBase = StatefulShellRoute::new(vec![
            StatefulShellBranch::new(vec![Route::new("/a", |_, _| div()).into()]),
            StatefulShellBranch::new(vec![
                Route::new("/b", |_, _| div()).into(),
                Route::new("/c", |_, _| div()).into(),
            ]),
        ])
        .into();

        assert_eq!(shell.routes().len(), 3);
        assert!(shell.as_route().is_none());
    }
}
