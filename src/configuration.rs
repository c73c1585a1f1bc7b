//! Route configuration
//!
//! [`RouteConfiguration`] owns a validated route tree together with the
//! options that drive resolution. Building it checks the whole tree up front,
//! so defects surface at configuration time instead of at navigation time:
//!
//! - path shape (absolute at the top level, relative below)
//! - duplicate path parameters along a branch of the tree
//! - route names unique across the tree
//! - navigator references pointing at an ancestor navigator
//! - stateful shell branch initial locations
//! - redirect-only routes redirecting to themselves
//!
//! # Example
//!
//! ```ignore
//! use gpui_shell_router::{redirect_to, Route, RouteConfiguration};
//! use gpui::*;
//!
//! let config = RouteConfiguration::builder()
//!     .route(Route::redirect_only("/", redirect_to("/family/f1")))
//!     .route(
//!         Route::new("/family/:fid", |_cx, _state| div())
//!             .name("family")
//!             .child(Route::new("person/:pid", |_cx, _state| div()).name("person")),
//!     )
//!     .redirect_limit(5)
//!     .build()?;
//! ```

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, MatchCache};
use crate::codec::ExtraCodec;
use crate::error::{ConfigurationError, ExceptionHandler, RouterError};
use crate::match_list::{Extra, MatchFrame, MatchList, ShellFrame, ShellKind};
use crate::matcher::{concatenate_paths, PathPattern};
use crate::params::{encode_component, QueryParams, RouteParams};
use crate::redirect::{BoxedRedirect, RouteRedirect};
use crate::resolve::{resolve, ResolvedFrames};
use crate::route::{NavigatorKey, Route, RouteBase, StatefulShellBranch, StatefulShellRoute};
use crate::uri::{canonical_uri, Uri};
use crate::{debug_log, info_log};
use gpui::App;
#[cfg(feature = "cache")]
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const DEFAULT_REDIRECT_LIMIT: usize = 5;

// ============================================================================
// RouteConfiguration
// ============================================================================

/// Validated route tree and resolution options
pub struct RouteConfiguration {
    routes: Vec<RouteBase>,
    top_level_redirect: Option<BoxedRedirect>,
    redirect_limit: usize,
    extra_codec: Option<Arc<dyn ExtraCodec>>,
    on_exception: Option<ExceptionHandler>,
    root_navigator_key: NavigatorKey,
    url_reflects_imperative_apis: bool,
    names: HashMap<String, NamedRoute>,
    branch_locations: HashMap<NavigatorKey, String>,
    #[cfg(feature = "cache")]
    cache: Mutex<MatchCache>,
}

struct NamedRoute {
    route: Arc<Route>,
    pattern: PathPattern,
}

impl RouteConfiguration {
    /// Start building a configuration
    pub fn builder() -> RouteConfigurationBuilder {
        RouteConfigurationBuilder::new()
    }

    /// Top-level routes
    pub fn routes(&self) -> &[RouteBase] {
        &self.routes
    }

    /// Redirect applied before route-level redirects on every pass
    pub fn top_level_redirect(&self) -> Option<&BoxedRedirect> {
        self.top_level_redirect.as_ref()
    }

    /// Maximum number of redirects in one resolution
    pub fn redirect_limit(&self) -> usize {
        self.redirect_limit
    }

    /// Codec used to persist extras
    pub fn extra_codec(&self) -> Option<&Arc<dyn ExtraCodec>> {
        self.extra_codec.as_ref()
    }

    /// Handler for recoverable routing errors
    pub fn exception_handler(&self) -> Option<&ExceptionHandler> {
        self.on_exception.as_ref()
    }

    /// Key of the root navigator
    pub fn root_navigator_key(&self) -> &NavigatorKey {
        &self.root_navigator_key
    }

    /// Whether the reported location follows imperative pushes
    pub fn url_reflects_imperative_apis(&self) -> bool {
        self.url_reflects_imperative_apis
    }

    /// Resolve `location` against the tree
    ///
    /// Never fails: unmatched or malformed locations produce an error-tagged
    /// list.
    pub fn find_match(&self, location: &str, extra: Option<Extra>) -> MatchList {
        let uri = match canonical_uri(location) {
            Ok(uri) => uri,
            Err(error) => {
                debug_log!("Rejected location '{}': {}", location, error);
                return MatchList::error(Uri::parse(location), error, extra);
            }
        };

        match self.resolve_path(uri.path()) {
            Some(found) => MatchList::new(found.frames, uri, found.params, extra),
            None => {
                let location = uri.to_string();
                debug_log!("No routes for location: {}", location);
                MatchList::error(uri, RouterError::NoMatch { location }, extra)
            }
        }
    }

    #[cfg(feature = "cache")]
    fn resolve_path(&self, path: &str) -> Option<ResolvedFrames> {
        if let Some(cached) = self.cache.lock().get(path) {
            return cached;
        }
        let resolved = resolve(&self.routes, path, &self.root_navigator_key);
        self.cache.lock().insert(path.to_string(), resolved.clone());
        resolved
    }

    #[cfg(not(feature = "cache"))]
    fn resolve_path(&self, path: &str) -> Option<ResolvedFrames> {
        resolve(&self.routes, path, &self.root_navigator_key)
    }

    /// Resolution cache statistics
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats().clone()
    }

    /// Route registered under `name`
    pub fn route_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).map(|named| &named.route)
    }

    /// Template path from the root to the route named `name`
    pub fn full_path_for_name(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(|named| named.pattern.template())
    }

    /// Build a location for a named route
    ///
    /// Parameter values are percent-encoded. Every parameter of the route's
    /// path must be supplied and no others.
    pub fn named_location(
        &self,
        name: &str,
        path_params: &RouteParams,
        query: &QueryParams,
    ) -> Result<String, RouterError> {
        let named = self
            .names
            .get(name)
            .ok_or_else(|| RouterError::UnknownRouteName {
                name: name.to_string(),
            })?;

        let expected: HashSet<&str> = named.pattern.param_names().collect();
        if let Some((param, _)) = path_params
            .iter()
            .find(|(param, _)| !expected.contains(param.as_str()))
        {
            return Err(RouterError::UnknownParameter {
                param: param.clone(),
                path: named.pattern.template().to_string(),
            });
        }

        let encoded: RouteParams = path_params
            .iter()
            .map(|(k, v)| (k.clone(), encode_component(v)))
            .collect();
        let path = named.pattern.to_path(&encoded)?;

        Ok(if query.is_empty() {
            path
        } else {
            format!("{path}?{}", query.to_query_string())
        })
    }

    /// Template path from the root to `route`
    pub fn location_for_route(&self, route: &Route) -> Option<String> {
        fn search(routes: &[RouteBase], parent: &str, target: &Route) -> Option<String> {
            routes.iter().find_map(|node| match node {
                RouteBase::Route(route) => {
                    let full_path = concatenate_paths(parent, route.path());
                    if std::ptr::eq(route.as_ref(), target) {
                        Some(full_path)
                    } else {
                        search(route.routes(), &full_path, target)
                    }
                }
                RouteBase::Shell(shell) => search(shell.routes(), parent, target),
                RouteBase::StatefulShell(shell) => shell
                    .branches()
                    .iter()
                    .find_map(|branch| search(branch.routes(), parent, target)),
            })
        }

        search(&self.routes, "", route)
    }

    /// Location a stateful shell branch opens at
    ///
    /// The explicit initial location when set, otherwise the full path of
    /// the branch's first route.
    pub fn effective_initial_location(&self, branch: &StatefulShellBranch) -> Option<&str> {
        self.branch_locations.get(branch.key()).map(String::as_str)
    }

    fn check_self_redirects(&self, candidates: Vec<SelfRedirectCandidate>) -> Result<(), ConfigurationError> {
        for candidate in candidates {
            let list = self.find_match(&candidate.target, None);
            let hits_itself = list
                .last_route_frame()
                .is_some_and(|frame| Arc::ptr_eq(&frame.route, &candidate.route));
            if hits_itself {
                return Err(ConfigurationError::SelfRedirect {
                    path: candidate.full_path,
                    target: candidate.target,
                });
            }
        }
        Ok(())
    }

    fn check_branches(&mut self, branches: Vec<BranchCandidate>) -> Result<(), ConfigurationError> {
        for branch in branches {
            let location = match branch.explicit {
                Some(location) => {
                    let invalid = |reason: String| ConfigurationError::InvalidInitialLocation {
                        index: branch.index,
                        location: location.clone(),
                        reason,
                    };
                    let list = self.find_match(&location, None);
                    if let Some(error) = list.error_cause() {
                        return Err(invalid(error.to_string()));
                    }
                    if !resolves_into_branch(&list, &branch.shell, branch.index) {
                        return Err(invalid(
                            "location does not resolve to a route of this branch".to_string(),
                        ));
                    }
                    location
                }
                None => {
                    let (path, parameterized) = branch
                        .first_route
                        .ok_or(ConfigurationError::EmptyBranch { index: branch.index })?;
                    if parameterized {
                        return Err(ConfigurationError::ParameterizedDefaultLocation {
                            index: branch.index,
                            path,
                        });
                    }
                    path
                }
            };
            self.branch_locations.insert(branch.key, location);
        }
        Ok(())
    }

    #[cfg(feature = "cache")]
    fn reset_cache(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        cache.reset_stats();
    }

    #[cfg(not(feature = "cache"))]
    fn reset_cache(&self) {}
}

impl std::fmt::Debug for RouteConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteConfiguration")
            .field("routes", &self.routes)
            .field("redirect_limit", &self.redirect_limit)
            .field("root_navigator_key", &self.root_navigator_key)
            .finish_non_exhaustive()
    }
}

fn resolves_into_branch(list: &MatchList, shell: &Arc<StatefulShellRoute>, index: usize) -> bool {
    list.frames().iter().any(|frame| {
        matches!(
            frame,
            MatchFrame::Shell(ShellFrame {
                shell: ShellKind::Stateful { route, branch },
                ..
            }) if Arc::ptr_eq(route, shell) && *branch == index
        )
    })
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`RouteConfiguration`]
pub struct RouteConfigurationBuilder {
    routes: Vec<RouteBase>,
    redirect: Option<BoxedRedirect>,
    redirect_limit: usize,
    extra_codec: Option<Arc<dyn ExtraCodec>>,
    on_exception: Option<ExceptionHandler>,
    root_navigator_key: NavigatorKey,
    url_reflects_imperative_apis: bool,
    #[cfg(feature = "cache")]
    cache_capacity: usize,
}

impl RouteConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            redirect: None,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
            extra_codec: None,
            on_exception: None,
            root_navigator_key: NavigatorKey::root(),
            url_reflects_imperative_apis: false,
            #[cfg(feature = "cache")]
            cache_capacity: MatchCache::DEFAULT_CAPACITY,
        }
    }

    /// Add a top-level route
    pub fn route(mut self, route: impl Into<RouteBase>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// Add several top-level routes
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteBase>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Set the top-level redirect
    pub fn redirect(mut self, redirect: impl RouteRedirect) -> Self {
        self.redirect = Some(Arc::new(redirect));
        self
    }

    /// Maximum redirects per resolution (default 5)
    pub fn redirect_limit(mut self, limit: usize) -> Self {
        self.redirect_limit = limit;
        self
    }

    /// Persist extras with `codec`
    pub fn extra_codec(mut self, codec: impl ExtraCodec) -> Self {
        self.extra_codec = Some(Arc::new(codec));
        self
    }

    /// Replace error-tagged lists with the handler's result
    pub fn on_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&App, &MatchList, &RouteConfiguration) -> MatchList + Send + Sync + 'static,
    {
        self.on_exception = Some(Arc::new(handler));
        self
    }

    /// Key of the root navigator (default `root`)
    pub fn root_navigator_key(mut self, key: impl Into<NavigatorKey>) -> Self {
        self.root_navigator_key = key.into();
        self
    }

    /// Report the top imperative page's location instead of the declarative one
    pub fn url_reflects_imperative_apis(mut self, enabled: bool) -> Self {
        self.url_reflects_imperative_apis = enabled;
        self
    }

    /// Capacity of the resolution cache (default 256)
    #[cfg(feature = "cache")]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Validate the tree and build the configuration
    pub fn build(self) -> Result<RouteConfiguration, ConfigurationError> {
        if self.routes.is_empty() {
            return Err(ConfigurationError::NoRoutes);
        }

        let mut validator = Validator::default();
        validator.keys.insert(self.root_navigator_key.clone());
        let ancestors = vec![self.root_navigator_key.clone()];
        validator.walk(
            &self.routes,
            &Position {
                full_path: "",
                top_level: true,
                ancestors: &ancestors,
                params: &[],
            },
        )?;

        let mut configuration = RouteConfiguration {
            routes: self.routes,
            top_level_redirect: self.redirect,
            redirect_limit: self.redirect_limit,
            extra_codec: self.extra_codec,
            on_exception: self.on_exception,
            root_navigator_key: self.root_navigator_key,
            url_reflects_imperative_apis: self.url_reflects_imperative_apis,
            names: validator.names,
            branch_locations: HashMap::new(),
            #[cfg(feature = "cache")]
            cache: Mutex::new(MatchCache::with_capacity(self.cache_capacity)),
        };

        configuration.check_branches(validator.branches)?;
        configuration.check_self_redirects(validator.self_redirects)?;
        configuration.reset_cache();

        info_log!(
            "Route configuration built: {} top-level routes, {} named",
            configuration.routes.len(),
            configuration.names.len()
        );
        Ok(configuration)
    }
}

impl Default for RouteConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Validation
// ============================================================================

struct SelfRedirectCandidate {
    route: Arc<Route>,
    full_path: String,
    target: String,
}

struct BranchCandidate {
    shell: Arc<StatefulShellRoute>,
    index: usize,
    key: NavigatorKey,
    explicit: Option<String>,
    /// Full path of the first route and whether it has parameters
    first_route: Option<(String, bool)>,
}

#[derive(Default)]
struct Validator {
    names: HashMap<String, NamedRoute>,
    keys: HashSet<NavigatorKey>,
    branches: Vec<BranchCandidate>,
    self_redirects: Vec<SelfRedirectCandidate>,
}

struct Position<'a> {
    full_path: &'a str,
    top_level: bool,
    ancestors: &'a [NavigatorKey],
    params: &'a [String],
}

impl Validator {
    fn walk(&mut self, routes: &[RouteBase], at: &Position<'_>) -> Result<(), ConfigurationError> {
        for node in routes {
            if let Some(key) = node.parent_navigator_key() {
                if !at.ancestors.contains(key) {
                    return Err(ConfigurationError::InvalidNavigatorKey {
                        path: describe(node, at.full_path),
                        key: key.to_string(),
                    });
                }
            }

            match node {
                RouteBase::Route(route) => self.walk_route(route, at)?,
                RouteBase::Shell(shell) => {
                    self.claim_key(shell.key())?;
                    let ancestors = with_key(at.ancestors, shell.key());
                    self.walk(
                        shell.routes(),
                        &Position {
                            ancestors: &ancestors,
                            ..*at
                        },
                    )?;
                }
                RouteBase::StatefulShell(shell) => {
                    for (index, branch) in shell.branches().iter().enumerate() {
                        if branch.routes().is_empty() {
                            return Err(ConfigurationError::EmptyBranch { index });
                        }
                        self.claim_key(branch.key())?;
                        let ancestors = with_key(at.ancestors, branch.key());
                        self.walk(
                            branch.routes(),
                            &Position {
                                ancestors: &ancestors,
                                ..*at
                            },
                        )?;
                        self.branches.push(BranchCandidate {
                            shell: Arc::clone(shell),
                            index,
                            key: branch.key().clone(),
                            explicit: branch.explicit_initial_location().map(str::to_string),
                            first_route: first_route(branch.routes(), at.full_path),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn walk_route(&mut self, route: &Arc<Route>, at: &Position<'_>) -> Result<(), ConfigurationError> {
        let path = route.path();
        let invalid = |reason: &str| ConfigurationError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        if at.top_level && !path.starts_with('/') {
            return Err(invalid("top-level route paths must start with '/'"));
        }
        if !at.top_level && (path.starts_with('/') || path.ends_with('/')) {
            return Err(invalid("nested route paths must not start or end with '/'"));
        }

        let full_path = concatenate_paths(at.full_path, path);

        if !route.has_builder() && route.redirect_handler().is_none() {
            return Err(ConfigurationError::MissingContent { path: full_path });
        }

        let mut params = at.params.to_vec();
        for name in route.pattern().param_names() {
            if params.iter().any(|p| p == name) {
                return Err(ConfigurationError::DuplicateParameter {
                    param: name.to_string(),
                    full_path,
                });
            }
            params.push(name.to_string());
        }

        if let Some(name) = route.route_name() {
            if let Some(first) = self.names.get(name) {
                return Err(ConfigurationError::DuplicateRouteName {
                    name: name.to_string(),
                    first: first.pattern.template().to_string(),
                    second: full_path,
                });
            }
            self.names.insert(
                name.to_string(),
                NamedRoute {
                    route: Arc::clone(route),
                    pattern: PathPattern::parse(&full_path)?,
                },
            );
        }

        if route.is_redirect_only() {
            if let Some(target) = route.redirect_handler().and_then(|r| r.static_target()) {
                self.self_redirects.push(SelfRedirectCandidate {
                    route: Arc::clone(route),
                    full_path: full_path.clone(),
                    target: target.to_string(),
                });
            }
        }

        self.walk(
            route.routes(),
            &Position {
                full_path: &full_path,
                top_level: false,
                ancestors: at.ancestors,
                params: &params,
            },
        )
    }

    fn claim_key(&mut self, key: &NavigatorKey) -> Result<(), ConfigurationError> {
        if self.keys.insert(key.clone()) {
            Ok(())
        } else {
            Err(ConfigurationError::DuplicateNavigatorKey {
                key: key.to_string(),
            })
        }
    }
}

fn with_key(ancestors: &[NavigatorKey], key: &NavigatorKey) -> Vec<NavigatorKey> {
    let mut keys = ancestors.to_vec();
    keys.push(key.clone());
    keys
}

fn describe(node: &RouteBase, parent: &str) -> String {
    match node {
        RouteBase::Route(route) => concatenate_paths(parent, route.path()),
        RouteBase::Shell(shell) => format!("shell '{}'", shell.key()),
        RouteBase::StatefulShell(shell) => shell.shell_key(),
    }
}

/// Full path of the first route under `routes`, looking through shells
fn first_route(routes: &[RouteBase], parent: &str) -> Option<(String, bool)> {
    routes.iter().find_map(|node| match node {
        RouteBase::Route(route) => {
            let full_path = concatenate_paths(parent, route.path());
            let parameterized = PathPattern::parse(&full_path)
                .map(|pattern| pattern.has_params())
                .unwrap_or(true);
            Some((full_path, parameterized))
        }
        RouteBase::Shell(shell) => first_route(shell.routes(), parent),
        RouteBase::StatefulShell(shell) => shell
            .branches()
            .first()
            .and_then(|branch| first_route(branch.routes(), parent)),
    })
}
