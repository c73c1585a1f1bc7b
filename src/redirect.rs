//! Redirects and the redirect engine
//!
//! A redirect callback returns a [`Redirect`]: either a value available now
//! or a future. The engine consumes ready values in the same call and only
//! suspends when a callback actually is pending, handing back a
//! [`PendingRedirect`] that the host awaits and then resumes against the app.
//!
//! Each pass first asks the top-level redirect, then scans the frames in
//! order for the first route-level redirect that answers. A pushed page is
//! scanned through the frames of its own list. Any new location
//! restarts the pass. Every location visited is recorded in a
//! [`RedirectHistory`] that rejects loops and chains beyond the limit.
//!
//! # Example
//!
//! ```ignore
//! use gpui_shell_router::{redirect_fn, Redirect};
//!
//! let auth = redirect_fn(|cx, state| {
//!     if is_signed_in(cx) || state.matched_location() == "/login" {
//!         Redirect::none()
//!     } else {
//!         Redirect::to("/login")
//!     }
//! });
//!
//! let remote = redirect_fn(|_cx, _state| {
//!     Redirect::pending(async move { check_session().await.then(|| "/".to_string()) })
//! });
//! ```

use crate::configuration::RouteConfiguration;
use crate::error::{RedirectChain, RouterError};
use crate::match_list::{MatchFrame, MatchList};
use crate::state::RouteState;
use crate::uri::{canonical_uri, Uri};
use crate::{debug_log, warn_log};
use futures::future::BoxFuture;
use gpui::App;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// Redirect value
// ============================================================================

/// Result of a redirect callback
pub enum Redirect {
    /// Decided now; `None` means stay
    Ready(Option<String>),
    /// Decided later
    Pending(BoxFuture<'static, Option<String>>),
}

impl Redirect {
    /// Stay on the current location
    pub fn none() -> Self {
        Redirect::Ready(None)
    }

    /// Go to `location`
    pub fn to(location: impl Into<String>) -> Self {
        Redirect::Ready(Some(location.into()))
    }

    /// Decide once `future` resolves
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        Redirect::Pending(Box::pin(future))
    }

    /// Check if the value is available without waiting
    pub fn is_ready(&self) -> bool {
        matches!(self, Redirect::Ready(_))
    }
}

impl From<Option<String>> for Redirect {
    fn from(target: Option<String>) -> Self {
        Redirect::Ready(target)
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Ready(target) => f.debug_tuple("Ready").field(target).finish(),
            Redirect::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

// ============================================================================
// RouteRedirect
// ============================================================================

/// Redirect callback attached to a route or to the whole configuration
pub trait RouteRedirect: Send + Sync + 'static {
    /// Decide where `state` should go instead
    fn redirect(&self, cx: &App, state: &RouteState) -> Redirect;

    /// Name used in logs
    fn name(&self) -> &'static str {
        "RouteRedirect"
    }

    /// Target known without running the callback
    ///
    /// Lets configuration validation catch redirect-only routes that point
    /// at themselves.
    fn static_target(&self) -> Option<&str> {
        None
    }
}

/// Shared redirect callback
pub type BoxedRedirect = Arc<dyn RouteRedirect>;

impl<R: RouteRedirect + ?Sized> RouteRedirect for Arc<R> {
    fn redirect(&self, cx: &App, state: &RouteState) -> Redirect {
        (**self).redirect(cx, state)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn static_target(&self) -> Option<&str> {
        (**self).static_target()
    }
}

/// Redirect created from a function or closure
pub struct FnRedirect<F> {
    f: F,
}

impl<F> RouteRedirect for FnRedirect<F>
where
    F: Fn(&App, &RouteState) -> Redirect + Send + Sync + 'static,
{
    fn redirect(&self, cx: &App, state: &RouteState) -> Redirect {
        (self.f)(cx, state)
    }

    fn name(&self) -> &'static str {
        "FnRedirect"
    }
}

/// Create a redirect from a closure
pub fn redirect_fn<F>(f: F) -> FnRedirect<F>
where
    F: Fn(&App, &RouteState) -> Redirect + Send + Sync + 'static,
{
    FnRedirect { f }
}

/// Unconditional redirect to a fixed location
#[derive(Debug, Clone)]
pub struct StaticRedirect {
    target: String,
}

impl RouteRedirect for StaticRedirect {
    fn redirect(&self, _cx: &App, _state: &RouteState) -> Redirect {
        Redirect::to(self.target.clone())
    }

    fn name(&self) -> &'static str {
        "StaticRedirect"
    }

    fn static_target(&self) -> Option<&str> {
        Some(&self.target)
    }
}

/// Always redirect to `location`
pub fn redirect_to(location: impl Into<String>) -> StaticRedirect {
    StaticRedirect {
        target: location.into(),
    }
}

// ============================================================================
// RedirectHistory
// ============================================================================

/// Locations visited during one resolution
#[derive(Debug, Clone)]
pub struct RedirectHistory {
    visited: Vec<Uri>,
}

impl RedirectHistory {
    /// Start a history at `initial`
    pub fn new(initial: &MatchList) -> Self {
        Self {
            visited: vec![initial.uri().clone()],
        }
    }

    /// Accept `next` into the history
    ///
    /// Fails when `next` was already visited or when the chain already holds
    /// more than `limit` redirects.
    pub fn record(&mut self, next: &MatchList, limit: usize) -> Result<(), RouterError> {
        if self.visited.contains(next.uri()) {
            return Err(RouterError::RedirectLoop {
                chain: self.chain_with(next.uri()),
            });
        }
        if self.visited.len() > limit {
            return Err(RouterError::TooManyRedirects {
                chain: self.chain_with(next.uri()),
                limit,
            });
        }
        self.visited.push(next.uri().clone());
        Ok(())
    }

    /// Visited locations so far
    pub fn chain(&self) -> RedirectChain {
        RedirectChain::new(self.visited.iter().map(Uri::to_string).collect())
    }

    /// Number of visited locations, including the initial one
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Always false; the initial location is recorded on creation
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    fn chain_with(&self, next: &Uri) -> RedirectChain {
        RedirectChain::new(
            self.visited
                .iter()
                .chain(std::iter::once(next))
                .map(Uri::to_string)
                .collect(),
        )
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Applied to the final list once redirects settle
pub(crate) type Finalizer = Box<dyn FnOnce(&App, MatchList) -> MatchList + Send>;

/// Outcome of running redirects
pub enum Resolution {
    /// Redirects settled
    Ready(MatchList),
    /// A callback is still deciding
    Pending(PendingRedirect),
}

impl Resolution {
    /// Settled list, if any
    pub fn ready(self) -> Option<MatchList> {
        match self {
            Resolution::Ready(list) => Some(list),
            Resolution::Pending(_) => None,
        }
    }

    /// Check if redirects settled without waiting
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolution::Ready(_))
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Ready(list) => f.debug_tuple("Ready").field(&list.location()).finish(),
            Resolution::Pending(pending) => f.debug_tuple("Pending").field(&pending.location()).finish(),
        }
    }
}

/// Redirect that is waiting on an asynchronous callback
pub struct PendingRedirect {
    target: BoxFuture<'static, Option<String>>,
    continuation: Continuation,
}

impl PendingRedirect {
    /// Location being redirected from
    pub fn location(&self) -> String {
        self.continuation.current.location()
    }

    /// Wait for the callback; resume the result with the app afterwards
    pub async fn wait(self) -> RedirectContinuation {
        let target = self.target.await;
        RedirectContinuation {
            target,
            continuation: self.continuation,
        }
    }
}

/// Answer of an asynchronous callback, ready to be applied
pub struct RedirectContinuation {
    target: Option<String>,
    continuation: Continuation,
}

impl RedirectContinuation {
    /// Location the callback asked for
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Apply the answer and keep running redirects
    pub fn resume(self, cx: &App) -> Resolution {
        let mut continuation = self.continuation;
        continuation.apply(self.target);
        continuation.run(cx)
    }
}

/// Run redirects for `list`
pub fn redirect(configuration: &Arc<RouteConfiguration>, cx: &App, list: MatchList) -> Resolution {
    run_redirects(configuration, cx, list, None)
}

pub(crate) fn run_redirects(
    configuration: &Arc<RouteConfiguration>,
    cx: &App,
    list: MatchList,
    finalizer: Option<Finalizer>,
) -> Resolution {
    Continuation {
        configuration: Arc::clone(configuration),
        history: RedirectHistory::new(&list),
        scope: Scope::top_level(&list),
        current: list,
        stage: Stage::TopLevel,
        finalizer,
    }
    .run(cx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TopLevel,
    /// Ask the route-level redirect at this position of the scan
    RouteLevel(usize),
    Done,
}

/// Redirect being asked and the list it sees
#[derive(Debug, Clone)]
struct Scope {
    uri: Uri,
    redirect_only_leaf: bool,
}

impl Scope {
    fn top_level(list: &MatchList) -> Self {
        Self {
            uri: list.uri().clone(),
            redirect_only_leaf: false,
        }
    }
}

/// Route-level redirect found while scanning frames
struct Candidate {
    redirect: BoxedRedirect,
    state: RouteState,
    redirect_only_leaf: bool,
}

/// Route-level redirects of `list` in frame order
///
/// An imperative frame contributes the redirects of its nested list, each
/// scoped to that list.
fn collect_candidates(list: &MatchList, found: &mut Vec<Candidate>) {
    let top = list
        .frames()
        .iter()
        .rposition(|frame| !matches!(frame, MatchFrame::Shell(_)));

    for (index, frame) in list.frames().iter().enumerate() {
        match frame {
            MatchFrame::Route(frame) => {
                if let Some(redirect) = frame.route.redirect_handler() {
                    found.push(Candidate {
                        redirect: Arc::clone(redirect),
                        state: RouteState::for_frame(list, frame),
                        redirect_only_leaf: top == Some(index) && frame.route.is_redirect_only(),
                    });
                }
            }
            MatchFrame::Imperative(frame) => collect_candidates(&frame.matches, found),
            MatchFrame::Shell(_) => {}
        }
    }
}

struct Continuation {
    configuration: Arc<RouteConfiguration>,
    current: MatchList,
    history: RedirectHistory,
    scope: Scope,
    stage: Stage,
    finalizer: Option<Finalizer>,
}

impl Continuation {
    fn run(mut self, cx: &App) -> Resolution {
        loop {
            if self.current.is_error() {
                self.stage = Stage::Done;
            }

            let (redirect, state, redirect_only_leaf) = match self.stage {
                Stage::Done => return self.finish(cx),
                Stage::TopLevel => match self.configuration.top_level_redirect() {
                    Some(redirect) => (Arc::clone(redirect), self.current.top_level_state(), false),
                    None => {
                        self.stage = Stage::RouteLevel(0);
                        continue;
                    }
                },
                Stage::RouteLevel(position) => match self.candidate(position) {
                    Some(candidate) => (
                        candidate.redirect,
                        candidate.state,
                        candidate.redirect_only_leaf,
                    ),
                    None => {
                        self.stage = Stage::Done;
                        continue;
                    }
                },
            };
            self.scope = Scope {
                uri: state.uri().clone(),
                redirect_only_leaf,
            };

            match redirect.redirect(cx, &state) {
                Redirect::Ready(target) => self.apply(target),
                Redirect::Pending(target) => {
                    debug_log!(
                        "{} pending for {}",
                        redirect.name(),
                        self.current.location()
                    );
                    return Resolution::Pending(PendingRedirect {
                        target,
                        continuation: self,
                    });
                }
            }
        }
    }

    fn candidate(&self, position: usize) -> Option<Candidate> {
        let mut found = Vec::new();
        collect_candidates(&self.current, &mut found);
        found.into_iter().nth(position)
    }

    fn apply(&mut self, target: Option<String>) {
        match (self.stage, target) {
            (Stage::TopLevel, Some(target)) if !self.points_to_scope(&target) => {
                self.follow(&target);
            }
            (Stage::TopLevel, _) => self.stage = Stage::RouteLevel(0),
            (Stage::RouteLevel(position), None) => self.stage = Stage::RouteLevel(position + 1),
            (Stage::RouteLevel(_), Some(target)) => {
                if self.points_to_scope(&target) {
                    debug_assert!(
                        !self.scope.redirect_only_leaf,
                        "redirect-only route must redirect to a location other than its own: {}",
                        target
                    );
                    self.stage = Stage::Done;
                } else {
                    self.follow(&target);
                    self.stage = Stage::TopLevel;
                }
            }
            (Stage::Done, _) => {}
        }
    }

    fn points_to_scope(&self, target: &str) -> bool {
        canonical_uri(target)
            .map(|uri| uri == self.scope.uri)
            .unwrap_or(false)
    }

    fn follow(&mut self, target: &str) {
        let extra = self.current.extra().cloned();
        let next = self.configuration.find_match(target, extra.clone());
        debug_log!("Redirecting {} => {}", self.current.location(), next.location());

        match self
            .history
            .record(&next, self.configuration.redirect_limit())
        {
            Ok(()) => self.current = next,
            Err(error) => {
                warn_log!("{}", error);
                self.current = MatchList::error(self.current.uri().clone(), error, extra);
            }
        }
    }

    fn finish(self, cx: &App) -> Resolution {
        let list = match self.finalizer {
            Some(finalizer) => finalizer(cx, self.current),
            None => self.current,
        };
        Resolution::Ready(list)
    }
}
