//! Resolved navigation state
//!
//! A [`MatchList`] is the output of resolution: a flat, ordered sequence of
//! [`MatchFrame`]s for one location. Shell frames precede the frames they
//! wrap. Imperative frames (push/replace) are appended after the declarative
//! ones and carry their own nested list.
//!
//! All stack operations return a new list and leave `self` untouched.

use crate::error::RouterError;
use crate::params::RouteParams;
use crate::route::{NavigatorKey, Route, ShellRoute, StatefulShellRoute};
use crate::state::RouteState;
use crate::uri::Uri;
use futures::channel::oneshot;
use parking_lot::Mutex;
use rand::Rng;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

const PAGE_KEY_LEN: usize = 32;

// ============================================================================
// Extra
// ============================================================================

/// Caller-supplied auxiliary data attached to a navigation
#[derive(Clone)]
pub struct Extra(Arc<dyn Any + Send + Sync>);

impl Extra {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Check if the value has type `T`
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Check if both handles point to the same value
    pub fn ptr_eq(&self, other: &Extra) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Extra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extra(..)")
    }
}

// ============================================================================
// PageKey
// ============================================================================

/// Stable identity of a page, used by the rendering layer to diff stacks
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(String);

impl PageKey {
    /// Create a key with an explicit value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Mint a random key that is not in `taken`
    ///
    /// Keys are 32 characters in the range `Y`..`y`.
    pub fn random(taken: &HashSet<PageKey>) -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let key: String = (0..PAGE_KEY_LEN)
                .map(|_| char::from(rng.gen_range(89u8..122)))
                .collect();
            let key = PageKey(key);
            if !taken.contains(&key) {
                return key;
            }
        }
    }

    /// Key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Completer / PopResult
// ============================================================================

/// Completion handle of an imperative frame
///
/// Completed with the pop result when the frame is popped. When every clone
/// is dropped first (the frame was replaced or discarded), the paired
/// [`PopResult`] resolves to `None`.
#[derive(Clone)]
pub struct Completer {
    sender: Arc<Mutex<Option<oneshot::Sender<Option<Extra>>>>>,
}

impl Completer {
    /// Create a completion handle and the future that observes it
    pub fn new() -> (Self, PopResult) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
            PopResult { receiver },
        )
    }

    /// Complete with `result`; later calls are ignored
    pub fn complete(&self, result: Option<Extra>) {
        if let Some(sender) = self.sender.lock().take() {
            // The receiver may already be gone; the result is dropped then.
            let _ = sender.send(result);
        }
    }

    /// Check if the handle has been completed
    pub fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Resolves to the value an imperative frame was popped with
#[derive(Debug)]
pub struct PopResult {
    receiver: oneshot::Receiver<Option<Extra>>,
}

impl Future for PopResult {
    type Output = Option<Extra>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.ok().flatten())
    }
}

// ============================================================================
// Frames
// ============================================================================

/// One matched leaf route
#[derive(Debug, Clone)]
pub struct RouteFrame {
    /// Matched route
    pub route: Arc<Route>,
    /// Location consumed up to and including this route, e.g. `/family/f1`
    pub matched_location: String,
    /// Template path up to and including this route, e.g. `/family/:fid`
    pub full_path: String,
    /// Page identity
    pub page_key: PageKey,
    /// Navigator the page is placed in
    pub navigator_key: NavigatorKey,
    /// Parameters captured by this route only
    pub params: RouteParams,
}

/// Kind of shell a [`ShellFrame`] stands for
#[derive(Debug, Clone)]
pub enum ShellKind {
    /// Plain shell
    Shell(Arc<ShellRoute>),
    /// Stateful shell with the active branch index
    Stateful {
        route: Arc<StatefulShellRoute>,
        branch: usize,
    },
}

/// A shell wrapping the frames that follow it
#[derive(Debug, Clone)]
pub struct ShellFrame {
    /// Shell route and, for stateful shells, the active branch
    pub shell: ShellKind,
    /// Location where the shell starts
    pub matched_location: String,
    /// Page identity of the shell
    pub page_key: PageKey,
    /// Navigator the shell is placed in
    pub navigator_key: NavigatorKey,
    /// Navigator the shell introduces
    pub child_navigator_key: NavigatorKey,
}

/// A page pushed imperatively on top of the declarative frames
#[derive(Debug, Clone)]
pub struct ImperativeFrame {
    /// Page identity; fresh for push, reused for replace
    pub page_key: PageKey,
    /// Destination of the push/replace
    pub matches: Box<MatchList>,
    /// Completed on pop; absent once restored from persisted state
    pub completer: Option<Completer>,
}

impl ImperativeFrame {
    /// Navigator the pushed page goes to
    pub fn navigator_key(&self) -> Option<&NavigatorKey> {
        self.matches.last_route_frame().map(|frame| &frame.navigator_key)
    }
}

/// One element of a [`MatchList`]
#[derive(Debug, Clone)]
pub enum MatchFrame {
    /// Matched leaf route
    Route(RouteFrame),
    /// Shell wrapping following frames
    Shell(ShellFrame),
    /// Imperatively pushed page
    Imperative(ImperativeFrame),
}

impl MatchFrame {
    /// Page identity of this frame
    pub fn page_key(&self) -> &PageKey {
        match self {
            MatchFrame::Route(frame) => &frame.page_key,
            MatchFrame::Shell(frame) => &frame.page_key,
            MatchFrame::Imperative(frame) => &frame.page_key,
        }
    }

    /// Matched route frame, if this is one
    pub fn as_route(&self) -> Option<&RouteFrame> {
        match self {
            MatchFrame::Route(frame) => Some(frame),
            _ => None,
        }
    }

    /// Imperative frame, if this is one
    pub fn as_imperative(&self) -> Option<&ImperativeFrame> {
        match self {
            MatchFrame::Imperative(frame) => Some(frame),
            _ => None,
        }
    }
}

// ============================================================================
// MatchList
// ============================================================================

/// Resolved navigation state for one location
///
/// Either has frames or carries an error, never both. Two lists are equal
/// when their resolved URIs are equal.
#[derive(Debug, Clone)]
pub struct MatchList {
    frames: Vec<MatchFrame>,
    uri: Uri,
    path_params: RouteParams,
    extra: Option<Extra>,
    error: Option<RouterError>,
}

impl MatchList {
    /// Successful resolution
    pub(crate) fn new(
        frames: Vec<MatchFrame>,
        uri: Uri,
        path_params: RouteParams,
        extra: Option<Extra>,
    ) -> Self {
        Self {
            frames,
            uri,
            path_params,
            extra,
            error: None,
        }
    }

    /// Error-tagged list with no frames
    pub fn error(uri: Uri, error: RouterError, extra: Option<Extra>) -> Self {
        Self {
            frames: Vec::new(),
            uri,
            path_params: RouteParams::new(),
            extra,
            error: Some(error),
        }
    }

    /// Frames in stack order
    pub fn frames(&self) -> &[MatchFrame] {
        &self.frames
    }

    /// Resolved URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Resolved URI as a location string
    pub fn location(&self) -> String {
        self.uri.to_string()
    }

    /// Path parameters aggregated across frames
    pub fn path_params(&self) -> &RouteParams {
        &self.path_params
    }

    /// Caller-supplied extra
    pub fn extra(&self) -> Option<&Extra> {
        self.extra.as_ref()
    }

    /// Error cause of an error-tagged list
    pub fn error_cause(&self) -> Option<&RouterError> {
        self.error.as_ref()
    }

    /// Check if the list is error-tagged
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if the list has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Top frame
    pub fn last(&self) -> Option<&MatchFrame> {
        self.frames.last()
    }

    /// Route frame of the visible page
    ///
    /// Looks through imperative frames into their nested lists.
    pub fn last_route_frame(&self) -> Option<&RouteFrame> {
        self.frames.iter().rev().find_map(|frame| match frame {
            MatchFrame::Route(frame) => Some(frame),
            MatchFrame::Imperative(frame) => frame.matches.last_route_frame(),
            MatchFrame::Shell(_) => None,
        })
    }

    /// Last declarative route frame, ignoring imperative frames
    pub fn last_declarative_frame(&self) -> Option<&RouteFrame> {
        self.frames.iter().rev().find_map(MatchFrame::as_route)
    }

    /// Template path of the declarative frames, e.g. `/family/:fid/person/:pid`
    pub fn full_path(&self) -> String {
        self.last_declarative_frame()
            .map(|frame| frame.full_path.clone())
            .unwrap_or_default()
    }

    /// Imperative frames in push order
    pub fn imperative_frames(&self) -> impl Iterator<Item = &ImperativeFrame> {
        self.frames.iter().filter_map(MatchFrame::as_imperative)
    }

    /// Every page key in this list and the lists nested in it
    pub fn page_keys(&self) -> HashSet<PageKey> {
        let mut keys = HashSet::new();
        self.collect_page_keys(&mut keys);
        keys
    }

    fn collect_page_keys(&self, keys: &mut HashSet<PageKey>) {
        for frame in &self.frames {
            keys.insert(frame.page_key().clone());
            if let MatchFrame::Imperative(frame) = frame {
                frame.matches.collect_page_keys(keys);
            }
        }
    }

    /// Check if popping would leave at least one page
    pub fn can_pop(&self) -> bool {
        self.frames
            .iter()
            .filter(|frame| !matches!(frame, MatchFrame::Shell(_)))
            .count()
            > 1
    }

    /// State for the top-level redirect
    pub fn top_level_state(&self) -> RouteState {
        RouteState::top_level(self)
    }

    /// State scoped to the route frame at `index`
    pub fn state_at(&self, index: usize) -> Option<RouteState> {
        match self.frames.get(index)? {
            MatchFrame::Route(frame) => Some(RouteState::for_frame(self, frame)),
            MatchFrame::Imperative(frame) => frame
                .matches
                .last_route_frame()
                .map(|route| RouteState::for_frame(&frame.matches, route)),
            MatchFrame::Shell(_) => None,
        }
    }

    // ------------------------------------------------------------------------
    // Imperative stack operations
    // ------------------------------------------------------------------------

    /// Append `target` as an imperative frame with a fresh page key
    pub fn push(&self, target: MatchList, completer: Option<Completer>) -> MatchList {
        let page_key = PageKey::random(&self.page_keys());
        self.push_with_key(target, page_key, completer)
    }

    /// Remove the top frame, then [`push`](Self::push) `target`
    ///
    /// When the top frame was the only page, `target` becomes the new
    /// declarative base and `completer` is dropped.
    pub fn push_replacement(&self, target: MatchList, completer: Option<Completer>) -> MatchList {
        let (base, _) = self.remove_last();
        if base.last_declarative_frame().is_none() {
            return target;
        }
        base.push(target, completer)
    }

    /// Replace the top frame with `target`, keeping the removed frame's key
    ///
    /// When the top frame was the only page, `target` becomes the new
    /// declarative base with the removed key on its top frame.
    pub fn replace(&self, target: MatchList, completer: Option<Completer>) -> MatchList {
        let (base, removed) = self.remove_last();
        match removed {
            Some(frame) if base.last_declarative_frame().is_none() => {
                target.with_top_key(frame.page_key().clone())
            }
            Some(frame) => base.push_with_key(target, frame.page_key().clone(), completer),
            None => base.push(target, completer),
        }
    }

    /// Discard `self`; `target` becomes the state
    pub fn go(&self, target: MatchList) -> MatchList {
        target
    }

    /// `target` if it points somewhere else, `self` otherwise
    pub fn restore(&self, target: MatchList) -> MatchList {
        if self.uri != target.uri {
            target
        } else {
            self.clone()
        }
    }

    /// Remove the top frame, completing it with `result` if it is imperative
    ///
    /// The last page is never popped; without [`can_pop`](Self::can_pop)
    /// the list comes back unchanged.
    pub fn pop(&self, result: Option<Extra>) -> MatchList {
        if !self.can_pop() {
            return self.clone();
        }
        if let Some(MatchFrame::Imperative(frame)) = self.frames.last() {
            if let Some(completer) = &frame.completer {
                completer.complete(result);
            }
        }
        self.remove_last().0
    }

    pub(crate) fn push_with_key(
        &self,
        target: MatchList,
        page_key: PageKey,
        completer: Option<Completer>,
    ) -> MatchList {
        if self.is_error() {
            return self.clone();
        }
        let mut next = self.clone();
        next.frames.push(MatchFrame::Imperative(ImperativeFrame {
            page_key,
            matches: Box::new(target),
            completer,
        }));
        next
    }

    /// Remove the top frame and any shell left without content
    ///
    /// When a route frame goes, the path is rebuilt from the remaining
    /// frames and stale parameters are pruned. Query and fragment are kept.
    /// With no declarative frame left the URI stays as it was.
    fn with_top_key(mut self, page_key: PageKey) -> MatchList {
        match self.frames.last_mut() {
            Some(MatchFrame::Route(frame)) => frame.page_key = page_key,
            Some(MatchFrame::Shell(frame)) => frame.page_key = page_key,
            Some(MatchFrame::Imperative(frame)) => frame.page_key = page_key,
            None => {}
        }
        self
    }

    fn remove_last(&self) -> (MatchList, Option<MatchFrame>) {
        let mut next = self.clone();
        let removed = next.frames.pop();
        while matches!(next.frames.last(), Some(MatchFrame::Shell(_))) {
            next.frames.pop();
        }

        if matches!(removed, Some(MatchFrame::Route(_))) {
            if let Some(frame) = next.last_declarative_frame() {
                next.uri = next.uri.with_path(frame.matched_location.clone());
            }

            let remaining: HashSet<String> = next
                .frames
                .iter()
                .filter_map(MatchFrame::as_route)
                .flat_map(|frame| frame.params.iter().map(|(k, _)| k.clone()))
                .collect();
            next.path_params.retain(|key| remaining.contains(key));
        }

        (next, removed)
    }
}

impl PartialEq for MatchList {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

// ============================================================================
// Tests
// ============================================================================
