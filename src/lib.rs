//! # GPUI Shell Router
//!
//! A declarative, hierarchical router for GPUI:
//!
//! - **Route Tree** - Nested routes, shells and stateful shells with their own navigators
//! - **Route Matching** - Path templates with parameters and constraints (`:id<\d+>`, `:id<uuid>`)
//! - **Redirects** - Top-level and per-route, synchronous or asynchronous, with loop and limit detection
//! - **Imperative Stack** - push, replace, pop with typed results on top of declarative matches
//! - **Restorable History** - Match lists encode to JSON and decode back, imperative pages included
//! - **Named Routes** - Build locations from route names and parameters
//!
//! # Quick Start
//!
//! ```ignore
//! use gpui::*;
//! use gpui_shell_router::*;
//!
//! fn main() {
//!     Application::new().run(|cx| {
//!         init_router(cx, |router| {
//!             router
//!                 .route(Route::new("/", |_cx, _state| div()))
//!                 .route(
//!                     Route::new("/family/:fid", |_cx, state| div().child(state.location()))
//!                         .name("family")
//!                         .child(Route::new("person/:pid", |_cx, _state| div())),
//!                 )
//!                 .redirect(redirect_fn(|cx, state| {
//!                     if signed_in(cx) || state.matched_location() == "/login" {
//!                         Redirect::none()
//!                     } else {
//!                         Redirect::to("/login")
//!                     }
//!                 }))
//!         });
//!     });
//! }
//! ```
//!
//! # Navigation
//!
//! ```ignore
//! use gpui_shell_router::Navigator;
//!
//! // Replace the whole stack
//! Navigator::go(cx, "/family/f1");
//!
//! // Push a page and wait for its result
//! let result = Navigator::push(cx, "/family/f1/person/p2");
//!
//! // Pop it with a value
//! Navigator::pop_with_result(cx, Extra::new(42u32));
//!
//! // Host history
//! Navigator::back(cx);
//! ```
//!
//! # Shells
//!
//! ```ignore
//! use gpui_shell_router::*;
//!
//! StatefulShellRoute::new(vec![
//!     StatefulShellBranch::new(vec![Route::new("/inbox", inbox).into()]),
//!     StatefulShellBranch::new(vec![Route::new("/sent", sent).into()])
//!         .initial_location("/sent"),
//! ])
//! .builder(|_cx, _state, branch, child| tabs(branch, child))
//! # ;
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (takes precedence over `log`)
//! - `cache` (default) - LRU cache of resolved paths

#![doc(html_root_url = "https://docs.rs/gpui-shell-router/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Route tree and matching
pub mod matcher;
pub mod params;
pub mod route;
pub mod uri;

// Resolution
pub mod configuration;
pub mod match_list;
pub mod redirect;
pub mod resolve;
pub mod state;

// Persistence
pub mod codec;
pub mod history;
pub mod parser;

// Error handling
pub mod error;

// Context module (router context integration)
mod context;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, MatchCache};
pub use codec::{EncodedMatchList, ExtraCodec, JsonExtraCodec, MatchListCodec, PersistedExtra};
pub use configuration::{RouteConfiguration, RouteConfigurationBuilder};
pub use context::{
    init_router, try_init_router, Commit, GlobalRouter, Navigator, RouterBuilder, UseRouter,
};
pub use error::{CodecError, ConfigurationError, ExceptionHandler, RedirectChain, RouterError};
pub use history::{History, HistoryDirection, HistoryEvent};
pub use match_list::{
    Completer, Extra, ImperativeFrame, MatchFrame, MatchList, PageKey, PopResult, RouteFrame,
    ShellFrame, ShellKind,
};
pub use matcher::{concatenate_paths, Constraint, PathPattern, Segment};
pub use params::{decode_component, encode_component, QueryParams, RouteParams};
pub use parser::{
    InformationState, NavigatingType, NavigationState, RouteInformation, RouteInformationParser,
};
pub use redirect::{
    redirect, redirect_fn, redirect_to, BoxedRedirect, PendingRedirect, Redirect,
    RedirectContinuation, RedirectHistory, Resolution, RouteRedirect,
};
pub use resolve::{resolve, ResolvedFrames};
pub use route::{
    NavigatorKey, PageBuilder, Route, RouteBase, ShellBuilder, ShellRoute, StatefulShellBranch,
    StatefulShellBuilder, StatefulShellRoute,
};
pub use state::RouteState;
pub use uri::{canonical_uri, Uri};
