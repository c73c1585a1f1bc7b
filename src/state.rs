//! Route state snapshots
//!
//! [`RouteState`] is the read-only view handed to redirect callbacks and page
//! builders. It is either scoped to the whole list (top-level redirect) or to
//! one matched route frame.

use crate::error::RouterError;
use crate::match_list::{Extra, MatchList, PageKey, RouteFrame};
use crate::params::{QueryParams, RouteParams};
use crate::uri::Uri;
use std::any::Any;

/// Page key of states built for the top-level redirect
pub const TOP_LEVEL_PAGE_KEY: &str = "topLevel";

/// Snapshot of a navigation, scoped to a list or to one of its frames
#[derive(Debug, Clone)]
pub struct RouteState {
    uri: Uri,
    matched_location: String,
    name: Option<String>,
    path: Option<String>,
    full_path: String,
    path_params: RouteParams,
    extra: Option<Extra>,
    error: Option<RouterError>,
    page_key: PageKey,
}

impl RouteState {
    /// State covering the whole list
    pub fn top_level(list: &MatchList) -> Self {
        Self {
            uri: list.uri().clone(),
            matched_location: list.uri().path().to_string(),
            name: None,
            path: None,
            full_path: list.full_path(),
            path_params: list.path_params().clone(),
            extra: list.extra().cloned(),
            error: list.error_cause().cloned(),
            page_key: PageKey::new(TOP_LEVEL_PAGE_KEY),
        }
    }

    /// State scoped to `frame` of `list`
    pub fn for_frame(list: &MatchList, frame: &RouteFrame) -> Self {
        Self {
            uri: list.uri().clone(),
            matched_location: frame.matched_location.clone(),
            name: frame.route.route_name().map(str::to_string),
            path: Some(frame.route.path().to_string()),
            full_path: frame.full_path.clone(),
            path_params: list.path_params().clone(),
            extra: list.extra().cloned(),
            error: list.error_cause().cloned(),
            page_key: frame.page_key.clone(),
        }
    }

    /// Full location, e.g. `/family/f1?tab=info`
    pub fn location(&self) -> String {
        self.uri.to_string()
    }

    /// Parsed location
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Location consumed up to the scoped frame
    pub fn matched_location(&self) -> &str {
        &self.matched_location
    }

    /// Name of the scoped route
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Path template of the scoped route
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Template path from the root to the scoped frame
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// All path parameters of the list, as written in the location
    pub fn path_params(&self) -> &RouteParams {
        &self.path_params
    }

    /// Raw path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Percent-decoded path parameter
    pub fn decoded_param(&self, name: &str) -> Option<String> {
        self.path_params.get_decoded(name)
    }

    /// Query parameters of the location
    pub fn query_params(&self) -> QueryParams {
        self.uri.query_params()
    }

    /// Caller-supplied extra
    pub fn extra(&self) -> Option<&Extra> {
        self.extra.as_ref()
    }

    /// Extra downcast to `T`
    pub fn extra_as<T: Any>(&self) -> Option<&T> {
        self.extra.as_ref()?.downcast_ref::<T>()
    }

    /// Error of an error-tagged list
    pub fn error(&self) -> Option<&RouterError> {
        self.error.as_ref()
    }

    /// Page identity of the scoped frame
    pub fn page_key(&self) -> &PageKey {
        &self.page_key
    }
}
