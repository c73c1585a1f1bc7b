//! Route information parsing
//!
//! The parser is the entry point for every navigation. It takes a
//! [`RouteInformation`] (a location plus optional state) and produces the
//! final [`MatchList`]:
//!
//! 1. resolve the location, or decode persisted state
//! 2. run redirects
//! 3. hand error-tagged lists to the exception handler
//! 4. apply the imperative operation the navigation asked for
//!
//! In the other direction, [`RouteInformationParser::restore_route_information`]
//! turns a list into the location and persisted state the host stores in its
//! history.

use crate::codec::{EncodedMatchList, MatchListCodec};
use crate::configuration::RouteConfiguration;
use crate::match_list::{Completer, Extra, MatchList};
use crate::redirect::{run_redirects, Finalizer, Resolution};
use crate::{debug_log, warn_log};
use gpui::App;
use std::sync::Arc;

/// How a navigation relates to the current list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatingType {
    /// Replace the whole list
    Go,
    /// Add an imperative frame on top
    Push,
    /// Remove the top frame, then push
    PushReplacement,
    /// Swap the top frame, keeping its page key
    Replace,
    /// Reapply a list unless it already is the current one
    Restore,
}

/// Imperative navigation request
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub kind: NavigatingType,
    /// List the operation applies to
    pub base: MatchList,
    pub extra: Option<Extra>,
    pub completer: Option<Completer>,
}

/// State attached to a [`RouteInformation`]
#[derive(Debug, Clone)]
pub enum InformationState {
    /// Navigation requested by the app
    Navigation(NavigationState),
    /// State read back from the host history
    Persisted(EncodedMatchList),
}

/// Location and state exchanged with the host
#[derive(Debug, Clone)]
pub struct RouteInformation {
    pub location: String,
    pub state: Option<InformationState>,
}

impl RouteInformation {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            state: None,
        }
    }

    /// Navigation of `kind` applied to `base`
    pub fn navigation(
        location: impl Into<String>,
        kind: NavigatingType,
        base: MatchList,
        extra: Option<Extra>,
        completer: Option<Completer>,
    ) -> Self {
        Self {
            location: location.into(),
            state: Some(InformationState::Navigation(NavigationState {
                kind,
                base,
                extra,
                completer,
            })),
        }
    }

    /// Entry read back from the host history
    pub fn persisted(location: impl Into<String>, encoded: EncodedMatchList) -> Self {
        Self {
            location: location.into(),
            state: Some(InformationState::Persisted(encoded)),
        }
    }

    /// Persisted state, if any
    pub fn persisted_state(&self) -> Option<&EncodedMatchList> {
        match &self.state {
            Some(InformationState::Persisted(encoded)) => Some(encoded),
            _ => None,
        }
    }
}

/// Turns route information into match lists and back
#[derive(Debug, Clone)]
pub struct RouteInformationParser {
    configuration: Arc<RouteConfiguration>,
    codec: MatchListCodec,
}

impl RouteInformationParser {
    pub fn new(configuration: Arc<RouteConfiguration>) -> Self {
        Self {
            codec: MatchListCodec::new(Arc::clone(&configuration)),
            configuration,
        }
    }

    pub fn configuration(&self) -> &Arc<RouteConfiguration> {
        &self.configuration
    }

    pub fn codec(&self) -> &MatchListCodec {
        &self.codec
    }

    /// Resolve `information` into the list to display
    ///
    /// Settles synchronously unless a redirect callback is asynchronous.
    pub fn parse(&self, cx: &App, information: RouteInformation) -> Resolution {
        let (initial, navigation) = match information.state {
            Some(InformationState::Persisted(encoded)) => match self.codec.decode(&encoded) {
                Ok(list) => (list, None),
                Err(error) => {
                    warn_log!(
                        "Discarding persisted state for '{}': {}",
                        information.location,
                        error
                    );
                    (self.configuration.find_match(&information.location, None), None)
                }
            },
            Some(InformationState::Navigation(navigation)) => (
                self.configuration
                    .find_match(&information.location, navigation.extra.clone()),
                Some(navigation),
            ),
            None => (self.configuration.find_match(&information.location, None), None),
        };

        debug_log!("Parsing route information for '{}'", initial.location());
        let configuration = Arc::clone(&self.configuration);
        let finalizer: Finalizer = Box::new(move |cx, list| settle(&configuration, cx, list, navigation));
        run_redirects(&self.configuration, cx, initial, Some(finalizer))
    }

    /// Location shown to the user for `list`
    ///
    /// The top imperative page's location when the configuration asks for
    /// it, the declarative location otherwise.
    pub fn reported_location(&self, list: &MatchList) -> String {
        if self.configuration.url_reflects_imperative_apis() {
            if let Some(frame) = list.imperative_frames().last() {
                return frame.matches.location();
            }
        }
        list.location()
    }

    /// Location and persisted state to store for `list`
    ///
    /// When the state cannot be encoded the entry is stored without state.
    pub fn restore_route_information(&self, list: &MatchList) -> RouteInformation {
        let location = self.reported_location(list);
        match self.codec.encode(list) {
            Ok(encoded) => RouteInformation::persisted(location, encoded),
            Err(error) => {
                warn_log!("Cannot persist state for '{}': {}", location, error);
                RouteInformation::new(location)
            }
        }
    }
}

fn settle(
    configuration: &RouteConfiguration,
    cx: &App,
    list: MatchList,
    navigation: Option<NavigationState>,
) -> MatchList {
    if list.is_error() {
        return match configuration.exception_handler() {
            Some(handler) => handler(cx, &list, configuration),
            None => list,
        };
    }

    debug_assert!(
        !list
            .last_route_frame()
            .is_some_and(|frame| frame.route.is_redirect_only()),
        "resolved location '{}' ends on a redirect-only route",
        list.location()
    );

    let Some(navigation) = navigation else {
        return list;
    };
    let NavigationState {
        kind,
        base,
        completer,
        ..
    } = navigation;

    match kind {
        NavigatingType::Go => base.go(list),
        NavigatingType::Restore => base.restore(list),
        NavigatingType::Push => base.push(list, completer),
        NavigatingType::PushReplacement => base.push_replacement(list, completer),
        NavigatingType::Replace => base.replace(list, completer),
    }
}
