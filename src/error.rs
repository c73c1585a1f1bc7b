//! Error types for route configuration, navigation and state persistence
//!
//! Errors fall in two groups:
//!
//! - [`RouterError`] is recoverable. It is stored inside an error-tagged
//!   [`MatchList`] and can be replaced by an [`ExceptionHandler`].
//! - [`ConfigurationError`] is a development-time defect. It aborts
//!   configuration before any navigation happens.

use crate::configuration::RouteConfiguration;
use crate::match_list::MatchList;
use gpui::App;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Redirect chain
// ============================================================================

/// Ordered list of locations visited while resolving redirects.
///
/// Displays as `A => B => C`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectChain(Vec<String>);

impl RedirectChain {
    /// Create a chain from visited locations
    pub fn new(locations: Vec<String>) -> Self {
        Self(locations)
    }

    /// Visited locations, oldest first
    pub fn locations(&self) -> &[String] {
        &self.0
    }

    /// Number of locations in the chain
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RedirectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" => "))
    }
}

// ============================================================================
// RouterError
// ============================================================================

/// Recoverable errors produced while resolving a location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// No route in the tree matches the location
    #[error("no routes for location: {location}")]
    NoMatch { location: String },

    /// A redirect target resolved to a location already visited
    #[error("redirect loop detected {chain}")]
    RedirectLoop { chain: RedirectChain },

    /// The redirect chain grew beyond the configured limit
    #[error("too many redirects {chain}")]
    TooManyRedirects { chain: RedirectChain, limit: usize },

    /// The location string cannot be used for navigation
    #[error("invalid location: '{location}'")]
    InvalidLocation { location: String },

    /// No route is registered under this name
    #[error("unknown route name: {name}")]
    UnknownRouteName { name: String },

    /// A parameter required by the named route's path was not supplied
    #[error("missing param \"{param}\" for {path}")]
    MissingParameter { param: String, path: String },

    /// A supplied parameter does not appear in the named route's path
    #[error("unknown param \"{param}\" for {path}")]
    UnknownParameter { param: String, path: String },

    /// The stateful shell has no branch at this index, or it is not part of
    /// the active route tree
    #[error("unknown stateful shell branch: {index}")]
    UnknownBranch { index: usize },

    /// Persisted navigation state could not be decoded
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl RouterError {
    /// Check if this is a redirect loop or limit failure
    pub fn is_redirect_error(&self) -> bool {
        matches!(
            self,
            RouterError::RedirectLoop { .. } | RouterError::TooManyRedirects { .. }
        )
    }

    /// Redirect chain attached to redirect failures
    pub fn chain(&self) -> Option<&RedirectChain> {
        match self {
            RouterError::RedirectLoop { chain } | RouterError::TooManyRedirects { chain, .. } => {
                Some(chain)
            }
            _ => None,
        }
    }
}

// ============================================================================
// ConfigurationError
// ============================================================================

/// Defects in the route tree detected when the configuration is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The configuration has no routes at all
    #[error("route configuration must contain at least one route")]
    NoRoutes,

    /// A path template is malformed or badly placed in the tree
    #[error("invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A path parameter name is used twice along one branch of the tree
    #[error("duplicate path parameter '{param}' in '{full_path}'")]
    DuplicateParameter { param: String, full_path: String },

    /// Two routes share a name
    #[error("duplicate route name '{name}' used by '{first}' and '{second}'")]
    DuplicateRouteName {
        name: String,
        first: String,
        second: String,
    },

    /// A parent navigator reference does not point to an ancestor navigator
    #[error("route '{path}' references navigator '{key}' which is not an ancestor navigator")]
    InvalidNavigatorKey { path: String, key: String },

    /// Two navigators in the tree share an identity
    #[error("navigator key '{key}' is used more than once")]
    DuplicateNavigatorKey { key: String },

    /// A leaf route has neither a page builder nor a redirect
    #[error("route '{path}' must provide a page builder or a redirect")]
    MissingContent { path: String },

    /// A redirect-only route redirects to its own location
    #[error("redirect-only route '{path}' redirects to its own location '{target}'")]
    SelfRedirect { path: String, target: String },

    /// A stateful shell branch has no routes
    #[error("stateful shell branch {index} must contain at least one route")]
    EmptyBranch { index: usize },

    /// A branch initial location does not resolve to a route of that branch
    #[error("initial location '{location}' of branch {index} is invalid: {reason}")]
    InvalidInitialLocation {
        index: usize,
        location: String,
        reason: String,
    },

    /// The default location of a branch cannot contain parameters
    #[error("default location '{path}' of branch {index} cannot be a parameterized route")]
    ParameterizedDefaultLocation { index: usize, path: String },
}

// ============================================================================
// CodecError
// ============================================================================

/// Errors raised while encoding or decoding persisted navigation state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The persisted value does not have the expected shape
    #[error("invalid persisted route state: {0}")]
    InvalidFormat(String),

    /// The persisted extra names a codec this configuration does not know
    #[error("unknown extra codec '{0}'")]
    UnknownCodec(String),

    /// A persisted imperative entry has no page key
    #[error("imperative entry for '{location}' has no page key")]
    MissingPageKey { location: String },

    /// The extra payload is not of the type the codec handles
    #[error("extra payload is not a {expected}")]
    UnexpectedExtraType { expected: &'static str },

    /// Serialization of the extra payload failed
    #[error("failed to serialize extra payload: {0}")]
    Serialization(String),

    /// The extra payload is opaque and no codec is configured to persist it
    #[error("extra payload cannot be written without an extra codec")]
    OpaqueExtra,
}

impl From<serde_json::Error> for CodecError {
    fn from(error: serde_json::Error) -> Self {
        CodecError::Serialization(error.to_string())
    }
}

// ============================================================================
// Exception handler
// ============================================================================

/// Handler for recoverable routing errors.
///
/// Receives the error-tagged match list and may substitute any other list,
/// for example one resolved against an error page.
pub type ExceptionHandler =
    Arc<dyn Fn(&App, &MatchList, &RouteConfiguration) -> MatchList + Send + Sync>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_chain_display() {
        let chain = RedirectChain::new(vec!["/a".into(), "/b".into(), "/a".into()]);
        assert_eq!(chain.to_string(), "/a => /b => /a");
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_router_error_display() {
        let error = RouterError::NoMatch {
            location: "/missing".to_string(),
        };
        assert_eq!(error.to_string(), "no routes for location: /missing");

        let error = RouterError::RedirectLoop {
            chain: RedirectChain::new(vec!["/a".into(), "/b".into(), "/a".into()]),
        };
        assert_eq!(error.to_string(), "redirect loop detected /a => /b => /a");
        assert!(error.is_redirect_error());
        assert_eq!(error.chain().map(RedirectChain::len), Some(3));
    }

    #[test]
    fn test_codec_error_converts_into_router_error() {
        let error: RouterError = CodecError::OpaqueExtra.into();
        assert!(matches!(error, RouterError::Codec(CodecError::OpaqueExtra)));
        assert!(!error.is_redirect_error());
    }

    #[test]
    fn test_configuration_error_display() {
        let error = ConfigurationError::DuplicateRouteName {
            name: "a".to_string(),
            first: "/a".to_string(),
            second: "/b".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "duplicate route name 'a' used by '/a' and '/b'"
        );
    }
}
