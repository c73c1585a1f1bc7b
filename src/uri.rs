//! Parsed locations
//!
//! A location is `path[?query][#fragment]`. [`canonical_uri`] normalizes the
//! path part so equal destinations compare equal.

use crate::error::RouterError;
use crate::params::QueryParams;
use std::fmt;

/// A location split into path, query and fragment.
///
/// Query and fragment are stored without their `?` / `#` markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uri {
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Uri {
    /// Split a location into its parts without normalizing the path
    pub fn parse(location: &str) -> Self {
        let (rest, fragment) = match location.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (location, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        Self {
            path: path.to_string(),
            query,
            fragment,
        }
    }

    /// Path part, starting with `/` once canonical
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Fragment without the leading `#`
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Parsed query parameters
    pub fn query_params(&self) -> QueryParams {
        self.query
            .as_deref()
            .map(QueryParams::from_query_string)
            .unwrap_or_default()
    }

    /// Same query and fragment with a different path
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Normalize a location for matching and comparison
///
/// - an empty path becomes `/`
/// - a path without a leading `/` gets one
/// - a trailing `/` is removed except for the root
/// - an empty query or fragment is dropped
///
/// ```
/// use gpui_shell_router::canonical_uri;
///
/// let uri = canonical_uri("/family/?").unwrap();
/// assert_eq!(uri.to_string(), "/family");
/// ```
pub fn canonical_uri(location: &str) -> Result<Uri, RouterError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(RouterError::InvalidLocation {
            location: location.to_string(),
        });
    }

    let mut uri = Uri::parse(location);

    if uri.path.is_empty() {
        uri.path.push('/');
    } else if !uri.path.starts_with('/') {
        uri.path.insert(0, '/');
    }
    while uri.path.len() > 1 && uri.path.ends_with('/') {
        uri.path.pop();
    }
    if uri.query.as_deref() == Some("") {
        uri.query = None;
    }
    if uri.fragment.as_deref() == Some("") {
        uri.fragment = None;
    }

    Ok(uri)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parts() {
        let uri = Uri::parse("/search?q=rust#results");
        assert_eq!(uri.path(), "/search");
        assert_eq!(uri.query(), Some("q=rust"));
        assert_eq!(uri.fragment(), Some("results"));
        assert_eq!(uri.to_string(), "/search?q=rust#results");
    }

    #[test]
    fn test_fragment_may_contain_question_mark() {
        let uri = Uri::parse("/a#x?y");
        assert_eq!(uri.path(), "/a");
        assert_eq!(uri.query(), None);
        assert_eq!(uri.fragment(), Some("x?y"));
    }

    #[test]
    fn test_canonical_uri() {
        assert_eq!(canonical_uri("/").unwrap().to_string(), "/");
        assert_eq!(canonical_uri("?a=1").unwrap().to_string(), "/?a=1");
        assert_eq!(canonical_uri("/a/b/").unwrap().to_string(), "/a/b");
        assert_eq!(canonical_uri("a/b").unwrap().to_string(), "/a/b");
        assert_eq!(canonical_uri("/a?#").unwrap().to_string(), "/a");
    }

    #[test]
    fn test_canonical_uri_rejects_empty() {
        assert!(matches!(
            canonical_uri("  "),
            Err(RouterError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_with_path_keeps_query() {
        let uri = canonical_uri("/a/b?x=1").unwrap().with_path("/a");
        assert_eq!(uri.to_string(), "/a?x=1");
        assert_eq!(uri.query_params().get("x"), Some("1"));
    }
}
