//! Path parameters, query strings and URI component encoding
//!
//! Path parameter values are stored exactly as they appear in the matched
//! location. Use [`decode_component`] (or [`RouteParams::get_decoded`]) when
//! the human-readable value is needed, and [`encode_component`] when building
//! a location from values.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;

/// Characters left untouched by [`encode_component`]
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single URI component
///
/// ```
/// use gpui_shell_router::encode_component;
///
/// assert_eq!(encode_component("hello world"), "hello%20world");
/// ```
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Decode a percent-encoded URI component
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

// ============================================================================
// Route Parameters
// ============================================================================

/// Path parameters extracted from a matched location
///
/// # Example
///
/// ```
/// use gpui_shell_router::RouteParams;
///
/// // Route pattern: /family/:fid
/// // Matched path: /family/f1
/// let mut params = RouteParams::new();
/// params.insert("fid", "f1");
///
/// assert_eq!(params.get("fid"), Some("f1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Raw parameter value as it appeared in the location
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Percent-decoded parameter value
    pub fn get_decoded(&self, key: &str) -> Option<String> {
        self.get(key).map(decode_component)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get_decoded(key)?.parse().ok()
    }

    /// Insert a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Copy every parameter of `other` into `self`
    pub fn extend(&mut self, other: &RouteParams) {
        self.params
            .extend(other.params.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Keep only the parameters accepted by `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.params.retain(|key, _| keep(key));
    }

    /// Get all parameters as a reference to the HashMap
    pub fn all(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Iterate over all parameters
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from a location's query string
///
/// Keeps insertion order and supports repeated keys.
///
/// ```
/// use gpui_shell_router::QueryParams;
///
/// let query = QueryParams::from_query_string("page=1&tag=rust&tag=gpui");
///
/// assert_eq!(query.get("page"), Some("1"));
/// assert_eq!(query.get_all("tag").count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create new empty query params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from query string
    ///
    /// A pair without `=` is kept with an empty value. `+` decodes to a space.
    pub fn from_query_string(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_query_part(key), decode_query_part(value))
            })
            .collect();

        Self { pairs }
    }

    /// Get first value for a parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get all values for a parameter, in order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get parameter as a specific type
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a parameter; repeated keys are kept
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Check if parameter exists
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Convert to an encoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Check if parameters are empty
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of key/value pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn decode_query_part(value: &str) -> String {
    decode_component(&value.replace('+', " "))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_params_basic() {
        let mut params = RouteParams::new();
        params.insert("id", "123");

        assert_eq!(params.get("id"), Some("123"));
        assert!(params.contains("id"));
        assert!(!params.contains("missing"));
        assert_eq!(params.get_as::<u32>("id"), Some(123));
    }

    #[test]
    fn test_route_params_keep_raw_value() {
        let params: RouteParams = [("name", "John%20Doe")].into_iter().collect();

        assert_eq!(params.get("name"), Some("John%20Doe"));
        assert_eq!(params.get_decoded("name").as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_route_params_extend_and_retain() {
        let mut params: RouteParams = [("fid", "f1")].into_iter().collect();
        params.extend(&[("pid", "p1")].into_iter().collect());
        assert_eq!(params.len(), 2);

        params.retain(|key| key == "fid");
        assert_eq!(params.len(), 1);
        assert!(params.contains("fid"));
    }

    #[test]
    fn test_component_encoding() {
        assert_eq!(encode_component("hello world"), "hello%20world");
        assert_eq!(encode_component("a/b"), "a%2Fb");
        assert_eq!(encode_component("safe-_.~"), "safe-_.~");
        assert_eq!(encode_component("café"), "caf%C3%A9");
        assert_eq!(decode_component("caf%C3%A9"), "café");
    }

    #[test]
    fn test_query_params_basic() {
        let query = QueryParams::from_query_string("page=1&sort=name&flag");

        assert_eq!(query.get("page"), Some("1"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.get("missing"), None);
        assert_eq!(query.get_as::<i32>("page"), Some(1));
    }

    #[test]
    fn test_query_params_multiple_values() {
        let query = QueryParams::from_query_string("tag=rust&tag=gpui&tag=ui");

        let tags: Vec<_> = query.get_all("tag").collect();
        assert_eq!(tags, vec!["rust", "gpui", "ui"]);
        assert_eq!(query.get("tag"), Some("rust"));
    }

    #[test]
    fn test_query_params_decoding() {
        let query = QueryParams::from_query_string("q=hello+world&x=a%26b");
        assert_eq!(query.get("q"), Some("hello world"));
        assert_eq!(query.get("x"), Some("a&b"));
    }

    #[test]
    fn test_to_query_string_keeps_order() {
        let mut query = QueryParams::new();
        query.insert("page", "1");
        query.insert("q", "a b");

        assert_eq!(query.to_query_string(), "page=1&q=a%20b");
    }

    #[test]
    fn test_empty_query_string() {
        let query = QueryParams::from_query_string("");
        assert!(query.is_empty());
        assert_eq!(query.len(), 0);
    }
}
