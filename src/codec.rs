//! Match-list state codec
//!
//! Turns a resolved [`MatchList`] into a value the host can keep in its
//! history and back again. Only the location, the extra and the imperative
//! frames are stored; everything else is re-resolved on decode against the
//! current configuration.
//!
//! Imperative frames are encoded recursively with their page keys. A decoded
//! imperative frame has no completer: whoever awaited the original push is
//! gone.
//!
//! Wire format (camelCase JSON):
//!
//! ```json
//! {
//!   "location": "/family/f1",
//!   "state": { "codec": "json", "encoded": "{\"tab\":1}" },
//!   "imperativeMatches": [
//!     { "location": "/person/p1", "pageKey": "..." }
//!   ]
//! }
//! ```

use crate::configuration::RouteConfiguration;
use crate::error::CodecError;
use crate::match_list::{Extra, MatchList, PageKey};
use crate::{debug_log, warn_log};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

const JSON_CODEC: &str = "json";
const CUSTOM_CODEC: &str = "custom";

// ============================================================================
// ExtraCodec
// ============================================================================

/// Converts navigation extras to and from JSON values
pub trait ExtraCodec: Send + Sync + 'static {
    fn encode(&self, extra: &Extra) -> Result<Value, CodecError>;

    fn decode(&self, value: &Value) -> Result<Extra, CodecError>;
}

/// [`ExtraCodec`] for one serde type
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Draft { id: u32 }
///
/// RouteConfiguration::builder().extra_codec(JsonExtraCodec::<Draft>::new())
/// ```
pub struct JsonExtraCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonExtraCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonExtraCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExtraCodec for JsonExtraCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn encode(&self, extra: &Extra) -> Result<Value, CodecError> {
        let value = extra
            .downcast_ref::<T>()
            .ok_or(CodecError::UnexpectedExtraType {
                expected: std::any::type_name::<T>(),
            })?;
        Ok(serde_json::to_value(value)?)
    }

    fn decode(&self, value: &Value) -> Result<Extra, CodecError> {
        let value: T = serde_json::from_value(value.clone())?;
        Ok(Extra::new(value))
    }
}

// ============================================================================
// EncodedMatchList
// ============================================================================

/// Persisted form of an extra
#[derive(Clone, Default)]
pub enum PersistedExtra {
    #[default]
    None,
    /// Written by the configured [`ExtraCodec`]
    Custom(Value),
    /// Carried as-is; writable to JSON only when it holds a [`Value`]
    Opaque(Extra),
}

impl fmt::Debug for PersistedExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistedExtra::None => f.write_str("None"),
            PersistedExtra::Custom(value) => f.debug_tuple("Custom").field(value).finish(),
            PersistedExtra::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Persistable snapshot of a [`MatchList`]
#[derive(Debug, Clone)]
pub struct EncodedMatchList {
    pub location: String,
    pub extra: PersistedExtra,
    pub imperative_matches: Vec<EncodedMatchList>,
    /// Set on imperative entries only
    pub page_key: Option<PageKey>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatchList {
    location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<WireState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    imperative_matches: Vec<WireMatchList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_key: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireState {
    codec: String,
    encoded: Value,
}

impl EncodedMatchList {
    /// Write the JSON wire format
    pub fn to_json(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self.to_wire()?)?)
    }

    /// Read the JSON wire format
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let wire: WireMatchList = serde_json::from_value(value.clone())
            .map_err(|e| CodecError::InvalidFormat(e.to_string()))?;
        Self::from_wire(wire)
    }

    fn to_wire(&self) -> Result<WireMatchList, CodecError> {
        let state = match &self.extra {
            PersistedExtra::None => None,
            PersistedExtra::Custom(value) => Some(WireState {
                codec: CUSTOM_CODEC.to_string(),
                encoded: value.clone(),
            }),
            PersistedExtra::Opaque(extra) => {
                let value = extra.downcast_ref::<Value>().ok_or(CodecError::OpaqueExtra)?;
                Some(WireState {
                    codec: JSON_CODEC.to_string(),
                    encoded: Value::String(serde_json::to_string(value)?),
                })
            }
        };

        Ok(WireMatchList {
            location: self.location.clone(),
            state,
            imperative_matches: self
                .imperative_matches
                .iter()
                .map(Self::to_wire)
                .collect::<Result<_, _>>()?,
            page_key: self.page_key.as_ref().map(|key| key.as_str().to_string()),
        })
    }

    fn from_wire(wire: WireMatchList) -> Result<Self, CodecError> {
        let extra = match wire.state {
            None => PersistedExtra::None,
            Some(state) => match state.codec.as_str() {
                CUSTOM_CODEC => PersistedExtra::Custom(state.encoded),
                JSON_CODEC => {
                    let text = state.encoded.as_str().ok_or_else(|| {
                        CodecError::InvalidFormat("json state must be a string".to_string())
                    })?;
                    let value: Value = serde_json::from_str(text)
                        .map_err(|e| CodecError::InvalidFormat(e.to_string()))?;
                    PersistedExtra::Opaque(Extra::new(value))
                }
                other => return Err(CodecError::UnknownCodec(other.to_string())),
            },
        };

        Ok(Self {
            location: wire.location,
            extra,
            imperative_matches: wire
                .imperative_matches
                .into_iter()
                .map(Self::from_wire)
                .collect::<Result<_, _>>()?,
            page_key: wire.page_key.map(PageKey::new),
        })
    }
}

// ============================================================================
// MatchListCodec
// ============================================================================

/// Encodes and decodes match lists against a configuration
#[derive(Clone)]
pub struct MatchListCodec {
    configuration: Arc<RouteConfiguration>,
}

impl MatchListCodec {
    pub fn new(configuration: Arc<RouteConfiguration>) -> Self {
        Self { configuration }
    }

    pub fn encode(&self, list: &MatchList) -> Result<EncodedMatchList, CodecError> {
        self.encode_list(list, None)
    }

    fn encode_list(
        &self,
        list: &MatchList,
        page_key: Option<PageKey>,
    ) -> Result<EncodedMatchList, CodecError> {
        let extra = match (list.extra(), self.configuration.extra_codec()) {
            (None, _) => PersistedExtra::None,
            (Some(extra), Some(codec)) => PersistedExtra::Custom(codec.encode(extra)?),
            (Some(extra), None) => PersistedExtra::Opaque(extra.clone()),
        };

        let imperative_matches = list
            .imperative_frames()
            .map(|frame| self.encode_list(&frame.matches, Some(frame.page_key.clone())))
            .collect::<Result<_, _>>()?;

        Ok(EncodedMatchList {
            location: list.location(),
            extra,
            imperative_matches,
            page_key,
        })
    }

    /// Rebuild a list from `encoded`
    ///
    /// Locations are resolved again without redirects; the parser runs those.
    pub fn decode(&self, encoded: &EncodedMatchList) -> Result<MatchList, CodecError> {
        let extra = match &encoded.extra {
            PersistedExtra::None => None,
            PersistedExtra::Opaque(extra) => Some(extra.clone()),
            PersistedExtra::Custom(value) => {
                let codec = self.configuration.extra_codec().ok_or_else(|| {
                    warn_log!("Persisted extra for '{}' needs an extra codec", encoded.location);
                    CodecError::UnknownCodec(CUSTOM_CODEC.to_string())
                })?;
                Some(codec.decode(value)?)
            }
        };

        let mut list = self.configuration.find_match(&encoded.location, extra);
        if list.is_error() {
            debug_log!("Persisted location '{}' no longer resolves", encoded.location);
            return Ok(list);
        }
        for imperative in &encoded.imperative_matches {
            let page_key = imperative
                .page_key
                .clone()
                .ok_or_else(|| CodecError::MissingPageKey {
                    location: imperative.location.clone(),
                })?;
            let nested = self.decode(imperative)?;
            list = list.push_with_key(nested, page_key, None);
        }
        Ok(list)
    }
}

impl fmt::Debug for MatchListCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchListCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_list::{Completer, MatchFrame};
    use crate::route::Route;
    use gpui::div;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Draft {
        id: u32,
        title: String,
    }

    fn page(path: &str) -> Route {
        Route::new(path.to_string(), |_, _| div())
    }

    fn configuration(with_codec: bool) -> Arc<RouteConfiguration> {
        let mut builder = RouteConfiguration::builder()
            .route(page("/"))
            .route(page("/family/:fid").child(page("person/:pid")))
            .route(page("/settings"));
        if with_codec {
            builder = builder.extra_codec(JsonExtraCodec::<Draft>::new());
        }
        Arc::new(builder.build().unwrap())
    }

    fn draft() -> Extra {
        Extra::new(Draft {
            id: 7,
            title: "hello".to_string(),
        })
    }

    #[test]
    fn test_round_trip_with_imperative_frames() {
        let config = configuration(true);
        let codec = MatchListCodec::new(Arc::clone(&config));

        let base = config.find_match("/family/f1?tab=2", None);
        let (completer, _result) = Completer::new();
        let list = base.push(config.find_match("/settings", Some(draft())), Some(completer));
        let list = list.push(config.find_match("/family/f2/person/p3", None), None);

        let wire = codec.encode(&list).unwrap().to_json().unwrap();
        let decoded = codec
            .decode(&EncodedMatchList::from_json(&wire).unwrap())
            .unwrap();

        assert_eq!(decoded, list);
        assert_eq!(decoded.page_keys(), list.page_keys());

        let restored: Vec<_> = decoded.imperative_frames().collect();
        assert_eq!(restored.len(), 2);
        assert!(restored.iter().all(|frame| frame.completer.is_none()));
        assert_eq!(
            restored[0].matches.extra().and_then(|e| e.downcast_ref::<Draft>()),
            Some(&Draft {
                id: 7,
                title: "hello".to_string()
            })
        );
        assert_eq!(restored[1].matches.path_params().get("pid"), Some("p3"));
    }

    #[test]
    fn test_wire_format() {
        let config = configuration(true);
        let codec = MatchListCodec::new(Arc::clone(&config));
        let list = config
            .find_match("/", None)
            .push(config.find_match("/settings", Some(draft())), None);

        let wire = codec.encode(&list).unwrap().to_json().unwrap();
        let MatchFrame::Imperative(frame) = list.last().unwrap() else {
            panic!("expected imperative frame");
        };
        assert_eq!(
            wire,
            json!({
                "location": "/",
                "imperativeMatches": [{
                    "location": "/settings",
                    "state": { "codec": "custom", "encoded": { "id": 7, "title": "hello" } },
                    "pageKey": frame.page_key.as_str(),
                }],
            })
        );
    }

    #[test]
    fn test_opaque_json_extra() {
        let config = configuration(false);
        let codec = MatchListCodec::new(Arc::clone(&config));
        let list = config.find_match("/settings", Some(Extra::new(json!({ "step": 2 }))));

        let wire = codec.encode(&list).unwrap().to_json().unwrap();
        assert_eq!(wire["state"]["codec"], "json");
        assert_eq!(wire["state"]["encoded"], "{\"step\":2}");

        let decoded = codec
            .decode(&EncodedMatchList::from_json(&wire).unwrap())
            .unwrap();
        assert_eq!(
            decoded.extra().and_then(|e| e.downcast_ref::<Value>()),
            Some(&json!({ "step": 2 }))
        );
    }

    #[test]
    fn test_opaque_extra_round_trips_in_process() {
        let config = configuration(false);
        let codec = MatchListCodec::new(Arc::clone(&config));
        let extra = draft();
        let list = config.find_match("/settings", Some(extra.clone()));

        let encoded = codec.encode(&list).unwrap();
        assert!(matches!(encoded.to_json(), Err(CodecError::OpaqueExtra)));

        let decoded = codec.decode(&encoded).unwrap();
        assert!(decoded.extra().unwrap().ptr_eq(&extra));
    }

    #[test]
    fn test_custom_extra_without_codec() {
        let codec = MatchListCodec::new(configuration(false));
        let encoded = EncodedMatchList::from_json(&json!({
            "location": "/settings",
            "state": { "codec": "custom", "encoded": { "id": 1, "title": "x" } },
        }))
        .unwrap();
        assert_eq!(
            codec.decode(&encoded).unwrap_err(),
            CodecError::UnknownCodec("custom".to_string())
        );
    }

    #[test]
    fn test_wrong_extra_type_for_codec() {
        let config = configuration(true);
        let codec = MatchListCodec::new(Arc::clone(&config));
        let list = config.find_match("/settings", Some(Extra::new(5u8)));
        assert!(matches!(
            codec.encode(&list),
            Err(CodecError::UnexpectedExtraType { .. })
        ));
    }

    #[test]
    fn test_malformed_wire_values() {
        assert!(matches!(
            EncodedMatchList::from_json(&json!({ "nope": 1 })),
            Err(CodecError::InvalidFormat(_))
        ));
        assert_eq!(
            EncodedMatchList::from_json(&json!({
                "location": "/",
                "state": { "codec": "xml", "encoded": "" },
            }))
            .unwrap_err(),
            CodecError::UnknownCodec("xml".to_string())
        );

        let codec = MatchListCodec::new(configuration(false));
        let encoded = EncodedMatchList::from_json(&json!({
            "location": "/",
            "imperativeMatches": [{ "location": "/settings" }],
        }))
        .unwrap();
        assert_eq!(
            codec.decode(&encoded).unwrap_err(),
            CodecError::MissingPageKey {
                location: "/settings".to_string()
            }
        );
    }

    #[test]
    fn test_error_list_round_trip() {
        let config = configuration(false);
        let codec = MatchListCodec::new(Arc::clone(&config));
        let list = config.find_match("/missing", None);

        let decoded = codec.decode(&codec.encode(&list).unwrap()).unwrap();
        assert!(decoded.is_error());
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_stale_base_drops_pushed_pages() {
        let codec = MatchListCodec::new(configuration(false));
        let encoded = EncodedMatchList::from_json(&json!({
            "location": "/gone",
            "imperativeMatches": [{ "location": "/settings", "pageKey": "k" }],
        }))
        .unwrap();

        let decoded = codec.decode(&encoded).unwrap();
        assert!(decoded.is_error());
        assert!(decoded.is_empty());
        assert_eq!(decoded.location(), "/gone");
    }
}
