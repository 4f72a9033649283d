use http::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// One caller's request against a batch endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRequest {
    pub method: Method,
    /// Target path, relative to the gateway's API root
    pub target: String,
    /// Query parameters other than the key-set
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Requested item identifiers, in the order the caller wants them back
    pub ids: Vec<String>,
}

impl BatchRequest {
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            target: target.into(),
            query: Vec::new(),
            headers: Vec::new(),
            ids: Vec::new(),
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// Single item returned by a batch endpoint.
pub struct Item {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Every other field, passed through untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }
}

/// Accept `"id": "7"` and `"id": 7` alike, numeric ids are kept in their decimal form
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
/// Body of a batch endpoint response.
pub struct ItemsResponse {
    pub items: Vec<Item>,
}
