//! The request parameter bag.
//!
//! Parameters come from the query string, from the body and from the matched route. They
//! are kept as [`serde_json::Value`]s so validators and serializers work on one closed
//! value type whatever the source was.

use serde_json::{Map, Value};

use crate::error::ApiError;

const SEQUENCE_SUFFIX: &str = "[]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` query string.
    ///
    /// Values are kept as strings. Keys ending in `[]` collect their values into a sequence,
    /// so `id[]=1&id[]=2` becomes `{"id": ["1", "2"]}`. A repeated plain key keeps its last value.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .map_err(|e| ApiError::bad_request(format!("invalid query string: {e}")))?;
        Ok(Self::from_pairs(pairs))
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    pub fn from_form_body(body: &[u8]) -> Result<Self, ApiError> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map_err(|e| ApiError::bad_request(format!("invalid form body: {e}")))?;
        Ok(Self::from_pairs(pairs))
    }

    /// Decodes a JSON body, which must be an object.
    pub fn from_json_body(body: &[u8]) -> Result<Self, ApiError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(inner)) => Ok(Self { inner }),
            Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
            Err(e) => Err(ApiError::bad_request(format!("invalid json body: {e}"))),
        }
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::new();

        for (key, value) in pairs {
            match key.strip_suffix(SEQUENCE_SUFFIX) {
                Some(name) => match params.inner.entry(name.to_string()).or_insert_with(|| Value::Array(vec![])) {
                    Value::Array(values) => values.push(Value::String(value)),
                    other => *other = Value::Array(vec![Value::String(value)]),
                },
                None => {
                    params.inner.insert(key, Value::String(value));
                }
            }
        }

        params
    }

    /// The raw value sent under `name`, `null` included.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.get(name)
    }

    /// The value sent under `name`, treating an explicit `null` as not sent.
    pub fn get_present(&self, name: &str) -> Option<&Value> {
        self.inner.get(name).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.inner.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Layers `other` on top of these params; on a name collision the value from `other` wins.
    pub fn merge(&mut self, other: Params) {
        self.inner.extend(other.inner);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
