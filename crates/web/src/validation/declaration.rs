//! Per-handler parameter declarations.
//!
//! Declarations are usually built in code:
//!
//! ```
//! use metal_web::validation::{Declarations, ParamSpec};
//!
//! let declarations = Declarations::new()
//!     .param("number", ParamSpec::required().with_type("int"))
//!     .param("favorite", ParamSpec::optional().with_type("flag").with_default(0));
//!
//! assert_eq!(declarations.names().collect::<Vec<_>>(), vec!["number", "favorite"]);
//! ```
//!
//! but can also be read from json, where the object keeps the declaration order:
//! `{"number": {"required": true, "type": "int"}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required() -> Self {
        Self { required: true, type_name: None, default: None }
    }

    pub fn optional() -> Self {
        Self { required: false, type_name: None, default: None }
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Declared parameters in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    specs: Vec<(String, ParamSpec)>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name`; declaring a name twice replaces the earlier spec in place.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        let name = name.into();
        match self.specs.iter_mut().find(|(declared, _)| *declared == name) {
            Some((_, declared)) => *declared = spec,
            None => self.specs.push((name, spec)),
        }
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let map = serde_json::from_str::<Map<String, Value>>(json)?;
        map.into_iter()
            .map(|(name, spec)| serde_json::from_value::<ParamSpec>(spec).map(|spec| (name, spec)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|(declared, _)| declared == name).map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.specs.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ParamSpec)> for Declarations {
    fn from_iter<T: IntoIterator<Item = (K, ParamSpec)>>(iter: T) -> Self {
        iter.into_iter().fold(Self::new(), |declarations, (name, spec)| declarations.param(name, spec))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn from_json() {
        let declarations = Declarations::from_json_str(indoc! {r#"
            {
                "biz_id": {"required": true, "type": "positiveNonZeroInt"},
                "latitude": {"required": false, "type": "latitude", "default": 40.5},
                "notes": {"required": false}
            }
        "#})
        .unwrap();

        assert_eq!(declarations.names().collect::<Vec<_>>(), vec!["biz_id", "latitude", "notes"]);
        assert_eq!(declarations.get("biz_id"), Some(&ParamSpec::required().with_type("positiveNonZeroInt")));
        assert_eq!(declarations.get("latitude").and_then(|spec| spec.default.clone()), Some(json!(40.5)));
        assert_eq!(declarations.get("notes"), Some(&ParamSpec::optional()));
    }

    #[test]
    fn required_is_mandatory() {
        assert!(Declarations::from_json_str(r#"{"id": {"type": "int"}}"#).is_err());
    }

    #[test]
    fn redeclare_keeps_position() {
        let declarations = Declarations::new()
            .param("a", ParamSpec::optional())
            .param("b", ParamSpec::optional())
            .param("a", ParamSpec::required());

        assert_eq!(declarations.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(declarations.get("a").unwrap().required);
        assert_eq!(declarations.len(), 2);
    }
}
