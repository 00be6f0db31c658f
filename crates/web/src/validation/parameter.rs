use serde_json::Value;

use crate::validation::Rule;

/// One declared input, resolved against the request for a single validation pass.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    value: Option<Value>,
    required: bool,
    rule: Option<Rule>,
    custom_errors: Vec<(String, String)>,
}

impl Parameter {
    /// An explicit `null` value is stored as absent.
    pub fn new(
        name: impl Into<String>,
        value: Option<Value>,
        required: bool,
        rule: Option<Rule>,
        custom_errors: Vec<(String, String)>,
    ) -> Self {
        Self { name: name.into(), value: value.filter(|value| !value.is_null()), required, rule, custom_errors }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    pub fn custom_errors(&self) -> &[(String, String)] {
        &self.custom_errors
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// Checks the value against the rule.
    ///
    /// Without a rule every value passes. An optional parameter without a value, or with an
    /// empty string, passes too; a required one is always checked, absent values included.
    pub fn validate(&self) -> bool {
        match &self.rule {
            None => true,
            Some(_) if !self.required && self.is_undefined() => true,
            Some(rule) => rule.is_valid(self.value.as_ref().unwrap_or(&Value::Null)),
        }
    }

    fn is_undefined(&self) -> bool {
        match &self.value {
            None => true,
            Some(Value::String(value)) => value.is_empty(),
            Some(_) => false,
        }
    }

    pub fn required_but_missing(&self) -> bool {
        self.required && self.value.is_none()
    }

    /// Describes why the value fails its rule, e.g.
    /// `Invalid parameter number: 'abc' must be an integer number`.
    ///
    /// Returns `None` when there is no rule or the value passes it.
    pub fn validation_error(&self) -> Option<String> {
        let rule = self.rule.as_ref()?;
        if !self.required && self.is_undefined() {
            return None;
        }
        let value = self.value.as_ref().unwrap_or(&Value::Null);

        let failures = rule.assert(value).err()?;
        let message = failures.message(value, &self.custom_errors).replace('"', "'");

        Some(format!("Invalid parameter {}: {message}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::ValidatorCatalog;

    fn parameter(name: &str, value: Option<Value>, required: bool, type_name: &str) -> Parameter {
        let lookup = ValidatorCatalog::builtin().lookup(Some(type_name));
        Parameter::new(name, value, required, lookup.rule, lookup.custom_errors)
    }

    #[test]
    fn without_rule() {
        let param = Parameter::new("notes", Some(json!([1, 2])), false, None, vec![]);

        assert!(param.validate());
        assert!(param.validation_error().is_none());
        assert!(!param.required_but_missing());
    }

    #[test]
    fn required_but_missing() {
        assert!(parameter("id", None, true, "int").required_but_missing());
        assert!(parameter("id", Some(Value::Null), true, "int").required_but_missing());
        assert!(!parameter("id", Some(json!(0)), true, "int").required_but_missing());
        assert!(!parameter("id", None, false, "int").required_but_missing());
    }

    #[test]
    fn optional_absent_passes() {
        assert!(parameter("latitude", None, false, "latitude").validate());
        assert!(!parameter("latitude", None, true, "latitude").validate());
    }

    #[test]
    fn optional_empty_string_passes() {
        let param = parameter("favorite", Some(json!("")), false, "flag");
        assert!(param.validate());
        assert!(param.validation_error().is_none());

        let param = parameter("number", Some(json!("")), true, "int");
        assert!(!param.validate());
        assert_eq!(param.validation_error().as_deref(), Some("Invalid parameter number: '' must be an integer number"));
    }

    #[test]
    fn present_value_is_checked() {
        assert!(parameter("latitude", Some(json!("40.5")), false, "latitude").validate());
        assert!(!parameter("latitude", Some(json!(-91)), false, "latitude").validate());
        assert!(parameter("number", Some(json!(7)), true, "int").validate());
    }

    #[test]
    fn validation_error_quotes() {
        let param = parameter("number", Some(json!("abc")), true, "int");

        assert!(!param.validate());
        assert_eq!(
            param.validation_error().as_deref(),
            Some("Invalid parameter number: 'abc' must be an integer number")
        );
    }

    #[test]
    fn validation_error_default_message() {
        let param = parameter("biz_id", Some(json!(40.55)), true, "positiveNonZeroInt");
        assert_eq!(param.validation_error().as_deref(), Some("Invalid parameter biz_id: 40.55 must be an integer number"));

        let param = parameter("latitude", Some(json!(91)), false, "latitude");
        assert_eq!(
            param.validation_error().as_deref(),
            Some("Invalid parameter latitude: 91 must be less than or equal to 90")
        );
    }

    #[test]
    fn validation_error_custom_message() {
        let param = parameter("consumer_acct_id", Some(json!(0)), true, "nonZeroInt");
        assert_eq!(
            param.validation_error().as_deref(),
            Some("Invalid parameter consumer_acct_id: 0 must be a non-zero integer")
        );

        let param = parameter("consumer_acct_id", Some(json!(-3)), true, "nonZeroInt");
        assert!(param.validate());
        assert!(param.validation_error().is_none());
    }

    #[test]
    fn date_message() {
        let param = parameter("day", Some(json!("08-08-2014")), true, "Y-m-d");
        assert_eq!(
            param.validation_error().as_deref(),
            Some("Invalid parameter day: '08-08-2014' must be a valid date. Sample format: '2005-12-30'")
        );
    }
}
