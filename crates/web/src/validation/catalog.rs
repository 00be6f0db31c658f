//! Shorthand type names for parameter declarations.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::validation::Rule;

const NON_ZERO_INT_MESSAGE: &str = "{{name}} must be a non-zero integer";

const NO_CUSTOM_ERRORS: [(&str, &str); 0] = [];

static BUILTIN: Lazy<ValidatorCatalog> = Lazy::new(ValidatorCatalog::new);

/// The rule and custom messages registered under one type name.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    pub rule: Option<Rule>,
    pub custom_errors: Vec<(String, String)>,
}

/// Maps type names such as `int` or `latitude` to rules.
///
/// Unknown names resolve to no rule at all, which always validates; required-ness is
/// checked separately.
#[derive(Debug, Clone)]
pub struct ValidatorCatalog {
    entries: HashMap<String, Lookup>,
}

impl ValidatorCatalog {
    /// A catalog holding the built-in type names.
    pub fn new() -> Self {
        let mut catalog = Self::empty();

        catalog
            .register("string", Rule::StringType, NO_CUSTOM_ERRORS)
            .register("integer", Rule::IntVal, NO_CUSTOM_ERRORS)
            .register("int", Rule::IntVal, NO_CUSTOM_ERRORS)
            .register("latitude", Rule::AllOf(vec![Rule::Numeric, Rule::Min(-90.0), Rule::Max(90.0)]), NO_CUSTOM_ERRORS)
            .register("longitude", Rule::AllOf(vec![Rule::Numeric, Rule::Min(-180.0), Rule::Max(180.0)]), NO_CUSTOM_ERRORS)
            .register("phone", Rule::Phone, NO_CUSTOM_ERRORS)
            .register("flag", Rule::AllOf(vec![Rule::Numeric, Rule::Min(0.0), Rule::Max(1.0)]), NO_CUSTOM_ERRORS)
            .register("positiveNonZeroInt", Rule::AllOf(vec![Rule::IntVal, Rule::Positive]), NO_CUSTOM_ERRORS)
            .register("nonNegativeInt", Rule::AllOf(vec![Rule::IntVal, Rule::Min(0.0)]), NO_CUSTOM_ERRORS)
            .register(
                "nonZeroInt",
                Rule::AllOf(vec![Rule::IntVal, Rule::OneOf(vec![Rule::Positive, Rule::Negative])]),
                [("positive", NON_ZERO_INT_MESSAGE), ("negative", NON_ZERO_INT_MESSAGE), ("intVal", NON_ZERO_INT_MESSAGE)],
            )
            .register("Y-m-d", Rule::date("%Y-%m-%d"), NO_CUSTOM_ERRORS);

        catalog
    }

    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// The shared catalog of built-in type names.
    pub fn builtin() -> &'static ValidatorCatalog {
        &BUILTIN
    }

    /// Registers `rule` under `name`, replacing any previous entry.
    pub fn register<I, K, V>(&mut self, name: impl Into<String>, rule: Rule, custom_errors: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let custom_errors = custom_errors.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.entries.insert(name.into(), Lookup { rule: Some(rule), custom_errors });
        self
    }

    pub fn lookup(&self, type_name: Option<&str>) -> Lookup {
        type_name.and_then(|name| self.entries.get(name)).cloned().unwrap_or_default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }
}

impl Default for ValidatorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn rule(type_name: &str) -> Rule {
        ValidatorCatalog::builtin().lookup(Some(type_name)).rule.unwrap()
    }

    fn check(type_name: &str, valid: &[Value], invalid: &[Value]) {
        let rule = rule(type_name);
        for value in valid {
            assert!(rule.is_valid(value), "{type_name} should accept {value}");
        }
        for value in invalid {
            assert!(!rule.is_valid(value), "{type_name} should reject {value}");
        }
    }

    #[test]
    fn absent_and_unknown() {
        let catalog = ValidatorCatalog::builtin();

        let lookup = catalog.lookup(None);
        assert!(lookup.rule.is_none());
        assert!(lookup.custom_errors.is_empty());

        let lookup = catalog.lookup(Some("uuid"));
        assert!(lookup.rule.is_none());
        assert!(lookup.custom_errors.is_empty());
    }

    #[test]
    fn builtin_types() {
        check("string", &[json!("abc")], &[json!(1)]);
        check("integer", &[json!(1)], &[json!(1.44)]);
        check("int", &[json!(1)], &[json!(1.44)]);
        check("latitude", &[json!(1), json!(-90), json!(90)], &[json!(91), json!(-91)]);
        check("longitude", &[json!(1), json!(180)], &[json!(181), json!(-181)]);
        check("phone", &[json!(15_555_555_555_u64), json!("1-603-549-2944")], &[json!(0), json!("abcdefghijk")]);
        check("positiveNonZeroInt", &[json!(100)], &[json!(0), json!(-1), json!(100.1)]);
        check("nonNegativeInt", &[json!(1), json!(0)], &[json!(-1), json!(100.1)]);
        check("Y-m-d", &[json!("2014-08-08")], &[json!("08-08-2014")]);
    }

    #[test]
    fn flag_rejects_booleans() {
        check("flag", &[json!(1), json!(0), json!("1"), json!("0")], &[json!(-1), json!(true), json!(false)]);
    }

    #[test]
    fn non_zero_int() {
        check("nonZeroInt", &[json!(1), json!(-1), json!("-12")], &[json!(0), json!(1.2), json!("abc")]);

        let lookup = ValidatorCatalog::builtin().lookup(Some("nonZeroInt"));
        assert_eq!(lookup.custom_errors.len(), 3);

        let rule = lookup.rule.unwrap();
        for value in [json!(0), json!(1.2), json!("abc")] {
            let failures = rule.assert(&value).unwrap_err();
            assert!(failures.message(&value, &lookup.custom_errors).ends_with("must be a non-zero integer"));
        }
    }

    #[test]
    fn register() {
        let mut catalog = ValidatorCatalog::new();
        catalog.register("percent", Rule::AllOf(vec![Rule::Numeric, Rule::Min(0.0), Rule::Max(100.0)]), [(
            "max",
            "{{name}} is not a percentage",
        )]);

        assert!(catalog.contains("percent"));
        assert!(catalog.contains("int"));

        let lookup = catalog.lookup(Some("percent"));
        let rule = lookup.rule.unwrap();
        let failures = rule.assert(&json!(101)).unwrap_err();
        assert_eq!(failures.message(&json!(101), &lookup.custom_errors), "101 is not a percentage");
    }
}
