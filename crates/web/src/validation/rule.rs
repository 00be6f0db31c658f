//! Validation rules over parameter values.
//!
//! A [`Rule`] is a small predicate tree. Leaves check one property of a value; [`Rule::AllOf`]
//! and [`Rule::OneOf`] combine them. Besides the boolean [`Rule::is_valid`], a rule can
//! explain a failure through [`Rule::assert`], which reports every failed node so callers can
//! pick a custom message by rule name.

use std::fmt;
use std::fmt::Write;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Template placeholder replaced with the rendered value in failure messages.
pub const NAME_PLACEHOLDER: &str = "{{name}}";

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").expect("valid integer regex"));

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("valid numeric regex"));

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?(\d{0,3})?[(.\-\s]?((\d{1,3})[).\-\s]*)?((\d{3,5})[.\-\s]?(\d{4})|(\d{2}[.\-\s]?){4})$")
        .expect("valid phone regex")
});

/// Sample date rendered into the failure message of [`Rule::Date`].
const DATE_SAMPLE: (i32, u32, u32) = (2005, 12, 30);

#[derive(Debug, Clone)]
pub enum Rule {
    /// The value is a string.
    StringType,
    /// The value is an integer, an integral float or a string holding an integer.
    IntVal,
    /// The value is a number or a string holding a finite number. Booleans are not numeric.
    Numeric,
    /// A numeric value `>=` the bound.
    Min(f64),
    /// A numeric value `<=` the bound.
    Max(f64),
    Positive,
    Negative,
    /// Telephone number syntax.
    Phone,
    /// A string in the given `chrono` date format, e.g. `%Y-%m-%d`.
    Date(String),
    /// A string matching the expression.
    Matches(Regex),
    AllOf(Vec<Rule>),
    OneOf(Vec<Rule>),
}

impl Rule {
    pub fn date(format: impl Into<String>) -> Self {
        Rule::Date(format.into())
    }

    /// The name custom error messages are keyed by.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::StringType => "stringType",
            Rule::IntVal => "intVal",
            Rule::Numeric => "numeric",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Positive => "positive",
            Rule::Negative => "negative",
            Rule::Phone => "phone",
            Rule::Date(_) => "date",
            Rule::Matches(_) => "regex",
            Rule::AllOf(_) => "allOf",
            Rule::OneOf(_) => "oneOf",
        }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        match self {
            Rule::StringType => value.is_string(),
            Rule::IntVal => is_integer(value),
            Rule::Numeric => as_number(value).is_some(),
            Rule::Min(min) => as_number(value).is_some_and(|n| n >= *min),
            Rule::Max(max) => as_number(value).is_some_and(|n| n <= *max),
            Rule::Positive => as_number(value).is_some_and(|n| n > 0.0),
            Rule::Negative => as_number(value).is_some_and(|n| n < 0.0),
            Rule::Phone => as_text(value).is_some_and(|text| PHONE.is_match(&text)),
            Rule::Date(format) => value.as_str().is_some_and(|s| is_date(s, format)),
            Rule::Matches(regex) => as_text(value).is_some_and(|text| regex.is_match(&text)),
            Rule::AllOf(rules) => rules.iter().all(|rule| rule.is_valid(value)),
            Rule::OneOf(rules) => rules.iter().any(|rule| rule.is_valid(value)),
        }
    }

    /// Checks `value` and describes what failed.
    ///
    /// Failed nodes are reported depth-first. A failed [`Rule::OneOf`] reports itself
    /// before its branches; [`Rule::AllOf`] only reports the children that failed.
    pub fn assert(&self, value: &Value) -> Result<(), Failures> {
        let mut failures = Vec::new();
        self.collect_failures(value, &mut failures);

        if failures.is_empty() { Ok(()) } else { Err(Failures { failures }) }
    }

    fn collect_failures<'a>(&'a self, value: &Value, failures: &mut Vec<&'a Rule>) {
        match self {
            Rule::AllOf(rules) => rules.iter().for_each(|rule| rule.collect_failures(value, failures)),
            Rule::OneOf(rules) => {
                if !self.is_valid(value) {
                    failures.push(self);
                    rules.iter().for_each(|rule| rule.collect_failures(value, failures));
                }
            }
            leaf => {
                if !leaf.is_valid(value) {
                    failures.push(leaf);
                }
            }
        }
    }

    /// The default failure template of this rule, with `{{name}}` standing for the value.
    pub fn template(&self) -> String {
        match self {
            Rule::StringType => "{{name}} must be a string".to_string(),
            Rule::IntVal => "{{name}} must be an integer number".to_string(),
            Rule::Numeric => "{{name}} must be numeric".to_string(),
            Rule::Min(min) => format!("{{{{name}}}} must be greater than or equal to {min}"),
            Rule::Max(max) => format!("{{{{name}}}} must be less than or equal to {max}"),
            Rule::Positive => "{{name}} must be positive".to_string(),
            Rule::Negative => "{{name}} must be negative".to_string(),
            Rule::Phone => "{{name}} must be a valid telephone number".to_string(),
            Rule::Date(format) => format!("{{{{name}}}} must be a valid date. Sample format: \"{}\"", date_sample(format)),
            Rule::Matches(regex) => format!("{{{{name}}}} must validate against \"{}\"", regex.as_str()),
            Rule::AllOf(_) => "All of the required rules must pass for {{name}}".to_string(),
            Rule::OneOf(_) => "At least one of these rules must pass for {{name}}".to_string(),
        }
    }
}

/// The failed nodes of one [`Rule::assert`] call, depth-first.
#[derive(Debug)]
pub struct Failures<'a> {
    failures: Vec<&'a Rule>,
}

impl<'a> Failures<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Rule> + '_ {
        self.failures.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(Rule::name)
    }

    /// Picks the message template for this failure.
    ///
    /// The first custom entry whose key names a failed rule (ignoring case) wins; otherwise
    /// the template of the first failed rule is used.
    pub fn template(&self, custom_errors: &[(String, String)]) -> String {
        custom_errors
            .iter()
            .find(|(key, _)| self.names().any(|name| name.eq_ignore_ascii_case(key)))
            .map(|(_, template)| template.clone())
            .or_else(|| self.failures.first().map(|rule| rule.template()))
            .unwrap_or_default()
    }

    /// Renders the chosen template against `value`.
    pub fn message(&self, value: &Value, custom_errors: &[(String, String)]) -> String {
        self.template(custom_errors).replace(NAME_PLACEHOLDER, &render_value(value))
    }
}

impl fmt::Display for Failures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().collect::<Vec<_>>().join(", "))
    }
}

/// Renders a value the way it is quoted in failure messages: strings in double quotes,
/// everything else as its json text.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        Value::String(s) => INTEGER.is_match(s.trim()),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMERIC.is_match(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Strings as-is, numbers in their decimal form.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses and re-formats, so only the exact format passes: `2014-8-8` is not `%Y-%m-%d`.
fn is_date(s: &str, format: &str) -> bool {
    let Ok(date) = NaiveDate::parse_from_str(s, format) else {
        return false;
    };

    let mut formatted = String::new();
    write!(formatted, "{}", date.format(format)).is_ok() && formatted == s
}

fn date_sample(format: &str) -> String {
    let (year, month, day) = DATE_SAMPLE;
    let mut sample = String::new();

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) if write!(sample, "{}", date.format(format)).is_ok() => sample,
        _ => format.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_type() {
        assert!(Rule::StringType.is_valid(&json!("abc")));
        assert!(!Rule::StringType.is_valid(&json!(1)));
    }

    #[test]
    fn int_val() {
        for valid in [json!(1), json!(-7), json!(40.0), json!("42"), json!(" 42 "), json!("-3"), json!("0")] {
            assert!(Rule::IntVal.is_valid(&valid), "{valid}");
        }
        for invalid in [json!(1.44), json!("1.5"), json!("05"), json!("abc"), json!(true), json!(null), json!([1])] {
            assert!(!Rule::IntVal.is_valid(&invalid), "{invalid}");
        }
    }

    #[test]
    fn numeric() {
        for valid in [json!(1), json!(1.5), json!("1.5"), json!("-2"), json!("1e3"), json!(".5")] {
            assert!(Rule::Numeric.is_valid(&valid), "{valid}");
        }
        for invalid in [json!(true), json!(false), json!("abc"), json!("inf"), json!("NaN"), json!(null), json!("")] {
            assert!(!Rule::Numeric.is_valid(&invalid), "{invalid}");
        }
    }

    #[test]
    fn bounds() {
        let rule = Rule::AllOf(vec![Rule::Numeric, Rule::Min(-90.0), Rule::Max(90.0)]);

        assert!(rule.is_valid(&json!(90)));
        assert!(rule.is_valid(&json!("-90")));
        assert!(!rule.is_valid(&json!(91)));
        assert!(!rule.is_valid(&json!(-90.5)));
    }

    #[test]
    fn phone() {
        assert!(Rule::Phone.is_valid(&json!(15_555_555_555_u64)));
        assert!(Rule::Phone.is_valid(&json!("1-603-549-2944")));
        assert!(Rule::Phone.is_valid(&json!("(603) 549-2944")));
        assert!(!Rule::Phone.is_valid(&json!(0)));
        assert!(!Rule::Phone.is_valid(&json!("abcdefghijk")));
    }

    #[test]
    fn date() {
        let rule = Rule::date("%Y-%m-%d");

        assert!(rule.is_valid(&json!("2014-08-08")));
        assert!(!rule.is_valid(&json!("08-08-2014")));
        assert!(!rule.is_valid(&json!("2014-02-30")));
        assert!(!rule.is_valid(&json!("2014-8-8")));
        assert!(!rule.is_valid(&json!(20140808)));
        assert_eq!(rule.template(), "{{name}} must be a valid date. Sample format: \"2005-12-30\"");
    }

    #[test]
    fn matches() {
        let rule = Rule::Matches(Regex::new("^[a-z]{3}$").unwrap());

        assert!(rule.is_valid(&json!("abc")));
        assert!(!rule.is_valid(&json!("abcd")));
        assert_eq!(rule.template(), "{{name}} must validate against \"^[a-z]{3}$\"");
    }

    #[test]
    fn failures_are_depth_first() {
        let rule = Rule::AllOf(vec![Rule::IntVal, Rule::OneOf(vec![Rule::Positive, Rule::Negative])]);

        let failures = rule.assert(&json!(0)).unwrap_err();
        assert_eq!(failures.names().collect::<Vec<_>>(), vec!["oneOf", "positive", "negative"]);

        let failures = rule.assert(&json!("abc")).unwrap_err();
        assert_eq!(failures.names().collect::<Vec<_>>(), vec!["intVal", "oneOf", "positive", "negative"]);
        assert_eq!(failures.to_string(), "intVal, oneOf, positive, negative");

        assert!(rule.assert(&json!(-4)).is_ok());
    }

    #[test]
    fn message_selection() {
        let rule = Rule::AllOf(vec![Rule::IntVal, Rule::OneOf(vec![Rule::Positive, Rule::Negative])]);
        let custom = vec![("Positive".to_string(), "{{name}} must be a non-zero integer".to_string())];

        let failures = rule.assert(&json!(0)).unwrap_err();
        assert_eq!(failures.message(&json!(0), &custom), "0 must be a non-zero integer");
        assert_eq!(failures.message(&json!(0), &[]), "At least one of these rules must pass for 0");

        let rule = Rule::AllOf(vec![Rule::IntVal, Rule::Positive]);
        let failures = rule.assert(&json!(40.55)).unwrap_err();
        let custom = vec![("negative".to_string(), "unused".to_string())];
        assert_eq!(failures.message(&json!(40.55), &custom), "40.55 must be an integer number");
    }

    #[test]
    fn bound_templates() {
        assert_eq!(Rule::Min(0.0).template(), "{{name}} must be greater than or equal to 0");
        assert_eq!(Rule::Max(-1.5).template(), "{{name}} must be less than or equal to -1.5");
    }

    #[test]
    fn rendered_values() {
        assert_eq!(render_value(&json!("abc")), "\"abc\"");
        assert_eq!(render_value(&json!(1.5)), "1.5");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(null)), "null");
        assert_eq!(render_value(&json!([1, "a"])), "[1,\"a\"]");
    }
}
