//! Translation of route patterns into `matchit` paths.
//!
//! Routes are declared with named placeholders, optionally constrained by a regex:
//! `/users/{id:\d+}/posts/{slug}`. `matchit` only knows unconstrained `{name}` segments and
//! `{*name}` catch-alls, so a pattern is split into the path `matchit` routes on and the
//! constraints checked once it matched.
//!
//! Placeholder names are replaced by their position (`{p0}`, `{p1}`, ...). Routes that only
//! differ in their placeholder names or constraints thus land on the same `matchit` path and
//! are told apart by their constraints.

use regex::Regex;

use crate::error::MetalError;

/// A constraint matching anything up to the end of the path.
const CATCH_ALL_PATTERNS: [&str; 2] = [".+", ".*"];

#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    /// The path inserted into the `matchit` router.
    pub(crate) path: String,
    /// Placeholder names in the order they appear.
    pub(crate) names: Vec<String>,
    /// The anchored constraint of each placeholder.
    pub(crate) constraints: Vec<Option<Regex>>,
}

pub(crate) fn compile(pattern: &str) -> Result<CompiledPattern, MetalError> {
    let invalid = |reason: &str| MetalError::router_config(format!("invalid route pattern `{pattern}`: {reason}"));

    let source = if pattern.starts_with('/') { pattern.to_string() } else { format!("/{pattern}") };

    let mut compiled = CompiledPattern { path: String::with_capacity(source.len()), names: vec![], constraints: vec![] };
    let mut rest = source.as_str();

    while let Some(c) = rest.chars().next() {
        match c {
            '{' => {
                let end = placeholder_end(rest).ok_or_else(|| invalid("unclosed placeholder"))?;
                let placeholder = &rest[1..end];
                let after = &rest[end + 1..];

                if !compiled.path.ends_with('/') || !(after.is_empty() || after.starts_with('/')) {
                    return Err(invalid("a placeholder must span a whole path segment"));
                }

                let (name, constraint) = match placeholder.split_once(':') {
                    Some((name, constraint)) => (name.trim(), Some(constraint.trim())),
                    None => (placeholder.trim(), None),
                };

                if !is_valid_name(name) {
                    return Err(invalid(&format!("invalid placeholder name `{name}`")));
                }
                if compiled.names.iter().any(|known| known == name) {
                    return Err(invalid(&format!("placeholder `{name}` is declared twice")));
                }

                let position = compiled.names.len();
                match constraint {
                    Some(constraint) if after.is_empty() && CATCH_ALL_PATTERNS.contains(&constraint) => {
                        compiled.path.push_str(&format!("{{*p{position}}}"));
                        compiled.constraints.push(None);
                    }
                    Some(constraint) => {
                        let regex = Regex::new(&format!("^(?:{constraint})$"))
                            .map_err(|e| invalid(&format!("invalid constraint of `{name}`: {e}")))?;
                        compiled.path.push_str(&format!("{{p{position}}}"));
                        compiled.constraints.push(Some(regex));
                    }
                    None => {
                        compiled.path.push_str(&format!("{{p{position}}}"));
                        compiled.constraints.push(None);
                    }
                }
                compiled.names.push(name.to_string());

                rest = after;
            }
            '}' => return Err(invalid("unexpected `}`")),
            '[' | ']' => return Err(invalid("optional segments are not supported")),
            c => {
                compiled.path.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    Ok(compiled)
}

/// The byte offset of the `}` closing the placeholder `s` starts with; braces inside the
/// constraint, as in `\d{4}`, nest.
fn placeholder_end(s: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
