//! English singular forms for xml element names of sequence entries.

const UNCOUNTABLE: [&str; 12] = [
    "data",
    "equipment",
    "fish",
    "information",
    "metadata",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
    "deer",
];

const IRREGULAR: [(&str, &str); 16] = [
    ("people", "person"),
    ("women", "woman"),
    ("men", "man"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("criteria", "criterion"),
    ("movies", "movie"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("halves", "half"),
    ("wolves", "wolf"),
];

/// `(plural suffix, singular suffix)`, the first match wins.
const SUFFIXES: [(&str, &str); 11] = [
    ("ies", "y"),
    ("sses", "ss"),
    ("xes", "x"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("uses", "us"),
    ("oes", "o"),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
];

/// `messages` -> `message`, `categories` -> `category`, `boxes` -> `box`.
///
/// Words that are not recognised as plural are returned unchanged.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNCOUNTABLE.iter().any(|uncountable| ends_with_word(word, &lower, uncountable)) {
        return word.to_string();
    }

    if let Some((plural, singular)) = IRREGULAR.iter().find(|(plural, _)| ends_with_word(word, &lower, plural)) {
        let stem = &word[..word.len() - plural.len()];
        let tail = &word[word.len() - plural.len()..];
        return stem.to_string() + &match_case(tail, singular);
    }

    match SUFFIXES.iter().find(|(plural, _)| lower.ends_with(plural) && lower.len() > plural.len()) {
        Some((plural, singular)) => {
            let stem = &word[..word.len() - plural.len()];
            let tail = &word[word.len() - plural.len()..];
            stem.to_string() + &match_case(tail, singular)
        }
        None => word.to_string(),
    }
}

/// Whether `word` ends with the whole word `suffix`: either all of it, or a trailing part
/// that starts a new camelCase, snake_case or kebab-case segment.
fn ends_with_word(word: &str, lower: &str, suffix: &str) -> bool {
    if !lower.ends_with(suffix) {
        return false;
    }
    let start = word.len() - suffix.len();
    if start == 0 {
        return true;
    }

    let bytes = word.as_bytes();
    bytes[start].is_ascii_uppercase() || matches!(bytes[start - 1], b'_' | b'-')
}

/// Renders `replacement` in the case of `original`: all upper, capitalized or lower.
fn match_case(original: &str, replacement: &str) -> String {
    if !original.is_empty() && original.chars().all(|c| !c.is_ascii_lowercase()) && original.chars().any(|c| c.is_ascii_uppercase()) {
        replacement.to_ascii_uppercase()
    } else if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut chars = replacement.chars();
        chars.next().map(|first| first.to_ascii_uppercase().to_string() + chars.as_str()).unwrap_or_default()
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular() {
        assert_eq!(singularize("messages"), "message");
        assert_eq!(singularize("errors"), "error");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("dishes"), "dish");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("heroes"), "hero");
        assert_eq!(singularize("nests"), "nest");
    }

    #[test]
    fn already_singular() {
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("address"), "address");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("item"), "item");
        assert_eq!(singularize("s"), "s");
        assert_eq!(singularize(""), "");
    }

    #[test]
    fn irregular_and_uncountable() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("salesPeople"), "salesPerson");
        assert_eq!(singularize("children"), "child");
        assert_eq!(singularize("wolves"), "wolf");
        assert_eq!(singularize("news"), "news");
        assert_eq!(singularize("series"), "series");
        assert_eq!(singularize("women"), "woman");
        assert_eq!(singularize("user_data"), "user_data");
    }

    #[test]
    fn irregular_only_as_whole_word() {
        assert_eq!(singularize("specimens"), "specimen");
        assert_eq!(singularize("omens"), "omen");
        assert_eq!(singularize("semen"), "semen");
        assert_eq!(singularize("salesmen"), "salesmen");
        assert_eq!(singularize("sales_men"), "sales_man");
        assert_eq!(singularize("newsletters"), "newsletter");
    }

    #[test]
    fn keeps_case() {
        assert_eq!(singularize("Messages"), "Message");
        assert_eq!(singularize("CATEGORIES"), "CATEGORY");
        assert_eq!(singularize("userIds"), "userId");
    }
}
