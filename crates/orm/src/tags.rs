//! Field tag mini-language
//!
//! Tags are `;` separated tokens. Flag tokens (`null`, `pk`, ...) stand alone,
//! valued tokens carry their argument in parentheses: `size(100)`,
//! `rel(fk)`, `description(user name)`. Unknown tokens are ignored.

use std::collections::{HashMap, HashSet};

/// Flag tokens understood by [`OrmTagParser`]
pub const FLAG_TAGS: &[&str] = &[
    "-",
    "null",
    "index",
    "unique",
    "pk",
    "auto",
    "auto_now",
    "auto_now_add",
];

/// Valued tokens understood by [`OrmTagParser`]
pub const VALUE_TAGS: &[&str] = &[
    "size",
    "column",
    "default",
    "rel",
    "reverse",
    "rel_table",
    "rel_through",
    "digits",
    "decimals",
    "on_delete",
    "type",
    "description",
    "precision",
    "db_type",
];

const TAG_DELIMITER: char = ';';

/// Normalized view of a field tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTag {
    flags: HashSet<String>,
    values: HashMap<String, String>,
}

impl ParsedTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flags.insert(flag.to_string());
        self
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn has(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Value of a valued tag, `None` when the tag is absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of a valued tag, treating an empty argument as absent
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn is_skipped(&self) -> bool {
        self.has("-")
    }
}

/// Turns the raw tag text attached to a field into a [`ParsedTag`]
pub trait TagParser: Send + Sync {
    fn parse(&self, raw: &str) -> ParsedTag;
}

/// Default parser for the `orm` tag syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmTagParser;

impl TagParser for OrmTagParser {
    fn parse(&self, raw: &str) -> ParsedTag {
        let mut parsed = ParsedTag::new();

        for token in raw.split(TAG_DELIMITER) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let lowered = token.to_lowercase();
            if FLAG_TAGS.contains(&lowered.as_str()) {
                parsed.flags.insert(lowered);
                continue;
            }

            // name(value) with the closing paren as the last character
            let Some(open) = token.find('(') else {
                continue;
            };
            if open == 0 || !token.ends_with(')') {
                continue;
            }
            let name = token[..open].to_lowercase();
            if VALUE_TAGS.contains(&name.as_str()) {
                let value = &token[open + 1..token.len() - 1];
                parsed.values.insert(name, value.to_string());
            }
        }

        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_values() {
        let tag = OrmTagParser.parse("size(30);unique;description(user name)");
        assert!(tag.has("unique"));
        assert!(!tag.has("null"));
        assert_eq!(tag.get("size"), Some("30"));
        assert_eq!(tag.get("description"), Some("user name"));
    }

    #[test]
    fn test_parse_is_case_insensitive_for_names() {
        let tag = OrmTagParser.parse("PK; Column(UserId) ;NULL");
        assert!(tag.has("pk"));
        assert!(tag.has("null"));
        assert_eq!(tag.get("column"), Some("UserId"));
    }

    #[test]
    fn test_parse_ignores_unknown_and_malformed_tokens() {
        let tag = OrmTagParser.parse("colour(red);size(10;(x);;bogus");
        assert_eq!(tag, ParsedTag::new());
    }

    #[test]
    fn test_empty_value_is_present_but_not_non_empty() {
        let tag = OrmTagParser.parse("description()");
        assert_eq!(tag.get("description"), Some(""));
        assert_eq!(tag.non_empty("description"), None);
    }

    #[test]
    fn test_skip_tag() {
        assert!(OrmTagParser.parse("-").is_skipped());
        assert!(!OrmTagParser.parse("null").is_skipped());
    }

    #[test]
    fn test_db_type_keeps_inner_parentheses() {
        let tag = OrmTagParser.parse("db_type(numeric(10, 2))");
        assert_eq!(tag.get("db_type"), Some("numeric(10, 2)"));
    }
}
