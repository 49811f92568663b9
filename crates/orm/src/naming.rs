//! Identifier conversions used to derive table and column names

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How struct and field identifiers become table and column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStrategy {
    /// `UserRole` -> `user_role`, `HTTPServer` -> `h_t_t_p_server`
    #[default]
    Snake,
    /// `HTTPServer` -> `http_server`
    SnakeAcronym,
}

impl NameStrategy {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            NameStrategy::Snake => snake_string(ident),
            NameStrategy::SnakeAcronym => snake_string_with_acronym(ident),
        }
    }
}

impl FromStr for NameStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snake" | "snake_string" | "snakestring" => Ok(NameStrategy::Snake),
            "snake_acronym" | "snake_string_with_acronym" | "snakestringwithacronym" => {
                Ok(NameStrategy::SnakeAcronym)
            }
            _ => Err(ConfigError::InvalidValue {
                field: "name_strategy".to_string(),
                value: s.to_string(),
                expected: "snake or snake_acronym".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for NameStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameStrategy::Snake => write!(f, "snake"),
            NameStrategy::SnakeAcronym => write!(f, "snake_acronym"),
        }
    }
}

/// `XxYy` -> `xx_yy`, `XxYY` -> `xx_y_y`; leading underscores are kept
pub fn snake_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    let mut seen_word = false;
    for (i, c) in s.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() && seen_word {
            out.push('_');
        }
        if c != '_' {
            seen_word = true;
        }
        out.push(c);
    }
    out.to_lowercase()
}

/// Like [`snake_string`] but keeps runs of capitals together: `HTTPServer` -> `http_server`
pub fn snake_string_with_acronym(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() * 2);
    for (i, &c) in chars.iter().enumerate() {
        let before = i > 0 && chars[i - 1].is_ascii_lowercase();
        let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
        if i > 0 && c.is_ascii_uppercase() && (before || after) {
            out.push('_');
        }
        out.push(c);
    }
    out.to_lowercase()
}

/// `xx_yy` -> `XxYy`
pub fn camel_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
