//! Tech stack tag handling.
//!
//! Forms submit the stack as one comma-separated string; API clients may send
//! a list. Both normalize to an ordered list of trimmed, non-empty tags.
//! Duplicates are kept as entered.

use serde::Deserialize;

/// Tech stack as accepted on input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TechStackInput {
    Text(String),
    Tags(Vec<String>),
}

impl Default for TechStackInput {
    fn default() -> Self {
        TechStackInput::Tags(Vec::new())
    }
}

impl TechStackInput {
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TechStackInput::Text(text) => parse_tech_stack(text),
            TechStackInput::Tags(tags) => normalize_tags(tags.iter().map(String::as_str)),
        }
    }
}

/// Split a comma-separated string into tags.
pub fn parse_tech_stack(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

/// Join tags back into the form representation.
pub fn join_tech_stack(tags: &[String]) -> String {
    tags.join(", ")
}

fn normalize_tags<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    tags.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
