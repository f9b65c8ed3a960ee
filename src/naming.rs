// Entity, table and key naming conventions shared by both engines

use regex::Regex;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel boundary regex is valid"));

const ID_SUFFIX: &str = "_id";

/// Canonical entity class name for a relation or type name.
///
/// `"tags"` -> `"Tag"`, `"blog_posts"` -> `"BlogPost"`, `"Author"` -> `"Author"`.
pub fn class_name(name: &str) -> String {
    let segments: Vec<&str> = name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == last {
                capitalize(&singularize(segment))
            } else {
                capitalize(segment)
            }
        })
        .collect()
}

/// Table name for an entity class: snake_case, lower-cased.
///
/// `"BlogPost"` -> `"blog_post"`, `"post"` -> `"post"`.
pub fn table_name(entity: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(entity.trim(), "${1}_${2}")
        .to_lowercase()
}

/// Foreign key column pointing at `entity`, e.g. `"Post"` -> `"post_id"`.
pub fn foreign_key(entity: &str) -> String {
    format!("{}{ID_SUFFIX}", table_name(&class_name(entity)))
}

/// Pivot entity name joining `first` and `second`, in that order.
pub fn pivot_name(first: &str, second: &str) -> String {
    format!("{}{}", class_name(first), class_name(second))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if ["sses", "xes", "ches", "shes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return word[..word.len() - 2].to_string();
    }
    if lower.len() > 1
        && lower.ends_with('s')
        && !["ss", "us", "is"].iter().any(|suffix| lower.ends_with(suffix))
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}
