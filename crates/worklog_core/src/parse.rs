//! Description/tag parser for raw task input.
//!
//! # Responsibility
//! - Split free text into a description and a canonical tag list.
//!
//! # Invariants
//! - Only a trailing run of `@`-prefixed tokens counts as tags.
//! - Returned tags are lexicographically sorted.

/// Splits raw user input into `(description, tags)`.
///
/// Tokens are scanned from the end of the input backwards: every
/// `@`-prefixed token is collected as a tag until the first non-tag token,
/// which together with everything before it becomes the description.
/// `@`-tokens inside the description are left untouched.
pub fn parse_raw(raw: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = raw.split(' ').collect();

    let mut tags = Vec::new();
    let mut description = String::new();

    for (idx, part) in parts.iter().enumerate().rev() {
        if part.is_empty() {
            continue;
        }

        if part.starts_with('@') {
            tags.push((*part).to_string());
            continue;
        }

        description = parts[..=idx].join(" ");
        break;
    }

    tags.sort();
    (description, tags)
}
