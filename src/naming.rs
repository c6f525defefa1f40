//! Centralized filename parsing for the `NN-name` convention.
//!
//! Folders and files may carry an optional numeric prefix (`NN-`) that
//! orders them in listings, followed by a name. This module provides a
//! single parsing function that extracts both parts consistently.
//!
//! ## Display Titles
//!
//! When a file has no `title` in its frontmatter, its title is derived from
//! the name: prefix stripped, dashes converted to spaces, words capitalized.
//!
//! - `01-getting-started/` → "Getting Started"
//! - `020-who-am-i.md` → "Who Am I"
//! - `talks/SLIDES.mdx` → "Talks" (convention files take the folder name)
//!
//! Date-shaped names (`2024-01-15-launch`) are not numbered: the year is not
//! an ordering prefix.

use crate::path;

/// Result of parsing a numbered entry name like `01-getting-started`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `1` from `01-getting-started`)
    pub number: Option<u32>,
    /// Raw name part after `NN-`, dashes preserved. Empty if number-only.
    /// For unnumbered entries, this is the full input.
    pub name: String,
    /// Display title: name with dashes converted to spaces, words capitalized.
    pub display_title: String,
}

/// Parse an entry name following the `NN-name` convention.
///
/// - `"01-getting-started"` → number=Some(1), name="getting-started", display_title="Getting Started"
/// - `"001"` → number=Some(1), name="", display_title=""
/// - `"notes"` → number=None, name="notes", display_title="Notes"
/// - `"2024-01-15-launch"` → number=None, display_title="2024 01 15 Launch"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if leading_date(name).is_none() {
        if let Some((prefix, raw)) = name.split_once('-')
            && let Ok(num) = prefix.parse::<u32>()
        {
            return ParsedName {
                number: Some(num),
                name: raw.to_string(),
                display_title: title_case(raw),
            };
        }
        if let Ok(num) = name.parse::<u32>() {
            return ParsedName {
                number: Some(num),
                name: String::new(),
                display_title: String::new(),
            };
        }
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: title_case(name),
    }
}

/// Dashes to spaces, first letter of every word uppercased.
pub fn title_case(name: &str) -> String {
    name.split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `YYYY-MM-DD` at the start of `s`, if present.
pub fn leading_date(s: &str) -> Option<&str> {
    let head = s.get(..10)?;
    let bytes = head.as_bytes();
    let digits = |r: std::ops::Range<usize>| bytes[r].iter().all(u8::is_ascii_digit);
    if digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10) {
        Some(head)
    } else {
        None
    }
}

/// File stem without the content extension, keeping `.slides` out too.
pub fn stem(file_name: &str) -> &str {
    let stem = match path::extension(file_name) {
        Some(ext) => &file_name[..file_name.len() - ext.len() - 1],
        None => file_name,
    };
    stem.strip_suffix(".slides").unwrap_or(stem)
}

/// Whether a stem names a convention file that stands for its folder.
pub fn is_convention_stem(stem: &str) -> bool {
    ["index", "readme", "slides"]
        .iter()
        .any(|c| stem.eq_ignore_ascii_case(c))
}

/// Title derived from a content-relative path when frontmatter has none.
///
/// Convention files (`index`, `README`, `SLIDES`) take their folder's name.
pub fn fallback_title(path: &str) -> String {
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty() && *s != ".");
    let Some(file_name) = segments.next() else {
        return String::new();
    };
    let stem = stem(file_name);
    let source = if is_convention_stem(stem) {
        segments.next().unwrap_or(stem)
    } else {
        stem
    };
    parse_entry_name(source).display_title
}
