//! Logical path resolution against a built tree.
//!
//! Navigation is all-or-nothing: every segment but the last must name a
//! directory, and the last must name either a file (preferred) or a
//! directory. Anything else is [`NavigateError::PathNotFound`], which callers
//! render as a "not found" state rather than treating as a failure.

use crate::path::strip_query;
use crate::types::{DirectoryEntry, Resolution};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigateError {
    #[error("Path not found: {0}")]
    PathNotFound(String),
}

/// Resolve `path` to a directory and, if the last segment named a file, that file.
///
/// `"."` and `""` resolve to the root with no file. Leading, trailing and
/// doubled slashes are ignored.
pub fn navigate<'a>(root: &'a DirectoryEntry, path: &str) -> Result<Resolution<'a>, NavigateError> {
    let parts: Vec<&str> = strip_query(path)
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    let mut directory = root;
    for (i, part) in parts.iter().enumerate() {
        if i == parts.len() - 1
            && let Some(file) = directory.file(part)
        {
            return Ok(Resolution {
                directory,
                file: Some(file),
            });
        }
        directory = directory
            .directory(part)
            .ok_or_else(|| NavigateError::PathNotFound(path.to_string()))?;
    }

    Ok(Resolution {
        directory,
        file: None,
    })
}
