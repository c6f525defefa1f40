//! Shared test utilities for the folio test suite.
//!
//! Provides fixture setup, ad-hoc content trees, and tree lookups that panic
//! with the available names on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_tree(tmp.path(), &[
//!     ("index.mdx", "---\ntitle: Home\n---\n"),
//!     ("guide/README.md", "# Guide"),
//! ]);
//!
//! let root = tree::build(&["index.mdx", "guide/README.md"], None);
//! assert_eq!(child_names(&root), vec!["index.mdx", "guide"]);
//! let readme = find_file(&root, "guide/README.md");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::{DirectoryEntry, FileEntry};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `(relative path, contents)` pairs under `dir`, creating parents.
pub fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Tree lookups, panicking with the available names on a miss
// =========================================================================

/// Names of a directory's children in insertion order.
pub fn child_names(dir: &DirectoryEntry) -> Vec<&str> {
    dir.children.iter().map(|c| c.name()).collect()
}

/// Find a directory by content-relative path. Panics if not found.
pub fn find_dir<'a>(root: &'a DirectoryEntry, path: &str) -> &'a DirectoryEntry {
    let mut current = root;
    for part in path.split('/').filter(|p| !p.is_empty()) {
        current = current.directory(part).unwrap_or_else(|| {
            let names = child_names(current);
            panic!(
                "directory '{part}' not found in '{}'. Available: {names:?}",
                current.path
            )
        });
    }
    current
}

/// Find a file by content-relative path. Panics if not found.
pub fn find_file<'a>(root: &'a DirectoryEntry, path: &str) -> &'a FileEntry {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (find_dir(root, dir), name),
        None => (root, path),
    };
    dir.file(name).unwrap_or_else(|| {
        let names = child_names(dir);
        panic!(
            "file '{name}' not found in '{}'. Available: {names:?}",
            dir.path
        )
    })
}
