//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each entity leads with what a reader cares about (its title, its name in
//! the tree) and shows content-relative paths as indented context. Sizes and
//! metadata are secondary lines, never columns.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! .
//! ├── 01-getting-started/
//! │   └── README.md (120 B) "Getting Started"
//! ├── talks/
//! │   └── SLIDES.mdx (88 B) "Talks"
//! └── index.mdx (42 B) "Home"
//!
//! 3 files in 2 folders
//! ```
//!
//! ## Resolve
//!
//! ```text
//! Directory: 01-getting-started
//! File: 01-getting-started/README.md
//!     Title: Getting Started
//! ```
//!
//! ## Posts
//!
//! ```text
//! 001 Getting Started → /01-getting-started/README.md
//!     Date: 2024-01-15
//! 002 Intro [slides] → /intro.slides.mdx
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::listing::PostEntry;
use crate::locate::Kind;
use crate::types::{DirectoryEntry, Entry, FileEntry, Metadata};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn file_line(file: &FileEntry) -> String {
    format!(
        "{} ({}) \"{}\"",
        file.name,
        format_size(file.size),
        file.display_title()
    )
}

// ============================================================================
// Tree
// ============================================================================

/// Format the content tree with box-drawing connectors.
pub fn format_tree(root: &DirectoryEntry) -> Vec<String> {
    let mut lines = vec![root.name.clone()];
    let mut folders = 0;
    walk_tree(root, "", &mut lines, &mut folders);
    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        plural(root.walk_files().len(), "file"),
        plural(folders, "folder")
    ));
    lines
}

fn walk_tree(dir: &DirectoryEntry, prefix: &str, lines: &mut Vec<String>, folders: &mut usize) {
    let count = dir.children.len();
    for (i, child) in dir.children.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        match child {
            Entry::Directory(d) => {
                *folders += 1;
                lines.push(format!("{}{}{}/", prefix, connector, d.name));
                let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
                walk_tree(d, &nested, lines, folders);
            }
            Entry::File(f) => lines.push(format!("{}{}{}", prefix, connector, file_line(f))),
        }
    }
}

pub fn print_tree(root: &DirectoryEntry) {
    for line in format_tree(root) {
        println!("{}", line);
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Format recognized metadata fields, one per line, at `depth`.
pub fn format_metadata(metadata: &Metadata, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = Vec::new();
    let mut field = |label: &str, value: Option<String>| {
        if let Some(v) = value {
            lines.push(format!("{}{}: {}", pad, label, v));
        }
    };
    field("Title", metadata.title.clone());
    field("Description", metadata.description.clone());
    field("Link", metadata.link.clone());
    field("Date", metadata.date.clone());
    field("Draft", metadata.draft.map(|d| d.to_string()));
    field("Visibility", metadata.visibility.clone());
    if lines.is_empty() {
        lines.push(format!("{}(no frontmatter)", pad));
    }
    lines
}

pub fn print_metadata(metadata: &Metadata) {
    for line in format_metadata(metadata, 0) {
        println!("{}", line);
    }
}

// ============================================================================
// Resolve
// ============================================================================

/// Format a navigation result: the directory landed in and the file, if any.
pub fn format_resolution(directory: &DirectoryEntry, file: Option<&FileEntry>) -> Vec<String> {
    let mut lines = vec![format!("Directory: {}", directory.path)];
    match file {
        Some(f) => {
            lines.push(format!("File: {}", f.path));
            let metadata = Metadata {
                title: Some(f.display_title()),
                ..f.metadata.clone().unwrap_or_default()
            };
            lines.extend(format_metadata(&metadata, 1));
        }
        None => {
            lines.push(format!(
                "{}{} in {}",
                indent(1),
                plural(directory.files().count(), "file"),
                plural(directory.directories().count(), "folder")
            ));
        }
    }
    lines
}

pub fn print_resolution(directory: &DirectoryEntry, file: Option<&FileEntry>) {
    for line in format_resolution(directory, file) {
        println!("{}", line);
    }
}

// ============================================================================
// Locate
// ============================================================================

/// Format the outcome of a convention lookup.
pub fn format_locate(requested: &str, kind: Kind, found: Option<&str>) -> Vec<String> {
    match found {
        Some(path) => vec![format!("{} ({}) → {}", requested, kind, path)],
        None => vec![format!("{} ({}) → not found", requested, kind)],
    }
}

pub fn print_locate(requested: &str, kind: Kind, found: Option<&str>) {
    for line in format_locate(requested, kind, found) {
        println!("{}", line);
    }
}

/// Format a slide deck summary: slide count plus its metadata.
pub fn format_slides(path: &str, slides: usize, metadata: &Metadata) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", path, plural(slides, "slide"))];
    lines.extend(format_metadata(metadata, 1));
    lines
}

pub fn print_slides(path: &str, slides: usize, metadata: &Metadata) {
    for line in format_slides(path, slides, metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Format a sorted post listing.
pub fn format_posts(posts: &[PostEntry]) -> Vec<String> {
    if posts.is_empty() {
        return vec!["No posts".to_string()];
    }
    let mut lines = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        let marker = if post.is_slides() { " [slides]" } else { "" };
        lines.push(format!(
            "{} {}{} → {}",
            format_index(i + 1),
            post.display_title(),
            marker,
            post.link_path()
        ));
        if let Some(metadata) = post.frontmatter() {
            if let Some(date) = &metadata.date {
                lines.push(format!("{}Date: {}", indent(1), date));
            }
            if let Some(description) = &metadata.description {
                lines.push(format!("{}Description: {}", indent(1), description));
            }
        }
    }
    lines
}

pub fn print_posts(posts: &[PostEntry]) {
    for line in format_posts(posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{self, SortPolicy};
    use crate::tree;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn titled(title: &str) -> Metadata {
        Metadata {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
    }

    // =========================================================================
    // Tree
    // =========================================================================

    #[test]
    fn tree_uses_connectors() {
        let mut metadata = HashMap::new();
        metadata.insert("index.mdx".to_string(), titled("Home"));
        let root = tree::build(
            &["index.mdx", "guide/README.md", "guide/setup.md"],
            Some(&metadata),
        );
        assert_eq!(
            format_tree(&root),
            vec![
                ".",
                "├── index.mdx (0 B) \"Home\"",
                "└── guide/",
                "    ├── README.md (0 B) \"Guide\"",
                "    └── setup.md (0 B) \"Setup\"",
                "",
                "3 files in 1 folder",
            ]
        );
    }

    #[test]
    fn empty_tree() {
        let root = DirectoryEntry::root();
        assert_eq!(format_tree(&root), vec![".", "", "0 files in 0 folders"]);
    }

    // =========================================================================
    // Metadata / resolve
    // =========================================================================

    #[test]
    fn metadata_lists_set_fields_only() {
        let metadata = Metadata {
            title: Some("Intro".into()),
            draft: Some(true),
            ..Default::default()
        };
        assert_eq!(
            format_metadata(&metadata, 1),
            vec!["    Title: Intro", "    Draft: true"]
        );
    }

    #[test]
    fn empty_metadata_says_so() {
        assert_eq!(format_metadata(&Metadata::default(), 0), vec!["(no frontmatter)"]);
    }

    #[test]
    fn resolution_with_file() {
        let mut metadata = HashMap::new();
        metadata.insert("guide/README.md".to_string(), titled("Guide"));
        let root = tree::build(&["guide/README.md"], Some(&metadata));
        let dir = root.directory("guide").unwrap();
        let file = dir.file("README.md");
        assert_eq!(
            format_resolution(dir, file),
            vec!["Directory: guide", "File: guide/README.md", "    Title: Guide"]
        );
    }

    #[test]
    fn resolution_without_frontmatter_derives_title() {
        let root = tree::build(&["talk/README.md"], None);
        let dir = root.directory("talk").unwrap();
        assert_eq!(
            format_resolution(dir, dir.file("README.md")),
            vec!["Directory: talk", "File: talk/README.md", "    Title: Talk"]
        );
    }

    #[test]
    fn resolution_of_directory_counts_children() {
        let root = tree::build(&["a.md", "b.md", "sub/c.md"], None);
        assert_eq!(
            format_resolution(&root, None),
            vec!["Directory: .", "    2 files in 1 folder"]
        );
    }

    #[test]
    fn locate_found_and_missing() {
        assert_eq!(
            format_locate("guide", Kind::Document, Some("guide/README.md")),
            vec!["guide (document) → guide/README.md"]
        );
        assert_eq!(
            format_locate("talks", Kind::Slides, None),
            vec!["talks (slides) → not found"]
        );
    }

    #[test]
    fn slides_summary() {
        assert_eq!(
            format_slides("talks/SLIDES.mdx", 3, &titled("Talk")),
            vec!["talks/SLIDES.mdx (3 slides)", "    Title: Talk"]
        );
    }

    // =========================================================================
    // Posts
    // =========================================================================

    #[test]
    fn posts_listing() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "01-guide/README.md".to_string(),
            Metadata {
                title: Some("The Guide".into()),
                date: Some("2024-01-15".into()),
                ..Default::default()
            },
        );
        let root = tree::build(&["01-guide/README.md", "intro.slides.mdx"], Some(&metadata));
        let posts = listing::listing(&root, SortPolicy::Alpha);
        assert_eq!(
            format_posts(&posts),
            vec![
                "001 The Guide → /01-guide/README.md",
                "    Date: 2024-01-15",
                "002 Intro [slides] → /intro.slides.mdx",
            ]
        );
    }

    #[test]
    fn no_posts() {
        assert_eq!(format_posts(&[]), vec!["No posts"]);
    }
}
