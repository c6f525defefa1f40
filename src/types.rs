//! Shared content model used by every resolution stage.
//!
//! A generation's tree is built once from a snapshot of addresses and never
//! mutated afterwards. Everything here is serializable so a generation can be
//! dumped as JSON for the rendering layer or for debugging.

use crate::naming;
use serde::{Deserialize, Serialize};

/// Metadata declared in a content file's frontmatter.
///
/// Only the fields below survive extraction; anything else an author writes
/// is dropped. All fields are primitives so the record can be shipped to the
/// rendering layer as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// ISO-8601 date string (`2024-01-15` or a full timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// `"hidden"` removes the entry from listings while keeping it addressable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

impl Metadata {
    /// True when no recognized field was set.
    pub fn is_empty(&self) -> bool {
        self == &Metadata::default()
    }

    /// Whether listings should hide this entry (`draft: true` or `visibility: hidden`).
    pub fn is_hidden(&self) -> bool {
        self.draft == Some(true) || self.visibility.as_deref() == Some("hidden")
    }
}

/// A leaf in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Last path segment, including extension.
    pub name: String,
    /// Content-relative path, forward slashes, no leading slash.
    pub path: String,
    /// Byte length, 0 when unknown.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A folder in the content tree.
///
/// Children keep the order in which they were first inserted. A directory
/// never holds two children with the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Content-relative path; `"."` for the root.
    pub path: String,
    #[serde(default)]
    pub children: Vec<Entry>,
}

/// Either side of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Directory(DirectoryEntry),
    File(FileEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory(d) => &d.name,
            Entry::File(f) => &f.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Entry::Directory(d) => &d.path,
            Entry::File(f) => &f.path,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::Directory(d) => Some(d),
            Entry::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Entry::File(f) => Some(f),
            Entry::Directory(_) => None,
        }
    }
}

impl FileEntry {
    /// Frontmatter title, else one derived from the path.
    pub fn display_title(&self) -> String {
        match self.metadata.as_ref().and_then(|m| m.title.as_deref()) {
            Some(title) => title.to_string(),
            None => naming::fallback_title(&self.path),
        }
    }
}

impl DirectoryEntry {
    /// The empty content root.
    pub fn root() -> Self {
        Self {
            name: ".".to_string(),
            path: ".".to_string(),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == "."
    }

    /// Child directory with exactly this name.
    pub fn directory(&self, name: &str) -> Option<&DirectoryEntry> {
        self.children
            .iter()
            .filter_map(Entry::as_directory)
            .find(|d| d.name == name)
    }

    /// Child file with exactly this name.
    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.children
            .iter()
            .filter_map(Entry::as_file)
            .find(|f| f.name == name)
    }

    pub fn directories(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.children.iter().filter_map(Entry::as_directory)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.children.iter().filter_map(Entry::as_file)
    }

    /// Every file below this directory, depth-first in child order.
    pub fn walk_files(&self) -> Vec<&FileEntry> {
        let mut out = Vec::new();
        collect_files(self, &mut out);
        out
    }
}

fn collect_files<'a>(dir: &'a DirectoryEntry, out: &mut Vec<&'a FileEntry>) {
    for child in &dir.children {
        match child {
            Entry::File(f) => out.push(f),
            Entry::Directory(d) => collect_files(d, out),
        }
    }
}

/// Outcome of navigating a logical path: the directory it lands in and, when
/// the last segment named a file, that file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub directory: &'a DirectoryEntry,
    pub file: Option<&'a FileEntry>,
}
