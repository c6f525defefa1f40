//! Tree construction from a flat address snapshot.
//!
//! The builder turns an unordered list of raw addresses into the
//! [`DirectoryEntry`] hierarchy that navigation and listings work against:
//!
//! ```text
//! ["a/index.mdx", "a/b/README.md", "c.mdx"]
//!
//! .
//! ├── a/
//! │   ├── index.mdx
//! │   └── b/
//! │       └── README.md
//! └── c.mdx
//! ```
//!
//! Rules, applied per address in input order:
//!
//! - Addresses are normalized once through a snapshot-wide [`Normalizer`];
//!   unmappable addresses are skipped.
//! - Any dot-prefixed segment (hidden file or folder) or ignored segment
//!   excludes the address entirely.
//! - Intermediate directories are reused by name, otherwise appended.
//! - A name already present in a directory is never inserted twice; the
//!   first address wins.
//! - Metadata is attached by trying the raw key, the alias-prefixed relative
//!   path, then the raw key without a leading slash.

use crate::path::{CONTENT_EXTENSIONS, DEFAULT_ALIAS, Normalizer};
use crate::types::{DirectoryEntry, Entry, FileEntry, Metadata};
use std::collections::HashMap;

/// Build a tree with default alias and inferred root.
pub fn build<S: AsRef<str>>(
    paths: &[S],
    metadata: Option<&HashMap<String, Metadata>>,
) -> DirectoryEntry {
    let normalizer = Normalizer::infer(DEFAULT_ALIAS, paths, CONTENT_EXTENSIONS);
    let mut builder = TreeBuilder::new(normalizer);
    if let Some(metadata) = metadata {
        builder = builder.metadata(metadata);
    }
    builder.build(paths)
}

/// Configurable tree builder.
///
/// ```text
/// TreeBuilder::new(normalizer)
///     .metadata(&frontmatter)
///     .sizes(&sizes)
///     .ignore(&["node_modules".into()])
///     .build(&addresses)
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder<'a> {
    normalizer: Normalizer,
    metadata: Option<&'a HashMap<String, Metadata>>,
    sizes: Option<&'a HashMap<String, u64>>,
    ignore: &'a [String],
}

impl<'a> TreeBuilder<'a> {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            metadata: None,
            sizes: None,
            ignore: &[],
        }
    }

    /// Metadata keyed by raw address (any encoding).
    pub fn metadata(mut self, metadata: &'a HashMap<String, Metadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Byte sizes keyed by content-relative path.
    pub fn sizes(mut self, sizes: &'a HashMap<String, u64>) -> Self {
        self.sizes = Some(sizes);
        self
    }

    /// Segment names excluded from the tree in addition to hidden ones.
    pub fn ignore(mut self, ignore: &'a [String]) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn build<S: AsRef<str>>(&self, paths: &[S]) -> DirectoryEntry {
        let mut root = DirectoryEntry::root();
        for key in paths {
            self.insert(&mut root, key.as_ref());
        }
        root
    }

    fn insert(&self, root: &mut DirectoryEntry, key: &str) {
        let Some(relative) = self.normalizer.normalize(key) else {
            tracing::debug!(key, "skipping unmappable address");
            return;
        };
        let parts: Vec<&str> = relative.split('/').collect();
        if parts.iter().any(|p| self.is_excluded(p)) {
            return;
        }
        let Some((file_name, dirs)) = parts.split_last() else {
            return;
        };

        let mut current = root;
        for (depth, dir_name) in dirs.iter().enumerate() {
            let pos = match current.children.iter().position(|c| c.name() == *dir_name) {
                Some(pos) => pos,
                None => {
                    current.children.push(Entry::Directory(DirectoryEntry {
                        name: dir_name.to_string(),
                        path: parts[..=depth].join("/"),
                        children: Vec::new(),
                    }));
                    current.children.len() - 1
                }
            };
            current = match &mut current.children[pos] {
                Entry::Directory(dir) => dir,
                Entry::File(_) => {
                    tracing::debug!(key, dir_name, "file occupies directory name, skipping");
                    return;
                }
            };
        }

        if current.children.iter().any(|c| c.name() == *file_name) {
            return;
        }

        current.children.push(Entry::File(FileEntry {
            name: file_name.to_string(),
            size: self
                .sizes
                .and_then(|s| s.get(&relative))
                .copied()
                .unwrap_or(0),
            metadata: self.lookup_metadata(key, &relative),
            path: relative,
        }));
    }

    fn is_excluded(&self, segment: &str) -> bool {
        segment.starts_with('.') || self.ignore.iter().any(|i| i == segment)
    }

    fn lookup_metadata(&self, key: &str, relative: &str) -> Option<Metadata> {
        let metadata = self.metadata?;
        metadata
            .get(key)
            .or_else(|| metadata.get(&format!("{}/{relative}", self.normalizer.alias())))
            .or_else(|| key.strip_prefix('/').and_then(|k| metadata.get(k)))
            .cloned()
    }
}
