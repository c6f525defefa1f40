//! Post listings for a directory.
//!
//! A directory page lists its children as posts:
//!
//! ```text
//! blog/
//! ├── 01-welcome/
//! │   └── README.md          → folder post (readme)
//! ├── talk/
//! │   └── SLIDES.mdx         → folder post (slides)
//! ├── assets/                → no readme, no slides: not a post
//! ├── release-notes.mdx      → file post
//! ├── intro.slides.mdx       → file post (standalone deck)
//! └── index.mdx              → convention file, not a post
//! ```
//!
//! Listings drop drafts and hidden posts, then sort with a single comparator
//! (see [`compare`]) so every listing in the site orders the same way.

use crate::naming::{self, parse_entry_name};
use crate::types::{DirectoryEntry, FileEntry, Metadata};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const README_NAMES: &[&str] = &[
    "README.md",
    "Readme.md",
    "readme.md",
    "README.mdx",
    "Readme.mdx",
    "readme.mdx",
];

const SLIDES_NAMES: &[&str] = &[
    "SLIDES.md",
    "Slides.md",
    "slides.md",
    "SLIDES.mdx",
    "Slides.mdx",
    "slides.mdx",
];

/// How listings order posts after numbered ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortPolicy {
    /// Newest `date` first, then title.
    Date,
    /// Title only.
    #[default]
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Folder,
    File,
}

/// One listable item of a directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostEntry {
    pub kind: PostKind,
    /// Folder name, or file name without its markup (and `.slides`) extension.
    pub name: String,
    pub path: String,
    pub readme: Option<FileEntry>,
    pub slides: Option<FileEntry>,
    pub file: Option<FileEntry>,
}

impl PostEntry {
    /// Metadata of the readme, else the file, else the slides.
    pub fn frontmatter(&self) -> Option<&Metadata> {
        [&self.readme, &self.file, &self.slides]
            .into_iter()
            .find_map(|f| f.as_ref().and_then(|f| f.metadata.as_ref()))
    }

    /// Frontmatter title, else the name with its ordering prefix stripped.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.frontmatter().and_then(|m| m.title.as_deref()) {
            return title.to_string();
        }
        let parsed = parse_entry_name(&self.name);
        if parsed.display_title.is_empty() {
            self.name.clone()
        } else {
            parsed.display_title
        }
    }

    /// Where the post links to.
    ///
    /// A standalone file links to itself; a folder with only slides links to
    /// the deck; a folder with a readme links to the readme.
    pub fn link_path(&self) -> String {
        let target = match (&self.file, &self.slides, &self.readme) {
            (Some(file), _, _) => &file.path,
            (None, Some(slides), None) => &slides.path,
            (None, _, Some(readme)) => &readme.path,
            (None, None, None) => &self.path,
        };
        format!("/{target}")
    }

    /// True when the post opens as a slide deck.
    pub fn is_slides(&self) -> bool {
        self.file.is_none() && self.readme.is_none() && self.slides.is_some()
    }

    fn date(&self) -> Option<&str> {
        self.frontmatter()
            .and_then(|m| m.date.as_deref())
            .and_then(naming::leading_date)
    }
}

fn find_named<'a>(dir: &'a DirectoryEntry, names: &[&str]) -> Option<&'a FileEntry> {
    dir.files().find(|f| names.contains(&f.name.as_str()))
}

/// README variant inside a folder.
pub fn find_readme(dir: &DirectoryEntry) -> Option<&FileEntry> {
    find_named(dir, README_NAMES)
}

/// SLIDES variant inside a folder.
pub fn find_slides(dir: &DirectoryEntry) -> Option<&FileEntry> {
    find_named(dir, SLIDES_NAMES)
}

fn is_markup(name: &str) -> bool {
    crate::path::has_extension(name, &["md", "mdx"])
}

fn is_standalone_slides(name: &str) -> bool {
    is_markup(name) && {
        let without_ext = &name[..name.rfind('.').unwrap_or(name.len())];
        without_ext.ends_with(".slides")
    }
}

/// Posts of one directory: folder posts, then file posts, then standalone
/// decks, each in tree order.
pub fn posts(dir: &DirectoryEntry) -> Vec<PostEntry> {
    let folders = dir.directories().filter_map(|folder| {
        let readme = find_readme(folder).cloned();
        let slides = find_slides(folder).cloned();
        if readme.is_none() && slides.is_none() {
            return None;
        }
        Some(PostEntry {
            kind: PostKind::Folder,
            name: folder.name.clone(),
            path: folder.path.clone(),
            readme,
            slides,
            file: None,
        })
    });

    let files = dir
        .files()
        .filter(|f| {
            is_markup(&f.name)
                && !is_standalone_slides(&f.name)
                && !naming::is_convention_stem(naming::stem(&f.name))
        })
        .map(|f| PostEntry {
            kind: PostKind::File,
            name: naming::stem(&f.name).to_string(),
            path: f.path.clone(),
            readme: None,
            slides: None,
            file: Some(f.clone()),
        });

    let decks = dir
        .files()
        .filter(|f| is_standalone_slides(&f.name))
        .map(|f| PostEntry {
            kind: PostKind::File,
            name: naming::stem(&f.name).to_string(),
            path: f.path.clone(),
            readme: None,
            slides: Some(f.clone()),
            file: None,
        });

    folders.chain(files).chain(decks).collect()
}

/// Drop posts marked `draft: true` or `visibility: hidden`.
pub fn visible(posts: Vec<PostEntry>) -> Vec<PostEntry> {
    posts
        .into_iter()
        .filter(|p| !p.frontmatter().is_some_and(Metadata::is_hidden))
        .collect()
}

/// The one listing order:
///
/// 1. numbered posts first, ascending by number;
/// 2. with [`SortPolicy::Date`], dated posts next, newest first;
/// 3. display title, case-insensitive;
/// 4. path, byte order.
pub fn compare(a: &PostEntry, b: &PostEntry, policy: SortPolicy) -> Ordering {
    let a_number = parse_entry_name(&a.name).number;
    let b_number = parse_entry_name(&b.name).number;
    let by_number = match (a_number, b_number) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    let by_date = || match (policy, a.date(), b.date()) {
        (SortPolicy::Date, Some(x), Some(y)) => y.cmp(x),
        (SortPolicy::Date, Some(_), None) => Ordering::Less,
        (SortPolicy::Date, None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    };

    by_number
        .then_with(by_date)
        .then_with(|| {
            a.display_title()
                .to_lowercase()
                .cmp(&b.display_title().to_lowercase())
        })
        .then_with(|| a.path.cmp(&b.path))
}

pub fn sort_posts(posts: &mut [PostEntry], policy: SortPolicy) {
    posts.sort_by(|a, b| compare(a, b, policy));
}

/// Visible posts of `dir`, sorted.
pub fn listing(dir: &DirectoryEntry, policy: SortPolicy) -> Vec<PostEntry> {
    let mut posts = visible(posts(dir));
    sort_posts(&mut posts, policy);
    posts
}
