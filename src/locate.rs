//! Convention-driven address lookup.
//!
//! Authors never write routes. A request for a folder is answered by trying a
//! documented, ordered list of file names inside (or next to) that folder:
//!
//! ```text
//! document  guide/index.mdx
//!           guide/index.md
//!           guide/README.mdx  guide/Readme.mdx  guide/readme.mdx
//!           guide/README.md   guide/Readme.md   guide/readme.md
//!           guide.mdx                            (file alongside the folder)
//!           guide.md
//!
//! slides    guide/SLIDES.mdx
//!           guide/SLIDES.md
//!           guide/index.slides.mdx
//!           guide/index.slides.md
//!
//! script    guide/index.{tsx,ts,jsx,js}
//!           guide.{tsx,ts,jsx,js}
//! ```
//!
//! Each list is built from an ordered slice of convention functions per
//! [`Kind`]; adding a convention means appending to that slice.
//!
//! ## Matching
//!
//! For every candidate, addresses are scanned in insertion order for an exact
//! match: the normalized form equals the candidate, or the key is one of the
//! literal encodings (`c`, `@alias/c`, `/@alias/c`, `/c`). Only when no
//! address matches exactly does a key ending in `/c` count, so
//! `archive/docs/index.md` never answers for `docs/index.md`.
//!
//! Candidate order always outranks encoding order: a plain `README.md` never
//! beats an alias-encoded `index.md` in the same folder. Root lookups skip
//! the suffix rule so `x/README.md` can't answer `"."`.
//!
//! Lookups never fail; absence is `None` and the caller decides whether that
//! is a "not found" page or a fallback to a directory listing.

use crate::path::{self, CONTENT_EXTENSIONS, DEFAULT_ALIAS, Normalizer};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// What kind of content a request is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Document,
    Slides,
    Script,
}

const MARKUP_EXTENSIONS: &[&str] = &["mdx", "md"];
const SCRIPT_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];
const README_STEMS: &[&str] = &["README", "Readme", "readme"];

/// Produces candidates for one naming convention, in extension priority order.
type Convention = fn(folder: &str, extensions: &[&str]) -> Vec<String>;

const DOCUMENT_CONVENTIONS: &[Convention] = &[index_file, readme_file, sibling_file];
const SLIDES_CONVENTIONS: &[Convention] = &[slides_file, index_slides_file];
const SCRIPT_CONVENTIONS: &[Convention] = &[index_file, sibling_file];

impl Kind {
    /// Extensions a direct request for this kind may carry, primary first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Kind::Document | Kind::Slides => MARKUP_EXTENSIONS,
            Kind::Script => SCRIPT_EXTENSIONS,
        }
    }

    fn conventions(self) -> &'static [Convention] {
        match self {
            Kind::Document => DOCUMENT_CONVENTIONS,
            Kind::Slides => SLIDES_CONVENTIONS,
            Kind::Script => SCRIPT_CONVENTIONS,
        }
    }

    /// Classify a content-relative path by its file name.
    ///
    /// `SLIDES.*` (any case) and `*.slides.*` markup files are slides, other
    /// markup files are documents, script sources are scripts.
    pub fn of_path(path: &str) -> Option<Kind> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = path::extension(name)?;
        if MARKUP_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            let stem = &name[..name.len() - ext.len() - 1];
            if stem.eq_ignore_ascii_case("slides") || stem.ends_with(".slides") {
                Some(Kind::Slides)
            } else {
                Some(Kind::Document)
            }
        } else if SCRIPT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            Some(Kind::Script)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Document => write!(f, "document"),
            Kind::Slides => write!(f, "slides"),
            Kind::Script => write!(f, "script"),
        }
    }
}

fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

fn index_file(folder: &str, extensions: &[&str]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| join(folder, &format!("index.{ext}")))
        .collect()
}

fn readme_file(folder: &str, extensions: &[&str]) -> Vec<String> {
    extensions
        .iter()
        .flat_map(|ext| {
            README_STEMS
                .iter()
                .map(move |stem| join(folder, &format!("{stem}.{ext}")))
        })
        .collect()
}

/// `guide.mdx` placed next to a `guide/` folder. The root has no sibling.
fn sibling_file(folder: &str, extensions: &[&str]) -> Vec<String> {
    if folder.is_empty() {
        return Vec::new();
    }
    extensions
        .iter()
        .map(|ext| format!("{folder}.{ext}"))
        .collect()
}

fn slides_file(folder: &str, extensions: &[&str]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| join(folder, &format!("SLIDES.{ext}")))
        .collect()
}

fn index_slides_file(folder: &str, extensions: &[&str]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| join(folder, &format!("index.slides.{ext}")))
        .collect()
}

/// Ordered convention candidates for a folder request. `""` is the root.
pub fn candidates(kind: Kind, folder: &str) -> Vec<String> {
    kind.conventions()
        .iter()
        .flat_map(|convention| convention(folder, kind.extensions()))
        .collect()
}

/// Insertion-ordered map from raw address to loader.
///
/// Order matters: when several addresses could answer a candidate, the one
/// registered first wins, which keeps lookups deterministic.
#[derive(Debug, Clone)]
pub struct AddressMap<L> {
    alias: String,
    extensions: Vec<String>,
    entries: Vec<(String, L)>,
    /// Inferred on first lookup; reset by every insert.
    normalizer: OnceLock<Normalizer>,
}

impl<L> Default for AddressMap<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> AddressMap<L> {
    pub fn new() -> Self {
        Self::with_alias(DEFAULT_ALIAS)
    }

    pub fn with_alias(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            extensions: CONTENT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            entries: Vec::new(),
            normalizer: OnceLock::new(),
        }
    }

    /// Recognized content extensions, used for root inference and for
    /// telling file requests from folder requests.
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self.normalizer = OnceLock::new();
        self
    }

    /// Register `loader` under `address`, replacing (in place) any loader
    /// already registered under the same address.
    pub fn insert(&mut self, address: impl Into<String>, loader: L) -> Option<L> {
        let address = address.into();
        self.normalizer = OnceLock::new();
        match self.entries.iter_mut().find(|(a, _)| *a == address) {
            Some((_, existing)) => Some(std::mem::replace(existing, loader)),
            None => {
                self.entries.push((address, loader));
                None
            }
        }
    }

    /// Loader registered under exactly this raw address.
    pub fn get(&self, address: &str) -> Option<&L> {
        self.entries
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, l)| l)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &L)> {
        self.entries.iter().map(|(a, l)| (a.as_str(), l))
    }

    pub fn extensions(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }

    /// Normalizer inferred from the current address set, computed once.
    pub fn normalizer(&self) -> &Normalizer {
        self.normalizer.get_or_init(|| {
            let keys: Vec<&str> = self.addresses().collect();
            Normalizer::infer(&self.alias, &keys, &self.extensions())
        })
    }
}

impl<K: Into<String>, L> FromIterator<(K, L)> for AddressMap<L> {
    fn from_iter<I: IntoIterator<Item = (K, L)>>(iter: I) -> Self {
        let mut map = AddressMap::new();
        for (address, loader) in iter {
            map.insert(address, loader);
        }
        map
    }
}

/// Find the loader for `requested` under the conventions for `kind`.
///
/// - A request whose last segment carries one of `kind`'s extensions is
///   matched directly.
/// - A request carrying some other content extension matches nothing.
/// - Anything else is a folder address and goes through [`candidates`].
pub fn locate<'a, L>(map: &'a AddressMap<L>, requested: &str, kind: Kind) -> Option<&'a L> {
    let normalizer = map.normalizer();
    let requested = path::clean_request(requested);

    if path::has_extension(&requested, kind.extensions()) {
        return find(map, normalizer, &requested, true);
    }
    if path::has_extension(&requested, &map.extensions()) {
        tracing::debug!(%requested, %kind, "extension does not belong to kind");
        return None;
    }

    let is_root = requested.is_empty();
    let found = candidates(kind, &requested)
        .iter()
        .find_map(|candidate| find(map, normalizer, candidate, !is_root));
    if found.is_none() {
        tracing::debug!(%requested, %kind, "no convention candidate matched");
    }
    found
}

/// Exact matches first, in insertion order; the suffix rule is a fallback.
fn find<'a, L>(
    map: &'a AddressMap<L>,
    normalizer: &Normalizer,
    candidate: &str,
    allow_suffix: bool,
) -> Option<&'a L> {
    let exact = map
        .iter()
        .find(|(address, _)| matches_exactly(address, normalizer, candidate));
    let found = match exact {
        Some(found) => Some(found),
        None if allow_suffix => map
            .iter()
            .find(|(address, _)| matches_suffix(address, candidate)),
        None => None,
    };
    found.map(|(_, loader)| loader)
}

fn matches_exactly(address: &str, normalizer: &Normalizer, candidate: &str) -> bool {
    if normalizer.normalize(address).as_deref() == Some(candidate) {
        return true;
    }
    let key = path::strip_query(address);
    key == candidate
        || key.strip_prefix('/') == Some(candidate)
        || key
            .strip_prefix('/')
            .unwrap_or(key)
            .strip_prefix(normalizer.alias())
            .and_then(|k| k.strip_prefix('/'))
            == Some(candidate)
}

fn matches_suffix(address: &str, candidate: &str) -> bool {
    path::strip_query(address)
        .strip_suffix(candidate)
        .is_some_and(|head| head.ends_with('/'))
}
