//! The resolution engine: one content root, one current generation.
//!
//! ```text
//!              rebuild()                        readers
//!   scan root ──────────► Generation N+1    get_tree / navigate / locate
//!   extract frontmatter        │                     │
//!   build tree                 ▼                     ▼
//!                    swap Arc under write lock   Arc<Generation N>
//! ```
//!
//! A [`Generation`] is immutable. Rebuilding constructs the next one
//! completely off to the side and only then swaps the shared pointer, so
//! readers never block on a scan and never see a half-built tree. Readers
//! holding an older `Arc` keep a consistent view until they drop it.
//!
//! Consumers that render content subscribe to [`GenerationChanged`]. The
//! notification carries nothing: the only correct reaction is to re-issue
//! the last resolution.
//!
//! Loads are tied to a [`Ticket`]. Starting a new request supersedes every
//! older ticket, and a superseded load returns `Ok(None)` instead of stale
//! content.

use crate::config::{self, ConfigError, SiteConfig};
use crate::frontmatter::{self, SourceKind};
use crate::locate::{self, AddressMap, Kind};
use crate::naming;
use crate::navigate::{self, NavigateError};
use crate::path::{self, Normalizer};
use crate::tree::TreeBuilder;
use crate::types::{DirectoryEntry, FileEntry, Metadata, Resolution};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Content root not found or not a directory: {0}")]
    ConfigurationMissing(PathBuf),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Navigate(#[from] NavigateError),
}

/// Reads one content file on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// One immutable snapshot of the content root.
#[derive(Debug)]
pub struct Generation {
    pub number: u64,
    pub tree: DirectoryEntry,
    pub addresses: AddressMap<FileLoader>,
    pub metadata: HashMap<String, Metadata>,
}

impl Generation {
    /// Build a generation from content-relative paths under `root`.
    pub fn build(
        number: u64,
        root: &Path,
        config: &SiteConfig,
        paths: &[String],
        sizes: &HashMap<String, u64>,
    ) -> Generation {
        let metadata = frontmatter::extract_all(root, paths);
        let tree = TreeBuilder::new(Normalizer::new(&config.alias))
            .metadata(&metadata)
            .sizes(sizes)
            .ignore(&config.ignore)
            .build(paths);

        let mut addresses =
            AddressMap::with_alias(&config.alias).with_extensions(&config.extensions);
        for relative in paths {
            addresses.insert(relative.clone(), FileLoader::new(root.join(relative)));
        }

        Generation {
            number,
            tree,
            addresses,
            metadata,
        }
    }

    pub fn navigate(&self, path: &str) -> Result<Resolution<'_>, NavigateError> {
        navigate::navigate(&self.tree, path)
    }

    pub fn locate(&self, path: &str, kind: Kind) -> Option<&FileLoader> {
        locate::locate(&self.addresses, path, kind)
    }

    pub fn file_count(&self) -> usize {
        self.addresses.len()
    }
}

/// Shared handle on the tree of the generation current when it was taken.
#[derive(Debug, Clone)]
pub struct TreeRef(Arc<Generation>);

impl TreeRef {
    pub fn generation(&self) -> u64 {
        self.0.number
    }
}

impl Deref for TreeRef {
    type Target = DirectoryEntry;

    fn deref(&self) -> &DirectoryEntry {
        &self.0.tree
    }
}

/// Owned navigation result, detached from any generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub directory: DirectoryEntry,
    pub file: Option<FileEntry>,
}

/// "Re-resolve everything." Sent after a rebuild; carries no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationChanged;

/// Identifies one navigation request; only the newest ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Content fetched for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub path: PathBuf,
    /// Content-relative form of `path`, forward slashes.
    pub relative: String,
    pub kind: Kind,
    pub contents: String,
    pub metadata: Metadata,
}

impl Loaded {
    /// Frontmatter title, else one derived from the relative path.
    pub fn title(&self) -> String {
        match self.metadata.title.as_deref() {
            Some(title) => title.to_string(),
            None => naming::fallback_title(&self.relative),
        }
    }
}

pub struct Engine {
    root: PathBuf,
    config: SiteConfig,
    current: RwLock<Arc<Generation>>,
    generations: AtomicU64,
    requests: AtomicU64,
    subscribers: Mutex<Vec<Sender<GenerationChanged>>>,
}

impl Engine {
    /// Open a content root, loading its `config.toml` if present.
    pub fn open(root: &Path) -> Result<Engine, EngineError> {
        if !root.is_dir() {
            return Err(EngineError::ConfigurationMissing(root.to_path_buf()));
        }
        let config = config::load_config(root)?;
        Engine::with_config(root, config)
    }

    /// Open a content root with an explicit configuration.
    pub fn with_config(root: &Path, config: SiteConfig) -> Result<Engine, EngineError> {
        if !root.is_dir() {
            return Err(EngineError::ConfigurationMissing(root.to_path_buf()));
        }
        let first = scan_generation(root, &config, 1)?;
        Ok(Engine {
            root: root.to_path_buf(),
            config,
            current: RwLock::new(Arc::new(first)),
            generations: AtomicU64::new(1),
            requests: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The current generation. Holding it pins that snapshot.
    pub fn snapshot(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    pub fn get_tree(&self) -> TreeRef {
        TreeRef(self.snapshot())
    }

    pub fn navigate(&self, path: &str) -> Result<Resolved, NavigateError> {
        let generation = self.snapshot();
        let resolution = generation.navigate(path)?;
        Ok(Resolved {
            directory: resolution.directory.clone(),
            file: resolution.file.cloned(),
        })
    }

    pub fn locate(&self, path: &str, kind: Kind) -> Option<FileLoader> {
        self.snapshot().locate(path, kind).cloned()
    }

    pub fn extract_metadata(&self, contents: &str, kind: SourceKind) -> Metadata {
        frontmatter::extract_metadata(contents, kind)
    }

    /// Rescan the root and swap in a new generation. Returns its number.
    ///
    /// On error the previous generation stays current.
    pub fn rebuild(&self) -> Result<u64, EngineError> {
        let number = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let next = scan_generation(&self.root, &self.config, number)?;
        let mut current = self.current.write();
        // A slower, older rebuild must not replace a newer one.
        if next.number > current.number {
            *current = Arc::new(next);
        }
        Ok(number)
    }

    pub fn subscribe(&self) -> Receiver<GenerationChanged> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Notify every live subscriber. Returns how many were reached.
    pub fn broadcast(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(GenerationChanged).is_ok());
        subscribers.len()
    }

    /// Start a request, superseding every earlier one.
    pub fn begin_request(&self) -> Ticket {
        Ticket(self.requests.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.requests.load(Ordering::SeqCst) == ticket.0
    }

    /// Locate and read content for `path` on behalf of `ticket`.
    ///
    /// `Ok(None)` when the ticket was superseded before or after the read.
    pub fn load(&self, ticket: Ticket, path: &str, kind: Kind) -> Result<Option<Loaded>, EngineError> {
        if !self.is_current(ticket) {
            return Ok(None);
        }
        let loader = self
            .locate(path, kind)
            .ok_or_else(|| NavigateError::PathNotFound(path.to_string()))?;
        let contents = loader.load()?;
        let metadata = match SourceKind::of_path(&loader.path().to_string_lossy()) {
            Some(source) => frontmatter::extract_metadata(&contents, source),
            None => Metadata::default(),
        };
        if !self.is_current(ticket) {
            tracing::debug!(path, "load superseded, dropping result");
            return Ok(None);
        }
        let relative = relative_path(&self.root, loader.path())
            .unwrap_or_else(|| loader.path().to_string_lossy().into_owned());
        Ok(Some(Loaded {
            path: loader.path().to_path_buf(),
            relative,
            kind,
            contents,
            metadata,
        }))
    }
}

/// Scan `root` and build a generation.
///
/// Errors reading the root itself abort; unreadable entries below it are
/// logged and skipped.
fn scan_generation(root: &Path, config: &SiteConfig, number: u64) -> Result<Generation, EngineError> {
    let extensions = config.extension_refs();
    let mut paths = Vec::new();
    let mut sizes = HashMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || {
                let name = entry.file_name().to_string_lossy();
                !name.starts_with('.') && !config.ignore.iter().any(|i| *i == name)
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 path");
            continue;
        };
        if !path::has_extension(&relative, &extensions) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            sizes.insert(relative.clone(), meta.len());
        }
        paths.push(relative);
    }

    let generation = Generation::build(number, root, config, &paths, &sizes);
    tracing::info!(
        generation = number,
        files = generation.file_count(),
        with_metadata = generation.metadata.len(),
        "content tree built"
    );
    Ok(generation)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn engine_with(files: &[(&str, &str)]) -> (TempDir, Engine) {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), files);
        let engine = Engine::open(tmp.path()).unwrap();
        (tmp, engine)
    }

    #[test]
    fn missing_root_is_configuration_missing() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            Engine::open(&missing),
            Err(EngineError::ConfigurationMissing(p)) if p == missing
        ));
    }

    #[test]
    fn scan_excludes_hidden_ignored_and_foreign_files() {
        let (_tmp, engine) = engine_with(&[
            ("a/index.mdx", "# A"),
            (".drafts/x.md", "hidden"),
            ("node_modules/pkg/readme.md", "ignored"),
            ("notes.txt", "not content"),
            ("config.toml", ""),
        ]);
        let tree = engine.get_tree();
        assert_eq!(child_names(&tree), vec!["a"]);
        assert_eq!(tree.generation(), 1);
    }

    #[test]
    fn tree_carries_sizes_and_metadata() {
        let (_tmp, engine) = engine_with(&[("post.md", "---\ntitle: Post\n---\nbody\n")]);
        let tree = engine.get_tree();
        let post = find_file(&tree, "post.md");
        assert_eq!(post.size, 25);
        assert_eq!(
            post.metadata.as_ref().and_then(|m| m.title.as_deref()),
            Some("Post")
        );
    }

    #[test]
    fn fixture_site_scans_in_file_name_order() {
        let tmp = setup_fixtures();
        let engine = Engine::open(tmp.path()).unwrap();
        assert_eq!(engine.config().site.name, "Fixture Site");

        let tree = engine.get_tree();
        assert_eq!(
            child_names(&tree),
            vec![
                "01-getting-started",
                "2024-01-15-launch",
                "demo.tsx",
                "drafts",
                "images",
                "index.mdx",
                "intro.slides.mdx",
                "talks",
            ]
        );
        let demo = find_file(&tree, "demo.tsx");
        assert_eq!(
            demo.metadata.as_ref().and_then(|m| m.title.as_deref()),
            Some("Interactive Demo")
        );
        assert!(find_dir(&tree, "images").file("logo.svg").is_some());
    }

    #[test]
    fn navigate_returns_owned_resolution() {
        let (_tmp, engine) = engine_with(&[("a/b/README.md", "# B")]);
        let resolved = engine.navigate("a/b/README.md").unwrap();
        assert_eq!(resolved.directory.path, "a/b");
        assert_eq!(resolved.file.unwrap().name, "README.md");
        assert!(matches!(
            engine.navigate("a/c"),
            Err(NavigateError::PathNotFound(_))
        ));
    }

    #[test]
    fn locate_uses_conventions() {
        let (tmp, engine) = engine_with(&[("guide/README.md", "# Guide"), ("guide/index.mdx", "# Index")]);
        let loader = engine.locate("guide", Kind::Document).unwrap();
        assert_eq!(loader.path(), tmp.path().join("guide/index.mdx"));
        assert!(engine.locate("guide", Kind::Slides).is_none());
    }

    #[test]
    fn rebuild_swaps_generation_and_old_snapshots_stay_valid() {
        let (tmp, engine) = engine_with(&[("a.md", "a")]);
        let before = engine.snapshot();

        write_tree(tmp.path(), &[("b.md", "b")]);
        let number = engine.rebuild().unwrap();

        assert_eq!(number, 2);
        assert_eq!(child_names(&before.tree), vec!["a.md"]);
        assert_eq!(child_names(&engine.get_tree()), vec!["a.md", "b.md"]);
    }

    #[test]
    fn broadcast_reaches_live_subscribers_only() {
        let (_tmp, engine) = engine_with(&[("a.md", "a")]);
        let rx = engine.subscribe();
        let dropped = engine.subscribe();
        drop(dropped);

        assert_eq!(engine.broadcast(), 1);
        assert_eq!(rx.try_recv(), Ok(GenerationChanged));
        assert!(rx.try_recv().is_err());
    }

    // =========================================================================
    // Cancellable loads
    // =========================================================================

    #[test]
    fn load_returns_content_and_metadata() {
        let (_tmp, engine) = engine_with(&[("talk/SLIDES.mdx", "---\ntitle: Talk\n---\n# One\n")]);
        let ticket = engine.begin_request();
        let loaded = engine.load(ticket, "talk", Kind::Slides).unwrap().unwrap();
        assert_eq!(loaded.metadata.title.as_deref(), Some("Talk"));
        assert!(loaded.contents.contains("# One"));
    }

    #[test]
    fn malformed_header_loads_with_path_title() {
        let (_tmp, engine) = engine_with(&[("talk/README.md", "---\ntitle: [\n---\n# Body\n")]);
        let ticket = engine.begin_request();
        let loaded = engine.load(ticket, "talk", Kind::Document).unwrap().unwrap();
        assert_eq!(loaded.relative, "talk/README.md");
        assert!(loaded.metadata.is_empty());
        assert_eq!(loaded.title(), "Talk");

        let file = engine.navigate("talk/README.md").unwrap().file.unwrap();
        assert_eq!(file.display_title(), "Talk");
    }

    #[test]
    fn locate_agrees_with_navigate_on_nested_namesakes() {
        let (tmp, engine) = engine_with(&[
            ("archive/docs/index.md", "# Old"),
            ("docs/index.md", "# New"),
        ]);
        for request in ["docs", "docs/index.md"] {
            let loader = engine.locate(request, Kind::Document).unwrap();
            assert_eq!(loader.path(), tmp.path().join("docs/index.md"));
        }
        let navigated = engine.navigate("docs/index.md").unwrap().file.unwrap();
        assert_eq!(navigated.path, "docs/index.md");
        assert_eq!(
            engine.locate("archive/docs", Kind::Document).unwrap().path(),
            tmp.path().join("archive/docs/index.md")
        );
    }

    #[test]
    fn superseded_ticket_loads_nothing() {
        let (_tmp, engine) = engine_with(&[("a.md", "a")]);
        let stale = engine.begin_request();
        let fresh = engine.begin_request();
        assert!(engine.load(stale, "a.md", Kind::Document).unwrap().is_none());
        assert!(engine.load(fresh, "a.md", Kind::Document).unwrap().is_some());
    }

    #[test]
    fn load_of_missing_path_is_not_found() {
        let (_tmp, engine) = engine_with(&[("a.md", "a")]);
        let ticket = engine.begin_request();
        assert!(matches!(
            engine.load(ticket, "missing", Kind::Document),
            Err(EngineError::Navigate(NavigateError::PathNotFound(_)))
        ));
    }
}
