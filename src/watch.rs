//! Live invalidation: file events in, one rebuild and one broadcast out.
//!
//! ```text
//!            content change              window elapsed since LAST change
//!   Idle ─────────────────► PendingChanges ─────────────────► Rebuilding ──► Idle
//!                             ▲        │                          │
//!                             └────────┘                          ├─ engine.rebuild()
//!                           more changes restart                  └─ broadcast (unless marker)
//!                           the window
//! ```
//!
//! Only paths under the content root with a recognized extension count as
//! content changes, plus folders appearing or disappearing (a folder rename
//! moves every file beneath it). Hidden and ignored segments never do. The marker file
//! (`.running` by default) is special: while it exists rebuilds still run but
//! nothing is broadcast, and its removal schedules a rebuild.
//!
//! The timing logic lives in the pure [`Debouncer`] and [`Coordinator`],
//! which take `Instant`s explicitly. [`WatchHandle`] wires a `notify` watcher
//! to a coordinator thread through `crossbeam-channel`.

use crate::config::SiteConfig;
use crate::engine::Engine;
use crate::path;
use crossbeam_channel as channel;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    PendingChanges,
    Rebuilding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ContentChange {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Flatten a `notify` event into per-path changes.
///
/// Renames become a removal of the old path and a creation of the new one;
/// for the coordinator both simply mean "something changed".
pub fn changes_from_event(event: notify::Event) -> Vec<ContentChange> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Created,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut out = Vec::new();
            if let Some(from) = paths.next() {
                out.push(ContentChange::new(ChangeKind::Removed, from));
            }
            out.extend(paths.map(|to| ContentChange::new(ChangeKind::Created, to)));
            return out;
        }
        // One side of a rename the backend could not pair up.
        EventKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .into_iter()
                .map(|path| {
                    let kind = if path.exists() {
                        ChangeKind::Created
                    } else {
                        ChangeKind::Removed
                    };
                    ContentChange::new(kind, path)
                })
                .collect();
        }
        // Access events never change content.
        EventKind::Access(_) => return Vec::new(),
        _ => ChangeKind::Modified,
    };
    event
        .paths
        .into_iter()
        .map(|path| ContentChange::new(kind, path))
        .collect()
}

/// What a change means to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Content,
    MarkerCreated,
    MarkerRemoved,
    Ignored,
}

/// Decides which filesystem changes matter.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    ignore: Vec<String>,
    marker: String,
}

impl ChangeFilter {
    pub fn new(root: &Path, config: &SiteConfig) -> Self {
        // Watchers report canonical paths; keep the configured form too.
        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize()
            && canonical != root
        {
            roots.push(canonical);
        }
        Self {
            roots,
            extensions: config.extensions.clone(),
            ignore: config.ignore.clone(),
            marker: config.watch.marker.clone(),
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.roots[0].join(&self.marker)
    }

    pub fn classify(&self, change: &ContentChange) -> Classified {
        let Some(relative) = self
            .roots
            .iter()
            .find_map(|root| change.path.strip_prefix(root).ok())
        else {
            return Classified::Ignored;
        };
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if segments.len() == 1 && segments[0] == self.marker {
            return match change.kind {
                ChangeKind::Created => Classified::MarkerCreated,
                ChangeKind::Removed => Classified::MarkerRemoved,
                ChangeKind::Modified => Classified::Ignored,
            };
        }
        if segments
            .iter()
            .any(|s| s.starts_with('.') || self.ignore.contains(s))
        {
            return Classified::Ignored;
        }
        let extensions: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        match segments.last() {
            Some(name) if path::has_extension(name, &extensions) => Classified::Content,
            Some(name) if change.kind != ChangeKind::Modified && is_folder(&change.path, name) => {
                Classified::Content
            }
            _ => Classified::Ignored,
        }
    }
}

/// A removed folder is gone from disk, so an extensionless name stands in.
fn is_folder(full: &Path, name: &str) -> bool {
    full.is_dir() || path::extension(name).is_none()
}

/// Trailing-edge debounce over explicit instants.
///
/// The window is measured from the most recent event, so a steady stream
/// of changes keeps postponing the rebuild until it goes quiet.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_event: Option<Instant>,
    coalesced: usize,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
            coalesced: 0,
        }
    }

    pub fn push(&mut self, now: Instant) {
        self.last_event = Some(now);
        self.coalesced += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|last| last + self.window)
    }

    /// When the window has elapsed, reset and return how many events were
    /// coalesced.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.coalesced))
    }
}

/// Result of one debounced rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Broadcast { generation: u64, subscribers: usize },
    Suppressed { generation: u64 },
    Failed,
}

/// Drives the invalidation state machine for one engine.
pub struct Coordinator {
    engine: Arc<Engine>,
    filter: ChangeFilter,
    debouncer: Debouncer,
    state: State,
    suppressed: bool,
}

impl Coordinator {
    pub fn new(engine: Arc<Engine>) -> Self {
        let filter = ChangeFilter::new(engine.root(), engine.config());
        let debouncer = Debouncer::new(engine.config().watch.debounce());
        let suppressed = filter.marker_path().exists();
        Self {
            engine,
            filter,
            debouncer,
            state: State::Idle,
            suppressed,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn handle(&mut self, change: &ContentChange, now: Instant) {
        match self.filter.classify(change) {
            Classified::Content => self.schedule(now),
            Classified::MarkerCreated => {
                tracing::info!("marker present, suppressing change notifications");
                self.suppressed = true;
            }
            Classified::MarkerRemoved => {
                tracing::info!("marker removed, scheduling rebuild");
                self.suppressed = false;
                self.schedule(now);
            }
            Classified::Ignored => {}
        }
    }

    pub fn handle_event(&mut self, event: notify::Event, now: Instant) {
        for change in changes_from_event(event) {
            self.handle(&change, now);
        }
    }

    fn schedule(&mut self, now: Instant) {
        self.debouncer.push(now);
        self.state = State::PendingChanges;
    }

    /// Rebuild if the debounce window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<RebuildOutcome> {
        let coalesced = self.debouncer.poll(now)?;
        tracing::debug!(coalesced, "debounce window elapsed");
        Some(self.rebuild())
    }

    fn rebuild(&mut self) -> RebuildOutcome {
        self.state = State::Rebuilding;
        let outcome = match self.engine.rebuild() {
            Ok(generation) if self.suppressed => {
                tracing::warn!(generation, "marker present, broadcast suppressed");
                RebuildOutcome::Suppressed { generation }
            }
            Ok(generation) => {
                let subscribers = self.engine.broadcast();
                RebuildOutcome::Broadcast {
                    generation,
                    subscribers,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "rebuild failed, keeping previous generation");
                RebuildOutcome::Failed
            }
        };
        self.state = State::Idle;
        outcome
    }

    /// Event loop: drain watcher events until `stop` fires or the watcher
    /// goes away.
    pub fn run(
        mut self,
        events: channel::Receiver<notify::Result<notify::Event>>,
        stop: channel::Receiver<()>,
    ) {
        loop {
            let tick = match self.deadline() {
                Some(deadline) => channel::at(deadline),
                None => channel::never(),
            };
            channel::select! {
                recv(stop) -> _ => break,
                recv(events) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_event(event, Instant::now()),
                    Ok(Err(e)) => tracing::warn!(error = %e, "watcher error"),
                    Err(_) => break,
                },
                recv(tick) -> _ => {
                    self.tick(Instant::now());
                }
            }
        }
    }
}

/// A running watcher. Dropping it stops the coordinator thread.
pub struct WatchHandle {
    _watcher: notify::RecommendedWatcher,
    stop_tx: channel::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Watch the engine's root recursively on a background thread.
    pub fn spawn(engine: Arc<Engine>) -> Result<WatchHandle, WatchError> {
        let (raw_tx, raw_rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = raw_tx.send(res);
        })?;
        watcher.watch(engine.root(), RecursiveMode::Recursive)?;
        tracing::info!(root = %engine.root().display(), "watching for changes");

        let (stop_tx, stop_rx) = channel::bounded(1);
        let coordinator = Coordinator::new(engine);
        let thread = std::thread::spawn(move || coordinator.run(raw_rx, stop_rx));

        Ok(WatchHandle {
            _watcher: watcher,
            stop_tx,
            thread: Some(thread),
        })
    }

    /// Stop the coordinator thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GenerationChanged;
    use crate::test_helpers::write_tree;
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_millis(1000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup() -> (TempDir, Arc<Engine>) {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("index.mdx", "# Home"), ("guide/README.md", "# Guide")]);
        let engine = Arc::new(Engine::open(tmp.path()).unwrap());
        (tmp, engine)
    }

    fn modified(engine: &Engine, relative: &str) -> ContentChange {
        ContentChange::new(ChangeKind::Modified, engine.root().join(relative))
    }

    // =========================================================================
    // Debouncer
    // =========================================================================

    #[test]
    fn debouncer_idle_until_pushed() {
        let mut d = Debouncer::new(WINDOW);
        assert!(!d.is_pending());
        assert_eq!(d.poll(Instant::now()), None);
    }

    #[test]
    fn debouncer_window_measured_from_last_event() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.push(t0);
        d.push(t0 + ms(800));
        // First event's window has elapsed, last event's hasn't.
        assert_eq!(d.poll(t0 + ms(1200)), None);
        assert_eq!(d.deadline(), Some(t0 + ms(1800)));
        assert_eq!(d.poll(t0 + ms(1800)), Some(2));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + ms(5000)), None);
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn filter_classifies_changes() {
        let (_tmp, engine) = setup();
        let filter = ChangeFilter::new(engine.root(), engine.config());
        let root = engine.root();
        let c = |kind, rel: &str| filter.classify(&ContentChange::new(kind, root.join(rel)));

        assert_eq!(c(ChangeKind::Modified, "guide/README.md"), Classified::Content);
        assert_eq!(c(ChangeKind::Created, "photo.webp"), Classified::Content);
        assert_eq!(c(ChangeKind::Modified, "notes.txt"), Classified::Ignored);
        assert_eq!(c(ChangeKind::Modified, ".cache/x.md"), Classified::Ignored);
        assert_eq!(c(ChangeKind::Modified, "node_modules/a/b.js"), Classified::Ignored);
        assert_eq!(c(ChangeKind::Created, ".running"), Classified::MarkerCreated);
        assert_eq!(c(ChangeKind::Removed, ".running"), Classified::MarkerRemoved);
        assert_eq!(
            filter.classify(&ContentChange::new(ChangeKind::Modified, "/elsewhere/a.md")),
            Classified::Ignored
        );
    }

    #[test]
    fn folder_appearing_or_vanishing_is_content() {
        let (tmp, engine) = setup();
        let filter = ChangeFilter::new(engine.root(), engine.config());
        let root = engine.root();
        let c = |kind, rel: &str| filter.classify(&ContentChange::new(kind, root.join(rel)));

        std::fs::rename(tmp.path().join("guide"), tmp.path().join("guides")).unwrap();
        assert_eq!(c(ChangeKind::Removed, "guide"), Classified::Content);
        assert_eq!(c(ChangeKind::Created, "guides"), Classified::Content);
        assert_eq!(c(ChangeKind::Modified, "guides"), Classified::Ignored);
        assert_eq!(c(ChangeKind::Removed, ".cache"), Classified::Ignored);
        assert_eq!(c(ChangeKind::Created, "node_modules"), Classified::Ignored);

        std::fs::create_dir(tmp.path().join("v1.2")).unwrap();
        assert_eq!(c(ChangeKind::Created, "v1.2"), Classified::Content);
        assert_eq!(c(ChangeKind::Removed, "notes.txt"), Classified::Ignored);
    }

    #[test]
    fn unpaired_rename_side_follows_existence() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("now.md", "")]);
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path(tmp.path().join("gone.md"))
            .add_path(tmp.path().join("now.md"));
        assert_eq!(
            changes_from_event(event),
            vec![
                ContentChange::new(ChangeKind::Removed, tmp.path().join("gone.md")),
                ContentChange::new(ChangeKind::Created, tmp.path().join("now.md")),
            ]
        );
    }

    #[test]
    fn rename_event_becomes_remove_and_create() {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/c/old.md"))
            .add_path(PathBuf::from("/c/new.md"));
        assert_eq!(
            changes_from_event(event),
            vec![
                ContentChange::new(ChangeKind::Removed, "/c/old.md"),
                ContentChange::new(ChangeKind::Created, "/c/new.md"),
            ]
        );
    }

    #[test]
    fn access_events_dropped() {
        let event = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/c/a.md"));
        assert!(changes_from_event(event).is_empty());
    }

    // =========================================================================
    // Coordinator
    // =========================================================================

    #[test]
    fn burst_of_five_changes_rebuilds_and_broadcasts_once() {
        let (_tmp, engine) = setup();
        let rx = engine.subscribe();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        let t0 = Instant::now();

        for i in 0..5 {
            coordinator.handle(&modified(&engine, "guide/README.md"), t0 + ms(i * 100));
            assert_eq!(coordinator.state(), State::PendingChanges);
            assert_eq!(coordinator.tick(t0 + ms(i * 100 + 50)), None);
        }

        assert_eq!(coordinator.tick(t0 + ms(1300)), None);
        assert_eq!(
            coordinator.tick(t0 + ms(1400)),
            Some(RebuildOutcome::Broadcast {
                generation: 2,
                subscribers: 1
            })
        );
        assert_eq!(coordinator.state(), State::Idle);
        assert_eq!(coordinator.tick(t0 + ms(5000)), None);

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![GenerationChanged]);
        assert_eq!(engine.snapshot().number, 2);
    }

    #[test]
    fn ignored_changes_do_not_schedule() {
        let (_tmp, engine) = setup();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        coordinator.handle(&modified(&engine, "notes.txt"), Instant::now());
        assert_eq!(coordinator.state(), State::Idle);
        assert_eq!(coordinator.deadline(), None);
    }

    #[test]
    fn rebuild_picks_up_new_files() {
        let (tmp, engine) = setup();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        let t0 = Instant::now();

        write_tree(tmp.path(), &[("new.md", "# New")]);
        coordinator.handle(
            &ContentChange::new(ChangeKind::Created, tmp.path().join("new.md")),
            t0,
        );
        coordinator.tick(t0 + WINDOW);

        assert!(engine.get_tree().file("new.md").is_some());
    }

    #[test]
    fn folder_rename_rebuilds_tree() {
        let (tmp, engine) = setup();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        let t0 = Instant::now();

        std::fs::rename(tmp.path().join("guide"), tmp.path().join("guides")).unwrap();
        coordinator.handle(&ContentChange::new(ChangeKind::Removed, tmp.path().join("guide")), t0);
        coordinator.handle(&ContentChange::new(ChangeKind::Created, tmp.path().join("guides")), t0);
        assert_eq!(coordinator.state(), State::PendingChanges);
        assert!(matches!(
            coordinator.tick(t0 + WINDOW),
            Some(RebuildOutcome::Broadcast { generation: 2, .. })
        ));

        let tree = engine.get_tree();
        assert!(tree.directory("guide").is_none());
        assert!(tree.directory("guides").is_some());
    }

    #[test]
    fn marker_suppresses_broadcast_and_its_removal_rebuilds() {
        let (tmp, engine) = setup();
        let rx = engine.subscribe();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        let marker = tmp.path().join(".running");
        let t0 = Instant::now();

        coordinator.handle(&ContentChange::new(ChangeKind::Created, &marker), t0);
        assert!(coordinator.is_suppressed());
        coordinator.handle(&modified(&engine, "index.mdx"), t0);
        assert_eq!(
            coordinator.tick(t0 + WINDOW),
            Some(RebuildOutcome::Suppressed { generation: 2 })
        );
        assert!(rx.try_recv().is_err());

        let t1 = t0 + ms(2000);
        coordinator.handle(&ContentChange::new(ChangeKind::Removed, &marker), t1);
        assert!(!coordinator.is_suppressed());
        assert_eq!(coordinator.state(), State::PendingChanges);
        assert!(matches!(
            coordinator.tick(t1 + WINDOW),
            Some(RebuildOutcome::Broadcast { generation: 3, .. })
        ));
        assert_eq!(rx.try_recv(), Ok(GenerationChanged));
    }

    #[test]
    fn existing_marker_suppresses_from_start() {
        let (tmp, engine) = setup();
        write_tree(tmp.path(), &[(".running", "")]);
        let coordinator = Coordinator::new(engine);
        assert!(coordinator.is_suppressed());
    }

    #[test]
    fn failed_rebuild_keeps_previous_generation() {
        let (tmp, engine) = setup();
        let rx = engine.subscribe();
        let mut coordinator = Coordinator::new(Arc::clone(&engine));
        let t0 = Instant::now();

        coordinator.handle(&modified(&engine, "index.mdx"), t0);
        std::fs::remove_dir_all(tmp.path()).unwrap();

        assert_eq!(coordinator.tick(t0 + WINDOW), Some(RebuildOutcome::Failed));
        assert_eq!(coordinator.state(), State::Idle);
        assert_eq!(engine.snapshot().number, 1);
        assert!(engine.get_tree().file("index.mdx").is_some());
        assert!(rx.try_recv().is_err());
    }

    // =========================================================================
    // WatchHandle
    // =========================================================================

    #[test]
    fn stop_returns_promptly() {
        let (_tmp, engine) = setup();
        let handle = WatchHandle::spawn(engine).unwrap();
        let (done_tx, done_rx) = channel::bounded(1);
        std::thread::spawn(move || {
            handle.stop();
            let _ = done_tx.send(());
        });
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(()));
    }
}
