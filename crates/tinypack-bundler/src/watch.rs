//! File watching backends for watch mode

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tracing::warn;

use crate::error::Result;

/// Source of file change notifications.
pub trait WatchBackend {
    fn watch(&mut self, path: &Path) -> Result<()>;

    fn unwatch(&mut self, path: &Path) -> Result<()>;

    /// Waits up to `timeout` for the next changed path.
    fn next_change(&mut self, timeout: Duration) -> Option<PathBuf>;
}

/// Native file system notifications through `notify`.
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
    receiver: Receiver<PathBuf>,
}

impl NotifyBackend {
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "file watcher reported an error"),
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
        })
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher.unwatch(path)?;
        Ok(())
    }

    fn next_change(&mut self, timeout: Duration) -> Option<PathBuf> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    watched: BTreeSet<PathBuf>,
    pending: VecDeque<PathBuf>,
}

/// In-process backend driven by [`MemoryWatcher::touch`].
///
/// Clones share state, so a test can keep one handle and give another to
/// the compiler.
#[derive(Debug, Clone, Default)]
pub struct MemoryWatcher {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a change to `path`. Returns false, and reports nothing, when
    /// the path is not being watched.
    pub fn touch(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let mut state = self.lock();
        if !state.watched.contains(path) {
            return false;
        }
        state.pending.push_back(path.to_path_buf());
        true
    }

    /// Paths currently watched.
    pub fn watched(&self) -> BTreeSet<PathBuf> {
        self.lock().watched.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WatchBackend for MemoryWatcher {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.lock().watched.insert(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.lock().watched.remove(path);
        Ok(())
    }

    fn next_change(&mut self, timeout: Duration) -> Option<PathBuf> {
        if let Some(path) = self.lock().pending.pop_front() {
            return Some(path);
        }
        thread::sleep(timeout.min(Duration::from_millis(5)));
        self.lock().pending.pop_front()
    }
}

/// Waits up to `poll` for a change, then keeps draining until the backend
/// has been quiet for `debounce`. Returns the distinct changed paths.
pub(crate) fn collect_changes(
    backend: &mut dyn WatchBackend,
    poll: Duration,
    debounce: Duration,
) -> Vec<PathBuf> {
    let Some(first) = backend.next_change(poll) else {
        return Vec::new();
    };
    let mut changed = BTreeSet::from([first]);
    while let Some(path) = backend.next_change(debounce) {
        changed.insert(path);
    }
    changed.into_iter().collect()
}
