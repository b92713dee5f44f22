//! Compiler orchestration: hooks, passes, asset emission and watch mode

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::compilation::Compilation;
use crate::error::{BundleError, ConfigError, Result};
use crate::hooks::CompilerHooks;
use crate::options::BundlerOptions;
use crate::resolver::Resolver;
use crate::stats::Stats;
use crate::watch::{collect_changes, NotifyBackend, WatchBackend};

/// How long watch mode blocks before checking whether it should stop.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Quiet period that ends a batch of change events.
const DEBOUNCE: Duration = Duration::from_millis(50);

pub struct Compiler {
    options: BundlerOptions,
    resolver: Resolver,
    hooks: CompilerHooks,
    watcher: Option<Box<dyn WatchBackend>>,
    /// Files armed on `watcher` by the last pass
    watched: BTreeSet<PathBuf>,
}

impl Compiler {
    /// Creates a compiler and applies every configured plugin, in order.
    pub fn new(mut options: BundlerOptions) -> Result<Self> {
        options.entry.validate()?;
        options.context =
            fs::canonicalize(&options.context).map_err(|source| ConfigError::Context {
                path: options.context.clone(),
                source,
            })?;

        let resolver = Resolver::new(options.resolve.extensions.clone());
        let mut hooks = CompilerHooks::new();
        for plugin in std::mem::take(&mut options.plugins) {
            debug!(plugin = plugin.name(), "applying plugin");
            plugin.apply(&mut hooks);
        }

        Ok(Self {
            options,
            resolver,
            hooks,
            watcher: None,
            watched: BTreeSet::new(),
        })
    }

    /// Arms `backend` with the touched files after every pass.
    pub fn with_watch_backend(mut self, backend: impl WatchBackend + 'static) -> Self {
        self.watcher = Some(Box::new(backend));
        self
    }

    pub fn options(&self) -> &BundlerOptions {
        &self.options
    }

    pub fn hooks(&self) -> &CompilerHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut CompilerHooks {
        &mut self.hooks
    }

    /// Files watched after the last pass.
    pub fn watched_files(&self) -> &BTreeSet<PathBuf> {
        &self.watched
    }

    /// One pass without hooks, emission or watching.
    pub fn compile(&self) -> Result<Stats> {
        Compilation::new(&self.options, &self.resolver).build()
    }

    /// Fires `run`, then runs one pass.
    ///
    /// Failures of the pass itself go to `callback`; only hook failures are
    /// returned.
    pub fn run<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(std::result::Result<&Stats, &BundleError>),
    {
        self.hooks.run.call()?;
        self.pass(&mut callback, &[])
    }

    /// Runs once, then rebuilds after every batch of changes to a watched
    /// file until `should_stop` returns true.
    ///
    /// Uses native file notifications unless another backend was set with
    /// [`Compiler::with_watch_backend`].
    pub fn watch<F, S>(&mut self, mut callback: F, should_stop: S) -> Result<()>
    where
        F: FnMut(std::result::Result<&Stats, &BundleError>),
        S: Fn() -> bool,
    {
        if self.watcher.is_none() {
            self.watcher = Some(Box::new(NotifyBackend::new()?));
        }

        self.run(&mut callback)?;

        while !should_stop() {
            let changed = match self.watcher.as_deref_mut() {
                Some(backend) => collect_changes(backend, POLL_INTERVAL, DEBOUNCE),
                None => break,
            };
            if changed.is_empty() {
                continue;
            }
            info!(files = changed.len(), "change detected, rebuilding");
            self.pass(&mut callback, &changed)?;
        }

        Ok(())
    }

    fn pass<F>(&mut self, callback: &mut F, changed: &[PathBuf]) -> Result<()>
    where
        F: FnMut(std::result::Result<&Stats, &BundleError>),
    {
        let started = Instant::now();
        let mut compilation = Compilation::new(&self.options, &self.resolver);
        let result = compilation.build().and_then(|stats| {
            self.emit(&stats)?;
            Ok(stats)
        });
        let touched = compilation.into_file_dependencies();

        match &result {
            Ok(stats) => info!(
                chunks = stats.chunks.len(),
                modules = stats.modules.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "compilation succeeded"
            ),
            Err(e) => warn!(error = %e, "compilation failed"),
        }
        callback(result.as_ref());

        self.rearm(touched, changed);
        self.hooks.done.call()?;
        Ok(())
    }

    fn emit(&self, stats: &Stats) -> Result<()> {
        let out_dir = self.options.output_dir();
        for (filename, text) in &stats.assets {
            let path = out_dir.join(filename);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| BundleError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, text).map_err(|source| BundleError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), bytes = text.len(), "wrote asset");
        }
        Ok(())
    }

    /// Points the watch backend at `touched`, releasing files the previous
    /// pass watched but this one did not touch.
    fn rearm(&mut self, touched: BTreeSet<PathBuf>, changed: &[PathBuf]) {
        let Some(backend) = self.watcher.as_deref_mut() else {
            return;
        };
        if touched.is_empty() && !self.watched.is_empty() {
            debug!("pass touched no files, keeping previous watchers");
            return;
        }

        for path in self.watched.difference(&touched) {
            match backend.unwatch(path) {
                Ok(()) => debug!(path = %path.display(), "released watcher"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to release watcher"),
            }
        }

        let mut armed = BTreeSet::new();
        for path in touched {
            let is_new = !self.watched.contains(&path);
            // Editors that save by rename leave the old watch on a dead inode.
            let replaced = !is_new && changed.contains(&path);
            if replaced {
                if let Err(e) = backend.unwatch(&path) {
                    warn!(path = %path.display(), error = %e, "failed to release watcher before re-arming");
                }
            }
            if is_new || replaced {
                if let Err(e) = backend.watch(&path) {
                    warn!(path = %path.display(), error = %e, "failed to watch file");
                    continue;
                }
                debug!(path = %path.display(), "armed watcher");
            }
            armed.insert(path);
        }
        self.watched = armed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::MemoryWatcher;

    fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for (name, contents) in files {
            fs::write(root.join(name), contents).unwrap();
        }
        (dir, root)
    }

    #[test]
    fn test_missing_context() {
        let options = BundlerOptions::new("a.js").with_context("/definitely/not/here");
        assert!(matches!(
            Compiler::new(options),
            Err(BundleError::Config(ConfigError::Context { .. }))
        ));
    }

    #[test]
    fn test_run_writes_assets() {
        let (_dir, root) = project(&[("a.js", "module.exports = 1;")]);
        let options = BundlerOptions::new("a.js")
            .with_context(&root)
            .with_filename("out/[name].js");
        let mut compiler = Compiler::new(options).unwrap();

        let mut calls = 0;
        compiler
            .run(|result| {
                assert!(result.is_ok());
                calls += 1;
            })
            .unwrap();

        assert_eq!(calls, 1);
        let written = fs::read_to_string(root.join("dist/out/main.js")).unwrap();
        assert!(written.contains("module.exports = 1;"));
        assert!(compiler.watched_files().is_empty());
    }

    #[test]
    fn test_failed_pass_keeps_previous_watchers() {
        let (_dir, root) = project(&[("a.js", "require('./b');"), ("b.js", "")]);
        let options = BundlerOptions::new("a.js").with_context(&root);
        let handle = MemoryWatcher::new();
        let mut compiler = Compiler::new(options).unwrap().with_watch_backend(handle.clone());

        compiler.run(|_| {}).unwrap();
        assert_eq!(handle.watched().len(), 2);

        fs::remove_file(root.join("a.js")).unwrap();
        compiler.run(|result| assert!(result.is_err())).unwrap();
        assert_eq!(handle.watched().len(), 2);
        assert_eq!(compiler.watched_files().len(), 2);
    }

    /// Memory backend whose releases always fail.
    struct StickyWatcher {
        inner: MemoryWatcher,
        armed: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl WatchBackend for StickyWatcher {
        fn watch(&mut self, path: &std::path::Path) -> Result<()> {
            self.armed.set(self.armed.get() + 1);
            self.inner.watch(path)
        }

        fn unwatch(&mut self, _path: &std::path::Path) -> Result<()> {
            Err(notify::Error::generic("cannot release").into())
        }

        fn next_change(&mut self, timeout: Duration) -> Option<PathBuf> {
            self.inner.next_change(timeout)
        }
    }

    #[test]
    fn test_changed_file_is_rearmed_when_release_fails() {
        let (_dir, root) = project(&[("a.js", "")]);
        let options = BundlerOptions::new("a.js").with_context(&root);
        let armed = std::rc::Rc::new(std::cell::Cell::new(0));
        let handle = MemoryWatcher::new();
        let mut compiler = Compiler::new(options).unwrap().with_watch_backend(StickyWatcher {
            inner: handle.clone(),
            armed: armed.clone(),
        });

        compiler.run(|_| {}).unwrap();
        assert_eq!(armed.get(), 1);

        let entry = root.join("a.js");
        let mut callback = |result: std::result::Result<&Stats, &BundleError>| assert!(result.is_ok());
        compiler.pass(&mut callback, &[entry.clone()]).unwrap();

        assert_eq!(armed.get(), 2);
        assert!(compiler.watched_files().contains(&entry));
        assert!(handle.touch(&entry));
    }
}
