//! Synchronous lifecycle hooks

use crate::error::{BoxError, HookError};

type Tap = Box<dyn Fn() -> Result<(), BoxError>>;

/// An ordered list of named callbacks.
pub struct SyncHook {
    name: &'static str,
    taps: Vec<(String, Tap)>,
}

impl SyncHook {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `callback` under `tap_name`; callbacks run in registration
    /// order.
    pub fn tap<F>(&mut self, tap_name: impl Into<String>, callback: F)
    where
        F: Fn() -> Result<(), BoxError> + 'static,
    {
        self.taps.push((tap_name.into(), Box::new(callback)));
    }

    /// Runs every tap, stopping at the first failure.
    pub fn call(&self) -> Result<(), HookError> {
        for (tap, callback) in &self.taps {
            callback().map_err(|source| HookError {
                hook: self.name,
                tap: tap.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn tap_names(&self) -> impl Iterator<Item = &str> {
        self.taps.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

/// The compiler's lifecycle points.
pub struct CompilerHooks {
    /// Before the first pass of `run` or `watch`
    pub run: SyncHook,
    /// After each pass's assets are written and its callback has run
    pub done: SyncHook,
}

impl CompilerHooks {
    pub fn new() -> Self {
        Self {
            run: SyncHook::new("run"),
            done: SyncHook::new("done"),
        }
    }
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self::new()
    }
}
