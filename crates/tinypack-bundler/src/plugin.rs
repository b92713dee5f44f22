//! Plugins register callbacks on the compiler hooks

use tracing::info;

use crate::hooks::CompilerHooks;

/// Anything that taps compiler hooks. Plugins are applied once, in order,
/// when the compiler is created.
pub trait Plugin {
    fn name(&self) -> &str;

    fn apply(&self, hooks: &mut CompilerHooks);
}

/// Logs when a compilation starts.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunLoggerPlugin;

impl Plugin for RunLoggerPlugin {
    fn name(&self) -> &str {
        "RunLoggerPlugin"
    }

    fn apply(&self, hooks: &mut CompilerHooks) {
        hooks.run.tap(self.name(), || {
            info!("compilation started");
            Ok(())
        });
    }
}

/// Logs when a compilation pass has finished.
#[derive(Debug, Default, Clone, Copy)]
pub struct DoneLoggerPlugin;

impl Plugin for DoneLoggerPlugin {
    fn name(&self) -> &str {
        "DoneLoggerPlugin"
    }

    fn apply(&self, hooks: &mut CompilerHooks) {
        hooks.done.tap(self.name(), || {
            info!("compilation finished");
            Ok(())
        });
    }
}
