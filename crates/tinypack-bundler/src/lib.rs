//! # tinypack Bundler
//!
//! Builds the module graph below one or more entry points and emits one
//! self-executing script per entry.
//!
//! ```no_run
//! use tinypack_bundler::{BundlerOptions, Compiler, DoneLoggerPlugin};
//!
//! let options = BundlerOptions::new("./src/index.js").with_plugin(DoneLoggerPlugin);
//! let mut compiler = Compiler::new(options)?;
//! compiler.run(|result| {
//!     if let Err(e) = result {
//!         eprintln!("{}", e);
//!     }
//! })?;
//! # Ok::<(), tinypack_bundler::BundleError>(())
//! ```

mod analyze;
mod compilation;
mod compiler;
mod error;
mod graph;
mod hooks;
mod options;
mod package_json;
pub mod paths;
mod plugin;
mod resolver;
mod rewrite;
mod stats;
mod template;
mod transform;
mod watch;

pub use compilation::Compilation;
pub use compiler::Compiler;
pub use error::{BoxError, BundleError, ConfigError, HookError, ResolveError, Result};
pub use graph::{Dependency, Module};
pub use hooks::{CompilerHooks, SyncHook};
pub use options::{
    parse_named_entry, BundlerOptions, ConfigFile, Entry, ModuleOptions, OutputOptions,
    ResolveOptions, DEFAULT_ENTRY_NAME, NAME_PLACEHOLDER,
};
pub use plugin::{DoneLoggerPlugin, Plugin, RunLoggerPlugin};
pub use resolver::Resolver;
pub use rewrite::EditConflict;
pub use stats::{Chunk, Stats};
pub use transform::{Rule, Transform};
pub use watch::{MemoryWatcher, NotifyBackend, WatchBackend};

/// Creates a compiler for `options` with its plugins applied.
pub fn tinypack(options: BundlerOptions) -> Result<Compiler> {
    Compiler::new(options)
}
