//! A single compilation pass: entries to graph to chunks to assets

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::graph::{BuildContext, GraphBuilder, Module};
use crate::options::BundlerOptions;
use crate::resolver::Resolver;
use crate::stats::{Chunk, Stats};
use crate::template::render_chunk;

pub struct Compilation<'a> {
    options: &'a BundlerOptions,
    resolver: &'a Resolver,
    graph: BuildContext,
    chunks: Vec<Chunk>,
    assets: BTreeMap<String, String>,
}

impl<'a> Compilation<'a> {
    /// `options.context` must already be absolute.
    pub fn new(options: &'a BundlerOptions, resolver: &'a Resolver) -> Self {
        Self {
            options,
            resolver,
            graph: BuildContext::new(),
            chunks: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Builds every entry point and renders one asset per chunk.
    pub fn build(&mut self) -> Result<Stats> {
        self.options.entry.validate()?;

        let builder = GraphBuilder {
            context: &self.options.context,
            resolver: self.resolver,
            rules: &self.options.module.rules,
        };

        for (name, entry) in self.options.entry.points() {
            let path = self.resolver.resolve_entry(&self.options.context, entry)?;
            debug!(entry = name, path = %path.display(), "building entry");

            let entry_module = self.graph.build_entry(&builder, name, &path)?;
            let modules = self
                .graph
                .modules()
                .iter()
                .filter(|module| module.names.iter().any(|n| n == name))
                .map(|module| module.id.clone())
                .collect();

            self.chunks.push(Chunk {
                name: name.to_string(),
                entry_module,
                modules,
                filename: self.options.output.filename_for(name),
            });
        }

        for chunk in &self.chunks {
            if self.assets.contains_key(&chunk.filename) {
                return Err(ConfigError::DuplicateFilename(chunk.filename.clone()).into());
            }
            let Some(entry) = self.graph.module(&chunk.entry_module) else {
                continue;
            };
            let modules: Vec<&Module> = chunk
                .modules
                .iter()
                .filter_map(|id| self.graph.module(id))
                .collect();

            info!(chunk = %chunk.name, filename = %chunk.filename, modules = modules.len(), "emitting chunk");
            self.assets
                .insert(chunk.filename.clone(), render_chunk(entry, &modules));
        }

        Ok(Stats {
            chunks: self.chunks.clone(),
            modules: self.graph.modules().to_vec(),
            assets: self.assets.clone(),
            file_dependencies: self.graph.touched().clone(),
        })
    }

    /// Files touched so far, also after a failed build.
    pub fn into_file_dependencies(self) -> BTreeSet<PathBuf> {
        self.graph.into_parts().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundleError;
    use crate::options::Entry;
    use std::fs;
    use std::path::Path;

    fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for (name, contents) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        (dir, root)
    }

    #[test]
    fn test_single_entry() {
        let (_dir, root) = project(&[
            ("src/a.js", "export default require('./b').value + 1"),
            ("src/b.js", "module.exports = { value: 41 };"),
        ]);
        let options = BundlerOptions::new("./src/a").with_context(&root);
        let resolver = Resolver::default();

        let stats = Compilation::new(&options, &resolver).build().unwrap();

        let chunk = stats.chunk("main").unwrap();
        assert_eq!(chunk.entry_module, "./src/a.js");
        assert_eq!(chunk.modules, vec!["./src/b.js", "./src/a.js"]);
        assert_eq!(chunk.filename, "main.js");

        let bundle = stats.asset("main.js").unwrap();
        assert!(bundle.contains("exports.default = require(\"./src/b.js\").value + 1;"));
        assert!(!bundle.contains("'./b'"));
        assert_eq!(
            stats.file_dependencies().iter().cloned().collect::<Vec<_>>(),
            vec![root.join("src/a.js"), root.join("src/b.js")]
        );
    }

    #[test]
    fn test_named_entries_get_their_own_chunks() {
        let (_dir, root) = project(&[
            ("one.js", "require('./util');"),
            ("two.js", "require('./util');"),
            ("util.js", "exports.n = 1;"),
        ]);
        let options = BundlerOptions::new(Entry::Named(vec![
            ("one".to_string(), PathBuf::from("one.js")),
            ("two".to_string(), PathBuf::from("two.js")),
        ]))
        .with_context(&root)
        .with_filename("[name].bundle.js");
        let resolver = Resolver::default();

        let stats = Compilation::new(&options, &resolver).build().unwrap();

        assert_eq!(stats.modules.len(), 3);
        assert_eq!(stats.chunk("one").unwrap().modules, vec!["./util.js", "./one.js"]);
        assert_eq!(stats.chunk("two").unwrap().modules, vec!["./util.js", "./two.js"]);
        for filename in ["one.bundle.js", "two.bundle.js"] {
            assert!(stats.asset(filename).unwrap().contains("\"./util.js\": (function"));
        }
    }

    #[test]
    fn test_filename_collision() {
        let (_dir, root) = project(&[("a.js", ""), ("b.js", "")]);
        let options = BundlerOptions::new(Entry::Named(vec![
            ("a".to_string(), PathBuf::from("a.js")),
            ("b".to_string(), PathBuf::from("b.js")),
        ]))
        .with_context(&root)
        .with_filename("bundle.js");
        let resolver = Resolver::default();

        assert!(matches!(
            Compilation::new(&options, &resolver).build(),
            Err(BundleError::Config(ConfigError::DuplicateFilename(name))) if name == "bundle.js"
        ));
    }

    #[test]
    fn test_missing_entry() {
        let (_dir, root) = project(&[]);
        let options = BundlerOptions::new("./nope").with_context(&root);
        let resolver = Resolver::default();

        let mut compilation = Compilation::new(&options, &resolver);
        let err = compilation.build().unwrap_err();
        assert!(err.to_string().contains("./nope"));
        assert!(compilation.into_file_dependencies().is_empty());
    }

    #[test]
    fn test_touched_files_survive_failure() {
        let (_dir, root) = project(&[("a.js", "require('./b');"), ("b.js", "require(")]);
        let options = BundlerOptions::new("a.js").with_context(&root);
        let resolver = Resolver::default();

        let mut compilation = Compilation::new(&options, &resolver);
        assert!(matches!(compilation.build(), Err(BundleError::Parse { .. })));
        let touched = compilation.into_file_dependencies();
        assert!(touched.contains(Path::new(&root.join("b.js"))));
    }
}
