//! Module graph construction
//!
//! Every module reachable from an entry point is read, transformed, parsed,
//! analyzed and rewritten exactly once per pass. The walk is depth-first and
//! uses an explicit stack, so a module lands in the module list after all of
//! its dependencies.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::analyze::analyze;
use crate::error::{BundleError, Result};
use crate::paths::module_id;
use crate::resolver::Resolver;
use crate::rewrite::apply_edits;
use crate::transform::{run_transforms, Rule};

/// A resolved dependency of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Logical id written into the rewritten source
    pub id: String,
    /// Absolute path of the file the specifier resolved to
    pub path: PathBuf,
}

/// A built module
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub id: String,
    #[serde(skip)]
    pub path: PathBuf,
    /// Names of the entry points that reach this module
    pub names: Vec<String>,
    /// One record per import site, in source order
    pub dependencies: Vec<Dependency>,
    /// Transformed source with every specifier replaced by a logical id
    pub source: String,
}

/// Read-only inputs shared by every module built in a pass.
pub struct GraphBuilder<'a> {
    pub context: &'a Path,
    pub resolver: &'a Resolver,
    pub rules: &'a [Rule],
}

impl GraphBuilder<'_> {
    /// Reads, transforms, parses and rewrites the file at `path`.
    fn load(
        &self,
        name: &str,
        path: &Path,
        id: String,
        touched: &mut BTreeSet<PathBuf>,
    ) -> Result<Module> {
        let raw = fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let code = run_transforms(self.rules, path, raw)?;

        let program = tinypack_parser::parse_module(&code).map_err(|errors| BundleError::Parse {
            path: path.to_path_buf(),
            source_text: code.clone(),
            errors,
        })?;

        let analysis = analyze(&program, &code, path)?;

        let mut dependencies = Vec::with_capacity(analysis.requests.len());
        for request in &analysis.requests {
            let dep_path = self.resolver.resolve(&request.specifier, path)?;
            let dep_id = module_id(self.context, &dep_path);
            debug!(from = %id, specifier = %request.specifier, to = %dep_id, "resolved dependency");
            touched.insert(dep_path.clone());
            dependencies.push(Dependency {
                id: dep_id,
                path: dep_path,
            });
        }

        let ids: Vec<String> = dependencies.iter().map(|dep| dep.id.clone()).collect();
        let source = apply_edits(&code, analysis.into_edits(&ids)).map_err(|source| {
            BundleError::Rewrite {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(id = %id, dependencies = dependencies.len(), "built module");

        Ok(Module {
            id,
            path: path.to_path_buf(),
            names: vec![name.to_string()],
            dependencies,
            source,
        })
    }
}

/// A module whose dependencies are still being visited.
struct Frame {
    module: Module,
    next: usize,
}

/// State owned by one compilation pass.
#[derive(Debug, Default)]
pub struct BuildContext {
    modules: Vec<Module>,
    /// Logical id to position in `modules`
    index: HashMap<String, usize>,
    /// Modules on the current walk stack
    in_progress: HashSet<String>,
    /// Every file read or resolved during the pass
    touched: BTreeSet<PathBuf>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn touched(&self) -> &BTreeSet<PathBuf> {
        &self.touched
    }

    pub fn into_parts(self) -> (Vec<Module>, BTreeSet<PathBuf>) {
        (self.modules, self.touched)
    }

    /// Builds the graph below the entry file `path` for the entry point
    /// `name` and returns the entry module's id.
    ///
    /// Modules already built for an earlier entry are not rebuilt; `name` is
    /// added to them and to everything they depend on.
    pub fn build_entry(&mut self, builder: &GraphBuilder, name: &str, path: &Path) -> Result<String> {
        self.touched.insert(path.to_path_buf());
        self.in_progress.clear();

        let entry_id = module_id(builder.context, path);
        if let Some(&existing) = self.index.get(&entry_id) {
            self.attribute(existing, name);
            return Ok(entry_id);
        }

        let entry = builder.load(name, path, entry_id.clone(), &mut self.touched)?;
        self.in_progress.insert(entry_id.clone());
        let mut stack = vec![Frame {
            module: entry,
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(dep) = frame.module.dependencies.get(frame.next) {
                frame.next += 1;

                if let Some(&existing) = self.index.get(&dep.id) {
                    self.attribute(existing, name);
                    continue;
                }
                // A cycle back to a module still on the stack
                if self.in_progress.contains(&dep.id) {
                    continue;
                }

                let (id, path) = (dep.id.clone(), dep.path.clone());
                let module = builder.load(name, &path, id.clone(), &mut self.touched)?;
                self.in_progress.insert(id);
                stack.push(Frame { module, next: 0 });
            } else if let Some(Frame { module, .. }) = stack.pop() {
                self.in_progress.remove(&module.id);
                self.index.insert(module.id.clone(), self.modules.len());
                self.modules.push(module);
            }
        }

        Ok(entry_id)
    }

    /// Adds `name` to the module at `start` and its dependency closure.
    fn attribute(&mut self, start: usize, name: &str) {
        let mut pending = vec![start];

        while let Some(i) = pending.pop() {
            let module = &mut self.modules[i];
            if module.names.iter().any(|n| n == name) {
                continue;
            }
            module.names.push(name.to_string());

            for dep in &module.dependencies {
                if let Some(&j) = self.index.get(&dep.id) {
                    pending.push(j);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Project {
        _dir: tempfile::TempDir,
        root: PathBuf,
        resolver: Resolver,
    }

    impl Project {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().canonicalize().unwrap();
            for (name, contents) in files {
                let path = root.join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, contents).unwrap();
            }
            Self {
                _dir: dir,
                root,
                resolver: Resolver::default(),
            }
        }

        fn builder(&self) -> GraphBuilder<'_> {
            GraphBuilder {
                context: &self.root,
                resolver: &self.resolver,
                rules: &[],
            }
        }

        fn build(&self, entries: &[(&str, &str)]) -> Result<BuildContext> {
            let mut ctx = BuildContext::new();
            for (name, file) in entries {
                ctx.build_entry(&self.builder(), name, &self.root.join(file))?;
            }
            Ok(ctx)
        }
    }

    fn ids(ctx: &BuildContext) -> Vec<&str> {
        ctx.modules().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_post_order() {
        let project = Project::new(&[
            ("src/a.js", "require('./b'); require('./c');"),
            ("src/b.js", "require('./d');"),
            ("src/c.js", "require('./d');"),
            ("src/d.js", ""),
        ]);
        let ctx = project.build(&[("main", "src/a.js")]).unwrap();
        assert_eq!(ids(&ctx), vec!["./src/d.js", "./src/b.js", "./src/c.js", "./src/a.js"]);

        let a = ctx.module("./src/a.js").unwrap();
        assert_eq!(a.source, "require(\"./src/b.js\"); require(\"./src/c.js\");");
        assert_eq!(a.dependencies[0].path, project.root.join("src/b.js"));
    }

    #[test]
    fn test_cycle_terminates() {
        let project = Project::new(&[
            ("a.js", "exports.a = 1; require('./b');"),
            ("b.js", "require('./a'); exports.b = 2;"),
        ]);
        let ctx = project.build(&[("main", "a.js")]).unwrap();
        assert_eq!(ids(&ctx), vec!["./b.js", "./a.js"]);
        assert_eq!(ctx.module("./b.js").unwrap().source, "require(\"./a.js\"); exports.b = 2;");
    }

    #[test]
    fn test_self_require() {
        let project = Project::new(&[("a.js", "module.exports = require('./a');")]);
        let ctx = project.build(&[("main", "a.js")]).unwrap();
        assert_eq!(ids(&ctx), vec!["./a.js"]);
    }

    #[test]
    fn test_shared_modules_are_built_once() {
        let project = Project::new(&[
            ("one.js", "require('./util');"),
            ("two.js", "require('./mid');"),
            ("mid.js", "require('./util');"),
            ("util.js", "require('./leaf');"),
            ("leaf.js", ""),
        ]);
        let ctx = project
            .build(&[("one", "one.js"), ("two", "two.js")])
            .unwrap();

        assert_eq!(ids(&ctx), vec!["./leaf.js", "./util.js", "./one.js", "./mid.js", "./two.js"]);
        assert_eq!(ctx.module("./util.js").unwrap().names, vec!["one", "two"]);
        // Attribution reaches the shared module's own dependencies
        assert_eq!(ctx.module("./leaf.js").unwrap().names, vec!["one", "two"]);
        assert_eq!(ctx.module("./mid.js").unwrap().names, vec!["two"]);
    }

    #[test]
    fn test_entry_reused_by_second_entry() {
        let project = Project::new(&[("a.js", "require('./b');"), ("b.js", "")]);
        let ctx = project.build(&[("first", "a.js"), ("second", "b.js")]).unwrap();
        assert_eq!(ids(&ctx), vec!["./b.js", "./a.js"]);
        assert_eq!(ctx.module("./b.js").unwrap().names, vec!["first", "second"]);
        assert_eq!(ctx.module("./a.js").unwrap().names, vec!["first"]);
    }

    #[test]
    fn test_repeated_attribution_is_idempotent() {
        let project = Project::new(&[
            ("a.js", "require('./u'); require('./u');"),
            ("b.js", "require('./u'); require('./u');"),
            ("u.js", ""),
        ]);
        let ctx = project.build(&[("a", "a.js"), ("b", "b.js")]).unwrap();
        assert_eq!(ctx.module("./u.js").unwrap().names, vec!["a", "b"]);
        assert_eq!(ctx.module("./a.js").unwrap().dependencies.len(), 2);
    }

    #[test]
    fn test_touched_files() {
        let project = Project::new(&[("a.js", "require('./b');"), ("b.js", "")]);
        let ctx = project.build(&[("main", "a.js")]).unwrap();
        let touched: Vec<PathBuf> = ctx.touched().iter().cloned().collect();
        assert_eq!(touched, vec![project.root.join("a.js"), project.root.join("b.js")]);
    }

    #[test]
    fn test_missing_dependency() {
        let project = Project::new(&[("a.js", "require('./missing');")]);
        match project.build(&[("main", "a.js")]) {
            Err(BundleError::Resolve(err)) => assert!(err.to_string().contains("./missing")),
            other => panic!("expected resolve error, got {:?}", other.map(|c| ids(&c).len())),
        }
    }

    #[test]
    fn test_parse_error_carries_source() {
        let project = Project::new(&[("a.js", "let = ;")]);
        match project.build(&[("main", "a.js")]) {
            Err(BundleError::Parse { source_text, errors, .. }) => {
                assert_eq!(source_text, "let = ;");
                assert!(!errors.is_empty());
            }
            other => panic!("expected parse error, got {:?}", other.map(|c| ids(&c).len())),
        }
    }
}
