//! End-to-end tests for the bundler

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use regex::Regex;
use tinypack_bundler::{
    BundleError, BundlerOptions, Compiler, CompilerHooks, Entry, MemoryWatcher, Plugin,
    ResolveError, Rule, Stats, Transform,
};

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let project = Self { _dir: dir, root };
        for (name, contents) in files {
            project.write(name, contents);
        }
        project
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn options(&self, entry: impl Into<Entry>) -> BundlerOptions {
        BundlerOptions::new(entry).with_context(&self.root)
    }
}

/// Runs one pass and returns its result.
fn build(options: BundlerOptions) -> Result<Stats, String> {
    let mut compiler = Compiler::new(options).map_err(|e| e.to_string())?;
    let mut outcome = None;
    compiler
        .run(|result| {
            outcome = Some(result.cloned().map_err(|e| e.to_string()));
        })
        .map_err(|e| e.to_string())?;
    outcome.unwrap()
}

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn eval_default_export(bundle: &Path) -> String {
    let output = Command::new("node")
        .arg("-e")
        .arg(
            "const src = require('fs').readFileSync(process.argv[1], 'utf8');\
             process.stdout.write(String(eval(src).default));",
        )
        .arg(bundle)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

/// Evaluates `bundle` and returns its exports as JSON.
fn eval_exports_json(bundle: &Path) -> serde_json::Value {
    let output = Command::new("node")
        .arg("-e")
        .arg(
            "const src = require('fs').readFileSync(process.argv[1], 'utf8');\
             process.stdout.write(JSON.stringify(eval(src)));",
        )
        .arg(bundle)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_entry_with_one_dependency() {
    let project = Project::new(&[
        ("src/a.js", "export default require('./b').value + 1"),
        ("src/b.js", "module.exports = { value: 41 };"),
    ]);

    let stats = build(project.options("./src/a.js")).unwrap();

    let bundle = fs::read_to_string(project.path("dist/main.js")).unwrap();
    assert_eq!(stats.asset("main.js"), Some(bundle.as_str()));
    assert!(bundle.contains("\"./src/a.js\": (function (module, exports, require) {"));
    assert!(bundle.contains("\"./src/b.js\": (function (module, exports, require) {"));
    assert!(bundle.contains("require(\"./src/b.js\")"));
    assert!(!bundle.contains("require('./b')"));

    if node_available() {
        assert_eq!(eval_default_export(&project.path("dist/main.js")), "42");
    }
}

#[test]
fn test_esm_imports_run_under_node() {
    let project = Project::new(&[
        (
            "main.js",
            "import answer, { double } from './math';\n\
             import * as all from './math';\n\
             export default double(answer) + all.offset;\n",
        ),
        (
            "math.js",
            "export const offset = 2;\n\
             export function double(n) { return n * 2; }\n\
             export default 20;\n",
        ),
    ]);

    let stats = build(project.options("main.js")).unwrap();

    assert_eq!(stats.chunk("main").unwrap().modules, vec!["./math.js", "./main.js"]);
    if node_available() {
        assert_eq!(eval_default_export(&project.path("dist/main.js")), "42");
    }
}

#[test]
fn test_two_entries_share_a_module() {
    let project = Project::new(&[
        ("app.js", "module.exports = require('./lib/util').name + ':app';"),
        ("admin.js", "module.exports = require('./lib/util').name + ':admin';"),
        ("lib/util.js", "exports.name = 'util';"),
    ]);
    let options = BundlerOptions::new(Entry::Named(vec![
        ("app".to_string(), PathBuf::from("app.js")),
        ("admin".to_string(), PathBuf::from("admin.js")),
    ]))
    .with_context(&project.root)
    .with_output_path("build")
    .with_filename("[name].bundle.js");

    let stats = build(options).unwrap();

    let util = stats.module("./lib/util.js").unwrap();
    assert_eq!(util.names, vec!["app", "admin"]);
    assert_eq!(stats.modules.len(), 3);
    for name in ["app", "admin"] {
        let text = fs::read_to_string(project.path(&format!("build/{}.bundle.js", name))).unwrap();
        assert!(text.contains("\"./lib/util.js\": (function"));
    }
}

#[test]
fn test_shared_module_runs_once_per_chunk() {
    let project = Project::new(&[
        (
            "one.js",
            "var u = require('./util');\n\
             var again = require('./util');\n\
             var viaMid = require('./mid');\n\
             module.exports = { same: u === again && u === viaMid, n: u.n, log: globalThis.log };\n",
        ),
        (
            "two.js",
            "module.exports = { n: require('./util').n + 10, log: globalThis.log };\n",
        ),
        ("mid.js", "module.exports = require('./util');\n"),
        (
            "util.js",
            "(globalThis.log = globalThis.log || []).push('util');\n\
             module.exports = { n: 1 };\n",
        ),
    ]);
    let options = BundlerOptions::new(Entry::Named(vec![
        ("one".to_string(), PathBuf::from("one.js")),
        ("two".to_string(), PathBuf::from("two.js")),
    ]))
    .with_context(&project.root);

    let stats = build(options).unwrap();
    assert_eq!(
        stats.chunk("one").unwrap().modules,
        vec!["./util.js", "./mid.js", "./one.js"]
    );
    assert_eq!(stats.chunk("two").unwrap().modules, vec!["./util.js", "./two.js"]);

    if !node_available() {
        return;
    }
    let one = eval_exports_json(&project.path("dist/one.js"));
    assert_eq!(one["same"], true);
    assert_eq!(one["n"], 1);
    assert_eq!(one["log"], serde_json::json!(["util"]));

    let two = eval_exports_json(&project.path("dist/two.js"));
    assert_eq!(two["n"], 11);
    assert_eq!(two["log"], serde_json::json!(["util"]));
}

#[test]
fn test_missing_dependency_is_reported() {
    let project = Project::new(&[("a.js", "require('./missing');")]);
    let mut compiler = Compiler::new(project.options("a.js")).unwrap();

    let mut error = None;
    compiler
        .run(|result| {
            if let Err(BundleError::Resolve(ResolveError::NotFound { specifier, importer, .. })) = result {
                error = Some((specifier.clone(), importer.clone()));
            }
        })
        .unwrap();

    let (specifier, importer) = error.expect("resolve error");
    assert_eq!(specifier, "./missing");
    assert_eq!(importer, Some(project.path("a.js")));
    assert!(!project.path("dist/main.js").exists());
}

#[test]
fn test_transforms_apply_right_to_left() {
    let project = Project::new(&[("a.js", "var order = [];\n")]);
    let tag = |name: &'static str| {
        Transform::new(name, move |code| Ok(format!("{}order.push('{}');\n", code, name)))
    };
    let options = project
        .options("a.js")
        .with_rule(Rule::new(Regex::new(r"\.js$").unwrap(), vec![tag("outer"), tag("inner")]));

    let stats = build(options).unwrap();

    let source = &stats.module("./a.js").unwrap().source;
    assert_eq!(source, "var order = [];\norder.push('inner');\norder.push('outer');\n");
}

#[test]
fn test_failing_transform_names_itself() {
    let project = Project::new(&[("a.js", "")]);
    let options = project.options("a.js").with_rule(Rule::new(
        Regex::new(r"a\.js$").unwrap(),
        vec![Transform::new("broken", |_| Err("boom".into()))],
    ));

    let err = build(options).unwrap_err();
    assert!(err.contains("'broken'"));
    assert!(err.contains("boom"));
}

#[test]
fn test_output_is_deterministic() {
    let project = Project::new(&[
        ("a.js", "import { b } from './b';\nimport c from './c';\nexport default b + c;\n"),
        ("b.js", "export const b = require('./c');\n"),
        ("c.js", "module.exports = 3;\n"),
    ]);

    let first = build(project.options("a.js")).unwrap();
    let second = build(project.options("a.js")).unwrap();

    assert_eq!(first.assets, second.assets);
    assert_eq!(first.to_json(), second.to_json());
}

struct Recorder {
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn apply(&self, hooks: &mut CompilerHooks) {
        let log = Rc::clone(&self.log);
        hooks.run.tap(self.name(), move || {
            log.borrow_mut().push("run");
            Ok(())
        });
        let log = Rc::clone(&self.log);
        hooks.done.tap(self.name(), move || {
            log.borrow_mut().push("done");
            Ok(())
        });
    }
}

#[test]
fn test_hook_order() {
    let project = Project::new(&[("a.js", "")]);
    let log = Rc::new(RefCell::new(Vec::new()));
    let options = project.options("a.js").with_plugin(Recorder {
        log: Rc::clone(&log),
    });
    let mut compiler = Compiler::new(options).unwrap();

    compiler
        .run(|result| {
            assert!(project.path("dist/main.js").exists());
            assert!(result.is_ok());
            log.borrow_mut().push("callback");
        })
        .unwrap();

    assert_eq!(*log.borrow(), ["run", "callback", "done"]);
}

#[test]
fn test_failing_run_hook_aborts_the_pass() {
    let project = Project::new(&[("a.js", "")]);
    let mut compiler = Compiler::new(project.options("a.js")).unwrap();
    compiler.hooks_mut().run.tap("gate", || Err("not today".into()));

    let mut called = false;
    let err = compiler.run(|_| called = true).unwrap_err();

    assert!(matches!(err, BundleError::Hook(ref hook) if hook.tap == "gate"));
    assert!(!called);
    assert!(!project.path("dist/main.js").exists());
}

#[test]
fn test_watch_rebuilds_once_per_batch_and_drops_stale_watchers() {
    let project = Project::new(&[
        ("a.js", "require('./b');\nrequire('./c');\n"),
        ("b.js", ""),
        ("c.js", ""),
    ]);
    let handle = MemoryWatcher::new();
    let mut compiler = Compiler::new(project.options("a.js"))
        .unwrap()
        .with_watch_backend(handle.clone());

    let runs = Rc::new(Cell::new(0));
    let passes = Rc::new(Cell::new(0));
    {
        let runs = Rc::clone(&runs);
        compiler.hooks_mut().run.tap("count", move || {
            runs.set(runs.get() + 1);
            Ok(())
        });
    }
    {
        let passes = Rc::clone(&passes);
        let handle = handle.clone();
        let entry = project.path("a.js");
        compiler.hooks_mut().done.tap("edit", move || {
            passes.set(passes.get() + 1);
            if passes.get() == 1 {
                fs::write(&entry, "require('./b');\n")?;
                assert!(handle.touch(&entry));
                assert!(handle.touch(&entry));
            }
            Ok(())
        });
    }

    let mut results = Vec::new();
    let polls = Cell::new(0);
    compiler
        .watch(
            |result| results.push(result.map(|stats| stats.modules.len()).map_err(|e| e.to_string())),
            || {
                polls.set(polls.get() + 1);
                passes.get() >= 2 || polls.get() > 500
            },
        )
        .unwrap();

    assert_eq!(results, vec![Ok(3), Ok(2)]);
    assert_eq!(runs.get(), 1);
    assert_eq!(passes.get(), 2);

    let watched = handle.watched();
    assert!(watched.contains(&project.path("a.js")));
    assert!(watched.contains(&project.path("b.js")));
    assert!(!watched.contains(&project.path("c.js")));
    assert!(!handle.touch(project.path("c.js")));
}

#[test]
fn test_watch_recovers_after_a_failed_pass() {
    let project = Project::new(&[("a.js", "require('./b');\n"), ("b.js", "")]);
    let handle = MemoryWatcher::new();
    let mut compiler = Compiler::new(project.options("a.js"))
        .unwrap()
        .with_watch_backend(handle.clone());

    let passes = Rc::new(Cell::new(0));
    {
        let passes = Rc::clone(&passes);
        let handle = handle.clone();
        let dep = project.path("b.js");
        compiler.hooks_mut().done.tap("edit", move || {
            passes.set(passes.get() + 1);
            let contents = match passes.get() {
                1 => "module.exports = (;",
                2 => "module.exports = 1;",
                _ => return Ok(()),
            };
            fs::write(&dep, contents)?;
            handle.touch(&dep);
            Ok(())
        });
    }

    let mut outcomes = Vec::new();
    let polls = Cell::new(0);
    compiler
        .watch(
            |result| outcomes.push(result.is_ok()),
            || {
                polls.set(polls.get() + 1);
                passes.get() >= 3 || polls.get() > 500
            },
        )
        .unwrap();

    assert_eq!(outcomes, vec![true, false, true]);
}
