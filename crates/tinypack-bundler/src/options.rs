//! Bundler configuration
//!
//! [`BundlerOptions`] is the typed configuration the compiler consumes.
//! [`ConfigFile`] is its JSON form, which cannot carry transforms or
//! plugins.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::paths::absolutize;
use crate::plugin::Plugin;
use crate::transform::Rule;

/// Name given to the chunk of a single, unnamed entry.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// Placeholder replaced with the chunk name in output filenames.
pub const NAME_PLACEHOLDER: &str = "[name]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// One entry point, named [`DEFAULT_ENTRY_NAME`]
    Single(PathBuf),
    /// Named entry points, processed in the given order
    Named(Vec<(String, PathBuf)>),
}

impl Entry {
    /// `(name, path)` pairs in processing order.
    pub fn points(&self) -> Vec<(&str, &Path)> {
        match self {
            Entry::Single(path) => vec![(DEFAULT_ENTRY_NAME, path.as_path())],
            Entry::Named(entries) => entries
                .iter()
                .map(|(name, path)| (name.as_str(), path.as_path()))
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let points = self.points();
        if points.is_empty() {
            return Err(ConfigError::MissingEntry);
        }
        let mut seen = HashSet::new();
        for (name, _) in points {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateEntry(name.to_string()));
            }
        }
        Ok(())
    }
}

impl From<&str> for Entry {
    fn from(path: &str) -> Self {
        Entry::Single(PathBuf::from(path))
    }
}

impl From<PathBuf> for Entry {
    fn from(path: PathBuf) -> Self {
        Entry::Single(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Output directory; relative paths are taken from the context.
    /// Defaults to `<context>/dist`.
    pub path: Option<PathBuf>,
    pub filename: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: None,
            filename: format!("{}.js", NAME_PLACEHOLDER),
        }
    }
}

impl OutputOptions {
    /// Output filename of the chunk `name`.
    pub fn filename_for(&self, name: &str) -> String {
        self.filename.replace(NAME_PLACEHOLDER, name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleOptions {
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub extensions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string()],
        }
    }
}

pub struct BundlerOptions {
    /// Project root: entry paths and logical ids are relative to it
    pub context: PathBuf,
    pub entry: Entry,
    pub output: OutputOptions,
    pub module: ModuleOptions,
    pub resolve: ResolveOptions,
    pub plugins: Vec<Box<dyn Plugin>>,
}

impl BundlerOptions {
    /// Options with every default filled in and the current directory as
    /// context.
    pub fn new(entry: impl Into<Entry>) -> Self {
        Self {
            context: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            entry: entry.into(),
            output: OutputOptions::default(),
            module: ModuleOptions::default(),
            resolve: ResolveOptions::default(),
            plugins: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.path = Some(path.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.output.filename = filename.into();
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.module.rules.push(rule);
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.resolve.extensions = extensions;
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        match &self.output.path {
            Some(path) => absolutize(&self.context, path),
            None => self.context.join("dist"),
        }
    }
}

impl fmt::Debug for BundlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("BundlerOptions")
            .field("context", &self.context)
            .field("entry", &self.entry)
            .field("output", &self.output)
            .field("module", &self.module)
            .field("resolve", &self.resolve)
            .field("plugins", &plugins)
            .finish()
    }
}

/// JSON configuration file, e.g. `tinypack.json`:
///
/// ```json
/// {
///   "entry": { "app": "./src/app.js", "admin": "./src/admin.js" },
///   "output": { "path": "build", "filename": "[name].bundle.js" },
///   "resolve": { "extensions": [".js", ".mjs"] }
/// }
/// ```
///
/// Relative paths are taken from the directory holding the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub context: Option<PathBuf>,
    pub entry: Option<EntryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(PathBuf),
    /// Object form; key order is kept
    Named(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    pub extensions: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Converts to options, resolving relative paths against `base_dir`.
    ///
    /// A file without `entry` yields no entry points; callers are expected
    /// to supply them before compiling.
    pub fn into_options(self, base_dir: &Path) -> Result<BundlerOptions, ConfigError> {
        let entry = match self.entry {
            None => Entry::Named(Vec::new()),
            Some(EntryConfig::Single(path)) => Entry::Single(path),
            Some(EntryConfig::Named(map)) => {
                let mut entries = Vec::with_capacity(map.len());
                for (name, value) in map {
                    match value {
                        serde_json::Value::String(path) => entries.push((name, PathBuf::from(path))),
                        _ => return Err(ConfigError::InvalidEntry(name)),
                    }
                }
                let entry = Entry::Named(entries);
                entry.validate()?;
                entry
            }
        };

        let context = match self.context {
            Some(context) => absolutize(base_dir, &context),
            None => base_dir.to_path_buf(),
        };

        let mut options = BundlerOptions::new(entry).with_context(context);
        if let Some(path) = self.output.path {
            options.output.path = Some(absolutize(base_dir, &path));
        }
        if let Some(filename) = self.output.filename {
            options.output.filename = filename;
        }
        if let Some(extensions) = self.resolve.extensions {
            options.resolve.extensions = extensions;
        }
        Ok(options)
    }
}

/// Parses a `name=path` entry argument.
pub fn parse_named_entry(arg: &str) -> Result<(String, PathBuf), ConfigError> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(ConfigError::InvalidEntry(arg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BundlerOptions::new("./src/index.js").with_context("/project");
        assert_eq!(options.entry.points(), vec![("main", Path::new("./src/index.js"))]);
        assert_eq!(options.output_dir(), PathBuf::from("/project/dist"));
        assert_eq!(options.output.filename, "[name].js");
        assert_eq!(options.resolve.extensions, vec![".js"]);
    }

    #[test]
    fn test_filename_template() {
        let output = OutputOptions {
            path: None,
            filename: "[name]/[name].bundle.js".to_string(),
        };
        assert_eq!(output.filename_for("app"), "app/app.bundle.js");
    }

    #[test]
    fn test_relative_output_path() {
        let options = BundlerOptions::new("a.js")
            .with_context("/project")
            .with_output_path("../out");
        assert_eq!(options.output_dir(), PathBuf::from("/out"));
    }

    #[test]
    fn test_duplicate_entry_names() {
        let entry = Entry::Named(vec![
            ("a".to_string(), PathBuf::from("a.js")),
            ("a".to_string(), PathBuf::from("b.js")),
        ]);
        assert!(matches!(entry.validate(), Err(ConfigError::DuplicateEntry(name)) if name == "a"));
        assert!(matches!(Entry::Named(Vec::new()).validate(), Err(ConfigError::MissingEntry)));
    }

    #[test]
    fn test_config_file_named_entries_keep_order() {
        let config = ConfigFile::from_json(
            r#"{
                "entry": { "zeta": "./z.js", "alpha": "./a.js" },
                "output": { "path": "build", "filename": "[name].bundle.js" },
                "resolve": { "extensions": [".mjs", ".js"] }
            }"#,
        )
        .unwrap();
        let options = config.into_options(Path::new("/project")).unwrap();

        let names: Vec<&str> = options.entry.points().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(options.context, PathBuf::from("/project"));
        assert_eq!(options.output_dir(), PathBuf::from("/project/build"));
        assert_eq!(options.output.filename, "[name].bundle.js");
        assert_eq!(options.resolve.extensions, vec![".mjs", ".js"]);
    }

    #[test]
    fn test_config_file_errors() {
        assert!(ConfigFile::from_json(r#"{ "entries": "./a.js" }"#).is_err());

        let config = ConfigFile::from_json(r#"{ "output": {} }"#).unwrap();
        let options = config.into_options(Path::new("/p")).unwrap();
        assert!(matches!(options.entry.validate(), Err(ConfigError::MissingEntry)));

        let config = ConfigFile::from_json(r#"{ "entry": { "a": 1 } }"#).unwrap();
        assert!(matches!(
            config.into_options(Path::new("/p")),
            Err(ConfigError::InvalidEntry(name)) if name == "a"
        ));
    }

    #[test]
    fn test_parse_named_entry() {
        assert_eq!(
            parse_named_entry("admin=./src/admin.js").unwrap(),
            ("admin".to_string(), PathBuf::from("./src/admin.js"))
        );
        assert!(parse_named_entry("admin").is_err());
        assert!(parse_named_entry("=x.js").is_err());
    }
}
