//! Source transforms applied before parsing

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::error::{BoxError, BundleError};
use crate::paths::to_unix_path;

type TransformFn = dyn Fn(&str) -> Result<String, BoxError> + Send + Sync;

/// A named text-to-text function.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, source: &str) -> Result<String, BoxError> {
        (self.func)(source)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

/// Transforms to run on every file whose path matches `test`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub test: Regex,
    pub use_: Vec<Transform>,
}

impl Rule {
    pub fn new(test: Regex, use_: Vec<Transform>) -> Self {
        Self { test, use_ }
    }

    /// Matched against the path with `/` separators.
    pub fn matches(&self, path: &Path) -> bool {
        self.test.is_match(&to_unix_path(path))
    }
}

/// Runs the transforms of every matching rule over `source`.
///
/// Transforms are collected in configuration order and applied from last to
/// first, so the first transform listed produces the final text.
pub fn run_transforms(rules: &[Rule], path: &Path, source: String) -> Result<String, BundleError> {
    let transforms: Vec<&Transform> = rules
        .iter()
        .filter(|rule| rule.matches(path))
        .flat_map(|rule| rule.use_.iter())
        .collect();

    transforms.into_iter().rev().try_fold(source, |code, transform| {
        debug!(transform = transform.name(), path = %path.display(), "applying transform");
        transform
            .apply(&code)
            .map_err(|source| BundleError::Transform {
                transform: transform.name().to_string(),
                path: path.to_path_buf(),
                source,
            })
    })
}
