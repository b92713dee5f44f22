//! Module resolution for `require` and `import` specifiers
//!
//! Relative and absolute specifiers are probed on disk with the configured
//! extensions. Bare package names are looked up in `node_modules`
//! directories, walking up from the importing file.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::ResolveError;
use crate::package_json::parse_package_json;
use crate::paths::absolutize;

/// Resolves module specifiers to canonical file paths.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Extensions appended to a bare path, in probe order
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve `specifier` as requested from the file `importer`.
    pub fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf, ResolveError> {
        let from_dir = importer.parent().unwrap_or_else(|| Path::new("/"));
        let mut attempted = Vec::new();

        let found = if is_relative(specifier) || Path::new(specifier).is_absolute() {
            self.probe(&absolutize(from_dir, Path::new(specifier)), &mut attempted)
        } else {
            self.resolve_package(specifier, from_dir, &mut attempted)?
        };

        match found {
            Some(path) => {
                trace!(specifier, path = %path.display(), "resolved");
                Ok(canonical(path))
            }
            None => Err(ResolveError::NotFound {
                specifier: specifier.to_string(),
                importer: Some(importer.to_path_buf()),
                attempted,
            }),
        }
    }

    /// Resolve an entry point path against the project context.
    pub fn resolve_entry(&self, context: &Path, entry: &Path) -> Result<PathBuf, ResolveError> {
        let mut attempted = Vec::new();
        match self.probe(&absolutize(context, entry), &mut attempted) {
            Some(path) => Ok(canonical(path)),
            None => Err(ResolveError::NotFound {
                specifier: entry.display().to_string(),
                importer: None,
                attempted,
            }),
        }
    }

    /// Tries the bare path, then each extension, then `index` plus each
    /// extension inside the path as a directory. Every candidate is
    /// recorded in `attempted`.
    fn probe(&self, target: &Path, attempted: &mut Vec<PathBuf>) -> Option<PathBuf> {
        attempted.push(target.to_path_buf());
        if target.is_file() {
            return Some(target.to_path_buf());
        }

        for ext in &self.extensions {
            let candidate = with_suffix(target, ext);
            if candidate.is_file() {
                return Some(candidate);
            }
            attempted.push(candidate);
        }

        if target.is_dir() {
            let index = target.join("index");
            for ext in &self.extensions {
                let candidate = with_suffix(&index, ext);
                if candidate.is_file() {
                    return Some(candidate);
                }
                attempted.push(candidate);
            }
        }

        None
    }

    /// Node-style lookup of a bare specifier such as `lodash/fp` or
    /// `@scope/pkg`.
    fn resolve_package(
        &self,
        specifier: &str,
        from_dir: &Path,
        attempted: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let (pkg_name, subpath) = parse_package_specifier(specifier);

        for dir in from_dir.ancestors() {
            let package_dir = dir.join("node_modules").join(pkg_name);
            if !package_dir.is_dir() {
                attempted.push(package_dir);
                continue;
            }
            return self.resolve_package_entry(&package_dir, subpath, attempted);
        }

        Ok(None)
    }

    fn resolve_package_entry(
        &self,
        package_dir: &Path,
        subpath: Option<&str>,
        attempted: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if let Some(sub) = subpath {
            return Ok(self.probe(&absolutize(package_dir, Path::new(sub)), attempted));
        }

        let package_json_path = package_dir.join("package.json");
        if package_json_path.is_file() {
            let pkg = parse_package_json(&package_json_path)?;
            if let Some(main) = &pkg.main {
                if let Some(found) = self.probe(&absolutize(package_dir, Path::new(main)), attempted) {
                    return Ok(Some(found));
                }
            }
        }

        // Fallback: index files
        Ok(self.probe(&package_dir.join("index"), attempted))
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![".js".to_string()])
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Appends `suffix` to the file name; `Path::with_extension` would replace
/// an existing extension such as the `.test` in `a.test`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

fn canonical(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

/// Split a package specifier into package name and subpath
///
/// Examples:
/// - "lodash" → ("lodash", None)
/// - "lodash/fp" → ("lodash", Some("fp"))
/// - "@scope/pkg" → ("@scope/pkg", None)
/// - "@scope/pkg/sub" → ("@scope/pkg", Some("sub"))
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let split_at = if specifier.starts_with('@') {
        specifier.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        specifier.find('/')
    };

    match split_at {
        Some(pos) => (&specifier[..pos], Some(&specifier[pos + 1..])),
        None => (specifier, None),
    }
}
