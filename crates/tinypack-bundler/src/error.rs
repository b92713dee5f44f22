//! Error types for a bundling pass

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tinypack_ast::Span;
use tinypack_parser::ParseError;

use crate::rewrite::EditConflict;

/// Error type returned by user transforms and hook taps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for bundler operations
pub type Result<T> = std::result::Result<T, BundleError>;

/// Failure to map a module specifier to a file on disk.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{}", not_found_message(specifier, importer.as_deref(), attempted))]
    NotFound {
        specifier: String,
        /// `None` for entry points.
        importer: Option<PathBuf>,
        attempted: Vec<PathBuf>,
    },

    #[error(
        "require() in {} at {}..{} must take a single string literal argument",
        importer.display(),
        span.start,
        span.end
    )]
    DynamicSpecifier { importer: PathBuf, span: Span },

    #[error("Invalid package.json at {}: {message}", path.display())]
    PackageJson { path: PathBuf, message: String },
}

fn not_found_message(specifier: &str, importer: Option<&Path>, attempted: &[PathBuf]) -> String {
    let mut message = match importer {
        Some(importer) => format!(
            "Module not found: can't resolve '{}' from {}",
            specifier,
            importer.display()
        ),
        None => format!("Module not found: can't resolve entry '{}'", specifier),
    };
    if !attempted.is_empty() {
        message.push_str(" (tried ");
        let tried: Vec<String> = attempted.iter().map(|p| p.display().to_string()).collect();
        message.push_str(&tried.join(", "));
        message.push(')');
    }
    message
}

/// A hook tap failed; the remaining taps did not run.
#[derive(Error, Debug)]
#[error("{hook} hook tap '{tap}' failed: {source}")]
pub struct HookError {
    pub hook: &'static str,
    pub tap: String,
    #[source]
    pub source: BoxError,
}

/// Problems loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No entry point configured")]
    MissingEntry,

    #[error("Invalid entry '{0}': expected name=path")]
    InvalidEntry(String),

    #[error("Duplicate entry name '{0}'")]
    DuplicateEntry(String),

    #[error("Several chunks would be written to '{0}'; use [name] in output.filename")]
    DuplicateFilename(String),

    #[error("Context directory {} is not accessible: {source}", path.display())]
    Context {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Any failure that aborts a compilation pass.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{}", parse_message(path, errors))]
    Parse {
        path: PathBuf,
        /// Transformed text the spans in `errors` point into.
        source_text: String,
        errors: Vec<ParseError>,
    },

    #[error("Transform '{transform}' failed on {}: {source}", path.display())]
    Transform {
        transform: String,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to rewrite {}: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: EditConflict,
    },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

fn parse_message(path: &Path, errors: &[ParseError]) -> String {
    let mut message = format!("Failed to parse {}", path.display());
    if let Some(first) = errors.first() {
        message.push_str(&format!(": {}", first));
    }
    if errors.len() > 1 {
        message.push_str(&format!(" (and {} more)", errors.len() - 1));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_specifier_and_attempts() {
        let err = ResolveError::NotFound {
            specifier: "./missing".to_string(),
            importer: Some(PathBuf::from("/src/a.js")),
            attempted: vec![PathBuf::from("/src/missing"), PathBuf::from("/src/missing.js")],
        };
        let message = err.to_string();
        assert!(message.contains("'./missing'"));
        assert!(message.contains("/src/a.js"));
        assert!(message.contains("/src/missing.js"));
    }

    #[test]
    fn test_parse_error_summary() {
        let err = BundleError::Parse {
            path: PathBuf::from("bad.js"),
            source_text: "let = ;".to_string(),
            errors: vec![
                ParseError {
                    message: "Expected pattern, found Eq".to_string(),
                    span: Span::new(4, 5),
                },
                ParseError {
                    message: "Unexpected token".to_string(),
                    span: Span::new(6, 7),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse bad.js: Expected pattern, found Eq at 4..5 (and 1 more)"
        );
    }
}
