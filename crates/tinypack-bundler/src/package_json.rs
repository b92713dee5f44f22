//! package.json reader
//!
//! Only the fields module resolution looks at are kept.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ResolveError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    pub main: Option<String>,
}

/// Parse a package.json file
pub fn parse_package_json(path: &Path) -> Result<PackageJson, ResolveError> {
    let content = fs::read_to_string(path).map_err(|e| ResolveError::PackageJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_package_json_str(&content).map_err(|e| ResolveError::PackageJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse package.json from string content
fn parse_package_json_str(content: &str) -> Result<PackageJson, serde_json::Error> {
    serde_json::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_package_json() {
        let json = r#"{
            "name": "left-pad",
            "version": "1.3.0",
            "main": "lib/index.js",
            "dependencies": { "other": "^1.0.0" }
        }"#;

        let pkg = parse_package_json_str(json).unwrap();
        assert_eq!(pkg.main, Some("lib/index.js".to_string()));
    }

    #[test]
    fn test_missing_fields_default() {
        let pkg = parse_package_json_str("{}").unwrap();
        assert_eq!(pkg.main, None);
    }

    #[test]
    fn test_malformed_package_json() {
        assert!(parse_package_json_str("{ \"main\": ").is_err());
    }
}
