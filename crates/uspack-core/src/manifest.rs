//! Project metadata descriptor.
//!
//! The descriptor is the source of truth for the production banner. It is
//! loaded once per build invocation and never mutated by the pipeline.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Script author, as declared in the descriptor.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Display name used for the `@author` banner field.
    pub name: String,
}

/// Read-only project metadata, deserialized from `package.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Script name; also names the production artifact.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Script author.
    pub author: Author,
    /// Version string, surfaced verbatim in the banner.
    pub version: String,
}

impl PackageDescriptor {
    /// Load the descriptor from a `package.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the file cannot be read or is missing
    /// any of the required fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&raw).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_descriptor() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(
            &path,
            r#"{
                "name": "page-armor",
                "description": "Hardens a listing page",
                "author": { "name": "someone" },
                "version": "1.2.3"
            }"#,
        )
        .unwrap();

        let pkg = PackageDescriptor::load(&path).unwrap();
        assert_eq!(pkg.name, "page-armor");
        assert_eq!(pkg.author.name, "someone");
        assert_eq!(pkg.version, "1.2.3");
    }

    #[test]
    fn test_missing_field_is_manifest_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{ "name": "x", "version": "0.1.0" }"#).unwrap();

        let err = PackageDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }

    #[test]
    fn test_missing_file_is_manifest_error() {
        let err = PackageDescriptor::load("/nonexistent/package.json").unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }
}
