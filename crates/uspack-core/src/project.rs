//! Fixed project layout.
//!
//! All pipeline inputs and outputs live at fixed paths under the project
//! root; only the artifact paths differ by mode.

use std::path::{Path, PathBuf};

use crate::mode::BuildMode;

/// Paths of one uspack project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source directory watched in development.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Fixed entry-point module.
    pub fn entry(&self) -> PathBuf {
        self.root.join("src").join("main.js")
    }

    /// Project metadata descriptor.
    pub fn manifest(&self) -> PathBuf {
        self.root.join("package.json")
    }

    /// Directory for singleton bare-specifier modules.
    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join("vendor")
    }

    /// Directory served by the development server.
    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    /// Bundle path for `mode`. The production artifact is named after the
    /// package; the development bundle has a fixed name under `public/dist`.
    pub fn bundle_path(&self, mode: BuildMode, package_name: &str) -> PathBuf {
        match mode {
            BuildMode::Production => self
                .public_dir()
                .join(format!("{package_name}.user.js")),
            BuildMode::Development => self.public_dir().join("dist").join("bundle.js"),
        }
    }

    /// Development source-map path (sibling of the dev bundle).
    pub fn source_map_path(&self) -> PathBuf {
        self.public_dir().join("dist").join("bundle.js.map")
    }

    /// Development stylesheet path (sibling of the dev bundle).
    pub fn stylesheet_path(&self) -> PathBuf {
        self.public_dir().join("dist").join("bundle.css")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths_differ_by_mode() {
        let layout = ProjectLayout::new("/proj");
        assert_eq!(
            layout.bundle_path(BuildMode::Production, "armor"),
            PathBuf::from("/proj/public/armor.user.js")
        );
        assert_eq!(
            layout.bundle_path(BuildMode::Development, "armor"),
            PathBuf::from("/proj/public/dist/bundle.js")
        );
        assert_eq!(layout.entry(), PathBuf::from("/proj/src/main.js"));
    }
}
