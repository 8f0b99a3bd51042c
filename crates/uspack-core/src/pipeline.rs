//! Build pipeline orchestration and artifact assembly.
//!
//! One build pass is sequential: token table construction, module
//! resolution (token replacement and compilation happen per module), style
//! processing, linking, then minification and banner assembly in production.
//! Every artifact write is atomic (temp file plus rename in the target
//! directory), so a rebuild racing a slow prior pass can overwrite but never
//! tear an artifact. A failed pass writes nothing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::banner;
use crate::bundle::{BundleOptions, Bundler, ModuleGraph};
use crate::compile::{ComponentCompiler, SourceCompiler};
use crate::error::Result;
use crate::icons::IconCatalog;
use crate::manifest::PackageDescriptor;
use crate::minify::Minifier;
use crate::mode::BuildMode;
use crate::project::ProjectLayout;
use crate::styles::{StyleChain, StyleContext};
use crate::tokens::{TokenReplacer, TokenTable};

/// The files written by one successful build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// The bundle itself.
    pub bundle: PathBuf,
    /// Development source map, if any.
    pub source_map: Option<PathBuf>,
    /// Development stylesheet, if any.
    pub stylesheet: Option<PathBuf>,
}

/// The uspack build pipeline.
pub struct BuildPipeline {
    mode: BuildMode,
    layout: ProjectLayout,
    catalog: IconCatalog,
    compiler: Box<dyn SourceCompiler + Send + Sync>,
    styles: StyleChain,
    bundle_options: BundleOptions,
    minifier: Minifier,
}

impl BuildPipeline {
    /// Pipeline for the project at `root`, built in `mode`.
    pub fn new(root: impl Into<PathBuf>, mode: BuildMode) -> Self {
        Self {
            mode,
            layout: ProjectLayout::new(root),
            catalog: IconCatalog::builtin(),
            compiler: Box::new(ComponentCompiler::new()),
            styles: StyleChain::standard(),
            bundle_options: BundleOptions::default(),
            minifier: Minifier::new(),
        }
    }

    /// Replace the source compiler seam.
    pub fn with_compiler(mut self, compiler: Box<dyn SourceCompiler + Send + Sync>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Current build mode.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Project layout.
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run one build pass.
    ///
    /// # Errors
    ///
    /// Fatal on manifest, compile, style or bundle errors; no partial
    /// artifact is written in that case.
    pub fn run(&self) -> Result<BuildArtifact> {
        let pkg = PackageDescriptor::load(self.layout.manifest())?;

        let table = self.token_table(&pkg)?;
        let replacer = TokenReplacer::new(&table);

        let bundler = Bundler::new(
            self.compiler.as_ref(),
            &replacer,
            &self.layout,
            self.bundle_options.clone(),
        );
        let graph = bundler.resolve()?;
        tracing::debug!(modules = graph.module_paths().len(), "module graph resolved");

        let css = self.styles.process(
            &graph.css,
            &StyleContext {
                mode: self.mode,
                project_root: self.layout.root().to_path_buf(),
            },
        )?;

        match self.mode {
            BuildMode::Production => self.assemble_production(&pkg, &bundler, &graph, &css),
            BuildMode::Development => self.assemble_development(&pkg, &bundler, &graph, &css),
        }
    }

    /// Build the token table for this pass: icon tokens, the environment
    /// mode literal and the banner-art token.
    fn token_table(&self, pkg: &PackageDescriptor) -> Result<TokenTable> {
        let mut table = TokenTable::new();
        self.catalog.register_tokens(&mut table)?;
        table.insert_env_mode(self.mode)?;
        table.insert_banner_art(self.mode, &pkg.name)?;
        Ok(table)
    }

    /// Production: minified bundle with inlined CSS and the metadata banner
    /// prepended after minification, so the minifier can never alter it.
    fn assemble_production(
        &self,
        pkg: &PackageDescriptor,
        bundler: &Bundler<'_>,
        graph: &ModuleGraph,
        css: &str,
    ) -> Result<BuildArtifact> {
        let linked = bundler.link(graph, Some(css));
        let minified = self.minifier.minify(&linked);

        let mut out = banner::render(pkg);
        out.push_str(&minified);

        let bundle = self.layout.bundle_path(self.mode, &pkg.name);
        write_atomic(&bundle, out.as_bytes())?;
        tracing::info!(path = %bundle.display(), "production artifact written");

        Ok(BuildArtifact {
            bundle,
            source_map: None,
            stylesheet: None,
        })
    }

    /// Development: unminified bundle, no banner, sibling source map and
    /// stylesheet files.
    fn assemble_development(
        &self,
        pkg: &PackageDescriptor,
        bundler: &Bundler<'_>,
        graph: &ModuleGraph,
        css: &str,
    ) -> Result<BuildArtifact> {
        let mut linked = bundler.link(graph, None);
        linked.push_str("//# sourceMappingURL=bundle.js.map\n");

        let bundle = self.layout.bundle_path(self.mode, &pkg.name);
        write_atomic(&bundle, linked.as_bytes())?;

        let map = self.source_map(graph)?;
        let map_path = self.layout.source_map_path();
        write_atomic(&map_path, map.as_bytes())?;

        let css_path = self.layout.stylesheet_path();
        write_atomic(&css_path, css.as_bytes())?;

        tracing::info!(path = %bundle.display(), "development artifact written");

        Ok(BuildArtifact {
            bundle,
            source_map: Some(map_path),
            stylesheet: Some(css_path),
        })
    }

    /// Version-3 source map stub listing the bundled sources.
    ///
    /// The compiler seam is opaque, so no mappings are emitted; the file
    /// exists to satisfy the development artifact contract and keep dev
    /// tooling quiet.
    fn source_map(&self, graph: &ModuleGraph) -> Result<String> {
        let root = self.layout.root().canonicalize()?;
        let sources: Vec<String> = graph
            .module_paths()
            .iter()
            .map(|p| {
                p.strip_prefix(&root)
                    .unwrap_or(p)
                    .display()
                    .to_string()
            })
            .collect();

        let map = serde_json::json!({
            "version": 3,
            "file": "bundle.js",
            "sources": sources,
            "names": [],
            "mappings": "",
        });
        Ok(serde_json::to_string(&map)?)
    }
}

/// Write `contents` atomically: temp file in the target directory, then
/// rename over the destination.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".to_string());
    let tmp = dir.join(format!(".{file_name}.tmp"));

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out").join("bundle.js");

        write_atomic(&target, b"one").unwrap();
        write_atomic(&target, b"two").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "two");
        let siblings: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings.len(), 1);
    }
}
