//! Core build pipeline for uspack userscript bundles.
//!
//! This crate provides:
//! - Token table construction and single-pass literal replacement
//! - Source compilation seam for component and logic modules
//! - Module graph resolution and IIFE linking
//! - The mode-dependent stylesheet chain
//! - Comment-policy-aware minification and banner assembly

pub mod banner;
pub mod bundle;
pub mod compile;
pub mod error;
pub mod icons;
pub mod manifest;
pub mod minify;
pub mod mode;
pub mod pipeline;
pub mod project;
pub mod styles;
pub mod tokens;

pub use banner::MetaTag;
pub use bundle::{BundleOptions, Bundler, ModuleGraph};
pub use compile::{CompiledUnit, ComponentCompiler, SourceCompiler};
pub use error::{Error, Result};
pub use icons::{Icon, IconCatalog};
pub use manifest::PackageDescriptor;
pub use minify::Minifier;
pub use mode::BuildMode;
pub use pipeline::{BuildArtifact, BuildPipeline};
pub use project::ProjectLayout;
pub use styles::{StyleChain, StyleContext};
pub use tokens::{TokenReplacer, TokenTable};
