//! Build command implementation for the uspack CLI.
//!
//! Runs one pipeline pass and exits; a failed pass writes nothing and
//! surfaces a nonzero exit through `main`.

use std::path::Path;
use std::time::Instant;

use uspack_core::{BuildMode, BuildPipeline};

use crate::colors;

/// Execute the build command.
pub fn execute(project_root: &str, mode: BuildMode) -> anyhow::Result<()> {
    let root = Path::new(project_root);
    if !root.is_dir() {
        anyhow::bail!("project root not found: {project_root}");
    }

    let start = Instant::now();
    let pipeline = BuildPipeline::new(root, mode);
    let artifact = pipeline.run()?;

    println!(
        "{}Built{} {} [{}] in {:.2}s",
        colors::GREEN,
        colors::RESET,
        artifact.bundle.display(),
        mode.as_str(),
        start.elapsed().as_secs_f64()
    );
    if let Some(map) = &artifact.source_map {
        println!("  {}map:{} {}", colors::DIM, colors::RESET, map.display());
    }
    if let Some(css) = &artifact.stylesheet {
        println!("  {}css:{} {}", colors::DIM, colors::RESET, css.display());
    }

    Ok(())
}
