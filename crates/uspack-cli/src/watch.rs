//! Watch command implementation for the uspack CLI.
//!
//! Runs a development watch session: rebuild on every debounced source
//! change, start the dev server after the first successful write, broadcast
//! a reload after each one. A failing pass is reported and the previous
//! artifact stays in place.

use std::path::Path;
use std::time::Instant;

use uspack_core::{BuildMode, BuildPipeline};
use uspack_server::{DevSession, FileEvent, FileWatcher, ServerConfig};

use crate::colors;

/// Execute the watch command.
pub async fn execute(project_root: &str, port: u16) -> anyhow::Result<()> {
    let root = Path::new(project_root);
    if !root.is_dir() {
        anyhow::bail!("project root not found: {project_root}");
    }

    let pipeline = BuildPipeline::new(root, BuildMode::Development);

    println!(
        "\n{}uspack watch{} - {}{}{}",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        root.display(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    let mut session = DevSession::new(ServerConfig {
        port,
        public_dir: pipeline.layout().public_dir(),
        ..ServerConfig::default()
    });

    // Initial pass.
    run_pass(&pipeline, &mut session);

    let src_dir = pipeline.layout().src_dir();
    let mut watcher = FileWatcher::new(&src_dir)
        .map_err(|e| anyhow::anyhow!("failed to create file watcher: {e}"))?;

    println!(
        "{}Watching {} for changes... (Ctrl+C to stop){}",
        colors::DIM,
        src_dir.display(),
        colors::RESET
    );

    loop {
        tokio::select! {
            event = watcher.recv() => match event {
                Some(FileEvent::Modified(path)) => {
                    println!(
                        "\n{}{} changed, rebuilding...{}",
                        colors::YELLOW,
                        path.display(),
                        colors::RESET
                    );
                    run_pass(&pipeline, &mut session);
                }
                Some(FileEvent::Removed(path)) => {
                    println!(
                        "\n{}{} removed, rebuilding...{}",
                        colors::YELLOW,
                        path.display(),
                        colors::RESET
                    );
                    run_pass(&pipeline, &mut session);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}Watch session ended{}", colors::DIM, colors::RESET);
                break;
            }
        }
    }

    Ok(())
}

/// One rebuild: report-and-hold on failure, start-once plus reload on
/// success.
fn run_pass(pipeline: &BuildPipeline, session: &mut DevSession) {
    let start = Instant::now();
    match pipeline.run() {
        Ok(artifact) => {
            println!(
                "{}Built{} {} in {:.2}s",
                colors::GREEN,
                colors::RESET,
                artifact.bundle.display(),
                start.elapsed().as_secs_f64()
            );

            if session.ensure_started() {
                println!(
                    "{}Dev server started{}",
                    colors::DIM,
                    colors::RESET
                );
            }
            let notified = session.notify_reload();
            tracing::debug!(notified, "reload broadcast sent");
        }
        Err(e) => {
            // Previous artifact is left in place; wait for the next change.
            eprintln!("{}Error:{} {e}", colors::RED, colors::RESET);
        }
    }
}
