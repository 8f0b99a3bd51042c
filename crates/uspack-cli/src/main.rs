//! uspack CLI - userscript bundler.

mod build;
mod colors;
mod watch;

use clap::{Parser, Subcommand};
use uspack_core::BuildMode;

#[derive(Parser)]
#[command(name = "uspack")]
#[command(about = "Bundle component sources into a distributable userscript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one build pass
    Build {
        /// Project root directory
        #[arg(default_value = ".")]
        root: String,
    },

    /// Rebuild on change, with dev server and live reload
    Watch {
        /// Project root directory
        #[arg(default_value = ".")]
        root: String,

        /// Dev server port
        #[arg(short, long, default_value = "35729")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Build { root } => {
            // The environment flag can still force a development build for
            // tooling that sets it before invoking us.
            build::execute(&root, BuildMode::from_env())?;
        }

        Commands::Watch { root, port } => {
            watch::execute(&root, port).await?;
        }
    }

    Ok(())
}
