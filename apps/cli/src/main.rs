//! mdx-go CLI — zero-config documentation sites from a directory of
//! MDX/Markdown files.
//!
//! Resolves one merged configuration from layered sources, then dispatches
//! to exactly one of two operations: `build` (static export) or `dev`
//! (local server with live reload).

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
