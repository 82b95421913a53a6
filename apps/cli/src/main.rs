//! Vitrine CLI — content backend for the agency marketing site.
//!
//! Serves page data, sitemaps and exports over HTTP, builds the feeds into a
//! directory for static hosting, and manages the local configuration.

mod commands;
mod server;

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
