//! Media manifest generator
//!
//! Writes a JSON listing of a media folder for static front-ends.

use std::path::PathBuf;
use std::process;

use atelier::manifest::write_manifest;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder holding the media files
    folder: PathBuf,

    /// Where to write the manifest
    #[arg(short, long, default_value = "public/manifest.json")]
    output: PathBuf,

    /// Descend into sub-folders
    #[arg(short, long)]
    recursive: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match write_manifest(&cli.folder, &cli.output, cli.recursive) {
        Ok(entries) => {
            println!(
                "Manifest with {} entries written to {}",
                entries.len(),
                cli.output.display()
            );
        }
        Err(e) => {
            eprintln!("Failed to generate manifest: {}", e);
            process::exit(1);
        }
    }
}
