//! Print camera details for one or more images
//!
//! cargo run --example inspect -- photo.jpg other.tif --json

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use exif_details::{DecodeOptions, DetailsReader, MetadataDecoder};

#[derive(Parser)]
#[command(name = "inspect", about = "Show camera details from EXIF metadata")]
struct Args {
    /// Image files to inspect
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Print each record as JSON
    #[arg(long)]
    json: bool,

    /// Also dump the raw decoded tag set
    #[arg(long)]
    raw: bool,

    /// Include thumbnail IFD tags in the raw dump
    #[arg(long)]
    thumbnails: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let args = Args::parse();
    let reader = DetailsReader::new().options(DecodeOptions {
        include_thumbnails: args.thumbnails,
    });

    info!("Inspecting {} file(s)", args.paths.len());

    for (path, result) in args.paths.iter().zip(reader.get_details_many(&args.paths)) {
        let details = match result {
            Ok(details) => details,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                continue;
            }
        };

        println!("=== {} ===", path.display());
        if args.json {
            let json = details.to_json().context("Failed to serialize details")?;
            let text = serde_json::to_string_pretty(&json)?;
            println!("{}", text);
        } else {
            for (name, value) in details.fields() {
                println!("{:>14}: {}", name, value);
            }
        }

        if args.raw {
            let tags = reader
                .decoder()
                .decode(path, None, args.thumbnails)
                .with_context(|| format!("Failed to decode {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
    }

    Ok(())
}
