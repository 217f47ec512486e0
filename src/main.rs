//! Bilifetch - Bilibili video downloader with a local acquisition ledger
//!
//! Acquires a video's media streams from a saved page-state document, persists
//! them under a per-video project layout, and records every completed
//! acquisition in an exportable ledger.

use anyhow::{Context, Result};
use bilifetch::organizer::LibraryOrganizer;
use bilifetch::{AppSettings, ExportEmitter, Pipeline, RecordLedger};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bilifetch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the video described by a saved page-state JSON document
    Download {
        /// Path to the page-state JSON (the page's __INITIAL_STATE__ object)
        state: PathBuf,

        /// Root directory for the project layout; omit to save loose files
        /// into the Downloads directory
        #[arg(long)]
        root: Option<PathBuf>,

        /// Quality code for the first attempt (e.g. 80 = 1080p HD)
        #[arg(long)]
        quality: Option<u32>,
    },

    /// Sweep a directory of existing videos into the project layout
    Organize {
        /// Directory to scan for video files
        #[arg(long)]
        source: PathBuf,

        /// Directory receiving the per-video project directories
        #[arg(long)]
        target: PathBuf,
    },

    /// Re-export the ledger spreadsheet
    Export {
        /// Output directory for the artifact (defaults to the Downloads
        /// directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = AppSettings::default();

    match cli.command {
        Command::Download {
            state,
            root,
            quality,
        } => {
            if root.is_some() {
                settings.download_root = root;
            }
            if let Some(quality) = quality {
                settings.preferred_quality = quality;
            }

            let text = tokio::fs::read_to_string(&state)
                .await
                .with_context(|| format!("failed to read page state from {}", state.display()))?;
            let state: serde_json::Value =
                serde_json::from_str(&text).context("page state is not valid JSON")?;

            let mut pipeline = Pipeline::with_defaults(settings)?;
            let record = pipeline.run(&state).await?;
            println!(
                "Downloaded \"{}\" ({}) - {} asset(s) stored",
                record.title,
                record.quality,
                record.video_files.len()
            );
        }

        Command::Organize { source, target } => {
            let mut ledger = RecordLedger::open(&settings.ledger_path);
            let organizer = LibraryOrganizer::new(source, target, &settings)?;
            let summary = organizer.run(&mut ledger).await?;
            println!(
                "Imported {} file(s), skipped {}, {} without metadata",
                summary.imported, summary.skipped, summary.unmatched
            );
        }

        Command::Export { out } => {
            let ledger = RecordLedger::open(&settings.ledger_path);
            let emitter = ExportEmitter::new(out.unwrap_or(settings.export_dir));
            let path = emitter.emit(ledger.all())?;
            println!(
                "Exported {} record(s) to {}",
                ledger.len(),
                path.display()
            );
        }
    }

    Ok(())
}
