use std::path::PathBuf;

use clap::Parser;
use tubefetch_engine::AudioFormat;

/// Resolve a playlist export to video links and download the audio.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Playlist export, links table or failed-queries table (CSV)
    pub input: PathBuf,

    /// Directory for the links tables and downloaded audio [default: current directory]
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Audio format: opus, flac or mp3
    #[arg(short, long)]
    pub format: Option<AudioFormat>,

    /// Concurrent lookups
    #[arg(long)]
    pub resolve_workers: Option<usize>,

    /// Concurrent downloads
    #[arg(long)]
    pub fetch_workers: Option<usize>,

    /// Only resolve links; do not download anything
    #[arg(long)]
    pub links_only: bool,

    /// Settings file [default: ./tubefetch.ron if present]
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Write the effective settings to the settings file and continue
    #[arg(long)]
    pub save_settings: bool,

    /// Also log engine diagnostics to the terminal
    #[arg(short, long)]
    pub verbose: bool,
}
