use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediagate")]
#[command(author, version, about = "Transcode media through ffmpeg and report progress")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode a file to a progressive-download MP4 (H.264/AAC)
    Convert {
        /// Input media file
        input: PathBuf,

        /// Output MP4 path
        output: PathBuf,
    },

    /// Show duration and video codec of a media file
    Info {
        /// Media file to probe
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Segment a file into an HLS playlist plus numbered segments
    Hls {
        /// Input media file
        input: PathBuf,

        /// Directory that receives the manifest and segments
        output_dir: PathBuf,

        /// Segment length in seconds (defaults to the configured value)
        #[arg(short, long)]
        segment_duration: Option<u32>,
    },

    /// Re-encode a file to a fragmented MP4 for progressive streaming
    Fmp4 {
        /// Input media file
        input: PathBuf,

        /// Output MP4 path
        output: PathBuf,

        /// Fragment length in seconds (defaults to the configured value)
        #[arg(short, long)]
        segment_duration: Option<u32>,
    },

    /// Decode a file and print elapsed time as the engine reports it
    Progress {
        /// Media file to analyse
        input: PathBuf,
    },

    /// Check that the external engine is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
