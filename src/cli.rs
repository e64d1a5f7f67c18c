use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segtrim")]
#[command(author, version, about = "Cut a video into segments, trim each tail and join the rest")]
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
    /// Start the web server with the upload form
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process a local file; the input is left in place
    Run {
        /// Input video
        #[arg(required = true)]
        input: PathBuf,

        /// Segment length in seconds
        #[arg(short, long)]
        segment: u32,

        /// Seconds removed from the end of each segment
        #[arg(short, long)]
        removal: u32,

        /// Where to write the output (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the windows that would be cut, without touching any media
    Plan {
        /// Source duration in seconds
        #[arg(short, long)]
        duration: f64,

        /// Segment length in seconds
        #[arg(short, long)]
        segment: u32,

        /// Seconds removed from the end of each segment
        #[arg(short, long)]
        removal: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the duration of a media file
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        path: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
