use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediacheck")]
#[command(author, version, about = "Conformance checks and caption extraction for fragmented MP4 streams")]
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
    /// Decode CEA-608/708 captions from local segments
    Captions {
        /// Init segment
        #[arg(long, required = true)]
        init: PathBuf,

        /// Caption scheme URI or INSTREAM-ID (CC1..CC4, SERVICE1..SERVICE63)
        #[arg(long, default_value = "CC1")]
        scheme: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Media segments in decode order
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Print decode time and duration of media segments
    Timing {
        /// Init segment
        #[arg(long, required = true)]
        init: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Media segments
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Print the event message boxes of media segments
    Emsg {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Media segments
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Run every check described by the job config
    Check {
        /// Output directory (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
