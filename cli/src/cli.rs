use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "inapp",
    version = inapp_core::version(),
    about = "Replays an in-app message scenario against a headless host",
)]
pub struct Args {
    /// Scenario file describing the message and the host events to replay
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Specify custom configuration file path"
    )]
    pub config_path: Option<PathBuf>,

    #[arg(
        long = "dry-run",
        help = "Validate configuration and scenario, then exit"
    )]
    pub dry_run: bool,

    #[arg(
        long = "defaults",
        help = "Use default configuration and ignore config files"
    )]
    pub use_defaults: bool,

    #[arg(short = 'q', long = "quiet", help = "Only log info and above")]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        conflicts_with = "quiet",
        help = "Log everything, including trace output"
    )]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
