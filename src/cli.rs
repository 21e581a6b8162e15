//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

use crate::config::CliOverrides;

/// Receive a video from any browser on the LAN and hand it to the TV
#[derive(Debug, Parser)]
#[command(name = "tvdrop", version, about)]
pub struct Cli {
    /// Directory where the received video (video.mp4) is stored
    pub video_dir: PathBuf,

    /// First port to try (the next 100 ports are scanned if it is taken)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Config file (defaults to <config_dir>/tvdrop/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Values that override the config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            bind: self.bind.clone(),
        }
    }
}
