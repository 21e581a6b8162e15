//! tvdrop - drop a video onto the TV over the local network
//!
//! Serves an upload page on the LAN. A phone or laptop uploads one video,
//! which is written atomically to `<video_dir>/video.mp4`; a TV-side client
//! polls `/status` to notice when a new file is ready.

pub mod cli;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod net;
pub mod web;

pub use cli::Cli;
pub use config::{CliOverrides, Config, ConfigError};
pub use net::{find_available_port, find_available_port_on, get_local_ip};
pub use web::{
    is_valid_video_file, AppError, AppState, IpInfo, ServerConfig, ServerError, StoreError,
    UploadError, VideoStatus, VideoStore, WebServer,
};
