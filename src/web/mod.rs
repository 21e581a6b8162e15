//! Web server module for tvdrop
//!
//! Serves the upload page and the small JSON API a TV polls to find out
//! whether a new video has arrived.
//!
//! # Endpoints
//!
//! - `GET /`        - Upload page
//! - `POST /upload` - Multipart upload (field `video`)
//! - `GET /status`  - Whether a video is present, its size and mtime
//! - `GET /ip`      - LAN address and port of this server

mod assets;
mod routes;
mod server;
mod shutdown;
mod store;
mod upload;

pub use routes::{AppError, AppState, IpInfo};
pub use server::{ServerConfig, ServerError, WebServer};
pub use shutdown::wait_for_shutdown_signal;
pub use store::{PendingVideo, StoreError, VideoStatus, VideoStore};
pub use upload::{is_valid_video_file, UploadError};

/// Default server port (first port tried by the startup scan)
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Maximum request body size for uploads (2 GiB)
pub const DEFAULT_UPLOAD_LIMIT: usize = 2 * 1024 * 1024 * 1024;

/// File name of the managed video inside the video directory
pub const VIDEO_FILE_NAME: &str = "video.mp4";

/// Suffix appended to the managed path while an upload is in flight
pub const TEMP_SUFFIX: &str = ".tmp";

/// Multipart field carrying the uploaded file
pub const VIDEO_FIELD: &str = "video";

/// Accepted upload extensions (compared case-insensitively, without the dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp",
];
