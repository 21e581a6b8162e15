//! Web server implementation
//!
//! Provides the main server struct and configuration.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::routes::{routes, AppState};
use super::shutdown::wait_for_shutdown_signal;
use super::{DEFAULT_BIND, DEFAULT_PORT, DEFAULT_UPLOAD_LIMIT};

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Embedded asset missing: {0}")]
    MissingAsset(&'static str),
    #[error("Invalid bind address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server configuration
///
/// Built once at startup and shared read-only with every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Address to bind to
    pub bind: String,
    /// Maximum upload size in bytes
    pub upload_limit: usize,
    /// Directory holding the managed video
    pub video_dir: PathBuf,
}

impl ServerConfig {
    /// Create a config with default settings for `video_dir`
    pub fn new(video_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            video_dir: video_dir.into(),
        }
    }

    /// Create a new server config with the given port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a new server config with the given bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Create a new server config with the given upload limit
    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.upload_limit = limit;
        self
    }

    /// Parsed bind address
    pub fn bind_ip(&self) -> Result<IpAddr, std::net::AddrParseError> {
        self.bind.parse()
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.port))
    }
}

/// Web server instance
#[derive(Debug)]
pub struct WebServer {
    config: ServerConfig,
    state: AppState,
}

impl WebServer {
    /// Create a new web server with the given configuration
    pub fn with_config(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;
        Ok(Self { config, state })
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared handler state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router
    pub fn router(&self) -> Router {
        routes()
            .layer(DefaultBodyLimit::max(self.config.upload_limit))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until SIGINT/SIGTERM
    ///
    /// `advertised_ip` is the LAN address printed in the startup banner.
    pub async fn run(&self, advertised_ip: Ipv4Addr) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let store = &self.state.store;

        match store.remove_stale_temp() {
            Ok(true) => tracing::info!(path = %store.temp_path().display(), "Removed stale temp file"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to remove stale temp file"),
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let router = self.router();

        // The TV-side supervisor scrapes the first line.
        println!("Server starting at http://{}:{}", advertised_ip, self.config.port);
        println!("Video directory: {}", self.config.video_dir.display());
        tracing::info!(%addr, limit = self.config.upload_limit, "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(wait_for_shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
