//! HTTP routes for the web server
//!
//! Provides the upload page, the upload endpoint, and the status/discovery
//! endpoints polled by the TV.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::assets;
use super::server::{ServerConfig, ServerError};
use super::store::{VideoStatus, VideoStore};
use super::upload::{method_not_allowed, upload_video};
use crate::net;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<VideoStore>,
    /// Port reported by `/ip`
    pub port: u16,
    index_html: Bytes,
}

impl AppState {
    /// Build the state for `config`, loading the embedded upload page
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            store: Arc::new(VideoStore::new(&config.video_dir)),
            port: config.port,
            index_html: assets::index_html()?,
        })
    }
}

/// Build the router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_video).fallback(method_not_allowed))
        .route("/status", get(video_status))
        .route("/ip", get(ip_info))
        .fallback(index)
}

/// Upload page
async fn index(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        state.index_html.clone(),
    )
        .into_response()
}

/// Managed video status
async fn video_status(State(state): State<AppState>) -> Result<Json<VideoStatus>, AppError> {
    state.store.status().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, path = %state.store.video_path().display(), "Failed to stat video");
        AppError::Internal(e.to_string())
    })
}

/// `/ip` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpInfo {
    pub ip: String,
    pub port: u16,
}

/// LAN address of this server
async fn ip_info(State(state): State<AppState>) -> Json<IpInfo> {
    let ip = net::get_local_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_default();

    Json(IpInfo {
        ip,
        port: state.port,
    })
}

/// API error type
///
/// Rendered as a plain-text body so the upload page can show it verbatim.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    MethodNotAllowed(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
