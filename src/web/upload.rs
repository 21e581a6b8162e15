//! Upload handler
//!
//! Streams the `video` part of a multipart request into the video store.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;

use super::routes::{AppError, AppState};
use super::store::{StoreError, VideoStore};
use super::{ALLOWED_EXTENSIONS, VIDEO_FIELD};

/// Upload error type
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to parse form: {0}")]
    Form(String),
    #[error("Failed to get file: {0}")]
    MissingFile(String),
    #[error("Invalid file type. Only video files are allowed.")]
    InvalidFileType,
    #[error("Failed to write file: {0}")]
    Interrupted(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UploadError {
    /// Error raised while reading the part body
    ///
    /// Hitting the body limit is a client error; anything else that breaks
    /// the stream mid-copy is reported as a failed write.
    fn from_stream(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::Form(err.body_text())
        } else {
            UploadError::Interrupted(err.body_text())
        }
    }

    /// Whether the failure was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UploadError::Form(_) | UploadError::MissingFile(_) | UploadError::InvalidFileType
        )
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

/// Check a client-supplied file name against the allowed video extensions
///
/// The extension is whatever follows the last `.` of the final path
/// component, so a bare `.mp4` counts as an `mp4` file.
pub fn is_valid_video_file(filename: &str) -> bool {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    base.rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// `POST /upload`
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, AppError> {
    match receive_upload(&state.store, multipart).await {
        Ok(message) => Ok(message),
        Err(err) => {
            if err.is_client_error() {
                tracing::warn!(error = %err, "Upload rejected");
            } else {
                tracing::error!(error = %err, "Upload failed");
            }
            Err(err.into())
        }
    }
}

/// Any method other than POST on `/upload`
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".to_string())
}

async fn receive_upload(
    store: &VideoStore,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::Form(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Form(e.body_text()))?
    {
        // Text parts sharing the field name are not the file.
        if field.name() != Some(VIDEO_FIELD) || field.file_name().is_none() {
            continue;
        }
        return store_video(store, field).await;
    }

    Err(UploadError::MissingFile(format!(
        "no file part named `{}`",
        VIDEO_FIELD
    )))
}

async fn store_video(store: &VideoStore, mut field: Field<'_>) -> Result<String, UploadError> {
    let filename = field.file_name().unwrap_or_default().to_owned();

    if !is_valid_video_file(&filename) {
        return Err(UploadError::InvalidFileType);
    }

    let mut pending = store.begin().await?;
    while let Some(chunk) = field.chunk().await.map_err(UploadError::from_stream)? {
        pending.write_chunk(&chunk).await?;
    }
    let written = pending.commit().await?;

    tracing::info!(filename = %filename, bytes = written, "Received video");
    Ok(format!("Upload successful: {} bytes received", written))
}
