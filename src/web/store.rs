//! On-disk storage for the managed video
//!
//! The video directory holds exactly one managed file. New content is
//! written to a sibling temp file and renamed over the managed path, so a
//! reader sees either the previous complete file or the new one.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{TEMP_SUFFIX, VIDEO_FILE_NAME};

/// Format of the `modified` field in status responses
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to create file: {0}")]
    Create(#[source] io::Error),
    #[error("Failed to write file: {0}")]
    Write(#[source] io::Error),
    #[error("Failed to finalize file: {0}")]
    Finalize(#[source] io::Error),
}

/// State of the managed video as reported by `/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStatus {
    pub has_video: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl VideoStatus {
    /// No managed video on disk
    pub fn absent() -> Self {
        Self {
            has_video: false,
            size: None,
            modified: None,
        }
    }

    /// A managed video of `size` bytes last modified at `modified`
    pub fn present(size: u64, modified: SystemTime) -> Self {
        let local: DateTime<Local> = modified.into();
        Self {
            has_video: true,
            size: Some(size),
            modified: Some(local.format(MODIFIED_FORMAT).to_string()),
        }
    }
}

/// Owner of the managed video path
#[derive(Debug)]
pub struct VideoStore {
    dir: PathBuf,
    video_path: PathBuf,
    temp_path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl VideoStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let video_path = dir.join(VIDEO_FILE_NAME);
        let mut temp_name = video_path.clone().into_os_string();
        temp_name.push(TEMP_SUFFIX);

        Self {
            dir,
            video_path,
            temp_path: PathBuf::from(temp_name),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Video directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the managed video
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Path of the in-flight temp file
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Stat the managed video
    ///
    /// A missing file is a normal state, not an error.
    pub async fn status(&self) -> io::Result<VideoStatus> {
        match fs::metadata(&self.video_path).await {
            Ok(meta) => Ok(VideoStatus::present(meta.len(), meta.modified()?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(VideoStatus::absent()),
            Err(e) => Err(e),
        }
    }

    /// Start writing a new video
    ///
    /// Waits for any other writer to finish, then creates the temp file.
    /// The returned handle holds the writer lock until it is committed or
    /// dropped; dropping it without committing removes the temp file.
    ///
    /// The lock is held while the request body streams in. A client that
    /// stalls without closing its connection blocks later uploads until the
    /// connection is torn down.
    pub async fn begin(&self) -> Result<PendingVideo, StoreError> {
        let lock = self.writer.clone().lock_owned().await;
        let file = File::create(&self.temp_path)
            .await
            .map_err(StoreError::Create)?;

        tracing::debug!(path = %self.temp_path.display(), "Created temp file");

        Ok(PendingVideo {
            file,
            written: 0,
            temp: TempFileGuard::new(self.temp_path.clone()),
            video_path: self.video_path.clone(),
            _lock: lock,
        })
    }

    /// Remove a temp file left behind by a previous process
    ///
    /// Returns `true` if a file was removed.
    pub fn remove_stale_temp(&self) -> io::Result<bool> {
        match std::fs::remove_file(&self.temp_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// An upload being written to the temp file
#[derive(Debug)]
pub struct PendingVideo {
    file: File,
    written: u64,
    temp: TempFileGuard,
    video_path: PathBuf,
    _lock: OwnedMutexGuard<()>,
}

impl PendingVideo {
    /// Append a chunk to the temp file
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(chunk).await.map_err(StoreError::Write)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Close the temp file and rename it over the managed path
    ///
    /// Returns the number of bytes in the new managed video. On failure the
    /// temp file is removed and the previous managed video is left as is.
    pub async fn commit(self) -> Result<u64, StoreError> {
        let PendingVideo {
            mut file,
            written,
            mut temp,
            video_path,
            _lock,
        } = self;

        let result = async {
            file.flush().await.map_err(StoreError::Write)?;
            file.sync_all().await.map_err(StoreError::Write)?;
            drop(file);

            fs::rename(temp.path(), &video_path)
                .await
                .map_err(StoreError::Finalize)
        }
        .await;

        match result {
            Ok(()) => temp.disarm(),
            // Remove the temp file while still holding the writer lock.
            Err(_) => drop(temp),
        }
        drop(_lock);

        result.map(|()| written)
    }
}

/// Deletes the temp file on drop unless disarmed
#[derive(Debug)]
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed temp file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove temp file")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_paths() {
        let store = VideoStore::new("/tmp/tv");
        assert_eq!(store.dir(), Path::new("/tmp/tv"));
        assert_eq!(store.video_path(), Path::new("/tmp/tv/video.mp4"));
        assert_eq!(store.temp_path(), Path::new("/tmp/tv/video.mp4.tmp"));
    }

    #[test]
    fn test_video_status_absent_serialize() {
        let json = serde_json::to_value(VideoStatus::absent()).unwrap();
        assert_eq!(json, serde_json::json!({ "has_video": false }));
    }

    #[test]
    fn test_video_status_present_format() {
        let status = VideoStatus::present(42, SystemTime::now());
        assert!(status.has_video);
        assert_eq!(status.size, Some(42));

        let modified = status.modified.unwrap();
        assert_eq!(modified.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&modified, MODIFIED_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_status_without_video() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path());
        assert_eq!(store.status().await.unwrap(), VideoStatus::absent());
    }

    #[tokio::test]
    async fn test_commit_replaces_video() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path());

        let mut pending = store.begin().await.unwrap();
        assert!(store.temp_path().exists());
        pending.write_chunk(b"hello ").await.unwrap();
        pending.write_chunk(b"world").await.unwrap();
        assert_eq!(pending.written(), 11);

        let written = pending.commit().await.unwrap();
        assert_eq!(written, 11);
        assert!(!store.temp_path().exists());
        assert_eq!(std::fs::read(store.video_path()).unwrap(), b"hello world");

        let status = store.status().await.unwrap();
        assert!(status.has_video);
        assert_eq!(status.size, Some(11));
    }

    #[tokio::test]
    async fn test_dropped_upload_keeps_previous_video() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path());
        std::fs::write(store.video_path(), b"previous").unwrap();

        let mut pending = store.begin().await.unwrap();
        pending.write_chunk(b"partial data").await.unwrap();
        drop(pending);

        assert!(!store.temp_path().exists());
        assert_eq!(std::fs::read(store.video_path()).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_writer_lock_released_after_drop() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path());

        let first = store.begin().await.unwrap();
        drop(first);

        let mut second = store.begin().await.unwrap();
        second.write_chunk(b"second").await.unwrap();
        assert_eq!(second.commit().await.unwrap(), 6);
        assert_eq!(std::fs::read(store.video_path()).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_writers_are_serialized() {
        let dir = tempdir().unwrap();
        let store = Arc::new(VideoStore::new(dir.path()));

        let mut first = store.begin().await.unwrap();

        let waiting = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second.write_chunk(b"second upload").await.unwrap();
                second.commit().await.unwrap()
            })
        };

        // The second writer cannot start while the first holds the lock.
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        first.write_chunk(b"first").await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(waiting.await.unwrap(), 13);
        assert_eq!(std::fs::read(store.video_path()).unwrap(), b"second upload");
    }

    #[tokio::test]
    async fn test_begin_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path().join("missing"));

        let err = store.begin().await.unwrap_err();
        assert!(matches!(err, StoreError::Create(_)));
        assert!(err.to_string().starts_with("Failed to create file: "));
    }

    #[tokio::test]
    async fn test_failed_commit_cleans_up_before_next_writer() {
        let dir = tempdir().unwrap();
        let store = Arc::new(VideoStore::new(dir.path()));
        std::fs::create_dir(store.video_path()).unwrap();
        std::fs::write(store.video_path().join("keep"), b"x").unwrap();

        let mut first = store.begin().await.unwrap();
        first.write_chunk(b"doomed").await.unwrap();

        let waiting = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second.write_chunk(b"next").await.unwrap();
                let temp_survived = store.temp_path().exists();
                drop(second);
                temp_survived
            })
        };
        tokio::task::yield_now().await;

        let err = first.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Finalize(_)));
        assert!(err.to_string().starts_with("Failed to finalize file: "));

        // The waiting writer's own temp file must not be removed by the
        // failed commit's cleanup.
        assert!(waiting.await.unwrap());
        assert!(!store.temp_path().exists());
        assert!(store.video_path().is_dir());
    }

    #[test]
    fn test_remove_stale_temp() {
        let dir = tempdir().unwrap();
        let store = VideoStore::new(dir.path());

        assert!(!store.remove_stale_temp().unwrap());

        std::fs::write(store.temp_path(), b"leftover").unwrap();
        assert!(store.remove_stale_temp().unwrap());
        assert!(!store.temp_path().exists());
    }
}
