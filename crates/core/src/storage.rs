//! On-disk store for update attachments.
//!
//! Files live flat under a single root directory and are referenced from the
//! database by a public path of the form `uploads/<stored-name>`. Writes are
//! staged through [`PendingAttachment`], which enforces the per-file size
//! limit while bytes arrive. Files of one request are collected in an
//! [`UploadBatch`] until the rows referencing them are committed.
//!
//! Both a pending file and an uncommitted batch remove their files when
//! dropped, so a request cancelled mid-upload (timeout, client disconnect)
//! leaves nothing behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::attachment::{self, AttachmentKind, MAX_ATTACHMENT_BYTES};
use crate::error::CoreError;

/// Prefix of every stored path; matches the route the files are served under.
pub const PUBLIC_PREFIX: &str = "uploads";

/// Metadata of a fully written attachment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAttachment {
    pub kind: AttachmentKind,
    pub storage_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    max_file_bytes: u64,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: MAX_ATTACHMENT_BYTES,
        }
    }

    /// Override the per-file limit.
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), CoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error("create upload directory", &self.root, e))
    }

    /// Validate the declared type and open a fresh file for writing.
    ///
    /// Nothing touches the disk when the type is rejected.
    pub async fn begin(
        &self,
        declared_name: &str,
        mime_type: &str,
    ) -> Result<PendingAttachment, CoreError> {
        let ext = attachment::validate_upload(declared_name, mime_type)?;
        self.ensure_root().await?;

        let stored_name = stored_file_name(&ext);
        let path = self.root.join(&stored_name);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| io_error("create attachment file", &path, e))?;

        Ok(PendingAttachment {
            file,
            guard: RemoveOnDrop(Some(path.clone())),
            path,
            limit: self.max_file_bytes,
            written: 0,
            meta: StoredAttachment {
                kind: attachment::classify(mime_type),
                storage_path: format!("{PUBLIC_PREFIX}/{stored_name}"),
                original_name: attachment::original_file_name(declared_name).to_string(),
                mime_type: mime_type.trim().to_string(),
                size_bytes: 0,
            },
        })
    }

    /// Store a complete in-memory file in one step.
    pub async fn accept(
        &self,
        declared_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<StoredAttachment, CoreError> {
        let mut pending = self.begin(declared_name, mime_type).await?;
        if let Err(e) = pending.write_chunk(data).await {
            pending.abort().await;
            return Err(e);
        }
        pending.finish().await
    }

    /// Remove a stored file by its public path.
    ///
    /// Returns `Ok(false)` when the file was already gone. Only the final
    /// path component is used, so a stored path can never escape the root.
    pub async fn discard(&self, storage_path: &str) -> Result<bool, CoreError> {
        let Some(name) = Path::new(storage_path).file_name() else {
            return Ok(false);
        };
        let path = self.root.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("remove attachment file", &path, e)),
        }
    }

    /// Best-effort removal of many files. Failures are logged, never returned.
    pub async fn discard_all(&self, storage_paths: &[String]) {
        for storage_path in storage_paths {
            match self.discard(storage_path).await {
                Ok(true) => tracing::debug!(%storage_path, "Discarded attachment file"),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(%storage_path, error = %e, "Failed to discard attachment file")
                }
            }
        }
    }

    /// Start collecting the files of one request.
    pub fn batch(&self) -> UploadBatch {
        UploadBatch {
            root: self.root.clone(),
            files: Vec::new(),
        }
    }
}

/// A file being written. [`finish`](Self::finish) keeps it; dropping it
/// unfinished removes the partial file.
#[derive(Debug)]
pub struct PendingAttachment {
    file: fs::File,
    guard: RemoveOnDrop,
    path: PathBuf,
    limit: u64,
    written: u64,
    meta: StoredAttachment,
}

impl PendingAttachment {
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Append a chunk. Fails with `PayloadTooLarge` before writing a chunk
    /// that would push the file over the limit.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CoreError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(CoreError::PayloadTooLarge {
                limit_bytes: self.limit,
            });
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| io_error("write attachment file", &self.path, e))?;
        self.written = next;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredAttachment, CoreError> {
        if let Err(e) = self.file.flush().await {
            let err = io_error("flush attachment file", &self.path, e);
            self.abort().await;
            return Err(err);
        }
        self.meta.size_bytes = i64::try_from(self.written)
            .map_err(|_| CoreError::PayloadTooLarge { limit_bytes: self.limit })?;
        self.guard.disarm();
        Ok(self.meta)
    }

    /// Close and delete the partial file.
    pub async fn abort(mut self) {
        self.guard.disarm();
        let PendingAttachment { file, path, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial attachment");
            }
        }
    }
}

/// Stored files of one request that no committed row references yet.
///
/// Call [`commit`](Self::commit) once the rows are in the database. A batch
/// dropped before that removes every file it holds.
#[derive(Debug)]
pub struct UploadBatch {
    root: PathBuf,
    files: Vec<StoredAttachment>,
}

impl UploadBatch {
    pub fn push(&mut self, file: StoredAttachment) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[StoredAttachment] {
        &self.files
    }

    /// Keep the files for good.
    pub fn commit(mut self) -> Vec<StoredAttachment> {
        std::mem::take(&mut self.files)
    }

    /// Remove every file now rather than in the background.
    pub async fn discard(mut self) {
        for file in std::mem::take(&mut self.files) {
            if let Some(name) = Path::new(&file.storage_path).file_name() {
                let path = self.root.join(name);
                log_removal(&path, fs::remove_file(&path).await);
            }
        }
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        if self.files.is_empty() {
            return;
        }
        tracing::debug!(files = self.files.len(), "Discarding uncommitted uploads");
        let root = &self.root;
        let paths = self
            .files
            .drain(..)
            .filter_map(|f| Path::new(&f.storage_path).file_name().map(|n| root.join(n)))
            .collect();
        remove_detached(paths);
    }
}

/// Removes the file at its path when dropped, unless disarmed.
#[derive(Debug)]
struct RemoveOnDrop(Option<PathBuf>);

impl RemoveOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            remove_detached(vec![path]);
        }
    }
}

/// Remove files from a destructor. Runs as a spawned task inside a runtime,
/// synchronously otherwise.
fn remove_detached(paths: Vec<PathBuf>) {
    if paths.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                for path in paths {
                    log_removal(&path, fs::remove_file(&path).await);
                }
            });
        }
        Err(_) => {
            for path in paths {
                log_removal(&path, std::fs::remove_file(&path));
            }
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed abandoned attachment file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove abandoned attachment file")
        }
    }
}

/// `<unix-millis>-<random>.<ext>`
fn stored_file_name(ext: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{}-{suffix}.{ext}", Utc::now().timestamp_millis())
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} '{}': {err}", path.display()))
}
