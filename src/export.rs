//! Export flow: fetch the processed image, composite, and save the artifact
//!
//! The flow is split in phases around its suspension point: capture a
//! snapshot of the completed result, fetch and composite the bytes, then
//! re-check the snapshot against the session before saving. A session that
//! moved on mid-fetch (reset or new result) makes the artifact stale and it
//! is discarded without touching the filesystem.

use crate::client::ProcessedResult;
use crate::composite::composite;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::palette::BackgroundSpec;
use crate::session::{ResultId, Session};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Artifact name used when the service suggested none
pub const DEFAULT_ARTIFACT_NAME: &str = "image-processed.png";

/// Immutable view of a completed result taken before the fetch suspension
/// point
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    id: ResultId,
    result: ProcessedResult,
    background: BackgroundSpec,
}

impl ExportSnapshot {
    /// Capture the session's current completed result and background
    ///
    /// # Errors
    /// - `Export` if the session holds no completed result
    pub fn capture(session: &Session) -> Result<Self> {
        let id = session
            .result_id()
            .ok_or_else(|| ClientError::export("No completed result to download"))?;
        let result = session
            .result()
            .cloned()
            .ok_or_else(|| ClientError::export("No completed result to download"))?;
        Ok(Self {
            id,
            result,
            background: session.background().clone(),
        })
    }

    /// Name to save the artifact under
    #[must_use]
    pub fn artifact_name(&self) -> &str {
        self.result
            .suggested_file_name
            .as_deref()
            .unwrap_or(DEFAULT_ARTIFACT_NAME)
    }
}

/// Fetches processed images and writes final artifacts
#[derive(Debug, Clone)]
pub struct ArtifactExporter {
    http: reqwest::Client,
}

impl ArtifactExporter {
    /// Create an exporter using the configured timeout
    ///
    /// # Errors
    /// - HTTP client construction fails
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::network_error("Failed to create HTTP client", &e))?;
        Ok(Self { http })
    }

    /// Fetch the processed image and flatten it over the snapshot's
    /// background
    ///
    /// # Errors
    /// - `ImageLoad` if the bytes cannot be fetched or decoded
    /// - `Export` if encoding fails
    pub async fn render(&self, snapshot: &ExportSnapshot) -> Result<Vec<u8>> {
        let url = &snapshot.result.processed_url;
        tracing::debug!(%url, background = %snapshot.background, "fetching processed image");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::image_load(format!("Failed to fetch '{url}': {e}")))?;
        if !response.status().is_success() {
            return Err(ClientError::image_load(format!(
                "Fetch of '{url}' returned HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::image_load(format!("Failed to read '{url}': {e}")))?;
        composite(&bytes, &snapshot.background)
    }

    /// Full download flow: capture, render, stale-guard, save
    ///
    /// Returns the saved artifact path, or `None` when the session no longer
    /// holds the snapshotted result by the time rendering finished.
    ///
    /// # Errors
    /// - `Export` if no completed result is present or the artifact cannot
    ///   be written
    /// - `ImageLoad` on fetch/decode failure
    pub async fn download(&self, session: &Session, dest_dir: &Path) -> Result<Option<PathBuf>> {
        let snapshot = ExportSnapshot::capture(session)?;
        let bytes = self.render(&snapshot).await?;
        finish_download(session, &snapshot, &bytes, dest_dir)
    }
}

/// Final phase of the download flow, after the suspension point
///
/// Checks that the session still holds the snapshotted result; a stale
/// artifact is discarded as a no-op. The write is atomic: bytes go to a temp
/// file in the destination directory which is persisted into place, so a
/// failed write leaves nothing behind.
///
/// # Errors
/// - `Export` if the artifact cannot be written
pub fn finish_download(
    session: &Session,
    snapshot: &ExportSnapshot,
    bytes: &[u8],
    dest_dir: &Path,
) -> Result<Option<PathBuf>> {
    if !session.is_result_current(snapshot.id) {
        tracing::debug!("discarding stale download artifact");
        return Ok(None);
    }
    save_artifact(bytes, dest_dir, snapshot.artifact_name()).map(Some)
}

/// Atomically write artifact bytes under `dest_dir/name`
fn save_artifact(bytes: &[u8], dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let dest = dest_dir.join(name);
    let mut temp = NamedTempFile::new_in(dest_dir)
        .map_err(|e| ClientError::export(format!("Cannot create file in '{}': {e}", dest_dir.display())))?;
    temp.write_all(bytes)
        .map_err(|e| ClientError::export(format!("Cannot write artifact: {e}")))?;
    temp.persist(&dest)
        .map_err(|e| ClientError::export(format!("Cannot save '{}': {e}", dest.display())))?;
    tracing::info!(artifact = %dest.display(), size = bytes.len(), "artifact saved");
    Ok(dest)
}
