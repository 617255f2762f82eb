//! Sidecar metadata files written next to each stored photo. The Integrity
//! Scanner (C8) reads these back to reconcile what the filesystem holds
//! against what the database believes, without needing to re-derive EXIF
//! from the image bytes on every scan.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const SIDECAR_SUFFIX: &str = ".psmeta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedMeta {
    pub photo_id: Uuid,
    pub user_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub file_hash: String,
    pub uploaded_at: DateTime<Utc>,
}

pub fn sidecar_path(stored_path: &str) -> String {
    format!("{stored_path}{SIDECAR_SUFFIX}")
}

pub fn is_sidecar(path: &Path) -> bool {
    path.to_string_lossy().ends_with(SIDECAR_SUFFIX)
}

/// Top-level directory, sibling to the `<YYYY>/<MM>/...` originals, that
/// holds every generated thumbnail (`thumbs/<size>/<YYYY>/<MM>/<name>.webp`).
/// The scanner walks past this entire subtree rather than reconciling it —
/// thumbnails are derived artifacts of a known photo, not independent files.
pub const THUMBNAIL_DIR_NAME: &str = "thumbs";

pub async fn write_sidecar(base: &Path, stored_path: &str, meta: &EmbeddedMeta) -> Result<(), AppError> {
    let path = base.join(sidecar_path(stored_path));
    let body = serde_json::to_vec_pretty(meta).map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

pub async fn read_sidecar(base: &Path, stored_path: &str) -> Option<EmbeddedMeta> {
    let path = base.join(sidecar_path(stored_path));
    let body = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&body).ok()
}
