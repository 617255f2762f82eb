//! Integrity Scanner (C8): periodically (or on demand) walks the photo
//! storage root, cross-references every file against the database, and
//! records what it finds as [`OrphanFile`] / [`FileConflict`] rows for an
//! operator to triage. Never deletes or moves anything itself (§4.8).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::Utc;
use photosync_shared::entities::{ConflictStatus, ConflictType, FileConflict, OrphanFile, OrphanStatus};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::db::Db;
use crate::hashing::sha256_hex;
use crate::metadata::{self, EmbeddedMeta};

/// Each disk read is retried once on a transient I/O error (§4.8).
const MAX_READ_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub files_scanned: u64,
    pub orphans_found: u64,
    pub conflicts_found: u64,
    pub interrupted: bool,
}

/// Coordinates "only one scan at a time" and cooperative shutdown. Cheap to
/// clone; all state is shared.
#[derive(Clone)]
pub struct ScannerHandle {
    slot: Arc<Semaphore>,
    shutdown: Arc<AtomicBool>,
}

impl ScannerHandle {
    pub fn new() -> Self {
        Self { slot: Arc::new(Semaphore::new(1)), shutdown: Arc::new(AtomicBool::new(false)) }
    }

    /// Runs a scan if no other scan currently holds the slot. Returns
    /// `None` if one is already in progress (§4.8: "a scan already in
    /// progress MUST NOT run concurrently with another").
    pub async fn try_scan(&self, db: Arc<dyn Db>, base: PathBuf) -> Option<Result<ScanSummary>> {
        let permit = self.slot.try_acquire().ok()?;
        self.shutdown.store(false, Ordering::SeqCst);
        let summary = run_scan(db, &base, &self.shutdown).await;
        drop(permit);
        Some(summary)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

async fn run_scan(db: Arc<dyn Db>, base: &Path, shutdown: &AtomicBool) -> Result<ScanSummary> {
    let known: HashMap<String, Uuid> = db
        .list_all_stored_paths()
        .await?
        .into_iter()
        .map(|(id, path)| (path, id))
        .collect();

    let mut summary = ScanSummary::default();
    let mut stack = vec![base.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if shutdown.load(Ordering::SeqCst) {
            summary.interrupted = true;
            break;
        }
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) => {
                log::warn!("[scanner] could not read directory {}: {e}", dir.display());
                continue;
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            if shutdown.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                // The thumbnail subtree is a derived-artifact tree, not
                // original content to reconcile — skip it entirely rather
                // than walking into it (§4.8 step 1).
                if dir.as_path() == base && path.file_name().map(|n| n == metadata::THUMBNAIL_DIR_NAME).unwrap_or(false) {
                    continue;
                }
                stack.push(path);
                continue;
            }
            if metadata::is_sidecar(&path) {
                continue;
            }

            summary.files_scanned += 1;
            let relative = match path.strip_prefix(base) {
                Ok(r) => r.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };

            let file_size = entry.metadata().await.map(|m| m.len() as i64).unwrap_or(0);
            let embedded = metadata::read_sidecar(base, &relative).await;

            match known.get(&relative) {
                Some(&photo_id) => {
                    if let Some(embedded) = &embedded {
                        check_conflicts(&db, photo_id, &path, &relative, embedded).await?;
                    }
                }
                None => {
                    record_orphan(&db, &path, &relative, file_size, embedded).await?;
                    summary.orphans_found += 1;
                }
            }
        }
    }

    if !shutdown.load(Ordering::SeqCst) {
        check_missing_files(&db, base, &known).await?;
    } else {
        summary.interrupted = true;
    }

    summary.conflicts_found = db.list_conflicts(Some(ConflictStatus::Pending)).await?.len() as u64;
    Ok(summary)
}

/// Second pass: every `Photo` row the database believes has a file on
/// disk, but whose `storedPath` no longer resolves to one — e.g. the
/// file was renamed or deleted outside the application — surfaces as a
/// `photo_id_mismatch` conflict for an operator to triage (§4.8).
async fn check_missing_files(db: &Arc<dyn Db>, base: &Path, known: &HashMap<String, Uuid>) -> Result<()> {
    for (stored_path, photo_id) in known {
        let absolute = base.join(stored_path);
        if !tokio::fs::try_exists(&absolute).await.unwrap_or(true) {
            upsert(db, *photo_id, stored_path, ConflictType::PhotoIdMismatch, Some(stored_path.clone()), None).await?;
        }
    }
    Ok(())
}

async fn record_orphan(
    db: &Arc<dyn Db>,
    path: &Path,
    relative: &str,
    file_size: i64,
    embedded: Option<EmbeddedMeta>,
) -> Result<()> {
    let file_hash = read_with_retries(path).await.map(|bytes| sha256_hex(&bytes));

    // An operator's prior `ignored`/`claimed` decision survives rescans;
    // only a brand-new orphan starts out `pending` (§4.8 step 3).
    let status = match db.get_orphan_by_path(relative).await? {
        Some(existing) if matches!(existing.status, OrphanStatus::Ignored | OrphanStatus::Claimed) => existing.status,
        _ => OrphanStatus::Pending,
    };

    let orphan = OrphanFile {
        id: Uuid::now_v7(),
        file_path: relative.to_string(),
        file_size,
        file_hash,
        discovered_at: Utc::now(),
        embedded_photo_id: embedded.as_ref().map(|e| e.photo_id),
        embedded_user_id: embedded.as_ref().and_then(|e| e.user_id),
        embedded_device_id: embedded.as_ref().and_then(|e| e.device_id),
        embedded_hash: embedded.as_ref().map(|e| e.file_hash.clone()),
        embedded_uploaded_at: embedded.as_ref().map(|e| e.uploaded_at),
        status,
    };
    db.upsert_orphan(&orphan).await?;
    Ok(())
}

async fn check_conflicts(db: &Arc<dyn Db>, photo_id: Uuid, path: &Path, relative: &str, embedded: &EmbeddedMeta) -> Result<()> {
    if embedded.photo_id != photo_id {
        upsert(db, photo_id, relative, ConflictType::PhotoIdMismatch, Some(photo_id.to_string()), Some(embedded.photo_id.to_string())).await?;
    }
    let Some(photo) = db.get_photo_by_id(photo_id).await? else { return Ok(()) };
    if embedded.user_id != photo.user_id {
        upsert(db, photo_id, relative, ConflictType::UserIdMismatch, photo.user_id.map(|u| u.to_string()), embedded.user_id.map(|u| u.to_string())).await?;
    }
    if embedded.device_id != photo.origin_device_id {
        upsert(db, photo_id, relative, ConflictType::DeviceIdMismatch, photo.origin_device_id.map(|d| d.to_string()), embedded.device_id.map(|d| d.to_string())).await?;
    }
    if embedded.file_hash != photo.file_hash {
        // A mismatch against the embedded sidecar alone could just mean the
        // sidecar is stale; re-hash the file's actual current bytes before
        // recording a conflict (§4.8 step 3).
        if let Some(bytes) = read_with_retries(path).await {
            let actual_hash = sha256_hex(&bytes);
            if actual_hash != photo.file_hash {
                upsert(db, photo_id, relative, ConflictType::HashMismatch, Some(photo.file_hash.clone()), Some(actual_hash)).await?;
            }
        }
    }
    Ok(())
}

async fn upsert(
    db: &Arc<dyn Db>,
    photo_id: Uuid,
    relative: &str,
    kind: ConflictType,
    db_value: Option<String>,
    file_value: Option<String>,
) -> Result<()> {
    db.upsert_conflict(&FileConflict {
        id: Uuid::now_v7(),
        photo_id,
        file_path: relative.to_string(),
        conflict_type: kind,
        db_value,
        file_value,
        status: ConflictStatus::Pending,
        discovered_at: Utc::now(),
    })
    .await?;
    Ok(())
}

async fn read_with_retries(path: &Path) -> Option<Vec<u8>> {
    for attempt in 1..=MAX_READ_ATTEMPTS {
        match tokio::fs::read(path).await {
            Ok(bytes) => return Some(bytes),
            Err(e) if attempt < MAX_READ_ATTEMPTS => {
                log::debug!("[scanner] retrying read of {} after error: {e}", path.display());
            }
            Err(e) => {
                log::warn!("[scanner] giving up reading {}: {e}", path.display());
            }
        }
    }
    None
}
