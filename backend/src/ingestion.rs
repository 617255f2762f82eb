//! Ingestion Engine (C5): the single path every uploaded photo travels
//! before it's visible to any client. Buffering, hashing, and the row
//! insert happen inline so the caller gets a definitive answer; thumbnail
//! generation and sidecar metadata are pushed to a bounded background
//! worker pool, mirroring the teacher's `api/v1/upload.rs` split between
//! the synchronous response and `tokio::spawn` + `Semaphore`-gated
//! post-processing.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use photosync_shared::entities::Photo;
use uuid::Uuid;

use crate::errors::AppError;
use crate::hashing::{extract_exif, sha256_hex};
use crate::metadata::{self, EmbeddedMeta};
use crate::state::AppState;
use crate::thumbnails;

pub struct IngestOutcome {
    pub photo: Photo,
    pub is_duplicate: bool,
}

/// Runs the full upload workflow (§4.5). `date_taken_hint` is the client's
/// claimed capture time, if any; EXIF `DateTimeOriginal` is consulted next,
/// then the upload time is the last resort.
pub async fn ingest_photo(
    state: &AppState,
    user_id: Uuid,
    device_id: Option<Uuid>,
    original_filename: &str,
    date_taken_hint: Option<DateTime<Utc>>,
    data: Bytes,
) -> Result<IngestOutcome, AppError> {
    if data.len() as u64 > state.config.max_file_size_bytes() {
        return Err(AppError::bad_request("file exceeds the configured size limit"));
    }

    let extension = original_filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    if extension.is_empty() || !state.config.extension_allowed(extension) {
        return Err(AppError::bad_request(format!("unsupported file extension: {extension}")));
    }

    let file_hash = sha256_hex(&data);
    if let Some(existing) = state.db.get_photo_by_hash(&file_hash).await.map_err(AppError::Internal)? {
        return Ok(IngestOutcome { photo: existing, is_duplicate: true });
    }

    let exif = extract_exif(&data);
    let date_taken = date_taken_hint.or(exif.date_taken).unwrap_or_else(Utc::now);
    let photo_id = Uuid::now_v7();

    let stored_path = state.storage.store(data.clone(), date_taken, original_filename, photo_id).await?;

    let photo = Photo {
        id: photo_id,
        original_filename: original_filename.to_string(),
        stored_path: stored_path.clone(),
        file_hash: file_hash.clone(),
        file_size: data.len() as i64,
        date_taken,
        uploaded_at: Utc::now(),
        user_id: Some(user_id),
        origin_device_id: device_id,
        thumbnail_small_path: None,
        thumbnail_medium_path: None,
        thumbnail_large_path: None,
        width: None,
        height: None,
        orientation: exif.orientation,
        exif,
    };

    match state.db.create_photo(&photo).await {
        Ok(()) => {}
        Err(e) if is_unique_violation(&e) => {
            // Another upload won the race on this hash between our check and
            // our insert. Drop the file we just wrote and defer to the
            // winner (§4.5: "a concurrent duplicate upload MUST NOT leave
            // an orphaned file behind").
            let _ = state.storage.delete(&stored_path).await;
            let existing = state
                .db
                .get_photo_by_hash(&file_hash)
                .await
                .map_err(AppError::Internal)?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("lost the race but the winner's row is missing")))?;
            return Ok(IngestOutcome { photo: existing, is_duplicate: true });
        }
        Err(e) => return Err(AppError::Internal(e)),
    }

    spawn_post_ingest_job(state.clone(), photo.clone(), data);

    Ok(IngestOutcome { photo, is_duplicate: false })
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Mirrors a photo's `<YYYY>/<MM>/<name>.<ext>` stored path into the
/// thumbnail subtree as `thumbs/<size>/<YYYY>/<MM>/<name>.webp` (§4.4,
/// §9 "thumbnails at `<base>/thumbs/<size>/<YYYY>/<MM>/<name>.<ext>`").
fn thumbnail_path(stored_path: &str, size: &str) -> String {
    let (dir, file) = stored_path.rsplit_once('/').unwrap_or(("", stored_path));
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);
    if dir.is_empty() {
        format!("{}/{size}/{stem}.webp", metadata::THUMBNAIL_DIR_NAME)
    } else {
        format!("{}/{size}/{dir}/{stem}.webp", metadata::THUMBNAIL_DIR_NAME)
    }
}

/// Thumbnail generation and metadata embedding run off the request path.
/// Failures here never surface to the uploader — they leave thumbnail
/// fields null and get picked up by the Integrity Scanner later (§4.4).
fn spawn_post_ingest_job(state: AppState, photo: Photo, raw: Bytes) {
    tokio::spawn(async move {
        let Ok(_permit) = state.thumbnail_semaphore.clone().acquire_owned().await else {
            return;
        };

        match thumbnails::generate(&raw, photo.orientation) {
            Ok(set) => {
                let small_path = thumbnail_path(&photo.stored_path, "small");
                let medium_path = thumbnail_path(&photo.stored_path, "medium");
                let large_path = thumbnail_path(&photo.stored_path, "large");

                let (width, height) = (set.width, set.height);
                let write_result: Result<(), AppError> = async {
                    state.storage.put_at(&small_path, set.small).await?;
                    state.storage.put_at(&medium_path, set.medium).await?;
                    state.storage.put_at(&large_path, set.large).await?;
                    Ok(())
                }
                .await;

                match write_result {
                    Ok(()) => {
                        if let Err(e) = state
                            .db
                            .update_photo_thumbnails(
                                photo.id,
                                Some(&small_path),
                                Some(&medium_path),
                                Some(&large_path),
                                Some(width),
                                Some(height),
                            )
                            .await
                        {
                            log::warn!("[ingestion] failed to record thumbnails for {}: {e:#}", photo.id);
                        }
                    }
                    Err(e) => log::warn!("[ingestion] failed to write thumbnails for {}: {e}", photo.id),
                }
            }
            Err(e) => {
                log::info!("[ingestion] skipping thumbnails for {} ({e})", photo.id);
            }
        }

        let meta = EmbeddedMeta {
            photo_id: photo.id,
            user_id: photo.user_id,
            device_id: photo.origin_device_id,
            file_hash: photo.file_hash.clone(),
            uploaded_at: photo.uploaded_at,
        };
        if let Err(e) = metadata::write_sidecar(&state.storage.absolute_path(""), &photo.stored_path, &meta).await {
            log::warn!("[ingestion] failed to write sidecar metadata for {}: {e}", photo.id);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_path_mirrors_year_month_under_the_thumbs_subtree() {
        assert_eq!(thumbnail_path("2024/03/IMG_0001_abcd1234.jpg", "small"), "thumbs/small/2024/03/IMG_0001_abcd1234.webp");
        assert_eq!(thumbnail_path("flat-name.png", "large"), "thumbs/large/flat-name.webp");
    }
}
