//! File Store (C2): content lives at `<base>/<YYYY>/<MM>/<name>`, one file
//! per photo, named from the original filename plus a short disambiguator.
//! Built on `object_store::local::LocalFileSystem` the same way the
//! teacher's `ObjectStoreService` wraps the `local` backend — its
//! `put`/`rename` already writes via a temp file, so a reader never
//! observes a partial photo.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StorePath};
use uuid::Uuid;

use crate::errors::AppError;

pub struct PhotoStore {
    store: Arc<LocalFileSystem>,
    base: PathBuf,
}

impl PhotoStore {
    pub fn new(base: PathBuf) -> Result<Self, AppError> {
        std::fs::create_dir_all(&base)?;
        let store = LocalFileSystem::new_with_prefix(&base).map_err(object_store::Error::from)?;
        Ok(Self { store: Arc::new(store), base })
    }

    /// Writes `data` under a path derived from `date_taken` and the
    /// sanitized original filename, retrying the disambiguator on a name
    /// collision. Returns the relative stored path (§4.2).
    pub async fn store(
        &self,
        data: Bytes,
        date_taken: DateTime<Utc>,
        original_filename: &str,
        photo_id: Uuid,
    ) -> Result<String, AppError> {
        let (stem, ext) = split_extension(original_filename);
        let sanitized_stem = sanitize_stem(&stem);
        let year = date_taken.format("%Y").to_string();
        let month = date_taken.format("%m").to_string();

        let mut attempt: u32 = 0;
        loop {
            let disambiguator = if attempt == 0 {
                short_id(photo_id)
            } else {
                format!("{}-{attempt}", short_id(photo_id))
            };
            let file_name = match &ext {
                Some(ext) => format!("{sanitized_stem}_{disambiguator}.{ext}"),
                None => format!("{sanitized_stem}_{disambiguator}"),
            };
            let relative = format!("{year}/{month}/{file_name}");
            let location = StorePath::parse(&relative).map_err(object_store::Error::from)?;

            match self.store.put_opts(&location, data.clone().into(), object_store::PutMode::Create.into()).await {
                Ok(_) => return Ok(relative),
                Err(object_store::Error::AlreadyExists { .. }) => {
                    attempt += 1;
                    if attempt > 1000 {
                        return Err(AppError::Internal(anyhow::anyhow!(
                            "exhausted disambiguators for {original_filename}"
                        )));
                    }
                    continue;
                }
                Err(e) => return Err(AppError::Store(e)),
            }
        }
    }

    pub async fn get(&self, relative_path: &str) -> Result<Bytes, AppError> {
        let location = self.resolve(relative_path)?;
        let result = self.store.get(&location).await?;
        Ok(result.bytes().await?)
    }

    pub async fn delete(&self, relative_path: &str) -> Result<(), AppError> {
        let location = self.resolve(relative_path)?;
        match self.store.delete(&location).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(AppError::Store(e)),
        }
    }

    /// Writes `data` at an exact, caller-chosen relative path, overwriting
    /// anything already there. Used for thumbnails and sidecar-adjacent
    /// artifacts, whose names are derived from the photo's own stored path
    /// rather than disambiguated like a fresh upload.
    pub async fn put_at(&self, relative_path: &str, data: Bytes) -> Result<(), AppError> {
        let location = self.resolve(relative_path)?;
        self.store.put(&location, data.into()).await?;
        Ok(())
    }

    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        self.base.join(relative_path)
    }

    /// Parses a relative path and rejects anything that could escape `base`
    /// (`..` segments, absolute paths) before it reaches the store (§4.2,
    /// "the server MUST reject any configured base / derived path that
    /// could escape the storage root").
    fn resolve(&self, relative_path: &str) -> Result<StorePath, AppError> {
        if relative_path.split('/').any(|seg| seg == ".." || seg.is_empty() && !relative_path.is_empty()) {
            return Err(AppError::bad_request("path traversal rejected"));
        }
        StorePath::parse(relative_path).map_err(|e| AppError::Store(object_store::Error::from(e)))
    }
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn split_extension(filename: &str) -> (String, Option<String>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !stem.is_empty() => {
            (stem.to_string(), Some(ext.to_ascii_lowercase()))
        }
        _ => (filename.to_string(), None),
    }
}

/// Keeps alphanumerics, `-` and `_`; everything else (spaces, unicode,
/// path separators smuggled in a filename) collapses to `_`. Guarantees the
/// result is non-empty.
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() { "photo".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path().to_path_buf()).unwrap();
        let data = Bytes::from("jpeg-bytes");
        let id = Uuid::now_v7();
        let when = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z").unwrap().with_timezone(&Utc);

        let path = store.store(data.clone(), when, "IMG_0001.JPG", id).await.unwrap();
        assert!(path.starts_with("2024/03/"));
        assert!(path.ends_with(".jpg"));

        let got = store.get(&path).await.unwrap();
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn colliding_names_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path().to_path_buf()).unwrap();
        let when = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z").unwrap().with_timezone(&Utc);

        let id_a = Uuid::now_v7();
        let id_b = Uuid::now_v7();
        let path_a = store.store(Bytes::from("a"), when, "same.jpg", id_a).await.unwrap();
        let path_b = store.store(Bytes::from("b"), when, "same.jpg", id_b).await.unwrap();
        assert_ne!(path_a, path_b);
    }

    #[tokio::test]
    async fn rejects_path_traversal_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path().to_path_buf()).unwrap();
        let err = store.get("../../../etc/passwd").await;
        assert!(err.is_err());
    }

    #[test]
    fn sanitizes_unsafe_filenames() {
        assert_eq!(sanitize_stem("a b/c..d"), "a_b_c__d");
        assert_eq!(sanitize_stem("...."), "photo");
    }
}
