//! Shared application state, handed to every handler via axum's `State`
//! extractor — the same role the teacher's `AppState` plays in front of
//! `create_app`.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::db::Db;
use crate::notify::{EmailNotifier, PushNotifier};
use crate::scanner::ScannerHandle;
use crate::storage::PhotoStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Db>,
    pub storage: Arc<PhotoStore>,
    pub config: Arc<AppConfig>,
    pub push: Arc<dyn PushNotifier>,
    pub email: Arc<dyn EmailNotifier>,
    /// Bounds how many thumbnail/EXIF-embed jobs run concurrently in the
    /// background after an upload returns (§4.5, adapted from the
    /// teacher's `image_processing_semaphore`).
    pub thumbnail_semaphore: Arc<Semaphore>,
    pub scanner: ScannerHandle,
}

const MAX_CONCURRENT_THUMBNAIL_JOBS: usize = 4;

impl AppState {
    pub fn thumbnail_semaphore_default() -> Arc<Semaphore> {
        Arc::new(Semaphore::new(MAX_CONCURRENT_THUMBNAIL_JOBS))
    }
}
