//! Runtime configuration. Loaded from an optional YAML file (`CONFIG_PATH`,
//! default `./config.yaml`) with environment variables overriding any field
//! present there — the same precedence the teacher's `.env`-backed
//! `AppConfig::from_env` used, just widened to also accept a file.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct FileConfig {
    server_address: Option<String>,
    database_path: Option<String>,
    database_url: Option<String>,
    photo_storage_path: Option<String>,
    api_key: Option<String>,
    file_scanner_enabled: Option<bool>,
    file_scanner_interval_hours: Option<u64>,
    file_scanner_auto_start: Option<bool>,
    max_file_size_mb: Option<u64>,
    allowed_extensions: Option<Vec<String>>,
    auth_timeout_seconds: Option<u64>,
    cursor_secret: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `host:port` the HTTP listener binds to.
    pub server_address: String,
    /// Embedded (sqlite) DB file path. Used only when `database_url` is absent.
    pub database_path: String,
    /// Networked DB connection string. Presence selects that backend (§6).
    pub database_url: Option<String>,
    /// Absolute base directory for the file store (C2).
    pub photo_storage_path: PathBuf,
    /// Legacy single-key mode: requests bearing this key map to the seeded admin user.
    pub api_key: Option<String>,
    pub file_scanner_enabled: bool,
    pub file_scanner_interval_hours: u64,
    pub file_scanner_auto_start: bool,
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    /// AuthRequest lifetime, default 60s (§3, §9).
    pub auth_timeout_seconds: u64,
    /// Server secret used to sign sync cursors (§9 "Cursor opaqueness").
    pub cursor_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "./config.yaml".to_string());
        let file_cfg: FileConfig = std::fs::read_to_string(&config_path)
            .ok()
            .and_then(|s| serde_yaml::from_str(&s).ok())
            .unwrap_or_default();

        let server_address = env::var("SERVER_ADDRESS")
            .ok()
            .or(file_cfg.server_address)
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let database_path = env::var("DATABASE_PATH")
            .ok()
            .or(file_cfg.database_path)
            .unwrap_or_else(|| "./photosync.sqlite".to_string());

        let database_url = env::var("DATABASE_URL").ok().or(file_cfg.database_url);

        // The default is resolved against the process's own cwd *before*
        // the absoluteness check, so it's always already-absolute by
        // construction; an explicit override that isn't absolute is a
        // configuration error, not something to coerce (see
        // `normalize_absolute`).
        let photo_storage_path_raw = match env::var("PHOTO_STORAGE_PATH").ok().or(file_cfg.photo_storage_path) {
            Some(configured) => configured,
            None => env::current_dir().map_err(AppError::Io)?.join("photos").to_string_lossy().into_owned(),
        };
        let photo_storage_path = normalize_absolute(&photo_storage_path_raw)?;

        let api_key = env::var("API_KEY").ok().or(file_cfg.api_key).filter(|s| !s.is_empty());

        let file_scanner_enabled = env::var("FILE_SCANNER_ENABLED")
            .ok()
            .map(|s| parse_bool(&s))
            .or(file_cfg.file_scanner_enabled)
            .unwrap_or(true);

        let file_scanner_interval_hours = env::var("FILE_SCANNER_INTERVAL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file_cfg.file_scanner_interval_hours)
            .unwrap_or(6);

        let file_scanner_auto_start = env::var("FILE_SCANNER_AUTO_START")
            .ok()
            .map(|s| parse_bool(&s))
            .or(file_cfg.file_scanner_auto_start)
            .unwrap_or(true);

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file_cfg.max_file_size_mb)
            .unwrap_or(100);

        let allowed_extensions = file_cfg.allowed_extensions.unwrap_or_else(|| {
            ["jpg", "jpeg", "png", "heic", "heif", "webp", "gif", "mp4", "mov"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        let auth_timeout_seconds = env::var("AUTH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file_cfg.auth_timeout_seconds)
            .unwrap_or(60);

        let cursor_secret = env::var("CURSOR_SECRET")
            .ok()
            .or(file_cfg.cursor_secret)
            .unwrap_or_else(|| "change-me-in-production".to_string());

        Ok(Self {
            server_address,
            database_path,
            database_url,
            photo_storage_path,
            api_key,
            file_scanner_enabled,
            file_scanner_interval_hours,
            file_scanner_auto_start,
            max_file_size_mb,
            allowed_extensions,
            auth_timeout_seconds,
            cursor_secret,
        })
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn extension_allowed(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext))
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Rejects any configured `base` that isn't already absolute (spec §6: "the
/// server MUST reject any configured `base` that is not absolute after
/// normalization") — a relative value is a configuration error, not
/// something to silently resolve against the process's cwd.
fn normalize_absolute(raw: &str) -> Result<PathBuf, AppError> {
    let path = PathBuf::from(raw);
    if !path.is_absolute() {
        return Err(AppError::bad_request(format!(
            "PHOTO_STORAGE_PATH must be an absolute path, got: {raw}"
        )));
    }
    Ok(path)
}
