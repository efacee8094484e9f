//! Configuration module
//!
//! Environment-driven configuration for the API and services. Every
//! non-credential field has a default so a bare process starts in a usable
//! (memory-backed, fallback-translation) development mode.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_MAX_VIDEO_SIZE_BYTES: usize = 5 * 1024 * 1024 * 1024; // 5 GiB
const DEFAULT_MAX_IMAGE_SIZE_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_CACHE_BUDGET_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;
const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_UPLOAD_STATUS_TTL_SECS: u64 = 3600;
const DEFAULT_TRANSLATE_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Public base URL of this deployment, e.g. `https://videos.example.com`.
    /// Watch links and proxy URLs are derived from it.
    pub public_base_url: String,

    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (Wasabi, MinIO, ...).
    pub s3_endpoint: Option<String>,

    // Upload validation
    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub max_image_size_bytes: usize,
    pub image_allowed_extensions: Vec<String>,
    pub image_allowed_content_types: Vec<String>,

    // Media tooling
    pub ffprobe_path: String,
    /// TTF/OTF font used for QR captions. Without one, captions degrade to
    /// the bare QR image.
    pub caption_font_path: Option<String>,

    // Translation
    pub translate_api_key: Option<String>,
    pub translate_endpoint: String,

    // Proxy cache
    pub cache_budget_bytes: usize,
    pub cache_max_entries: usize,
    pub cache_sweep_interval_secs: u64,

    // Upload progress polling
    pub upload_status_ttl_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| default.iter().map(|s| s.to_string()).collect())
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let storage_backend = env_or("STORAGE_BACKEND", "s3")
            .parse::<StorageBackend>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let config = Config {
            server_port: env_parse("PORT", DEFAULT_SERVER_PORT),
            environment: env_or("ENVIRONMENT", "development"),
            cors_origins: env_list("CORS_ORIGINS", &["*"]),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080")
                .trim_end_matches('/')
                .to_string(),
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            max_video_size_bytes: env_parse("MAX_VIDEO_SIZE_BYTES", DEFAULT_MAX_VIDEO_SIZE_BYTES),
            video_allowed_extensions: env_list(
                "VIDEO_ALLOWED_EXTENSIONS",
                &["mp4", "avi", "mov", "wmv", "flv", "webm", "mkv"],
            ),
            video_allowed_content_types: env_list(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                &[
                    "video/mp4",
                    "video/x-msvideo",
                    "video/quicktime",
                    "video/x-ms-wmv",
                    "video/x-flv",
                    "video/webm",
                    "video/x-matroska",
                ],
            ),
            max_image_size_bytes: env_parse("MAX_IMAGE_SIZE_BYTES", DEFAULT_MAX_IMAGE_SIZE_BYTES),
            image_allowed_extensions: env_list(
                "IMAGE_ALLOWED_EXTENSIONS",
                &["jpg", "jpeg", "png", "gif", "bmp", "webp"],
            ),
            image_allowed_content_types: env_list(
                "IMAGE_ALLOWED_CONTENT_TYPES",
                &[
                    "image/jpeg",
                    "image/png",
                    "image/gif",
                    "image/bmp",
                    "image/webp",
                ],
            ),
            ffprobe_path: env_or("FFPROBE_PATH", "ffprobe"),
            caption_font_path: env_opt("CAPTION_FONT_PATH"),
            translate_api_key: env_opt("TRANSLATE_API_KEY"),
            translate_endpoint: env_or("TRANSLATE_ENDPOINT", DEFAULT_TRANSLATE_ENDPOINT),
            cache_budget_bytes: env_parse("PROXY_CACHE_BUDGET_BYTES", DEFAULT_CACHE_BUDGET_BYTES),
            cache_max_entries: env_parse("PROXY_CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES),
            cache_sweep_interval_secs: env_parse(
                "PROXY_CACHE_SWEEP_INTERVAL_SECS",
                DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            ),
            upload_status_ttl_secs: env_parse(
                "UPLOAD_STATUS_TTL_SECS",
                DEFAULT_UPLOAD_STATUS_TTL_SECS,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            anyhow::bail!("S3_BUCKET is required when STORAGE_BACKEND=s3");
        }
        if self.max_video_size_bytes == 0 {
            anyhow::bail!("MAX_VIDEO_SIZE_BYTES must be greater than zero");
        }
        if self.cache_budget_bytes == 0 || self.cache_max_entries == 0 {
            anyhow::bail!("Proxy cache budget and entry limits must be greater than zero");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Permanent watch link for an entity; the value embedded in QR codes.
    pub fn watch_link(&self, entity_id: uuid::Uuid) -> String {
        format!("{}/watch/{}", self.public_base_url, entity_id.simple())
    }
}

impl Default for Config {
    /// Memory-backed development defaults; used by tests.
    fn default() -> Self {
        Config {
            server_port: DEFAULT_SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            public_base_url: "http://localhost:8080".to_string(),
            storage_backend: StorageBackend::Memory,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            max_video_size_bytes: DEFAULT_MAX_VIDEO_SIZE_BYTES,
            video_allowed_extensions: ["mp4", "avi", "mov", "wmv", "flv", "webm", "mkv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            video_allowed_content_types: [
                "video/mp4",
                "video/x-msvideo",
                "video/quicktime",
                "video/x-ms-wmv",
                "video/x-flv",
                "video/webm",
                "video/x-matroska",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_image_size_bytes: DEFAULT_MAX_IMAGE_SIZE_BYTES,
            image_allowed_extensions: ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            image_allowed_content_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/bmp",
                "image/webp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ffprobe_path: "ffprobe".to_string(),
            caption_font_path: None,
            translate_api_key: None,
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            cache_budget_bytes: DEFAULT_CACHE_BUDGET_BYTES,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_sweep_interval_secs: DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            upload_status_ttl_secs: DEFAULT_UPLOAD_STATUS_TTL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let config = Config {
            storage_backend: StorageBackend::S3,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watch_link_format() {
        let config = Config::default();
        let id = uuid::Uuid::new_v4();
        let link = config.watch_link(id);
        assert_eq!(link, format!("http://localhost:8080/watch/{}", id.simple()));
    }

    #[test]
    fn test_is_production() {
        let config = Config {
            environment: "Production".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
    }
}
