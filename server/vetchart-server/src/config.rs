use std::path::PathBuf;

use database_layer::parse_flag;

pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
];

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Room for a full-size dictation plus its form fields
pub const DEFAULT_MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Exact origins allowed by CORS; `*` allows any origin
    pub cors_allow_origins: Vec<String>,
    /// Extra origins matched by pattern, e.g. Codespaces preview hosts
    pub cors_allow_origin_regex: Option<String>,
    /// Directory backing `/uploads`
    pub upload_dir: PathBuf,
    pub enable_debug_endpoints: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cors_allow_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| (*o).to_string()).collect(),
            cors_allow_origin_regex: None,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            enable_debug_endpoints: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Reads `CORS_ALLOW_ORIGINS`, `CORS_ALLOW_ORIGIN_REGEX`, `UPLOAD_DIR`,
    /// `ENABLE_DEBUG_ENDPOINTS` and `MAX_BODY_BYTES`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cors_allow_origins: std::env::var("CORS_ALLOW_ORIGINS")
                .ok()
                .map(|raw| split_origins(&raw))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.cors_allow_origins),
            cors_allow_origin_regex: std::env::var("CORS_ALLOW_ORIGIN_REGEX")
                .ok()
                .filter(|pattern| !pattern.trim().is_empty()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map_or(defaults.upload_dir, PathBuf::from),
            enable_debug_endpoints: std::env::var("ENABLE_DEBUG_ENDPOINTS")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enable_debug_endpoints),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_body_bytes),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}
